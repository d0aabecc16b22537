//! The cross-item visible piece set for one (action, frame) instant.

use bevy::prelude::*;
use std::collections::BTreeMap;

use crate::content::registry::Zmap;

use super::actions::{Action, Expression};
use super::anchor::AnchorMap;
use super::item::Item;

/// One winning (layer, item) pairing inside a body frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameEntry {
    pub layer: String,
    pub item_id: u32,
}

/// Resolved piece set and shared anchor map for one animation instant.
/// Rebuilt whenever the equipped item set changes.
#[derive(Debug, Clone)]
pub struct BodyFrame {
    pub action: Action,
    pub frame: usize,
    /// Winning entries in zmap (back-to-front) order.
    pub entries: Vec<FrameEntry>,
    /// The converged anchor map for this instant.
    pub anchors: AnchorMap,
    /// Whether a body or backBody piece is present. All relative positioning
    /// derives from the body, so frames without one are not renderable.
    pub has_body: bool,
}

impl BodyFrame {
    /// Assemble the visible piece set for one instant: walk the zmap in
    /// order and let the first item (ascending id) that offers a piece for a
    /// layer win it.
    pub fn build(
        action: Action,
        frame: usize,
        expression: Expression,
        items: &BTreeMap<u32, Item>,
        zmap: &Zmap,
        anchors: AnchorMap,
    ) -> Self {
        let mut entries = Vec::new();
        for layer in zmap.layers() {
            for (id, item) in items {
                let Some(variant) = item.active_variant(action, expression) else {
                    continue;
                };
                let Some(part) = variant.parts.get(layer) else {
                    continue;
                };
                if part.piece_or_first(frame).is_none() {
                    continue;
                }
                entries.push(FrameEntry {
                    layer: layer.clone(),
                    item_id: *id,
                });
                break;
            }
        }

        let has_body = entries
            .iter()
            .any(|e| e.layer == "body" || e.layer == "backBody");
        if !has_body {
            error!("no body piece for {action:?} frame {frame}; frame will not render");
        }

        Self {
            action,
            frame,
            entries,
            anchors,
            has_body,
        }
    }

    pub fn entry_for(&self, layer: &str, item_id: u32) -> Option<&FrameEntry> {
        self.entries
            .iter()
            .find(|e| e.layer == layer && e.item_id == item_id)
    }
}
