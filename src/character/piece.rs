//! A single drawable sprite piece: one body part in one animation frame.
//!
//! Pieces carry their definition data (texture url, origin, local anchor
//! map) plus the mutable state produced by anchor building: the absolute
//! anchor point and the local draw offset.

#![allow(dead_code)]

use bevy::math::Vec2;

use super::anchor::{AnchorMap, DEFAULT_NAVEL, NAVEL};

/// Definition-derived data for a piece; immutable after frame resolution.
#[derive(Debug, Clone)]
pub struct PieceInfo {
    /// Owning equip id.
    pub item_id: u32,
    /// Texture path (outlink already applied).
    pub url: String,
    /// Raw layer key this record had in the definition frame.
    pub slot: String,
    /// Layer tag from the definition, when present.
    pub z: Option<String>,
    /// Optional group tag ("skin" pieces follow the body).
    pub group: Option<String>,
    /// Top-left drawing offset in local pixel space.
    pub origin: Vec2,
    /// Named anchor points in local pixel space.
    pub map: AnchorMap,
    /// Frame delay in milliseconds.
    pub delay: u32,
}

/// Runtime piece: definition plus resolved anchor state.
#[derive(Debug, Clone)]
pub struct Piece {
    pub info: PieceInfo,
    /// Whether this piece composites a dye overlay when the item is dyed.
    pub is_dyeable: bool,
    /// Absolute anchor point in the shared frame space.
    pub anchor: Vec2,
    /// Local draw position relative to the resolved anchor name's point.
    pub position: Vec2,
    /// The anchor name this piece aligned on.
    pub base_anchor_name: String,
    pub is_anchor_built: bool,
}

impl Piece {
    pub fn new(info: PieceInfo, is_dyeable: bool) -> Self {
        Self {
            info,
            is_dyeable,
            anchor: DEFAULT_NAVEL,
            position: Vec2::ZERO,
            base_anchor_name: NAVEL.to_string(),
            is_anchor_built: false,
        }
    }

    /// The layer name this piece nominally renders on: a "default" slot
    /// defers to the z tag, otherwise z wins over the raw slot key.
    pub fn slot_name(&self) -> &str {
        if self.info.slot == "default" {
            return self.info.z.as_deref().unwrap_or("");
        }
        self.info
            .z
            .as_deref()
            .filter(|z| !z.is_empty())
            .unwrap_or(&self.info.slot)
    }

    /// Align this piece on `name`, whose absolute position is `base`.
    fn set_anchor(&mut self, name: &str, base: Vec2) {
        let Some(local) = self.info.map.get(name) else {
            return;
        };
        self.anchor = base - local;
        self.position = -local - self.info.origin;
        self.base_anchor_name = name.to_string();
        self.is_anchor_built = true;
    }

    /// Try to place this piece against the shared frame anchor map.
    ///
    /// The first declared anchor name already present in `frame_map` wins; if
    /// none is present the piece stays unplaced for this pass and is retried
    /// later. On success every other declared anchor that the frame map does
    /// not know yet is inserted, based on this piece's resolved anchor, which
    /// is how placement knowledge propagates transitively between pieces.
    pub fn build_anchor(&mut self, frame_map: &mut AnchorMap) {
        let base = self
            .info
            .map
            .iter()
            .find_map(|(name, _)| frame_map.get(name).map(|p| (name.to_string(), p)));
        let Some((base_name, base_point)) = base else {
            return;
        };

        self.set_anchor(&base_name, base_point);

        let unplaced: Vec<(String, Vec2)> = self
            .info
            .map
            .iter()
            .filter(|(name, _)| *name != base_name && !frame_map.contains(name))
            .map(|(name, local)| (name.to_string(), local))
            .collect();
        for (name, local) in unplaced {
            frame_map.insert(name, self.anchor + local);
        }
    }

    /// Forget resolved placement so a fresh convergence pass can run.
    pub fn reset_anchor(&mut self) {
        self.anchor = DEFAULT_NAVEL;
        self.position = Vec2::ZERO;
        self.base_anchor_name = NAVEL.to_string();
        self.is_anchor_built = false;
    }
}

/// Replace the equip id inside a texture path, producing the dye overlay
/// path for a recolored variant of the same piece.
pub fn replace_id_in_path(path: &str, from_id: u32, to_id: u32) -> String {
    path.replace(&from_id.to_string(), &to_id.to_string())
}
