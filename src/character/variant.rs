//! An equipped item's piece set for one action or expression.
//!
//! Resolves the variant's definition frames into runtime pieces, collects
//! the textures they need, and drives anchor building across its own frames.

use bevy::math::Vec2;
use std::collections::{BTreeMap, BTreeSet};

use crate::content::data::VariantDef;
use crate::content::registry::Zmap;

use super::actions::{Action, EarType, Expression};
use super::anchor::{AnchorMap, HAND_MOVE, hand_move_seed};
use super::piece::{Piece, PieceInfo};

/// Variant discriminator plus the behavior that differs between action- and
/// expression-keyed variants: anchor pre-setup and dye eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantKey {
    Action(Action),
    Expression(Expression),
}

impl VariantKey {
    /// Run before any piece anchors in a frame. Alert and heal poses move
    /// the hand independently, so they seed a synthetic `handMove` anchor.
    fn anchor_setup(&self, frame_map: &mut AnchorMap, frame: usize) {
        if let VariantKey::Action(Action::Alert | Action::Heal) = self {
            if !frame_map.contains(HAND_MOVE) {
                frame_map.insert(HAND_MOVE, hand_move_seed(frame));
            }
        }
    }

    /// Whether pieces of this variant composite a dye overlay. Expression
    /// variants only dye when the expression shows an eye region.
    pub fn is_dyeable(&self, has_dye: bool) -> bool {
        match self {
            VariantKey::Action(_) => has_dye,
            VariantKey::Expression(e) => has_dye && e.has_eye(),
        }
    }
}

/// Frame-indexed pieces for one render layer. Missing frames are explicit
/// `None` placeholders so indexing is always in bounds of `frame_count`.
#[derive(Debug, Clone, Default)]
pub struct AnimatedPart {
    pub pieces: Vec<Option<Piece>>,
}

impl AnimatedPart {
    /// The piece for `frame`, falling back to frame 0 when this part has no
    /// piece at that index. Returns the frame actually used.
    pub fn piece_or_first(&self, frame: usize) -> Option<(usize, &Piece)> {
        if let Some(Some(piece)) = self.pieces.get(frame) {
            return Some((frame, piece));
        }
        match self.pieces.first() {
            Some(Some(piece)) => Some((0, piece)),
            _ => None,
        }
    }

    pub fn is_all_anchor_built(&self) -> bool {
        self.pieces
            .iter()
            .flatten()
            .all(|piece| piece.is_anchor_built)
    }
}

/// Context needed while resolving definition frames into pieces.
pub struct ResolveContext<'a> {
    pub item_id: u32,
    /// Fallback layer when neither the z tag nor the raw key is recognized.
    pub islot_fallback: &'a str,
    /// Whether the equipped item carries a dye setting.
    pub has_dye: bool,
    pub ear_type: EarType,
    pub zmap: &'a Zmap,
}

/// All pieces of one (item, action-or-expression) combination.
#[derive(Debug)]
pub struct ItemVariant {
    pub key: VariantKey,
    pub frame_count: usize,
    /// Pieces resolved from definitions but not yet materialized into parts.
    unresolved: BTreeMap<String, Vec<Option<Piece>>>,
    /// Layer name to animated part, materialized by `prepare_resources`.
    pub parts: BTreeMap<String, AnimatedPart>,
}

impl ItemVariant {
    pub fn new(key: VariantKey, def: &VariantDef, ctx: &ResolveContext<'_>) -> Self {
        let mut variant = Self {
            key,
            frame_count: def.frame_count(),
            unresolved: BTreeMap::new(),
            parts: BTreeMap::new(),
        };
        variant.resolve_frames(def, ctx);
        variant
    }

    /// The render-layer name a definition record resolves to: the explicit z
    /// tag when the zmap knows it, else the raw key, else the item's first
    /// logical slot.
    fn resolve_usable_piece_name<'n>(
        name: &'n str,
        z: Option<&'n str>,
        ctx: &'n ResolveContext<'_>,
    ) -> &'n str {
        if let Some(z) = z {
            if ctx.zmap.contains(z) {
                return z;
            }
        }
        if ctx.zmap.contains(name) {
            return name;
        }
        ctx.islot_fallback
    }

    /// Build runtime pieces for every frame of the definition.
    fn resolve_frames(&mut self, def: &VariantDef, ctx: &ResolveContext<'_>) {
        let dyeable = self.key.is_dyeable(ctx.has_dye);
        let frame_count = self.frame_count;
        for frame in 0..frame_count {
            let Some(frame_def) = def.frame(frame) else {
                continue;
            };
            let delay = frame_def.delay.unwrap_or(0);
            for (piece_name, piece_def) in &frame_def.pieces {
                let Some(url) = piece_def.outlink.clone().or_else(|| piece_def.path.clone())
                else {
                    continue;
                };

                // ear sub-pieces: only the configured ear variant is kept
                if piece_name.to_ascii_lowercase().contains("ear")
                    && piece_name != ctx.ear_type.data_name()
                {
                    continue;
                }

                let layer =
                    Self::resolve_usable_piece_name(piece_name, piece_def.z.as_deref(), ctx)
                        .to_string();

                let map: AnchorMap = piece_def
                    .map
                    .iter()
                    .map(|(name, point)| (name.clone(), Vec2::from(*point)))
                    .collect();
                let map = if map.is_empty() {
                    AnchorMap::with_navel()
                } else {
                    map
                };

                let info = PieceInfo {
                    item_id: ctx.item_id,
                    url,
                    slot: piece_name.clone(),
                    z: piece_def.z.clone(),
                    group: piece_def.group.clone(),
                    origin: piece_def.origin.map(Vec2::from).unwrap_or(Vec2::ZERO),
                    map,
                    delay,
                };

                let pieces = self
                    .unresolved
                    .entry(layer)
                    .or_insert_with(|| vec![None; frame_count]);
                pieces[frame] = Some(Piece::new(info, dyeable));
            }
        }
    }

    /// Collect the distinct textures of all pending pieces and materialize
    /// one animated part per layer. Idempotent: returns nothing once the
    /// parts are built.
    pub fn prepare_resources(&mut self) -> Vec<String> {
        if self.unresolved.is_empty() {
            return Vec::new();
        }

        let mut urls = BTreeSet::new();
        for pieces in self.unresolved.values() {
            for piece in pieces.iter().flatten() {
                urls.insert(piece.info.url.clone());
            }
        }

        for (layer, pieces) in std::mem::take(&mut self.unresolved) {
            self.parts.insert(layer, AnimatedPart { pieces });
        }

        urls.into_iter().collect()
    }

    /// One anchor pass over this variant's frames.
    ///
    /// Ensures `anchors` has a map per frame (new maps are seeded with the
    /// default navel anchor), runs the variant's pre-setup, then lets every
    /// unplaced piece try to build. Callers iterate this across items until
    /// convergence.
    pub fn try_build_anchor(&mut self, anchors: &mut Vec<AnchorMap>) {
        for frame in 0..self.frame_count {
            if anchors.len() <= frame {
                anchors.push(AnchorMap::with_navel());
            }
            let frame_map = &mut anchors[frame];
            self.key.anchor_setup(frame_map, frame);
            for part in self.parts.values_mut() {
                if let Some(Some(piece)) = part.pieces.get_mut(frame) {
                    if !piece.is_anchor_built {
                        piece.build_anchor(frame_map);
                    }
                }
            }
        }
    }

    pub fn is_all_anchor_built(&self) -> bool {
        self.parts.values().all(AnimatedPart::is_all_anchor_built)
    }

    pub fn reset_anchors(&mut self) {
        for part in self.parts.values_mut() {
            for piece in part.pieces.iter_mut().flatten() {
                piece.reset_anchor();
            }
        }
    }

    /// Delay of the given frame, taken from the first piece present there.
    pub fn delay_at(&self, frame: usize) -> Option<u32> {
        self.parts
            .values()
            .find_map(|part| part.pieces.get(frame).and_then(|p| p.as_ref()))
            .map(|piece| piece.info.delay)
    }

    /// Pieces that never resolved an anchor, for diagnostics.
    pub fn unresolved_anchor_count(&self) -> usize {
        self.parts
            .values()
            .flat_map(|part| part.pieces.iter().flatten())
            .filter(|piece| !piece.is_anchor_built)
            .count()
    }
}
