//! Serde data types for equip definitions and character descriptors.
//!
//! Equip definitions are the static piece-definition source: per-action and
//! per-expression frame tables, each frame mapping layer names to sprite
//! piece records. Descriptors are the external snapshot a caller hands to
//! `CharacterState::update`.

#![allow(dead_code)]

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::character::{Action, EarType, Expression, HandType};

/// Serializable 2D point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2Def {
    pub x: f32,
    pub y: f32,
}

impl From<Vec2Def> for Vec2 {
    fn from(v: Vec2Def) -> Self {
        Vec2::new(v.x, v.y)
    }
}

/// One sprite piece inside one frame of one variant.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PieceDef {
    /// Texture path relative to the asset root.
    #[serde(default)]
    pub path: Option<String>,
    /// Alias pointing at another equip's texture; takes precedence over
    /// `path` when present.
    #[serde(default, rename = "_outlink")]
    pub outlink: Option<String>,
    /// Top-left drawing offset in the piece's local pixel space.
    #[serde(default)]
    pub origin: Option<Vec2Def>,
    /// Render-layer tag; resolved against the zmap at frame resolution.
    #[serde(default)]
    pub z: Option<String>,
    /// Named anchor points in local pixel space.
    #[serde(default)]
    pub map: BTreeMap<String, Vec2Def>,
    /// Optional group tag (e.g. "skin" pieces follow body dye).
    #[serde(default)]
    pub group: Option<String>,
}

/// One animation frame: a delay plus the layer-keyed pieces shown during it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrameDef {
    #[serde(default)]
    pub delay: Option<u32>,
    #[serde(flatten)]
    pub pieces: BTreeMap<String, PieceDef>,
}

/// The frame table for one action or expression variant.
///
/// Frame indices may be sparse; a variant with no frame-keyed data supplies
/// a single keyless `default_frame` instead.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariantDef {
    #[serde(default)]
    pub frames: BTreeMap<u32, FrameDef>,
    #[serde(default)]
    pub default_frame: Option<FrameDef>,
}

impl VariantDef {
    /// Frame count: a keyless default is exactly one frame; otherwise the
    /// highest referenced index + 1 (never less than the number of entries).
    pub fn frame_count(&self) -> usize {
        if self.frames.is_empty() {
            return 1;
        }
        let max_key = self.frames.keys().copied().max().unwrap_or(0) as usize;
        (max_key + 1).max(self.frames.len())
    }

    pub fn frame(&self, index: usize) -> Option<&FrameDef> {
        if self.frames.is_empty() {
            if index == 0 {
                return self.default_frame.as_ref();
            }
            return None;
        }
        self.frames.get(&(index as u32))
    }
}

/// A full equip definition as shipped in `assets/equip/<id>.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct EquipDef {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    /// Logical slot layers this equip occupies; also the lock-order key.
    pub islot: Vec<String>,
    /// Render layers this equip claims when it wins its slots.
    pub vslot: Vec<String>,
    #[serde(default)]
    pub actions: BTreeMap<Action, VariantDef>,
    #[serde(default)]
    pub expressions: BTreeMap<Expression, VariantDef>,
    /// Dye table: color index to the alternate equip id carrying the
    /// recolored textures.
    #[serde(default)]
    pub dyes: BTreeMap<u8, u32>,
}

/// Dye selection on an equipped item: color index plus blend alpha 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DyeDescriptor {
    pub color: u8,
    pub alpha: u8,
}

/// One equipped item as described by the external caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDescriptor {
    pub id: u32,
    #[serde(default)]
    pub dye: Option<DyeDescriptor>,
    #[serde(default)]
    pub hue: Option<f32>,
    #[serde(default)]
    pub brightness: Option<f32>,
    #[serde(default)]
    pub saturation: Option<f32>,
}

impl ItemDescriptor {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            dye: None,
            hue: None,
            brightness: None,
            saturation: None,
        }
    }

    pub fn has_filter(&self) -> bool {
        self.hue.is_some() || self.brightness.is_some() || self.saturation.is_some()
    }
}

/// The external character-state snapshot fed to `CharacterState::update`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterDescriptor {
    #[serde(default)]
    pub action: Action,
    #[serde(default)]
    pub expression: Expression,
    #[serde(default)]
    pub ear_type: EarType,
    #[serde(default)]
    pub hand_type: HandType,
    pub items: Vec<ItemDescriptor>,
    #[serde(default)]
    pub is_animating: bool,
    /// Initial instruction index when not animating.
    #[serde(default)]
    pub frame: Option<usize>,
    /// Carried for callers; name tags are rendered outside the core.
    #[serde(default)]
    pub name_tag: Option<String>,
}
