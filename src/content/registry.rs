//! Registry resources for the static definition source and the zmap.

#![allow(dead_code)]

use bevy::prelude::*;
use std::collections::HashMap;

use super::data::{CharacterDescriptor, EquipDef};

/// All loaded equip definitions, keyed by equip id. The core never mutates
/// this after startup.
#[derive(Resource, Default)]
pub struct EquipRegistry {
    equips: HashMap<u32, EquipDef>,
}

impl EquipRegistry {
    pub fn insert(&mut self, def: EquipDef) {
        self.equips.insert(def.id, def);
    }

    pub fn get(&self, id: u32) -> Option<&EquipDef> {
        self.equips.get(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.equips.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.equips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equips.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u32, &EquipDef)> {
        self.equips.iter()
    }
}

/// The layer-priority list: recognized render layers, ordered back to front.
/// The sole source of truth for which layer name a piece resolves to and for
/// z ordering.
#[derive(Resource, Debug, Clone)]
pub struct Zmap {
    layers: Vec<String>,
}

impl Default for Zmap {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Zmap {
    pub fn new(layers: Vec<String>) -> Self {
        Self { layers }
    }

    /// Built-in fallback ordering used when `assets/zmap.ron` is absent.
    pub fn builtin() -> Self {
        Self::new(
            [
                "backItemEffect",
                "backEffect",
                "backHairBelowCap",
                "backHair",
                "backCap",
                "backCape",
                "backShield",
                "backWeapon",
                "backBody",
                "cape",
                "shoes",
                "pants",
                "body",
                "mailChest",
                "head",
                "face",
                "accessoryFaceBelowFace",
                "hairShade",
                "hair",
                "accessoryFace",
                "accessoryEyes",
                "accessoryEar",
                "capBelowHead",
                "cap",
                "mailArm",
                "arm",
                "glove",
                "shield",
                "weapon",
                "hand",
                "gloveWrist",
                "weaponOverGlove",
                "weaponOverHand",
                "itemEffect",
                "frontEffect",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        )
    }

    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layers.iter().any(|l| l == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|l| l == name)
    }

    /// Effect layers carry gear glows and similar decorations.
    pub fn is_effect_layer(name: &str) -> bool {
        name.to_ascii_lowercase().contains("effect")
    }
}

/// The descriptor applied when the preview starts.
#[derive(Resource, Debug, Default)]
pub struct DefaultCharacter(pub CharacterDescriptor);
