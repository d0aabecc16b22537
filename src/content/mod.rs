//! Content domain: the static definition source.
//!
//! Loads the zmap (layer-priority list), equip definitions, and the default
//! character descriptor at startup, then exposes them as read-only resources.

pub mod data;
pub mod loader;
pub mod registry;
#[cfg(test)]
mod tests;
pub mod validation;

use bevy::prelude::*;
use std::path::Path;

pub use data::{CharacterDescriptor, DyeDescriptor, EquipDef, ItemDescriptor, Vec2Def};
pub use registry::{DefaultCharacter, EquipRegistry, Zmap};

use crate::core::PreviewState;

pub struct ContentPlugin;

impl Plugin for ContentPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EquipRegistry>()
            .init_resource::<Zmap>()
            .init_resource::<DefaultCharacter>()
            .add_systems(Startup, load_content);
    }
}

/// Load all static content and advance to the ready state.
fn load_content(
    mut registry: ResMut<EquipRegistry>,
    mut zmap: ResMut<Zmap>,
    mut default_character: ResMut<DefaultCharacter>,
    mut next_state: ResMut<NextState<PreviewState>>,
) {
    match loader::load_zmap(Path::new("assets/zmap.ron")) {
        Ok(layers) => *zmap = Zmap::new(layers),
        Err(e) => warn!("using built-in zmap: {e}"),
    }

    let (defs, errors) = loader::load_equip_dir(Path::new("assets/equip"));
    for e in &errors {
        error!("{e}");
    }
    for def in defs {
        registry.insert(def);
    }
    if registry.is_empty() {
        warn!("no equip definitions found under assets/equip");
    }

    for issue in validation::validate_equips(&registry, &zmap) {
        warn!("{issue}");
    }

    match loader::load_default_character(Path::new("assets/default_character.ron")) {
        Ok(desc) => default_character.0 = desc,
        Err(e) => warn!("no default character: {e}"),
    }

    info!(
        "content loaded: {} equips, {} layers",
        registry.len(),
        zmap.layers().len()
    );

    next_state.set(PreviewState::Ready);
}
