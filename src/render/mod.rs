//! Render domain: mirrors the character engine into sprite entities.
//!
//! The engine stays plain state; these systems own the Bevy side — texture
//! fetching under the generation token, the layered sprite tree, per-frame
//! sprite swaps, and dye overlays.

pub mod animator;
pub mod assets;
pub mod dye;
pub mod layers;

use bevy::prelude::*;

pub use assets::{LoadingIndicator, PendingLoad, TextureCache};
pub use layers::{CharacterRoot, PartSprite, ZmapLayerNode};

pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TextureCache>()
            .init_resource::<PendingLoad>()
            .init_resource::<LoadingIndicator>()
            .add_systems(Startup, layers::setup_character_root)
            .add_systems(
                Update,
                (
                    assets::begin_texture_load,
                    assets::poll_pending_load,
                    layers::rebuild_scene,
                    animator::advance_animation,
                    animator::apply_frame,
                    layers::refresh_layer_locks,
                    dye::sync_dye_overlays,
                )
                    .chain(),
            );
    }
}
