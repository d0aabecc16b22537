//! Dye overlay sprites.
//!
//! A dyed piece composites a recolored texture over its base at the same
//! transform, blended by the dye alpha. A dye texture that fails to load
//! leaves the base rendering alone.

use bevy::asset::LoadState;
use bevy::prelude::*;
use bevy::sprite::Anchor;

use crate::character::CharacterState;

use super::assets::{PendingLoad, TextureCache};
use super::layers::PartSprite;

/// The recolor sprite child of a dyed part sprite.
#[derive(Component, Debug)]
pub struct DyeOverlay;

/// Keep each part's dye overlay in sync with the item's dye setting.
///
/// Runs every frame: overlays wait on their own texture loads, and dye
/// settings can change on the cheap update path without a scene rebuild.
pub fn sync_dye_overlays(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    state: Res<CharacterState>,
    pending: Res<PendingLoad>,
    mut cache: ResMut<TextureCache>,
    parts: Query<(Entity, &PartSprite, Option<&Children>)>,
    mut overlays: Query<(&mut Sprite, &mut Visibility), With<DyeOverlay>>,
) {
    if pending.active {
        return;
    }
    for (entity, part, children) in &parts {
        let dye = state
            .piece_for(&part.layer, part.item_id)
            .and_then(|placement| placement.dye);

        let mut existing = None;
        if let Some(children) = children {
            for child in children.iter() {
                if overlays.contains(child) {
                    existing = Some(child);
                    break;
                }
            }
        }

        match (dye, existing) {
            (Some((url, alpha)), Some(child)) => {
                let handle = cache.get_or_load(&url, &asset_server);
                let failed = matches!(asset_server.load_state(handle.id()), LoadState::Failed(_));
                if let Ok((mut sprite, mut visibility)) = overlays.get_mut(child) {
                    if failed {
                        // base-only fallback
                        debug!("dye texture '{url}' unavailable; rendering base only");
                        *visibility = Visibility::Hidden;
                    } else {
                        sprite.image = handle;
                        sprite.color = Color::WHITE.with_alpha(alpha);
                        *visibility = Visibility::Inherited;
                    }
                }
            }
            (Some((url, alpha)), None) => {
                let handle = cache.get_or_load(&url, &asset_server);
                let overlay = commands
                    .spawn((
                        DyeOverlay,
                        Sprite {
                            image: handle,
                            color: Color::WHITE.with_alpha(alpha),
                            ..default()
                        },
                        Anchor::TOP_LEFT,
                        Transform::from_xyz(0.0, 0.0, 0.001),
                        Visibility::default(),
                    ))
                    .id();
                commands.entity(entity).add_child(overlay);
            }
            (None, Some(child)) => {
                if let Ok((_, mut visibility)) = overlays.get_mut(child) {
                    *visibility = Visibility::Hidden;
                }
            }
            (None, None) => {}
        }
    }
}
