//! Playback ticking and per-frame sprite application.
//!
//! A single shared tick accumulates elapsed time against the current
//! instruction's delay; when the frame advances (or the scene is
//! invalidated) every part sprite is re-pointed at its piece for the new
//! instant. Definition space is y-down; the flip happens here, in one place.

use bevy::prelude::*;

use crate::character::{CharacterState, SceneInvalidated};

use super::assets::{PendingLoad, TextureCache};
use super::layers::{PartSprite, ZmapLayerNode};

/// Advance the animation clock once per display frame.
pub fn advance_animation(
    time: Res<Time>,
    mut state: ResMut<CharacterState>,
    mut invalidate_writer: MessageWriter<SceneInvalidated>,
) {
    if state.tick(time.delta_secs() * 1000.0) {
        invalidate_writer.write(SceneInvalidated);
    }
}

/// Re-point every part sprite at its piece for the current instant.
///
/// Skips entirely when the current frame has no body piece, leaving the
/// last-good visual state on screen.
pub fn apply_frame(
    mut invalidations: MessageReader<SceneInvalidated>,
    added_parts: Query<Entity, Added<PartSprite>>,
    state: Res<CharacterState>,
    pending: Res<PendingLoad>,
    cache: Res<TextureCache>,
    mut layers: Query<(&ZmapLayerNode, &mut Visibility), Without<PartSprite>>,
    mut parts: Query<
        (&PartSprite, &mut Sprite, &mut Transform, &mut Visibility),
        Without<ZmapLayerNode>,
    >,
) {
    let mut invalidated = false;
    for _ in invalidations.read() {
        invalidated = true;
    }
    if !invalidated && added_parts.is_empty() {
        return;
    }

    // a pass in flight: the previous scene stays frozen until the rebuild
    if pending.active {
        return;
    }

    if state
        .current_body_frame()
        .is_some_and(|frame| !frame.has_body)
    {
        // render skipped; the previous frame stays visible
        return;
    }

    for (node, mut visibility) in &mut layers {
        let hidden = (node.name == "face" && state.action().is_back())
            || state.is_effect_layer_hidden(&node.name);
        *visibility = if hidden {
            Visibility::Hidden
        } else {
            Visibility::Inherited
        };
    }

    for (part, mut sprite, mut transform, mut visibility) in &mut parts {
        match state.piece_for(&part.layer, part.item_id) {
            Some(placement) => {
                sprite.image = cache.get(&placement.url).unwrap_or_default();
                sprite.color = placement.tint;
                transform.translation.x = placement.position.x;
                transform.translation.y = -placement.position.y;
                *visibility = Visibility::Inherited;
            }
            None => {
                *visibility = Visibility::Hidden;
            }
        }
    }
}
