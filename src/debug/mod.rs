//! Dev-tools overlay for fast iteration.
//!
//! Keyboard shortcuts while the preview runs:
//! - F3: dump the character's current state to the log
//! - Space: toggle playback
//! - E: toggle effect-layer visibility

use bevy::prelude::*;

use crate::character::{CharacterState, SceneInvalidated};
use crate::render::LoadingIndicator;

pub struct DebugPlugin;

impl Plugin for DebugPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, handle_debug_keys);
    }
}

fn handle_debug_keys(
    keys: Res<ButtonInput<KeyCode>>,
    indicator: Res<LoadingIndicator>,
    mut state: ResMut<CharacterState>,
    mut invalidate_writer: MessageWriter<SceneInvalidated>,
) {
    if keys.just_pressed(KeyCode::F3) {
        info!(
            "action={:?} expression={:?} frame={} instruction={}/{} generation={} loading={}",
            state.action(),
            state.expression(),
            state.frame(),
            state.instruction_index,
            state.instructions.len(),
            state.generation(),
            indicator.visible,
        );
        info!("locks: {:?}", state.locks);
        info!("effect layers: {:?}", state.effect_layers());
    }

    if keys.just_pressed(KeyCode::Space) {
        if state.is_playing() {
            state.stop();
        } else {
            state.play(None);
        }
        invalidate_writer.write(SceneInvalidated);
    }

    if keys.just_pressed(KeyCode::KeyE) {
        state.toggle_effect_visibility(None, true);
        invalidate_writer.write(SceneInvalidated);
    }
}
