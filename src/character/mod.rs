//! Character domain: the composition and animation engine.
//!
//! This module handles:
//! - Resolving which sprite piece occupies which render layer
//! - Anchoring pieces to each other frame-by-frame
//! - Instruction sequences and playback state
//! - Diffing equipped items when the descriptor changes

pub mod actions;
pub mod anchor;
pub mod body_frame;
mod character;
pub mod instruction;
pub mod item;
pub mod piece;
#[cfg(test)]
mod tests;
pub mod variant;

use bevy::ecs::message::Message;
use bevy::prelude::*;

pub use actions::{Action, EarType, Expression, HandType};
pub use character::{CharacterState, LoadPass, PiecePlacement, UpdateOutcome};
pub use item::LoadFailure;

use crate::content::data::CharacterDescriptor;
use crate::content::registry::{EquipRegistry, Zmap};

/// Request to apply an external character-state snapshot.
#[derive(Debug)]
pub struct UpdateCharacter(pub CharacterDescriptor);

impl Message for UpdateCharacter {}

/// A full load pass started; the asset layer should fetch its texture set.
#[derive(Debug)]
pub struct LoadPassStarted(pub LoadPass);

impl Message for LoadPassStarted {}

/// Cosmetic state changed; sprites need refreshing without a rebuild.
#[derive(Debug)]
pub struct SceneInvalidated;

impl Message for SceneInvalidated {}

/// A load pass finished with its generation still current; the sprite tree
/// should be rebuilt.
#[derive(Debug)]
pub struct RebuildScene {
    pub generation: u64,
}

impl Message for RebuildScene {}

/// The batch of per-item failures from one load pass, for the notification
/// layer.
#[derive(Debug)]
pub struct LoadFailuresReported {
    pub failures: Vec<LoadFailure>,
}

impl Message for LoadFailuresReported {}

pub struct CharacterPlugin;

impl Plugin for CharacterPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CharacterState>()
            .add_message::<UpdateCharacter>()
            .add_message::<LoadPassStarted>()
            .add_message::<SceneInvalidated>()
            .add_message::<RebuildScene>()
            .add_message::<LoadFailuresReported>()
            .add_systems(Update, apply_character_updates);
    }
}

/// Apply queued descriptor updates to the character state.
fn apply_character_updates(
    mut updates: MessageReader<UpdateCharacter>,
    registry: Res<EquipRegistry>,
    zmap: Res<Zmap>,
    mut state: ResMut<CharacterState>,
    mut load_writer: MessageWriter<LoadPassStarted>,
    mut invalidate_writer: MessageWriter<SceneInvalidated>,
) {
    for UpdateCharacter(descriptor) in updates.read() {
        match state.update(descriptor, &registry, &zmap) {
            UpdateOutcome::FullLoad(pass) => {
                debug!(
                    "load pass {} started: {} textures, {} failures",
                    pass.generation,
                    pass.textures.len(),
                    pass.failures.len()
                );
                load_writer.write(LoadPassStarted(pass));
            }
            UpdateOutcome::Rerender => {
                invalidate_writer.write(SceneInvalidated);
            }
            UpdateOutcome::NoChange => {}
        }
    }
}
