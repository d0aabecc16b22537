//! Core domain: app states, camera, and the preview bootstrap.

mod state;

use bevy::prelude::*;

pub use state::PreviewState;

use crate::character::{LoadFailuresReported, UpdateCharacter};
use crate::content::registry::DefaultCharacter;

pub struct CorePlugin;

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<PreviewState>()
            .add_systems(Startup, setup_camera)
            .add_systems(OnEnter(PreviewState::Ready), spawn_default_character)
            .add_systems(Update, report_load_failures);
    }
}

fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

/// Apply the shipped default descriptor once content is ready.
fn spawn_default_character(
    default_character: Res<DefaultCharacter>,
    mut updates: MessageWriter<UpdateCharacter>,
) {
    if default_character.0.items.is_empty() {
        warn!("default character has no items; waiting for an external update");
        return;
    }
    updates.write(UpdateCharacter(default_character.0.clone()));
}

/// The notification layer's narrow interface: one batch of failed item ids
/// per load pass.
fn report_load_failures(mut reports: MessageReader<LoadFailuresReported>) {
    for report in reports.read() {
        let ids: Vec<u32> = report.failures.iter().map(|f| f.id).collect();
        warn!("{} items failed to load: {ids:?}", report.failures.len());
        for failure in &report.failures {
            warn!("  equip {}: {}", failure.id, failure.reason);
        }
    }
}
