//! Core domain: app state for the preview flow.

use bevy::prelude::*;

#[derive(States, Debug, Hash, Eq, PartialEq, Clone, Default)]
pub enum PreviewState {
    /// Static content is still loading.
    #[default]
    Boot,
    /// Content loaded; the preview is live.
    Ready,
}
