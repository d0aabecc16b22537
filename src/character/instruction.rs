//! Animation instruction sequences.
//!
//! One instruction is one step of playback: which (action, frame) to show
//! and for how long. Sequences are derived from the body item's frame set;
//! stand and alert poses "bounce" (play forward, then back through the
//! interior frames).

use bevy::math::Vec2;

use super::actions::Action;
use super::variant::ItemVariant;

/// Fallback delay for frames whose definition carries none.
pub const DEFAULT_FRAME_DELAY: u32 = 120;

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub action: Action,
    pub frame: usize,
    /// How long this step is shown, in milliseconds.
    pub delay: u32,
    /// Optional per-step positional offset (e.g. movement poses).
    pub movement: Option<Vec2>,
}

/// Generate the playback sequence for `action` from the body variant.
///
/// Bounce actions with `n >= 2` frames play `0..n-1` forward and then the
/// strict interior `n-2..=1` in reverse, giving `2n - 3` steps. Single-frame
/// bounce actions degrade to one step with no reverse segment.
pub fn build_instructions(action: Action, body: &ItemVariant) -> Vec<Instruction> {
    let n = body.frame_count;
    if n == 0 {
        return Vec::new();
    }

    let frames: Vec<usize> = if action.is_bounce() && n >= 2 {
        (0..n - 1).chain((1..n - 1).rev()).collect()
    } else {
        (0..n).collect()
    };

    frames
        .into_iter()
        .map(|frame| Instruction {
            action,
            frame,
            delay: body
                .delay_at(frame)
                .filter(|&d| d > 0)
                .unwrap_or(DEFAULT_FRAME_DELAY),
            movement: None,
        })
        .collect()
}
