//! Anchor maps: named alignment points shared between pieces.
//!
//! Pieces declare anchors in their own pixel space ("navel", "neck",
//! "handMove", ...). During a build pass the per-frame anchor map accumulates
//! absolute positions for every name any placed piece has declared, letting
//! later pieces align themselves transitively.

use bevy::math::Vec2;

pub const NAVEL: &str = "navel";
pub const HAND_MOVE: &str = "handMove";

/// Seed position for the very first anchor of a frame.
pub const DEFAULT_NAVEL: Vec2 = Vec2::ZERO;

/// Per-frame seeds for the synthetic `handMove` anchor injected for actions
/// that move the hand independently of the torso (alert, heal).
const HAND_MOVE_SEEDS: [Vec2; 3] = [
    Vec2::new(-8.0, -2.0),
    Vec2::new(-10.0, 0.0),
    Vec2::new(-6.0, 2.0),
];

pub fn hand_move_seed(frame: usize) -> Vec2 {
    HAND_MOVE_SEEDS[frame.min(HAND_MOVE_SEEDS.len() - 1)]
}

/// An insertion-ordered anchor-name to point map.
///
/// Iteration order is the order anchors were declared/inserted, which keeps
/// the "first declared anchor that is already placed wins" rule
/// deterministic. The maps are tiny (a handful of entries), so linear scans
/// beat hashing here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnchorMap {
    entries: Vec<(String, Vec2)>,
}

impl AnchorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh frame map seeded with the default navel anchor.
    pub fn with_navel() -> Self {
        let mut map = Self::new();
        map.insert(NAVEL, DEFAULT_NAVEL);
        map
    }

    pub fn get(&self, name: &str) -> Option<Vec2> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| *p)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn insert(&mut self, name: impl Into<String>, point: Vec2) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = point,
            None => self.entries.push((name, point)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Vec2)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), *p))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Vec2)> for AnchorMap {
    fn from_iter<T: IntoIterator<Item = (String, Vec2)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (name, point) in iter {
            map.insert(name, point);
        }
        map
    }
}
