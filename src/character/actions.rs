//! Character attribute enums: actions, facial expressions, ear and hand types.
//!
//! Actions double as variant keys into equip definitions, so they derive
//! `Ord` and serde traits for use as map keys.

use serde::{Deserialize, Serialize};

/// Body animation states a character can be in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Action {
    Stand1,
    Stand2,
    #[default]
    Walk1,
    Walk2,
    Alert,
    Heal,
    Fly,
    Jump,
    Ladder,
    Rope,
    Prone,
    Sit,
}

impl Action {
    /// Actions viewed from behind; the face layer is hidden for these.
    pub fn is_back(self) -> bool {
        matches!(self, Action::Ladder | Action::Rope)
    }

    /// Actions whose instruction sequence plays forward then back.
    pub fn is_bounce(self) -> bool {
        matches!(self, Action::Stand1 | Action::Stand2 | Action::Alert)
    }

    /// The one-hand/two-hand counterpart of a stand or walk action.
    pub fn swapped_variant(self) -> Option<Action> {
        match self {
            Action::Stand1 => Some(Action::Stand2),
            Action::Stand2 => Some(Action::Stand1),
            Action::Walk1 => Some(Action::Walk2),
            Action::Walk2 => Some(Action::Walk1),
            _ => None,
        }
    }

    /// Resolve the action the given hand type demands. Stand and walk come in
    /// single-hand (`*1`) and double-hand (`*2`) flavors; everything else is
    /// hand-agnostic.
    pub fn for_hand_type(self, hand_type: HandType) -> Action {
        match (self, hand_type) {
            (Action::Stand2, HandType::SingleHand) => Action::Stand1,
            (Action::Stand1, HandType::DoubleHand) => Action::Stand2,
            (Action::Walk2, HandType::SingleHand) => Action::Walk1,
            (Action::Walk1, HandType::DoubleHand) => Action::Walk2,
            _ => self,
        }
    }
}

/// Facial expressions; face-category items key their variants by these.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Expression {
    #[default]
    Default,
    Blink,
    Hit,
    Smile,
    Troubled,
    Cry,
    Angry,
    Bewildered,
    Stunned,
    Oops,
    Cheers,
    Chu,
    Wink,
    Pain,
    Hum,
}

/// Expressions with an open eye region; only these take an eye dye overlay.
pub const EXPRESSIONS_WITH_EYE: [Expression; 9] = [
    Expression::Default,
    Expression::Smile,
    Expression::Troubled,
    Expression::Cry,
    Expression::Angry,
    Expression::Bewildered,
    Expression::Stunned,
    Expression::Oops,
    Expression::Hum,
];

impl Expression {
    pub fn has_eye(self) -> bool {
        EXPRESSIONS_WITH_EYE.contains(&self)
    }
}

/// Ear variants. Piece definitions carry ear-specific sub-pieces; only the
/// one matching the character's configured type is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EarType {
    #[default]
    HumanEar,
    Ear,
    HighLefEar,
    HighFloraEar,
}

impl EarType {
    /// The layer-key spelling used inside piece definitions.
    pub fn data_name(self) -> &'static str {
        match self {
            EarType::HumanEar => "humanEar",
            EarType::Ear => "ear",
            EarType::HighLefEar => "highlefEar",
            EarType::HighFloraEar => "highFloraEar",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HandType {
    #[default]
    SingleHand,
    DoubleHand,
}
