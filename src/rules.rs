use serde::{Deserialize, Serialize};


// One rules engine serves both game modes: plain chess and the card-driven
// variant where freezes, tile wards, jumps and bonus turns are in play.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Rules {
    pub status_effects: bool,
}

impl Rules {
    pub fn classic() -> Self {
        Rules { status_effects: false }
    }

    pub fn arcane() -> Self {
        Rules { status_effects: true }
    }
}
