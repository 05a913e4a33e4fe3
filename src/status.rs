use std::collections::HashMap;

use enum_map::{enum_map, EnumMap};
use serde::{Deserialize, Serialize};

use crate::coord::Coord;
use crate::force::Force;
use crate::piece::PieceId;


#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FrozenStatus {
    pub turns_left: u8,
    pub owner: Force,  // whose end-of-turn ticks the counter down
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TileBlock {
    pub turns_left: u8,
    pub protects: Force,  // the one force that may still enter and transit
}

// Time-limited modifiers layered on top of plain chess legality. Every entry
// is owner-scoped: it ticks down when the owning force's turn concludes, not
// the opponent's. The layer never touches the grid itself.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct StatusLayer {
    frozen: HashMap<PieceId, FrozenStatus>,
    blocked_tiles: HashMap<Coord, TileBlock>,
    extra_turns: EnumMap<Force, u8>,
    next_move_jump: EnumMap<Force, bool>,
}

impl StatusLayer {
    pub fn new() -> Self {
        StatusLayer {
            frozen: HashMap::new(),
            blocked_tiles: HashMap::new(),
            extra_turns: enum_map! { _ => 0 },
            next_move_jump: enum_map! { _ => false },
        }
    }

    pub fn is_frozen(&self, id: PieceId) -> bool {
        self.frozen.contains_key(&id)
    }

    pub fn frozen_turns_left(&self, id: PieceId) -> Option<u8> {
        self.frozen.get(&id).map(|status| status.turns_left)
    }

    // Re-freezing keeps the larger of the two remaining durations, so a fresh
    // cast can extend but never shorten an existing freeze.
    pub fn freeze(&mut self, id: PieceId, owner: Force, turns: u8) {
        if turns == 0 {
            return;
        }
        let status = self.frozen.entry(id).or_insert(FrozenStatus { turns_left: 0, owner });
        status.owner = owner;
        status.turns_left = status.turns_left.max(turns);
    }

    // Drops all effects attached to a piece that left the board.
    pub fn forget_piece(&mut self, id: PieceId) {
        self.frozen.remove(&id);
    }

    pub fn is_blocked_for(&self, pos: Coord, mover: Force) -> bool {
        self.blocked_tiles.get(&pos).is_some_and(|block| block.protects != mover)
    }

    pub fn block_tiles(
        &mut self, squares: impl IntoIterator<Item = Coord>, turns: u8, protects: Force,
    ) {
        if turns == 0 {
            return;
        }
        for pos in squares {
            let block =
                self.blocked_tiles.entry(pos).or_insert(TileBlock { turns_left: 0, protects });
            if block.protects == protects {
                block.turns_left = block.turns_left.max(turns);
            } else {
                // The tile changes hands: the latest cast wins outright.
                *block = TileBlock { turns_left: turns, protects };
            }
        }
    }

    // One-shot: a second grant while one is pending is a no-op, not an error.
    pub fn grant_jump(&mut self, force: Force) {
        self.next_move_jump[force] = true;
    }

    pub fn jump_pending(&self, force: Force) -> bool {
        self.next_move_jump[force]
    }

    pub fn consume_jump(&mut self, force: Force) {
        self.next_move_jump[force] = false;
    }

    // Credits never stack: a re-grant while one is pending overwrites.
    pub fn grant_extra_turn(&mut self, force: Force) {
        self.extra_turns[force] = 1;
    }

    pub fn extra_turns(&self, force: Force) -> u8 {
        self.extra_turns[force]
    }

    pub fn take_extra_turn(&mut self, force: Force) -> bool {
        if self.extra_turns[force] > 0 {
            self.extra_turns[force] -= 1;
            true
        } else {
            false
        }
    }

    // Called once when `ended`'s portion of a turn concludes. Extra-turn
    // credits are consumed by the turn controller via `take_extra_turn`, not
    // decayed here.
    pub fn decay(&mut self, ended: Force) {
        self.frozen.retain(|_, status| {
            if status.owner == ended {
                status.turns_left = status.turns_left.saturating_sub(1);
            }
            status.turns_left > 0
        });
        self.blocked_tiles.retain(|_, block| {
            if block.protects == ended {
                block.turns_left = block.turns_left.saturating_sub(1);
            }
            block.turns_left > 0
        });
        self.next_move_jump[ended] = false;
    }

    pub fn frozen_entries(&self) -> impl Iterator<Item = (PieceId, FrozenStatus)> + '_ {
        self.frozen.iter().map(|(&id, &status)| (id, status))
    }

    pub fn blocked_entries(&self) -> impl Iterator<Item = (Coord, TileBlock)> + '_ {
        self.blocked_tiles.iter().map(|(&pos, &block)| (pos, block))
    }
}
