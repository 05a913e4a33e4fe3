use std::collections::BTreeSet;
use std::rc::Rc;

use enum_map::EnumMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::board::{
    direction_forward, find_king, find_piece, get_capture, has_any_legal_move, is_in_check,
    legal_destinations, should_promote, CastleDirection, DrawReason, GameStatus, TurnError,
    VictoryReason,
};
use crate::coord::Coord;
use crate::force::Force;
use crate::grid::Grid;
use crate::piece::{PieceId, PieceKind, PieceSnapshot};
use crate::rules::Rules;
use crate::starter::generate_starting_grid;
use crate::status::{StatusLayer, TileBlock};


#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TurnRecord {
    pub force: Force,
    pub piece: PieceId,
    pub from: Coord,
    pub to: Coord,
    pub captured: Option<PieceKind>,
    pub promoted_to: Option<PieceKind>,
}

// Everything a move did, so that callers never need to re-query the board to
// mirror its side effects.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct MoveOutcome {
    pub captured: Option<PieceSnapshot>,
    pub triggered_promotion: bool,
    pub triggered_castle: bool,
    pub new_en_passant_target: Option<Coord>,
    pub terminal: Option<GameStatus>,
}

// Immutable copy of the full game state for rendering and AI consumption.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub pieces: Vec<PieceSnapshot>,
    pub frozen_pieces: Vec<(PieceId, u8)>,
    pub blocked_tiles: Vec<(Coord, TileBlock)>,
    pub extra_turns: EnumMap<Force, u8>,
    pub jump_pending: EnumMap<Force, bool>,
    pub active_force: Force,
    pub en_passant_target: Option<Coord>,
    pub pending_promotion: Option<PieceId>,
    pub status: GameStatus,
}

// The turn state machine. Owns the grid and the status layer; every mutation
// goes through `attempt_move`, `resolve_promotion` or a card effect, and each
// of those either applies in full or rejects without touching anything.
#[derive(Clone, Debug)]
pub struct Game {
    rules: Rc<Rules>,
    grid: Grid,
    en_passant_target: Option<Coord>,
    status_layer: StatusLayer,
    active_force: Force,
    pending_promotion: Option<PieceId>,
    status: GameStatus,
    turn_log: Vec<TurnRecord>,
}

impl Game {
    pub fn new(rules: Rules) -> Self {
        let mut piece_id = PieceId::new();
        let grid = generate_starting_grid(&mut piece_id);
        Self::new_with_grid(rules, grid)
    }

    pub fn new_with_grid(rules: Rules, grid: Grid) -> Self {
        Game {
            rules: Rc::new(rules),
            grid,
            en_passant_target: None,
            status_layer: StatusLayer::new(),
            active_force: Force::White,
            pending_promotion: None,
            status: GameStatus::Active,
            turn_log: Vec::new(),
        }
    }

    pub fn rules(&self) -> &Rules { &self.rules }
    pub fn grid(&self) -> &Grid { &self.grid }
    pub fn status(&self) -> GameStatus { self.status }
    pub fn active_force(&self) -> Force { self.active_force }
    pub fn status_layer(&self) -> &StatusLayer { &self.status_layer }
    pub fn en_passant_target(&self) -> Option<Coord> { self.en_passant_target }
    pub fn pending_promotion(&self) -> Option<PieceId> { self.pending_promotion }
    pub fn turn_log(&self) -> &[TurnRecord] { &self.turn_log }

    pub fn is_in_check(&self, force: Force) -> bool {
        is_in_check(&self.grid, force, &self.status_layer)
    }

    pub fn has_any_legal_move(&self, force: Force) -> bool {
        has_any_legal_move(&self.grid, force, self.en_passant_target, &self.status_layer)
    }

    pub fn request_legal_moves(&self, piece: PieceId) -> Result<BTreeSet<Coord>, TurnError> {
        self.ensure_accepting_moves()?;
        let (from, on_board) = find_piece(&self.grid, piece).ok_or(TurnError::InvalidSelection)?;
        if on_board.force != self.active_force {
            return Err(TurnError::InvalidSelection);
        }
        Ok(legal_destinations(&self.grid, from, self.en_passant_target, &self.status_layer))
    }

    pub fn attempt_move(
        &mut self, piece: PieceId, to: Coord, promote_to: Option<PieceKind>,
    ) -> Result<MoveOutcome, TurnError> {
        self.ensure_accepting_moves()?;
        let (from, moving) = find_piece(&self.grid, piece).ok_or(TurnError::InvalidSelection)?;
        if moving.force != self.active_force {
            return Err(TurnError::InvalidSelection);
        }
        if self.status_layer.is_frozen(piece) {
            return Err(TurnError::IllegalDestination);
        }
        if !legal_destinations(&self.grid, from, self.en_passant_target, &self.status_layer)
            .contains(&to)
        {
            return Err(TurnError::IllegalDestination);
        }
        let force = moving.force;
        let will_promote = should_promote(force, moving.kind, to);
        if let Some(kind) = promote_to {
            if !will_promote || !kind.can_promote_to() {
                return Err(TurnError::BadPromotion);
            }
        }

        // The move is valid. Everything from here on applies as a unit.
        let capture_pos = get_capture(&self.grid, from, to, self.en_passant_target);
        let captured = capture_pos.map(|pos| {
            let victim = self.grid[pos].take().unwrap();
            self.status_layer.forget_piece(victim.id);
            PieceSnapshot {
                id: victim.id,
                kind: victim.kind,
                force: victim.force,
                pos,
                has_moved: victim.has_moved,
            }
        });
        let mut moved = moving;
        moved.has_moved = true;
        self.grid[from] = None;
        self.grid[to] = Some(moved);

        let triggered_castle =
            moving.kind == PieceKind::King && (to.col - from.col).abs() == 2;
        if triggered_castle {
            let side = if to.col > from.col {
                CastleDirection::HSide
            } else {
                CastleDirection::ASide
            };
            let rook_from = Coord::new(from.row, side.rook_home_col());
            let rook_to = Coord::new(from.row, side.rook_destination_col());
            let mut rook = self.grid[rook_from].take().unwrap();
            rook.has_moved = true;
            self.grid[rook_to] = Some(rook);
        }

        let new_en_passant_target =
            if moving.kind == PieceKind::Pawn && (to.row - from.row).abs() == 2 {
                Some(Coord::new(from.row + direction_forward(force), from.col))
            } else {
                None
            };
        self.en_passant_target = new_en_passant_target;

        if moving.kind.is_sliding() && self.status_layer.jump_pending(force) {
            self.status_layer.consume_jump(force);
        }

        self.turn_log.push(TurnRecord {
            force,
            piece,
            from,
            to,
            captured: captured.map(|victim| victim.kind),
            promoted_to: promote_to,
        });

        let mut outcome = MoveOutcome {
            captured,
            triggered_promotion: will_promote,
            triggered_castle,
            new_en_passant_target,
            terminal: None,
        };
        if will_promote {
            match promote_to {
                Some(kind) => self.promote_pawn_at(to, kind),
                None => {
                    debug!("{:?} pawn reached the last rank; awaiting promotion choice", force);
                    self.pending_promotion = Some(piece);
                    return Ok(outcome);
                }
            }
        }
        outcome.terminal = self.finish_turn();
        Ok(outcome)
    }

    pub fn resolve_promotion(&mut self, kind: PieceKind) -> Result<MoveOutcome, TurnError> {
        if self.status != GameStatus::Active {
            return Err(TurnError::GameOver);
        }
        let piece = self.pending_promotion.ok_or(TurnError::NoPendingPromotion)?;
        if !kind.can_promote_to() {
            return Err(TurnError::BadPromotion);
        }
        let (pos, _) = find_piece(&self.grid, piece).ok_or(TurnError::NoPendingPromotion)?;
        self.promote_pawn_at(pos, kind);
        if let Some(record) = self.turn_log.last_mut() {
            record.promoted_to = Some(kind);
        }
        self.pending_promotion = None;
        let terminal = self.finish_turn();
        Ok(MoveOutcome {
            captured: None,
            triggered_promotion: true,
            triggered_castle: false,
            new_en_passant_target: self.en_passant_target,
            terminal,
        })
    }

    // Card-effect binding. Card plays mutate the status layer only; the grid
    // is never touched from here.

    pub fn freeze_piece(&mut self, piece: PieceId, turns: u8) -> Result<(), TurnError> {
        self.ensure_effects_allowed()?;
        let (_, target) = find_piece(&self.grid, piece).ok_or(TurnError::InvalidSelection)?;
        debug!("freezing {:?} {:?} for {} turns", target.force, target.kind, turns);
        self.status_layer.freeze(piece, target.force, turns);
        Ok(())
    }

    pub fn block_tiles(
        &mut self, squares: impl IntoIterator<Item = Coord>, turns: u8, protects: Force,
    ) -> Result<(), TurnError> {
        self.ensure_effects_allowed()?;
        self.status_layer.block_tiles(squares, turns, protects);
        Ok(())
    }

    pub fn grant_jump(&mut self, force: Force) -> Result<(), TurnError> {
        self.ensure_effects_allowed()?;
        self.status_layer.grant_jump(force);
        Ok(())
    }

    pub fn grant_extra_turn(&mut self, force: Force) -> Result<(), TurnError> {
        self.ensure_effects_allowed()?;
        self.status_layer.grant_extra_turn(force);
        Ok(())
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let mut pieces: Vec<PieceSnapshot> = self
            .grid
            .pieces()
            .map(|(pos, piece)| PieceSnapshot {
                id: piece.id,
                kind: piece.kind,
                force: piece.force,
                pos,
                has_moved: piece.has_moved,
            })
            .collect();
        pieces.sort_by_key(|piece| piece.id);
        let mut frozen_pieces: Vec<(PieceId, u8)> = self
            .status_layer
            .frozen_entries()
            .map(|(id, status)| (id, status.turns_left))
            .collect();
        frozen_pieces.sort();
        let mut blocked_tiles: Vec<(Coord, TileBlock)> =
            self.status_layer.blocked_entries().collect();
        blocked_tiles.sort_by_key(|&(pos, _)| pos);
        BoardSnapshot {
            pieces,
            frozen_pieces,
            blocked_tiles,
            extra_turns: EnumMap::from_fn(|force| self.status_layer.extra_turns(force)),
            jump_pending: EnumMap::from_fn(|force| self.status_layer.jump_pending(force)),
            active_force: self.active_force,
            en_passant_target: self.en_passant_target,
            pending_promotion: self.pending_promotion,
            status: self.status,
        }
    }

    fn ensure_accepting_moves(&self) -> Result<(), TurnError> {
        if self.status != GameStatus::Active {
            return Err(TurnError::GameOver);
        }
        if self.pending_promotion.is_some() {
            return Err(TurnError::PromotionRequired);
        }
        Ok(())
    }

    fn ensure_effects_allowed(&self) -> Result<(), TurnError> {
        if !self.rules.status_effects {
            return Err(TurnError::EffectsDisabled);
        }
        if self.status != GameStatus::Active {
            return Err(TurnError::GameOver);
        }
        if self.pending_promotion.is_some() {
            return Err(TurnError::PromotionRequired);
        }
        Ok(())
    }

    fn promote_pawn_at(&mut self, pos: Coord, kind: PieceKind) {
        if let Some(piece) = self.grid[pos].as_mut() {
            piece.kind = kind;
        }
    }

    // End-of-turn resolution: decay the mover's statuses, consume an
    // extra-turn credit if one is pending, and re-derive the terminal state
    // before the next mover gains control.
    fn finish_turn(&mut self) -> Option<GameStatus> {
        let mover = self.active_force;
        self.status_layer.decay(mover);
        let keeps_turn = self.status_layer.take_extra_turn(mover);
        let next = if keeps_turn { mover } else { mover.opponent() };

        if find_king(&self.grid, mover.opponent()).is_none() {
            self.status = GameStatus::Victory(mover, VictoryReason::KingCaptured);
        } else if !self.has_any_legal_move(next) {
            self.status = if self.is_in_check(next) {
                GameStatus::Victory(next.opponent(), VictoryReason::Checkmate)
            } else {
                GameStatus::Draw(DrawReason::Stalemate)
            };
        } else {
            self.active_force = next;
        }
        match self.status {
            GameStatus::Active => None,
            terminal => {
                debug!("game over: {:?}", terminal);
                Some(terminal)
            }
        }
    }
}
