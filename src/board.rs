// Move legality. The layering is strict by construction: `reachability`
// classifies raw piece movement, check detection consumes only reachability
// (castling candidates never participate), and the legal-destination filter
// sits on top of both. Status effects enter through `MoveEnv`: a warded tile
// stops a ray without being capturable, and a pending jump grant lets a
// sliding mover pass over occupied squares.

use std::collections::BTreeSet;

use enum_map::Enum;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

use crate::coord::{Col, Coord, SubjectiveRow};
use crate::force::Force;
use crate::grid::Grid;
use crate::piece::{PieceId, PieceKind, PieceOnBoard};
use crate::status::StatusLayer;
use crate::util::sort_two;


pub fn direction_forward(force: Force) -> i8 {
    match force {
        Force::White => 1,
        Force::Black => -1,
    }
}

pub fn find_king(grid: &Grid, force: Force) -> Option<Coord> {
    grid.pieces()
        .find(|(_, piece)| piece.kind == PieceKind::King && piece.force == force)
        .map(|(pos, _)| pos)
}

pub fn find_piece(grid: &Grid, id: PieceId) -> Option<(Coord, PieceOnBoard)> {
    grid.pieces().find(|(_, piece)| piece.id == id)
}

pub fn should_promote(force: Force, piece_kind: PieceKind, to: Coord) -> bool {
    let last_row = SubjectiveRow::from_one_based(8).to_row(force);
    piece_kind == PieceKind::Pawn && to.row == last_row
}

// Where a move from `from` to `to` captures, if anywhere. The en-passant
// victim does not stand on the destination square, hence the separate return.
pub fn get_capture(
    grid: &Grid, from: Coord, to: Coord, en_passant_target: Option<Coord>,
) -> Option<Coord> {
    let piece = grid[from]?;
    if let Some(target_piece) = grid[to] {
        if target_piece.force == piece.force {
            None
        } else {
            Some(to)
        }
    } else if piece.kind == PieceKind::Pawn
        && en_passant_target == Some(to)
        && (to.col - from.col).abs() == 1
        && to.row - from.row == direction_forward(piece.force)
    {
        let victim_pos = Coord::new(from.row, to.col);
        match grid[victim_pos] {
            Some(victim) if victim.kind == PieceKind::Pawn && victim.force != piece.force => {
                Some(victim_pos)
            }
            _ => None,
        }
    } else {
        None
    }
}


#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ProtoReachability {
    Ok,
    OkIfCapturing,
    OkIfNonCapturing,
    Blocked,
    Impossible,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Reachability {
    Ok,
    Blocked,
    Impossible,
}

impl Reachability {
    pub fn ok(self) -> bool { self == Reachability::Ok }
}

// Status-effect context for one mover's move computation.
pub struct MoveEnv<'a> {
    pub status: &'a StatusLayer,
    pub jump: bool,
}

impl<'a> MoveEnv<'a> {
    pub fn attack(status: &'a StatusLayer) -> Self {
        MoveEnv { status, jump: false }
    }

    pub fn for_piece(status: &'a StatusLayer, piece: PieceOnBoard) -> Self {
        MoveEnv {
            status,
            jump: piece.kind.is_sliding() && status.jump_pending(piece.force),
        }
    }
}

pub fn reachability(
    grid: &Grid, from: Coord, to: Coord, capturing: bool, env: &MoveEnv,
) -> Reachability {
    use ProtoReachability::*;
    match proto_reachability(grid, from, to, env) {
        Ok => Reachability::Ok,
        OkIfCapturing => {
            if capturing {
                Reachability::Ok
            } else {
                Reachability::Blocked
            }
        }
        OkIfNonCapturing => {
            if !capturing {
                Reachability::Ok
            } else {
                Reachability::Blocked
            }
        }
        Blocked => Reachability::Blocked,
        Impossible => Reachability::Impossible,
    }
}

// Tests that the piece can move in such a way and that the path is free.
// Does not handle castling.
fn proto_reachability(grid: &Grid, from: Coord, to: Coord, env: &MoveEnv) -> ProtoReachability {
    use ProtoReachability::*;
    let proto = proto_reachability_modulo_destination_square(grid, from, to, env);
    match proto {
        Blocked | Impossible => proto,
        Ok | OkIfCapturing | OkIfNonCapturing => {
            if let Some(piece) = grid[to] {
                if piece.force == grid[from].unwrap().force {
                    return Blocked;
                }
            }
            proto
        }
    }
}

fn proto_reachability_modulo_destination_square(
    grid: &Grid, from: Coord, to: Coord, env: &MoveEnv,
) -> ProtoReachability {
    use ProtoReachability::*;
    if to == from {
        return Impossible;
    }
    let Some(piece) = grid[from] else {
        return Impossible;
    };
    let force = piece.force;
    if env.status.is_blocked_for(to, force) {
        return Blocked;
    }

    let (d_row, d_col) = to - from;
    let is_straight_move = d_row == 0 || d_col == 0;
    let is_diagonal_move = d_row.abs() == d_col.abs();
    // Tests the squares between `from` (exclusive) and `to` (exclusive). A
    // jump grant waives occupancy, never a warded tile.
    let has_linear_passage = || {
        let direction = (d_row.signum(), d_col.signum());
        let mut pos = from + direction;
        while pos != to {
            if env.status.is_blocked_for(pos, force) {
                return false;
            }
            if grid[pos].is_some() && !env.jump {
                return false;
            }
            pos = pos + direction;
        }
        true
    };
    let simple_linear_passage = || {
        if has_linear_passage() { Ok } else { Blocked }
    };

    match piece.kind {
        PieceKind::Pawn => {
            let dir_forward = direction_forward(force);
            let second_row = SubjectiveRow::from_one_based(2).to_row(force);
            let valid_capturing_move = d_col.abs() == 1 && d_row == dir_forward;
            let valid_non_capturing_move = d_col == 0
                && (d_row == dir_forward
                    || (from.row == second_row && d_row == dir_forward * 2));
            if valid_capturing_move {
                OkIfCapturing
            } else if valid_non_capturing_move {
                if has_linear_passage() { OkIfNonCapturing } else { Blocked }
            } else {
                Impossible
            }
        }
        PieceKind::Knight => {
            if sort_two((d_row.abs(), d_col.abs())) == (1, 2) { Ok } else { Impossible }
        }
        PieceKind::Bishop => {
            if is_diagonal_move { simple_linear_passage() } else { Impossible }
        }
        PieceKind::Rook => {
            if is_straight_move { simple_linear_passage() } else { Impossible }
        }
        PieceKind::Queen => {
            if is_straight_move || is_diagonal_move {
                simple_linear_passage()
            } else {
                Impossible
            }
        }
        PieceKind::King => {
            if d_row.abs() <= 1 && d_col.abs() <= 1 { Ok } else { Impossible }
        }
    }
}

// Whether the king standing on `king_pos` is attacked. Only raw reachability
// is consulted, so this can never recurse into legality filtering. Warded
// tiles are honored for the attacker: an attack that cannot legally pass a
// ward is no check.
pub fn is_check_to(grid: &Grid, king_pos: Coord, status: &StatusLayer) -> bool {
    let Some(king) = grid[king_pos] else {
        return false;
    };
    let env = MoveEnv::attack(status);
    for (from, piece) in grid.pieces() {
        if piece.force != king.force && reachability(grid, from, king_pos, true, &env).ok() {
            return true;
        }
    }
    false
}

// A force with no king is not "in check"; king absence is a terminal game
// state handled by the turn controller.
pub fn is_in_check(grid: &Grid, force: Force, status: &StatusLayer) -> bool {
    match find_king(grid, force) {
        Some(king_pos) => is_check_to(grid, king_pos, status),
        None => false,
    }
}


#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Enum, EnumIter, Serialize, Deserialize)]
pub enum CastleDirection {
    ASide,
    HSide,
}

impl CastleDirection {
    pub fn rook_home_col(self) -> Col {
        match self {
            CastleDirection::ASide => Col::A,
            CastleDirection::HSide => Col::H,
        }
    }
    pub fn king_destination_col(self) -> Col {
        match self {
            CastleDirection::ASide => Col::C,
            CastleDirection::HSide => Col::G,
        }
    }
    pub fn rook_destination_col(self) -> Col {
        match self {
            CastleDirection::ASide => Col::D,
            CastleDirection::HSide => Col::F,
        }
    }
}

// The castle destination for `side` if castling is currently legal: king and
// rook unmoved on their home squares, every square between them free and
// unwarded, and the king's whole path (its current square included) safe.
fn castle_destination(
    grid: &mut Grid, king_from: Coord, side: CastleDirection, status: &StatusLayer,
) -> Option<Coord> {
    let king = grid[king_from]?;
    if king.kind != PieceKind::King || king.has_moved {
        return None;
    }
    let force = king.force;
    let home_row = SubjectiveRow::from_one_based(1).to_row(force);
    if king_from != Coord::new(home_row, Col::E) {
        return None;
    }
    let rook_from = Coord::new(home_row, side.rook_home_col());
    let rook = match grid[rook_from] {
        Some(piece)
            if piece.kind == PieceKind::Rook && piece.force == force && !piece.has_moved =>
        {
            piece
        }
        _ => return None,
    };
    let king_to = Coord::new(home_row, side.king_destination_col());
    let rook_to = Coord::new(home_row, side.rook_destination_col());

    let (col_min, col_max) = sort_two((king_from.col, rook_from.col));
    for col_idx in (col_min.to_zero_based() + 1)..col_max.to_zero_based() {
        let pos = Coord::new(home_row, Col::from_zero_based(col_idx));
        if grid[pos].is_some() || status.is_blocked_for(pos, force) {
            return None;
        }
    }

    let mut grid = grid.scoped_set(king_from, None);
    let mut grid = grid.scoped_set(rook_from, None);
    let (path_min, path_max) = sort_two((king_from.col, king_to.col));
    for col_idx in path_min.to_zero_based()..=path_max.to_zero_based() {
        let pos = Coord::new(home_row, Col::from_zero_based(col_idx));
        let mut grid = grid.scoped_set(pos, Some(king));
        let safe = if pos == king_to {
            let grid = grid.scoped_set(rook_to, Some(rook));
            !is_check_to(&grid, pos, status)
        } else {
            !is_check_to(&grid, pos, status)
        };
        if !safe {
            return None;
        }
    }
    Some(king_to)
}

// The closed set of squares the piece on `from` may legally move to: reachable
// under its movement pattern and the status layer, and not leaving its own
// king attacked. A frozen piece contributes no moves at all.
pub fn legal_destinations(
    grid: &Grid, from: Coord, en_passant_target: Option<Coord>, status: &StatusLayer,
) -> BTreeSet<Coord> {
    let mut destinations = BTreeSet::new();
    let Some(piece) = grid[from] else {
        return destinations;
    };
    if status.is_frozen(piece.id) {
        return destinations;
    }
    let force = piece.force;
    let env = MoveEnv::for_piece(status, piece);
    let mut grid = grid.clone();
    for to in Coord::all() {
        let capture_or = get_capture(&grid, from, to, en_passant_target);
        if !reachability(&grid, from, to, capture_or.is_some(), &env).ok() {
            continue;
        }
        // Zero out the capture separately because of en passant.
        let mut grid = grid.maybe_scoped_set(capture_or.map(|pos| (pos, None)));
        let mut grid = grid.scoped_set(from, None);
        let grid = grid.scoped_set(to, Some(piece));
        let king_pos = if piece.kind == PieceKind::King { Some(to) } else { find_king(&grid, force) };
        let exposes_own_king = match king_pos {
            Some(pos) => is_check_to(&grid, pos, status),
            None => false,
        };
        if !exposes_own_king {
            destinations.insert(to);
        }
    }
    if piece.kind == PieceKind::King {
        for side in CastleDirection::iter() {
            if let Some(to) = castle_destination(&mut grid, from, side, status) {
                destinations.insert(to);
            }
        }
    }
    destinations
}

pub fn has_any_legal_move(
    grid: &Grid, force: Force, en_passant_target: Option<Coord>, status: &StatusLayer,
) -> bool {
    grid.pieces()
        .filter(|(_, piece)| piece.force == force)
        .any(|(pos, _)| !legal_destinations(grid, pos, en_passant_target, status).is_empty())
}


#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum VictoryReason {
    Checkmate,
    KingCaptured,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum DrawReason {
    Stalemate,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum GameStatus {
    Active,
    Victory(Force, VictoryReason),
    Draw(DrawReason),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum TurnError {
    // No piece behind the handle, or it is not the mover's piece to move.
    InvalidSelection,
    // Destination outside the legal set: unreachable, frozen piece, warded
    // tile or a move that would expose the mover's own king.
    IllegalDestination,
    // A pawn awaits its promotion choice; nothing else is accepted until then.
    PromotionRequired,
    // A promotion choice arrived with no promotion pending.
    NoPendingPromotion,
    // Promotion choice missing where impossible to apply, or to Pawn/King.
    BadPromotion,
    // Card effects are disabled by the rules in play.
    EffectsDisabled,
    GameOver,
}
