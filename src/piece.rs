use derive_new::new;
use enum_map::Enum;
use serde::{Deserialize, Serialize};
use strum::EnumIter;

use crate::coord::Coord;
use crate::force::Force;


#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Enum, EnumIter, Serialize, Deserialize)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub fn is_sliding(self) -> bool {
        use PieceKind::*;
        matches!(self, Bishop | Rook | Queen)
    }

    pub fn can_promote_to(self) -> bool {
        use PieceKind::*;
        match self {
            Pawn | King => false,
            Knight | Bishop | Rook | Queen => true,
        }
    }
}

// Stable piece identity. Ids are assigned once at setup and survive moves and
// promotion; two same-looking pieces never compare equal by accident.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize,
)]
pub struct PieceId(u32);

impl PieceId {
    pub fn new() -> Self { PieceId(1) }

    // Placeholder for pieces whose real id is assigned later (see `starter`).
    pub fn tmp() -> Self { PieceId(0) }

    pub fn inc(&mut self) -> PieceId {
        let ret = *self;
        self.0 += 1;
        ret
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, new, Serialize, Deserialize)]
pub struct PieceOnBoard {
    pub id: PieceId,
    pub kind: PieceKind,
    pub force: Force,
    #[new(value = "false")]
    pub has_moved: bool,
}

// A piece as reported to the outside: captured-piece records in move outcomes
// and the pieces section of a board snapshot.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PieceSnapshot {
    pub id: PieceId,
    pub kind: PieceKind,
    pub force: Force,
    pub pos: Coord,
    pub has_moved: bool,
}

pub fn piece_to_pictogram(piece_kind: PieceKind, force: Force) -> char {
    use self::Force::*;
    use self::PieceKind::*;
    match (force, piece_kind) {
        (White, Pawn) => '♙',
        (White, Knight) => '♘',
        (White, Bishop) => '♗',
        (White, Rook) => '♖',
        (White, Queen) => '♕',
        (White, King) => '♔',
        (Black, Pawn) => '♟',
        (Black, Knight) => '♞',
        (Black, Bishop) => '♝',
        (Black, Rook) => '♜',
        (Black, Queen) => '♛',
        (Black, King) => '♚',
    }
}
