#![allow(dead_code)]  // not every integration test uses every helper

use arcane_chess::coord::Coord;
use arcane_chess::force::Force;
use arcane_chess::game::Game;
use arcane_chess::piece::{PieceKind, PieceOnBoard};
use arcane_chess::test_util::piece_id_at;
use std::collections::BTreeSet;


#[derive(Clone, Copy, Debug)]
pub struct PieceMatcher {
    pub kind: PieceKind,
    pub force: Force,
}

pub trait PieceIs {
    fn is(self, matcher: PieceMatcher) -> bool;
}

impl PieceIs for Option<PieceOnBoard> {
    fn is(self, matcher: PieceMatcher) -> bool {
        if let Some(piece) = self {
            piece.kind == matcher.kind && piece.force == matcher.force
        } else {
            false
        }
    }
}

#[macro_export]
macro_rules! piece {
    ($force:ident $kind:ident) => {
        common::PieceMatcher {
            force: arcane_chess::force::Force::$force,
            kind: arcane_chess::piece::PieceKind::$kind,
        }
    };
}

pub fn legal_moves_at(game: &Game, pos: Coord) -> BTreeSet<Coord> {
    game.request_legal_moves(piece_id_at(game, pos)).unwrap()
}
