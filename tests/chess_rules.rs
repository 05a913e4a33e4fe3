mod common;

use std::collections::BTreeSet;

use arcane_chess::board::{DrawReason, GameStatus, TurnError, VictoryReason};
use arcane_chess::coord::Coord;
use arcane_chess::force::Force;
use arcane_chess::game::Game;
use arcane_chess::piece::{PieceId, PieceKind, PieceOnBoard};
use arcane_chess::rules::Rules;
use arcane_chess::test_util::{
    custom_game, custom_game_with_grid, deterministic_rng, make_move, piece_id_at, replay_moves,
};
use common::{legal_moves_at, PieceIs};
use pretty_assertions::assert_eq;
use rand::Rng;
use strum::IntoEnumIterator;


#[test]
fn pawn_moves_from_the_starting_rank() {
    let game = Game::new(Rules::classic());
    assert_eq!(legal_moves_at(&game, Coord::E2), BTreeSet::from([Coord::E3, Coord::E4]));
}

#[test]
fn knight_moves_from_the_starting_rank() {
    let game = Game::new(Rules::classic());
    assert_eq!(legal_moves_at(&game, Coord::B1), BTreeSet::from([Coord::A3, Coord::C3]));
}

#[test]
fn blocked_pawn_has_no_moves() {
    let mut game = Game::new(Rules::classic());
    replay_moves(&mut game, &[(Coord::E2, Coord::E4), (Coord::E7, Coord::E5)]).unwrap();
    assert!(legal_moves_at(&game, Coord::E4).is_empty());
}

#[test]
fn en_passant_lifecycle() {
    let mut game = Game::new(Rules::classic());
    let outcome = make_move(&mut game, Coord::E2, Coord::E4).unwrap();
    assert_eq!(outcome.new_en_passant_target, Some(Coord::E3));
    assert_eq!(game.en_passant_target(), Some(Coord::E3));

    make_move(&mut game, Coord::A7, Coord::A6).unwrap();
    assert_eq!(game.en_passant_target(), None);

    make_move(&mut game, Coord::E4, Coord::E5).unwrap();
    let outcome = make_move(&mut game, Coord::F7, Coord::F5).unwrap();
    assert_eq!(outcome.new_en_passant_target, Some(Coord::F6));

    // The pawn that was passed by may capture onto the skipped square.
    assert!(legal_moves_at(&game, Coord::E5).contains(&Coord::F6));
    let outcome = make_move(&mut game, Coord::E5, Coord::F6).unwrap();
    let captured = outcome.captured.unwrap();
    assert_eq!(captured.kind, PieceKind::Pawn);
    assert_eq!(captured.force, Force::Black);
    assert_eq!(captured.pos, Coord::F5);
    assert_eq!(game.grid()[Coord::F5], None);
    assert!(game.grid()[Coord::F6].is(piece!(White Pawn)));
}

#[test]
fn en_passant_expires_after_one_ply() {
    let mut game = Game::new(Rules::classic());
    replay_moves(&mut game, &[
        (Coord::E2, Coord::E4),
        (Coord::A7, Coord::A6),
        (Coord::E4, Coord::E5),
        (Coord::F7, Coord::F5),
        (Coord::B2, Coord::B3),  // declines the capture
        (Coord::A6, Coord::A5),
    ])
    .unwrap();
    assert_eq!(game.en_passant_target(), None);
    assert!(!legal_moves_at(&game, Coord::E5).contains(&Coord::F6));
}

fn bare_castling_game() -> Game {
    custom_game(Rules::classic(), &[
        (Coord::E1, Force::White, PieceKind::King),
        (Coord::A1, Force::White, PieceKind::Rook),
        (Coord::H1, Force::White, PieceKind::Rook),
        (Coord::E8, Force::Black, PieceKind::King),
    ])
}

#[test]
fn castling_both_sides_available() {
    let game = bare_castling_game();
    let moves = legal_moves_at(&game, Coord::E1);
    assert!(moves.contains(&Coord::G1));
    assert!(moves.contains(&Coord::C1));
}

#[test]
fn castling_applies_rook_relocation() {
    let mut game = bare_castling_game();
    let outcome = make_move(&mut game, Coord::E1, Coord::G1).unwrap();
    assert!(outcome.triggered_castle);
    assert!(game.grid()[Coord::G1].is(piece!(White King)));
    assert!(game.grid()[Coord::F1].is(piece!(White Rook)));
    assert_eq!(game.grid()[Coord::E1], None);
    assert_eq!(game.grid()[Coord::H1], None);
}

#[test]
fn castling_denied_through_attacked_square() {
    // A rook on f8 holds f1; kingside transit is unsafe, queenside is fine.
    let game = custom_game(Rules::classic(), &[
        (Coord::E1, Force::White, PieceKind::King),
        (Coord::A1, Force::White, PieceKind::Rook),
        (Coord::H1, Force::White, PieceKind::Rook),
        (Coord::E8, Force::Black, PieceKind::King),
        (Coord::F8, Force::Black, PieceKind::Rook),
    ]);
    let moves = legal_moves_at(&game, Coord::E1);
    assert!(!moves.contains(&Coord::G1));
    assert!(moves.contains(&Coord::C1));
}

#[test]
fn castling_denied_while_in_check() {
    let game = custom_game(Rules::classic(), &[
        (Coord::E1, Force::White, PieceKind::King),
        (Coord::A1, Force::White, PieceKind::Rook),
        (Coord::H1, Force::White, PieceKind::Rook),
        (Coord::E8, Force::Black, PieceKind::Rook),
        (Coord::H8, Force::Black, PieceKind::King),
    ]);
    assert!(game.is_in_check(Force::White));
    let moves = legal_moves_at(&game, Coord::E1);
    assert!(!moves.contains(&Coord::G1));
    assert!(!moves.contains(&Coord::C1));
    assert!(!moves.contains(&Coord::E2));
}

#[test]
fn castling_denied_after_rook_moved() {
    let game = custom_game_with_grid(Rules::classic(), |grid| {
        grid[Coord::E1] = Some(PieceOnBoard::new(PieceId::tmp(), PieceKind::King, Force::White));
        grid[Coord::A1] = Some(PieceOnBoard::new(PieceId::tmp(), PieceKind::Rook, Force::White));
        let mut rook = PieceOnBoard::new(PieceId::tmp(), PieceKind::Rook, Force::White);
        rook.has_moved = true;
        grid[Coord::H1] = Some(rook);
        grid[Coord::E8] = Some(PieceOnBoard::new(PieceId::tmp(), PieceKind::King, Force::Black));
    });
    let moves = legal_moves_at(&game, Coord::E1);
    assert!(!moves.contains(&Coord::G1));
    assert!(moves.contains(&Coord::C1));
}

#[test]
fn castling_denied_when_transit_occupied() {
    let game = custom_game(Rules::classic(), &[
        (Coord::E1, Force::White, PieceKind::King),
        (Coord::A1, Force::White, PieceKind::Rook),
        (Coord::B1, Force::White, PieceKind::Knight),
        (Coord::H1, Force::White, PieceKind::Rook),
        (Coord::E8, Force::Black, PieceKind::King),
    ]);
    let moves = legal_moves_at(&game, Coord::E1);
    assert!(moves.contains(&Coord::G1));
    assert!(!moves.contains(&Coord::C1));
}

#[test]
fn pinned_rook_may_only_move_along_the_pin() {
    let game = custom_game(Rules::classic(), &[
        (Coord::E1, Force::White, PieceKind::King),
        (Coord::E2, Force::White, PieceKind::Rook),
        (Coord::E8, Force::Black, PieceKind::Rook),
        (Coord::H8, Force::Black, PieceKind::King),
    ]);
    assert_eq!(
        legal_moves_at(&game, Coord::E2),
        BTreeSet::from([Coord::E3, Coord::E4, Coord::E5, Coord::E6, Coord::E7, Coord::E8]),
    );
}

#[test]
fn fools_mate_is_checkmate() {
    let mut game = Game::new(Rules::classic());
    replay_moves(&mut game, &[
        (Coord::F2, Coord::F3),
        (Coord::E7, Coord::E5),
        (Coord::G2, Coord::G4),
    ])
    .unwrap();
    let outcome = make_move(&mut game, Coord::D8, Coord::H4).unwrap();
    assert_eq!(outcome.terminal, Some(GameStatus::Victory(Force::Black, VictoryReason::Checkmate)));
    assert_eq!(game.status(), GameStatus::Victory(Force::Black, VictoryReason::Checkmate));
    assert_eq!(make_move(&mut game, Coord::E2, Coord::E4), Err(TurnError::GameOver));
}

#[test]
fn stalemate_is_a_draw() {
    let mut game = custom_game(Rules::classic(), &[
        (Coord::D4, Force::White, PieceKind::King),
        (Coord::G6, Force::White, PieceKind::Queen),
        (Coord::H8, Force::Black, PieceKind::King),
    ]);
    let outcome = make_move(&mut game, Coord::G6, Coord::F7).unwrap();
    assert_eq!(outcome.terminal, Some(GameStatus::Draw(DrawReason::Stalemate)));
    assert!(!game.is_in_check(Force::Black));
    assert!(!game.has_any_legal_move(Force::Black));
}

#[test]
fn selection_errors() {
    let mut game = Game::new(Rules::classic());
    // Not White's piece to move.
    let black_pawn = piece_id_at(&game, Coord::E7);
    assert_eq!(game.attempt_move(black_pawn, Coord::E5, None), Err(TurnError::InvalidSelection));
    assert_eq!(game.request_legal_moves(black_pawn), Err(TurnError::InvalidSelection));

    // A captured piece's handle goes stale.
    replay_moves(&mut game, &[(Coord::E2, Coord::E4), (Coord::D7, Coord::D5)]).unwrap();
    let victim = piece_id_at(&game, Coord::D5);
    make_move(&mut game, Coord::E4, Coord::D5).unwrap();
    assert_eq!(game.attempt_move(victim, Coord::D4, None), Err(TurnError::InvalidSelection));

    // Reachable-looking but illegal destination.
    let knight = piece_id_at(&game, Coord::G8);
    assert_eq!(game.attempt_move(knight, Coord::E4, None), Err(TurnError::IllegalDestination));
}

#[test]
fn move_outcome_reports_all_side_effects() {
    let mut game = Game::new(Rules::classic());
    let outcome = make_move(&mut game, Coord::E2, Coord::E4).unwrap();
    assert_eq!(outcome.captured, None);
    assert!(!outcome.triggered_promotion);
    assert!(!outcome.triggered_castle);
    assert_eq!(outcome.new_en_passant_target, Some(Coord::E3));
    assert_eq!(outcome.terminal, None);

    make_move(&mut game, Coord::D7, Coord::D5).unwrap();
    let outcome = make_move(&mut game, Coord::E4, Coord::D5).unwrap();
    let captured = outcome.captured.unwrap();
    assert_eq!((captured.kind, captured.force, captured.pos), (PieceKind::Pawn, Force::Black, Coord::D5));
    assert_eq!(outcome.new_en_passant_target, None);

    let log = game.turn_log();
    assert_eq!(log.len(), 3);
    assert_eq!((log[2].from, log[2].to), (Coord::E4, Coord::D5));
    assert_eq!(log[2].captured, Some(PieceKind::Pawn));
}

// Plays pseudo-random legal moves and asserts the invariants that must hold
// in every reachable position.
#[test]
fn random_playout_preserves_invariants() {
    let mut rng = deterministic_rng();
    let mut game = Game::new(Rules::classic());
    for _ in 0..200 {
        if game.status() != GameStatus::Active {
            break;
        }
        let mover = game.active_force();
        let snapshot = game.snapshot();
        let mut candidates = Vec::new();
        for piece in snapshot.pieces.iter().filter(|piece| piece.force == mover) {
            for to in game.request_legal_moves(piece.id).unwrap() {
                candidates.push((piece.id, to));
            }
        }
        assert!(!candidates.is_empty(), "active force must have moves in an active game");
        let (piece, to) = candidates[rng.random_range(0..candidates.len())];
        let outcome = game.attempt_move(piece, to, None).unwrap();
        if outcome.triggered_promotion && game.pending_promotion().is_some() {
            game.resolve_promotion(PieceKind::Queen).unwrap();
        }
        assert!(!game.is_in_check(mover), "a move may never leave the mover in check:\n{}", game.grid());

        let snapshot = game.snapshot();
        let positions: BTreeSet<Coord> = snapshot.pieces.iter().map(|piece| piece.pos).collect();
        assert_eq!(positions.len(), snapshot.pieces.len(), "two pieces share a square");
        for force in Force::iter() {
            let kings = snapshot
                .pieces
                .iter()
                .filter(|piece| piece.force == force && piece.kind == PieceKind::King)
                .count();
            assert!(kings <= 1);
        }
    }
}
