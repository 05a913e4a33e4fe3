// Test utilities kept in the library so that integration tests and any
// stress tooling can share them.

use rand::{Rng, SeedableRng};

use crate::board::TurnError;
use crate::coord::Coord;
use crate::force::Force;
use crate::game::{Game, MoveOutcome};
use crate::grid::Grid;
use crate::piece::{PieceId, PieceKind, PieceOnBoard};
use crate::rules::Rules;
use crate::starter::assign_piece_ids;


// In theory random tests verify properties that should always hold, but let's
// fix the seed to avoid sporadic failures.
pub fn deterministic_rng() -> impl Rng {
    rand::rngs::StdRng::from_seed([0; 32])
}

// Builds a game from an explicit piece list; ids are assigned in scan order.
pub fn custom_game(rules: Rules, pieces: &[(Coord, Force, PieceKind)]) -> Game {
    custom_game_with_grid(rules, |grid| {
        for &(pos, force, kind) in pieces {
            grid[pos] = Some(PieceOnBoard::new(PieceId::tmp(), kind, force));
        }
    })
}

pub fn custom_game_with_grid(rules: Rules, build: impl FnOnce(&mut Grid)) -> Game {
    let mut grid = Grid::new();
    build(&mut grid);
    let mut piece_id = PieceId::new();
    assign_piece_ids(&mut grid, &mut piece_id);
    Game::new_with_grid(rules, grid)
}

pub fn piece_id_at(game: &Game, pos: Coord) -> PieceId {
    game.grid()[pos].unwrap().id
}

// Moves whatever stands on `from`; promotion choices are passed separately.
pub fn make_move(game: &mut Game, from: Coord, to: Coord) -> Result<MoveOutcome, TurnError> {
    let piece = piece_id_at(game, from);
    game.attempt_move(piece, to, None)
}

pub fn replay_moves(game: &mut Game, moves: &[(Coord, Coord)]) -> Result<(), TurnError> {
    for &(from, to) in moves {
        make_move(game, from, to)?;
    }
    Ok(())
}
