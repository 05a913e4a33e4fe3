use crate::coord::{Col, Coord, Row, NUM_ROWS};
use crate::force::Force;
use crate::grid::Grid;
use crate::piece::{PieceId, PieceKind, PieceOnBoard};


fn new_white(kind: PieceKind) -> PieceOnBoard {
    PieceOnBoard::new(PieceId::tmp(), kind, Force::White)
}

fn setup_white_pawns_on_2nd_row(grid: &mut Grid) {
    for col in Col::all() {
        grid[Coord::new(Row::_2, col)] = Some(new_white(PieceKind::Pawn));
    }
}

fn setup_black_pieces_mirrorlike(grid: &mut Grid) {
    for coord in Coord::all() {
        if let Some(piece) = grid[coord] {
            if piece.force == Force::White {
                let mirror_row = Row::from_zero_based(NUM_ROWS - coord.row.to_zero_based() - 1);
                let mirror_coord = Coord::new(mirror_row, coord.col);
                assert!(grid[mirror_coord].is_none(), "{:?}", grid);
                grid[mirror_coord] = Some(PieceOnBoard { force: Force::Black, ..piece });
            }
        }
    }
}

// Replaces placeholder ids with real ones. Also used by tests that build
// custom positions square by square.
pub fn assign_piece_ids(grid: &mut Grid, piece_id: &mut PieceId) {
    for coord in Coord::all() {
        if let Some(piece) = grid[coord] {
            grid[coord] = Some(PieceOnBoard { id: piece_id.inc(), ..piece });
        }
    }
}

pub fn starting_piece_row() -> [PieceKind; 8] {
    use PieceKind::*;
    [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook]
}

pub fn generate_starting_grid(piece_id: &mut PieceId) -> Grid {
    let mut grid = Grid::new();
    for (col, kind) in starting_piece_row().into_iter().enumerate() {
        let coord = Coord::new(Row::_1, Col::from_zero_based(col as u8));
        grid[coord] = Some(new_white(kind));
    }
    setup_white_pawns_on_2nd_row(&mut grid);
    setup_black_pieces_mirrorlike(&mut grid);
    assign_piece_ids(&mut grid, piece_id);
    grid
}
