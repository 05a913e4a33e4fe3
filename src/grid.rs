use std::{fmt, ops};

use ndarray::{Array, Array2};
use serde::{Deserialize, Serialize};

use crate::coord::{Coord, NUM_COLS, NUM_ROWS};
use crate::piece::{piece_to_pictogram, PieceOnBoard};


// Piece container: occupancy by square and nothing else. Rules live in `board`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    data: Array2<Option<PieceOnBoard>>,
}

impl Grid {
    pub fn new() -> Self {
        Grid {
            data: Array::from_elem((NUM_ROWS as usize, NUM_COLS as usize), None),
        }
    }

    pub fn pieces(&self) -> impl Iterator<Item = (Coord, PieceOnBoard)> + '_ {
        Coord::all().filter_map(|pos| self[pos].map(|piece| (pos, piece)))
    }

    // Temporarily replaces the content of a square. The original content is
    // restored when the returned guard goes out of scope; guards nest.
    pub fn scoped_set(&mut self, pos: Coord, piece: Option<PieceOnBoard>) -> ScopedSet<'_> {
        let original = self[pos].take();
        self[pos] = piece;
        ScopedSet { saved: Some((pos, original)), grid: self }
    }

    pub fn maybe_scoped_set(
        &mut self, change: Option<(Coord, Option<PieceOnBoard>)>,
    ) -> ScopedSet<'_> {
        let saved = change.map(|(pos, new_piece)| {
            let original = self[pos].take();
            self[pos] = new_piece;
            (pos, original)
        });
        ScopedSet { saved, grid: self }
    }
}

pub struct ScopedSet<'a> {
    grid: &'a mut Grid,
    saved: Option<(Coord, Option<PieceOnBoard>)>,
}

impl ops::Deref for ScopedSet<'_> {
    type Target = Grid;
    fn deref(&self) -> &Self::Target { self.grid }
}

impl ops::DerefMut for ScopedSet<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target { self.grid }
}

impl Drop for ScopedSet<'_> {
    fn drop(&mut self) {
        if let Some((pos, original)) = self.saved.take() {
            self.grid[pos] = original;
        }
    }
}

fn coord_to_index(pos: Coord) -> [usize; 2] {
    [pos.row.to_zero_based() as usize, pos.col.to_zero_based() as usize]
}

impl ops::Index<Coord> for Grid {
    type Output = Option<PieceOnBoard>;
    fn index(&self, pos: Coord) -> &Self::Output {
        &self.data[coord_to_index(pos)]
    }
}

impl ops::IndexMut<Coord> for Grid {
    fn index_mut(&mut self, pos: Coord) -> &mut Self::Output {
        &mut self.data[coord_to_index(pos)]
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Grid ")?;
        f.debug_map()
            .entries(self.pieces().map(|(pos, piece)| {
                (
                    format!("{}{}", pos.col.to_algebraic(), pos.row.to_algebraic()),
                    format!("[{:?}]-{:?}-{:?}", piece.id, piece.force, piece.kind),
                )
            }))
            .finish()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use crate::coord::{Col, Row};
        for row_idx in (0..NUM_ROWS).rev() {
            let row = Row::from_zero_based(row_idx);
            write!(f, "{} ", row.to_algebraic())?;
            for col in Col::all() {
                match self[Coord::new(row, col)] {
                    Some(piece) => write!(f, "{} ", piece_to_pictogram(piece.kind, piece.force))?,
                    None => write!(f, "· ")?,
                }
            }
            writeln!(f)?;
        }
        write!(f, "  ")?;
        for col in Col::all() {
            write!(f, "{} ", col.to_algebraic())?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::force::Force;
    use crate::piece::{PieceId, PieceKind};

    #[test]
    fn scoped_set() {
        let mut piece_id = PieceId::new();
        let mut make_piece =
            |kind| PieceOnBoard::new(piece_id.inc(), kind, Force::White);
        let mut g = Grid::new();
        g[Coord::A1] = Some(make_piece(PieceKind::Queen));
        g[Coord::B2] = Some(make_piece(PieceKind::King));
        g[Coord::C3] = Some(make_piece(PieceKind::Rook));
        {
            let mut g = g.scoped_set(Coord::A1, Some(make_piece(PieceKind::Knight)));
            let mut g = g.scoped_set(Coord::A1, None);
            let g = g.scoped_set(Coord::C3, Some(make_piece(PieceKind::Bishop)));
            assert_eq!(g[Coord::A1], None);
            assert_eq!(g[Coord::B2].unwrap().kind, PieceKind::King);
            assert_eq!(g[Coord::C3].unwrap().kind, PieceKind::Bishop);
        }
        assert_eq!(g[Coord::A1].unwrap().kind, PieceKind::Queen);
        assert_eq!(g[Coord::B2].unwrap().kind, PieceKind::King);
        assert_eq!(g[Coord::C3].unwrap().kind, PieceKind::Rook);
    }

    #[test]
    fn maybe_scoped_set_without_change() {
        let mut g = Grid::new();
        g[Coord::D4] = Some(PieceOnBoard::new(PieceId::new(), PieceKind::Pawn, Force::Black));
        {
            let g = g.maybe_scoped_set(None);
            assert!(g[Coord::D4].is_some());
        }
        assert!(g[Coord::D4].is_some());
    }
}
