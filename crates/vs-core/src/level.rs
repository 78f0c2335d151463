use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::LevelError;

/// Largest grid, in cells, that [`Grid::new`] will allocate.
pub const MAX_CELLS: usize = 1 << 20;

/// Row-major environment matrix. Each cell holds zero or more entities.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    height: usize,
    width: usize,
    cells: Vec<Vec<T>>,
}

impl<T> Grid<T> {
    /// Empty grid. Zero dimensions and grids over [`MAX_CELLS`] are rejected.
    pub fn new(height: usize, width: usize) -> Result<Self, LevelError> {
        if height == 0 || width == 0 {
            return Err(LevelError::InvalidDimensions { height, width });
        }
        let count = height
            .checked_mul(width)
            .filter(|n| *n <= MAX_CELLS)
            .ok_or(LevelError::TooLarge {
                height,
                width,
                max: MAX_CELLS,
            })?;
        let cells = (0..count).map(|_| Vec::new()).collect();
        Ok(Self {
            height,
            width,
            cells,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.height && col < self.width).then(|| row * self.width + col)
    }

    /// Entities in a cell, or `None` outside the grid.
    pub fn cell(&self, row: usize, col: usize) -> Option<&[T]> {
        self.index(row, col).map(|i| self.cells[i].as_slice())
    }

    /// First entity in a cell.
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        self.cell(row, col).and_then(|c| c.first())
    }

    /// Add an entity to a cell. Returns it back when out of bounds.
    pub fn place(&mut self, row: usize, col: usize, entity: T) -> Result<(), T> {
        match self.index(row, col) {
            Some(i) => {
                self.cells[i].push(entity);
                Ok(())
            }
            None => Err(entity),
        }
    }

    /// Rows of cells, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Vec<T>]> {
        self.cells.chunks(self.width)
    }

    /// `(row, col, entity)` for every placed entity, row-major.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        self.cells.iter().enumerate().flat_map(move |(i, cell)| {
            cell.iter()
                .map(move |entity| (i / self.width, i % self.width, entity))
        })
    }
}

/// Place `agents` on random distinct cells of an empty `height × width`
/// grid. Fails before placing anything when the grid cannot hold them all.
pub fn build_level<T>(
    height: usize,
    width: usize,
    agents: Vec<T>,
    rng: &mut impl Rng,
) -> Result<Grid<T>, LevelError> {
    let mut grid = Grid::new(height, width)?;
    let cells = grid.cells.len();
    if agents.len() > cells {
        return Err(LevelError::PlacementCapacity {
            agents: agents.len(),
            cells,
            height,
            width,
        });
    }

    let mut order: Vec<usize> = (0..cells).collect();
    order.shuffle(rng);

    for (agent, i) in agents.into_iter().zip(order) {
        grid.cells[i].push(agent);
    }
    Ok(grid)
}
