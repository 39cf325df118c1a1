//! Dense cell storage for a level board.

use laser_maze_core::{Cell, CellCoord, EmitterKind, GridSize, LevelDescriptor};

/// Rectangular board of cells stored in row-major order.
///
/// Every in-bounds coordinate holds exactly one [`Cell`]; lookups outside the
/// board return `None` instead of panicking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Creates a board of the provided size filled with empty cells.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let capacity_u64 = u64::from(width) * u64::from(height);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            width,
            height,
            cells: vec![Cell::Empty; capacity],
        }
    }

    /// Builds the board described by a level's fixed pieces.
    ///
    /// Items outside the grid are skipped. Entries of the level's emitter list
    /// that fall inside the grid become orthogonal emitter cells; entries
    /// outside stay external and are not stored.
    #[must_use]
    pub fn from_level(level: &LevelDescriptor) -> Self {
        let mut grid = Self::new(level.grid.width, level.grid.height);
        for item in &level.items {
            let _ = grid.set(item.cell, item.to_cell());
        }
        for emitter in level.embedded_emitters() {
            let _ = grid.set(
                emitter.cell(),
                Cell::Emitter {
                    kind: EmitterKind::Orthogonal,
                    direction: emitter.direction(),
                },
            );
        }
        grid
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Dimensions of the board.
    #[must_use]
    pub const fn size(&self) -> GridSize {
        GridSize::new(self.width, self.height)
    }

    /// Reports whether the coordinate lies on the board.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        self.size().contains(cell)
    }

    /// Content of the cell, or `None` when the coordinate is off the board.
    #[must_use]
    pub fn get(&self, cell: CellCoord) -> Option<Cell> {
        self.index(cell)
            .and_then(|index| self.cells.get(index))
            .copied()
    }

    /// Replaces the content of a cell, returning what it previously held.
    ///
    /// Returns `None` without touching the board when the coordinate is off
    /// the board.
    pub fn set(&mut self, cell: CellCoord, content: Cell) -> Option<Cell> {
        let index = self.index(cell)?;
        let slot = self.cells.get_mut(index)?;
        Some(std::mem::replace(slot, content))
    }

    /// Empties a cell, returning what it previously held.
    pub fn clear(&mut self, cell: CellCoord) -> Option<Cell> {
        self.set(cell, Cell::Empty)
    }

    /// Iterates over every cell in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, Cell)> + '_ {
        let width = usize::try_from(self.width).unwrap_or(0).max(1);
        self.cells.iter().enumerate().map(move |(index, cell)| {
            let column = i32::try_from(index % width).unwrap_or(i32::MAX);
            let row = i32::try_from(index / width).unwrap_or(i32::MAX);
            (CellCoord::new(column, row), *cell)
        })
    }

    /// Coordinates of every empty cell in row-major order.
    #[must_use]
    pub fn empty_cells(&self) -> Vec<CellCoord> {
        self.iter()
            .filter(|(_, cell)| cell.is_empty())
            .map(|(coord, _)| coord)
            .collect()
    }

    /// Coordinates of every receiver in row-major order.
    #[must_use]
    pub fn receivers(&self) -> Vec<CellCoord> {
        self.iter()
            .filter(|(_, cell)| matches!(cell, Cell::Receiver))
            .map(|(coord, _)| coord)
            .collect()
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.width).ok()?;
        Some(row * width + column)
    }
}
