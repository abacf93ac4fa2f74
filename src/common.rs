//! Common types for the arena: coordinates, attack outcomes and board errors.

use core::fmt;

/// A 1-indexed grid coordinate. `col` 1 is column `A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord {
    pub col: u8,
    pub row: u8,
}

impl Coord {
    pub const fn new(col: u8, row: u8) -> Self {
        Self { col, row }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = char::from(b'A'.wrapping_add(self.col).wrapping_sub(1));
        write!(f, "{}{}", letter, self.row)
    }
}

/// Result of attacking a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackOutcome {
    /// No ship at the cell.
    Miss,
    /// A ship segment was hit (or had already been hit).
    Hit,
    /// The attack sank a ship, carrying its original length.
    Sunk(usize),
    /// The attack sank the last remaining ship.
    Win,
}

/// Errors returned by board construction and placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// Grid size outside the range the protocol can address.
    InvalidGridSize(u8),
    /// A ship length of zero or longer than the grid.
    InvalidShipLength(usize),
    /// The ship set places no ships at all.
    NoShips,
    /// The ship set needs more segments than the grid has cells.
    TooManySegments { segments: usize, cells: usize },
    /// Ship placement extends past the grid.
    ShipOutOfBounds,
    /// Ship placement overlaps another ship.
    ShipOverlaps,
    /// A ship with this id is already on the board.
    DuplicateShip(usize),
    /// Random placement gave up.
    UnableToPlaceShip { id: usize, length: usize },
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::InvalidGridSize(size) => write!(f, "Grid size {} is out of range", size),
            BoardError::InvalidShipLength(len) => write!(f, "Ship length {} does not fit the grid", len),
            BoardError::NoShips => write!(f, "Ship set is empty"),
            BoardError::TooManySegments { segments, cells } => write!(
                f,
                "Ship set needs {} segments but the grid only has {} cells",
                segments, cells
            ),
            BoardError::ShipOutOfBounds => write!(f, "Ship placement is out of bounds"),
            BoardError::ShipOverlaps => write!(f, "Ship placement overlaps with another ship"),
            BoardError::DuplicateShip(id) => write!(f, "Ship {} is already placed on the board", id),
            BoardError::UnableToPlaceShip { id, length } => {
                write!(f, "Unable to place ship {} of length {}", id, length)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BoardError {}
