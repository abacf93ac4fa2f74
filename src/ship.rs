//! Ship placement geometry.

use crate::common::Coord;

/// Identifier of a ship on one board, assigned from 1 upwards.
pub type ShipId = usize;

/// Orientation of a ship on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A ship laid out on the grid: `length` cells starting at `origin`,
/// extending right (horizontal) or down (vertical).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub id: ShipId,
    pub length: usize,
    pub origin: Coord,
    pub orientation: Orientation,
}

impl Placement {
    pub fn new(id: ShipId, length: usize, origin: Coord, orientation: Orientation) -> Self {
        Self {
            id,
            length,
            origin,
            orientation,
        }
    }

    /// Cells covered by the ship, from the origin outwards.
    ///
    /// Lengths beyond the `u8` coordinate range saturate; such placements
    /// never fit a board and are rejected by the bounds check.
    pub fn cells(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.length).map(move |i| {
            let step = u8::try_from(i).unwrap_or(u8::MAX);
            match self.orientation {
                Orientation::Horizontal => {
                    Coord::new(self.origin.col.saturating_add(step), self.origin.row)
                }
                Orientation::Vertical => {
                    Coord::new(self.origin.col, self.origin.row.saturating_add(step))
                }
            }
        })
    }
}
