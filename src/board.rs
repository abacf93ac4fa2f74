//! Hidden per-player board: ship placement, health and attack resolution.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use rand::Rng;

use crate::common::{AttackOutcome, BoardError, Coord};
use crate::config::{BoardConfig, MAX_PLACEMENT_ATTEMPTS};
use crate::ship::{Orientation, Placement, ShipId};

/// One occupied cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Segment {
    ship: ShipId,
    hit: bool,
}

/// Main board state. Only occupied cells are stored; a sunk ship's cells are
/// removed together with its health entry.
#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    config: BoardConfig,
    cells: BTreeMap<Coord, Segment>,
    health: BTreeMap<ShipId, usize>,
}

impl Board {
    /// Create an empty board (no ships placed).
    pub fn new(config: BoardConfig) -> Self {
        Board {
            config,
            cells: BTreeMap::new(),
            health: BTreeMap::new(),
        }
    }

    /// Create a board with the whole ship set placed at random.
    pub fn random<R: Rng>(config: BoardConfig, rng: &mut R) -> Result<Self, BoardError> {
        config.validate()?;
        let mut board = Board::new(config);
        board.place_ships(rng)?;
        Ok(board)
    }

    /// Grid size.
    pub fn size(&self) -> u8 {
        self.config.size
    }

    /// Whether `coord` lies on the grid.
    pub fn contains(&self, coord: Coord) -> bool {
        (1..=self.config.size).contains(&coord.col) && (1..=self.config.size).contains(&coord.row)
    }

    /// Number of occupied cells still on the board.
    pub fn occupied(&self) -> usize {
        self.cells.len()
    }

    /// Ship occupying `coord`, if any.
    pub fn ship_at(&self, coord: Coord) -> Option<ShipId> {
        self.cells.get(&coord).map(|s| s.ship)
    }

    /// Whether the segment at `coord` has been hit.
    pub fn is_hit(&self, coord: Coord) -> bool {
        self.cells.get(&coord).is_some_and(|s| s.hit)
    }

    /// Remaining unhit segments of a ship still afloat.
    pub fn health(&self, id: ShipId) -> Option<usize> {
        self.health.get(&id).copied()
    }

    pub fn ships_remaining(&self) -> usize {
        self.health.len()
    }

    /// Sum of the remaining health of every ship afloat.
    pub fn remaining_health(&self) -> usize {
        self.health.values().sum()
    }

    /// All occupied cells with their ship, in coordinate order.
    pub fn segments(&self) -> impl Iterator<Item = (Coord, ShipId)> + '_ {
        self.cells.iter().map(|(&c, s)| (c, s.ship))
    }

    /// Place every ship of the configured set, shortest first, with ids
    /// counting up from 1.
    pub fn place_ships<R: Rng>(&mut self, rng: &mut R) -> Result<(), BoardError> {
        let ships: Vec<(usize, usize)> = self.config.ships.iter().map(|(&l, &n)| (l, n)).collect();
        let mut id = 1;
        for (length, count) in ships {
            for _ in 0..count {
                self.place_one_ship(rng, id, length)?;
                id += 1;
            }
        }
        Ok(())
    }

    /// Place one ship by rejection sampling: draw an orientation and an
    /// anchor that keeps the ship on the grid, retry while it would overlap.
    pub fn place_one_ship<R: Rng>(
        &mut self,
        rng: &mut R,
        id: ShipId,
        length: usize,
    ) -> Result<(), BoardError> {
        let size = self.config.size as usize;
        if length == 0 || length > size {
            return Err(BoardError::UnableToPlaceShip { id, length });
        }
        // Anchor range along the ship's axis.
        let span = (size - length + 1) as u8;
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let orientation = if rng.random_bool(0.5) {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            };
            let along = rng.random_range(1..=span);
            let across = rng.random_range(1..=self.config.size);
            let origin = match orientation {
                Orientation::Horizontal => Coord::new(along, across),
                Orientation::Vertical => Coord::new(across, along),
            };
            let placement = Placement::new(id, length, origin, orientation);
            if placement.cells().all(|c| !self.cells.contains_key(&c)) {
                self.insert(&placement);
                return Ok(());
            }
        }
        Err(BoardError::UnableToPlaceShip { id, length })
    }

    /// Place a ship at a fixed position.
    pub fn place(
        &mut self,
        id: ShipId,
        length: usize,
        origin: Coord,
        orientation: Orientation,
    ) -> Result<(), BoardError> {
        if self.health.contains_key(&id) || self.cells.values().any(|s| s.ship == id) {
            return Err(BoardError::DuplicateShip(id));
        }
        if length == 0 {
            return Err(BoardError::InvalidShipLength(length));
        }
        let placement = Placement::new(id, length, origin, orientation);
        let last = placement.cells().last().unwrap_or(origin);
        if !self.contains(origin) || !self.contains(last) || length > self.config.size as usize {
            return Err(BoardError::ShipOutOfBounds);
        }
        if placement.cells().any(|c| self.cells.contains_key(&c)) {
            return Err(BoardError::ShipOverlaps);
        }
        self.insert(&placement);
        Ok(())
    }

    fn insert(&mut self, placement: &Placement) {
        for c in placement.cells() {
            self.cells.insert(
                c,
                Segment {
                    ship: placement.id,
                    hit: false,
                },
            );
        }
        self.health.insert(placement.id, placement.length);
    }

    /// Resolve an attack on `coord`.
    ///
    /// Coordinates are not bounds-checked: anything off the grid is a miss.
    /// Attacking a segment that was already hit reports `Hit` again.
    pub fn attack(&mut self, coord: Coord) -> AttackOutcome {
        let Some(segment) = self.cells.get_mut(&coord) else {
            return AttackOutcome::Miss;
        };
        if segment.hit {
            return AttackOutcome::Hit;
        }
        let id = segment.ship;
        let health = self.health.get(&id).copied().unwrap_or(0).saturating_sub(1);
        if health > 0 {
            segment.hit = true;
            self.health.insert(id, health);
            return AttackOutcome::Hit;
        }
        let length = self.sink(id);
        if self.health.is_empty() {
            AttackOutcome::Win
        } else {
            AttackOutcome::Sunk(length)
        }
    }

    /// Remove a ship from the board, returning how many cells it covered.
    fn sink(&mut self, id: ShipId) -> usize {
        let before = self.cells.len();
        self.cells.retain(|_, s| s.ship != id);
        self.health.remove(&id);
        before - self.cells.len()
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board {{ size: {}, health: {:?} }}", self.config.size, self.health)?;
        for row in 1..=self.config.size {
            for col in 1..=self.config.size {
                let c = Coord::new(col, row);
                let ch = match self.cells.get(&c) {
                    None => '.',
                    Some(s) if s.hit => 'x',
                    Some(s) => char::from_digit((s.ship % 10) as u32, 10).unwrap_or('#'),
                };
                write!(f, "{}", ch)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
