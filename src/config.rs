//! Board and tournament configuration.

use alloc::collections::BTreeMap;

use crate::common::BoardError;

pub const DEFAULT_GRID_SIZE: u8 = 10;
/// Largest grid the protocol can address (columns `A` to `J`).
pub const MAX_GRID_SIZE: u8 = 10;
/// Default ship set as (length, count) pairs.
pub const DEFAULT_SHIPS: [(usize, usize); 4] = [(1, 1), (2, 2), (3, 1), (4, 1)];
/// Random draws allowed per ship before placement gives up.
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 1000;

pub const DEFAULT_CONCURRENCY: usize = 20;
pub const DEFAULT_GAMES: usize = 1000;
pub const DEFAULT_MOVE_TIME_SECS: u64 = 10;

/// Grid size and ship set used for every board in a tournament.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct BoardConfig {
    pub size: u8,
    /// Ship length -> number of ships of that length.
    pub ships: BTreeMap<usize, usize>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_GRID_SIZE,
            ships: DEFAULT_SHIPS.into_iter().collect(),
        }
    }
}

impl BoardConfig {
    pub fn new(size: u8, ships: impl IntoIterator<Item = (usize, usize)>) -> Self {
        Self {
            size,
            ships: ships.into_iter().collect(),
        }
    }

    /// Total number of ships placed on each board.
    pub fn ship_count(&self) -> usize {
        self.ships.values().sum()
    }

    /// Total number of occupied cells on each board.
    pub fn total_segments(&self) -> usize {
        self.ships.iter().map(|(len, count)| len * count).sum()
    }

    /// Reject configurations no board can be built from.
    pub fn validate(&self) -> Result<(), BoardError> {
        if self.size == 0 || self.size > MAX_GRID_SIZE {
            return Err(BoardError::InvalidGridSize(self.size));
        }
        for (&len, &count) in &self.ships {
            if count > 0 && (len == 0 || len > self.size as usize) {
                return Err(BoardError::InvalidShipLength(len));
            }
        }
        if self.ship_count() == 0 {
            return Err(BoardError::NoShips);
        }
        let cells = self.size as usize * self.size as usize;
        let segments = self.total_segments();
        if segments > cells {
            return Err(BoardError::TooManySegments { segments, cells });
        }
        Ok(())
    }
}

#[cfg(feature = "std")]
pub use tournament_config::*;

#[cfg(feature = "std")]
mod tournament_config {
    use std::path::Path;
    use std::time::Duration;

    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    use super::*;

    /// Configuration errors.
    #[derive(Debug, Error)]
    pub enum ConfigError {
        #[error("could not read config file: {0}")]
        Io(#[from] std::io::Error),

        #[error("could not parse config file: {0}")]
        Parse(#[from] serde_json::Error),

        #[error("invalid board: {0}")]
        Board(#[from] BoardError),

        #[error("invalid config: {0}")]
        Invalid(&'static str),
    }

    /// Everything a tournament run needs.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct TournamentConfig {
        pub board: BoardConfig,
        /// Matches allowed in flight at once.
        pub concurrency: usize,
        /// Matches to play in total.
        pub games: usize,
        #[serde(rename = "move_time_secs", with = "secs")]
        pub move_time: Duration,
        pub contestants: [String; 2],
        pub seed: Option<u64>,
    }

    impl Default for TournamentConfig {
        fn default() -> Self {
            Self {
                board: BoardConfig::default(),
                concurrency: DEFAULT_CONCURRENCY,
                games: DEFAULT_GAMES,
                move_time: Duration::from_secs(DEFAULT_MOVE_TIME_SECS),
                contestants: [String::new(), String::new()],
                seed: None,
            }
        }
    }

    impl TournamentConfig {
        pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
            Self {
                contestants: [first.into(), second.into()],
                ..Self::default()
            }
        }

        /// Load a JSON config file. Missing fields take their defaults.
        pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
            let text = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&text)?)
        }

        pub fn with_board(mut self, board: BoardConfig) -> Self {
            self.board = board;
            self
        }

        pub fn with_concurrency(mut self, concurrency: usize) -> Self {
            self.concurrency = concurrency;
            self
        }

        pub fn with_games(mut self, games: usize) -> Self {
            self.games = games;
            self
        }

        pub fn with_move_time(mut self, move_time: Duration) -> Self {
            self.move_time = move_time;
            self
        }

        pub fn with_seed(mut self, seed: u64) -> Self {
            self.seed = Some(seed);
            self
        }

        pub fn validate(&self) -> Result<(), ConfigError> {
            self.board.validate()?;
            if self.concurrency == 0 {
                return Err(ConfigError::Invalid("concurrency must be at least 1"));
            }
            if self.move_time.is_zero() {
                return Err(ConfigError::Invalid("move time must be positive"));
            }
            if self.contestants.iter().any(|c| c.trim().is_empty()) {
                return Err(ConfigError::Invalid("both contestants must be named"));
            }
            Ok(())
        }
    }

    /// Durations as fractional seconds.
    mod secs {
        use std::time::Duration;

        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_f64(value.as_secs_f64())
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
            let secs = f64::deserialize(deserializer)?;
            Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
        }
    }
}
