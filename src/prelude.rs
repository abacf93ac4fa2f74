//! Commonly used types and utilities for ease of import.

pub use crate::{
    AttackOutcome, Board, BoardConfig, ConsoleReporter, Coord, Match, MatchResult, Outcome,
    ProcessChannel, Reporter, Summary, Tournament, TournamentConfig,
};

pub use crate::process::{in_memory, CommandLauncher, Launcher, ProcessIo, Termination};
