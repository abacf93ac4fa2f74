//! A Battleship tournament harness for external contestant processes.
//!
//! Two contestants, each an executable speaking a line protocol on stdin and
//! stdout, play many matches against each other, a bounded number at a time.
//! The board model ([`Board`]) and the wire format ([`protocol`]) have no
//! std dependency; the process plumbing, the match state machine and the
//! tournament scheduler need the `std` feature (on by default).

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod board;
mod common;
mod config;
pub mod protocol;
mod ship;

#[cfg(feature = "std")]
mod channel;
#[cfg(feature = "std")]
mod game;
#[cfg(feature = "std")]
mod logging;
#[cfg(feature = "std")]
pub mod prelude;
#[cfg(feature = "std")]
pub mod process;
#[cfg(feature = "std")]
mod tournament;

pub use board::*;
pub use common::*;
pub use config::*;
pub use ship::*;

#[cfg(feature = "std")]
pub use channel::*;
#[cfg(feature = "std")]
pub use game::*;
#[cfg(feature = "std")]
pub use logging::{init_logging, init_logging_with};
#[cfg(feature = "std")]
pub use tournament::*;
