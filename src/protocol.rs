//! Line protocol spoken with contestant processes.
//!
//! A contestant sends one move per line, `<letter><number>` with the letter
//! in `A..=J` (either case) and one or two digits, e.g. `A1` or `j10`. After
//! each move it receives the outcome: `m` (miss), `h` (hit) or `s` followed
//! by a second line carrying the sunk ship's length. A winning move is never
//! answered; the harness closes both processes instead.

use alloc::format;
use alloc::string::String;

use crate::common::{AttackOutcome, Coord};

pub const MISS: &str = "m";
pub const HIT: &str = "h";
pub const SUNK: &str = "s";

/// Parse a move line. Anything that is not exactly a column letter followed
/// by one or two digits yields `None`.
pub fn parse_move(line: &str) -> Option<Coord> {
    let (&letter, digits) = line.as_bytes().split_first()?;
    let col = match letter.to_ascii_uppercase() {
        upper @ b'A'..=b'J' => upper - b'A' + 1,
        _ => return None,
    };
    if digits.is_empty() || digits.len() > 2 || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let row = digits.iter().fold(0u8, |acc, d| acc * 10 + (d - b'0'));
    Some(Coord::new(col, row))
}

/// Outcome lines for a move, newline-terminated. `None` for a win.
pub fn encode_outcome(outcome: AttackOutcome) -> Option<String> {
    match outcome {
        AttackOutcome::Miss => Some(format!("{}\n", MISS)),
        AttackOutcome::Hit => Some(format!("{}\n", HIT)),
        AttackOutcome::Sunk(length) => Some(format!("{}\n{}\n", SUNK, length)),
        AttackOutcome::Win => None,
    }
}
