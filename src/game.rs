//! One game between two contestant processes.
//!
//! A match alternates turns between two seats. On each turn it races the
//! active contestant's next move against the forfeit timer and against
//! either process terminating; the first of these decides what happens next.
//! The match ends at the first terminal transition (a winning move, a
//! forfeit or a crash) and produces exactly one [`MatchResult`].

use std::fmt;
use std::pin::Pin;
use std::time::Duration;

use log::{debug, warn};
use rand::Rng;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::time::{sleep, Instant, Sleep};

use crate::board::Board;
use crate::channel::{Crash, ProcessChannel};
use crate::common::{AttackOutcome, BoardError, Coord};
use crate::config::BoardConfig;
use crate::process::Termination;

/// Errors that abort a match instead of deciding it.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("contestant {contestant} terminated unexpectedly: {reason}")]
    UnexpectedTermination { contestant: String, reason: String },

    #[error("could not set up boards: {0}")]
    Board(#[from] BoardError),

    #[error("match result was lost")]
    ResultLost,
}

/// How a match was decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The winner sank every ship; `moves` is the number of shots it fired.
    Sank { moves: u32 },
    /// The loser did not move within the time budget.
    Forfeit { loser: String, move_time: Duration },
    /// The loser's process terminated mid-match.
    Died {
        loser: String,
        cause: Termination,
        stderr: Option<String>,
    },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Sank { moves } => write!(f, "Moves: {moves}"),
            Outcome::Forfeit { loser, move_time } => {
                write!(f, "{loser} forfeited for taking more than {move_time:?}")
            }
            Outcome::Died { loser, cause, .. } => match cause {
                Termination::Exited(0) => write!(f, "{loser} exited unexpectedly"),
                Termination::Exited(code) => write!(f, "{loser} died with code {code}"),
                Termination::Signaled(signal) => write!(f, "{loser} died with signal {signal}"),
                Termination::Unexpected(reason) => write!(f, "{loser} vanished: {reason}"),
            },
        }
    }
}

/// Winner and outcome of one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub winner: String,
    /// Seat index of the winner; both seats may share a name in self-play.
    pub winner_seat: usize,
    pub outcome: Outcome,
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.winner, self.outcome)
    }
}

/// Write-once slot for a match result. The first delivery wins; later ones
/// are ignored.
pub struct ResultSlot {
    tx: Option<oneshot::Sender<MatchResult>>,
}

impl ResultSlot {
    pub fn new() -> (Self, oneshot::Receiver<MatchResult>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// Returns whether this delivery was the one that counted.
    pub fn deliver(&mut self, result: MatchResult) -> bool {
        match self.tx.take() {
            Some(tx) => {
                let _ = tx.send(result);
                true
            }
            None => false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.tx.is_none()
    }
}

/// One player: its hidden board and its process.
pub struct Seat {
    pub board: Board,
    pub channel: ProcessChannel,
}

impl Seat {
    pub fn new(board: Board, channel: ProcessChannel) -> Self {
        Self { board, channel }
    }
}

/// Seat index of the other player.
pub fn opponent(seat: usize) -> usize {
    1 - seat
}

enum Event {
    Move(Coord),
    Crash(usize, Crash),
    Forfeit,
}

/// A running game. Each seat's opponent is the other index of `seats`.
pub struct Match {
    seats: [Seat; 2],
    active: usize,
    half_moves: u32,
    move_time: Duration,
    forfeit: Pin<Box<Sleep>>,
    result: ResultSlot,
    received: oneshot::Receiver<MatchResult>,
}

impl Match {
    /// Deal fresh random boards and toss for who moves first.
    pub fn new<R: Rng>(
        channels: [ProcessChannel; 2],
        board: &BoardConfig,
        move_time: Duration,
        rng: &mut R,
    ) -> Result<Self, MatchError> {
        let [first, second] = channels;
        let seats = [
            Seat::new(Board::random(board.clone(), rng)?, first),
            Seat::new(Board::random(board.clone(), rng)?, second),
        ];
        let starter = rng.random_range(0..2);
        Ok(Self::from_seats(seats, starter, move_time))
    }

    /// Build a match from prepared seats with `starter` to move first. The
    /// forfeit timer starts now, so this must run inside a Tokio runtime.
    pub fn from_seats(seats: [Seat; 2], starter: usize, move_time: Duration) -> Self {
        let (result, received) = ResultSlot::new();
        Self {
            seats,
            active: starter % 2,
            half_moves: 1,
            move_time,
            forfeit: Box::pin(sleep(move_time)),
            result,
            received,
        }
    }

    /// Seat whose move is awaited.
    pub fn active(&self) -> usize {
        self.active
    }

    pub fn seat(&self, index: usize) -> &Seat {
        &self.seats[index]
    }

    /// Play until the match is decided.
    pub async fn run(mut self) -> Result<MatchResult, MatchError> {
        debug!(
            "{} vs {}: {} moves first",
            self.seats[0].channel.name(),
            self.seats[1].channel.name(),
            self.seats[self.active].channel.name()
        );
        self.arm_forfeit();
        while !self.result.is_resolved() {
            match self.next_event().await {
                Event::Move(coord) => self.on_move(coord),
                Event::Forfeit => self.on_forfeit(),
                Event::Crash(seat, crash) => self.on_crash(seat, crash)?,
            }
        }
        self.close_all();
        self.received.await.map_err(|_| MatchError::ResultLost)
    }

    async fn next_event(&mut self) -> Event {
        let [first, second] = &mut self.seats;
        let (first_moves, first_crash) = first.channel.events();
        let (second_moves, second_crash) = second.channel.events();
        let moves = if self.active == 0 { first_moves } else { second_moves };
        tokio::select! {
            biased;
            Some(coord) = moves.next() => Event::Move(coord),
            crash = first_crash.fired() => Event::Crash(0, crash),
            crash = second_crash.fired() => Event::Crash(1, crash),
            () = self.forfeit.as_mut() => Event::Forfeit,
        }
    }

    fn arm_forfeit(&mut self) {
        self.forfeit.as_mut().reset(Instant::now() + self.move_time);
    }

    fn on_move(&mut self, coord: Coord) {
        let player = self.active;
        let other = opponent(player);
        self.half_moves += 1;
        let outcome = self.seats[other].board.attack(coord);
        debug!("{} {} -> {:?}", self.seats[player].channel.name(), coord, outcome);
        if outcome == AttackOutcome::Win {
            let winner = self.seats[player].channel.name().to_string();
            self.result.deliver(MatchResult {
                winner,
                winner_seat: player,
                outcome: Outcome::Sank {
                    moves: self.half_moves / 2,
                },
            });
            return;
        }
        self.seats[player].channel.send_result(outcome);
        self.active = other;
        self.arm_forfeit();
    }

    fn on_forfeit(&mut self) {
        let loser = self.seats[self.active].channel.name().to_string();
        let winner_seat = opponent(self.active);
        let winner = self.seats[winner_seat].channel.name().to_string();
        self.result.deliver(MatchResult {
            winner,
            winner_seat,
            outcome: Outcome::Forfeit {
                loser,
                move_time: self.move_time,
            },
        });
    }

    fn on_crash(&mut self, seat: usize, crash: Crash) -> Result<(), MatchError> {
        let loser = self.seats[seat].channel.name().to_string();
        if !crash.cause.is_expected() {
            return Err(MatchError::UnexpectedTermination {
                contestant: loser,
                reason: crash.cause.to_string(),
            });
        }
        if let Some(stderr) = &crash.stderr {
            warn!("{} crashed with error:\n{}", loser, stderr.trim_end());
        }
        let winner_seat = opponent(seat);
        let winner = self.seats[winner_seat].channel.name().to_string();
        self.result.deliver(MatchResult {
            winner,
            winner_seat,
            outcome: Outcome::Died {
                loser,
                cause: crash.cause,
                stderr: crash.stderr,
            },
        });
        Ok(())
    }

    fn close_all(&mut self) {
        for seat in &mut self.seats {
            seat.channel.close();
        }
    }
}
