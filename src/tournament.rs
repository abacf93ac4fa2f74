//! Bounded-concurrency tournament between two contestants.

use std::io::{self, Write};

use anyhow::Context;
use log::{debug, info};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::task::JoinSet;

use crate::channel::ProcessChannel;
use crate::config::{ConfigError, TournamentConfig};
use crate::game::{Match, MatchError, MatchResult, Outcome};
use crate::process::Launcher;

/// Wins of one contestant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing {
    pub contestant: String,
    pub wins: usize,
    /// Share of the target match count, in percent.
    pub percentage: f64,
}

/// Final tally of a tournament.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub games: usize,
    pub standings: Vec<Standing>,
}

/// Receives results as the tournament progresses.
pub trait Reporter {
    /// Called once per finished match; `number` counts from 1.
    fn match_finished(&mut self, number: usize, result: &MatchResult);

    fn tournament_finished(&mut self, summary: &Summary);
}

/// Prints results to stdout.
#[derive(Debug, Clone, Default)]
pub struct ConsoleReporter {
    json: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print the summary as a single JSON document instead of text lines.
    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Reporter for ConsoleReporter {
    fn match_finished(&mut self, _number: usize, result: &MatchResult) {
        if self.json {
            return;
        }
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{}", result);
        if let Outcome::Died {
            loser,
            stderr: Some(stderr),
            ..
        } = &result.outcome
        {
            let _ = writeln!(out, "{} crashed with error:\n{}", loser, stderr.trim_end());
        }
    }

    fn tournament_finished(&mut self, summary: &Summary) {
        let mut out = io::stdout().lock();
        if self.json {
            match serde_json::to_string(summary) {
                Ok(json) => {
                    let _ = writeln!(out, "{}", json);
                }
                Err(e) => log::error!("could not encode summary: {}", e),
            }
            return;
        }
        for standing in &summary.standings {
            let _ = writeln!(
                out,
                "{}: {} wins ({:.1}%)",
                standing.contestant, standing.wins, standing.percentage
            );
        }
    }
}

type LiveMatches = JoinSet<Result<MatchResult, MatchError>>;

/// Runs `games` matches between the two configured contestants, keeping at
/// most `concurrency` of them in flight.
pub struct Tournament<L, R> {
    config: TournamentConfig,
    launcher: L,
    reporter: R,
    rng: SmallRng,
    started: usize,
    finished: usize,
    /// Wins per seat, so self-play with one name for both sides stays exact.
    tally: [usize; 2],
}

impl<L: Launcher, R: Reporter> Tournament<L, R> {
    pub fn new(config: TournamentConfig, launcher: L, reporter: R) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_rng(&mut rand::rng()),
        };
        Ok(Self {
            config,
            launcher,
            reporter,
            rng,
            started: 0,
            finished: 0,
            tally: [0; 2],
        })
    }

    pub fn started(&self) -> usize {
        self.started
    }

    pub fn finished(&self) -> usize {
        self.finished
    }

    /// Wins recorded so far for the contestant in `seat` (0 or 1).
    pub fn wins(&self, seat: usize) -> usize {
        self.tally.get(seat).copied().unwrap_or(0)
    }

    /// Play the whole tournament. A launch failure or a match that ends in
    /// an unexpected way aborts every match still in flight.
    pub async fn run(mut self) -> anyhow::Result<Summary> {
        let [first, second] = &self.config.contestants;
        info!(
            "{} vs {}: {} games, {} at a time",
            first, second, self.config.games, self.config.concurrency
        );
        let mut live = LiveMatches::new();
        let played = self.play(&mut live).await;
        // Aborted matches drop their channels, which asks their processes to stop.
        live.shutdown().await;
        self.launcher.shutdown().await;
        played?;

        let summary = self.summary();
        info!("tournament finished after {} games", self.finished);
        self.reporter.tournament_finished(&summary);
        Ok(summary)
    }

    async fn play(&mut self, live: &mut LiveMatches) -> anyhow::Result<()> {
        for _ in 0..self.config.concurrency.min(self.config.games) {
            self.start_match(live).await?;
        }
        while let Some(joined) = live.join_next().await {
            let result = joined.context("match task failed")??;
            self.record(result);
            if self.finished >= self.config.games {
                break;
            }
            if self.started < self.config.games {
                self.start_match(live).await?;
            }
        }
        Ok(())
    }

    async fn start_match(&mut self, live: &mut LiveMatches) -> anyhow::Result<()> {
        self.started += 1;
        let number = self.started;
        let mut rng = SmallRng::seed_from_u64(self.rng.random());
        let [first, second] = &self.config.contestants;
        let channels = [
            ProcessChannel::new(first.clone(), self.launcher.launch(first).await?),
            ProcessChannel::new(second.clone(), self.launcher.launch(second).await?),
        ];
        let game = Match::new(channels, &self.config.board, self.config.move_time, &mut rng)
            .with_context(|| format!("could not set up match {number}"))?;
        debug!("match {} started", number);
        live.spawn(game.run());
        Ok(())
    }

    fn record(&mut self, result: MatchResult) {
        self.finished += 1;
        if let Some(wins) = self.tally.get_mut(result.winner_seat) {
            *wins += 1;
        }
        debug!("match {} finished: {}", self.finished, result);
        self.reporter.match_finished(self.finished, &result);
    }

    fn summary(&self) -> Summary {
        let games = self.config.games;
        let standings = self
            .config
            .contestants
            .iter()
            .zip(self.tally)
            .map(|(name, wins)| {
                let percentage = if games == 0 {
                    0.0
                } else {
                    wins as f64 * 100.0 / games as f64
                };
                Standing {
                    contestant: name.clone(),
                    wins,
                    percentage,
                }
            })
            .collect();
        Summary { games, standings }
    }
}
