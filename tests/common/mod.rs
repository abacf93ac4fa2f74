#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use battleship_arena::process::in_memory::{self, Contestant};
use battleship_arena::process::{Launcher, ProcessIo, Termination};
use battleship_arena::{MatchResult, Reporter, Summary};
use tokio::io::AsyncWriteExt;

/// Fires at every cell, row by row, until the arena stops answering.
pub async fn sweeper(mut c: Contestant) {
    'sweep: for row in 1..=10 {
        for col in b'A'..=b'J' {
            let shot = format!("{}{}", col as char, row);
            if c.say(&shot).await.is_err() {
                break 'sweep;
            }
            match c.hear().await {
                Ok(Some(reply)) if reply == "s" => {
                    if !matches!(c.hear().await, Ok(Some(_))) {
                        break 'sweep;
                    }
                }
                Ok(Some(_)) => {}
                _ => break 'sweep,
            }
        }
    }
    c.die(Termination::Exited(0));
}

/// Never moves; dies by SIGTERM once asked to stop. Returns whether the
/// arena explicitly requested termination (as opposed to dropping us).
pub async fn silent(mut c: Contestant) -> bool {
    let requested = (&mut c.terminate).await.is_ok();
    c.die(Termination::Signaled(15));
    requested
}

/// Writes `message` to stderr and terminates with `cause` straight away.
pub async fn crasher(mut c: Contestant, message: &str, cause: Termination) {
    let _ = c.stderr.write_all(message.as_bytes()).await;
    c.die(cause);
}

/// Shared counters between [`BotLauncher`] and [`RecordingReporter`].
#[derive(Default)]
pub struct Stats {
    pub launches: AtomicUsize,
    pub finished: AtomicUsize,
    pub peak_live: AtomicUsize,
}

/// Launches in-memory bots chosen by contestant name prefix.
pub struct BotLauncher {
    pub stats: Arc<Stats>,
}

impl BotLauncher {
    pub fn new(stats: Arc<Stats>) -> Self {
        Self { stats }
    }
}

#[async_trait::async_trait]
impl Launcher for BotLauncher {
    async fn launch(&self, contestant: &str) -> anyhow::Result<ProcessIo> {
        let n = self.stats.launches.fetch_add(1, Ordering::SeqCst);
        if n % 2 == 0 {
            // First process of a new match.
            let started = n / 2 + 1;
            let live = started - self.stats.finished.load(Ordering::SeqCst);
            self.stats.peak_live.fetch_max(live, Ordering::SeqCst);
        }
        let (io, bot) = in_memory::pair();
        if contestant.starts_with("sweeper") {
            tokio::spawn(sweeper(bot));
        } else if contestant.starts_with("silent") {
            tokio::spawn(silent(bot));
        } else if contestant.starts_with("crasher") {
            tokio::spawn(crasher(bot, "boom\n", Termination::Exited(1)));
        } else if contestant.starts_with("vanisher") {
            tokio::spawn(crasher(bot, "", Termination::Unexpected("lost track".into())));
        } else {
            anyhow::bail!("no bot named {contestant}");
        }
        Ok(io)
    }
}

/// Keeps everything the tournament reports.
#[derive(Clone, Default)]
pub struct RecordingReporter {
    pub stats: Arc<Stats>,
    pub results: Arc<Mutex<Vec<(usize, MatchResult)>>>,
    pub summary: Arc<Mutex<Option<Summary>>>,
}

impl RecordingReporter {
    pub fn new(stats: Arc<Stats>) -> Self {
        Self {
            stats,
            ..Self::default()
        }
    }

    pub fn results(&self) -> Vec<(usize, MatchResult)> {
        self.results.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn match_finished(&mut self, number: usize, result: &MatchResult) {
        self.stats.finished.store(number, Ordering::SeqCst);
        self.results.lock().unwrap().push((number, result.clone()));
    }

    fn tournament_finished(&mut self, summary: &Summary) {
        *self.summary.lock().unwrap() = Some(summary.clone());
    }
}
