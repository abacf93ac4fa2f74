use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context};
use battleship_arena::process::CommandLauncher;
use battleship_arena::{
    init_logging, init_logging_with, BoardConfig, ConsoleReporter, Tournament, TournamentConfig,
};
use clap::Parser;
use log::LevelFilter;

#[derive(Parser)]
#[command(author, version, about = "Run a Battleship tournament between two contestant programs", long_about = None)]
struct Cli {
    /// First contestant (program or script path).
    first: String,
    /// Second contestant (program or script path).
    second: String,
    #[arg(long, help = "JSON config file; command-line flags override it")]
    config: Option<PathBuf>,
    #[arg(long, help = "Total number of matches [default: 1000]")]
    games: Option<usize>,
    #[arg(long, help = "Matches running at the same time [default: 20]")]
    concurrency: Option<usize>,
    #[arg(long, value_name = "SECS", help = "Time allowed per move [default: 10]")]
    move_time: Option<f64>,
    #[arg(long, help = "Board width and height, at most 10 [default: 10]")]
    grid_size: Option<u8>,
    #[arg(
        long = "ship",
        value_name = "LEN:COUNT",
        value_parser = parse_ship,
        help = "Ships of a given length; repeat for each length [default: 1:1 2:2 3:1 4:1]"
    )]
    ships: Vec<(usize, usize)>,
    #[arg(long, help = "Fix RNG seed for reproducible boards and turn order (e.g., --seed 12345)")]
    seed: Option<u64>,
    #[arg(long, help = "Program used to run each contestant, e.g. python3")]
    interpreter: Option<String>,
    #[arg(long = "interpreter-arg", allow_hyphen_values = true, help = "Extra argument for the interpreter, e.g. -u")]
    interpreter_args: Vec<String>,
    #[arg(long, help = "Print the final summary as JSON")]
    json: bool,
    #[arg(short, long, action = clap::ArgAction::Count, help = "More log output (-v debug, -vv trace)")]
    verbose: u8,
}

fn parse_ship(text: &str) -> Result<(usize, usize), String> {
    let (len, count) = text
        .split_once(':')
        .ok_or_else(|| format!("expected LEN:COUNT, got {text:?}"))?;
    let len = len.trim().parse().map_err(|e| format!("bad length: {e}"))?;
    let count = count.trim().parse().map_err(|e| format!("bad count: {e}"))?;
    Ok((len, count))
}

impl Cli {
    fn tournament_config(&self) -> anyhow::Result<TournamentConfig> {
        let mut config = match &self.config {
            Some(path) => TournamentConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => TournamentConfig::default(),
        };
        config.contestants = [self.first.clone(), self.second.clone()];
        if let Some(games) = self.games {
            config.games = games;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(secs) = self.move_time {
            config.move_time = Duration::try_from_secs_f64(secs)
                .map_err(|e| anyhow!("invalid move time {secs}: {e}"))?;
        }
        if let Some(size) = self.grid_size {
            config.board.size = size;
        }
        if !self.ships.is_empty() {
            config.board = BoardConfig::new(config.board.size, self.ships.iter().copied());
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        Ok(config)
    }

    fn launcher(&self) -> CommandLauncher {
        let prefix = self
            .interpreter
            .iter()
            .chain(self.interpreter_args.iter())
            .cloned()
            .collect();
        CommandLauncher::new(prefix)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.verbose {
        0 => init_logging(),
        1 => init_logging_with(LevelFilter::Debug),
        _ => init_logging_with(LevelFilter::Trace),
    }

    let config = cli.tournament_config()?;
    if config.seed.is_some() {
        log::info!("using fixed seed {:?}", config.seed);
    }
    let reporter = ConsoleReporter::new().json(cli.json);
    let tournament = Tournament::new(config, cli.launcher(), reporter)?;
    tournament.run().await?;
    Ok(())
}
