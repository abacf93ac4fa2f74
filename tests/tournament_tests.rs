mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use battleship_arena::{MatchError, Outcome, Tournament, TournamentConfig};
use common::{BotLauncher, RecordingReporter, Stats};

fn tournament(
    config: TournamentConfig,
) -> (Tournament<BotLauncher, RecordingReporter>, RecordingReporter, Arc<Stats>) {
    let stats = Arc::new(Stats::default());
    let reporter = RecordingReporter::new(stats.clone());
    let tournament = Tournament::new(config, BotLauncher::new(stats.clone()), reporter.clone())
        .expect("valid config");
    (tournament, reporter, stats)
}

#[tokio::test]
async fn plays_exactly_the_target_number_of_games() {
    let config = TournamentConfig::new("sweeper_a", "sweeper_b")
        .with_games(7)
        .with_concurrency(3)
        .with_seed(11);
    let (tournament, reporter, stats) = tournament(config);
    let summary = tournament.run().await.unwrap();

    let results = reporter.results();
    assert_eq!(results.len(), 7);
    assert_eq!(
        results.iter().map(|(n, _)| *n).collect::<Vec<_>>(),
        (1..=7).collect::<Vec<_>>()
    );
    assert!(results
        .iter()
        .all(|(_, r)| matches!(r.outcome, Outcome::Sank { moves } if moves >= 12)));
    assert_eq!(stats.launches.load(Ordering::SeqCst), 14);

    assert_eq!(summary.games, 7);
    assert_eq!(summary.standings.len(), 2);
    assert_eq!(summary.standings[0].contestant, "sweeper_a");
    assert_eq!(summary.standings[1].contestant, "sweeper_b");
    let total: usize = summary.standings.iter().map(|s| s.wins).sum();
    assert_eq!(total, 7);
    let percent: f64 = summary.standings.iter().map(|s| s.percentage).sum();
    assert!((percent - 100.0).abs() < 1e-9);
    assert_eq!(reporter.summary.lock().unwrap().as_ref(), Some(&summary));
}

#[tokio::test]
async fn never_exceeds_the_concurrency_bound() {
    let config = TournamentConfig::new("sweeper_a", "sweeper_b")
        .with_games(12)
        .with_concurrency(4);
    let (tournament, _reporter, stats) = tournament(config);
    tournament.run().await.unwrap();

    assert_eq!(stats.peak_live.load(Ordering::SeqCst), 4);
    assert_eq!(stats.finished.load(Ordering::SeqCst), 12);
}

#[tokio::test]
async fn concurrency_above_games_starts_only_the_target() {
    let config = TournamentConfig::new("sweeper_a", "sweeper_b")
        .with_games(2)
        .with_concurrency(20);
    let (tournament, reporter, stats) = tournament(config);
    tournament.run().await.unwrap();

    assert_eq!(stats.launches.load(Ordering::SeqCst), 4);
    assert_eq!(stats.peak_live.load(Ordering::SeqCst), 2);
    assert_eq!(reporter.results().len(), 2);
}

#[tokio::test]
async fn self_play_counts_each_win_once() {
    let config = TournamentConfig::new("sweeper", "sweeper")
        .with_games(4)
        .with_concurrency(2)
        .with_seed(3);
    let (tournament, reporter, _stats) = tournament(config);
    let summary = tournament.run().await.unwrap();

    assert_eq!(summary.standings.len(), 2);
    assert!(summary.standings.iter().all(|s| s.contestant == "sweeper"));
    let total: usize = summary.standings.iter().map(|s| s.wins).sum();
    assert_eq!(total, 4);
    let percent: f64 = summary.standings.iter().map(|s| s.percentage).sum();
    assert!((percent - 100.0).abs() < 1e-9);

    let by_seat = reporter
        .results()
        .iter()
        .fold([0; 2], |mut wins, (_, r)| {
            wins[r.winner_seat] += 1;
            wins
        });
    assert_eq!(by_seat, [summary.standings[0].wins, summary.standings[1].wins]);
}

#[tokio::test]
async fn zero_games_reports_an_empty_summary() {
    let config = TournamentConfig::new("sweeper_a", "sweeper_b").with_games(0);
    let (tournament, reporter, stats) = tournament(config);
    let summary = tournament.run().await.unwrap();

    assert_eq!(stats.launches.load(Ordering::SeqCst), 0);
    assert!(reporter.results().is_empty());
    assert_eq!(summary.games, 0);
    assert!(summary
        .standings
        .iter()
        .all(|s| s.wins == 0 && s.percentage == 0.0));
}

#[tokio::test(start_paused = true)]
async fn forfeits_count_as_wins() {
    let config = TournamentConfig::new("sweeper", "silent")
        .with_games(5)
        .with_concurrency(2)
        .with_move_time(Duration::from_secs(3));
    let (tournament, reporter, _stats) = tournament(config);
    let summary = tournament.run().await.unwrap();

    for (_, result) in reporter.results() {
        assert_eq!(result.winner, "sweeper");
        assert!(matches!(result.outcome, Outcome::Forfeit { ref loser, .. } if loser == "silent"));
    }
    assert_eq!(summary.standings[0].wins, 5);
    assert_eq!(summary.standings[0].percentage, 100.0);
    assert_eq!(summary.standings[1].wins, 0);
}

#[tokio::test]
async fn crashes_count_as_wins_for_the_survivor() {
    let config = TournamentConfig::new("sweeper", "crasher")
        .with_games(3)
        .with_concurrency(3);
    let (tournament, reporter, _stats) = tournament(config);
    let summary = tournament.run().await.unwrap();

    for (_, result) in reporter.results() {
        assert_eq!(result.winner, "sweeper");
        assert_eq!(result.to_string(), "sweeper crasher died with code 1");
    }
    assert_eq!(summary.standings[0].wins, 3);
}

#[tokio::test]
async fn seeded_tournaments_repeat() {
    let config = TournamentConfig::new("sweeper_a", "sweeper_b")
        .with_games(6)
        .with_concurrency(1)
        .with_seed(2024);
    let (first, first_reporter, _) = tournament(config.clone());
    let (second, second_reporter, _) = tournament(config);
    first.run().await.unwrap();
    second.run().await.unwrap();

    assert_eq!(first_reporter.results(), second_reporter.results());
}

#[tokio::test]
async fn unexpected_termination_aborts_the_tournament() {
    let config = TournamentConfig::new("sweeper", "vanisher")
        .with_games(10)
        .with_concurrency(2);
    let (tournament, reporter, _stats) = tournament(config);
    let err = tournament.run().await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<MatchError>(),
        Some(MatchError::UnexpectedTermination { contestant, .. }) if contestant == "vanisher"
    ));
    assert!(reporter.summary.lock().unwrap().is_none());
}

#[tokio::test]
async fn launch_failure_aborts_the_tournament() {
    let config = TournamentConfig::new("sweeper", "nobody").with_games(3);
    let (tournament, reporter, _stats) = tournament(config);
    let err = tournament.run().await.unwrap_err();

    assert!(err.to_string().contains("nobody"));
    assert!(reporter.results().is_empty());
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let stats = Arc::new(Stats::default());
    let config = TournamentConfig::new("a", "b").with_concurrency(0);
    let built = Tournament::new(
        config,
        BotLauncher::new(stats.clone()),
        RecordingReporter::new(stats),
    );
    assert!(built.is_err());
}
