use battleship_arena::process::in_memory;
use battleship_arena::process::Termination;
use battleship_arena::{AttackOutcome, Coord, ProcessChannel};
use tokio::io::AsyncWriteExt;

#[tokio::test]
async fn moves_arrive_in_order_and_garbage_is_dropped() {
    let (io, mut bot) = in_memory::pair();
    let mut channel = ProcessChannel::new("bot", io);

    for line in ["A1", "junk", "b10", "J 3", "K4", "c3\r"] {
        bot.say(line).await.unwrap();
    }
    assert_eq!(channel.get_move().await, Some(Coord::new(1, 1)));
    assert_eq!(channel.get_move().await, Some(Coord::new(2, 10)));
    assert_eq!(channel.get_move().await, Some(Coord::new(3, 3)));
}

#[tokio::test]
async fn non_utf8_lines_are_ignored() {
    let (io, mut bot) = in_memory::pair();
    let mut channel = ProcessChannel::new("bot", io);

    bot.stdout.write_all(b"\xff\xfe\nD4\n").await.unwrap();
    assert_eq!(channel.get_move().await, Some(Coord::new(4, 4)));
}

#[tokio::test]
async fn moves_queue_until_stdout_closes() {
    let (io, mut bot) = in_memory::pair();
    let mut channel = ProcessChannel::new("bot", io);

    bot.say("E5").await.unwrap();
    bot.die(Termination::Exited(0));
    assert_eq!(channel.get_move().await, Some(Coord::new(5, 5)));
    assert_eq!(channel.get_move().await, None);
}

#[tokio::test]
async fn results_are_written_as_protocol_lines() {
    let (io, mut bot) = in_memory::pair();
    let channel = ProcessChannel::new("bot", io);

    channel.send_result(AttackOutcome::Miss);
    channel.send_result(AttackOutcome::Hit);
    channel.send_result(AttackOutcome::Sunk(4));
    channel.send_result(AttackOutcome::Win);
    drop(channel);

    let mut heard = Vec::new();
    while let Some(line) = bot.hear().await.unwrap() {
        heard.push(line);
    }
    assert_eq!(heard, ["m", "h", "s", "4"]);
}

#[tokio::test]
async fn send_result_after_exit_is_harmless() {
    let (io, bot) = in_memory::pair();
    let mut channel = ProcessChannel::new("bot", io);

    bot.die(Termination::Exited(0));
    let crash = channel.crashed().await;
    assert_eq!(crash.cause, Termination::Exited(0));
    channel.send_result(AttackOutcome::Hit);
    channel.send_result(AttackOutcome::Sunk(2));
}

#[tokio::test]
async fn crash_carries_cause_and_stderr() {
    let (io, mut bot) = in_memory::pair();
    let mut channel = ProcessChannel::new("bot", io);

    bot.stderr.write_all(b"Traceback: oops\n").await.unwrap();
    bot.die(Termination::Signaled(11));
    let crash = channel.crashed().await;
    assert_eq!(crash.cause, Termination::Signaled(11));
    assert_eq!(crash.stderr.as_deref(), Some("Traceback: oops\n"));
}

#[tokio::test]
async fn silent_stderr_is_reported_as_none() {
    let (io, bot) = in_memory::pair();
    let mut channel = ProcessChannel::new("bot", io);

    bot.die(Termination::Exited(2));
    let crash = channel.crashed().await;
    assert_eq!(crash.cause, Termination::Exited(2));
    assert_eq!(crash.stderr, None);
}

#[tokio::test]
async fn lost_exit_notification_is_unexpected() {
    let (io, bot) = in_memory::pair();
    let mut channel = ProcessChannel::new("bot", io);

    drop(bot);
    let crash = channel.crashed().await;
    assert!(matches!(crash.cause, Termination::Unexpected(_)));
    assert!(!crash.cause.is_expected());
}

#[tokio::test]
async fn close_requests_termination_once() {
    let (io, mut bot) = in_memory::pair();
    let mut channel = ProcessChannel::new("bot", io);

    assert!(!channel.is_closed());
    channel.close();
    channel.close();
    assert!(channel.is_closed());
    assert!((&mut bot.terminate).await.is_ok());
}

#[tokio::test]
async fn dropping_an_open_channel_releases_the_process() {
    let (io, mut bot) = in_memory::pair();
    let channel = ProcessChannel::new("bot", io);

    drop(channel);
    assert!((&mut bot.terminate).await.is_err());
    assert_eq!(bot.hear().await.unwrap(), None);
}
