//! Line-protocol bridge to one contestant process.

use std::time::Duration;

use log::{debug, trace};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::common::{AttackOutcome, Coord};
use crate::process::{ProcessIo, Termination};
use crate::protocol;

/// How long to keep collecting stderr after the process has exited.
const STDERR_GRACE: Duration = Duration::from_millis(100);

/// A contestant's termination, as seen by the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crash {
    pub cause: Termination,
    /// Everything the process wrote to stderr, if anything.
    pub stderr: Option<String>,
}

/// Moves parsed from the process's stdout, oldest first.
pub struct MoveQueue {
    rx: mpsc::UnboundedReceiver<Coord>,
}

impl MoveQueue {
    /// Next queued move, waiting for one if the queue is empty. `None` once
    /// stdout has closed and every move was consumed.
    pub async fn next(&mut self) -> Option<Coord> {
        self.rx.recv().await
    }
}

/// One-shot termination notification.
pub struct CrashSignal {
    rx: Option<oneshot::Receiver<Crash>>,
}

impl CrashSignal {
    /// Resolves once, when the process terminates. After that it never
    /// resolves again.
    pub async fn fired(&mut self) -> Crash {
        let Some(rx) = self.rx.as_mut() else {
            return std::future::pending().await;
        };
        let crash = rx.await.unwrap_or_else(|_| Crash {
            cause: Termination::Unexpected("exit notification lost".to_string()),
            stderr: None,
        });
        self.rx = None;
        crash
    }
}

/// Bidirectional channel to a contestant: moves in, outcomes out.
pub struct ProcessChannel {
    name: String,
    moves: MoveQueue,
    crash: CrashSignal,
    outbox: mpsc::UnboundedSender<String>,
    terminate: Option<oneshot::Sender<()>>,
}

impl ProcessChannel {
    /// Wire up a running process. Spawns the reader, writer and exit watcher
    /// tasks, so this must be called inside a Tokio runtime.
    pub fn new(name: impl Into<String>, io: ProcessIo) -> Self {
        let name = name.into();
        let ProcessIo {
            stdin,
            stdout,
            stderr,
            exit,
            terminate,
        } = io;

        let (move_tx, move_rx) = mpsc::unbounded_channel();
        tokio::spawn(read_moves(name.clone(), stdout, move_tx));

        let (outbox, outbox_rx) = mpsc::unbounded_channel();
        tokio::spawn(write_outcomes(name.clone(), stdin, outbox_rx));

        let stderr_task = tokio::spawn(collect_stderr(stderr));
        let (crash_tx, crash_rx) = oneshot::channel();
        tokio::spawn(watch_exit(exit, stderr_task, crash_tx));

        Self {
            name,
            moves: MoveQueue { rx: move_rx },
            crash: CrashSignal { rx: Some(crash_rx) },
            outbox,
            terminate: Some(terminate),
        }
    }

    /// Contestant identity.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Oldest queued move; see [`MoveQueue::next`].
    pub async fn get_move(&mut self) -> Option<Coord> {
        self.moves.next().await
    }

    /// Wait for the process to terminate; see [`CrashSignal::fired`].
    pub async fn crashed(&mut self) -> Crash {
        self.crash.fired().await
    }

    /// Both event sources at once, for racing them against each other.
    pub fn events(&mut self) -> (&mut MoveQueue, &mut CrashSignal) {
        (&mut self.moves, &mut self.crash)
    }

    /// Tell the contestant how its last move went. Never blocks; a win is not
    /// transmitted.
    pub fn send_result(&self, outcome: AttackOutcome) {
        if let Some(lines) = protocol::encode_outcome(outcome) {
            if self.outbox.send(lines).is_err() {
                debug!("{}: stdin already closed, dropping {:?}", self.name, outcome);
            }
        }
    }

    /// Ask the process to terminate. Only the first call has any effect, and
    /// a process that already exited is fine.
    pub fn close(&mut self) {
        if let Some(terminate) = self.terminate.take() {
            trace!("{}: requesting termination", self.name);
            let _ = terminate.send(());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.terminate.is_none()
    }
}

async fn read_moves<R>(name: String, stdout: R, moves: mpsc::UnboundedSender<Coord>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stdout).split(b'\n');
    loop {
        match lines.next_segment().await {
            Ok(Some(raw)) => {
                let text = String::from_utf8_lossy(&raw);
                let line = text.strip_suffix('\r').unwrap_or(&text);
                match protocol::parse_move(line) {
                    Some(coord) => {
                        if moves.send(coord).is_err() {
                            break;
                        }
                    }
                    None => trace!("{}: ignoring line {:?}", name, line),
                }
            }
            Ok(None) => break,
            Err(e) => {
                debug!("{}: stdout read failed: {}", name, e);
                break;
            }
        }
    }
}

async fn write_outcomes<W>(name: String, mut stdin: W, mut outbox: mpsc::UnboundedReceiver<String>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(lines) = outbox.recv().await {
        let written = async {
            stdin.write_all(lines.as_bytes()).await?;
            stdin.flush().await
        };
        if let Err(e) = written.await {
            debug!("{}: stdin write failed: {}", name, e);
            break;
        }
    }
}

async fn collect_stderr<R>(mut stderr: R) -> String
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    // Whatever arrived before a read error is still worth reporting.
    let _ = stderr.read_to_end(&mut buf).await;
    String::from_utf8_lossy(&buf).into_owned()
}

async fn watch_exit(
    exit: oneshot::Receiver<Termination>,
    stderr: JoinHandle<String>,
    crash: oneshot::Sender<Crash>,
) {
    let cause = exit
        .await
        .unwrap_or_else(|_| Termination::Unexpected("process handle dropped".to_string()));
    let stderr = match tokio::time::timeout(STDERR_GRACE, stderr).await {
        Ok(Ok(text)) if !text.trim().is_empty() => Some(text),
        _ => None,
    };
    let _ = crash.send(Crash { cause, stderr });
}
