//! In-process stand-in for a contestant, wired with duplex pipes.

use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};
use tokio::sync::oneshot;

use super::{ProcessIo, Termination};

const PIPE_CAPACITY: usize = 4096;

/// The contestant's side of an in-memory process.
pub struct Contestant {
    /// Outcome lines written by the arena.
    pub replies: Lines<BufReader<DuplexStream>>,
    /// The contestant's stdout.
    pub stdout: DuplexStream,
    /// The contestant's stderr.
    pub stderr: DuplexStream,
    /// Report termination to the arena.
    pub exit: oneshot::Sender<Termination>,
    /// Resolves when the arena asks the contestant to stop (or drops it).
    pub terminate: oneshot::Receiver<()>,
}

impl Contestant {
    /// Write one line to stdout.
    pub async fn say(&mut self, line: &str) -> io::Result<()> {
        self.stdout.write_all(line.as_bytes()).await?;
        self.stdout.write_all(b"\n").await
    }

    /// Read the next outcome line; `None` once the arena closed stdin.
    pub async fn hear(&mut self) -> io::Result<Option<String>> {
        self.replies.next_line().await
    }

    /// Close every stream, then report `cause`.
    pub fn die(self, cause: Termination) {
        let Contestant {
            replies,
            stdout,
            stderr,
            exit,
            terminate,
        } = self;
        drop((replies, stdout, stderr, terminate));
        let _ = exit.send(cause);
    }
}

/// Create a connected pair: the arena's `ProcessIo` and the contestant end.
pub fn pair() -> (ProcessIo, Contestant) {
    let (arena_stdin, contestant_stdin) = io::duplex(PIPE_CAPACITY);
    let (contestant_stdout, arena_stdout) = io::duplex(PIPE_CAPACITY);
    let (contestant_stderr, arena_stderr) = io::duplex(PIPE_CAPACITY);
    let (exit_tx, exit_rx) = oneshot::channel();
    let (terminate_tx, terminate_rx) = oneshot::channel();

    let io = ProcessIo {
        stdin: Box::new(arena_stdin),
        stdout: Box::new(arena_stdout),
        stderr: Box::new(arena_stderr),
        exit: exit_rx,
        terminate: terminate_tx,
    };
    let contestant = Contestant {
        replies: BufReader::new(contestant_stdin).lines(),
        stdout: contestant_stdout,
        stderr: contestant_stderr,
        exit: exit_tx,
        terminate: terminate_rx,
    };
    (io, contestant)
}
