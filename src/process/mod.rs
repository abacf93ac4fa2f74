//! External contestant processes.
//!
//! The arena only needs four things from a process: somewhere to write
//! outcome lines, its stdout and stderr, and a notification when it
//! terminates. [`ProcessIo`] bundles those; a [`Launcher`] produces one per
//! contestant per match.

use std::fmt;
use std::process::ExitStatus;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::oneshot;

pub mod command;
pub mod in_memory;

pub use command::CommandLauncher;

/// Why a contestant process went away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// Plain exit with a status code.
    Exited(i32),
    /// Killed by a signal.
    Signaled(i32),
    /// Anything else: the exit status could not be determined or the
    /// notification was lost. Not a game outcome.
    Unexpected(String),
}

impl Termination {
    /// Classify the result of waiting on a child.
    pub fn from_wait(status: std::io::Result<ExitStatus>) -> Self {
        match status {
            Ok(status) => {
                if let Some(code) = status.code() {
                    return Termination::Exited(code);
                }
                #[cfg(unix)]
                {
                    use std::os::unix::process::ExitStatusExt;
                    if let Some(signal) = status.signal() {
                        return Termination::Signaled(signal);
                    }
                }
                Termination::Unexpected(format!("unrecognised exit status {status}"))
            }
            Err(e) => Termination::Unexpected(format!("wait failed: {e}")),
        }
    }

    /// Exits and signals end a match normally; anything else aborts the run.
    pub fn is_expected(&self) -> bool {
        matches!(self, Termination::Exited(_) | Termination::Signaled(_))
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Exited(code) => write!(f, "exited with code {code}"),
            Termination::Signaled(signal) => write!(f, "killed by signal {signal}"),
            Termination::Unexpected(reason) => write!(f, "{reason}"),
        }
    }
}

/// The endpoints of one running contestant.
pub struct ProcessIo {
    pub stdin: Box<dyn AsyncWrite + Send + Unpin>,
    pub stdout: Box<dyn AsyncRead + Send + Unpin>,
    pub stderr: Box<dyn AsyncRead + Send + Unpin>,
    /// Fires once with the termination cause.
    pub exit: oneshot::Receiver<Termination>,
    /// Send (or drop) to ask the process to terminate.
    pub terminate: oneshot::Sender<()>,
}

/// Starts contestant processes.
#[async_trait::async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self, contestant: &str) -> anyhow::Result<ProcessIo>;

    /// Wait for every launched process to be reaped. Called once at the end
    /// of a tournament, after all matches have released their processes.
    async fn shutdown(&self) {}
}
