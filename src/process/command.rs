//! Contestants as real OS processes.

use std::process::Stdio;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use anyhow::{anyhow, Context};
use log::{debug, warn};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::{Launcher, ProcessIo, Termination};

/// How long `shutdown` waits for processes that were asked to stop.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Launches `prefix... <contestant>` with piped stdio, e.g. a prefix of
/// `["python3", "-u"]` runs each contestant as an unbuffered Python script.
/// With an empty prefix the contestant itself is the program.
#[derive(Debug, Default)]
pub struct CommandLauncher {
    prefix: Vec<String>,
    supervisors: Mutex<Vec<JoinHandle<()>>>,
}

impl CommandLauncher {
    pub fn new(prefix: Vec<String>) -> Self {
        Self {
            prefix,
            supervisors: Mutex::default(),
        }
    }

    fn command(&self, contestant: &str) -> Command {
        let mut cmd = match self.prefix.split_first() {
            Some((program, args)) => {
                let mut cmd = Command::new(program);
                cmd.args(args).arg(contestant);
                cmd
            }
            None => Command::new(contestant),
        };
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    fn track(&self, supervisor: JoinHandle<()>) {
        let mut supervisors = self.supervisors.lock().unwrap_or_else(PoisonError::into_inner);
        supervisors.retain(|handle| !handle.is_finished());
        supervisors.push(supervisor);
    }
}

#[async_trait::async_trait]
impl Launcher for CommandLauncher {
    async fn launch(&self, contestant: &str) -> anyhow::Result<ProcessIo> {
        let mut child = self
            .command(contestant)
            .spawn()
            .with_context(|| format!("failed to start contestant {contestant}"))?;
        let stdin = child.stdin.take().ok_or_else(|| anyhow!("stdin not piped"))?;
        let stdout = child.stdout.take().ok_or_else(|| anyhow!("stdout not piped"))?;
        let stderr = child.stderr.take().ok_or_else(|| anyhow!("stderr not piped"))?;
        debug!("started {} (pid {:?})", contestant, child.id());

        let (exit_tx, exit) = oneshot::channel();
        let (terminate, terminate_rx) = oneshot::channel();
        self.track(tokio::spawn(supervise(child, terminate_rx, exit_tx)));

        Ok(ProcessIo {
            stdin: Box::new(stdin),
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
            exit,
            terminate,
        })
    }

    /// Let every supervisor deliver its SIGTERM and reap its child, giving up
    /// after [`SHUTDOWN_GRACE`].
    async fn shutdown(&self) {
        let supervisors =
            std::mem::take(&mut *self.supervisors.lock().unwrap_or_else(PoisonError::into_inner));
        if supervisors.is_empty() {
            return;
        }
        debug!("waiting for {} contestant processes", supervisors.len());
        let reaped = tokio::time::timeout(SHUTDOWN_GRACE, async {
            for supervisor in supervisors {
                let _ = supervisor.await;
            }
        })
        .await;
        if reaped.is_err() {
            warn!("contestant processes still running after {:?}", SHUTDOWN_GRACE);
        }
    }
}

/// Own the child until it exits. A termination request, or the requester
/// going away, sends SIGTERM once; the child is never force-killed.
async fn supervise(
    mut child: Child,
    mut terminate: oneshot::Receiver<()>,
    exit: oneshot::Sender<Termination>,
) {
    let status = tokio::select! {
        status = child.wait() => status,
        _ = &mut terminate => {
            request_termination(&mut child);
            child.wait().await
        }
    };
    let _ = exit.send(Termination::from_wait(status));
}

#[cfg(unix)]
fn request_termination(child: &mut Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    // No pid means the child has already been reaped.
    let Some(pid) = child.id() else { return };
    let Ok(pid) = i32::try_from(pid) else { return };
    if let Err(e) = kill(Pid::from_raw(pid), Signal::SIGTERM) {
        debug!("SIGTERM to {} failed: {}", pid, e);
    }
}

#[cfg(not(unix))]
fn request_termination(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        warn!("could not stop contestant: {}", e);
    }
}
