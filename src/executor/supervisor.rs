use std::thread;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use tracing::{debug, warn};

use super::spawn::ChildHandle;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Status reported when the last stage's exit status could not be collected.
pub const UNKNOWN_STATUS: i32 = 1;

/// Reaps the children of one pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct Supervisor {
    timeout: Option<Duration>,
}

impl Supervisor {
    pub fn new(timeout: Option<Duration>) -> Self {
        Supervisor { timeout }
    }

    /// Waits for every child exactly once and returns the status of the
    /// last stage.
    pub fn wait_all(&self, children: Vec<ChildHandle>) -> i32 {
        let last_stage = children.iter().map(|c| c.stage).max();
        let statuses = match self.timeout {
            Some(timeout) => wait_until(children, Instant::now() + timeout),
            None => children
                .into_iter()
                .map(|child| (child.stage, wait_blocking(child)))
                .collect(),
        };

        statuses
            .into_iter()
            .find(|(stage, _)| Some(*stage) == last_stage)
            .and_then(|(_, status)| status)
            .unwrap_or(UNKNOWN_STATUS)
    }
}

fn wait_blocking(child: ChildHandle) -> Option<i32> {
    loop {
        match waitpid(child.pid, None) {
            Ok(status) => {
                if let Some(code) = exit_code(child, status) {
                    return Some(code);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(errno) => {
                warn!(pid = %child.pid, stage = child.stage, %errno, "cannot wait for child");
                return None;
            }
        }
    }
}

fn wait_until(children: Vec<ChildHandle>, deadline: Instant) -> Vec<(usize, Option<i32>)> {
    let mut pending = children;
    let mut statuses = Vec::with_capacity(pending.len());

    while !pending.is_empty() {
        let mut still_running = Vec::with_capacity(pending.len());
        for child in pending {
            match waitpid(child.pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) | Err(Errno::EINTR) => still_running.push(child),
                Ok(status) => match exit_code(child, status) {
                    Some(code) => statuses.push((child.stage, Some(code))),
                    None => still_running.push(child),
                },
                Err(errno) => {
                    warn!(pid = %child.pid, stage = child.stage, %errno, "cannot wait for child");
                    statuses.push((child.stage, None));
                }
            }
        }
        pending = still_running;

        if pending.is_empty() {
            break;
        }
        if Instant::now() >= deadline {
            for child in &pending {
                warn!(pid = %child.pid, stage = child.stage, "timed out, killing");
                if let Err(errno) = kill(child.pid, Signal::SIGKILL) {
                    warn!(pid = %child.pid, %errno, "kill failed");
                }
            }
            statuses.extend(
                pending
                    .drain(..)
                    .map(|child| (child.stage, wait_blocking(child))),
            );
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }
    statuses
}

/// `None` for states that do not end the process.
fn exit_code(child: ChildHandle, status: WaitStatus) -> Option<i32> {
    match status {
        WaitStatus::Exited(pid, code) => {
            debug!(%pid, stage = child.stage, code, "child exited");
            Some(code)
        }
        WaitStatus::Signaled(pid, sig, _) => {
            warn!(%pid, stage = child.stage, signal = %sig, "child terminated by signal");
            Some(128 + sig as i32)
        }
        _ => None,
    }
}
