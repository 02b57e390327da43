use std::fs::{File, OpenOptions};
use std::os::fd::{AsRawFd, RawFd};

use crate::ast::{OutputRedirect, Pipeline, RedirectMode};
use crate::error::IoError;

/// Files replacing the first stage's stdin and the last stage's stdout.
///
/// Opened before anything is spawned so a bad path fails the whole
/// pipeline without creating a process.
#[derive(Debug, Default)]
pub struct Redirects {
    pub stdin: Option<File>,
    pub stdout: Option<File>,
}

impl Redirects {
    pub fn open(pipeline: &Pipeline) -> Result<Self, IoError> {
        let stdin = match pipeline.first().and_then(|s| s.stdin.as_deref()) {
            Some(path) => Some(open_input(path)?),
            None => None,
        };
        let stdout = match pipeline.last().and_then(|s| s.stdout.as_ref()) {
            Some(out) => Some(open_output(out)?),
            None => None,
        };
        Ok(Redirects { stdin, stdout })
    }

    pub fn stdin_fd(&self) -> Option<RawFd> {
        self.stdin.as_ref().map(AsRawFd::as_raw_fd)
    }

    pub fn stdout_fd(&self) -> Option<RawFd> {
        self.stdout.as_ref().map(AsRawFd::as_raw_fd)
    }

    pub fn open_fds(&self) -> impl Iterator<Item = RawFd> + '_ {
        self.stdin_fd().into_iter().chain(self.stdout_fd())
    }
}

fn open_input(path: &str) -> Result<File, IoError> {
    File::open(path).map_err(|source| IoError::RedirectOpenFailed {
        path: path.to_string(),
        source,
    })
}

fn open_output(out: &OutputRedirect) -> Result<File, IoError> {
    let mut options = OpenOptions::new();
    options.write(true).create(true);
    match out.mode {
        RedirectMode::Truncate => options.truncate(true),
        RedirectMode::Append => options.append(true),
    };
    options.open(&out.path).map_err(|source| IoError::RedirectOpenFailed {
        path: out.path.clone(),
        source,
    })
}
