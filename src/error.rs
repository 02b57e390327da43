use std::io;

use nix::errno::Errno;
use thiserror::Error;

use crate::parser::ParseError;

/// Failures around descriptors the engine opens in the parent.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("{path}: {source}")]
    RedirectOpenFailed {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("cannot create pipe: {0}")]
    PipeCreation(#[source] Errno),
}

#[derive(Debug, Error)]
pub enum BuiltinError {
    #[error("{name}: missing argument")]
    MissingArgument { name: String },
    #[error("{name}: {path}: {source}")]
    PathError {
        name: String,
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Why a forked child could not replace itself with the requested program.
///
/// This never reaches the interpreter: the child reports it on stderr and
/// exits with [`ExecError::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExecError {
    #[error("command not found")]
    NotFound,
    #[error("permission denied")]
    PermissionDenied,
    #[error("{0}")]
    Other(Errno),
}

impl ExecError {
    pub fn from_errno(errno: Errno) -> Self {
        match errno {
            Errno::ENOENT | Errno::ENOTDIR => ExecError::NotFound,
            Errno::EACCES | Errno::EPERM => ExecError::PermissionDenied,
            other => ExecError::Other(other),
        }
    }

    pub fn status(&self) -> i32 {
        match self {
            ExecError::NotFound => 127,
            ExecError::PermissionDenied | ExecError::Other(_) => 126,
        }
    }

    /// Static text for use between `fork` and `exec`, where allocating is
    /// not allowed.
    pub fn reason(&self) -> &'static str {
        match self {
            ExecError::NotFound => "command not found",
            ExecError::PermissionDenied => "permission denied",
            ExecError::Other(errno) => errno.desc(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Io(#[from] IoError),
    #[error("cannot create process: {0}")]
    Spawn(#[source] Errno),
    #[error(transparent)]
    Builtin(#[from] BuiltinError),
    #[error("cannot read input: {0}")]
    Input(#[source] io::Error),
}

impl ShellError {
    /// Fatal errors leave the interpreter unable to run anything else.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ShellError::Spawn(_) | ShellError::Input(_) | ShellError::Io(IoError::PipeCreation(_))
        )
    }
}
