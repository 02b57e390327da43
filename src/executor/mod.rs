mod builtins;
mod default_executor;
mod pipe;
mod redirect;
mod spawn;
mod supervisor;

use std::time::Duration;

use crate::ast::Pipeline;
use crate::error::ShellError;

pub use builtins::{BuiltinCommand, BuiltinManager, BuiltinResult, CdCommand, ExitCommand};
pub use default_executor::DefaultExecutor;
pub use pipe::PipeEndpoint;
pub use redirect::Redirects;
pub use spawn::{ChildHandle, PreparedCommand, StageIo};
pub use supervisor::{Supervisor, UNKNOWN_STATUS};

/// What the caller should do after a pipeline ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecOutcome {
    /// Keep reading input; the value is the pipeline's exit status.
    Code(i32),
    /// Stop reading input and exit the interpreter with this status.
    Exit(i32),
}

pub type ExecStatus = Result<ExecOutcome, ShellError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOptions {
    /// Kill every stage still running after this long.
    pub timeout: Option<Duration>,
    /// Reset SIGINT/SIGQUIT to their defaults in children. Set when the
    /// interpreter itself ignores them.
    pub restore_signals: bool,
}

pub trait Executor {
    fn exec(&mut self, pipeline: &Pipeline) -> ExecStatus;
}
