use std::os::fd::RawFd;

use tracing::debug;

use super::builtins::BuiltinManager;
use super::pipe::PipeEndpoint;
use super::redirect::Redirects;
use super::spawn::{spawn_stage, ChildHandle, PreparedCommand, StageIo};
use super::supervisor::Supervisor;
use super::{ExecOptions, ExecOutcome, ExecStatus, Executor};
use crate::ast::{Pipeline, Stage};
use crate::error::{IoError, ShellError};
use crate::parser::ParseError;

/// Runs pipelines with one forked process per stage.
pub struct DefaultExecutor<'a> {
    builtins: &'a BuiltinManager,
    options: ExecOptions,
}

impl<'a> DefaultExecutor<'a> {
    pub fn new(builtins: &'a BuiltinManager, options: ExecOptions) -> Self {
        DefaultExecutor { builtins, options }
    }
}

impl Executor for DefaultExecutor<'_> {
    fn exec(&mut self, pipeline: &Pipeline) -> ExecStatus {
        let Some(first) = pipeline.first() else {
            return Err(ParseError::EmptyInput.into());
        };
        debug!(%pipeline, stages = pipeline.len(), "executing");

        if pipeline.len() == 1 {
            if let Some(outcome) = self.exec_builtin(first) {
                return outcome;
            }
        }
        self.exec_pipeline(pipeline)
    }
}

impl DefaultExecutor<'_> {
    /// Builtins only run in-process for a lone stage; inside a pipeline the
    /// name is looked up on PATH like any other program.
    fn exec_builtin(&self, stage: &Stage) -> Option<ExecStatus> {
        if !self.builtins.is_builtin(stage.name()) {
            return None;
        }
        if stage.has_redirect() {
            return Some(Err(ParseError::BuiltinRedirectUnsupported {
                name: stage.name().to_string(),
            }
            .into()));
        }
        self.builtins
            .execute(&stage.argv)
            .map(|result| result.map_err(ShellError::from))
    }

    fn exec_pipeline(&self, pipeline: &Pipeline) -> ExecStatus {
        let commands = pipeline
            .stages
            .iter()
            .map(PreparedCommand::new)
            .collect::<Result<Vec<_>, _>>()?;

        let mut redirects = Redirects::open(pipeline)?;
        let mut pipes = (0..pipeline.pipe_count())
            .map(|_| PipeEndpoint::create().map_err(IoError::PipeCreation))
            .collect::<Result<Vec<_>, _>>()?;

        let supervisor = Supervisor::new(self.options.timeout);
        let last = commands.len() - 1;
        let mut children: Vec<ChildHandle> = Vec::with_capacity(commands.len());

        for (index, cmd) in commands.iter().enumerate() {
            let io = StageIo {
                stdin: if index == 0 {
                    redirects.stdin_fd()
                } else {
                    pipes[index - 1].read_fd()
                },
                stdout: if index == last {
                    redirects.stdout_fd()
                } else {
                    pipes[index].write_fd()
                },
            };
            let inherited: Vec<RawFd> = pipes
                .iter()
                .flat_map(|pipe| pipe.open_fds())
                .chain(redirects.open_fds())
                .collect();

            match spawn_stage(index, cmd, io, &inherited, self.options.restore_signals) {
                Ok(child) => {
                    debug!(pid = %child.pid, stage = index, program = ?cmd.program(), "spawned");
                    children.push(child);
                }
                Err(errno) => {
                    // Earlier stages see EOF/EPIPE once our ends are gone.
                    drop(pipes);
                    drop(redirects);
                    supervisor.wait_all(children);
                    return Err(ShellError::Spawn(errno));
                }
            }

            // The child owns these now; release the parent's copies.
            if index == 0 {
                redirects.stdin.take();
            } else {
                pipes[index - 1].close_read();
            }
            if index == last {
                redirects.stdout.take();
            } else {
                pipes[index].close_write();
            }
        }

        debug_assert!(pipes.iter().all(PipeEndpoint::is_closed));
        let status = supervisor.wait_all(children);
        Ok(ExecOutcome::Code(status))
    }
}
