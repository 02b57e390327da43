use std::ffi::CString;
use std::os::fd::RawFd;

use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, FdFlag};
use nix::sys::signal::{self, SigHandler, Signal};
use nix::unistd::{self, ForkResult, Pid};

use crate::ast::Stage;
use crate::error::ExecError;
use crate::parser::ParseError;

/// A spawned stage, waited for exactly once by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildHandle {
    pub pid: Pid,
    pub stage: usize,
}

/// Descriptors a child duplicates onto its standard streams. `None` keeps
/// the interpreter's own stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageIo {
    pub stdin: Option<RawFd>,
    pub stdout: Option<RawFd>,
}

/// Everything the child needs, built before `fork` so the child never
/// allocates.
#[derive(Debug)]
pub struct PreparedCommand {
    argv: Vec<CString>,
    diagnostic: Vec<u8>,
}

impl PreparedCommand {
    pub fn new(stage: &Stage) -> Result<Self, ParseError> {
        let argv = stage
            .argv
            .iter()
            .map(|arg| {
                CString::new(arg.as_bytes())
                    .map_err(|_| ParseError::InvalidArgument { word: arg.replace('\0', "\\0") })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if argv.is_empty() {
            return Err(ParseError::EmptyStage { index: 0 });
        }
        let diagnostic = format!("myshell: {}: ", stage.name()).into_bytes();
        Ok(PreparedCommand { argv, diagnostic })
    }

    pub fn program(&self) -> &CString {
        &self.argv[0]
    }
}

/// Forks one stage. `inherited` lists every descriptor the child must close
/// once its standard streams are in place.
pub fn spawn_stage(
    index: usize,
    cmd: &PreparedCommand,
    io: StageIo,
    inherited: &[RawFd],
    restore_signals: bool,
) -> Result<ChildHandle, Errno> {
    // SAFETY: the child only calls async-signal-safe functions before exec
    // or _exit.
    match unsafe { unistd::fork() }? {
        ForkResult::Parent { child } => Ok(ChildHandle { pid: child, stage: index }),
        ForkResult::Child => exec_child(cmd, io, inherited, restore_signals),
    }
}

fn exec_child(cmd: &PreparedCommand, io: StageIo, inherited: &[RawFd], restore_signals: bool) -> ! {
    // Ignored dispositions survive exec, and the interpreter starts with
    // SIGPIPE ignored. A writer must die once its reader is gone.
    // SAFETY: installing the default disposition runs no handler code.
    let _ = unsafe { signal::signal(Signal::SIGPIPE, SigHandler::SigDfl) };
    if restore_signals {
        for sig in [Signal::SIGINT, Signal::SIGQUIT] {
            // SAFETY: as above.
            let _ = unsafe { signal::signal(sig, SigHandler::SigDfl) };
        }
    }

    if let Some(fd) = io.stdin {
        if let Err(errno) = install_fd(fd, libc::STDIN_FILENO) {
            fail(cmd, ExecError::Other(errno));
        }
    }
    if let Some(fd) = io.stdout {
        if let Err(errno) = install_fd(fd, libc::STDOUT_FILENO) {
            fail(cmd, ExecError::Other(errno));
        }
    }
    for &fd in inherited {
        if fd > libc::STDERR_FILENO {
            let _ = unistd::close(fd);
        }
    }

    let errno = match unistd::execvp(cmd.program(), cmd.argv.as_slice()) {
        Ok(never) => match never {},
        Err(errno) => errno,
    };
    fail(cmd, ExecError::from_errno(errno))
}

/// Makes `fd` available as `target` after exec. When they are already the
/// same descriptor `dup2` is a no-op that keeps close-on-exec, so the flag is
/// cleared instead.
fn install_fd(fd: RawFd, target: RawFd) -> Result<(), Errno> {
    if fd == target {
        fcntl(fd, FcntlArg::F_SETFD(FdFlag::empty())).map(drop)
    } else {
        unistd::dup2(fd, target).map(drop)
    }
}

fn fail(cmd: &PreparedCommand, err: ExecError) -> ! {
    write_stderr(&cmd.diagnostic);
    write_stderr(err.reason().as_bytes());
    write_stderr(b"\n");
    // SAFETY: _exit skips atexit handlers and stdio flushing, which belong
    // to the parent.
    unsafe { libc::_exit(err.status()) }
}

fn write_stderr(bytes: &[u8]) {
    // SAFETY: plain write(2) on a valid buffer.
    unsafe {
        libc::write(libc::STDERR_FILENO, bytes.as_ptr().cast(), bytes.len());
    }
}
