use std::io;

use nix::sys::signal::{self, SigHandler, Signal};
use tracing::{debug, error};

use crate::config::Config;
use crate::error::ShellError;
use crate::executor::{BuiltinManager, DefaultExecutor, ExecOptions, ExecOutcome, ExecStatus, Executor};
use crate::io::LineSource;
use crate::parser::parse_line;

/// The read/parse/execute loop shared by interactive and script mode.
pub struct Shell<'a> {
    config: &'a Config,
    builtins: &'a BuiltinManager,
    options: ExecOptions,
}

impl<'a> Shell<'a> {
    pub fn new(config: &'a Config, builtins: &'a BuiltinManager, options: ExecOptions) -> Self {
        Shell {
            config,
            builtins,
            options,
        }
    }

    /// Parses and executes one line.
    pub fn run_line(&self, line: &str) -> ExecStatus {
        let pipeline = parse_line(line, self.config.parse_limits())?;
        DefaultExecutor::new(self.builtins, self.options).exec(&pipeline)
    }

    /// Runs lines until end of input or `exit`, and returns the status the
    /// interpreter should exit with. Errors that leave the engine unable to
    /// continue are returned; everything else is reported and skipped.
    pub fn run(&self, source: &mut dyn LineSource) -> Result<i32, ShellError> {
        let result = self.run_loop(source);
        source.close();
        result
    }

    fn run_loop(&self, source: &mut dyn LineSource) -> Result<i32, ShellError> {
        loop {
            let line = match source.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => break,
                // The source has already moved past the offending line
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    eprintln!("myshell: {}", e);
                    continue;
                }
                Err(e) => return Err(ShellError::Input(e)),
            };
            if line.trim().is_empty() {
                continue;
            }
            match self.run_line(&line) {
                Ok(ExecOutcome::Code(status)) => debug!(status, "pipeline finished"),
                Ok(ExecOutcome::Exit(code)) => return Ok(code),
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "giving up");
                    return Err(e);
                }
                Err(e) => eprintln!("myshell: {}", e),
            }
        }
        Ok(0)
    }
}

/// Keeps terminal interrupts from killing the interpreter. Children get the
/// default dispositions back through [`ExecOptions::restore_signals`].
pub fn ignore_interactive_signals() -> nix::Result<()> {
    for sig in [Signal::SIGINT, Signal::SIGQUIT] {
        // SAFETY: SigIgn installs no handler code.
        unsafe { signal::signal(sig, SigHandler::SigIgn) }?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IoError;
    use crate::io::ScriptSource;
    use crate::parser::ParseError;
    use std::fs::read_to_string;
    use std::io::Cursor;

    struct FailingSource {
        closed: bool,
    }

    impl LineSource for FailingSource {
        fn next_line(&mut self) -> io::Result<Option<String>> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn close(&mut self) {
            self.closed = true;
        }
    }

    fn run_script(config: &Config, script: &str) -> Result<i32, ShellError> {
        let builtins = BuiltinManager::new();
        let shell = Shell::new(config, &builtins, config.exec_options(false));
        shell.run(&mut ScriptSource::new(Cursor::new(script.to_string())))
    }

    #[test]
    fn test_end_of_input_exits_zero() {
        assert_eq!(run_script(&Config::default(), "false\n").unwrap(), 0);
        assert_eq!(run_script(&Config::default(), "").unwrap(), 0);
    }

    #[test]
    fn test_exit_stops_reading() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let script = format!("exit\ntouch {}\n", marker.display());
        assert_eq!(run_script(&Config::default(), &script).unwrap(), 0);
        assert!(!marker.exists());
    }

    #[test]
    fn test_errors_do_not_stop_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let script = format!(
            "ls |\n< {}\nmyshell-no-such-program\ncat < {}\necho ok > {}\n",
            out.display(),
            dir.path().join("missing").display(),
            out.display()
        );
        assert_eq!(run_script(&Config::default(), &script).unwrap(), 0);
        assert_eq!(read_to_string(&out).unwrap(), "ok\n");
    }

    #[test]
    fn test_undecodable_line_does_not_end_script() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let mut script = b"echo \xff\n".to_vec();
        script.extend_from_slice(format!("touch {}\n", marker.display()).as_bytes());

        let config = Config::default();
        let builtins = BuiltinManager::new();
        let shell = Shell::new(&config, &builtins, ExecOptions::default());
        assert_eq!(shell.run(&mut ScriptSource::new(Cursor::new(script))).unwrap(), 0);
        assert!(marker.exists());
    }

    #[test]
    fn test_limits_come_from_config() {
        let config = Config {
            max_stages: Some(2),
            ..Config::default()
        };
        let builtins = BuiltinManager::new();
        let shell = Shell::new(&config, &builtins, ExecOptions::default());
        assert!(matches!(
            shell.run_line("true | true | true"),
            Err(ShellError::Parse(ParseError::PipelineTooDeep { max: 2 }))
        ));
        assert!(matches!(shell.run_line("true | true"), Ok(ExecOutcome::Code(0))));
    }

    #[test]
    fn test_run_line_reports_redirect_failure() {
        let builtins = BuiltinManager::new();
        let config = Config::default();
        let shell = Shell::new(&config, &builtins, ExecOptions::default());
        let err = shell.run_line("cat < /definitely/not/here").unwrap_err();
        assert!(matches!(err, ShellError::Io(IoError::RedirectOpenFailed { .. })));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_input_failure_is_fatal_and_closes_source() {
        let builtins = BuiltinManager::new();
        let config = Config::default();
        let shell = Shell::new(&config, &builtins, ExecOptions::default());
        let mut source = FailingSource { closed: false };
        assert!(matches!(shell.run(&mut source), Err(ShellError::Input(_))));
        assert!(source.closed);
    }
}
