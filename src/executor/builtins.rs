use std::collections::HashMap;

use tracing::debug;

use super::ExecOutcome;
use crate::error::BuiltinError;

pub type BuiltinResult = Result<ExecOutcome, BuiltinError>;

/// A command that runs inside the interpreter process.
pub trait BuiltinCommand {
    fn name(&self) -> &'static str;
    /// `argv[0]` is the builtin's own name.
    fn run(&self, argv: &[String]) -> BuiltinResult;
}

pub struct BuiltinManager {
    commands: HashMap<&'static str, Box<dyn BuiltinCommand>>,
}

impl BuiltinManager {
    pub fn new() -> Self {
        let mut mgr = BuiltinManager {
            commands: HashMap::new(),
        };
        mgr.register(Box::new(CdCommand));
        mgr.register(Box::new(ExitCommand));
        mgr
    }

    /// A registry with no commands; every name resolves to an external program.
    pub fn empty() -> Self {
        BuiltinManager {
            commands: HashMap::new(),
        }
    }

    pub fn register(&mut self, cmd: Box<dyn BuiltinCommand>) {
        self.commands.insert(cmd.name(), cmd);
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&dyn BuiltinCommand> {
        self.commands.get(name).map(|cmd| cmd.as_ref())
    }

    /// Runs `argv[0]` if it is registered, `None` otherwise.
    pub fn execute(&self, argv: &[String]) -> Option<BuiltinResult> {
        let name = argv.first()?;
        let cmd = self.get(name)?;
        debug!(builtin = %name, args = ?&argv[1..], "running builtin");
        Some(cmd.run(argv))
    }
}

impl Default for BuiltinManager {
    fn default() -> Self {
        Self::new()
    }
}

pub struct CdCommand;

impl BuiltinCommand for CdCommand {
    fn name(&self) -> &'static str {
        "cd"
    }
    fn run(&self, argv: &[String]) -> BuiltinResult {
        let target = argv.get(1).ok_or_else(|| BuiltinError::MissingArgument {
            name: self.name().to_string(),
        })?;
        std::env::set_current_dir(target).map_err(|source| BuiltinError::PathError {
            name: self.name().to_string(),
            path: target.clone(),
            source,
        })?;
        Ok(ExecOutcome::Code(0))
    }
}

/// Stops the interpreter. Arguments are ignored; the status is always 0.
pub struct ExitCommand;

impl BuiltinCommand for ExitCommand {
    fn name(&self) -> &'static str {
        "exit"
    }
    fn run(&self, _argv: &[String]) -> BuiltinResult {
        Ok(ExecOutcome::Exit(0))
    }
}
