use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use argh::FromArgs;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use myshell::config::{Config, ConfigLoader};
use myshell::executor::BuiltinManager;
use myshell::io::{InteractiveSource, LineSource, ScriptSource};
use myshell::repl::{self, Shell};

const USAGE: &str = "usage: myshell [--config <path>] [script]";

#[derive(FromArgs)]
/// Line-oriented command interpreter with pipes and redirection.
struct Args {
    /// configuration file (default: ~/.myshellrc)
    #[argh(option)]
    config: Option<PathBuf>,

    /// script to run instead of reading commands interactively
    #[argh(positional)]
    script: Vec<String>,
}

fn main() -> ExitCode {
    let args: Args = argh::from_env();
    if args.script.len() > 1 {
        eprintln!("{}", USAGE);
        return ExitCode::from(1);
    }

    match run(args) {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("myshell: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run(args: Args) -> anyhow::Result<i32> {
    let config = ConfigLoader::load(args.config.as_deref()).context("cannot load configuration")?;
    init_logging(&config);

    let builtins = BuiltinManager::new();
    let interactive = args.script.is_empty();
    let mut source: Box<dyn LineSource> = match args.script.into_iter().next() {
        Some(path) => Box::new(
            ScriptSource::open(&path).with_context(|| format!("cannot open script {}", path))?,
        ),
        None => {
            repl::ignore_interactive_signals().context("cannot set signal dispositions")?;
            Box::new(
                InteractiveSource::new(&config.prompt, config.history_file.clone(), config.history_max)
                    .map_err(|e| anyhow!("cannot start line editor: {}", e))?,
            )
        }
    };

    let shell = Shell::new(&config, &builtins, config.exec_options(interactive));
    Ok(shell.run(source.as_mut())?)
}

/// `MYSHELL_LOG` wins over the configured level.
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_env("MYSHELL_LOG")
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).without_time())
        .try_init();
}
