use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::executor::ExecOptions;
use crate::parser::ParseLimits;

pub const DEFAULT_CONFIG_FILE: &str = ".myshellrc";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub prompt: String,
    pub history_file: Option<PathBuf>,
    pub history_max: usize,
    pub max_tokens: Option<usize>,
    pub max_stages: Option<usize>,
    pub timeout: Option<Duration>,
    pub log_level: String,
}

impl Config {
    pub fn parse_limits(&self) -> ParseLimits {
        ParseLimits {
            max_tokens: self.max_tokens,
            max_stages: self.max_stages,
        }
    }

    pub fn exec_options(&self, restore_signals: bool) -> ExecOptions {
        ExecOptions {
            timeout: self.timeout,
            restore_signals,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        ConfigLoader::default_config()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn default_config() -> Config {
        Config {
            prompt: "myshell$ ".to_string(),
            history_file: dirs::home_dir().map(|home| home.join(".myshell_history")),
            history_max: 500,
            max_tokens: None,
            max_stages: None,
            timeout: None,
            log_level: "warn".to_string(),
        }
    }

    /// Loads `explicit` if given, else `~/.myshellrc` when it exists, else
    /// the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }
        match dirs::home_dir().map(|home| home.join(DEFAULT_CONFIG_FILE)) {
            Some(path) if path.is_file() => Self::load_from_file(&path),
            _ => Ok(Self::default_config()),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let src = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load_from_str(&src)
    }

    pub fn load_from_str(src: &str) -> Result<Config, ConfigError> {
        let mut config = Self::default_config();

        for (lineno, line) in src.lines().enumerate() {
            let line_no = lineno + 1;
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(parse_error(line_no, format!("no '=' found: {}", line)));
            };
            let key = key.trim();
            let trimmed = value.trim();

            match key {
                // Untrimmed so a trailing space survives
                "prompt" => config.prompt = value.to_string(),
                "history_file" => {
                    config.history_file = if trimmed.is_empty() {
                        None
                    } else {
                        Some(expand_home(trimmed))
                    }
                }
                "history_max" => config.history_max = parse_number(line_no, key, trimmed)?,
                "max_tokens" => config.max_tokens = Some(parse_number(line_no, key, trimmed)?),
                "max_stages" => config.max_stages = Some(parse_number(line_no, key, trimmed)?),
                "timeout_ms" => {
                    let ms: u64 = parse_number(line_no, key, trimmed)?;
                    config.timeout = (ms > 0).then(|| Duration::from_millis(ms));
                }
                "log_level" => config.log_level = trimmed.to_string(),
                _ => return Err(parse_error(line_no, format!("unknown key: {}", key))),
            }
        }

        Ok(config)
    }
}

fn parse_error(line: usize, message: String) -> ConfigError {
    ConfigError::Parse { line, message }
}

fn parse_number<T: std::str::FromStr>(line: usize, key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| parse_error(line, format!("invalid number for {}: {}", key, value)))
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
