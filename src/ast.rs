use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    Truncate,
    Append,
}

impl RedirectMode {
    pub fn spelling(&self) -> &'static str {
        match self {
            RedirectMode::Truncate => ">",
            RedirectMode::Append => ">>",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRedirect {
    pub path: String,
    pub mode: RedirectMode,
}

/// One command of a pipeline: its argument vector and the files that
/// replace its standard streams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stage {
    pub argv: Vec<String>,
    pub stdin: Option<String>,
    pub stdout: Option<OutputRedirect>,
}

impl Stage {
    pub fn new<S: Into<String>>(argv: impl IntoIterator<Item = S>) -> Self {
        Stage {
            argv: argv.into_iter().map(Into::into).collect(),
            stdin: None,
            stdout: None,
        }
    }

    pub fn with_stdin(mut self, path: impl Into<String>) -> Self {
        self.stdin = Some(path.into());
        self
    }

    pub fn with_stdout(mut self, path: impl Into<String>, mode: RedirectMode) -> Self {
        self.stdout = Some(OutputRedirect { path: path.into(), mode });
        self
    }

    /// Program name. Parsed stages always have one.
    pub fn name(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or("")
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or(&[])
    }

    pub fn has_redirect(&self) -> bool {
        self.stdin.is_some() || self.stdout.is_some()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv.join(" "))?;
        if let Some(path) = &self.stdin {
            write!(f, " < {}", path)?;
        }
        if let Some(out) = &self.stdout {
            write!(f, " {} {}", out.mode.spelling(), out.path)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(stages: Vec<Stage>) -> Self {
        Pipeline { stages }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn first(&self) -> Option<&Stage> {
        self.stages.first()
    }

    pub fn last(&self) -> Option<&Stage> {
        self.stages.last()
    }

    /// Number of pipes needed to connect the stages.
    pub fn pipe_count(&self) -> usize {
        self.stages.len().saturating_sub(1)
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", stage)?;
        }
        Ok(())
    }
}
