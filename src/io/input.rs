use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use rustyline::config::Config as EditorConfig;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, warn};

/// Where command lines come from. `Ok(None)` is end of input.
pub trait LineSource {
    fn next_line(&mut self) -> io::Result<Option<String>>;

    /// Called once no more lines will be read.
    fn close(&mut self) {}
}

/// Reads commands from a script, one per line.
///
/// A line that is not valid UTF-8 is consumed and reported as
/// [`io::ErrorKind::InvalidData`]; the following call reads the next line.
pub struct ScriptSource<R> {
    reader: R,
    line_no: usize,
    buf: Vec<u8>,
}

impl ScriptSource<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> ScriptSource<R> {
    pub fn new(reader: R) -> Self {
        ScriptSource {
            reader,
            line_no: 0,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> LineSource for ScriptSource<R> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            if self.buf.last() == Some(&b'\n') {
                self.buf.pop();
                if self.buf.last() == Some(&b'\r') {
                    self.buf.pop();
                }
            }
            let line = String::from_utf8(std::mem::take(&mut self.buf)).map_err(|_| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("line {}: not valid UTF-8", self.line_no),
                )
            })?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            return Ok(Some(line));
        }
    }
}

/// Line editor with history for interactive use.
pub struct InteractiveSource {
    editor: DefaultEditor,
    prompt: String,
    history_file: Option<PathBuf>,
}

impl InteractiveSource {
    pub fn new(
        prompt: &str,
        history_file: Option<PathBuf>,
        history_max: usize,
    ) -> Result<Self, ReadlineError> {
        let config = EditorConfig::builder()
            .max_history_size(history_max)?
            .auto_add_history(false)
            .build();
        let mut editor = DefaultEditor::with_config(config)?;
        if let Some(path) = &history_file {
            // A missing history file is normal on first start.
            if let Err(e) = editor.load_history(path) {
                debug!(path = %path.display(), error = %e, "no history loaded");
            }
        }
        Ok(InteractiveSource {
            editor,
            prompt: prompt.to_string(),
            history_file,
        })
    }
}

impl LineSource for InteractiveSource {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            match self.editor.readline(&self.prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = self.editor.add_history_entry(line.as_str());
                    }
                    return Ok(Some(line));
                }
                // Ctrl-C discards the current line
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => return Ok(None),
                Err(ReadlineError::Io(e)) => return Err(e),
                Err(e) => return Err(io::Error::other(e.to_string())),
            }
        }
    }

    fn close(&mut self) {
        if let Some(path) = &self.history_file {
            if let Err(e) = self.editor.save_history(path) {
                warn!(path = %path.display(), error = %e, "cannot save history");
            }
        }
    }
}
