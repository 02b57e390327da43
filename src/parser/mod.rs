pub mod default;

use thiserror::Error;

use crate::ast::Pipeline;
use crate::lexer::{LexError, Lexer};
use default::DefaultParser;

pub trait Parser {
    fn parse(&mut self) -> Result<Pipeline, ParseError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("input is empty")]
    EmptyInput,
    #[error("too many tokens (limit is {limit})")]
    TooManyTokens { limit: usize },
    #[error("missing file name after '{op}'")]
    MissingRedirectTarget { op: String },
    #[error("empty command in pipeline stage {index}")]
    EmptyStage { index: usize },
    #[error("'{op}' is not allowed on pipeline stage {index}")]
    MisplacedRedirect { op: String, index: usize },
    #[error("pipeline has more than {max} stages")]
    PipelineTooDeep { max: usize },
    #[error("argument contains a NUL byte: {word}")]
    InvalidArgument { word: String },
    #[error("{name}: redirection is not supported for builtins")]
    BuiltinRedirectUnsupported { name: String },
}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        match e {
            LexError::TooManyTokens { limit } => ParseError::TooManyTokens { limit },
        }
    }
}

/// Ceilings applied while turning a line into a pipeline. `None` means
/// unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseLimits {
    pub max_tokens: Option<usize>,
    pub max_stages: Option<usize>,
}

/// Tokenizes and parses one command line.
pub fn parse_line(line: &str, limits: ParseLimits) -> Result<Pipeline, ParseError> {
    let mut lexer = Lexer::new(line);
    if let Some(limit) = limits.max_tokens {
        lexer = lexer.with_capacity(limit);
    }
    let tokens = lexer.tokenize_all()?;

    let mut parser = DefaultParser::new(&tokens);
    if let Some(max) = limits.max_stages {
        parser = parser.with_max_stages(max);
    }
    parser.parse()
}
