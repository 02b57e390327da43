use crate::ast::{Pipeline, RedirectMode, Stage};
use crate::lexer::{Token, TokenKind};
use crate::parser::{ParseError, Parser};

pub struct DefaultParser<'a> {
    tokens: &'a [Token],
    pos: usize,
    max_stages: Option<usize>,
}

impl<'a> DefaultParser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0, max_stages: None }
    }

    pub fn with_max_stages(mut self, max: usize) -> Self {
        self.max_stages = Some(max);
        self
    }

    fn next(&mut self) -> Option<&'a Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect_target(&mut self, op: &Token) -> Result<String, ParseError> {
        match self.next() {
            Some(Token { kind: TokenKind::Word, lexeme, .. }) => Ok(lexeme.clone()),
            _ => Err(ParseError::MissingRedirectTarget { op: op.spelling().to_string() }),
        }
    }
}

impl Parser for DefaultParser<'_> {
    fn parse(&mut self) -> Result<Pipeline, ParseError> {
        if self.tokens.is_empty() {
            return Err(ParseError::EmptyInput);
        }

        let mut stages = Vec::new();
        let mut current = Stage::default();

        while let Some(tok) = self.next() {
            match tok.kind {
                TokenKind::Word => current.argv.push(tok.lexeme.clone()),
                TokenKind::Pipe => {
                    let done = std::mem::replace(&mut current, Stage::default());
                    stages.push(finish_stage(done, stages.len())?);
                }
                TokenKind::RedirectIn => {
                    current.stdin = Some(self.expect_target(tok)?);
                }
                TokenKind::RedirectOut => {
                    let path = self.expect_target(tok)?;
                    current = current.with_stdout(path, RedirectMode::Truncate);
                }
                TokenKind::RedirectAppend => {
                    let path = self.expect_target(tok)?;
                    current = current.with_stdout(path, RedirectMode::Append);
                }
            }
        }
        stages.push(finish_stage(current, stages.len())?);

        if let Some(max) = self.max_stages {
            if stages.len() > max {
                return Err(ParseError::PipelineTooDeep { max });
            }
        }

        // `<` belongs to the first stage and `>`/`>>` to the last one
        let last = stages.len() - 1;
        for (index, stage) in stages.iter().enumerate() {
            if index > 0 && stage.stdin.is_some() {
                return Err(ParseError::MisplacedRedirect { op: "<".to_string(), index });
            }
            if index < last {
                if let Some(out) = &stage.stdout {
                    return Err(ParseError::MisplacedRedirect {
                        op: out.mode.spelling().to_string(),
                        index,
                    });
                }
            }
        }

        Ok(Pipeline::new(stages))
    }
}

fn finish_stage(stage: Stage, index: usize) -> Result<Stage, ParseError> {
    if stage.argv.is_empty() {
        Err(ParseError::EmptyStage { index })
    } else {
        Ok(stage)
    }
}
