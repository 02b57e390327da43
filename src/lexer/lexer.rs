use thiserror::Error;

use super::token::{Token, TokenKind};

#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum LexError {
    #[error("too many tokens (limit is {limit})")]
    TooManyTokens { limit: usize },
}

/// Splits a command line into whitespace-delimited tokens.
///
/// There is no quoting or escaping: `a|b` is one word, `a | b` is three
/// tokens.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    limit: Option<usize>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, pos: 0, limit: None }
    }

    /// Caps the number of tokens `tokenize_all` accepts.
    pub fn with_capacity(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn tokenize(line: &str) -> Result<Vec<Token>, LexError> {
        Lexer::new(line).tokenize_all()
    }

    pub fn next_token(&mut self) -> Option<Token> {
        let rest = &self.input[self.pos..];
        let skipped = rest.len() - rest.trim_start().len();
        let start = self.pos + skipped;
        let word = self.input[start..].split(char::is_whitespace).next().unwrap_or("");
        if word.is_empty() {
            self.pos = self.input.len();
            return None;
        }
        let end = start + word.len();
        self.pos = end;
        Some(Token {
            kind: TokenKind::classify(word),
            lexeme: word.to_string(),
            span: (start, end),
        })
    }

    pub fn tokenize_all(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            if let Some(limit) = self.limit {
                if tokens.len() == limit {
                    return Err(LexError::TooManyTokens { limit });
                }
            }
            tokens.push(token);
        }
        Ok(tokens)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(kind: TokenKind, lexeme: &str, span: (usize, usize)) -> Token {
        Token {
            kind,
            lexeme: lexeme.to_string(),
            span,
        }
    }

    #[test]
    fn test_tokenize_simple_words() {
        let tokens = Lexer::tokenize("echo hello").unwrap();
        assert_eq!(
            tokens,
            vec![
                token(TokenKind::Word, "echo", (0, 4)),
                token(TokenKind::Word, "hello", (5, 10)),
            ]
        );
    }

    #[test]
    fn test_tokenize_operators() {
        let tokens = Lexer::tokenize("cat < in | sort >> out > x").unwrap();
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Word,
                TokenKind::RedirectIn,
                TokenKind::Word,
                TokenKind::Pipe,
                TokenKind::Word,
                TokenKind::RedirectAppend,
                TokenKind::Word,
                TokenKind::RedirectOut,
                TokenKind::Word,
            ]
        );
    }

    #[test]
    fn test_spellings_rebuild_the_line() {
        let tokens = Lexer::tokenize("  sort  <in |  uniq >> log ").unwrap();
        let spellings: Vec<&str> = tokens.iter().map(Token::spelling).collect();
        assert_eq!(spellings.join(" "), "sort <in | uniq >> log");
        assert_eq!(Lexer::tokenize(&spellings.join(" ")).unwrap().len(), tokens.len());
    }

    #[test]
    fn test_operators_inside_words_are_not_split() {
        let tokens = Lexer::tokenize("ls|wc a>b").unwrap();
        assert_eq!(
            tokens,
            vec![
                token(TokenKind::Word, "ls|wc", (0, 5)),
                token(TokenKind::Word, "a>b", (6, 9)),
            ]
        );
    }

    #[test]
    fn test_tabs_and_repeated_spaces() {
        let tokens = Lexer::tokenize("  ls \t -l   ").unwrap();
        assert_eq!(
            tokens,
            vec![
                token(TokenKind::Word, "ls", (2, 4)),
                token(TokenKind::Word, "-l", (7, 9)),
            ]
        );
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(Lexer::tokenize("").unwrap().is_empty());
        assert!(Lexer::tokenize("   \t").unwrap().is_empty());
    }

    #[test]
    fn test_capacity_exceeded() {
        let err = Lexer::new("a b c d").with_capacity(3).tokenize_all().unwrap_err();
        assert_eq!(err, LexError::TooManyTokens { limit: 3 });
        assert!(Lexer::new("a b c").with_capacity(3).tokenize_all().is_ok());
    }

    #[test]
    fn test_lexer_is_restartable() {
        let line = "echo a | wc";
        let first: Vec<Token> = Lexer::new(line).collect();
        let second: Vec<Token> = Lexer::new(line).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }
}
