#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Pipe,           // |
    RedirectIn,     // <
    RedirectOut,    // >
    RedirectAppend, // >>
}

impl TokenKind {
    /// Control symbols are only recognized when a whole word matches.
    pub fn classify(word: &str) -> TokenKind {
        match word {
            "|" => TokenKind::Pipe,
            "<" => TokenKind::RedirectIn,
            ">" => TokenKind::RedirectOut,
            ">>" => TokenKind::RedirectAppend,
            _ => TokenKind::Word,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,       // Original string
    pub span: (usize, usize), // Byte offsets [start, end)
}

impl Token {
    /// Text of the token as it appeared on the line.
    pub fn spelling(&self) -> &str {
        &self.lexeme
    }
}
