//! Token and source position types

/// Source coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coordinate {
    pub line: usize,
    pub column: usize,
}

impl Default for Coordinate {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

/// Source range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: Coordinate,
    pub end: Coordinate,
}

impl Span {
    pub fn new(start: Coordinate, end: Coordinate) -> Self {
        Self { start, end }
    }

    /// Span covering a single coordinate
    pub fn at(coord: Coordinate) -> Self {
        Self {
            start: coord,
            end: coord,
        }
    }
}

/// Token kinds of the Dodgem source language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    Package,
    Import,
    Class,
    Init,
    Fn,
    Var,
    If,
    Else,
    While,
    Return,
    Print,
    This,
    True,
    False,
    Null,
    And,
    Or,

    // Literals and names
    Identifier,
    Int,
    Float,
    Str,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    Semicolon,
    Comma,
    Dot,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Bang,
    EqEq,
    BangEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

impl TokenKind {
    /// Resolve a keyword, if the identifier text is one
    pub fn keyword(text: &str) -> Option<Self> {
        match text {
            "package" => Some(TokenKind::Package),
            "import" => Some(TokenKind::Import),
            "class" => Some(TokenKind::Class),
            "init" => Some(TokenKind::Init),
            "fn" => Some(TokenKind::Fn),
            "var" => Some(TokenKind::Var),
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "while" => Some(TokenKind::While),
            "return" => Some(TokenKind::Return),
            "print" => Some(TokenKind::Print),
            "this" => Some(TokenKind::This),
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            "null" => Some(TokenKind::Null),
            "and" => Some(TokenKind::And),
            "or" => Some(TokenKind::Or),
            _ => None,
        }
    }
}

/// One lexed token
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Payload for Identifier/Int/Float/Str tokens (string literals are
    /// stored unescaped)
    pub text: Option<String>,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            text: None,
            span,
        }
    }

    pub fn with_text(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: Some(text.into()),
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(TokenKind::keyword("class"), Some(TokenKind::Class));
        assert_eq!(TokenKind::keyword("init"), Some(TokenKind::Init));
        assert_eq!(TokenKind::keyword("student"), None);
    }

    #[test]
    fn test_span_at() {
        let coord = Coordinate { line: 3, column: 7 };
        let span = Span::at(coord);
        assert_eq!(span.start, span.end);
        assert_eq!(span.start.line, 3);
    }
}
