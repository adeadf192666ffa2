//! Lexer for the Dodgem source language

use super::token::{Coordinate, Span, Token, TokenKind};

/// Lexical error, with the position it occurred at
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub position: Coordinate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LexErrorKind {
    /// Character that starts no token
    UnexpectedChar(char),
    /// String literal without a closing quote
    UnterminatedString,
    /// Unknown escape sequence inside a string literal
    InvalidEscape(char),
    /// Number literal that does not parse
    InvalidNumber(String),
}

impl LexError {
    pub fn at(kind: LexErrorKind, position: Coordinate) -> Self {
        Self { kind, position }
    }

    pub fn line(&self) -> usize {
        self.position.line
    }

    pub fn column(&self) -> usize {
        self.position.column
    }

    /// Message without the position prefix
    pub fn message(&self) -> String {
        match &self.kind {
            LexErrorKind::UnexpectedChar(c) => format!("Unexpected character '{c}'"),
            LexErrorKind::UnterminatedString => "Unterminated string literal".to_string(),
            LexErrorKind::InvalidEscape(c) => format!("Invalid escape sequence '\\{c}'"),
            LexErrorKind::InvalidNumber(s) => format!("Invalid number literal '{s}'"),
        }
    }
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}:{}] {}",
            self.position.line,
            self.position.column,
            self.message()
        )
    }
}

impl std::error::Error for LexError {}

/// Hand-rolled scanner over the source text
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    position: Coordinate,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            position: Coordinate::default(),
        }
    }

    /// Lex the whole source up front
    pub fn tokenize(source: &'a str) -> Result<Vec<Token>, LexError> {
        let mut lexer = Self::new(source);
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.position.line += 1;
            self.position.column = 1;
        } else {
            self.position.column += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    /// Consume the next char if it matches
    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') => {
                    // Only a comment when followed by a second slash
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    if lookahead.peek() == Some(&'/') {
                        while let Some(c) = self.peek() {
                            if c == '\n' {
                                break;
                            }
                            self.advance();
                        }
                    } else {
                        return;
                    }
                }
                _ => return,
            }
        }
    }

    /// Produce the next token, or None at end of input
    pub fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_whitespace_and_comments();

        let start = self.position;
        let c = match self.advance() {
            Some(c) => c,
            None => return Ok(None),
        };

        let simple = |kind| Ok(Some(Token::new(kind, Span::at(start))));

        match c {
            '(' => simple(TokenKind::LParen),
            ')' => simple(TokenKind::RParen),
            '{' => simple(TokenKind::LBrace),
            '}' => simple(TokenKind::RBrace),
            ';' => simple(TokenKind::Semicolon),
            ',' => simple(TokenKind::Comma),
            '.' => simple(TokenKind::Dot),
            '+' => simple(TokenKind::Plus),
            '-' => simple(TokenKind::Minus),
            '*' => simple(TokenKind::Star),
            '/' => simple(TokenKind::Slash),
            '=' => {
                if self.match_char('=') {
                    simple(TokenKind::EqEq)
                } else {
                    simple(TokenKind::Assign)
                }
            }
            '!' => {
                if self.match_char('=') {
                    simple(TokenKind::BangEq)
                } else {
                    simple(TokenKind::Bang)
                }
            }
            '<' => {
                if self.match_char('=') {
                    simple(TokenKind::LessEq)
                } else {
                    simple(TokenKind::Less)
                }
            }
            '>' => {
                if self.match_char('=') {
                    simple(TokenKind::GreaterEq)
                } else {
                    simple(TokenKind::Greater)
                }
            }
            '"' => self.string(start),
            c if c.is_ascii_digit() => self.number(c, start),
            c if c.is_alphabetic() || c == '_' => self.identifier(c, start),
            c => Err(LexError::at(LexErrorKind::UnexpectedChar(c), start)),
        }
    }

    fn string(&mut self, start: Coordinate) -> Result<Option<Token>, LexError> {
        let mut value = String::new();
        loop {
            match self.advance() {
                None => return Err(LexError::at(LexErrorKind::UnterminatedString, start)),
                Some('"') => break,
                Some('\\') => {
                    let escaped = self
                        .advance()
                        .ok_or(LexError::at(LexErrorKind::UnterminatedString, start))?;
                    match escaped {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        '\\' => value.push('\\'),
                        '"' => value.push('"'),
                        c => {
                            return Err(LexError::at(LexErrorKind::InvalidEscape(c), self.position))
                        }
                    }
                }
                Some(c) => value.push(c),
            }
        }
        Ok(Some(Token::with_text(
            TokenKind::Str,
            value,
            Span::new(start, self.position),
        )))
    }

    fn number(&mut self, first: char, start: Coordinate) -> Result<Option<Token>, LexError> {
        let mut text = String::from(first);
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let mut is_float = false;
        if self.peek() == Some('.') {
            // Only a fractional part when a digit follows the dot;
            // otherwise the dot is a member-access token
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if lookahead.peek().is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                text.push('.');
                self.advance();
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }

        let kind = if is_float {
            text.parse::<f64>()
                .map_err(|_| LexError::at(LexErrorKind::InvalidNumber(text.clone()), start))?;
            TokenKind::Float
        } else {
            text.parse::<i64>()
                .map_err(|_| LexError::at(LexErrorKind::InvalidNumber(text.clone()), start))?;
            TokenKind::Int
        };

        Ok(Some(Token::with_text(
            kind,
            text,
            Span::new(start, self.position),
        )))
    }

    fn identifier(&mut self, first: char, start: Coordinate) -> Result<Option<Token>, LexError> {
        let mut text = String::from(first);
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let span = Span::new(start, self.position);
        let token = match TokenKind::keyword(&text) {
            Some(kind) => Token::new(kind, span),
            None => Token::with_text(TokenKind::Identifier, text, span),
        };
        Ok(Some(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_empty_source() {
        assert!(Lexer::tokenize("").unwrap().is_empty());
        assert!(Lexer::tokenize("   \n\t  ").unwrap().is_empty());
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("class Student"),
            vec![TokenKind::Class, TokenKind::Identifier]
        );
        let tokens = Lexer::tokenize("class Student").unwrap();
        assert_eq!(tokens[1].text.as_deref(), Some("Student"));
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            kinds("(){};,."),
            vec![
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Semicolon,
                TokenKind::Comma,
                TokenKind::Dot,
            ]
        );
    }

    #[test]
    fn test_two_char_operators() {
        assert_eq!(
            kinds("== != <= >= < > = !"),
            vec![
                TokenKind::EqEq,
                TokenKind::BangEq,
                TokenKind::LessEq,
                TokenKind::GreaterEq,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::Assign,
                TokenKind::Bang,
            ]
        );
    }

    #[test]
    fn test_string_literal() {
        let tokens = Lexer::tokenize(r#""work""#).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].text.as_deref(), Some("work"));
    }

    #[test]
    fn test_string_escapes() {
        let tokens = Lexer::tokenize(r#""a\nb\"c""#).unwrap();
        assert_eq!(tokens[0].text.as_deref(), Some("a\nb\"c"));
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::tokenize(r#""open"#).unwrap_err();
        assert!(matches!(err.kind, LexErrorKind::UnterminatedString));
    }

    #[test]
    fn test_invalid_escape() {
        let err = Lexer::tokenize(r#""\q""#).unwrap_err();
        assert!(matches!(err.kind, LexErrorKind::InvalidEscape('q')));
    }

    #[test]
    fn test_numbers() {
        let tokens = Lexer::tokenize("42 3.5").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Int);
        assert_eq!(tokens[0].text.as_deref(), Some("42"));
        assert_eq!(tokens[1].kind, TokenKind::Float);
        assert_eq!(tokens[1].text.as_deref(), Some("3.5"));
    }

    #[test]
    fn test_number_then_dot_is_member_access() {
        // "1." without a digit after the dot lexes as Int then Dot
        assert_eq!(kinds("1."), vec![TokenKind::Int, TokenKind::Dot]);
    }

    #[test]
    fn test_line_comment() {
        assert_eq!(
            kinds("var x; // a comment\nvar y;"),
            vec![
                TokenKind::Var,
                TokenKind::Identifier,
                TokenKind::Semicolon,
                TokenKind::Var,
                TokenKind::Identifier,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_unexpected_char() {
        let err = Lexer::tokenize("@").unwrap_err();
        assert!(matches!(err.kind, LexErrorKind::UnexpectedChar('@')));
        assert_eq!(err.line(), 1);
        assert_eq!(err.column(), 1);
    }

    #[test]
    fn test_positions_track_lines() {
        let tokens = Lexer::tokenize("var\nname").unwrap();
        assert_eq!(tokens[0].span.start.line, 1);
        assert_eq!(tokens[1].span.start.line, 2);
        assert_eq!(tokens[1].span.start.column, 1);
    }
}
