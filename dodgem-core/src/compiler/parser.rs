//! Recursive-descent parser producing a [`SourceFile`]

use std::collections::HashSet;

use super::ast::{
    AssignTarget, BinOp, ClassDecl, Expr, FieldDecl, ImportDecl, LogOp, MethodDecl, SourceFile,
    Stmt, UnOp,
};
use super::token::{Coordinate, Token, TokenKind};

/// Where a parse error was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorLocation {
    /// At a concrete token
    At(Coordinate),
    /// Input ended where more was expected
    Eof,
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParserError {
    pub kind: ParserErrorKind,
    pub location: ErrorLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParserErrorKind {
    UnexpectedToken {
        found: String,
        expected: Vec<String>,
    },
    ExpectedIdentifier {
        found: String,
    },
    UnexpectedEndOfInput,
    /// A class may declare `init` at most once
    DuplicateConstructor,
    Custom(String),
}

impl ParserError {
    pub fn new(kind: ParserErrorKind, location: ErrorLocation) -> Self {
        Self { kind, location }
    }

    pub fn line(&self) -> Option<usize> {
        match self.location {
            ErrorLocation::At(coord) => Some(coord.line),
            _ => None,
        }
    }

    pub fn column(&self) -> Option<usize> {
        match self.location {
            ErrorLocation::At(coord) => Some(coord.column),
            _ => None,
        }
    }

    /// Message without the location prefix
    pub fn message(&self) -> String {
        match &self.kind {
            ParserErrorKind::UnexpectedToken { found, expected } => {
                if expected.len() == 1 {
                    format!("Unexpected token {found}, expected {}", expected[0])
                } else {
                    format!(
                        "Unexpected token {found}, expected one of: {}",
                        expected.join(", ")
                    )
                }
            }
            ParserErrorKind::ExpectedIdentifier { found } => {
                format!("Expected identifier, found {found}")
            }
            ParserErrorKind::UnexpectedEndOfInput => "Unexpected end of input".to_string(),
            ParserErrorKind::DuplicateConstructor => {
                "Class declares more than one constructor".to_string()
            }
            ParserErrorKind::Custom(message) => message.clone(),
        }
    }
}

impl std::fmt::Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = self.message();
        match self.location {
            ErrorLocation::At(coord) => {
                write!(f, "[{}:{}] {}", coord.line, coord.column, message)
            }
            ErrorLocation::Eof => write!(f, "[end of input] {message}"),
            ErrorLocation::Unknown => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for ParserError {}

/// Cursor-based parser over the full token stream
pub struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    used_idents: HashSet<String>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            cursor: 0,
            used_idents: HashSet::new(),
        }
    }

    /// Parse one compilation unit
    pub fn parse(tokens: Vec<Token>) -> Result<SourceFile, ParserError> {
        let mut parser = Self::new(tokens);
        let file = parser.source_file()?;
        if let Some(token) = parser.peek() {
            return Err(parser.unexpected(token.clone(), &["end of input"]));
        }
        Ok(file)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.cursor + offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).cloned();
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, describe: &str) -> Result<Token, ParserError> {
        match self.peek() {
            Some(token) if token.kind == kind => Ok(self.advance().unwrap()),
            Some(token) => Err(self.unexpected(token.clone(), &[describe])),
            None => Err(self.eof()),
        }
    }

    fn expect_identifier(&mut self) -> Result<(String, usize), ParserError> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Identifier => {
                let token = self.advance().unwrap();
                let line = token.span.start.line;
                Ok((token.text.unwrap_or_default(), line))
            }
            Some(token) => Err(ParserError::new(
                ParserErrorKind::ExpectedIdentifier {
                    found: describe_token(token),
                },
                ErrorLocation::At(token.span.start),
            )),
            None => Err(self.eof()),
        }
    }

    fn unexpected(&self, token: Token, expected: &[&str]) -> ParserError {
        ParserError::new(
            ParserErrorKind::UnexpectedToken {
                found: describe_token(&token),
                expected: expected.iter().map(|s| s.to_string()).collect(),
            },
            ErrorLocation::At(token.span.start),
        )
    }

    fn eof(&self) -> ParserError {
        ParserError::new(ParserErrorKind::UnexpectedEndOfInput, ErrorLocation::Eof)
    }

    fn line(&self) -> usize {
        self.peek().map(|t| t.span.start.line).unwrap_or(0)
    }

    // --- declarations ---

    fn source_file(&mut self) -> Result<SourceFile, ParserError> {
        self.expect(TokenKind::Package, "'package'")?;
        let package = self.dotted_path()?;
        self.expect(TokenKind::Semicolon, "';'")?;

        let mut imports = Vec::new();
        while self.check(TokenKind::Import) {
            let line = self.line();
            self.advance();
            let path = self.dotted_path()?;
            self.expect(TokenKind::Semicolon, "';'")?;
            imports.push(ImportDecl { path, line });
        }

        let class = self.class_decl()?;

        Ok(SourceFile {
            package,
            imports,
            class,
            used_idents: std::mem::take(&mut self.used_idents),
        })
    }

    fn dotted_path(&mut self) -> Result<String, ParserError> {
        let (first, _) = self.expect_identifier()?;
        let mut path = first;
        while self.match_kind(TokenKind::Dot) {
            let (segment, _) = self.expect_identifier()?;
            path.push('.');
            path.push_str(&segment);
        }
        Ok(path)
    }

    fn class_decl(&mut self) -> Result<ClassDecl, ParserError> {
        let line = self.line();
        self.expect(TokenKind::Class, "'class'")?;
        let (name, _) = self.expect_identifier()?;
        self.expect(TokenKind::LBrace, "'{'")?;

        let mut fields = Vec::new();
        let mut ctor: Option<MethodDecl> = None;
        let mut methods = Vec::new();
        let mut nested = Vec::new();

        loop {
            match self.peek_kind() {
                Some(TokenKind::RBrace) => {
                    self.advance();
                    break;
                }
                Some(TokenKind::Var) => {
                    let line = self.line();
                    self.advance();
                    let (name, _) = self.expect_identifier()?;
                    self.expect(TokenKind::Semicolon, "';'")?;
                    fields.push(FieldDecl { name, line });
                }
                Some(TokenKind::Init) => {
                    let line = self.line();
                    if ctor.is_some() {
                        return Err(ParserError::new(
                            ParserErrorKind::DuplicateConstructor,
                            ErrorLocation::At(self.peek().unwrap().span.start),
                        ));
                    }
                    self.advance();
                    let params = self.param_list()?;
                    let body = self.block()?;
                    ctor = Some(MethodDecl {
                        name: "init".to_string(),
                        params,
                        body,
                        line,
                    });
                }
                Some(TokenKind::Fn) => {
                    let line = self.line();
                    self.advance();
                    let (name, _) = self.expect_identifier()?;
                    let params = self.param_list()?;
                    let body = self.block()?;
                    methods.push(MethodDecl {
                        name,
                        params,
                        body,
                        line,
                    });
                }
                Some(TokenKind::Class) => {
                    nested.push(self.class_decl()?);
                }
                Some(_) => {
                    let token = self.peek().unwrap().clone();
                    return Err(
                        self.unexpected(token, &["'var'", "'init'", "'fn'", "'class'", "'}'"])
                    );
                }
                None => return Err(self.eof()),
            }
        }

        Ok(ClassDecl {
            name,
            line,
            fields,
            ctor,
            methods,
            nested,
        })
    }

    fn param_list(&mut self) -> Result<Vec<String>, ParserError> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let (name, _) = self.expect_identifier()?;
                params.push(name);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(params)
    }

    // --- statements ---

    fn block(&mut self) -> Result<Vec<Stmt>, ParserError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut stmts = Vec::new();
        loop {
            match self.peek_kind() {
                Some(TokenKind::RBrace) => {
                    self.advance();
                    return Ok(stmts);
                }
                Some(_) => stmts.push(self.statement()?),
                None => return Err(self.eof()),
            }
        }
    }

    fn statement(&mut self) -> Result<Stmt, ParserError> {
        match self.peek_kind() {
            Some(TokenKind::Var) => self.var_decl(),
            Some(TokenKind::If) => self.if_stmt(),
            Some(TokenKind::While) => self.while_stmt(),
            Some(TokenKind::Return) => self.return_stmt(),
            Some(TokenKind::Print) => self.print_stmt(),
            Some(_) => self.assign_or_expr_stmt(),
            None => Err(self.eof()),
        }
    }

    fn var_decl(&mut self) -> Result<Stmt, ParserError> {
        let line = self.line();
        self.advance();
        let (name, _) = self.expect_identifier()?;
        let init = if self.match_kind(TokenKind::Assign) {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(Stmt::VarDecl { name, init, line })
    }

    fn if_stmt(&mut self) -> Result<Stmt, ParserError> {
        let line = self.line();
        self.advance();
        self.expect(TokenKind::LParen, "'('")?;
        let cond = self.expression()?;
        self.expect(TokenKind::RParen, "')'")?;
        let then_body = self.block()?;
        let else_body = if self.match_kind(TokenKind::Else) {
            Some(self.block()?)
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_body,
            else_body,
            line,
        })
    }

    fn while_stmt(&mut self) -> Result<Stmt, ParserError> {
        let line = self.line();
        self.advance();
        self.expect(TokenKind::LParen, "'('")?;
        let cond = self.expression()?;
        self.expect(TokenKind::RParen, "')'")?;
        let body = self.block()?;
        Ok(Stmt::While { cond, body, line })
    }

    fn return_stmt(&mut self) -> Result<Stmt, ParserError> {
        let line = self.line();
        self.advance();
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(Stmt::Return { value, line })
    }

    fn print_stmt(&mut self) -> Result<Stmt, ParserError> {
        let line = self.line();
        self.advance();
        let expr = self.expression()?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(Stmt::Print { expr, line })
    }

    /// Assignments need lookahead: `name = ...;` and `this.name = ...;`
    /// overlap with expression statements on their first tokens
    fn assign_or_expr_stmt(&mut self) -> Result<Stmt, ParserError> {
        let line = self.line();

        let local_assign = self.check(TokenKind::Identifier)
            && self.peek_at(1).map(|t| t.kind) == Some(TokenKind::Assign);
        if local_assign {
            let (name, _) = self.expect_identifier()?;
            self.advance(); // '='
            let value = self.expression()?;
            self.expect(TokenKind::Semicolon, "';'")?;
            self.used_idents.insert(name.clone());
            return Ok(Stmt::Assign {
                target: AssignTarget::Local(name),
                value,
                line,
            });
        }

        let field_assign = self.check(TokenKind::This)
            && self.peek_at(1).map(|t| t.kind) == Some(TokenKind::Dot)
            && self.peek_at(2).map(|t| t.kind) == Some(TokenKind::Identifier)
            && self.peek_at(3).map(|t| t.kind) == Some(TokenKind::Assign);
        if field_assign {
            self.advance(); // 'this'
            self.advance(); // '.'
            let (name, _) = self.expect_identifier()?;
            self.advance(); // '='
            let value = self.expression()?;
            self.expect(TokenKind::Semicolon, "';'")?;
            return Ok(Stmt::Assign {
                target: AssignTarget::Field(name),
                value,
                line,
            });
        }

        let expr = self.expression()?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(Stmt::Expr { expr, line })
    }

    // --- expressions, lowest to highest precedence ---

    fn expression(&mut self) -> Result<Expr, ParserError> {
        self.logic_or()
    }

    fn logic_or(&mut self) -> Result<Expr, ParserError> {
        let mut expr = self.logic_and()?;
        while self.check(TokenKind::Or) {
            let line = self.line();
            self.advance();
            let rhs = self.logic_and()?;
            expr = Expr::Logical {
                op: LogOp::Or,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(expr)
    }

    fn logic_and(&mut self) -> Result<Expr, ParserError> {
        let mut expr = self.equality()?;
        while self.check(TokenKind::And) {
            let line = self.line();
            self.advance();
            let rhs = self.equality()?;
            expr = Expr::Logical {
                op: LogOp::And,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, ParserError> {
        let mut expr = self.comparison()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::EqEq) => BinOp::Eq,
                Some(TokenKind::BangEq) => BinOp::Ne,
                _ => return Ok(expr),
            };
            let line = self.line();
            self.advance();
            let rhs = self.comparison()?;
            expr = Expr::Binary {
                op,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
                line,
            };
        }
    }

    fn comparison(&mut self) -> Result<Expr, ParserError> {
        let mut expr = self.term()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Less) => BinOp::Lt,
                Some(TokenKind::LessEq) => BinOp::Le,
                Some(TokenKind::Greater) => BinOp::Gt,
                Some(TokenKind::GreaterEq) => BinOp::Ge,
                _ => return Ok(expr),
            };
            let line = self.line();
            self.advance();
            let rhs = self.term()?;
            expr = Expr::Binary {
                op,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
                line,
            };
        }
    }

    fn term(&mut self) -> Result<Expr, ParserError> {
        let mut expr = self.factor()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinOp::Add,
                Some(TokenKind::Minus) => BinOp::Sub,
                _ => return Ok(expr),
            };
            let line = self.line();
            self.advance();
            let rhs = self.factor()?;
            expr = Expr::Binary {
                op,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
                line,
            };
        }
    }

    fn factor(&mut self) -> Result<Expr, ParserError> {
        let mut expr = self.unary()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinOp::Mul,
                Some(TokenKind::Slash) => BinOp::Div,
                _ => return Ok(expr),
            };
            let line = self.line();
            self.advance();
            let rhs = self.unary()?;
            expr = Expr::Binary {
                op,
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
                line,
            };
        }
    }

    fn unary(&mut self) -> Result<Expr, ParserError> {
        let op = match self.peek_kind() {
            Some(TokenKind::Minus) => Some(UnOp::Neg),
            Some(TokenKind::Bang) => Some(UnOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            let line = self.line();
            self.advance();
            let operand = self.unary()?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                line,
            });
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, ParserError> {
        let token = match self.peek() {
            Some(token) => token.clone(),
            None => return Err(self.eof()),
        };
        let line = token.span.start.line;

        match token.kind {
            TokenKind::Int => {
                self.advance();
                // The lexer validated the literal; a failed parse here is a bug
                let text = token.text.unwrap_or_default();
                let value = text.parse::<i64>().map_err(|_| {
                    ParserError::new(
                        ParserErrorKind::Custom(format!("Invalid integer literal '{text}'")),
                        ErrorLocation::At(token.span.start),
                    )
                })?;
                Ok(Expr::Int { value, line })
            }
            TokenKind::Float => {
                self.advance();
                let text = token.text.unwrap_or_default();
                let value = text.parse::<f64>().map_err(|_| {
                    ParserError::new(
                        ParserErrorKind::Custom(format!("Invalid float literal '{text}'")),
                        ErrorLocation::At(token.span.start),
                    )
                })?;
                Ok(Expr::Float { value, line })
            }
            TokenKind::Str => {
                self.advance();
                Ok(Expr::Str {
                    value: token.text.unwrap_or_default(),
                    line,
                })
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Bool { value: true, line })
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Bool { value: false, line })
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Null { line })
            }
            TokenKind::This => {
                self.advance();
                if self.match_kind(TokenKind::Dot) {
                    let (name, _) = self.expect_identifier()?;
                    if self.check(TokenKind::LParen) {
                        let args = self.arg_list()?;
                        self.used_idents.insert(name.clone());
                        Ok(Expr::MethodCall { name, args, line })
                    } else {
                        self.used_idents.insert(name.clone());
                        Ok(Expr::FieldAccess { name, line })
                    }
                } else {
                    Ok(Expr::This { line })
                }
            }
            TokenKind::Identifier => {
                self.advance();
                let name = token.text.unwrap_or_default();
                self.used_idents.insert(name.clone());
                Ok(Expr::Var { name, line })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            _ => Err(self.unexpected(token, &["expression"])),
        }
    }

    fn arg_list(&mut self) -> Result<Vec<Expr>, ParserError> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.expression()?);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(args)
    }
}

fn describe_token(token: &Token) -> String {
    match (&token.kind, &token.text) {
        (TokenKind::Identifier, Some(text)) => format!("identifier '{text}'"),
        (TokenKind::Int, Some(text)) | (TokenKind::Float, Some(text)) => {
            format!("number '{text}'")
        }
        (TokenKind::Str, Some(text)) => format!("string \"{text}\""),
        (kind, _) => format!("{kind:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer::Lexer;

    fn parse(source: &str) -> Result<SourceFile, ParserError> {
        Parser::parse(Lexer::tokenize(source).expect("lex failure"))
    }

    const STUDENT: &str = r#"
        package com.stellariver.dodgem;
        class Student {
            var name;
            init() { this.name = "work"; }
            fn testPrint() { print this.name; }
        }
    "#;

    #[test]
    fn test_parse_student() {
        let file = parse(STUDENT).unwrap();
        assert_eq!(file.package, "com.stellariver.dodgem");
        assert_eq!(file.class.name, "Student");
        assert_eq!(file.fqn(), "com.stellariver.dodgem.Student");
        assert_eq!(file.class.fields.len(), 1);
        assert_eq!(file.class.fields[0].name, "name");
        assert!(file.class.ctor.is_some());
        assert_eq!(file.class.methods.len(), 1);
        assert_eq!(file.class.methods[0].name, "testPrint");
    }

    #[test]
    fn test_ctor_body_is_field_assignment() {
        let file = parse(STUDENT).unwrap();
        let ctor = file.class.ctor.unwrap();
        assert_eq!(ctor.body.len(), 1);
        match &ctor.body[0] {
            Stmt::Assign {
                target: AssignTarget::Field(name),
                value: Expr::Str { value, .. },
                ..
            } => {
                assert_eq!(name, "name");
                assert_eq!(value, "work");
            }
            other => panic!("unexpected statement: {other:?}"),
        }
    }

    #[test]
    fn test_imports() {
        let file = parse(
            "package a.b; import c.d.Helper; import e.Other; class X { }",
        )
        .unwrap();
        assert_eq!(file.imports.len(), 2);
        assert_eq!(file.imports[0].path, "c.d.Helper");
        assert_eq!(file.imports[0].imported_name(), "Helper");
        assert_eq!(file.imports[1].imported_name(), "Other");
    }

    #[test]
    fn test_nested_class() {
        let file = parse(
            "package a; class Outer { var x; class Inner { fn f() { return 1; } } }",
        )
        .unwrap();
        assert_eq!(file.class.nested.len(), 1);
        assert_eq!(file.class.nested[0].name, "Inner");
        assert_eq!(file.class.nested[0].methods.len(), 1);
    }

    #[test]
    fn test_control_flow() {
        let file = parse(
            "package a; class X { fn f(n) { var i = 0; while (i < n) { i = i + 1; } if (i == n) { return i; } else { return 0; } } }",
        )
        .unwrap();
        let body = &file.class.methods[0].body;
        assert!(matches!(body[0], Stmt::VarDecl { .. }));
        assert!(matches!(body[1], Stmt::While { .. }));
        assert!(matches!(
            body[2],
            Stmt::If {
                else_body: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn test_precedence() {
        let file = parse("package a; class X { fn f() { return 1 + 2 * 3; } }").unwrap();
        let ret = &file.class.methods[0].body[0];
        let Stmt::Return {
            value: Some(Expr::Binary { op, rhs, .. }),
            ..
        } = ret
        else {
            panic!("expected return with binary expr");
        };
        assert_eq!(*op, BinOp::Add);
        assert!(matches!(
            rhs.as_ref(),
            Expr::Binary { op: BinOp::Mul, .. }
        ));
    }

    #[test]
    fn test_logical_operators() {
        let file =
            parse("package a; class X { fn f(a, b) { return a and b or !a; } }").unwrap();
        let Stmt::Return {
            value: Some(Expr::Logical { op, .. }),
            ..
        } = &file.class.methods[0].body[0]
        else {
            panic!("expected logical expr");
        };
        assert_eq!(*op, LogOp::Or);
    }

    #[test]
    fn test_method_call_and_args() {
        let file = parse(
            "package a; class X { fn f() { return this.g(1, this.h()); } }",
        )
        .unwrap();
        let Stmt::Return {
            value: Some(Expr::MethodCall { name, args, .. }),
            ..
        } = &file.class.methods[0].body[0]
        else {
            panic!("expected method call");
        };
        assert_eq!(name, "g");
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_missing_package_is_error() {
        let err = parse("class X { }").unwrap_err();
        assert!(matches!(
            err.kind,
            ParserErrorKind::UnexpectedToken { .. }
        ));
        assert_eq!(err.line(), Some(1));
    }

    #[test]
    fn test_duplicate_constructor() {
        let err = parse("package a; class X { init() { } init() { } }").unwrap_err();
        assert!(matches!(err.kind, ParserErrorKind::DuplicateConstructor));
    }

    #[test]
    fn test_unexpected_eof() {
        let err = parse("package a; class X {").unwrap_err();
        assert!(matches!(err.kind, ParserErrorKind::UnexpectedEndOfInput));
        assert_eq!(err.location, ErrorLocation::Eof);
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let err = parse("package a; class X { } class Y { }").unwrap_err();
        assert!(matches!(err.kind, ParserErrorKind::UnexpectedToken { .. }));
    }

    #[test]
    fn test_used_idents_collected() {
        let file = parse(STUDENT).unwrap();
        assert!(file.used_idents.contains("name"));
    }
}
