//! Source-to-bytecode pipeline: lexer, parser, diagnostics, codegen

pub mod ast;
pub mod codegen;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod token;

pub use codegen::{compile_source, CodegenError, CodegenErrorKind, CodegenOutput};
pub use diagnostics::{Diagnostic, DiagnosticReport, Severity};
pub use lexer::{LexError, LexErrorKind, Lexer};
pub use parser::{ErrorLocation, Parser, ParserError, ParserErrorKind};
pub use token::{Coordinate, Span, Token, TokenKind};
