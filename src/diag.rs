//! Source positions, spans, and the compile-error umbrella.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;

use thiserror::Error;

use crate::analyze::SemanticError;
use crate::generate::UnknownGenerator;
use crate::lexer::LexError;
use crate::parse::ParseError;
use crate::reader::ReadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

impl Default for Span {
    fn default() -> Self {
        let origin = Position {
            offset: 0,
            line: 1,
            column: 1,
        };
        Self {
            start: origin,
            end: origin,
        }
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// An error kind paired with the span it occurred at.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct SpannedError<K> {
    pub kind: K,
    pub span: Span,
}

impl<K> SpannedError<K> {
    pub fn new(kind: K, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

/// Location of the `@include` that requested a read, when there is one.
#[derive(Debug, Clone)]
pub struct ImportOrigin {
    pub path: PathBuf,
    pub span: Span,
}

fn origin_prefix(origin: &Option<ImportOrigin>) -> String {
    match origin {
        Some(origin) => format!("{}:{}: ", origin.path.display(), origin.span.start),
        None => String::new(),
    }
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{}:{}: {error}", .path.display(), .error.span.start)]
    Lex { path: PathBuf, error: LexError },

    #[error("{}:{}: {error}", .path.display(), .error.span().start)]
    Parse { path: PathBuf, error: ParseError },

    #[error("{}:{}: {error}", .path.display(), .error.span.start)]
    Semantic { path: PathBuf, error: SemanticError },

    #[error("{}{error}", origin_prefix(.from))]
    Read {
        from: Option<ImportOrigin>,
        error: ReadError,
    },

    #[error(transparent)]
    UnknownGenerator(#[from] UnknownGenerator),
}
