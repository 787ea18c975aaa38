use thiserror::Error;

use crate::diag::Span;
use crate::lexer::{Token, TokenKind};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Expected {0}, found: {1}")]
    ExpectedToken(TokenKind, Token),

    #[error("Expected identifier, found: {0}")]
    ExpectedIdent(Token),

    #[error("Expected string literal, found: {0}")]
    ExpectedStringLit(Token),

    #[error("Expected transition target, found: {0}")]
    ExpectedTarget(Token),

    #[error("Expected `@include`, `@machine`, or a state body, found: {0}")]
    ExpectedTopLevelItem(Token),

    #[error("Expected state, transition, or event protocol, found: {0}")]
    ExpectedStateBodyItem(Token),

    #[error("`@{0}` is not allowed here")]
    DirectiveNotAllowed(String, Span),

    #[error("Duplicate `@use` directive")]
    DuplicateUseDirective(Span),
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::ExpectedToken(_, token) => token.span,
            ParseError::ExpectedIdent(token) => token.span,
            ParseError::ExpectedStringLit(token) => token.span,
            ParseError::ExpectedTarget(token) => token.span,
            ParseError::ExpectedTopLevelItem(token) => token.span,
            ParseError::ExpectedStateBodyItem(token) => token.span,
            ParseError::DirectiveNotAllowed(_, span) => *span,
            ParseError::DuplicateUseDirective(span) => *span,
        }
    }
}
