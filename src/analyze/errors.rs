use thiserror::Error;

use crate::diag::{Span, SpannedError};

#[derive(Debug, Error)]
pub enum SemanticErrorKind {
    #[error("Duplicate machine ID `{0}`")]
    DuplicateMachine(String),

    #[error("Duplicate state ID `{0}`")]
    DuplicateState(String),

    #[error("Duplicate transition for event `{0}`")]
    DuplicateTransition(String),

    #[error("Duplicate event protocol for event `{0}`")]
    DuplicateEventProtocol(String),

    #[error("More than one initial child of `{0}`")]
    MultipleInitial(String),

    #[error("Transient state `{0}` cannot have child states")]
    TransientWithChildren(String),

    #[error("Cannot resolve transition target `{0}`")]
    UnresolvedTarget(String),

    #[error("Cannot resolve machine `{0}` for `@use`")]
    UnresolvedUse(String),
}

pub type SemanticError = SpannedError<SemanticErrorKind>;
pub use SemanticErrorKind as SEK;

impl SemanticErrorKind {
    pub fn at(self, span: Span) -> SemanticError {
        SemanticError::new(self, span)
    }
}
