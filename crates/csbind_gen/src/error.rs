//! Fatal generation errors.
//!
//! Anything that merely makes a member unbindable is not an error; it is
//! recorded as a [`crate::Note`] and the member is left out.

use thiserror::Error;

pub type GenResult<T> = Result<T, GenError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenError {
    #[error("indentation underflow: dedent below depth zero")]
    IndentUnderflow,

    #[error("exported symbol `{symbol}` is produced by both {first} and {second}")]
    SymbolCollision {
        symbol: String,
        first: String,
        second: String,
    },

    #[error("failed to generate class `{class}`")]
    InClass {
        class: String,
        #[source]
        source: Box<GenError>,
    },
}

impl GenError {
    /// Attach the class being generated, once.
    #[must_use]
    pub fn in_class(self, class: &str) -> Self {
        match self {
            Self::InClass { .. } => self,
            other => Self::InClass {
                class: class.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, skipping class context.
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::InClass { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
