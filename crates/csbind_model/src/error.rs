use csbind_utils::{Diagnostic, Span};
use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("failed to parse class model: {message}")]
    Parse {
        message: String,
        /// Byte offset reported by the YAML parser, when it has one.
        offset: Option<usize>,
    },

    #[error("duplicate package `{name}`")]
    DuplicatePackage { name: String },

    #[error("duplicate class `{name}` (first declared in package `{package}`)")]
    DuplicateClass { name: String, package: String },

    #[error(
        "class `{class}` derives from unknown class `{base}`{}",
        did_you_mean(.suggestion.as_deref())
    )]
    UnknownBaseClass {
        class: String,
        base: String,
        suggestion: Option<String>,
    },

    #[error(
        "unknown type `{ty}` in `{class}::{function}`{}",
        did_you_mean(.suggestion.as_deref())
    )]
    UnknownType {
        class: String,
        function: String,
        ty: String,
        suggestion: Option<String>,
    },

    #[error("inheritance cycle through class `{class}`")]
    InheritanceCycle { class: String },

    #[error("property `{class}.{property}` refers to unknown function `{function}`")]
    UnknownAccessor {
        class: String,
        property: String,
        function: String,
    },

    #[error("property `{class}.{property}` has neither a getter nor a setter")]
    EmptyProperty { class: String, property: String },
}

impl ModelError {
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::UnknownBaseClass { suggestion, .. } | Self::UnknownType { suggestion, .. } => {
                suggestion.as_deref()
            }
            _ => None,
        }
    }

    /// Source position for errors the YAML parser could locate.
    pub const fn offset(&self) -> Option<usize> {
        match self {
            Self::Parse { offset, .. } => *offset,
            _ => None,
        }
    }

    /// A located diagnostic, when the error can point into the source.
    pub fn to_diagnostic(&self, source_id: &str) -> Option<Diagnostic> {
        let offset = self.offset()?;
        Some(
            Diagnostic::error(source_id, Span::point(offset), self.to_string())
                .with_label("here"),
        )
    }
}

fn did_you_mean(suggestion: Option<&str>) -> String {
    suggestion.map_or_else(String::new, |name| format!("; did you mean `{name}`?"))
}

impl From<serde_yaml::Error> for ModelError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::Parse {
            offset: error.location().map(|location| location.index()),
            message: error.to_string(),
        }
    }
}
