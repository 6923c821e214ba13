//! Member eligibility.
//!
//! A member that cannot be bound is never an error: it is left out of both
//! emitted sides and the reason is reported as a note.

use std::fmt;

use csbind_model::{ClassModel, Function};

use crate::options::OmitRules;
use crate::symbols::operator_method_name;
use crate::types::Shape;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    /// Opted out in the model.
    Skipped,
    /// Destruction is owned by the managed runtime.
    Destructor,
    /// Omitted by configuration, for example on one platform.
    Omitted,
    /// A parameter or the return type has no marshaling pattern.
    UnsupportedType { ty: String },
    /// The operator has no managed counterpart or is not binary.
    UnsupportedOperator { token: String },
    /// An earlier overload already has this managed signature, typically
    /// because they differ only in the hidden engine context.
    DuplicateSignature { signature: String },
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped => f.write_str("marked skip"),
            Self::Destructor => f.write_str("destructors are not bound"),
            Self::Omitted => f.write_str("omitted by configuration"),
            Self::UnsupportedType { ty } => write!(f, "type `{ty}` cannot be marshaled"),
            Self::UnsupportedOperator { token } => {
                write!(f, "operator `{token}` has no managed form")
            }
            Self::DuplicateSignature { signature } => {
                write!(f, "managed signature `{signature}` is already bound")
            }
        }
    }
}

/// Decides whether a function's signature can be expressed in the managed
/// language. Swappable so hosts with different runtimes can narrow or widen
/// the set.
pub trait TypeCompatibility: Send + Sync {
    fn incompatibility(&self, model: &ClassModel, function: &Function) -> Option<Exclusion>;
}

/// The default rules: the marshaling patterns in [`crate::types`] plus
/// configured omissions.
#[derive(Debug, Clone, Copy)]
pub struct ManagedTypeRules<'a> {
    omit: &'a OmitRules,
}

impl<'a> ManagedTypeRules<'a> {
    pub const fn new(omit: &'a OmitRules) -> Self {
        Self { omit }
    }
}

impl TypeCompatibility for ManagedTypeRules<'_> {
    fn incompatibility(&self, model: &ClassModel, function: &Function) -> Option<Exclusion> {
        let class = model.class(function.owner);
        if self.omit.omits(&class.name, &function.name) {
            return Some(Exclusion::Omitted);
        }

        if let Some(token) = function.operator_token() {
            if operator_method_name(token).is_none() || function.visible_arity() != 1 {
                return Some(Exclusion::UnsupportedOperator {
                    token: token.to_string(),
                });
            }
        }

        let unsupported = |ty: &csbind_model::TypeRef| Exclusion::UnsupportedType {
            ty: ty.describe(model),
        };
        for param in &function.params {
            if Shape::param(model, &param.ty).is_none() {
                return Some(unsupported(&param.ty));
            }
        }
        if !function.is_constructor() && Shape::result(model, &function.return_type).is_none() {
            return Some(unsupported(&function.return_type));
        }
        None
    }
}

/// Why `function` will not be bound, or `None` when it will.
pub fn exclusion_reason(
    model: &ClassModel,
    function: &Function,
    rules: &dyn TypeCompatibility,
) -> Option<Exclusion> {
    if function.skip {
        return Some(Exclusion::Skipped);
    }
    if function.is_destructor() {
        return Some(Exclusion::Destructor);
    }
    rules.incompatibility(model, function)
}

pub fn is_eligible(model: &ClassModel, function: &Function, rules: &dyn TypeCompatibility) -> bool {
    exclusion_reason(model, function, rules).is_none()
}
