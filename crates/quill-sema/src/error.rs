//! User-facing semantic errors.
//!
//! The core answers most failures with values (the error type, an absent
//! method, a `false` from inference). The checked entry points additionally
//! record a [`TypeError`] in [`TypeTable::errors`](crate::table::TypeTable)
//! so the driver can report it. Types are rendered into the error when it is
//! recorded, so an error stays meaningful after the table moves on.

use quill_common::Span;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TypeError {
    /// A method was looked up on a type whose traits do not provide it.
    #[error("no method `{method}` found for `{ty}`")]
    MissingMethod {
        ty: String,
        method: String,
        span: Option<Span>,
    },
    /// A generic was given the wrong number of type arguments.
    #[error("`{generic}` expects {expected} type argument(s), found {found}")]
    GenericArity {
        generic: String,
        expected: usize,
        found: usize,
        span: Option<Span>,
    },
    /// Two types that must agree could not be unified.
    #[error("expected `{expected}`, found `{found}`")]
    Contradiction {
        expected: String,
        found: String,
        span: Option<Span>,
    },
    /// A type argument does not implement a bound required of it.
    #[error("`{ty}` does not implement `{bound}`")]
    TraitNotSatisfied {
        ty: String,
        bound: String,
        span: Option<Span>,
    },
}

impl TypeError {
    pub fn span(&self) -> Option<Span> {
        match self {
            TypeError::MissingMethod { span, .. }
            | TypeError::GenericArity { span, .. }
            | TypeError::Contradiction { span, .. }
            | TypeError::TraitNotSatisfied { span, .. } => *span,
        }
    }

    /// Stable diagnostic code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            TypeError::Contradiction { .. } => "E0001",
            TypeError::GenericArity { .. } => "E0003",
            TypeError::TraitNotSatisfied { .. } => "E0006",
            TypeError::MissingMethod { .. } => "E0007",
        }
    }
}
