//! Error types for parsing and type checking.
//!
//! Type errors are reported before any execution and are fatal to the run.
//! Every variant carries the offending operator (or node description) and,
//! where the parser recorded one, its source span.

use crate::ast::Span;
use crate::types::{StackType, Type};
use thiserror::Error;

/// Low-level unification failure, without operator context.
///
/// The type checker converts these into [`TypeError`] once it knows which
/// node was being checked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnifyError {
    /// Constructor clash, e.g. `Int` vs `Bool`
    #[error("type mismatch: cannot unify {left} with {right}")]
    Mismatch { left: Type, right: Type },

    /// A variable would have to contain itself
    #[error("occurs check failed: {var} occurs in {ty} (would create an infinite type)")]
    Occurs { var: String, ty: String },

    /// A closed stack ran out of entries while the other side still had some
    #[error("stack shape mismatch: cannot unify {left} with {right}")]
    Shape { left: StackType, right: StackType },
}

/// Type-check-time errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("{context}: type mismatch, expected {expected} but found {found}")]
    TypeMismatch {
        context: String,
        expected: Type,
        found: Type,
        span: Option<Span>,
    },

    #[error("{context}: occurs check failed, {var} occurs in {ty} (would create an infinite type)")]
    OccursCheck {
        context: String,
        var: String,
        ty: String,
        span: Option<Span>,
    },

    #[error(
        "branches have incompatible stack effects: then branch produces {then_branch}, \
         else branch produces {else_branch}"
    )]
    BranchMismatch {
        then_branch: StackType,
        else_branch: StackType,
        span: Option<Span>,
    },

    #[error("unbound identifier '{name}'")]
    UnboundIdentifier { name: String, span: Option<Span> },

    #[error("{context}: stack underflow, needs {expected} but the stack is {found}")]
    ArityUnderflow {
        context: String,
        expected: StackType,
        found: StackType,
        span: Option<Span>,
    },
}

impl TypeError {
    /// Attach operator context to a unification failure
    pub fn from_unify(err: UnifyError, context: &str, span: Option<Span>) -> Self {
        let context = context.to_string();
        match err {
            UnifyError::Mismatch { left, right } => TypeError::TypeMismatch {
                context,
                expected: left,
                found: right,
                span,
            },
            UnifyError::Occurs { var, ty } => TypeError::OccursCheck {
                context,
                var,
                ty,
                span,
            },
            UnifyError::Shape { left, right } => TypeError::ArityUnderflow {
                context,
                expected: left,
                found: right,
                span,
            },
        }
    }

    pub fn span(&self) -> Option<&Span> {
        match self {
            TypeError::TypeMismatch { span, .. }
            | TypeError::OccursCheck { span, .. }
            | TypeError::BranchMismatch { span, .. }
            | TypeError::UnboundIdentifier { span, .. }
            | TypeError::ArityUnderflow { span, .. } => span.as_ref(),
        }
    }
}

/// Syntax error with the position of the offending token
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        ParseError {
            message: message.into(),
            span,
        }
    }
}

/// Anything that can go wrong before evaluation starts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("type error: {0}")]
    Type(#[from] TypeError),
}

impl CompileError {
    pub fn span(&self) -> Option<&Span> {
        match self {
            CompileError::Parse(err) => Some(&err.span),
            CompileError::Type(err) => err.span(),
        }
    }
}
