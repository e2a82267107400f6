//! Runtime error handling
//!
//! Runtime errors cover only what type checking cannot rule out: division
//! by zero and access into an empty list. They abort the evaluation; the
//! caller discards whatever the program had done so far.
//!
//! `Internal` marks a state a checked program should never reach, such as a
//! value of the wrong kind on the stack. Seeing one is a bug in the checker
//! or the evaluator.

use cairnc::Span;
use cairnc::diagnostic::Spanned;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("{op}: division by zero ({dividend} {op} 0)")]
    DivisionByZero {
        op: String,
        dividend: i64,
        span: Option<Span>,
    },

    #[error("{op}: empty list")]
    EmptyListAccess { op: String, span: Option<Span> },

    #[error("{op}: internal error: {message}")]
    Internal {
        op: String,
        message: String,
        span: Option<Span>,
    },
}

impl RuntimeError {
    pub fn internal(op: &str, message: impl Into<String>, span: Option<Span>) -> Self {
        RuntimeError::Internal {
            op: op.to_string(),
            message: message.into(),
            span,
        }
    }

    pub fn span(&self) -> Option<&Span> {
        match self {
            RuntimeError::DivisionByZero { span, .. }
            | RuntimeError::EmptyListAccess { span, .. }
            | RuntimeError::Internal { span, .. } => span.as_ref(),
        }
    }
}

impl Spanned for RuntimeError {
    fn span(&self) -> Option<&Span> {
        RuntimeError::span(self)
    }
}
