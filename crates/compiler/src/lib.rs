//! Cairn compiler library
//!
//! Parsing, stack-effect inference and diagnostics for Cairn, a
//! concatenative language with row-polymorphic stack effects.
//!
//! ```rust
//! use cairnc::check_source;
//!
//! let checked = check_source("[1 2 3] (dup *) map").unwrap();
//! assert_eq!(checked.effect().to_string(), "( -- List(Int) )");
//! ```
//!
//! The evaluator lives in `cairn-runtime` and only accepts a
//! [`CheckedProgram`].

pub mod ast;
pub mod builtins;
pub mod diagnostic;
pub mod error;
pub mod parser;
pub mod typechecker;
pub mod types;
pub mod unification;

pub use ast::{Builtin, Node, NodeId, NodeKind, Program, Span};
pub use error::{CompileError, ParseError, TypeError};
pub use parser::Parser;
pub use typechecker::{CheckedProgram, TypeChecker};
pub use types::{Effect, StackType, Type};

/// Parse source text into a program
pub fn parse(source: &str) -> Result<Program, ParseError> {
    Parser::new(source).parse()
}

/// Infer the principal effect of a program over an open stack
pub fn check(program: &Program) -> Result<CheckedProgram, TypeError> {
    TypeChecker::new().check(program)
}

/// Check a program that must run from an empty stack
pub fn check_closed(program: &Program) -> Result<CheckedProgram, TypeError> {
    TypeChecker::new().check_with_stack(program, &StackType::Empty)
}

/// Parse and check source the way a file run does: from an empty stack
pub fn check_source(source: &str) -> Result<CheckedProgram, CompileError> {
    let program = parse(source)?;
    Ok(check_closed(&program)?)
}
