//! Cairn runtime: evaluator for checked programs
//!
//! Key design principles:
//! - Value: what the language talks about (Int, Bool, List, Closure)
//! - Stack: a `Vec<Value>`, top at the end
//! - Scope: immutable chain of let-bindings that closures capture
//!
//! ```rust
//! use cairn_runtime::evaluate;
//!
//! let checked = cairnc::check_source("[1 2 3] (dup *) map print").unwrap();
//! let outcome = evaluate(&checked, Vec::new()).unwrap();
//! assert_eq!(outcome.output, vec!["[1, 4, 9]"]);
//! ```

pub mod arithmetic;
pub mod error;
pub mod interpreter;
pub mod list_ops;
pub mod print;
pub mod quotations;
pub mod scope;
pub mod stack;
pub mod value;

pub use error::RuntimeError;
pub use interpreter::{Interpreter, Outcome, evaluate};
pub use print::PrintHandler;
pub use scope::Scope;
pub use stack::Stack;
pub use value::{Closure, Value};
