//! Runtime values
//!
//! `Value` is what a Cairn program talks about: integers, booleans,
//! homogeneous lists and closures. Lists are owned vectors and copied on
//! `dup`; closures are shared through `Rc`.

use crate::scope::Scope;
use cairnc::Node;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub enum Value {
    /// Integer value
    Int(i64),

    /// Boolean value
    Bool(bool),

    /// List of values, all of one type
    List(Vec<Value>),

    /// Quotation paired with the scope it was created in
    Closure(Rc<Closure>),
}

/// A quotation captured at run time
///
/// Created once per evaluation of a quotation literal. `captured` is the
/// scope active at that point, not at the call site.
pub struct Closure {
    pub body: Rc<[Node]>,
    pub captured: Rc<Scope>,
}

impl Closure {
    pub fn new(body: Rc<[Node]>, captured: Rc<Scope>) -> Self {
        Closure { body, captured }
    }
}

impl Value {
    /// Kind of the value, for internal error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "Int",
            Value::Bool(_) => "Bool",
            Value::List(_) => "List",
            Value::Closure(_) => "Closure",
        }
    }

    pub fn closure(body: Rc<[Node]>, captured: Rc<Scope>) -> Self {
        Value::Closure(Rc::new(Closure::new(body, captured)))
    }
}

/// Structural equality on ints, bools and lists
///
/// Closures never compare equal, not even to themselves.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            _ => false,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Closure(closure) => write!(f, "{}", closure),
        }
    }
}

/// Rendered as the quotation's source text, e.g. `(dup *)`
impl fmt::Display for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, node) in self.body.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", node)?;
        }
        write!(f, ")")
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("body", &self.to_string())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closure(source: &str) -> Value {
        let program = cairnc::parse(source).unwrap();
        Value::closure(Rc::from(program.nodes), Scope::root())
    }

    #[test]
    fn test_render_scalars() {
        assert_eq!(Value::Int(-7).to_string(), "-7");
        assert_eq!(Value::Bool(true).to_string(), "true");
    }

    #[test]
    fn test_render_lists() {
        assert_eq!(Value::from(vec![1_i64, 4, 9]).to_string(), "[1, 4, 9]");
        assert_eq!(Value::List(vec![]).to_string(), "[]");
        let nested = Value::List(vec![Value::from(vec![1_i64]), Value::from(vec![2_i64, 3])]);
        assert_eq!(nested.to_string(), "[[1], [2, 3]]");
    }

    #[test]
    fn test_render_closure() {
        assert_eq!(closure("dup *").to_string(), "(dup *)");
        assert_eq!(closure("").to_string(), "()");
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(Value::from(vec![1_i64, 2]), Value::from(vec![1_i64, 2]));
        assert_ne!(Value::from(vec![1_i64, 2]), Value::from(vec![2_i64, 1]));
        assert_ne!(Value::Int(1), Value::Bool(true));
    }

    #[test]
    fn test_closures_never_equal() {
        let c = closure("1");
        assert_ne!(c, c.clone());
    }
}
