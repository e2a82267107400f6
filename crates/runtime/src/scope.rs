//! Lexical scopes
//!
//! A scope maps names to values and points at the scope it was created in.
//! Children never modify their parent. A let-block's scope is dropped when
//! the block exits unless a closure created inside it still holds it.

use crate::value::Value;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct Scope {
    bindings: HashMap<String, Value>,
    parent: Option<Rc<Scope>>,
}

impl Scope {
    /// An empty scope with no parent
    pub fn root() -> Rc<Scope> {
        Rc::new(Scope::default())
    }

    /// A scope nested inside `parent`
    pub fn child<I>(parent: &Rc<Scope>, bindings: I) -> Rc<Scope>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        Rc::new(Scope {
            bindings: bindings.into_iter().collect(),
            parent: Some(Rc::clone(parent)),
        })
    }

    /// Find the innermost binding of `name`
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let mut scope = self;
        loop {
            if let Some(value) = scope.bindings.get(name) {
                return Some(value);
            }
            scope = scope.parent.as_deref()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_parents() {
        let root = Scope::root();
        let outer = Scope::child(&root, [("a".to_string(), Value::Int(1))]);
        let inner = Scope::child(&outer, [("b".to_string(), Value::Int(2))]);

        assert_eq!(inner.lookup("a"), Some(&Value::Int(1)));
        assert_eq!(inner.lookup("b"), Some(&Value::Int(2)));
        assert_eq!(outer.lookup("b"), None);
    }

    #[test]
    fn test_shadowing() {
        let root = Scope::root();
        let outer = Scope::child(&root, [("x".to_string(), Value::Int(1))]);
        let inner = Scope::child(&outer, [("x".to_string(), Value::Bool(true))]);
        assert_eq!(inner.lookup("x"), Some(&Value::Bool(true)));
        assert_eq!(outer.lookup("x"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_child_outlives_block_when_captured() {
        let root = Scope::root();
        let captured = {
            let block = Scope::child(&root, [("x".to_string(), Value::Int(5))]);
            Rc::clone(&block)
        };
        assert_eq!(captured.lookup("x"), Some(&Value::Int(5)));
        assert_eq!(Rc::strong_count(&root), 2);
    }
}
