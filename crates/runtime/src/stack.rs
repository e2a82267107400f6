//! Value stack
//!
//! The stack is a plain `Vec<Value>` with the top at the end. Every operator
//! pops through the helpers here so that a value of the wrong kind, or a
//! missing value, becomes an `Internal` error instead of a panic. A checked
//! program never hits either case.

use crate::error::RuntimeError;
use crate::value::{Closure, Value};
use cairnc::Span;
use std::rc::Rc;

pub type Stack = Vec<Value>;

/// The operator being applied and where it appears in the source
#[derive(Debug, Clone, Copy)]
pub struct Site<'a> {
    pub op: &'a str,
    pub span: Option<Span>,
}

impl<'a> Site<'a> {
    pub fn new(op: &'a str, span: Option<Span>) -> Self {
        Site { op, span }
    }

    pub fn internal(&self, message: impl Into<String>) -> RuntimeError {
        RuntimeError::internal(self.op, message, self.span)
    }

    fn wrong_kind(&self, expected: &str, found: &Value) -> RuntimeError {
        self.internal(format!("expected {}, found {}", expected, found.type_name()))
    }
}

pub fn pop(stack: &mut Stack, site: Site) -> Result<Value, RuntimeError> {
    stack
        .pop()
        .ok_or_else(|| site.internal("stack underflow"))
}

/// Pop two values, returning them in push order (top last)
pub fn pop_two(stack: &mut Stack, site: Site) -> Result<(Value, Value), RuntimeError> {
    let b = pop(stack, site)?;
    let a = pop(stack, site)?;
    Ok((a, b))
}

pub fn pop_int(stack: &mut Stack, site: Site) -> Result<i64, RuntimeError> {
    match pop(stack, site)? {
        Value::Int(n) => Ok(n),
        other => Err(site.wrong_kind("Int", &other)),
    }
}

pub fn pop_bool(stack: &mut Stack, site: Site) -> Result<bool, RuntimeError> {
    match pop(stack, site)? {
        Value::Bool(b) => Ok(b),
        other => Err(site.wrong_kind("Bool", &other)),
    }
}

pub fn pop_list(stack: &mut Stack, site: Site) -> Result<Vec<Value>, RuntimeError> {
    match pop(stack, site)? {
        Value::List(items) => Ok(items),
        other => Err(site.wrong_kind("List", &other)),
    }
}

pub fn pop_closure(stack: &mut Stack, site: Site) -> Result<Rc<Closure>, RuntimeError> {
    match pop(stack, site)? {
        Value::Closure(closure) => Ok(closure),
        other => Err(site.wrong_kind("Closure", &other)),
    }
}

fn peek_at<'s>(stack: &'s Stack, depth: usize, site: Site) -> Result<&'s Value, RuntimeError> {
    stack
        .len()
        .checked_sub(depth + 1)
        .and_then(|index| stack.get(index))
        .ok_or_else(|| site.internal("stack underflow"))
}

/// Duplicate the top value
///
/// Stack effect: ( a -- a a )
pub fn dup(stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    let top = peek_at(stack, 0, site)?.clone();
    stack.push(top);
    Ok(())
}

/// Stack effect: ( a -- )
pub fn drop_top(stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    pop(stack, site).map(|_| ())
}

/// Stack effect: ( a b -- b a )
pub fn swap(stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    let (a, b) = pop_two(stack, site)?;
    stack.push(b);
    stack.push(a);
    Ok(())
}

/// Copy the second value to the top
///
/// Stack effect: ( a b -- a b a )
pub fn over(stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    let second = peek_at(stack, 1, site)?.clone();
    stack.push(second);
    Ok(())
}

/// Move the third value to the top
///
/// Stack effect: ( a b c -- b c a )
pub fn rot(stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    let (b, c) = pop_two(stack, site)?;
    let a = pop(stack, site)?;
    stack.push(b);
    stack.push(c);
    stack.push(a);
    Ok(())
}

/// Select one of two values by a condition
///
/// Stack effect: ( cond a b -- a|b )
pub fn choice(stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    let (a, b) = pop_two(stack, site)?;
    let cond = pop_bool(stack, site)?;
    stack.push(if cond { a } else { b });
    Ok(())
}
