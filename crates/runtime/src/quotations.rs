//! Higher-order operators
//!
//! `map`, `filter`, `fold` and `foreach` call the closure once per element,
//! each time on a fresh stack, under the scope the closure captured. `do`
//! calls it once on the caller's stack.

use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::stack::{Site, Stack, pop, pop_bool, pop_closure, pop_list};
use crate::value::{Closure, Value};

/// Run `closure` on a stack holding `args` and return what it leaves behind
fn call_fresh(
    interp: &mut Interpreter,
    closure: &Closure,
    args: Vec<Value>,
) -> Result<Stack, RuntimeError> {
    let mut stack = args;
    interp.call_closure(closure, &mut stack)?;
    Ok(stack)
}

/// Apply a quotation to each element, collecting results in order
///
/// Stack effect: ( list quot -- list' )
pub fn map(interp: &mut Interpreter, stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    let closure = pop_closure(stack, site)?;
    let items = pop_list(stack, site)?;

    let mut results = Vec::with_capacity(items.len());
    for item in items {
        let mut out = call_fresh(interp, &closure, vec![item])?;
        results.push(pop(&mut out, site)?);
    }
    stack.push(Value::List(results));
    Ok(())
}

/// Keep the elements for which the quotation leaves `true`
///
/// Stack effect: ( list quot -- list' )
pub fn filter(interp: &mut Interpreter, stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    let closure = pop_closure(stack, site)?;
    let items = pop_list(stack, site)?;

    let mut kept = Vec::new();
    for item in items {
        let mut out = call_fresh(interp, &closure, vec![item.clone()])?;
        if pop_bool(&mut out, site)? {
            kept.push(item);
        }
    }
    stack.push(Value::List(kept));
    Ok(())
}

/// Thread an accumulator through the list from the left
///
/// Each step runs the quotation on `acc elem`.
///
/// Stack effect: ( list quot init -- result )
pub fn fold(interp: &mut Interpreter, stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    let mut acc = pop(stack, site)?;
    let closure = pop_closure(stack, site)?;
    let items = pop_list(stack, site)?;

    for item in items {
        let mut out = call_fresh(interp, &closure, vec![acc, item])?;
        acc = pop(&mut out, site)?;
    }
    stack.push(acc);
    Ok(())
}

/// Run the quotation on each element for its side effects
///
/// Stack effect: ( list quot -- )
pub fn foreach(interp: &mut Interpreter, stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    let closure = pop_closure(stack, site)?;
    let items = pop_list(stack, site)?;

    for item in items {
        call_fresh(interp, &closure, vec![item])?;
    }
    Ok(())
}

/// Call a quotation on the current stack
///
/// Stack effect: ( ..a quot -- ..b )
pub fn call(interp: &mut Interpreter, stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    let closure = pop_closure(stack, site)?;
    interp.call_closure(&closure, stack)
}
