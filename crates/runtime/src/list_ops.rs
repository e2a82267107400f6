//! List operators
//!
//! Lists are values: every operator consumes its list and pushes a new one.
//! Higher-order list operators live in `quotations`.

use crate::error::RuntimeError;
use crate::stack::{Site, Stack, pop, pop_list};
use crate::value::Value;

fn empty_list(site: Site) -> RuntimeError {
    RuntimeError::EmptyListAccess {
        op: site.op.to_string(),
        span: site.span,
    }
}

/// Stack effect: ( list -- Int )
pub fn len(stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    let items = pop_list(stack, site)?;
    stack.push(Value::Int(items.len() as i64));
    Ok(())
}

/// First element of a non-empty list
///
/// Stack effect: ( list -- elem )
pub fn head(stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    let items = pop_list(stack, site)?;
    let first = items.into_iter().next().ok_or_else(|| empty_list(site))?;
    stack.push(first);
    Ok(())
}

/// Stack effect: ( list -- list )
pub fn tail(stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    let mut items = pop_list(stack, site)?;
    if items.is_empty() {
        return Err(empty_list(site));
    }
    items.remove(0);
    stack.push(Value::List(items));
    Ok(())
}

/// Append a value to the end of a list
///
/// Stack effect: ( list elem -- list )
pub fn push(stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    let elem = pop(stack, site)?;
    let mut items = pop_list(stack, site)?;
    items.push(elem);
    stack.push(Value::List(items));
    Ok(())
}

/// Stack effect: ( list1 list2 -- list1++list2 )
pub fn concat(stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    let back = pop_list(stack, site)?;
    let mut front = pop_list(stack, site)?;
    front.extend(back);
    stack.push(Value::List(front));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(values: &[i64]) -> Value {
        Value::from(values.to_vec())
    }

    #[test]
    fn test_len_head_tail() {
        let site = Site::new("op", None);
        let mut stack = vec![list(&[4, 5, 6])];
        len(&mut stack, site).unwrap();
        assert_eq!(stack, vec![Value::Int(3)]);

        let mut stack = vec![list(&[4, 5, 6])];
        head(&mut stack, site).unwrap();
        assert_eq!(stack, vec![Value::Int(4)]);

        let mut stack = vec![list(&[4, 5, 6])];
        tail(&mut stack, site).unwrap();
        assert_eq!(stack, vec![list(&[5, 6])]);
    }

    #[test]
    fn test_empty_list_access() {
        for op in [head, tail] {
            let mut stack = vec![list(&[])];
            let err = op(&mut stack, Site::new("head", None)).unwrap_err();
            assert_eq!(err.to_string(), "head: empty list");
        }
    }

    #[test]
    fn test_push_and_concat() {
        let site = Site::new("op", None);
        let mut stack = vec![list(&[1, 2]), Value::Int(3)];
        push(&mut stack, site).unwrap();
        assert_eq!(stack, vec![list(&[1, 2, 3])]);

        stack.push(list(&[4]));
        concat(&mut stack, site).unwrap();
        assert_eq!(stack, vec![list(&[1, 2, 3, 4])]);
    }
}
