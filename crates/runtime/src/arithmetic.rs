//! Arithmetic, comparison and boolean operators
//!
//! # Overflow Behavior
//!
//! Integer arithmetic wraps:
//! - `+`: i64::MAX + 1 wraps to i64::MIN
//! - `*`: overflow wraps around
//! - `/`: i64::MIN / -1 wraps to i64::MIN
//!
//! Division and remainder truncate toward zero. A zero divisor is the one
//! arithmetic failure and aborts evaluation with `DivisionByZero`.

use crate::error::RuntimeError;
use crate::stack::{Site, Stack, pop_bool, pop_int, pop_two};
use crate::value::Value;

fn binary_int(
    stack: &mut Stack,
    site: Site,
    f: impl FnOnce(i64, i64) -> Result<Value, RuntimeError>,
) -> Result<(), RuntimeError> {
    let b = pop_int(stack, site)?;
    let a = pop_int(stack, site)?;
    stack.push(f(a, b)?);
    Ok(())
}

fn nonzero(site: Site, dividend: i64, divisor: i64) -> Result<(), RuntimeError> {
    if divisor == 0 {
        return Err(RuntimeError::DivisionByZero {
            op: site.op.to_string(),
            dividend,
            span: site.span,
        });
    }
    Ok(())
}

/// Stack effect: ( a b -- a+b )
pub fn add(stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    binary_int(stack, site, |a, b| Ok(Value::Int(a.wrapping_add(b))))
}

/// Stack effect: ( a b -- a-b )
pub fn subtract(stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    binary_int(stack, site, |a, b| Ok(Value::Int(a.wrapping_sub(b))))
}

/// Stack effect: ( a b -- a*b )
pub fn multiply(stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    binary_int(stack, site, |a, b| Ok(Value::Int(a.wrapping_mul(b))))
}

/// Stack effect: ( a b -- a/b )
pub fn divide(stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    binary_int(stack, site, |a, b| {
        nonzero(site, a, b)?;
        Ok(Value::Int(a.wrapping_div(b)))
    })
}

/// Remainder with the sign of the dividend
///
/// Stack effect: ( a b -- a%b )
pub fn modulo(stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    binary_int(stack, site, |a, b| {
        nonzero(site, a, b)?;
        Ok(Value::Int(a.wrapping_rem(b)))
    })
}

/// Stack effect: ( a b -- a<b )
pub fn less(stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    binary_int(stack, site, |a, b| Ok(Value::Bool(a < b)))
}

/// Stack effect: ( a b -- a>b )
pub fn greater(stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    binary_int(stack, site, |a, b| Ok(Value::Bool(a > b)))
}

/// Stack effect: ( a b -- a<=b )
pub fn less_eq(stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    binary_int(stack, site, |a, b| Ok(Value::Bool(a <= b)))
}

/// Stack effect: ( a b -- a>=b )
pub fn greater_eq(stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    binary_int(stack, site, |a, b| Ok(Value::Bool(a >= b)))
}

/// Structural equality on any two values of the same type
///
/// Stack effect: ( a b -- a=b )
pub fn equal(stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    let (a, b) = pop_two(stack, site)?;
    stack.push(Value::Bool(a == b));
    Ok(())
}

/// Stack effect: ( a -- !a )
pub fn not(stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    let a = pop_bool(stack, site)?;
    stack.push(Value::Bool(!a));
    Ok(())
}

/// Both operands are already evaluated; there is no short-circuit
///
/// Stack effect: ( a b -- a&&b )
pub fn and(stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    let b = pop_bool(stack, site)?;
    let a = pop_bool(stack, site)?;
    stack.push(Value::Bool(a && b));
    Ok(())
}

/// Stack effect: ( a b -- a||b )
pub fn or(stack: &mut Stack, site: Site) -> Result<(), RuntimeError> {
    let b = pop_bool(stack, site)?;
    let a = pop_bool(stack, site)?;
    stack.push(Value::Bool(a || b));
    Ok(())
}
