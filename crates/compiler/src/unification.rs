//! Type unification for Cairn
//!
//! Hindley-Milner style unification with support for:
//! - Type variables (T, U, V)
//! - Row variables (..a, ..rest)
//! - Concrete types (Int, Bool, List, quotations)
//!
//! All state lives in one [`Subst`] that the type checker threads through a
//! single checking pass. Nothing here is global, so independent passes never
//! see each other's variables.

use crate::error::UnifyError;
use crate::types::{Effect, RowVar, StackType, Type, TypeVar};
use std::collections::HashMap;

/// What a variable id has been resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Type(Type),
    Row(StackType),
}

/// Substitution for type and row variables
///
/// Both kinds of variable share one id arena, so an id is never a type
/// variable and a row variable at the same time. Bindings may point at other
/// variables; [`Subst::resolve_type`] and [`Subst::resolve_stack`] follow
/// those chains. The map stays acyclic because every bind runs an occurs
/// check first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subst {
    next_id: usize,
    bindings: HashMap<usize, Binding>,
}

impl Subst {
    /// Create an empty substitution
    pub fn empty() -> Self {
        Subst::default()
    }

    /// Number of variables bound so far
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Allocate a fresh, unbound type variable
    pub fn fresh_var(&mut self) -> TypeVar {
        let id = self.next_id;
        self.next_id += 1;
        TypeVar(id)
    }

    /// Allocate a fresh, unbound row variable
    pub fn fresh_row(&mut self) -> RowVar {
        let id = self.next_id;
        self.next_id += 1;
        RowVar(id)
    }

    pub fn fresh_type(&mut self) -> Type {
        Type::Var(self.fresh_var())
    }

    /// Look up a type variable's binding, if any
    pub fn type_binding(&self, var: TypeVar) -> Option<&Type> {
        match self.bindings.get(&var.0) {
            Some(Binding::Type(ty)) => Some(ty),
            _ => None,
        }
    }

    /// Look up a row variable's binding, if any
    pub fn row_binding(&self, row: RowVar) -> Option<&StackType> {
        match self.bindings.get(&row.0) {
            Some(Binding::Row(stack)) => Some(stack),
            _ => None,
        }
    }

    /// Follow variable links until reaching a non-variable or an unbound variable
    ///
    /// Shallow: nested types are left as they are.
    pub fn resolve_type(&self, ty: &Type) -> Type {
        let mut current = ty;
        while let Type::Var(var) = current {
            match self.type_binding(*var) {
                Some(bound) => current = bound,
                None => break,
            }
        }
        current.clone()
    }

    /// Follow row links at the bottom of a stack until reaching a cons cell,
    /// `Empty`, or an unbound row
    pub fn resolve_stack(&self, stack: &StackType) -> StackType {
        let mut current = stack;
        while let StackType::RowVar(row) = current {
            match self.row_binding(*row) {
                Some(bound) => current = bound,
                None => break,
            }
        }
        current.clone()
    }

    /// Apply substitutions to a Type, all the way down
    pub fn apply_type(&self, ty: &Type) -> Type {
        match self.resolve_type(ty) {
            Type::List(element) => Type::list(self.apply_type(&element)),
            Type::Quotation(effect) => Type::quotation(self.apply_effect(&effect)),
            resolved => resolved,
        }
    }

    /// Apply substitutions to a StackType, all the way down
    pub fn apply_stack(&self, stack: &StackType) -> StackType {
        match self.resolve_stack(stack) {
            StackType::Cons { rest, top } => StackType::Cons {
                rest: Box::new(self.apply_stack(&rest)),
                top: self.apply_type(&top),
            },
            resolved => resolved,
        }
    }

    /// Apply substitutions to both sides of an effect
    pub fn apply_effect(&self, effect: &Effect) -> Effect {
        Effect::new(
            self.apply_stack(&effect.inputs),
            self.apply_stack(&effect.outputs),
        )
    }

    /// Bind a type variable, failing if that would create an infinite type
    pub fn bind_type(&mut self, var: TypeVar, ty: &Type) -> Result<(), UnifyError> {
        let ty = self.apply_type(ty);
        if ty == Type::Var(var) {
            return Ok(());
        }
        if occurs_in_type(var.0, &ty) {
            return Err(UnifyError::Occurs {
                var: Type::Var(var).to_string(),
                ty: ty.to_string(),
            });
        }
        self.bindings.insert(var.0, Binding::Type(ty));
        Ok(())
    }

    /// Bind a row variable, failing if the stack would have to contain itself
    pub fn bind_row(&mut self, row: RowVar, stack: &StackType) -> Result<(), UnifyError> {
        let stack = self.apply_stack(stack);
        if stack == StackType::RowVar(row) {
            return Ok(());
        }
        if occurs_in_stack(row.0, &stack) {
            return Err(UnifyError::Occurs {
                var: row.to_string(),
                ty: stack.to_string(),
            });
        }
        self.bindings.insert(row.0, Binding::Row(stack));
        Ok(())
    }

    /// Pop one entry off a stack, pinning an open row if necessary
    ///
    /// An unbound row `..r` becomes `..r' T` for fresh `..r'` and `T`, which is
    /// how an operation pulls an extra input through a row it does not own.
    /// Returns `None` for a closed, empty stack.
    pub fn pop_stack(&mut self, stack: &StackType) -> Option<(StackType, Type)> {
        match self.resolve_stack(stack) {
            StackType::Cons { rest, top } => Some((*rest, top)),
            StackType::Empty => None,
            StackType::RowVar(row) => {
                let rest = StackType::RowVar(self.fresh_row());
                let top = self.fresh_type();
                let pinned = rest.clone().push(top.clone());
                self.bindings.insert(row.0, Binding::Row(pinned));
                Some((rest, top))
            }
        }
    }
}

/// Check if a variable occurs in a type (for occurs check)
///
/// Prevents infinite types like: T = List(T)
fn occurs_in_type(id: usize, ty: &Type) -> bool {
    match ty {
        Type::Var(var) => var.0 == id,
        Type::Int | Type::Bool => false,
        Type::List(element) => occurs_in_type(id, element),
        Type::Quotation(effect) => {
            occurs_in_stack(id, &effect.inputs) || occurs_in_stack(id, &effect.outputs)
        }
    }
}

/// Check if a variable occurs in a stack type (for occurs check)
///
/// Row variables can sit inside the element types too (a quotation on the
/// stack has its own rows), so both positions are searched.
fn occurs_in_stack(id: usize, stack: &StackType) -> bool {
    match stack {
        StackType::Empty => false,
        StackType::RowVar(row) => row.0 == id,
        StackType::Cons { rest, top } => occurs_in_type(id, top) || occurs_in_stack(id, rest),
    }
}

/// Unify two types, recording bindings in `subst`
pub fn unify_types(subst: &mut Subst, t1: &Type, t2: &Type) -> Result<(), UnifyError> {
    let t1 = subst.resolve_type(t1);
    let t2 = subst.resolve_type(t2);

    match (&t1, &t2) {
        (Type::Int, Type::Int) | (Type::Bool, Type::Bool) => Ok(()),

        // Type variable unifies with anything (with occurs check)
        (Type::Var(var), other) | (other, Type::Var(var)) => subst.bind_type(*var, other),

        (Type::List(e1), Type::List(e2)) => unify_types(subst, e1, e2).map_err(|err| match err {
            // Report the whole list types, not just the element clash
            UnifyError::Mismatch { .. } => UnifyError::Mismatch {
                left: subst.apply_type(&t1),
                right: subst.apply_type(&t2),
            },
            other => other,
        }),

        (Type::Quotation(e1), Type::Quotation(e2)) => {
            unify_effects(subst, e1, e2).map_err(|err| match err {
                UnifyError::Mismatch { .. } | UnifyError::Shape { .. } => UnifyError::Mismatch {
                    left: subst.apply_type(&t1),
                    right: subst.apply_type(&t2),
                },
                other => other,
            })
        }

        // Different concrete types don't unify
        _ => Err(UnifyError::Mismatch {
            left: subst.apply_type(&t1),
            right: subst.apply_type(&t2),
        }),
    }
}

/// Unify two stack types top-down, recording bindings in `subst`
pub fn unify_stacks(subst: &mut Subst, s1: &StackType, s2: &StackType) -> Result<(), UnifyError> {
    let s1 = subst.resolve_stack(s1);
    let s2 = subst.resolve_stack(s2);

    match (&s1, &s2) {
        // Empty stacks unify
        (StackType::Empty, StackType::Empty) => Ok(()),

        // Row variable unifies with any stack (with occurs check)
        (StackType::RowVar(row), stack) | (stack, StackType::RowVar(row)) => {
            subst.bind_row(*row, stack)
        }

        // Cons cells unify if tops and rests unify
        (
            StackType::Cons {
                rest: rest1,
                top: top1,
            },
            StackType::Cons {
                rest: rest2,
                top: top2,
            },
        ) => {
            unify_types(subst, top1, top2)?;
            unify_stacks(subst, rest1, rest2)
        }

        // Empty doesn't unify with Cons
        _ => Err(UnifyError::Shape {
            left: subst.apply_stack(&s1),
            right: subst.apply_stack(&s2),
        }),
    }
}

/// Unify two effects side by side
pub fn unify_effects(subst: &mut Subst, e1: &Effect, e2: &Effect) -> Result<(), UnifyError> {
    unify_stacks(subst, &e1.inputs, &e2.inputs)?;
    unify_stacks(subst, &e1.outputs, &e2.outputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(subst: &mut Subst) -> Type {
        subst.fresh_type()
    }

    fn row(subst: &mut Subst) -> StackType {
        StackType::RowVar(subst.fresh_row())
    }

    #[test]
    fn test_unify_concrete_types() {
        let mut subst = Subst::empty();
        assert!(unify_types(&mut subst, &Type::Int, &Type::Int).is_ok());
        assert!(unify_types(&mut subst, &Type::Bool, &Type::Bool).is_ok());
        assert!(unify_types(&mut subst, &Type::Int, &Type::Bool).is_err());
        assert!(subst.is_empty());
    }

    #[test]
    fn test_fresh_ids_are_shared_between_kinds() {
        let mut subst = Subst::empty();
        let t = subst.fresh_var();
        let r = subst.fresh_row();
        assert_ne!(t.0, r.0);
    }

    #[test]
    fn test_unify_type_variable() {
        let mut subst = Subst::empty();
        let t = var(&mut subst);
        unify_types(&mut subst, &t, &Type::Int).unwrap();
        assert_eq!(subst.apply_type(&t), Type::Int);

        let u = var(&mut subst);
        unify_types(&mut subst, &Type::Bool, &u).unwrap();
        assert_eq!(subst.apply_type(&u), Type::Bool);
    }

    #[test]
    fn test_resolve_follows_chain() {
        // T := U, U := Int
        let mut subst = Subst::empty();
        let t = var(&mut subst);
        let u = var(&mut subst);
        unify_types(&mut subst, &t, &u).unwrap();
        unify_types(&mut subst, &u, &Type::Int).unwrap();
        assert_eq!(subst.resolve_type(&t), Type::Int);
    }

    #[test]
    fn test_unify_list_element() {
        let mut subst = Subst::empty();
        let t = var(&mut subst);
        unify_types(&mut subst, &Type::list(t.clone()), &Type::list(Type::Bool)).unwrap();
        assert_eq!(subst.apply_type(&t), Type::Bool);

        let err = unify_types(&mut subst, &Type::list(Type::Int), &Type::list(Type::Bool))
            .unwrap_err();
        assert_eq!(
            err,
            UnifyError::Mismatch {
                left: Type::list(Type::Int),
                right: Type::list(Type::Bool)
            }
        );
    }

    #[test]
    fn test_unify_row_poly_stack() {
        // ( ..a Int ) unifies with ( Bool Int ), producing ..a := ( Bool )
        let mut subst = Subst::empty();
        let a = subst.fresh_row();
        let s1 = StackType::RowVar(a).push(Type::Int);
        let s2 = StackType::Empty.push(Type::Bool).push(Type::Int);

        unify_stacks(&mut subst, &s1, &s2).unwrap();
        assert_eq!(subst.row_binding(a), Some(&StackType::singleton(Type::Bool)));
    }

    #[test]
    fn test_unify_polymorphic_dup() {
        // dup: ( ..a T -- ..a T T ) applied to ( Int )
        let mut subst = Subst::empty();
        let a = row(&mut subst);
        let t = var(&mut subst);

        let declared = a.clone().push(t.clone());
        let actual = StackType::singleton(Type::Int);
        unify_stacks(&mut subst, &declared, &actual).unwrap();

        let output = subst.apply_stack(&a.push(t.clone()).push(t));
        assert_eq!(output, StackType::Empty.push(Type::Int).push(Type::Int));
    }

    #[test]
    fn test_closed_stack_too_short_is_shape_error() {
        let mut subst = Subst::empty();
        let a = row(&mut subst);
        let declared = a.push(Type::Int).push(Type::Int);
        let actual = StackType::singleton(Type::Int);
        let err = unify_stacks(&mut subst, &declared, &actual).unwrap_err();
        assert!(matches!(err, UnifyError::Shape { .. }));
    }

    #[test]
    fn test_occurs_check_var_with_itself() {
        let mut subst = Subst::empty();
        let t = var(&mut subst);
        assert!(unify_types(&mut subst, &t, &t.clone()).is_ok());
        assert!(subst.is_empty());
    }

    #[test]
    fn test_occurs_check_prevents_infinite_list() {
        let mut subst = Subst::empty();
        let t = var(&mut subst);
        let err = unify_types(&mut subst, &t, &Type::list(t.clone())).unwrap_err();
        assert!(matches!(err, UnifyError::Occurs { .. }));
        assert!(err.to_string().contains("infinite"));
    }

    #[test]
    fn test_occurs_check_prevents_infinite_stack() {
        // ..a with (..a Int) would give ..a = ((..a Int) Int) = ...
        let mut subst = Subst::empty();
        let a = row(&mut subst);
        let err = unify_stacks(&mut subst, &a, &a.clone().push(Type::Int)).unwrap_err();
        assert!(matches!(err, UnifyError::Occurs { .. }));
    }

    #[test]
    fn test_occurs_check_sees_rows_inside_quotations() {
        // T := ( ..a -- ..a T ) must fail
        let mut subst = Subst::empty();
        let t = var(&mut subst);
        let a = row(&mut subst);
        let quot = Type::quotation(Effect::new(a.clone(), a.push(t.clone())));
        assert!(unify_types(&mut subst, &t, &quot).is_err());
    }

    #[test]
    fn test_row_vars_unify_with_each_other() {
        let mut subst = Subst::empty();
        let a = subst.fresh_row();
        let b = subst.fresh_row();
        unify_stacks(&mut subst, &StackType::RowVar(a), &StackType::RowVar(b)).unwrap();
        assert_eq!(subst.row_binding(a), Some(&StackType::RowVar(b)));
    }

    #[test]
    fn test_unify_quotations() {
        // ( ..a T -- ..a T ) against ( ..b Int -- ..b Int )
        let mut subst = Subst::empty();
        let a = row(&mut subst);
        let b = row(&mut subst);
        let t = var(&mut subst);
        let q1 = Type::quotation(Effect::new(a.clone().push(t.clone()), a.push(t.clone())));
        let q2 = Type::quotation(Effect::new(
            b.clone().push(Type::Int),
            b.push(Type::Int),
        ));
        unify_types(&mut subst, &q1, &q2).unwrap();
        assert_eq!(subst.apply_type(&t), Type::Int);
    }

    #[test]
    fn test_quotation_arity_mismatch_is_rejected() {
        // ( ..a T U -- ..a U ) cannot stand in for ( ..b V -- ..b W )
        let mut subst = Subst::empty();
        let a = row(&mut subst);
        let b = row(&mut subst);
        let (t, u, v, w) = (var(&mut subst), var(&mut subst), var(&mut subst), var(&mut subst));
        let two_in = Type::quotation(Effect::new(
            a.clone().push(t).push(u.clone()),
            a.push(u),
        ));
        let one_in = Type::quotation(Effect::new(b.clone().push(v), b.push(w)));
        assert!(unify_types(&mut subst, &two_in, &one_in).is_err());
    }

    #[test]
    fn test_pop_stack_pins_open_row() {
        let mut subst = Subst::empty();
        let a = subst.fresh_row();
        let (rest, top) = subst.pop_stack(&StackType::RowVar(a)).unwrap();
        assert_eq!(
            subst.apply_stack(&StackType::RowVar(a)),
            rest.clone().push(top)
        );
        assert!(subst.pop_stack(&StackType::Empty).is_none());
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut subst = Subst::empty();
        let a = row(&mut subst);
        let t = var(&mut subst);
        let u = var(&mut subst);
        unify_types(&mut subst, &t, &Type::list(u.clone())).unwrap();
        unify_types(&mut subst, &u, &Type::Bool).unwrap();
        let stack = a.push(t);

        let once = subst.apply_stack(&stack);
        let twice = subst.apply_stack(&once);
        assert_eq!(once, twice);
        assert_eq!(once.types(), vec![Type::list(Type::Bool)]);
    }
}
