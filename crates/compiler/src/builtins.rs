//! Built-in operator signatures for Cairn
//!
//! Defines the stack effect schema of every built-in operator.
//!
//! Schemas are written with the `effect!` macro in a Forth-like notation,
//! `(a Type1 Type2 -- a Type3)`, where:
//! - `a`, `b` are row variables (the part of the stack left alone)
//! - Concrete types: `Int`, `Bool`, `(List T)`
//! - Type variables: `T`, `U`, `V`
//! - A parenthesised effect like `(b T -- b U)` is a quotation type
//!
//! The variables in a schema are placeholders. The type checker replaces
//! them with fresh ones at every use.

use crate::ast::Builtin;
use crate::types::{Effect, RowVar, StackType, Type, TypeVar};

/// Convert a type token to a Type expression
macro_rules! ty {
    (Int) => {
        Type::Int
    };
    (Bool) => {
        Type::Bool
    };
    (T) => {
        Type::Var(TypeVar(0))
    };
    (U) => {
        Type::Var(TypeVar(1))
    };
    (V) => {
        Type::Var(TypeVar(2))
    };
    ((List $elem:tt)) => {
        Type::list(ty!($elem))
    };
    // Anything else in parentheses is a quotation's effect
    (($($effect:tt)*)) => {
        Type::quotation(effect!($($effect)*))
    };
}

macro_rules! row {
    (a) => {
        RowVar(0)
    };
    (b) => {
        RowVar(1)
    };
}

/// Build a stack type from a row variable plus pushed types (bottom to top)
macro_rules! stack {
    ($row:ident $($ty:tt)*) => {
        StackType::RowVar(row!($row))$(.push(ty!($ty)))*
    };
}

/// Build an effect from `inputs -- outputs`
///
/// Tokens are shifted onto the input side until the top-level `--`.
macro_rules! effect {
    (@inputs [$($inputs:tt)*] -- $($outputs:tt)*) => {
        Effect::new(stack!($($inputs)*), stack!($($outputs)*))
    };
    (@inputs [$($inputs:tt)*] $next:tt $($rest:tt)*) => {
        effect!(@inputs [$($inputs)* $next] $($rest)*)
    };
    ($($tokens:tt)*) => {
        effect!(@inputs [] $($tokens)*)
    };
}

/// Get the stack effect schema for a built-in operator
pub fn builtin_signature(builtin: Builtin) -> Effect {
    match builtin {
        Builtin::Add
        | Builtin::Subtract
        | Builtin::Multiply
        | Builtin::Divide
        | Builtin::Modulo => effect!(a Int Int -- a Int),
        Builtin::Less | Builtin::Greater | Builtin::LessEq | Builtin::GreaterEq => {
            effect!(a Int Int -- a Bool)
        }
        Builtin::Equal => effect!(a T T -- a Bool),
        Builtin::Not => effect!(a Bool -- a Bool),
        Builtin::And | Builtin::Or => effect!(a Bool Bool -- a Bool),

        Builtin::Dup => effect!(a T -- a T T),
        Builtin::Swap => effect!(a T U -- a U T),
        Builtin::Over => effect!(a T U -- a T U T),
        Builtin::Rot => effect!(a T U V -- a U V T),
        Builtin::Drop | Builtin::Print => effect!(a T -- a),
        Builtin::Choice => effect!(a Bool T T -- a T),

        Builtin::Len => effect!(a (List T) -- a Int),
        Builtin::Head => effect!(a (List T) -- a T),
        Builtin::Tail => effect!(a (List T) -- a (List T)),
        Builtin::Push => effect!(a (List T) T -- a (List T)),
        Builtin::Concat => effect!(a (List T) (List T) -- a (List T)),

        // The quotation's row `b` is its own; it never sees the caller's stack
        Builtin::Map => effect!(a (List T) (b T -- b U) -- a (List U)),
        Builtin::Filter => effect!(a (List T) (b T -- b Bool) -- a (List T)),
        Builtin::Fold => effect!(a (List T) (b U T -- b U) U -- a U),
        Builtin::Foreach => effect!(a (List T) (b T -- b) -- a),
        Builtin::Do => effect!(a (a -- b) -- b),
    }
}

/// One-line description used by the REPL's `:help`
pub fn builtin_doc(builtin: Builtin) -> &'static str {
    match builtin {
        Builtin::Add => "add two integers",
        Builtin::Subtract => "subtract the top integer from the one below",
        Builtin::Multiply => "multiply two integers",
        Builtin::Divide => "integer division, truncating toward zero",
        Builtin::Modulo => "remainder of truncating division",
        Builtin::Less => "less than",
        Builtin::Greater => "greater than",
        Builtin::LessEq => "less than or equal",
        Builtin::GreaterEq => "greater than or equal",
        Builtin::Equal => "structural equality",
        Builtin::Not => "boolean negation",
        Builtin::And => "boolean and",
        Builtin::Or => "boolean or",
        Builtin::Dup => "duplicate the top value",
        Builtin::Swap => "exchange the top two values",
        Builtin::Over => "copy the second value to the top",
        Builtin::Rot => "move the third value to the top",
        Builtin::Drop => "discard the top value",
        Builtin::Print => "pop and print the top value",
        Builtin::Choice => "c a b choice: a if c is true, else b",
        Builtin::Len => "length of a list",
        Builtin::Head => "first element of a non-empty list",
        Builtin::Tail => "all but the first element of a non-empty list",
        Builtin::Push => "append a value to a list",
        Builtin::Concat => "join two lists",
        Builtin::Map => "apply a quotation to every element",
        Builtin::Filter => "keep elements for which the quotation yields true",
        Builtin::Fold => "list quot init fold: thread an accumulator left to right",
        Builtin::Foreach => "run a quotation on every element for its effects",
        Builtin::Do => "run a quotation on the current stack",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_signature_add() {
        let sig = builtin_signature(Builtin::Add);
        // ( ..a Int Int -- ..a Int )
        let (rest, top) = sig.inputs.clone().pop().unwrap();
        assert_eq!(top, Type::Int);
        let (rest2, top2) = rest.pop().unwrap();
        assert_eq!(top2, Type::Int);
        assert_eq!(rest2, StackType::RowVar(RowVar(0)));

        let (rest3, top3) = sig.outputs.clone().pop().unwrap();
        assert_eq!(top3, Type::Int);
        assert_eq!(rest3, StackType::RowVar(RowVar(0)));
    }

    #[test]
    fn test_builtin_signature_dup() {
        let sig = builtin_signature(Builtin::Dup);
        assert_eq!(
            sig.inputs,
            StackType::Cons {
                rest: Box::new(StackType::RowVar(RowVar(0))),
                top: Type::Var(TypeVar(0))
            }
        );
        assert_eq!(sig.to_string(), "( ..a A -- ..a A A )");
    }

    #[test]
    fn test_rows_are_shared_between_sides() {
        for builtin in Builtin::ALL {
            if builtin == Builtin::Do {
                continue;
            }
            let sig = builtin_signature(builtin);
            assert_eq!(sig.inputs.row(), sig.outputs.row(), "{}", builtin);
        }
    }

    #[test]
    fn test_map_quotation_has_its_own_row() {
        let sig = builtin_signature(Builtin::Map);
        assert_eq!(
            sig.to_string(),
            "( ..a List(A) ( ..b A -- ..b B ) -- ..a List(B) )"
        );
    }

    #[test]
    fn test_fold_signature() {
        let sig = builtin_signature(Builtin::Fold);
        assert_eq!(
            sig.to_string(),
            "( ..a List(A) ( ..b B A -- ..b B ) B -- ..a B )"
        );
    }

    #[test]
    fn test_do_signature() {
        let sig = builtin_signature(Builtin::Do);
        assert_eq!(sig.to_string(), "( ..a ( ..a -- ..b ) -- ..b )");
    }

    #[test]
    fn test_every_builtin_is_documented() {
        for builtin in Builtin::ALL {
            assert!(!builtin_doc(builtin).is_empty(), "{}", builtin);
        }
    }
}
