//! Type system for Cairn
//!
//! Row polymorphism over stack types. Stack effects read like
//! `( ..a Int Int -- ..a Int )`: `..a` is the part of the stack the
//! operation never touches.

use std::collections::HashMap;
use std::fmt;

/// A value-level type variable (`T`, `U`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeVar(pub usize);

/// A row variable standing for "the rest of the stack"
///
/// Row variables live in their own namespace: they unify with other row
/// variables or get pinned to a prefix of concrete stack entries, never with
/// a value [`Type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowVar(pub usize);

/// Base types in the language
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Integer type
    Int,
    /// Boolean type
    Bool,
    /// Homogeneous list
    List(Box<Type>),
    /// Quotation type (first-class code block with its own stack effect)
    /// Example: ( ..a Int -- ..a Int ) is a quotation from Int to Int
    Quotation(Box<Effect>),
    /// Type variable (for polymorphism)
    Var(TypeVar),
}

impl Type {
    pub fn list(element: Type) -> Self {
        Type::List(Box::new(element))
    }

    pub fn quotation(effect: Effect) -> Self {
        Type::Quotation(Box::new(effect))
    }
}

/// Stack types with row polymorphism
///
/// The stack is a cons list read from the top down:
///
/// ```text
/// Cons { rest: Cons { rest: RowVar(a), top: Int }, top: Bool }
/// │                                       │            │
/// │                                       │            └── top of stack: Bool
/// │                                       └── second from top: Int
/// └── rest of stack: ..a
///
/// Displayed as: (..a Int Bool)
/// ```
///
/// `Empty` is a closed stack with nothing below. It shows up when a program
/// is checked against a concrete starting stack (a file run starts empty).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum StackType {
    /// Empty stack - no values
    #[default]
    Empty,

    /// Stack with a value on top of rest (a "cons cell")
    Cons {
        /// The rest of the stack (may be Empty, another Cons, or RowVar)
        rest: Box<StackType>,
        /// The type on top of the stack at this position
        top: Type,
    },

    /// Row variable representing "rest of stack" for polymorphism
    RowVar(RowVar),
}

/// Stack effect: transformation from input stack to output stack
///
/// Example: ( ..a Int -- ..a Bool ) consumes an Int and produces a Bool,
/// leaving everything in `..a` untouched. Both sides normally end in the same
/// row variable; see [`Effect::row`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Effect {
    /// Input stack type (before the fragment executes)
    pub inputs: StackType,
    /// Output stack type (after the fragment executes)
    pub outputs: StackType,
}

impl StackType {
    /// Create an empty stack type
    pub fn empty() -> Self {
        StackType::Empty
    }

    /// Create a stack type with a single value
    pub fn singleton(ty: Type) -> Self {
        StackType::Cons {
            rest: Box::new(StackType::Empty),
            top: ty,
        }
    }

    /// Push a type onto a stack type
    pub fn push(self, ty: Type) -> Self {
        StackType::Cons {
            rest: Box::new(self),
            top: ty,
        }
    }

    /// Create a closed stack type from a vector of types (bottom to top)
    pub fn from_vec(types: Vec<Type>) -> Self {
        Self::with_prefix(StackType::Empty, types)
    }

    /// Push `types` (bottom to top) onto `base`
    pub fn with_prefix(base: StackType, types: Vec<Type>) -> Self {
        types.into_iter().fold(base, |stack, ty| stack.push(ty))
    }

    /// Pop a type from a stack type, returning (rest, top) if successful
    pub fn pop(self) -> Option<(StackType, Type)> {
        match self {
            StackType::Cons { rest, top } => Some((*rest, top)),
            _ => None,
        }
    }

    /// The row variable at the bottom, or `None` for a closed stack
    pub fn row(&self) -> Option<RowVar> {
        match self {
            StackType::Empty => None,
            StackType::RowVar(row) => Some(*row),
            StackType::Cons { rest, .. } => rest.row(),
        }
    }

    /// Concrete entries above the tail, bottom to top
    pub fn types(&self) -> Vec<Type> {
        let mut types = Vec::new();
        let mut current = self;
        while let StackType::Cons { rest, top } = current {
            types.push(top.clone());
            current = rest;
        }
        types.reverse();
        types
    }

    /// Number of concrete entries above the tail
    pub fn depth(&self) -> usize {
        match self {
            StackType::Cons { rest, .. } => 1 + rest.depth(),
            _ => 0,
        }
    }
}

impl Effect {
    /// Create a new stack effect
    pub fn new(inputs: StackType, outputs: StackType) -> Self {
        Effect { inputs, outputs }
    }

    /// ( ..row -- ..row )
    pub fn identity(row: RowVar) -> Self {
        Effect::new(StackType::RowVar(row), StackType::RowVar(row))
    }

    /// The row variable shared by the input side
    pub fn row(&self) -> Option<RowVar> {
        self.inputs.row()
    }

    /// Declared inputs above the row, bottom to top
    pub fn input_types(&self) -> Vec<Type> {
        self.inputs.types()
    }

    /// Declared outputs above the row, bottom to top
    pub fn output_types(&self) -> Vec<Type> {
        self.outputs.types()
    }

    /// Rename variables in order of first appearance
    ///
    /// Two effects that are equal up to a uniform renaming of their variables
    /// normalize to the same value.
    pub fn normalized(&self) -> Effect {
        let mut renamer = Renamer::default();
        let inputs = renamer.stack(&self.inputs);
        let outputs = renamer.stack(&self.outputs);
        Effect::new(inputs, outputs)
    }
}

#[derive(Default)]
struct Renamer {
    types: HashMap<TypeVar, TypeVar>,
    rows: HashMap<RowVar, RowVar>,
}

impl Renamer {
    fn stack(&mut self, stack: &StackType) -> StackType {
        match stack {
            StackType::Empty => StackType::Empty,
            StackType::RowVar(row) => {
                let next = RowVar(self.rows.len());
                StackType::RowVar(*self.rows.entry(*row).or_insert(next))
            }
            StackType::Cons { rest, top } => {
                let rest = self.stack(rest);
                let top = self.ty(top);
                rest.push(top)
            }
        }
    }

    fn ty(&mut self, ty: &Type) -> Type {
        match ty {
            Type::Int | Type::Bool => ty.clone(),
            Type::List(element) => Type::list(self.ty(element)),
            Type::Quotation(effect) => {
                let inputs = self.stack(&effect.inputs);
                let outputs = self.stack(&effect.outputs);
                Type::quotation(Effect::new(inputs, outputs))
            }
            Type::Var(var) => {
                let next = TypeVar(self.types.len());
                Type::Var(*self.types.entry(*var).or_insert(next))
            }
        }
    }
}

/// Spell a variable index as a letter, adding a numeric suffix past `z`
fn letter_name(index: usize, alphabet_start: u8) -> String {
    let letter = (alphabet_start + (index % 26) as u8) as char;
    match index / 26 {
        0 => letter.to_string(),
        round => format!("{}{}", letter, round),
    }
}

impl fmt::Display for TypeVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", letter_name(self.0, b'A'))
    }
}

impl fmt::Display for RowVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "..{}", letter_name(self.0, b'a'))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "Int"),
            Type::Bool => write!(f, "Bool"),
            Type::List(element) => write!(f, "List({})", element),
            Type::Quotation(effect) => write!(f, "{}", effect),
            Type::Var(var) => write!(f, "{}", var),
        }
    }
}

impl StackType {
    fn write_entries(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries = Vec::new();
        if let Some(row) = self.row() {
            entries.push(row.to_string());
        }
        entries.extend(self.types().iter().map(|ty| ty.to_string()));
        write!(f, "{}", entries.join(" "))
    }
}

impl fmt::Display for StackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        self.write_entries(f)?;
        write!(f, ")")
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "( ")?;
        self.inputs.write_entries(f)?;
        if self.inputs != StackType::Empty {
            write!(f, " ")?;
        }
        write!(f, "-- ")?;
        self.outputs.write_entries(f)?;
        if self.outputs != StackType::Empty {
            write!(f, " ")?;
        }
        write!(f, ")")
    }
}
