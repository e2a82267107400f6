//! Abstract Syntax Tree for Cairn
//!
//! A program is a flat sequence of nodes; quotations, let-blocks,
//! conditionals and word definitions own their bodies exclusively.

use std::fmt;

/// Source span for a single token or expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Line number (0-indexed)
    pub line: usize,
    /// Start column (0-indexed)
    pub column: usize,
    /// Length of the span in characters
    pub length: usize,
}

impl Span {
    pub fn new(line: usize, column: usize, length: usize) -> Self {
        Span {
            line,
            column,
            length,
        }
    }
}

/// Identity of a node within one program, assigned by the parser in source order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    Int(i64),
    Bool(bool),
}

/// Built-in operators
///
/// The operator set is fixed; anything that is not a builtin or keyword
/// parses as a [`NodeKind::Word`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    // Comparison
    Less,
    Greater,
    LessEq,
    GreaterEq,
    Equal,
    // Boolean
    Not,
    And,
    Or,
    // Stack shuffling
    Dup,
    Swap,
    Over,
    Rot,
    Drop,
    Print,
    Choice,
    // Lists
    Len,
    Head,
    Tail,
    Push,
    Concat,
    // Higher-order
    Map,
    Filter,
    Fold,
    Foreach,
    Do,
}

impl Builtin {
    pub const ALL: [Builtin; 30] = [
        Builtin::Add,
        Builtin::Subtract,
        Builtin::Multiply,
        Builtin::Divide,
        Builtin::Modulo,
        Builtin::Less,
        Builtin::Greater,
        Builtin::LessEq,
        Builtin::GreaterEq,
        Builtin::Equal,
        Builtin::Not,
        Builtin::And,
        Builtin::Or,
        Builtin::Dup,
        Builtin::Swap,
        Builtin::Over,
        Builtin::Rot,
        Builtin::Drop,
        Builtin::Print,
        Builtin::Choice,
        Builtin::Len,
        Builtin::Head,
        Builtin::Tail,
        Builtin::Push,
        Builtin::Concat,
        Builtin::Map,
        Builtin::Filter,
        Builtin::Fold,
        Builtin::Foreach,
        Builtin::Do,
    ];

    /// Surface spelling
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Add => "+",
            Builtin::Subtract => "-",
            Builtin::Multiply => "*",
            Builtin::Divide => "/",
            Builtin::Modulo => "%",
            Builtin::Less => "<",
            Builtin::Greater => ">",
            Builtin::LessEq => "<=",
            Builtin::GreaterEq => ">=",
            Builtin::Equal => "=",
            Builtin::Not => "not",
            Builtin::And => "and",
            Builtin::Or => "or",
            Builtin::Dup => "dup",
            Builtin::Swap => "swap",
            Builtin::Over => "over",
            Builtin::Rot => "rot",
            Builtin::Drop => "drop",
            Builtin::Print => "print",
            Builtin::Choice => "choice",
            Builtin::Len => "len",
            Builtin::Head => "head",
            Builtin::Tail => "tail",
            Builtin::Push => "push",
            Builtin::Concat => "concat",
            Builtin::Map => "map",
            Builtin::Filter => "filter",
            Builtin::Fold => "fold",
            Builtin::Foreach => "foreach",
            Builtin::Do => "do",
        }
    }

    /// Look up an operator by its spelling. `pop` is accepted as an alias for `drop`.
    pub fn from_name(name: &str) -> Option<Builtin> {
        if name == "pop" {
            return Some(Builtin::Drop);
        }
        Builtin::ALL.iter().copied().find(|b| b.name() == name)
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Words with syntactic meaning; they can't be bound by `let` or `fn`
pub const KEYWORDS: &[&str] = &["let", "if", "else", "fn", "true", "false"];

/// True if `name` is a keyword or an operator spelling
pub fn is_reserved(name: &str) -> bool {
    KEYWORDS.contains(&name) || Builtin::from_name(name).is_some()
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Integer or boolean literal: pushes its value
    Literal(Literal),

    /// List literal: `[1 2 3]`, or a range `[1..10]` already expanded
    List(Vec<Node>),

    /// Built-in operator call
    Call(Builtin),

    /// Let-bound name or user-defined word
    Word(String),

    /// Quotation: `( ... )` or `{ ... }`
    ///
    /// Pushed as a closure at run time; never executed during type checking.
    Quotation(Vec<Node>),

    /// Let-block: `let a b { ... }`
    ///
    /// Pops one value per name (the last name binds the top of stack) and
    /// makes them visible inside the body only.
    Let { names: Vec<String>, body: Vec<Node> },

    /// Conditional: `if { ... } else { ... }`
    ///
    /// Pops a Bool. A missing `else` is an empty branch.
    If {
        then_branch: Vec<Node>,
        else_branch: Vec<Node>,
    },

    /// Word definition: `fn name { ... }` (top level only)
    Define { name: String, body: Vec<Node> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub span: Span,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeKind, span: Span) -> Self {
        Node { id, kind, span }
    }

    /// Visit this node and every node nested inside it, parents first
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        visit(self);
        match &self.kind {
            NodeKind::List(body)
            | NodeKind::Quotation(body)
            | NodeKind::Let { body, .. }
            | NodeKind::Define { body, .. } => {
                for child in body {
                    child.walk(visit);
                }
            }
            NodeKind::If {
                then_branch,
                else_branch,
            } => {
                for child in then_branch.iter().chain(else_branch) {
                    child.walk(visit);
                }
            }
            NodeKind::Literal(_) | NodeKind::Call(_) | NodeKind::Word(_) => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub nodes: Vec<Node>,
}

impl Program {
    pub fn new(nodes: Vec<Node>) -> Self {
        Program { nodes }
    }

    /// All nodes in the program, depth first in source order
    pub fn iter_nodes(&self) -> Vec<&Node> {
        let mut all = Vec::new();
        for node in &self.nodes {
            node.walk(&mut |n| all.push(n));
        }
        all
    }

    /// Names of the words this program defines, in definition order
    pub fn defined_words(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter_map(|node| match &node.kind {
                NodeKind::Define { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Write nodes separated by single spaces
pub(crate) fn write_seq(f: &mut fmt::Formatter<'_>, nodes: &[Node]) -> fmt::Result {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", node)?;
    }
    Ok(())
}

fn write_block(f: &mut fmt::Formatter<'_>, nodes: &[Node]) -> fmt::Result {
    if nodes.is_empty() {
        return write!(f, "{{ }}");
    }
    write!(f, "{{ ")?;
    write_seq(f, nodes)?;
    write!(f, " }}")
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Literal(lit) => write!(f, "{}", lit),
            NodeKind::List(items) => {
                write!(f, "[")?;
                write_seq(f, items)?;
                write!(f, "]")
            }
            NodeKind::Call(builtin) => write!(f, "{}", builtin),
            NodeKind::Word(name) => write!(f, "{}", name),
            NodeKind::Quotation(body) => {
                write!(f, "(")?;
                write_seq(f, body)?;
                write!(f, ")")
            }
            NodeKind::Let { names, body } => {
                write!(f, "let {} ", names.join(" "))?;
                write_block(f, body)
            }
            NodeKind::If {
                then_branch,
                else_branch,
            } => {
                write!(f, "if ")?;
                write_block(f, then_branch)?;
                if !else_branch.is_empty() {
                    write!(f, " else ")?;
                    write_block(f, else_branch)?;
                }
                Ok(())
            }
            NodeKind::Define { name, body } => {
                write!(f, "fn {} ", name)?;
                write_block(f, body)
            }
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_seq(f, &self.nodes)
    }
}
