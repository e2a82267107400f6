//! Type checker for Cairn
//!
//! Uses row polymorphism and unification to infer the principal stack
//! effect of a program. Every node is given an effect of its own (a fresh
//! instance of its schema), and a sequence is the left fold of [`compose`]
//! over its nodes, starting from the identity effect.
//!
//! One [`Subst`] is threaded through a whole checking pass and dropped at the
//! end of it. The only state a [`TypeChecker`] keeps between passes is the
//! table of user-defined words.

use crate::ast::{Builtin, Literal, Node, NodeId, NodeKind, Program};
use crate::builtins::builtin_signature;
use crate::error::{TypeError, UnifyError};
use crate::types::{Effect, RowVar, StackType, Type, TypeVar};
use crate::unification::{Subst, unify_stacks, unify_types};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// Compose two effects left to right
///
/// The outputs of `first` are unified with the inputs of `second`, top of
/// stack first. Outputs of `first` that `second` never reaches stay beneath
/// `second`'s outputs through its row; inputs `second` needs beyond what
/// `first` produced are pulled through `first`'s row.
pub fn compose(subst: &mut Subst, first: &Effect, second: &Effect) -> Result<Effect, UnifyError> {
    unify_stacks(subst, &second.inputs, &first.outputs)?;
    Ok(Effect::new(
        subst.apply_stack(&first.inputs),
        subst.apply_stack(&second.outputs),
    ))
}

/// A program that passed type checking, with its effects
///
/// Only the type checker constructs these, so anything that takes a
/// `CheckedProgram` can rely on the program being well typed.
#[derive(Debug, Clone)]
pub struct CheckedProgram {
    program: Program,
    effect: Effect,
    node_effects: HashMap<NodeId, Effect>,
}

impl CheckedProgram {
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Principal effect of the whole program, variables renamed in order of
    /// first appearance
    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    /// Inferred effect of one node, with the final substitution applied
    pub fn node_effect(&self, id: NodeId) -> Option<&Effect> {
        self.node_effects.get(&id)
    }

    /// Words this program defines
    pub fn defined_words(&self) -> Vec<&str> {
        self.program.defined_words()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TypeChecker {
    /// Generalised effects of user-defined words
    words: HashMap<String, Effect>,
}

impl TypeChecker {
    pub fn new() -> Self {
        TypeChecker::default()
    }

    /// Effect of a user-defined word, as stored at its definition
    pub fn word_effect(&self, name: &str) -> Option<&Effect> {
        self.words.get(name)
    }

    /// Names of all user-defined words, sorted
    pub fn word_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.words.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Infer the principal effect of `program` over an open stack
    pub fn check(&mut self, program: &Program) -> Result<CheckedProgram, TypeError> {
        let mut inference = Inference::new(&self.words);
        let start = StackType::RowVar(inference.subst.fresh_row());
        let (checked, defined) = inference.run(program, start)?;
        self.words.extend(defined);
        Ok(checked)
    }

    /// Check `program` against a known starting stack
    ///
    /// `Empty` is what a file run starts from; the REPL passes the type of
    /// its current stack. Needing more values than `initial` holds is an
    /// `ArityUnderflow`.
    pub fn check_with_stack(
        &mut self,
        program: &Program,
        initial: &StackType,
    ) -> Result<CheckedProgram, TypeError> {
        let mut inference = Inference::new(&self.words);
        let start = inference.freshen_stack(initial, &mut HashMap::new(), &mut HashMap::new());
        let (checked, defined) = inference.run(program, start)?;
        self.words.extend(defined);
        Ok(checked)
    }
}

/// State of one checking pass
struct Inference<'a> {
    /// Words committed by earlier passes
    words: &'a HashMap<String, Effect>,
    /// Words defined so far in this pass
    defined: HashMap<String, Effect>,
    /// Let-bound names in scope, innermost last; monomorphic
    locals: Vec<(String, Type)>,
    subst: Subst,
    node_effects: HashMap<NodeId, Effect>,
}

impl<'a> Inference<'a> {
    fn new(words: &'a HashMap<String, Effect>) -> Self {
        Inference {
            words,
            defined: HashMap::new(),
            locals: Vec::new(),
            subst: Subst::empty(),
            node_effects: HashMap::new(),
        }
    }

    fn run(
        mut self,
        program: &Program,
        start: StackType,
    ) -> Result<(CheckedProgram, HashMap<String, Effect>), TypeError> {
        let effect = self.infer_sequence(&program.nodes, start)?;
        let effect = self.subst.apply_effect(&effect).normalized();

        let subst = &self.subst;
        let node_effects = self
            .node_effects
            .iter()
            .map(|(id, effect)| (*id, subst.apply_effect(effect)))
            .collect();

        debug!(
            nodes = program.nodes.len(),
            bindings = self.subst.len(),
            effect = %effect,
            "type checked program"
        );

        let checked = CheckedProgram {
            program: program.clone(),
            effect,
            node_effects,
        };
        Ok((checked, self.defined))
    }

    /// Infer a sequence of nodes, starting from the identity effect on `start`
    fn infer_sequence(&mut self, nodes: &[Node], start: StackType) -> Result<Effect, TypeError> {
        let mut effect = Effect::new(start.clone(), start);
        for node in nodes {
            let node_effect = self.infer_child(node)?;
            if let NodeKind::Call(Builtin::Do) = node.kind {
                effect = self.instantiate_quotation(effect);
            }
            effect = compose(&mut self.subst, &effect, &node_effect)
                .map_err(|err| TypeError::from_unify(err, &describe(node), Some(node.span)))?;
            if let NodeKind::Call(Builtin::Choice) = node.kind {
                self.unify_alternatives(&node_effect, node)?;
            }
        }
        Ok(effect)
    }

    /// Give the quotation on top of `effect`'s outputs its own copy of
    /// every variable that neither the sequence's inputs nor a let-bound
    /// name can reach
    ///
    /// Such variables were introduced by values built inside the sequence,
    /// so each `do` may use the quotation at a new instance. This is what
    /// lets `(1) dup do` run the quotation while a copy of it is still on
    /// the stack.
    fn instantiate_quotation(&mut self, effect: Effect) -> Effect {
        let Some((rest, Type::Quotation(body))) = self.subst.apply_stack(&effect.outputs).pop()
        else {
            return effect;
        };

        let mut fixed = FreeVars::default();
        fixed.stack(&self.subst.apply_stack(&effect.inputs));
        for (_, ty) in &self.locals {
            fixed.ty(&self.subst.apply_type(ty));
        }

        // Fixed variables map to themselves, everything else is renamed
        let mut type_map = fixed.types.into_iter().map(|var| (var, var)).collect();
        let mut row_map = fixed.rows.into_iter().map(|row| (row, row)).collect();
        let inputs = self.freshen_stack(&body.inputs, &mut type_map, &mut row_map);
        let outputs = self.freshen_stack(&body.outputs, &mut type_map, &mut row_map);

        let quotation = Type::quotation(Effect::new(inputs, outputs));
        Effect::new(effect.inputs, rest.push(quotation))
    }

    /// The two values offered to `choice` must have one type
    fn unify_alternatives(&mut self, effect: &Effect, node: &Node) -> Result<(), TypeError> {
        let alternatives = effect
            .inputs
            .clone()
            .pop()
            .and_then(|(rest, else_value)| Some((rest.pop()?.1, else_value)));
        let Some((then_value, else_value)) = alternatives else {
            return Ok(());
        };

        unify_types(&mut self.subst, &then_value, &else_value).map_err(|_| {
            TypeError::BranchMismatch {
                then_branch: StackType::singleton(self.subst.apply_type(&then_value)),
                else_branch: StackType::singleton(self.subst.apply_type(&else_value)),
                span: Some(node.span),
            }
        })
    }

    /// Infer a node's own effect and record it
    fn infer_child(&mut self, node: &Node) -> Result<Effect, TypeError> {
        let effect = self.infer_node(node)?;
        trace!(node = %describe(node), effect = %effect, "inferred node");
        self.node_effects.insert(node.id, effect.clone());
        Ok(effect)
    }

    fn infer_node(&mut self, node: &Node) -> Result<Effect, TypeError> {
        match &node.kind {
            NodeKind::Literal(Literal::Int(_)) => Ok(self.push_effect(Type::Int)),
            NodeKind::Literal(Literal::Bool(_)) => Ok(self.push_effect(Type::Bool)),
            NodeKind::List(items) => self.infer_list(items),
            NodeKind::Call(Builtin::Choice) => Ok(self.choice_effect()),
            NodeKind::Call(builtin) => Ok(self.freshen_effect(&builtin_signature(*builtin))),
            NodeKind::Word(name) => self.infer_word(name, node),
            NodeKind::Quotation(body) => self.infer_quotation(body),
            NodeKind::Let { names, body } => self.infer_let(names, body),
            NodeKind::If {
                then_branch,
                else_branch,
            } => self.infer_if(then_branch, else_branch, node),
            NodeKind::Define { name, body } => self.infer_define(name, body),
        }
    }

    /// ( ..r -- ..r ty )
    fn push_effect(&mut self, ty: Type) -> Effect {
        let row = StackType::RowVar(self.subst.fresh_row());
        Effect::new(row.clone(), row.push(ty))
    }

    /// ( ..r Bool T U -- ..r T )
    ///
    /// The alternatives start out distinct and are unified once `choice`
    /// has been composed, so that a clash between them is reported as a
    /// branch mismatch.
    fn choice_effect(&mut self) -> Effect {
        let row = StackType::RowVar(self.subst.fresh_row());
        let then_value = self.subst.fresh_type();
        let else_value = self.subst.fresh_type();
        Effect::new(
            StackType::with_prefix(row.clone(), vec![Type::Bool, then_value.clone(), else_value]),
            row.push(then_value),
        )
    }

    /// Every element pushes one value, and all of them share one type
    fn infer_list(&mut self, items: &[Node]) -> Result<Effect, TypeError> {
        let element = self.subst.fresh_type();
        for item in items {
            let item_effect = self.infer_child(item)?;
            let expected = item_effect.inputs.clone().push(element.clone());
            unify_stacks(&mut self.subst, &expected, &item_effect.outputs)
                .map_err(|err| TypeError::from_unify(err, "list literal", Some(item.span)))?;
        }
        Ok(self.push_effect(Type::list(element)))
    }

    fn infer_word(&mut self, name: &str, node: &Node) -> Result<Effect, TypeError> {
        if let Some((_, ty)) = self.locals.iter().rev().find(|(local, _)| local == name) {
            let ty = ty.clone();
            return Ok(self.push_effect(ty));
        }

        let schema = self
            .defined
            .get(name)
            .or_else(|| self.words.get(name))
            .cloned();
        match schema {
            // Each use gets its own copy of the word's variables
            Some(effect) => Ok(self.freshen_effect(&effect)),
            None => Err(TypeError::UnboundIdentifier {
                name: name.to_string(),
                span: Some(node.span),
            }),
        }
    }

    /// The body is elaborated from a fresh row and pushed as one value
    fn infer_quotation(&mut self, body: &[Node]) -> Result<Effect, TypeError> {
        let row = StackType::RowVar(self.subst.fresh_row());
        let body_effect = self.infer_sequence(body, row)?;
        Ok(self.push_effect(Type::quotation(body_effect)))
    }

    fn infer_let(&mut self, names: &[String], body: &[Node]) -> Result<Effect, TypeError> {
        let row = StackType::RowVar(self.subst.fresh_row());
        let types: Vec<Type> = names.iter().map(|_| self.subst.fresh_type()).collect();

        let depth = self.locals.len();
        self.locals
            .extend(names.iter().cloned().zip(types.iter().cloned()));
        let body_effect = self.infer_sequence(body, row.clone());
        self.locals.truncate(depth);
        let body_effect = body_effect?;

        // Last name binds the top of stack
        Ok(Effect::new(
            StackType::with_prefix(row, types),
            body_effect.outputs,
        ))
    }

    /// Both branches start from the stack below the condition and must
    /// leave the same stack behind
    fn infer_if(
        &mut self,
        then_branch: &[Node],
        else_branch: &[Node],
        node: &Node,
    ) -> Result<Effect, TypeError> {
        let row = StackType::RowVar(self.subst.fresh_row());
        let then_effect = self.infer_sequence(then_branch, row.clone())?;
        let else_effect = self.infer_sequence(else_branch, row.clone())?;

        unify_stacks(&mut self.subst, &then_effect.outputs, &else_effect.outputs).map_err(
            |_| TypeError::BranchMismatch {
                then_branch: self.subst.apply_stack(&then_effect.outputs),
                else_branch: self.subst.apply_stack(&else_effect.outputs),
                span: Some(node.span),
            },
        )?;

        Ok(Effect::new(row.push(Type::Bool), then_effect.outputs))
    }

    /// Generalise the body's effect and record it; the definition itself
    /// leaves the stack alone
    fn infer_define(&mut self, name: &str, body: &[Node]) -> Result<Effect, TypeError> {
        let row = StackType::RowVar(self.subst.fresh_row());
        let outer = std::mem::take(&mut self.locals);
        let body_effect = self.infer_sequence(body, row);
        self.locals = outer;

        let effect = self.subst.apply_effect(&body_effect?);
        debug!(word = %name, effect = %effect.normalized(), "defined word");
        self.defined.insert(name.to_string(), effect);

        Ok(Effect::identity(self.subst.fresh_row()))
    }

    /// Freshen all type and row variables in an effect
    fn freshen_effect(&mut self, effect: &Effect) -> Effect {
        let mut type_map = HashMap::new();
        let mut row_map = HashMap::new();

        let fresh_inputs = self.freshen_stack(&effect.inputs, &mut type_map, &mut row_map);
        let fresh_outputs = self.freshen_stack(&effect.outputs, &mut type_map, &mut row_map);

        Effect::new(fresh_inputs, fresh_outputs)
    }

    fn freshen_stack(
        &mut self,
        stack: &StackType,
        type_map: &mut HashMap<TypeVar, TypeVar>,
        row_map: &mut HashMap<RowVar, RowVar>,
    ) -> StackType {
        match stack {
            StackType::Empty => StackType::Empty,
            StackType::RowVar(row) => {
                let fresh = *row_map
                    .entry(*row)
                    .or_insert_with(|| self.subst.fresh_row());
                StackType::RowVar(fresh)
            }
            StackType::Cons { rest, top } => {
                let fresh_rest = self.freshen_stack(rest, type_map, row_map);
                let fresh_top = self.freshen_type(top, type_map, row_map);
                fresh_rest.push(fresh_top)
            }
        }
    }

    fn freshen_type(
        &mut self,
        ty: &Type,
        type_map: &mut HashMap<TypeVar, TypeVar>,
        row_map: &mut HashMap<RowVar, RowVar>,
    ) -> Type {
        match ty {
            Type::Int | Type::Bool => ty.clone(),
            Type::Var(var) => {
                let fresh = *type_map
                    .entry(*var)
                    .or_insert_with(|| self.subst.fresh_var());
                Type::Var(fresh)
            }
            Type::List(element) => Type::list(self.freshen_type(element, type_map, row_map)),
            Type::Quotation(effect) => {
                let fresh_inputs = self.freshen_stack(&effect.inputs, type_map, row_map);
                let fresh_outputs = self.freshen_stack(&effect.outputs, type_map, row_map);
                Type::quotation(Effect::new(fresh_inputs, fresh_outputs))
            }
        }
    }
}

/// Variables occurring in a set of types
#[derive(Default)]
struct FreeVars {
    types: HashSet<TypeVar>,
    rows: HashSet<RowVar>,
}

impl FreeVars {
    fn stack(&mut self, stack: &StackType) {
        match stack {
            StackType::Empty => {}
            StackType::RowVar(row) => {
                self.rows.insert(*row);
            }
            StackType::Cons { rest, top } => {
                self.stack(rest);
                self.ty(top);
            }
        }
    }

    fn ty(&mut self, ty: &Type) {
        match ty {
            Type::Int | Type::Bool => {}
            Type::Var(var) => {
                self.types.insert(*var);
            }
            Type::List(element) => self.ty(element),
            Type::Quotation(effect) => {
                self.stack(&effect.inputs);
                self.stack(&effect.outputs);
            }
        }
    }
}

/// How a node is named in error messages
fn describe(node: &Node) -> String {
    match &node.kind {
        NodeKind::Literal(lit) => format!("literal {}", lit),
        NodeKind::List(_) => "list literal".to_string(),
        NodeKind::Call(builtin) => builtin.name().to_string(),
        NodeKind::Word(name) => name.clone(),
        NodeKind::Quotation(_) => "quotation".to_string(),
        NodeKind::Let { .. } => "let".to_string(),
        NodeKind::If { .. } => "if".to_string(),
        NodeKind::Define { name, .. } => format!("fn {}", name),
    }
}
