//! Tree-walking evaluator for checked programs
//!
//! The interpreter only accepts a [`CheckedProgram`], so it can assume every
//! operator finds values of the right kind on the stack. It keeps the words
//! defined so far, which lets a front end run one input after another
//! against the same interpreter.

use crate::arithmetic;
use crate::error::RuntimeError;
use crate::list_ops;
use crate::print::PrintHandler;
use crate::quotations;
use crate::scope::Scope;
use crate::stack::{self, Site, Stack, pop, pop_bool};
use crate::value::{Closure, Value};
use cairnc::ast::Literal;
use cairnc::{Builtin, CheckedProgram, Node, NodeKind};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, trace};

/// Final stack and printed lines of one evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub stack: Vec<Value>,
    pub output: Vec<String>,
}

/// Evaluate a checked program on `stack`, capturing printed output
pub fn evaluate(checked: &CheckedProgram, stack: Vec<Value>) -> Result<Outcome, RuntimeError> {
    let mut interp = Interpreter::with_printer(PrintHandler::Silent).record_output();
    let mut stack = stack;
    interp.run(checked, &mut stack)?;
    Ok(Outcome {
        stack,
        output: interp.take_output(),
    })
}

#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    /// Bodies of user-defined words
    words: HashMap<String, Rc<[Node]>>,
    root: Rc<Scope>,
    printer: PrintHandler,
    /// Lines printed since the last `take_output`; `None` unless recording
    output: Option<Vec<String>>,
}

impl Interpreter {
    /// An interpreter that prints to stdout
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_printer(printer: PrintHandler) -> Self {
        Interpreter {
            printer,
            ..Self::default()
        }
    }

    /// Also keep every printed line until it is taken
    pub fn record_output(mut self) -> Self {
        self.output = Some(Vec::new());
        self
    }

    pub fn printer(&self) -> &PrintHandler {
        &self.printer
    }

    /// Recorded lines; always empty when not recording
    pub fn output(&self) -> &[String] {
        self.output.as_deref().unwrap_or_default()
    }

    pub fn take_output(&mut self) -> Vec<String> {
        self.output.as_mut().map(std::mem::take).unwrap_or_default()
    }

    pub fn has_word(&self, name: &str) -> bool {
        self.words.contains_key(name)
    }

    /// Run a program on `stack`
    ///
    /// On error the stack and word table are left partly updated; callers
    /// that need to recover keep their own copies.
    pub fn run(&mut self, checked: &CheckedProgram, stack: &mut Stack) -> Result<(), RuntimeError> {
        let root = Rc::clone(&self.root);
        let result = self.eval_sequence(&checked.program().nodes, &root, stack);
        match &result {
            Ok(()) => debug!(depth = stack.len(), "evaluation finished"),
            Err(err) => debug!(error = %err, "evaluation failed"),
        }
        result
    }

    /// Run a closure body on `stack` under the scope it captured
    pub(crate) fn call_closure(
        &mut self,
        closure: &Closure,
        stack: &mut Stack,
    ) -> Result<(), RuntimeError> {
        self.eval_sequence(&closure.body, &closure.captured, stack)
    }

    fn eval_sequence(
        &mut self,
        nodes: &[Node],
        scope: &Rc<Scope>,
        stack: &mut Stack,
    ) -> Result<(), RuntimeError> {
        for node in nodes {
            self.eval_node(node, scope, stack)?;
        }
        Ok(())
    }

    fn eval_node(
        &mut self,
        node: &Node,
        scope: &Rc<Scope>,
        stack: &mut Stack,
    ) -> Result<(), RuntimeError> {
        trace!(node = %node, depth = stack.len(), "eval");
        match &node.kind {
            NodeKind::Literal(Literal::Int(n)) => stack.push(Value::Int(*n)),
            NodeKind::Literal(Literal::Bool(b)) => stack.push(Value::Bool(*b)),
            NodeKind::List(items) => {
                let site = Site::new("list literal", Some(node.span));
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    let mut scratch = Stack::new();
                    self.eval_node(item, scope, &mut scratch)?;
                    values.push(pop(&mut scratch, site)?);
                }
                stack.push(Value::List(values));
            }
            NodeKind::Call(builtin) => {
                let site = Site::new(builtin.name(), Some(node.span));
                self.call_builtin(*builtin, stack, site)?;
            }
            NodeKind::Word(name) => self.call_word(name, node, scope, stack)?,
            NodeKind::Quotation(body) => {
                stack.push(Value::closure(Rc::from(body.as_slice()), Rc::clone(scope)));
            }
            NodeKind::Let { names, body } => {
                let site = Site::new("let", Some(node.span));
                if stack.len() < names.len() {
                    return Err(site.internal("stack underflow"));
                }
                // Last name binds the top of stack
                let values = stack.split_off(stack.len() - names.len());
                let block = Scope::child(scope, names.iter().cloned().zip(values));
                self.eval_sequence(body, &block, stack)?;
            }
            NodeKind::If {
                then_branch,
                else_branch,
            } => {
                let cond = pop_bool(stack, Site::new("if", Some(node.span)))?;
                let branch = if cond { then_branch } else { else_branch };
                self.eval_sequence(branch, scope, stack)?;
            }
            NodeKind::Define { name, body } => {
                self.words
                    .insert(name.clone(), Rc::from(body.as_slice()));
            }
        }
        Ok(())
    }

    /// Let-bound names shadow words; word bodies run under the root scope
    fn call_word(
        &mut self,
        name: &str,
        node: &Node,
        scope: &Rc<Scope>,
        stack: &mut Stack,
    ) -> Result<(), RuntimeError> {
        if let Some(value) = scope.lookup(name) {
            stack.push(value.clone());
            return Ok(());
        }
        let Some(body) = self.words.get(name).cloned() else {
            return Err(RuntimeError::internal(
                name,
                "unbound identifier",
                Some(node.span),
            ));
        };
        let root = Rc::clone(&self.root);
        self.eval_sequence(&body, &root, stack)
    }

    fn call_builtin(
        &mut self,
        builtin: Builtin,
        stack: &mut Stack,
        site: Site,
    ) -> Result<(), RuntimeError> {
        match builtin {
            Builtin::Add => arithmetic::add(stack, site),
            Builtin::Subtract => arithmetic::subtract(stack, site),
            Builtin::Multiply => arithmetic::multiply(stack, site),
            Builtin::Divide => arithmetic::divide(stack, site),
            Builtin::Modulo => arithmetic::modulo(stack, site),
            Builtin::Less => arithmetic::less(stack, site),
            Builtin::Greater => arithmetic::greater(stack, site),
            Builtin::LessEq => arithmetic::less_eq(stack, site),
            Builtin::GreaterEq => arithmetic::greater_eq(stack, site),
            Builtin::Equal => arithmetic::equal(stack, site),
            Builtin::Not => arithmetic::not(stack, site),
            Builtin::And => arithmetic::and(stack, site),
            Builtin::Or => arithmetic::or(stack, site),
            Builtin::Dup => stack::dup(stack, site),
            Builtin::Swap => stack::swap(stack, site),
            Builtin::Over => stack::over(stack, site),
            Builtin::Rot => stack::rot(stack, site),
            Builtin::Drop => stack::drop_top(stack, site),
            Builtin::Choice => stack::choice(stack, site),
            Builtin::Print => {
                let value = pop(stack, site)?;
                self.print(value.to_string());
                Ok(())
            }
            Builtin::Len => list_ops::len(stack, site),
            Builtin::Head => list_ops::head(stack, site),
            Builtin::Tail => list_ops::tail(stack, site),
            Builtin::Push => list_ops::push(stack, site),
            Builtin::Concat => list_ops::concat(stack, site),
            Builtin::Map => quotations::map(self, stack, site),
            Builtin::Filter => quotations::filter(self, stack, site),
            Builtin::Fold => quotations::fold(self, stack, site),
            Builtin::Foreach => quotations::foreach(self, stack, site),
            Builtin::Do => quotations::call(self, stack, site),
        }
    }

    fn print(&mut self, line: String) {
        self.printer.println(&line);
        if let Some(log) = self.output.as_mut() {
            log.push(line);
        }
    }
}
