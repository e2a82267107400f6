//! Interactive session state
//!
//! Each line is checked against the types of the values already on the
//! stack, then run. A line that fails anywhere leaves the session exactly
//! as it was: the checker, the interpreter and the stack are only replaced
//! once the whole line has succeeded.

use cairn_runtime::{Interpreter, PrintHandler, Value};
use cairnc::diagnostic::{Spanned, render};
use cairnc::{Parser, StackType, TypeChecker};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct Session {
    checker: TypeChecker,
    interp: Interpreter,
    stack: Vec<Value>,
    /// Types of `stack`, bottom first
    types: StackType,
    color: bool,
}

impl Session {
    pub fn new(printer: PrintHandler, color: bool) -> Self {
        Session {
            interp: Interpreter::with_printer(printer).record_output(),
            color,
            ..Self::default()
        }
    }

    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    pub fn types(&self) -> &StackType {
        &self.types
    }

    /// Parse, check and run one line, returning the lines it printed
    ///
    /// Errors come back already rendered as diagnostics.
    pub fn eval(&mut self, source: &str) -> Result<Vec<String>, String> {
        let program = Parser::new(source)
            .with_defined_words(self.checker.word_names())
            .parse()
            .map_err(|e| self.render(&e, source))?;

        let mut checker = self.checker.clone();
        let checked = checker
            .check_with_stack(&program, &self.types)
            .map_err(|e| self.render(&e, source))?;

        let mut interp = self.interp.clone();
        let mut stack = self.stack.clone();
        interp
            .run(&checked, &mut stack)
            .map_err(|e| self.render(&e, source))?;

        debug!(effect = %checked.effect(), depth = stack.len(), "line committed");
        self.types = checked.effect().outputs.clone();
        self.checker = checker;
        self.interp = interp;
        self.stack = stack;
        Ok(self.interp.take_output())
    }

    /// Principal effect of `source` over an open stack, without running it
    pub fn type_of(&self, source: &str) -> Result<String, String> {
        let program = Parser::new(source)
            .with_defined_words(self.checker.word_names())
            .parse()
            .map_err(|e| self.render(&e, source))?;
        let checked = self
            .checker
            .clone()
            .check(&program)
            .map_err(|e| self.render(&e, source))?;
        Ok(checked.effect().to_string())
    }

    /// Drop all values, keeping defined words
    pub fn clear(&mut self) {
        self.stack.clear();
        self.types = StackType::Empty;
    }

    /// The stack as one line, bottom first
    pub fn render_stack(&self) -> String {
        if self.stack.is_empty() {
            return "(empty)".to_string();
        }
        self.stack
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn word_effects(&self) -> Vec<(String, String)> {
        self.checker
            .word_names()
            .into_iter()
            .filter_map(|name| {
                let effect = self.checker.word_effect(name)?;
                Some((name.to_string(), effect.normalized().to_string()))
            })
            .collect()
    }

    fn render<E>(&self, error: &E, source: &str) -> String
    where
        E: std::error::Error + Spanned,
    {
        render(error, source, "<repl>", self.color)
    }
}
