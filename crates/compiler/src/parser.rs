//! Parser for Cairn syntax
//!
//! Syntax:
//! ```text
//! 1 2 +                    # literals and operators
//! [1 2 3]  [1..10]         # list literal, inclusive range
//! (dup *)  { dup * }       # quotations
//! let a b { a b + }        # let-block, last name binds the top of stack
//! if { 1 } else { 2 }      # conditional on a Bool
//! fn square { dup * }      # word definition (top level only)
//! ```

use crate::ast::{Builtin, Literal, Node, NodeId, NodeKind, Program, Span, is_reserved};
use crate::error::ParseError;
use std::collections::HashSet;
use std::ops::RangeInclusive;

/// Ranges larger than this are almost certainly typos
const MAX_RANGE_LEN: i128 = 1_000_000;

/// Deepest bracket nesting accepted; checking and evaluation recurse per level
pub const MAX_NESTING: usize = 128;

/// A token with source position information
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    /// Line number (0-indexed)
    pub line: usize,
    /// Column number (0-indexed)
    pub column: usize,
}

impl Token {
    fn new(text: String, line: usize, column: usize) -> Self {
        Token { text, line, column }
    }

    pub fn span(&self) -> Span {
        Span::new(self.line, self.column, self.text.chars().count())
    }
}

impl PartialEq<&str> for Token {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Counter for assigning unique node ids in source order
    next_id: usize,
    /// Nesting depth; word definitions only parse at depth 0
    depth: usize,
    /// Words defined so far, including any the caller already knows about
    words: HashSet<String>,
    /// Position just past the last character, for end-of-input errors
    end: Span,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        let tokens = tokenize(source);
        let end = source_end(source);
        Parser {
            tokens,
            pos: 0,
            next_id: 0,
            depth: 0,
            words: HashSet::new(),
            end,
        }
    }

    /// Treat `words` as already defined, so redefining them is an error
    ///
    /// The REPL uses this to carry definitions across input lines.
    pub fn with_defined_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.words.extend(words.into_iter().map(Into::into));
        self
    }

    pub fn parse(&mut self) -> Result<Program, ParseError> {
        let mut nodes = Vec::new();
        while !self.is_at_end() {
            nodes.push(self.parse_node()?);
        }
        Ok(Program::new(nodes))
    }

    fn parse_node(&mut self) -> Result<Node, ParseError> {
        let tok = self
            .advance_token()
            .cloned()
            .ok_or_else(|| ParseError::new("unexpected end of input", self.end))?;
        let id = self.fresh_id();
        let span = tok.span();

        match tok.text.as_str() {
            "(" => {
                let (body, close) = self.parse_body(&tok, ")")?;
                Ok(Node::new(id, NodeKind::Quotation(body), join(&tok, &close)))
            }
            "{" => {
                let (body, close) = self.parse_body(&tok, "}")?;
                Ok(Node::new(id, NodeKind::Quotation(body), join(&tok, &close)))
            }
            "[" => self.parse_list(id, &tok),
            ")" | "]" | "}" => Err(ParseError::new(
                format!("unexpected closing '{}'", tok.text),
                span,
            )),
            "let" => self.parse_let(id, &tok),
            "if" => self.parse_if(id, &tok),
            "else" => Err(ParseError::new("'else' without a matching 'if'", span)),
            "fn" => self.parse_define(id, &tok),
            text => {
                if let Some(lit) = parse_literal(&tok)? {
                    return Ok(Node::new(id, NodeKind::Literal(lit), span));
                }
                let kind = match Builtin::from_name(text) {
                    Some(builtin) => NodeKind::Call(builtin),
                    None => NodeKind::Word(text.to_string()),
                };
                Ok(Node::new(id, kind, span))
            }
        }
    }

    /// Parse nodes up to the matching `close`, returning them and the closing token
    fn parse_body(&mut self, open: &Token, close: &str) -> Result<(Vec<Node>, Token), ParseError> {
        self.enter(open)?;
        let mut body = Vec::new();
        loop {
            let Some(tok) = self.current_token().cloned() else {
                return Err(ParseError::new(
                    format!("unclosed '{}', expected '{}'", open.text, close),
                    open.span(),
                ));
            };
            if tok == close {
                self.pos += 1;
                self.depth -= 1;
                return Ok((body, tok));
            }
            if is_closer(&tok.text) {
                return Err(ParseError::new(
                    format!("expected '{}' but found '{}'", close, tok.text),
                    tok.span(),
                ));
            }
            body.push(self.parse_node()?);
        }
    }

    /// List literal: literals, nested lists, quotations and `lo..hi` ranges
    fn parse_list(&mut self, id: NodeId, open: &Token) -> Result<Node, ParseError> {
        self.enter(open)?;
        let mut items = Vec::new();
        loop {
            let Some(tok) = self.current_token().cloned() else {
                return Err(ParseError::new("unclosed '[', expected ']'", open.span()));
            };
            match tok.text.as_str() {
                "]" => {
                    self.pos += 1;
                    self.depth -= 1;
                    return Ok(Node::new(id, NodeKind::List(items), join(open, &tok)));
                }
                "(" | "{" | "[" => items.push(self.parse_node()?),
                ")" | "}" => {
                    return Err(ParseError::new(
                        format!("expected ']' but found '{}'", tok.text),
                        tok.span(),
                    ));
                }
                text => {
                    self.pos += 1;
                    if let Some(range) = parse_range(text, tok.span())? {
                        for n in range {
                            let id = self.fresh_id();
                            items.push(Node::new(id, NodeKind::Literal(Literal::Int(n)), tok.span()));
                        }
                    } else if let Some(lit) = parse_literal(&tok)? {
                        let id = self.fresh_id();
                        items.push(Node::new(id, NodeKind::Literal(lit), tok.span()));
                    } else {
                        return Err(ParseError::new(
                            format!(
                                "invalid list element '{}': lists hold literals, lists and quotations",
                                text
                            ),
                            tok.span(),
                        ));
                    }
                }
            }
        }
    }

    /// `let name... { body }`
    fn parse_let(&mut self, id: NodeId, let_tok: &Token) -> Result<Node, ParseError> {
        let mut names: Vec<String> = Vec::new();
        let open = loop {
            let tok = self.advance_token().cloned().ok_or_else(|| {
                ParseError::new("expected '{' after let names", let_tok.span())
            })?;
            if tok == "{" {
                break tok;
            }
            validate_name(&tok)?;
            if names.contains(&tok.text) {
                return Err(ParseError::new(
                    format!("'{}' is bound twice in the same let", tok.text),
                    tok.span(),
                ));
            }
            names.push(tok.text);
        };
        if names.is_empty() {
            return Err(ParseError::new("let needs at least one name", let_tok.span()));
        }
        let (body, _) = self.parse_body(&open, "}")?;
        Ok(Node::new(id, NodeKind::Let { names, body }, let_tok.span()))
    }

    /// `if { then } else { else }`, with the else clause optional
    fn parse_if(&mut self, id: NodeId, if_tok: &Token) -> Result<Node, ParseError> {
        let open = self.expect_open_brace("if", if_tok)?;
        let (then_branch, _) = self.parse_body(&open, "}")?;

        let else_branch = if self.check("else") {
            let else_tok = self.advance_token().cloned().ok_or_else(|| {
                ParseError::new("unexpected end of input", self.end)
            })?;
            let open = self.expect_open_brace("else", &else_tok)?;
            self.parse_body(&open, "}")?.0
        } else {
            Vec::new()
        };

        Ok(Node::new(
            id,
            NodeKind::If {
                then_branch,
                else_branch,
            },
            if_tok.span(),
        ))
    }

    /// `fn name { body }`
    fn parse_define(&mut self, id: NodeId, fn_tok: &Token) -> Result<Node, ParseError> {
        if self.depth > 0 {
            return Err(ParseError::new(
                "word definitions are only allowed at top level",
                fn_tok.span(),
            ));
        }
        let name_tok = self
            .advance_token()
            .cloned()
            .ok_or_else(|| ParseError::new("expected a word name after 'fn'", fn_tok.span()))?;
        validate_name(&name_tok)?;
        if !self.words.insert(name_tok.text.clone()) {
            return Err(ParseError::new(
                format!("word '{}' is already defined", name_tok.text),
                name_tok.span(),
            ));
        }
        let open = self.expect_open_brace(&format!("fn {}", name_tok.text), &name_tok)?;
        let (body, _) = self.parse_body(&open, "}")?;
        let span = name_tok.span();
        Ok(Node::new(
            id,
            NodeKind::Define {
                name: name_tok.text,
                body,
            },
            span,
        ))
    }

    fn enter(&mut self, open: &Token) -> Result<(), ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::new(
                format!("nesting deeper than {} levels", MAX_NESTING),
                open.span(),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn expect_open_brace(&mut self, after: &str, prev: &Token) -> Result<Token, ParseError> {
        match self.current_token().cloned() {
            Some(tok) if tok == "{" => {
                self.pos += 1;
                Ok(tok)
            }
            Some(tok) => Err(ParseError::new(
                format!("expected '{{' after '{}', found '{}'", after, tok.text),
                tok.span(),
            )),
            None => Err(ParseError::new(
                format!("expected '{{' after '{}'", after),
                prev.span(),
            )),
        }
    }

    fn fresh_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn check(&self, expected: &str) -> bool {
        self.current_token().is_some_and(|tok| *tok == expected)
    }

    /// Get the full current token with position info
    fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Advance and return the full token with position info
    fn advance_token(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }
}

fn is_closer(text: &str) -> bool {
    matches!(text, ")" | "]" | "}")
}

/// Span from the start of `open` to the end of `close` when both sit on one line
fn join(open: &Token, close: &Token) -> Span {
    if open.line == close.line && close.column >= open.column {
        Span::new(open.line, open.column, close.column + 1 - open.column)
    } else {
        open.span()
    }
}

fn looks_like_int(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn parse_int(text: &str, span: Span) -> Result<i64, ParseError> {
    text.parse::<i64>()
        .map_err(|_| ParseError::new(format!("integer literal out of range: {}", text), span))
}

fn parse_literal(tok: &Token) -> Result<Option<Literal>, ParseError> {
    match tok.text.as_str() {
        "true" => Ok(Some(Literal::Bool(true))),
        "false" => Ok(Some(Literal::Bool(false))),
        text if looks_like_int(text) => Ok(Some(Literal::Int(parse_int(text, tok.span())?))),
        _ => Ok(None),
    }
}

/// `lo..hi` inside a list, inclusive at both ends
fn parse_range(text: &str, span: Span) -> Result<Option<RangeInclusive<i64>>, ParseError> {
    let Some((lo, hi)) = text.split_once("..") else {
        return Ok(None);
    };
    if !looks_like_int(lo) || !looks_like_int(hi) {
        return Ok(None);
    }
    let (lo, hi) = (parse_int(lo, span)?, parse_int(hi, span)?);
    if i128::from(hi) - i128::from(lo) >= MAX_RANGE_LEN {
        return Err(ParseError::new(
            format!("range {} is too large", text),
            span,
        ));
    }
    Ok(Some(lo..=hi))
}

/// Names bound by `let` and `fn` must be plain identifiers
fn validate_name(tok: &Token) -> Result<(), ParseError> {
    if is_reserved(&tok.text) {
        return Err(ParseError::new(
            format!("'{}' is reserved and cannot be used as a name", tok.text),
            tok.span(),
        ));
    }
    if matches!(tok.text.as_str(), "(" | ")" | "[" | "]" | "{" | "}")
        || looks_like_int(&tok.text)
        || tok.text.contains("..")
    {
        return Err(ParseError::new(
            format!("expected a name, found '{}'", tok.text),
            tok.span(),
        ));
    }
    Ok(())
}

fn source_end(source: &str) -> Span {
    let line = source.lines().count().saturating_sub(1);
    let column = source.lines().last().map_or(0, |l| l.chars().count());
    Span::new(line, column, 1)
}

/// Split source into tokens, dropping whitespace and `#` comments
fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_start_line = 0;
    let mut current_start_col = 0;
    let mut in_comment = false;

    // Track current position (0-indexed)
    let mut line = 0;
    let mut col = 0;

    fn flush(current: &mut String, tokens: &mut Vec<Token>, line: usize, column: usize) {
        if !current.is_empty() {
            tokens.push(Token::new(std::mem::take(current), line, column));
        }
    }

    for ch in source.chars() {
        if in_comment {
            if ch == '\n' {
                in_comment = false;
            }
        } else if ch == '#' {
            flush(&mut current, &mut tokens, current_start_line, current_start_col);
            in_comment = true;
        } else if ch.is_whitespace() {
            flush(&mut current, &mut tokens, current_start_line, current_start_col);
        } else if "()[]{}".contains(ch) {
            flush(&mut current, &mut tokens, current_start_line, current_start_col);
            tokens.push(Token::new(ch.to_string(), line, col));
        } else {
            if current.is_empty() {
                current_start_line = line;
                current_start_col = col;
            }
            current.push(ch);
        }

        if ch == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
    }
    flush(&mut current, &mut tokens, current_start_line, current_start_col);

    tokens
}
