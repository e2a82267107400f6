//! Source diagnostics
//!
//! Renders an error with its location and a caret line under the offending
//! span:
//!
//! ```text
//! error: type error: +: type mismatch, expected Int but found Bool
//!   --> demo.cairn:1:8
//!    |
//!  1 | 1 true +
//!    |        ^
//! ```

use crate::ast::Span;
use crate::error::{CompileError, ParseError, TypeError};
use std::fmt::Write;

const RED: &str = "\x1b[1;31m";
const BLUE: &str = "\x1b[1;34m";
const RESET: &str = "\x1b[0m";

/// Errors that may point at a place in the source
pub trait Spanned {
    fn span(&self) -> Option<&Span>;
}

impl Spanned for ParseError {
    fn span(&self) -> Option<&Span> {
        Some(&self.span)
    }
}

impl Spanned for TypeError {
    fn span(&self) -> Option<&Span> {
        TypeError::span(self)
    }
}

impl Spanned for CompileError {
    fn span(&self) -> Option<&Span> {
        CompileError::span(self)
    }
}

/// Render `error` against `source`, with ANSI colours when `color` is set
pub fn render<E>(error: &E, source: &str, filename: &str, color: bool) -> String
where
    E: std::error::Error + Spanned,
{
    let paint = |code: &'static str| if color { code } else { "" };
    let (red, blue, reset) = (paint(RED), paint(BLUE), paint(RESET));

    let mut out = String::new();
    let _ = writeln!(out, "{red}error{reset}: {error}");

    let Some(span) = error.span() else {
        return out;
    };
    let Some(line_text) = source.lines().nth(span.line) else {
        let _ = writeln!(out, "  {blue}-->{reset} {filename}");
        return out;
    };

    let line_no = (span.line + 1).to_string();
    let gutter = " ".repeat(line_no.len());
    let _ = writeln!(
        out,
        "{gutter}{blue}-->{reset} {filename}:{}:{}",
        span.line + 1,
        span.column + 1
    );
    let _ = writeln!(out, "{gutter} {blue}|{reset}");
    let _ = writeln!(out, "{blue}{line_no} |{reset} {line_text}");

    // Keep the caret on the line even if the span runs past its end
    let width = line_text.chars().count();
    let column = span.column.min(width);
    let length = span.length.max(1).min(width.saturating_sub(column).max(1));
    let _ = writeln!(
        out,
        "{gutter} {blue}|{reset} {}{red}{}{reset}",
        " ".repeat(column),
        "^".repeat(length)
    );
    out
}
