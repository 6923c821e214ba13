//! Indentation tracking shared by every writer.
//!
//! Each top-level emission owns one [`IndentContext`] and passes it down by
//! `&mut`. Nesting goes through [`IndentContext::nested`], which restores the
//! saved depth on every exit path, so a failing writer cannot leave the
//! context skewed for the next one.

use crate::error::{GenError, GenResult};

pub const DEFAULT_INDENT_WIDTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentContext {
    depth: usize,
    unit: String,
}

impl Default for IndentContext {
    fn default() -> Self {
        Self::new(DEFAULT_INDENT_WIDTH)
    }
}

impl IndentContext {
    pub fn new(width: usize) -> Self {
        Self {
            depth: 0,
            unit: " ".repeat(width),
        }
    }

    pub const fn depth(&self) -> usize {
        self.depth
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    /// Dropping below zero means scopes were mismatched; that is a bug in
    /// the caller and is reported rather than clamped.
    pub fn dedent(&mut self) -> GenResult<()> {
        self.depth = self.depth.checked_sub(1).ok_or(GenError::IndentUnderflow)?;
        Ok(())
    }

    /// `text` prefixed with the current indentation.
    pub fn render(&self, text: &str) -> String {
        let mut line = self.unit.repeat(self.depth);
        line.push_str(text);
        line
    }

    /// Append `text` as one indented line. Empty text yields a bare newline.
    pub fn line(&self, out: &mut String, text: &str) {
        if !text.is_empty() {
            out.push_str(&self.unit.repeat(self.depth));
            out.push_str(text);
        }
        out.push('\n');
    }

    /// Run `body` one level deeper.
    pub fn nested<R>(&mut self, body: impl FnOnce(&mut Self) -> GenResult<R>) -> GenResult<R> {
        let saved = self.depth;
        self.depth += 1;
        let result = body(self);
        self.depth = saved;
        result
    }

    /// Emit `{`, the nested body, then `}` at the current depth.
    pub fn block<R>(
        &mut self,
        out: &mut String,
        body: impl FnOnce(&mut Self, &mut String) -> GenResult<R>,
    ) -> GenResult<R> {
        self.line(out, "{");
        let result = self.nested(|ctx| body(ctx, out))?;
        self.line(out, "}");
        Ok(result)
    }
}
