use std::collections::HashMap;

use crate::error::state_error;
use uigen_core::ast::Expr;
use uigen_core::Result;

/// Loop-state record for one active `$range` scope. Frames stack, so nested
/// ranges cannot corrupt each other's first-iteration flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeFrame {
    pub is_first: bool,
}

/// Restores the exact prior state of one variable binding. Every `bind`
/// call site must run the undo on all exits, including error paths; prefer
/// [`Context::with_binding`] which guarantees it.
#[must_use = "undo must run or the binding leaks into the outer scope"]
pub struct Undo {
    name: String,
    prior: Option<Expr>,
}

impl Undo {
    pub fn restore(self, ctx: &mut Context) {
        match self.prior {
            Some(prior) => {
                ctx.vars.insert(self.name, prior);
            }
            None => {
                ctx.vars.remove(&self.name);
            }
        }
    }
}

/// An in-progress generated source file, registered on the [`Context`] in
/// declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceUnit {
    pub qualified_name: String,
    pub lines: Vec<String>,
}

impl SourceUnit {
    fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            lines: Vec::new(),
        }
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }
}

/// The scoped variable-binding and loop-state container threaded through all
/// resolution calls. Not designed for concurrent access; each top-level
/// generation task owns its own Context.
#[derive(Default)]
pub struct Context {
    vars: HashMap<String, Expr>,
    range_frames: Vec<RangeFrame>,
    units: Vec<SourceUnit>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical variable name: the leading `$` is stripped, so `$n` and `n`
    /// address the same binding.
    fn canonical(name: &str) -> &str {
        name.strip_prefix('$').unwrap_or(name)
    }

    /// Installs a binding, returning the action that restores prior state.
    /// Overwriting a different existing binding is logged, not fatal.
    pub fn bind(&mut self, name: &str, expr: Expr) -> Undo {
        let key = Self::canonical(name).to_owned();
        if let Some(old) = self.vars.get(&key) {
            if *old != expr {
                uigen_core::warn!(name = %key, "overwriting existing binding");
            }
        }
        let prior = self.vars.insert(key.clone(), expr);
        Undo { name: key, prior }
    }

    /// Scoped binding: runs `f` with the binding installed and restores the
    /// prior state on both success and error.
    pub fn with_binding<R>(
        &mut self,
        name: &str,
        expr: Expr,
        f: impl FnOnce(&mut Context) -> Result<R>,
    ) -> Result<R> {
        let undo = self.bind(name, expr);
        let out = f(self);
        undo.restore(self);
        out
    }

    pub fn lookup(&self, name: &str) -> Option<&Expr> {
        self.vars.get(Self::canonical(name))
    }

    pub fn has(&self, name: &str) -> bool {
        self.vars.contains_key(Self::canonical(name))
    }

    pub fn push_range_frame(&mut self, is_first: bool) {
        self.range_frames.push(RangeFrame { is_first });
    }

    pub fn pop_range_frame(&mut self) -> Option<RangeFrame> {
        self.range_frames.pop()
    }

    pub fn in_range(&self) -> bool {
        !self.range_frames.is_empty()
    }

    /// Whether the innermost active range is on its first surviving tick.
    /// Querying outside any range scope is a programmer error.
    pub fn is_first_of_range(&self) -> Result<bool> {
        self.range_frames
            .last()
            .map(|frame| frame.is_first)
            .ok_or_else(|| state_error("$first() used outside of an active $range scope"))
    }

    /// Substitutes `$name` tokens in a template string. Each bound name is
    /// evaluated lazily through the mapper; unbound tokens and plain text
    /// pass through unchanged.
    pub fn resolve_template(
        &mut self,
        text: &str,
        mut mapper: impl FnMut(&mut Context, &Expr) -> Result<String>,
    ) -> Result<String> {
        let mut out = String::with_capacity(text.len());
        let mut chars = text.char_indices().peekable();
        while let Some((start, ch)) = chars.next() {
            if ch != '$' {
                out.push(ch);
                continue;
            }
            let mut end = start + ch.len_utf8();
            while let Some(&(i, c)) = chars.peek() {
                if c.is_alphanumeric() || c == '_' {
                    end = i + c.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let token = &text[start..end];
            if token.len() > 1 && self.has(token) {
                let node = self
                    .lookup(token)
                    .cloned()
                    .unwrap_or_else(|| Expr::template(token));
                out.push_str(&mapper(self, &node)?);
            } else {
                out.push_str(token);
            }
        }
        Ok(out)
    }

    /// The in-progress generated file for `qualified_name`, created on first
    /// use; units keep their declaration order.
    pub fn source_unit(&mut self, qualified_name: &str) -> &mut SourceUnit {
        if let Some(pos) = self
            .units
            .iter()
            .position(|unit| unit.qualified_name == qualified_name)
        {
            return &mut self.units[pos];
        }
        let idx = self.units.len();
        self.units.push(SourceUnit::new(qualified_name));
        &mut self.units[idx]
    }

    /// Drains the generated units, preserving declaration order.
    pub fn take_units(&mut self) -> Vec<SourceUnit> {
        std::mem::take(&mut self.units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_and_undo_restore_prior_state() {
        let mut ctx = Context::new();
        let undo = ctx.bind("$n", Expr::int(1));
        assert_eq!(ctx.lookup("n"), Some(&Expr::int(1)));
        undo.restore(&mut ctx);
        assert!(!ctx.has("$n"));

        let _ = ctx.bind("n", Expr::int(1));
        let undo = ctx.bind("$n", Expr::int(2));
        assert_eq!(ctx.lookup("$n"), Some(&Expr::int(2)));
        undo.restore(&mut ctx);
        assert_eq!(ctx.lookup("$n"), Some(&Expr::int(1)));
    }

    #[test]
    fn with_binding_restores_on_error() {
        let mut ctx = Context::new();
        let result: Result<()> = ctx.with_binding("$x", Expr::int(5), |_| {
            Err(state_error("boom"))
        });
        assert!(result.is_err());
        assert!(!ctx.has("$x"));
    }

    #[test]
    fn first_of_range_outside_range_is_a_state_error() {
        let ctx = Context::new();
        assert!(ctx.is_first_of_range().is_err());
    }

    #[test]
    fn nested_range_frames_do_not_clobber_each_other() {
        let mut ctx = Context::new();
        ctx.push_range_frame(true);
        ctx.push_range_frame(false);
        assert_eq!(ctx.is_first_of_range().unwrap(), false);
        ctx.pop_range_frame();
        assert_eq!(ctx.is_first_of_range().unwrap(), true);
        ctx.pop_range_frame();
        assert!(!ctx.in_range());
    }

    #[test]
    fn source_units_keep_declaration_order() {
        let mut ctx = Context::new();
        ctx.source_unit("com.acme.Beta").push_line("b");
        ctx.source_unit("com.acme.Alpha").push_line("a");
        ctx.source_unit("com.acme.Beta").push_line("bb");
        let units = ctx.take_units();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].qualified_name, "com.acme.Beta");
        assert_eq!(units[0].lines, vec!["b", "bb"]);
        assert_eq!(units[1].qualified_name, "com.acme.Alpha");
    }
}
