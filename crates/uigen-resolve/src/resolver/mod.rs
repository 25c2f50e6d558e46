//! The literal and variable resolvers: the two reduction operations that
//! turn a variable-bound expression tree into resolved output.

mod operators;

use crate::context::Context;
use crate::error::{debug_node, structural_error, unhandled_node};
use crate::methods::{MethodRegistry, Overload};
use uigen_core::ast::{
    Expr, ExprKind, ExprMethodCall, ExprName, ExprSys, ExprTemplate, Lit, TyExpr,
};
use uigen_core::ops::BinOp;
use uigen_core::Result;

/// Resolution toolset: owns the system-method registry and exposes the
/// resolver entry points. Shared (immutable) across a generation task; all
/// mutable state lives on the [`Context`].
pub struct Resolver {
    methods: MethodRegistry,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            methods: MethodRegistry::with_builtins(),
        }
    }

    pub fn with_registry(methods: MethodRegistry) -> Self {
        Self { methods }
    }

    pub fn methods(&self) -> &MethodRegistry {
        &self.methods
    }

    /// Extension point: expose an additional system method to dispatch.
    pub fn register(&mut self, name: impl Into<String>, overload: Overload) {
        self.methods.register(name, overload);
    }

    /// Reduces a node to an ordered, possibly-empty sequence of resolved
    /// literal strings. The fundamental reduction of the engine.
    pub fn resolve_to_literals(&self, ctx: &mut Context, expr: &Expr) -> Result<Vec<String>> {
        match &expr.kind {
            ExprKind::Enclosed(inner) => self.resolve_to_literals(ctx, inner),
            ExprKind::Lit(lit) => Ok(vec![lit.to_text()]),
            ExprKind::Template(t) => Ok(vec![self.resolve_template(ctx, &t.text)?]),
            ExprKind::MethodCall(call) => self.literals_for_call(ctx, call),
            ExprKind::Json(json) => {
                if json.is_array {
                    let mut out = Vec::new();
                    for value in json.values() {
                        out.extend(self.resolve_to_literals(ctx, value)?);
                    }
                    Ok(out)
                } else {
                    // map mode is the representation of method parameter
                    // lists; each value must name exactly one type
                    let mut out = Vec::new();
                    for pair in &json.pairs {
                        let resolved = self.resolve_var(ctx, &pair.value)?;
                        let types = self.resolve_to_literals(ctx, &resolved)?;
                        if types.len() != 1 {
                            return Err(structural_error(
                                format!(
                                    "parameter types using json notation must have values \
                                     which return exactly one type;\nyou sent {}\nwhich returned {:?}\nfrom {}",
                                    debug_node(&pair.value),
                                    types,
                                    debug_node(expr)
                                ),
                                pair.value.span,
                            ));
                        }
                        let key = pair.key.clone().unwrap_or_default();
                        let name = self.resolve_template(ctx, &key)?;
                        out.push(format!("{} {}", types[0], name));
                    }
                    Ok(out)
                }
            }
            ExprKind::Binary(_) => {
                let reduced = self.resolve_var(ctx, expr)?;
                self.resolve_to_literals(ctx, &reduced)
            }
            ExprKind::Conditional(c) => {
                let evaled = self.resolve_var(ctx, &c.condition)?;
                if self.is_condition_true(ctx, &evaled)? {
                    self.resolve_to_literals(ctx, &c.then_branch)
                } else {
                    self.resolve_to_literals(ctx, &c.else_branch)
                }
            }
            ExprKind::Name(n) => {
                if n.name.contains('$') {
                    Ok(vec![self.resolve_template(ctx, &n.name)?])
                } else {
                    Ok(vec![n.name.clone()])
                }
            }
            ExprKind::Qualified(q) => {
                let mut segments = q.segments.clone();
                if segments.last().map(String::as_str) == Some("class") {
                    segments.pop();
                }
                if segments.is_empty() {
                    return Err(unhandled_node(expr));
                }
                Ok(vec![self.resolve_template(ctx, &segments.join("."))?])
            }
            ExprKind::Type(t) => Ok(vec![self.resolve_template(ctx, &t.ty.to_string())?]),
            ExprKind::ClassLit(c) => Ok(vec![class_literal_text(expr, &c.ty)?]),
            ExprKind::ArrayInit(a) => {
                let mut out = Vec::new();
                for value in &a.values {
                    out.extend(self.resolve_to_literals(ctx, value)?);
                }
                Ok(out)
            }
            ExprKind::VarargBundle(bundle) => {
                let mut out = Vec::new();
                for item in &bundle.items {
                    out.extend(self.resolve_to_literals(ctx, item)?);
                }
                Ok(out)
            }
            ExprKind::ModelBound(m) => self.resolve_to_literals(ctx, &m.inner),
            ExprKind::Sys(_) => {
                let reduced = self.resolve_var(ctx, expr)?;
                self.resolve_to_literals(ctx, &reduced)
            }
            ExprKind::Lambda(_) => Err(unhandled_node(expr)),
        }
    }

    fn literals_for_call(&self, ctx: &mut Context, call: &ExprMethodCall) -> Result<Vec<String>> {
        if let Some(overload) = self.methods.find_method(call)? {
            let result = overload.invoke(self, ctx, call)?;
            if result.is_none() {
                uigen_core::warn!(name = %call.name, "system method produced no replacement; expect errors");
            } else {
                let mut out = Vec::new();
                for expr in result.into_exprs()? {
                    out.extend(self.resolve_to_literals(ctx, &expr)?);
                }
                return Ok(out);
            }
        }
        // No system method; serialize the call with resolved arguments and
        // resolve the result as a template string.
        let mut copy = call.clone();
        let args = std::mem::take(&mut copy.args);
        for arg in &args {
            let resolved = self.resolve_var(ctx, arg)?;
            if let ExprKind::VarargBundle(bundle) = &resolved.kind {
                for item in &bundle.items {
                    copy.args.push(self.resolve_var(ctx, item)?);
                }
            } else {
                copy.args.push(resolved);
            }
        }
        let source = Expr::new(ExprKind::MethodCall(copy)).to_string();
        Ok(vec![self.resolve_template(ctx, &source)?])
    }

    /// Requires exactly one literal from resolution.
    pub fn resolve_literal(&self, ctx: &mut Context, expr: &Expr) -> Result<String> {
        let literals = self.resolve_to_literals(ctx, expr)?;
        if literals.len() != 1 {
            return Err(structural_error(
                format!(
                    "expecting only a single literal result from {};\ninstead received: {:?}",
                    debug_node(expr),
                    literals
                ),
                expr.span,
            ));
        }
        Ok(literals.into_iter().next().unwrap_or_default())
    }

    /// Extracts a single string; fails unless resolution yields exactly one
    /// literal.
    pub fn resolve_string(&self, ctx: &mut Context, expr: &Expr) -> Result<String> {
        self.resolve_string_opt(ctx, expr, false)
    }

    /// As [`resolve_string`](Self::resolve_string), tolerating an empty
    /// result sequence by returning the empty string.
    pub fn resolve_string_or_empty(&self, ctx: &mut Context, expr: &Expr) -> Result<String> {
        self.resolve_string_opt(ctx, expr, true)
    }

    fn resolve_string_opt(
        &self,
        ctx: &mut Context,
        expr: &Expr,
        allow_empty: bool,
    ) -> Result<String> {
        let literals = self.resolve_to_literals(ctx, expr)?;
        if literals.len() != 1 {
            if allow_empty && literals.is_empty() {
                return Ok(String::new());
            }
            return Err(structural_error(
                format!(
                    "cannot extract a single String argument for {}\nthis node resulted in: {:?}",
                    debug_node(expr),
                    literals
                ),
                expr.span,
            ));
        }
        Ok(literals.into_iter().next().unwrap_or_default())
    }

    /// Substitutes `$name` placeholders in a template string, resolving each
    /// bound name through literal resolution (multiple results join with
    /// `", "`).
    pub fn resolve_template(&self, ctx: &mut Context, text: &str) -> Result<String> {
        ctx.resolve_template(text, |ctx, node| {
            Ok(self.resolve_to_literals(ctx, node)?.join(", "))
        })
    }

    /// Reduces a node toward a simpler, fully-evaluated node; returns the
    /// input unchanged when no reduction rule applies.
    pub fn resolve_var(&self, ctx: &mut Context, expr: &Expr) -> Result<Expr> {
        match &expr.kind {
            ExprKind::Enclosed(inner) => self.resolve_var(ctx, inner),
            ExprKind::Binary(b) => self.eval_binary(ctx, expr, b),
            ExprKind::Conditional(c) => {
                let cond = self.resolve_var(ctx, &c.condition)?;
                let Some(value) = cond.as_bool() else {
                    return Err(structural_error(
                        format!(
                            "conditional guard of {} did not evaluate to a boolean literal;\nreceived: {}",
                            debug_node(expr),
                            debug_node(&cond)
                        ),
                        c.condition.span,
                    ));
                };
                if value {
                    self.resolve_var(ctx, &c.then_branch)
                } else {
                    self.resolve_var(ctx, &c.else_branch)
                }
            }
            ExprKind::MethodCall(call) => {
                let Some(overload) = self.methods.find_method(call)? else {
                    return Ok(expr.clone());
                };
                let result = overload.invoke(self, ctx, call)?;
                if result.is_none() {
                    return Ok(expr.clone());
                }
                let mut exprs = result.into_exprs()?;
                match exprs.len() {
                    0 => Ok(expr.clone()),
                    1 => Ok(exprs.remove(0)),
                    // a multi-value result propagates through single-valued
                    // call sites as a vararg bundle
                    _ => Ok(Expr::vararg_bundle(exprs)),
                }
            }
            ExprKind::Sys(sys) => self.resolve_sys(ctx, sys),
            ExprKind::Name(n) => match ctx.lookup(&n.name) {
                Some(bound) => Ok(bound.clone()),
                None => Ok(expr.clone()),
            },
            ExprKind::ModelBound(m) => {
                let inner = self.resolve_var(ctx, &m.inner)?;
                Ok(Expr::model_bound(m.field.clone(), inner))
            }
            _ => Ok(expr.clone()),
        }
    }

    /// Visits a deferred sub-tree: installs its per-tick bindings and loop
    /// frame (scoped), resolves the body, then renames bound names and
    /// template placeholders inside the resolved result.
    fn resolve_sys(&self, ctx: &mut Context, sys: &ExprSys) -> Result<Expr> {
        let mut undos = Vec::with_capacity(sys.bindings.len());
        for (name, value) in &sys.bindings {
            undos.push(ctx.bind(name, value.clone()));
        }
        ctx.push_range_frame(sys.is_first);
        let result = self
            .resolve_var(ctx, &sys.body)
            .and_then(|resolved| self.apply_renames(ctx, resolved));
        ctx.pop_range_frame();
        for undo in undos.into_iter().rev() {
            undo.restore(ctx);
        }
        result
    }

    /// Secondary substitution pass over a resolved sub-tree: `$name` tokens
    /// embedded in names, template text, string values, and method-call
    /// names are replaced using the current bindings.
    fn apply_renames(&self, ctx: &mut Context, expr: Expr) -> Result<Expr> {
        let Expr { span, kind } = expr;
        let kind = match kind {
            ExprKind::Name(n) => ExprKind::Name(ExprName {
                name: self.resolve_template(ctx, &n.name)?,
            }),
            ExprKind::Lit(Lit::Str(s)) => ExprKind::Lit(Lit::Str(self.resolve_template(ctx, &s)?)),
            ExprKind::Template(t) => ExprKind::Template(ExprTemplate {
                text: self.resolve_template(ctx, &t.text)?,
            }),
            ExprKind::MethodCall(mut call) => {
                call.name = self.resolve_template(ctx, &call.name)?;
                if let Some(scope) = call.scope.take() {
                    call.scope = Some(Box::new(self.apply_renames(ctx, *scope)?));
                }
                call.args = call
                    .args
                    .into_iter()
                    .map(|arg| self.apply_renames(ctx, arg))
                    .collect::<Result<Vec<_>>>()?;
                ExprKind::MethodCall(call)
            }
            ExprKind::Binary(mut b) => {
                b.lhs = Box::new(self.apply_renames(ctx, *b.lhs)?);
                b.rhs = Box::new(self.apply_renames(ctx, *b.rhs)?);
                ExprKind::Binary(b)
            }
            ExprKind::Conditional(mut c) => {
                c.condition = Box::new(self.apply_renames(ctx, *c.condition)?);
                c.then_branch = Box::new(self.apply_renames(ctx, *c.then_branch)?);
                c.else_branch = Box::new(self.apply_renames(ctx, *c.else_branch)?);
                ExprKind::Conditional(c)
            }
            ExprKind::Json(mut json) => {
                for pair in &mut json.pairs {
                    let value = std::mem::replace(&mut pair.value, Expr::bool_lit(false));
                    pair.value = self.apply_renames(ctx, value)?;
                }
                ExprKind::Json(json)
            }
            ExprKind::ArrayInit(a) => ExprKind::ArrayInit(uigen_core::ast::ExprArrayInit {
                values: a
                    .values
                    .into_iter()
                    .map(|value| self.apply_renames(ctx, value))
                    .collect::<Result<Vec<_>>>()?,
            }),
            ExprKind::Enclosed(inner) => {
                ExprKind::Enclosed(Box::new(self.apply_renames(ctx, *inner)?))
            }
            ExprKind::VarargBundle(bundle) => {
                ExprKind::VarargBundle(uigen_core::ast::ExprVarargBundle {
                    items: bundle
                        .items
                        .into_iter()
                        .map(|item| self.apply_renames(ctx, item))
                        .collect::<Result<Vec<_>>>()?,
                })
            }
            // Deferred ticks from a nested range must see the enclosing
            // scope's names while it is still installed, or an outer `$i`
            // would survive as literal text in the inner bodies.
            ExprKind::Sys(mut sys) => {
                for (_, value) in &mut sys.bindings {
                    let bound = std::mem::replace(value, Expr::bool_lit(false));
                    *value = self.apply_renames(ctx, bound)?;
                }
                let body = std::mem::replace(&mut sys.body, Box::new(Expr::bool_lit(false)));
                sys.body = Box::new(self.apply_renames(ctx, *body)?);
                ExprKind::Sys(sys)
            }
            other => other,
        };
        Ok(Expr { span, kind })
    }

    /// Evaluates a condition node to a boolean, resolving operands to their
    /// textual form first (the loose comparison table used by `$if` guards).
    pub fn is_condition_true(&self, ctx: &mut Context, condition: &Expr) -> Result<bool> {
        match &condition.kind {
            ExprKind::Enclosed(inner) => self.is_condition_true(ctx, inner),
            ExprKind::Binary(b) => {
                let left = self.resolve_var(ctx, &b.lhs)?;
                let right = self.resolve_var(ctx, &b.rhs)?;
                let left_value = self.resolve_string(ctx, &left)?;
                let right_value = self.resolve_string(ctx, &right)?;
                match b.op {
                    BinOp::Eq => Ok(left_value == right_value),
                    BinOp::Ne => Ok(left_value != right_value),
                    BinOp::Lt => Ok(parse_number(&left_value, condition)?
                        < parse_number(&right_value, condition)?),
                    BinOp::Le => Ok(parse_number(&left_value, condition)?
                        <= parse_number(&right_value, condition)?),
                    BinOp::Gt => Ok(parse_number(&left_value, condition)?
                        > parse_number(&right_value, condition)?),
                    BinOp::Ge => Ok(parse_number(&left_value, condition)?
                        >= parse_number(&right_value, condition)?),
                    BinOp::And => Ok(parse_bool(&left_value) & parse_bool(&right_value)),
                    BinOp::Or => Ok(parse_bool(&left_value) | parse_bool(&right_value)),
                    BinOp::BitXor => Ok(parse_bool(&left_value) ^ parse_bool(&right_value)),
                    _ => Err(structural_error(
                        format!(
                            "unsupported binary operator in conditional expression; {}",
                            debug_node(condition)
                        ),
                        condition.span,
                    )),
                }
            }
            ExprKind::MethodCall(call) if call.name == "$if" || call.name == "$elseIf" => {
                let first = call.args.first().ok_or_else(|| {
                    structural_error(
                        format!("{} requires a condition argument; {}", call.name, debug_node(condition)),
                        condition.span,
                    )
                })?;
                self.is_condition_true(ctx, first)
            }
            ExprKind::MethodCall(_) => Err(structural_error(
                format!(
                    "cannot extract conditional truth from method call: {}",
                    debug_node(condition)
                ),
                condition.span,
            )),
            _ => Ok(self.resolve_string(ctx, condition)? == "true"),
        }
    }

    /// Int-extraction path: literal parse or named-variable lookup.
    pub fn resolve_int(&self, ctx: &mut Context, expr: &Expr) -> Result<i32> {
        let resolved = self.resolve_var(ctx, expr)?;
        match &resolved.kind {
            ExprKind::Lit(Lit::Int(i)) => return Ok(*i),
            ExprKind::Lit(Lit::Long(l)) => {
                if let Ok(i) = i32::try_from(*l) {
                    return Ok(i);
                }
            }
            ExprKind::Lit(Lit::Str(s)) => return parse_int(s, expr),
            ExprKind::Name(n) => {
                if let Some(bound) = ctx.lookup(&n.name).cloned() {
                    let text = self.resolve_string(ctx, &bound)?;
                    return parse_int(&text, expr);
                }
            }
            ExprKind::Template(_) => {
                let text = self.resolve_string(ctx, &resolved)?;
                return parse_int(&text, expr);
            }
            _ => {}
        }
        let mut message = format!("cannot extract int from {}", debug_node(expr));
        if resolved != *expr {
            message.push_str(&format!("; resolved to: {}", debug_node(&resolved)));
        }
        Err(structural_error(message, expr.span))
    }

    /// Chases name and template indirection: an operand that is itself a
    /// bound variable name is looked up before being reduced.
    pub(crate) fn lookup_node(&self, ctx: &mut Context, expr: &Expr) -> Result<Expr> {
        match &expr.kind {
            ExprKind::Name(n) => {
                if let Some(found) = ctx.lookup(&n.name).cloned() {
                    if found == *expr {
                        return Ok(found);
                    }
                    return self.lookup_node(ctx, &found);
                }
            }
            ExprKind::Template(t) => {
                let key = self.resolve_template(ctx, &t.text)?;
                if let Some(found) = ctx.lookup(&key).cloned() {
                    if found == *expr {
                        return Ok(found);
                    }
                    return self.lookup_node(ctx, &found);
                }
            }
            _ => {}
        }
        Ok(expr.clone())
    }
}

fn class_literal_text(expr: &Expr, ty: &TyExpr) -> Result<String> {
    match ty {
        TyExpr::Void => Ok("void".to_owned()),
        TyExpr::Primitive(p) => Ok(p.name().to_owned()),
        TyExpr::Named {
            name, array_dims, ..
        } => Ok(format!("{}{}", name, "[]".repeat(*array_dims))),
        TyExpr::Wildcard { .. } => Err(structural_error(
            format!("unhandled class literal type {} from {}", ty, debug_node(expr)),
            expr.span,
        )),
    }
}

fn parse_number(value: &str, node: &Expr) -> Result<f64> {
    value.trim().parse::<f64>().map_err(|_| {
        structural_error(
            format!("cannot parse number from '{}' in {}", value, debug_node(node)),
            node.span,
        )
    })
}

// Java Boolean.parseBoolean semantics: "true" (case-insensitive) or false.
fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

fn parse_int(value: &str, node: &Expr) -> Result<i32> {
    value.trim().parse::<i32>().map_err(|_| {
        structural_error(
            format!("cannot parse int from '{}' in {}", value, debug_node(node)),
            node.span,
        )
    })
}
