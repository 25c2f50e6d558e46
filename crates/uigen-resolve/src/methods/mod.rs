//! Method dispatch for `$`-prefixed system methods.
//!
//! Dispatch is an explicit registry: method name maps to an ordered
//! overload list built when the registry is constructed, and each overload
//! declares its parameter slots as [`ParamKind`] values adapted by match.

mod builtins;

use std::collections::HashMap;
use std::sync::Arc;

use itertools::Itertools;

use crate::context::Context;
use crate::error::{debug_node, misconfigured, structural_error};
use crate::resolver::Resolver;
use uigen_core::ast::{Expr, ExprKind, ExprMethodCall};
use uigen_core::Result;

/// Classification of one declared parameter slot. Injected slots are
/// supplied by the engine; the rest adapt one call-site argument each, with
/// `Varargs` consuming the remaining tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    InjectedContext,
    InjectedTools,
    InjectedCallSite,
    /// The raw AST node, unresolved.
    RawNode,
    /// Literal-resolved to a single string.
    StringText,
    /// Int-extraction path: literal parse or named-variable lookup.
    PrimitiveInt,
    /// Reduced through the variable resolver first.
    ResolvedNode,
    /// Remaining arguments gathered into one bundle, splicing any
    /// previously-produced vararg bundles flat.
    Varargs,
}

impl ParamKind {
    fn is_injected(&self) -> bool {
        matches!(
            self,
            ParamKind::InjectedContext | ParamKind::InjectedTools | ParamKind::InjectedCallSite
        )
    }
}

/// An adapted call argument, ready to hand to a bound method.
#[derive(Debug, Clone)]
pub enum ArgValue {
    Node(Expr),
    Nodes(Vec<Expr>),
    Str(String),
    Int(i32),
}

impl ArgValue {
    pub fn node(&self) -> Result<&Expr> {
        match self {
            ArgValue::Node(expr) => Ok(expr),
            other => Err(misconfigured(format!(
                "expected a node argument, found {:?}",
                other
            ))),
        }
    }

    pub fn nodes(&self) -> Result<&[Expr]> {
        match self {
            ArgValue::Nodes(exprs) => Ok(exprs),
            other => Err(misconfigured(format!(
                "expected a vararg bundle argument, found {:?}",
                other
            ))),
        }
    }

    pub fn text(&self) -> Result<&str> {
        match self {
            ArgValue::Str(s) => Ok(s),
            other => Err(misconfigured(format!(
                "expected a string argument, found {:?}",
                other
            ))),
        }
    }

    pub fn int(&self) -> Result<i32> {
        match self {
            ArgValue::Int(i) => Ok(*i),
            other => Err(misconfigured(format!(
                "expected an int argument, found {:?}",
                other
            ))),
        }
    }
}

/// The outcome of invoking a dispatched method: a replacement node (or
/// several, to be spliced), a raw value to box back into literal form, or
/// no replacement at all.
#[derive(Debug, Clone)]
pub enum MethodValue {
    /// No replacement; the caller keeps the original call node.
    None,
    Node(Expr),
    /// Multiple result expressions, spliced as a multi-value result.
    Nodes(Vec<Expr>),
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Str(String),
    /// A raw list boxes into a single JSON-array container, recursively.
    List(Vec<MethodValue>),
}

impl MethodValue {
    pub fn is_none(&self) -> bool {
        matches!(self, MethodValue::None)
    }

    /// Boxes the value into expression form: `None` becomes the empty
    /// sequence, nodes pass through, raw values become literals, raw lists
    /// become one JSON-array node.
    pub fn into_exprs(self) -> Result<Vec<Expr>> {
        Ok(match self {
            MethodValue::None => Vec::new(),
            MethodValue::Node(expr) => vec![expr],
            MethodValue::Nodes(exprs) => exprs,
            other => vec![box_value(other)?],
        })
    }
}

fn box_value(value: MethodValue) -> Result<Expr> {
    Ok(match value {
        MethodValue::Bool(b) => Expr::bool_lit(b),
        MethodValue::Int(i) => Expr::int(i),
        MethodValue::Long(l) => Expr::long(l),
        MethodValue::Double(d) => Expr::double(d),
        MethodValue::Str(s) => Expr::string(s),
        MethodValue::Node(expr) => expr,
        MethodValue::List(items) => Expr::json_array(
            items
                .into_iter()
                .map(box_value)
                .collect::<Result<Vec<_>>>()?,
        ),
        other => {
            return Err(misconfigured(format!(
                "unable to box method result {:?}",
                other
            )))
        }
    })
}

type MethodFn =
    Arc<dyn Fn(&Resolver, &mut Context, &ExprMethodCall, &[ArgValue]) -> Result<MethodValue> + Send + Sync>;

/// One registered overload: its parameter-slot classification plus the bound
/// invocation closure. The closure receives only the adapted ordinary
/// arguments; injected slots arrive through the closure's own parameters.
#[derive(Clone)]
pub struct Overload {
    params: Vec<ParamKind>,
    func: MethodFn,
}

impl Overload {
    /// Declares an overload. Slot misdeclarations are generator-authoring
    /// errors and fail at registration, not per call.
    pub fn new(
        params: Vec<ParamKind>,
        func: impl Fn(&Resolver, &mut Context, &ExprMethodCall, &[ArgValue]) -> Result<MethodValue>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        for injected in [
            ParamKind::InjectedContext,
            ParamKind::InjectedTools,
            ParamKind::InjectedCallSite,
        ] {
            assert!(
                params.iter().filter(|p| **p == injected).count() <= 1,
                "overloads may declare {:?} at most once; you sent {:?}",
                injected,
                params
            );
        }
        let varargs = params.iter().filter(|p| **p == ParamKind::Varargs).count();
        assert!(
            varargs == 0 || (varargs == 1 && params.last() == Some(&ParamKind::Varargs)),
            "Varargs must be the final parameter slot; you sent {:?}",
            params
        );
        Self {
            params,
            func: Arc::new(func),
        }
    }

    fn ordinary_len(&self) -> usize {
        self.params.iter().filter(|p| !p.is_injected()).count()
    }

    fn is_variadic(&self) -> bool {
        self.params.last() == Some(&ParamKind::Varargs)
    }

    fn matches_arity(&self, argc: usize) -> bool {
        if self.is_variadic() {
            argc + 1 >= self.ordinary_len()
        } else {
            self.ordinary_len() == argc
        }
    }

    /// Adapts the call's arguments and invokes the bound method.
    pub fn invoke(
        &self,
        tools: &Resolver,
        ctx: &mut Context,
        call: &ExprMethodCall,
    ) -> Result<MethodValue> {
        let args = self.adapt_args(tools, ctx, call)?;
        (self.func)(tools, ctx, call, &args)
    }

    fn adapt_args(
        &self,
        tools: &Resolver,
        ctx: &mut Context,
        call: &ExprMethodCall,
    ) -> Result<Vec<ArgValue>> {
        if !self.matches_arity(call.args.len()) {
            return Err(structural_error(
                format!(
                    "argument mismatch: overload takes {} argument(s), call supplies {}: {}",
                    self.ordinary_len(),
                    call.args.len(),
                    debug_node(&Expr::new(ExprKind::MethodCall(call.clone()))),
                ),
                call_span(call),
            ));
        }
        let mut out = Vec::with_capacity(self.ordinary_len());
        let mut ast_index = 0usize;
        for kind in &self.params {
            match kind {
                ParamKind::InjectedContext
                | ParamKind::InjectedTools
                | ParamKind::InjectedCallSite => continue,
                ParamKind::RawNode => {
                    out.push(ArgValue::Node(call.args[ast_index].clone()));
                    ast_index += 1;
                }
                ParamKind::StringText => {
                    out.push(ArgValue::Str(
                        tools.resolve_string(ctx, &call.args[ast_index])?,
                    ));
                    ast_index += 1;
                }
                ParamKind::PrimitiveInt => {
                    out.push(ArgValue::Int(tools.resolve_int(ctx, &call.args[ast_index])?));
                    ast_index += 1;
                }
                ParamKind::ResolvedNode => {
                    out.push(ArgValue::Node(tools.resolve_var(ctx, &call.args[ast_index])?));
                    ast_index += 1;
                }
                ParamKind::Varargs => {
                    let mut items = Vec::new();
                    while ast_index < call.args.len() {
                        let resolved = tools.resolve_var(ctx, &call.args[ast_index])?;
                        // a prior vararg bundle splices flat, never nests
                        if let ExprKind::VarargBundle(bundle) = &resolved.kind {
                            for item in &bundle.items {
                                items.push(tools.resolve_var(ctx, item)?);
                            }
                        } else {
                            items.push(resolved);
                        }
                        ast_index += 1;
                    }
                    out.push(ArgValue::Nodes(items));
                }
            }
        }
        Ok(out)
    }
}

fn call_span(call: &ExprMethodCall) -> uigen_core::span::Span {
    call.args
        .first()
        .map(|arg| arg.span)
        .unwrap_or(uigen_core::span::Span::ZERO)
}

/// Name-keyed overload table. Built-ins and user/component methods share the
/// same dispatch path; registration order is the tie-break between viable
/// overloads (first registered wins, keeping output deterministic).
#[derive(Clone, Default)]
pub struct MethodRegistry {
    methods: HashMap<String, Vec<Overload>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with all standard system methods.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtins::register_all(&mut registry);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, overload: Overload) {
        self.methods.entry(name.into()).or_default().push(overload);
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Finds the overload for a call. A name with no registration at all is
    /// not an error (the caller falls back to template serialization), but a
    /// registered name with no arity-matching overload is an argument
    /// mismatch, never a silent truncation.
    pub fn find_method(&self, call: &ExprMethodCall) -> Result<Option<&Overload>> {
        let Some(overloads) = self.methods.get(&call.name) else {
            return Ok(None);
        };
        let argc = call.args.len();
        match overloads.iter().find(|o| o.matches_arity(argc)) {
            Some(overload) => Ok(Some(overload)),
            None => Err(structural_error(
                format!(
                    "no overload of {} accepts {} argument(s) (registered arities: {}): {}",
                    call.name,
                    argc,
                    overloads.iter().map(|o| o.ordinary_len()).join(", "),
                    debug_node(&Expr::new(ExprKind::MethodCall(call.clone()))),
                ),
                call_span(call),
            )),
        }
    }
}

pub(crate) use builtins::build_type;
