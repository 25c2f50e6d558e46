//! The standard system methods: control flow (`$if`/`$else`), loop
//! expansion (`$range`/`$first`), text rewriting (`$replace`/`$remove`,
//! `$print`) and type construction (`$type`/`$generic`).

use regex::Regex;

use uigen_core::ast::{Expr, ExprMethodCall, PrimitiveTy, TyExpr, WildcardBound};
use uigen_core::span::Span;
use uigen_core::Result;

use crate::context::Context;
use crate::error::{debug_node, misconfigured, structural_error};
use crate::gen_ensure;
use crate::methods::{MethodRegistry, MethodValue, Overload, ParamKind};
use crate::range::expand_range;
use crate::resolver::Resolver;

use ParamKind::{
    InjectedCallSite, InjectedContext, InjectedTools, PrimitiveInt, RawNode, Varargs,
};

pub(super) fn register_all(registry: &mut MethodRegistry) {
    registry.register(
        "$first",
        Overload::new(vec![InjectedContext], |_tools, ctx, _call, _args| {
            ctx.is_first_of_range().map(MethodValue::Bool)
        }),
    );

    registry.register(
        "$print",
        Overload::new(
            vec![InjectedTools, InjectedContext, RawNode],
            |tools, ctx, _call, args| {
                let resolved = tools.resolve_var(ctx, args[0].node()?)?;
                Ok(MethodValue::Node(Expr::template(resolved.to_string())))
            },
        ),
    );

    registry.register(
        "$if",
        Overload::new(
            vec![InjectedTools, InjectedContext, RawNode, RawNode],
            |tools, ctx, _call, args| {
                let condition = tools.resolve_var(ctx, args[0].node()?)?;
                if tools.is_condition_true(ctx, &condition)? {
                    Ok(MethodValue::Node(tools.resolve_var(ctx, args[1].node()?)?))
                } else {
                    Ok(MethodValue::None)
                }
            },
        ),
    );

    registry.register(
        "$else",
        Overload::new(
            vec![InjectedTools, InjectedContext, InjectedCallSite, RawNode],
            |tools, ctx, call, args| {
                let if_call = chained_if(call)?;
                let condition = tools.resolve_var(ctx, &if_call.args[0])?;
                if tools.is_condition_true(ctx, &condition)? {
                    Ok(MethodValue::Node(
                        tools.resolve_var(ctx, &if_call.args[1])?,
                    ))
                } else {
                    Ok(MethodValue::Node(tools.resolve_var(ctx, args[0].node()?)?))
                }
            },
        ),
    );

    registry.register(
        "$range",
        Overload::new(
            vec![InjectedTools, InjectedContext, PrimitiveInt, RawNode],
            |tools, ctx, _call, args| {
                let end = args[0].int()?;
                expand_range(tools, ctx, 1, end, None, args[1].node()?).map(MethodValue::Nodes)
            },
        ),
    );
    registry.register(
        "$range",
        Overload::new(
            vec![InjectedTools, InjectedContext, PrimitiveInt, PrimitiveInt, RawNode],
            |tools, ctx, _call, args| {
                let start = args[0].int()?;
                let end = args[1].int()?;
                expand_range(tools, ctx, start, end, None, args[2].node()?).map(MethodValue::Nodes)
            },
        ),
    );
    registry.register(
        "$range",
        Overload::new(
            vec![
                InjectedTools,
                InjectedContext,
                PrimitiveInt,
                PrimitiveInt,
                RawNode,
                RawNode,
            ],
            |tools, ctx, _call, args| {
                let start = args[0].int()?;
                let end = args[1].int()?;
                expand_range(
                    tools,
                    ctx,
                    start,
                    end,
                    Some(args[2].node()?),
                    args[3].node()?,
                )
                .map(MethodValue::Nodes)
            },
        ),
    );

    registry.register(
        "$replace",
        Overload::new(
            vec![InjectedTools, InjectedContext, InjectedCallSite, RawNode, RawNode],
            |tools, ctx, call, args| {
                let replacement = tools.resolve_string(ctx, args[1].node()?)?;
                rewrite_chained(tools, ctx, call, args[0].node()?, &replacement)
            },
        ),
    );
    registry.register(
        "$remove",
        Overload::new(
            vec![InjectedTools, InjectedContext, InjectedCallSite, RawNode],
            |tools, ctx, call, args| rewrite_chained(tools, ctx, call, args[0].node()?, ""),
        ),
    );

    registry.register(
        "$type",
        Overload::new(
            vec![InjectedTools, InjectedContext, RawNode, Varargs],
            |tools, ctx, _call, args| {
                let ty = build_type(tools, ctx, args[0].node()?, args[1].nodes()?)?;
                Ok(MethodValue::Node(Expr::type_expr(ty)))
            },
        ),
    );

    registry.register(
        "$generic",
        Overload::new(
            vec![InjectedTools, InjectedContext, InjectedCallSite, Varargs],
            |tools, ctx, call, args| {
                let Some(scope) = call.scope.as_deref() else {
                    return Err(misconfigured(
                        ".$generic() must be used with a scope, like Type.class.$generic(`T$n`)"
                            .to_owned(),
                    ));
                };
                let resolved_scope = tools.resolve_var(ctx, scope)?;
                let name = tools.resolve_string(ctx, &resolved_scope)?;
                let mut generics = Vec::new();
                for arg in args[0].nodes()? {
                    generics.push(build_type(tools, ctx, arg, &[])?);
                }
                Ok(MethodValue::Node(Expr::type_expr(TyExpr::Named {
                    name,
                    generics,
                    array_dims: 0,
                })))
            },
        ),
    );
}

/// `$else` only makes sense chained onto an `$if`-shaped call; anything
/// else is a structural error, as is an `$if` scope missing its branches.
fn chained_if(call: &ExprMethodCall) -> Result<&ExprMethodCall> {
    let Some(scope) = call.scope.as_deref() else {
        return Err(structural_error(
            "a .$else() call must be chained after an $if(); found no scope".to_owned(),
            Span::ZERO,
        ));
    };
    let Some(if_call) = scope.as_method_call() else {
        return Err(structural_error(
            format!(
                "a .$else() call must be chained after an $if(); found {}",
                debug_node(scope)
            ),
            scope.span,
        ));
    };
    gen_ensure!(
        if_call.name == "$if" || if_call.name == "$elseIf",
        format!(
            "a .$else() call must be chained after an $if(); found {}",
            debug_node(scope)
        ),
        scope.span
    );
    gen_ensure!(
        if_call.args.len() >= 2,
        format!(
            "the $if() before a .$else() must have a condition and a body; found {}",
            debug_node(scope)
        ),
        scope.span
    );
    Ok(if_call)
}

/// Dispatches the chained scope call, then rewrites every resulting value
/// by replacing all matches of the pattern (a regex) with the replacement.
fn rewrite_chained(
    tools: &Resolver,
    ctx: &mut Context,
    call: &ExprMethodCall,
    pattern: &Expr,
    replacement: &str,
) -> Result<MethodValue> {
    let Some(scope) = call.scope.as_deref() else {
        return Err(structural_error(
            format!(
                "a text-rewriting call must be chained after another method call; \
                 found no scope with pattern {}",
                debug_node(pattern)
            ),
            pattern.span,
        ));
    };
    let Some(scope_call) = scope.as_method_call() else {
        return Err(structural_error(
            format!(
                "a text-rewriting call must be chained after a method call; found {}",
                debug_node(scope)
            ),
            scope.span,
        ));
    };
    let Some(overload) = tools.methods().find_method(scope_call)? else {
        return Err(structural_error(
            format!("no such method to rewrite: {}", debug_node(scope)),
            scope.span,
        ));
    };
    let produced = overload.invoke(tools, ctx, scope_call)?.into_exprs()?;

    let resolved_pattern = tools.resolve_var(ctx, pattern)?;
    let source = tools.resolve_string(ctx, &resolved_pattern)?;
    let regex = Regex::new(&source).map_err(|e| {
        structural_error(
            format!("invalid pattern '{}' from {}: {}", source, debug_node(pattern), e),
            pattern.span,
        )
    })?;

    let mut out = Vec::with_capacity(produced.len());
    for expr in produced {
        let resolved = tools.resolve_var(ctx, &expr)?;
        let text = tools.resolve_string(ctx, &resolved)?;
        out.push(Expr::template(regex.replace_all(&text, replacement).into_owned()));
    }
    Ok(MethodValue::Nodes(out))
}

/// Builds a type reference from a name node plus generic-argument nodes.
/// Handles `.class` suffixes, the eight primitive names, and `?` wildcards
/// (where a leading `super` argument flips the bound).
pub(crate) fn build_type(
    tools: &Resolver,
    ctx: &mut Context,
    name: &Expr,
    generics: &[Expr],
) -> Result<TyExpr> {
    let mut named = tools.resolve_string_or_empty(ctx, name)?;
    if let Some(stripped) = named.strip_suffix(".class") {
        named = stripped.to_owned();
    }

    // generic arguments resolving to empty text are dropped, so templates
    // can emit conditionally-parameterized types
    let mut refs = Vec::new();
    for generic in generics {
        let resolved = tools.resolve_var(ctx, generic)?;
        let text = tools.resolve_string_or_empty(ctx, &resolved)?;
        if !text.is_empty() {
            refs.push(build_type(tools, ctx, &resolved, &[])?);
        }
    }

    if named == "?" {
        if !refs.is_empty() && refs[0].simple_name() == Some("super") {
            refs.remove(0);
            if refs.len() != 1 {
                return Err(misconfigured(format!(
                    "a `? super` wildcard takes exactly one bound; you sent {:?} from {}",
                    refs,
                    debug_node(name)
                )));
            }
            let bound = refs.remove(0);
            return Ok(TyExpr::Wildcard {
                bound: Some((WildcardBound::Super, Box::new(bound))),
            });
        }
        if refs.len() > 1 {
            return Err(misconfigured(format!(
                "a wildcard cannot extend more than one type; you sent {:?} from {}",
                refs,
                debug_node(name)
            )));
        }
        let bound = refs
            .pop()
            .map(|ty| (WildcardBound::Extends, Box::new(ty)));
        return Ok(TyExpr::Wildcard { bound });
    }

    if let Some(primitive) = PrimitiveTy::from_name(&named) {
        if !refs.is_empty() {
            return Err(misconfigured(format!(
                "primitive type {} cannot take type arguments; you sent {:?} from {}",
                named,
                refs,
                debug_node(name)
            )));
        }
        return Ok(TyExpr::Primitive(primitive));
    }

    Ok(TyExpr::Named {
        name: named,
        generics: refs,
        array_dims: 0,
    })
}
