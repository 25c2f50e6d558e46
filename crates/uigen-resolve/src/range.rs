//! Lazy loop expansion for `$range`: each surviving tick becomes a deferred
//! sub-tree carrying its own binding and first-of-range flag, resolved only
//! when the caller visits it.

use uigen_core::ast::{Expr, ExprLambda};
use uigen_core::Result;

use crate::context::Context;
use crate::error::{debug_node, structural_error};
use crate::resolver::Resolver;

/// Expands an inclusive `start..=end` range over a single-parameter lambda
/// body. An optional filter lambda is evaluated eagerly per tick, with the
/// loop variable bound and the tick's frame in place, so `$first()` works
/// inside filters; ticks it rejects are skipped entirely, and the
/// first *surviving* tick is the one marked first-of-range. The body is not
/// resolved here; each emitted node defers it.
pub fn expand_range(
    tools: &Resolver,
    ctx: &mut Context,
    start: i32,
    end: i32,
    filter: Option<&Expr>,
    body: &Expr,
) -> Result<Vec<Expr>> {
    let lambda = require_lambda(body, "$range bodies")?;
    let var_name = &lambda.params[0];
    let filter = filter
        .map(|f| require_lambda(f, "$range filters"))
        .transpose()?;

    let mut out = Vec::new();
    let mut first = true;
    for n in start..=end {
        if let Some(filter) = filter {
            // filters run inside the tick's frame, so `$first()` is legal
            // there; it reads true until some tick has survived
            ctx.push_range_frame(first);
            let keep = ctx.with_binding(&filter.params[0], Expr::int(n), |ctx| {
                tools.is_condition_true(ctx, &filter.body)
            });
            ctx.pop_range_frame();
            if !keep? {
                continue;
            }
        }
        out.push(Expr::sys(
            vec![(var_name.clone(), Expr::int(n))],
            first,
            (*lambda.body).clone(),
        ));
        first = false;
    }
    Ok(out)
}

fn require_lambda<'a>(expr: &'a Expr, what: &str) -> Result<&'a ExprLambda> {
    let lambda = expr.as_lambda().ok_or_else(|| {
        structural_error(
            format!("{} must be lambdas; you sent {}", what, debug_node(expr)),
            expr.span,
        )
    })?;
    if lambda.params.len() != 1 {
        return Err(structural_error(
            format!(
                "{} must take exactly one argument; you sent {}",
                what,
                debug_node(expr)
            ),
            expr.span,
        ));
    }
    Ok(lambda)
}
