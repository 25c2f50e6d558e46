use uigen_core::ast::Expr;
use uigen_core::error::Error;
use uigen_core::span::Span;

/// Structural/argument error: wrong arity, wrong node kind at a required
/// position, or missing required chain scope.
pub fn structural_error(message: impl Into<String>, span: Span) -> Error {
    Error::Structural(span, message.into())
}

/// State error, e.g. `$first()` outside an active `$range` scope.
pub fn state_error(message: impl Into<String>) -> Error {
    Error::State(message.into())
}

/// Unsupported operator/operand-kind combination.
pub fn unsupported_op(message: impl Into<String>, span: Span) -> Error {
    Error::Unsupported(span, message.into())
}

/// Catch-all for node kinds neither resolver has a rule for.
pub fn unhandled_node(expr: &Expr) -> Error {
    Error::UnhandledNode {
        kind: expr.kind_name(),
        span: expr.span,
        text: expr.to_string(),
    }
}

/// Generator-authoring mistake caught at registration or dispatch time.
pub fn misconfigured(message: impl Into<String>) -> Error {
    Error::Misconfigured(message.into())
}

pub use uigen_core::ast::debug_expr as debug_node;

/// Macro to return early with a structural error
#[macro_export]
macro_rules! gen_bail {
    ($message:expr, $span:expr) => {
        return Err($crate::error::structural_error($message, $span))
    };
}

/// Macro to ensure a condition is true, or return a structural error
#[macro_export]
macro_rules! gen_ensure {
    ($cond:expr, $message:expr, $span:expr) => {
        if !($cond) {
            $crate::gen_bail!($message, $span);
        }
    };
}
