use crate::ast::{Expr, ExprKind, Lit};
use std::fmt::{Display, Formatter, Write};

/// Renders a node back into template source form. Template literals print
/// their raw text (the form expected by template re-resolution); string
/// literals keep their quotes.
impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ExprKind::Lit(Lit::Str(s)) => write!(f, "\"{}\"", escape_str(s)),
            ExprKind::Lit(Lit::Char(c)) => write!(f, "'{}'", c),
            ExprKind::Lit(lit) => f.write_str(&lit.to_text()),
            ExprKind::Name(n) => f.write_str(&n.name),
            ExprKind::Qualified(q) => f.write_str(&q.segments.join(".")),
            ExprKind::Binary(b) => write!(f, "{} {} {}", b.lhs, b.op, b.rhs),
            ExprKind::Conditional(c) => {
                write!(f, "{} ? {} : {}", c.condition, c.then_branch, c.else_branch)
            }
            ExprKind::MethodCall(call) => {
                if let Some(scope) = &call.scope {
                    write!(f, "{}.", scope)?;
                }
                f.write_str(&call.name)?;
                f.write_char('(')?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    Display::fmt(arg, f)?;
                }
                f.write_char(')')
            }
            ExprKind::Template(t) => f.write_str(&t.text),
            ExprKind::Json(json) => {
                let (open, close) = if json.is_array { ("[", "]") } else { ("{", "}") };
                f.write_str(open)?;
                for (i, pair) in json.pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if let Some(key) = &pair.key {
                        write!(f, "{}: ", key)?;
                    }
                    Display::fmt(&pair.value, f)?;
                }
                f.write_str(close)
            }
            ExprKind::Type(t) => Display::fmt(&t.ty, f),
            ExprKind::ClassLit(c) => write!(f, "{}.class", c.ty),
            ExprKind::ArrayInit(a) => {
                f.write_char('{')?;
                for (i, value) in a.values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    Display::fmt(value, f)?;
                }
                f.write_char('}')
            }
            ExprKind::Lambda(lambda) => {
                if lambda.params.len() == 1 {
                    write!(f, "{} -> {}", lambda.params[0], lambda.body)
                } else {
                    write!(f, "({}) -> {}", lambda.params.join(", "), lambda.body)
                }
            }
            ExprKind::Enclosed(inner) => write!(f, "({})", inner),
            ExprKind::Sys(sys) => Display::fmt(&sys.body, f),
            ExprKind::VarargBundle(bundle) => {
                f.write_char('[')?;
                for (i, item) in bundle.items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    Display::fmt(item, f)?;
                }
                f.write_char(']')
            }
            ExprKind::ModelBound(m) => Display::fmt(&m.inner, f),
        }
    }
}

fn escape_str(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Debug description of a node: textual form, kind, and source coordinates.
/// Every resolution error includes this so failures are traceable back to
/// the offending template fragment.
pub fn debug_expr(expr: &Expr) -> String {
    format!("{} of kind {} at {}", expr, expr.kind_name(), expr.span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::BinOp;

    #[test]
    fn renders_template_source_forms() {
        assert_eq!(Expr::string("a\"b").to_string(), "\"a\\\"b\"");
        assert_eq!(Expr::template("set$name()").to_string(), "set$name()");

        let call = Expr::method_call_scoped(
            Expr::method_call("$if", vec![Expr::bool_lit(true), Expr::int(1)]),
            "$else",
            vec![Expr::int(2)],
        );
        assert_eq!(call.to_string(), "$if(true, 1).$else(2)");

        let cond = Expr::conditional(
            Expr::binary(BinOp::Lt, Expr::name("a"), Expr::int(3)),
            Expr::string("x"),
            Expr::name("y"),
        );
        assert_eq!(cond.to_string(), "a < 3 ? \"x\" : y");
    }

    #[test]
    fn lambda_and_json_forms() {
        let lambda = Expr::lambda(vec!["n".to_owned()], Expr::name("n"));
        assert_eq!(lambda.to_string(), "n -> n");

        let json = Expr::json_map(vec![("value".to_owned(), Expr::name("String"))]);
        assert_eq!(json.to_string(), "{value: String}");
    }

    #[test]
    fn nodes_survive_a_serde_round_trip() {
        let node = Expr::method_call(
            "$range",
            vec![
                Expr::int(3),
                Expr::lambda(vec!["n".to_owned()], Expr::template("item$n")),
            ],
        );
        let json = serde_json::to_string(&node).expect("serialize");
        let back: Expr = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, node);
    }
}
