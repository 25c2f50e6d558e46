use crate::ast::{Lit, TyExpr};
use crate::ops::BinOp;
use crate::span::Span;
use serde::{Deserialize, Serialize};

pub type BExpr = Box<Expr>;

/// One parsed syntax element of a Ui-template attribute value or embedded
/// expression. Nodes are produced once by parsing and then progressively
/// rewritten by resolution; the resolvers clone before substituting into a
/// node that is referenced elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    #[serde(default, skip_serializing_if = "is_zero_span")]
    pub span: Span,
    #[serde(flatten)]
    pub kind: ExprKind,
}

fn is_zero_span(span: &Span) -> bool {
    *span == Span::ZERO
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Lit(Lit),
    Name(ExprName),
    Qualified(ExprQualified),
    Binary(ExprBinary),
    Conditional(ExprConditional),
    MethodCall(ExprMethodCall),
    /// A template literal: text with embedded `$name` placeholders.
    Template(ExprTemplate),
    Json(ExprJson),
    Type(ExprType),
    ClassLit(ExprClassLit),
    ArrayInit(ExprArrayInit),
    Lambda(ExprLambda),
    Enclosed(BExpr),
    /// A deferred sub-tree carrying per-tick bindings, produced by `$range`.
    Sys(ExprSys),
    /// A multi-value bundle whose elements splice into an enclosing variadic
    /// argument list, rather than being one array value.
    VarargBundle(ExprVarargBundle),
    /// A node linked back to a generated model-field descriptor. Resolution
    /// sees through the wrapper.
    ModelBound(ExprModelBound),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprName {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprQualified {
    pub segments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprBinary {
    pub op: BinOp,
    pub lhs: BExpr,
    pub rhs: BExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprConditional {
    pub condition: BExpr,
    pub then_branch: BExpr,
    pub else_branch: BExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprMethodCall {
    /// The chained scope, e.g. the `$if(..)` in `$if(..).$else(..)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<BExpr>,
    pub name: String,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprTemplate {
    pub text: String,
}

/// An ordered JSON-like container; array mode holds anonymous values, map
/// mode holds key/value pairs (the representation of method parameter lists).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprJson {
    pub is_array: bool,
    pub pairs: Vec<JsonPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonPair {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprType {
    pub ty: TyExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprClassLit {
    pub ty: TyExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprArrayInit {
    pub values: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprLambda {
    pub params: Vec<String>,
    pub body: BExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprSys {
    /// Variables to install (scoped) while the body is visited.
    pub bindings: Vec<(String, Expr)>,
    /// Whether this tick is the first surviving iteration of its range.
    pub is_first: bool,
    pub body: BExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprVarargBundle {
    pub items: Vec<Expr>,
}

/// Descriptor of the generated model field a node was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelField {
    pub name: String,
    pub ty: TyExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprModelBound {
    pub field: ModelField,
    pub inner: BExpr,
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Self {
            span: Span::ZERO,
            kind,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn kind(&self) -> &ExprKind {
        &self.kind
    }

    /// The node kind's name, used by unhandled-node errors.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ExprKind::Lit(Lit::Str(_)) => "StringLiteral",
            ExprKind::Lit(Lit::Int(_)) => "IntLiteral",
            ExprKind::Lit(Lit::Long(_)) => "LongLiteral",
            ExprKind::Lit(Lit::Double(_)) => "DoubleLiteral",
            ExprKind::Lit(Lit::Char(_)) => "CharLiteral",
            ExprKind::Lit(Lit::Bool(_)) => "BoolLiteral",
            ExprKind::Name(_) => "Name",
            ExprKind::Qualified(_) => "QualifiedName",
            ExprKind::Binary(_) => "Binary",
            ExprKind::Conditional(_) => "Conditional",
            ExprKind::MethodCall(_) => "MethodCall",
            ExprKind::Template(_) => "TemplateLiteral",
            ExprKind::Json(_) => "JsonContainer",
            ExprKind::Type(_) => "TypeExpr",
            ExprKind::ClassLit(_) => "ClassLiteral",
            ExprKind::ArrayInit(_) => "ArrayInit",
            ExprKind::Lambda(_) => "Lambda",
            ExprKind::Enclosed(_) => "Enclosed",
            ExprKind::Sys(_) => "SysExpr",
            ExprKind::VarargBundle(_) => "VarargBundle",
            ExprKind::ModelBound(_) => "ModelBound",
        }
    }

    // literal constructors

    pub fn lit(lit: impl Into<Lit>) -> Self {
        Expr::new(ExprKind::Lit(lit.into()))
    }

    pub fn int(value: i32) -> Self {
        Expr::new(ExprKind::Lit(Lit::Int(value)))
    }

    pub fn long(value: i64) -> Self {
        Expr::new(ExprKind::Lit(Lit::Long(value)))
    }

    pub fn double(value: f64) -> Self {
        Expr::new(ExprKind::Lit(Lit::Double(value)))
    }

    pub fn char_lit(value: char) -> Self {
        Expr::new(ExprKind::Lit(Lit::Char(value)))
    }

    pub fn bool_lit(value: bool) -> Self {
        Expr::new(ExprKind::Lit(Lit::Bool(value)))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::new(ExprKind::Lit(Lit::Str(value.into())))
    }

    pub fn template(text: impl Into<String>) -> Self {
        Expr::new(ExprKind::Template(ExprTemplate { text: text.into() }))
    }

    // compound constructors

    pub fn name(name: impl Into<String>) -> Self {
        Expr::new(ExprKind::Name(ExprName { name: name.into() }))
    }

    pub fn qualified(segments: Vec<String>) -> Self {
        Expr::new(ExprKind::Qualified(ExprQualified { segments }))
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::new(ExprKind::Binary(ExprBinary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }))
    }

    pub fn conditional(condition: Expr, then_branch: Expr, else_branch: Expr) -> Self {
        Expr::new(ExprKind::Conditional(ExprConditional {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }))
    }

    pub fn method_call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::new(ExprKind::MethodCall(ExprMethodCall {
            scope: None,
            name: name.into(),
            args,
        }))
    }

    pub fn method_call_scoped(scope: Expr, name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::new(ExprKind::MethodCall(ExprMethodCall {
            scope: Some(Box::new(scope)),
            name: name.into(),
            args,
        }))
    }

    pub fn json_array(values: Vec<Expr>) -> Self {
        Expr::new(ExprKind::Json(ExprJson {
            is_array: true,
            pairs: values
                .into_iter()
                .map(|value| JsonPair { key: None, value })
                .collect(),
        }))
    }

    pub fn json_map(pairs: Vec<(String, Expr)>) -> Self {
        Expr::new(ExprKind::Json(ExprJson {
            is_array: false,
            pairs: pairs
                .into_iter()
                .map(|(key, value)| JsonPair {
                    key: Some(key),
                    value,
                })
                .collect(),
        }))
    }

    pub fn type_expr(ty: TyExpr) -> Self {
        Expr::new(ExprKind::Type(ExprType { ty }))
    }

    pub fn class_lit(ty: TyExpr) -> Self {
        Expr::new(ExprKind::ClassLit(ExprClassLit { ty }))
    }

    pub fn array_init(values: Vec<Expr>) -> Self {
        Expr::new(ExprKind::ArrayInit(ExprArrayInit { values }))
    }

    pub fn lambda(params: Vec<String>, body: Expr) -> Self {
        Expr::new(ExprKind::Lambda(ExprLambda {
            params,
            body: Box::new(body),
        }))
    }

    pub fn enclosed(inner: Expr) -> Self {
        Expr::new(ExprKind::Enclosed(Box::new(inner)))
    }

    pub fn sys(bindings: Vec<(String, Expr)>, is_first: bool, body: Expr) -> Self {
        Expr::new(ExprKind::Sys(ExprSys {
            bindings,
            is_first,
            body: Box::new(body),
        }))
    }

    pub fn vararg_bundle(items: Vec<Expr>) -> Self {
        Expr::new(ExprKind::VarargBundle(ExprVarargBundle { items }))
    }

    pub fn model_bound(field: ModelField, inner: Expr) -> Self {
        Expr::new(ExprKind::ModelBound(ExprModelBound {
            field,
            inner: Box::new(inner),
        }))
    }

    pub fn as_lit(&self) -> Option<&Lit> {
        match &self.kind {
            ExprKind::Lit(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match &self.kind {
            ExprKind::Lit(Lit::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Name(n) => Some(&n.name),
            _ => None,
        }
    }

    pub fn as_method_call(&self) -> Option<&ExprMethodCall> {
        match &self.kind {
            ExprKind::MethodCall(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_lambda(&self) -> Option<&ExprLambda> {
        match &self.kind {
            ExprKind::Lambda(lambda) => Some(lambda),
            _ => None,
        }
    }
}

impl ExprJson {
    pub fn values(&self) -> impl Iterator<Item = &Expr> {
        self.pairs.iter().map(|pair| &pair.value)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
