use crate::span::Span;
use std::result;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Wrong arity, wrong node kind at a required position, or a missing
    /// required chain scope (e.g. `$else` without `$if`).
    #[error("structural error at {0}: {1}")]
    Structural(Span, String),
    /// Engine state misuse, e.g. `$first()` queried outside a `$range` body.
    #[error("state error: {0}")]
    State(String),
    /// Operator applied to operand kinds it has no rule for.
    #[error("unsupported operation at {0}: {1}")]
    Unsupported(Span, String),
    /// A node kind neither resolver has a rule for. Deliberately fail-fast:
    /// adding a node kind without updating both resolvers must fail loudly.
    #[error("unhandled node kind {kind} at {span}: {text}")]
    UnhandledNode {
        kind: &'static str,
        span: Span,
        text: String,
    },
    /// Generator-authoring mistakes, e.g. duplicate injected parameter slots.
    #[error("generator misconfigured: {0}")]
    Misconfigured(String),
    #[error("generic error: {0}")]
    Generic(String),
}

pub type Result<T> = result::Result<T, Error>;

// Convert from eyre::Report to our Error type
impl From<eyre::Report> for Error {
    fn from(err: eyre::Report) -> Self {
        Error::Generic(err.to_string())
    }
}

// Convert from std::io::Error to our Error type
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Generic(e.to_string())
    }
}
impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Generic(s)
    }
}
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Generic(e.to_string())
    }
}
