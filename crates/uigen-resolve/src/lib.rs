//! Template resolution engine: reduces parsed Ui-template expression trees
//! into resolved nodes and literal strings.
//!
//! The engine is single-threaded recursive-descent evaluation; each
//! generation task owns one [`Context`] and drives a [`Resolver`] over the
//! AST fragments produced upstream.

pub mod context;
pub mod error;
pub mod methods;
pub mod range;
pub mod resolver;

pub use context::{Context, RangeFrame, SourceUnit, Undo};
pub use methods::{ArgValue, MethodRegistry, MethodValue, Overload, ParamKind};
pub use resolver::Resolver;
