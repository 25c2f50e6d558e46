mod expr;
mod lit;
mod pretty;
mod ty;

pub use expr::*;
pub use lit::*;
pub use pretty::*;
pub use ty::*;
