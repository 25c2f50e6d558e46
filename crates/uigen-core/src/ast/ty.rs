use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The eight Java primitive type names, recognized specially by `$type`.
/// Primitives never take type arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveTy {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
}

impl PrimitiveTy {
    pub fn from_name(name: &str) -> Option<PrimitiveTy> {
        Some(match name {
            "boolean" => PrimitiveTy::Boolean,
            "byte" => PrimitiveTy::Byte,
            "short" => PrimitiveTy::Short,
            "int" => PrimitiveTy::Int,
            "long" => PrimitiveTy::Long,
            "float" => PrimitiveTy::Float,
            "double" => PrimitiveTy::Double,
            "char" => PrimitiveTy::Char,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveTy::Boolean => "boolean",
            PrimitiveTy::Byte => "byte",
            PrimitiveTy::Short => "short",
            PrimitiveTy::Int => "int",
            PrimitiveTy::Long => "long",
            PrimitiveTy::Float => "float",
            PrimitiveTy::Double => "double",
            PrimitiveTy::Char => "char",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WildcardBound {
    Extends,
    Super,
}

/// A (possibly generic) type reference as constructed by `$type`/`$generic`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TyExpr {
    Primitive(PrimitiveTy),
    Void,
    Named {
        name: String,
        generics: Vec<TyExpr>,
        array_dims: usize,
    },
    Wildcard {
        bound: Option<(WildcardBound, Box<TyExpr>)>,
    },
}

impl TyExpr {
    pub fn named(name: impl Into<String>) -> TyExpr {
        TyExpr::Named {
            name: name.into(),
            generics: Vec::new(),
            array_dims: 0,
        }
    }

    pub fn with_generics(name: impl Into<String>, generics: Vec<TyExpr>) -> TyExpr {
        TyExpr::Named {
            name: name.into(),
            generics,
            array_dims: 0,
        }
    }

    /// The raw type name of a named type, ignoring generics and arrays.
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            TyExpr::Named { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl Display for TyExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TyExpr::Primitive(p) => f.write_str(p.name()),
            TyExpr::Void => f.write_str("void"),
            TyExpr::Named {
                name,
                generics,
                array_dims,
            } => {
                f.write_str(name)?;
                if !generics.is_empty() {
                    write!(f, "<{}>", generics.iter().join(", "))?;
                }
                for _ in 0..*array_dims {
                    write!(f, "[]")?;
                }
                Ok(())
            }
            TyExpr::Wildcard { bound } => {
                f.write_str("?")?;
                if let Some((kind, ty)) = bound {
                    match kind {
                        WildcardBound::Extends => write!(f, " extends {}", ty)?,
                        WildcardBound::Super => write!(f, " super {}", ty)?,
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_names_round_trip() {
        for name in [
            "boolean", "byte", "short", "int", "long", "float", "double", "char",
        ] {
            let primitive = PrimitiveTy::from_name(name).expect(name);
            assert_eq!(primitive.name(), name);
        }
        assert!(PrimitiveTy::from_name("String").is_none());
    }

    #[test]
    fn display_renders_generics_arrays_and_wildcards() {
        let ty = TyExpr::Named {
            name: "Map".to_owned(),
            generics: vec![TyExpr::named("K"), TyExpr::named("V")],
            array_dims: 1,
        };
        assert_eq!(ty.to_string(), "Map<K, V>[]");

        let wildcard = TyExpr::Wildcard {
            bound: Some((WildcardBound::Super, Box::new(TyExpr::named("Number")))),
        };
        assert_eq!(wildcard.to_string(), "? super Number");
    }
}
