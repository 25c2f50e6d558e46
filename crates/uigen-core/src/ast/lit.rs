use serde::{Deserialize, Serialize};

/// A primitive literal. Int/Long/Double/Char are distinct categories; the
/// variable resolver's operator tables dispatch on matching categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Lit {
    Str(String),
    Int(i32),
    Long(i64),
    Double(f64),
    Char(char),
    Bool(bool),
}

impl Lit {
    /// The literal's textual form, as produced by literal resolution.
    /// Strings yield their raw value, without quotes.
    pub fn to_text(&self) -> String {
        match self {
            Lit::Str(s) => s.clone(),
            Lit::Int(i) => i.to_string(),
            Lit::Long(l) => l.to_string(),
            Lit::Double(d) => d.to_string(),
            Lit::Char(c) => c.to_string(),
            Lit::Bool(b) => b.to_string(),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Lit::Int(_) | Lit::Long(_) | Lit::Double(_) | Lit::Char(_)
        )
    }
}

impl From<&str> for Lit {
    fn from(s: &str) -> Self {
        Lit::Str(s.to_owned())
    }
}

impl From<i32> for Lit {
    fn from(i: i32) -> Self {
        Lit::Int(i)
    }
}

impl From<i64> for Lit {
    fn from(l: i64) -> Self {
        Lit::Long(l)
    }
}

impl From<f64> for Lit {
    fn from(d: f64) -> Self {
        Lit::Double(d)
    }
}

impl From<bool> for Lit {
    fn from(b: bool) -> Self {
        Lit::Bool(b)
    }
}

impl From<char> for Lit {
    fn from(c: char) -> Self {
        Lit::Char(c)
    }
}
