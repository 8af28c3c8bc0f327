//! Parameterized text fragments shared by the SQL and InfluxQL backends
//!
//! A fragment keeps literal query text and bound values apart until render
//! time, so placeholders are numbered once across the whole statement and
//! user values never end up inside query text.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

/// Bound query parameter
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl QueryParam {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Convert a JSON scalar; arrays and objects are bound as JSON text
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => Self::Text(value.to_string()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => Value::from(*f),
            Self::Bool(b) => Value::Bool(*b),
            Self::Null => Value::Null,
        }
    }
}

impl Serialize for QueryParam {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Text(String),
    Param(QueryParam),
}

/// Query text interleaved with bound parameters
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    pieces: Vec<Piece>,
}

impl Fragment {
    /// Fragment holding literal text only
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            pieces: vec![Piece::Text(text.into())],
        }
    }

    /// Append literal text
    pub fn push(mut self, text: &str) -> Self {
        match self.pieces.last_mut() {
            Some(Piece::Text(last)) => last.push_str(text),
            _ => self.pieces.push(Piece::Text(text.to_string())),
        }
        self
    }

    /// Append a bound parameter
    pub fn param(mut self, param: QueryParam) -> Self {
        self.pieces.push(Piece::Param(param));
        self
    }

    /// Append several parameters separated by `sep`
    pub fn param_list(mut self, params: impl IntoIterator<Item = QueryParam>, sep: &str) -> Self {
        for (i, param) in params.into_iter().enumerate() {
            if i > 0 {
                self = self.push(sep);
            }
            self = self.param(param);
        }
        self
    }

    /// Append another fragment
    pub fn append(mut self, other: Fragment) -> Self {
        for piece in other.pieces {
            self = match piece {
                Piece::Text(t) => self.push(&t),
                Piece::Param(p) => self.param(p),
            };
        }
        self
    }

    /// Join fragments with `sep`, parenthesized when more than one
    pub fn join(parts: Vec<Fragment>, sep: &str) -> Option<Fragment> {
        let mut parts: Vec<Fragment> = parts.into_iter().filter(|p| !p.is_empty()).collect();
        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => {
                let mut out = Fragment::text("(");
                for (i, part) in parts.into_iter().enumerate() {
                    if i > 0 {
                        out = out.push(sep);
                    }
                    out = out.append(part);
                }
                Some(out.push(")"))
            }
        }
    }

    pub fn and(parts: Vec<Fragment>) -> Option<Fragment> {
        Self::join(parts, " AND ")
    }

    pub fn or(parts: Vec<Fragment>) -> Option<Fragment> {
        Self::join(parts, " OR ")
    }

    /// `NOT (...)`
    pub fn negate(part: Fragment) -> Fragment {
        Fragment::text("NOT (").append(part).push(")")
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.iter().all(|p| match p {
            Piece::Text(t) => t.trim().is_empty(),
            Piece::Param(_) => false,
        })
    }

    /// Bound parameters in order of appearance
    pub fn params(&self) -> Vec<&QueryParam> {
        self.pieces
            .iter()
            .filter_map(|p| match p {
                Piece::Param(param) => Some(param),
                Piece::Text(_) => None,
            })
            .collect()
    }

    /// Render into `out`, numbering placeholders after the params already
    /// collected in `params`
    pub fn render_into(
        &self,
        out: &mut String,
        params: &mut Vec<QueryParam>,
        placeholder: &dyn Fn(usize) -> String,
    ) {
        for piece in &self.pieces {
            match piece {
                Piece::Text(t) => out.push_str(t),
                Piece::Param(p) => {
                    params.push(p.clone());
                    out.push_str(&placeholder(params.len()));
                }
            }
        }
    }

    /// Render standalone with the given placeholder style
    pub fn render(&self, placeholder: &dyn Fn(usize) -> String) -> (String, Vec<QueryParam>) {
        let mut out = String::new();
        let mut params = Vec::new();
        self.render_into(&mut out, &mut params, placeholder);
        (out, params)
    }
}

/// Renders with `?` placeholders
impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (text, _) = self.render(&|_| "?".to_string());
        f.write_str(&text)
    }
}
