//! Field reference resolution
//!
//! Every field name that reaches native query text passes through here.
//! Column names are snake_cased and must be plain identifiers; JSON sub-keys
//! must match the key allow-list. Anything else resolves to `None`.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::types::DatePart;
use crate::utils::string::to_snake_case;

/// Separator between a container column and its JSON sub-key
pub const PATH_SEPARATOR: char = '.';

static COLUMN_PATTERN: OnceLock<Regex> = OnceLock::new();
static JSON_KEY_PATTERN: OnceLock<Regex> = OnceLock::new();

fn column_pattern() -> &'static Regex {
    COLUMN_PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid regex"))
}

fn json_key_pattern() -> &'static Regex {
    JSON_KEY_PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.]+$").expect("Invalid regex"))
}

/// Whether `name` is a plain column identifier
pub fn is_valid_column(name: &str) -> bool {
    column_pattern().is_match(name)
}

/// Whether `key` is an acceptable JSON sub-key path
pub fn is_valid_json_key(key: &str) -> bool {
    json_key_pattern().is_match(key)
        && !key.starts_with(PATH_SEPARATOR)
        && !key.ends_with(PATH_SEPARATOR)
        && !key.contains("..")
}

/// Resolved, validated field reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRef {
    /// Plain column
    Plain(String),
    /// Sub-key inside a JSON/document column
    JsonPath { container: String, key: String },
    /// Calendar component extracted from a temporal field
    DatePart { part: DatePart, field: Box<FieldRef> },
}

impl FieldRef {
    /// Resolve a raw field name, splitting dot-paths into container and key
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.split_once(PATH_SEPARATOR) {
            Some((container, key)) => Self::json(container, key),
            None => Self::plain(raw),
        }
    }

    /// Plain column reference
    pub fn plain(name: &str) -> Option<Self> {
        let column = to_snake_case(name);
        is_valid_column(&column).then_some(Self::Plain(column))
    }

    /// JSON sub-key reference; the container is snake_cased
    pub fn json(container: &str, key: &str) -> Option<Self> {
        let container = to_snake_case(container);
        let key = key.trim();
        if !is_valid_column(&container) || !is_valid_json_key(key) {
            return None;
        }
        Some(Self::JsonPath {
            container,
            key: key.to_string(),
        })
    }

    /// Descend one more key level (`meta` -> `meta.key`, `meta.a` -> `meta.a.key`)
    pub fn child(self, key: &str) -> Option<Self> {
        match self {
            Self::Plain(container) => Self::json(&container, key),
            Self::JsonPath { container, key: parent } => {
                Self::json(&container, &format!("{}{}{}", parent, PATH_SEPARATOR, key.trim()))
            }
            Self::DatePart { .. } => None,
        }
    }

    /// Wrap in a date-part extraction; nested extraction is rejected
    pub fn with_date_part(self, part: DatePart) -> Option<Self> {
        match (part, &self) {
            (DatePart::Unspecified, _) | (_, Self::DatePart { .. }) => None,
            _ => Some(Self::DatePart {
                part,
                field: Box::new(self),
            }),
        }
    }

    /// Underlying column name
    pub fn column(&self) -> &str {
        match self {
            Self::Plain(c) => c,
            Self::JsonPath { container, .. } => container,
            Self::DatePart { field, .. } => field.column(),
        }
    }

    /// Dotted document path (`container.key`)
    pub fn dotted(&self) -> String {
        match self {
            Self::Plain(c) => c.clone(),
            Self::JsonPath { container, key } => format!("{}{}{}", container, PATH_SEPARATOR, key),
            Self::DatePart { field, .. } => field.dotted(),
        }
    }

    /// Key segments of a JSON path, empty for plain columns
    pub fn key_segments(&self) -> Vec<&str> {
        match self {
            Self::JsonPath { key, .. } => key.split(PATH_SEPARATOR).collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_date_part(&self) -> bool {
        matches!(self, Self::DatePart { .. })
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DatePart { part, field } => write!(f, "{}({})", part, field),
            _ => f.write_str(&self.dotted()),
        }
    }
}

/// Validate and snake_case a sort or projection path.
///
/// Dotted paths are allowed when every segment is an identifier.
pub fn normalize_path(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let segments: Option<Vec<String>> = raw
        .split(PATH_SEPARATOR)
        .enumerate()
        .map(|(i, seg)| {
            let seg = if i == 0 { to_snake_case(seg) } else { seg.trim().to_string() };
            is_valid_column(&seg).then_some(seg)
        })
        .collect();
    segments.map(|s| s.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        assert_eq!(FieldRef::parse("age"), Some(FieldRef::Plain("age".into())));
        assert_eq!(
            FieldRef::parse("createdAt"),
            Some(FieldRef::Plain("created_at".into()))
        );
        assert_eq!(FieldRef::parse(""), None);
        assert_eq!(FieldRef::parse("1abc"), None);
    }

    #[test]
    fn test_parse_rejects_injection() {
        assert_eq!(FieldRef::parse("name; DROP TABLE users"), None);
        assert_eq!(FieldRef::parse("name'--"), None);
        assert_eq!(FieldRef::parse("prefs.a;b"), None);
        assert_eq!(FieldRef::parse("prefs.it's"), None);
        assert_eq!(FieldRef::parse("prefs."), None);
    }

    #[test]
    fn test_parse_json_path() {
        assert_eq!(
            FieldRef::parse("preferences.daily_email"),
            Some(FieldRef::JsonPath {
                container: "preferences".into(),
                key: "daily_email".into()
            })
        );
        assert_eq!(
            FieldRef::parse("userPrefs.theme.color").map(|f| f.dotted()),
            Some("user_prefs.theme.color".into())
        );
    }

    #[test]
    fn test_child() {
        let f = FieldRef::parse("meta").unwrap().child("source").unwrap();
        assert_eq!(f.dotted(), "meta.source");
        let f = f.child("id").unwrap();
        assert_eq!(f.key_segments(), vec!["source", "id"]);
        assert_eq!(FieldRef::parse("meta").unwrap().child("bad key"), None);
    }

    #[test]
    fn test_with_date_part() {
        let f = FieldRef::parse("created_at")
            .unwrap()
            .with_date_part(DatePart::Year)
            .unwrap();
        assert!(f.is_date_part());
        assert_eq!(f.column(), "created_at");
        assert_eq!(f.to_string(), "YEAR(created_at)");
        assert_eq!(f.clone().with_date_part(DatePart::Month), None);
        assert_eq!(
            FieldRef::parse("x").unwrap().with_date_part(DatePart::Unspecified),
            None
        );
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("createdAt"), Some("created_at".into()));
        assert_eq!(normalize_path("meta.count"), Some("meta.count".into()));
        assert_eq!(normalize_path("a b"), None);
        assert_eq!(normalize_path("a..b"), None);
        assert_eq!(normalize_path(""), None);
    }
}
