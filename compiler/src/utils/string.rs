//! String utility functions

use serde_json::Value;

/// Inline flag that makes a regular expression case-insensitive
pub const INLINE_CASE_FLAG: &str = "(?i)";

/// Convert an identifier to snake_case.
///
/// Handles camelCase, PascalCase, kebab-case and acronyms:
/// `isNotNull` -> `is_not_null`, `HTTPStatus` -> `http_status`,
/// `iso-week-day` -> `iso_week_day`.
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.trim().chars().collect();
    let mut out = String::with_capacity(chars.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == '_' || c.is_whitespace() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }

        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary && !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Prefix a pattern with the inline case-insensitive flag unless present
pub fn with_inline_case_flag(pattern: &str) -> String {
    if pattern.starts_with(INLINE_CASE_FLAG) {
        pattern.to_string()
    } else {
        format!("{}{}", INLINE_CASE_FLAG, pattern)
    }
}

/// Remove a leading inline case-insensitive flag
pub fn strip_inline_case_flag(pattern: &str) -> &str {
    pattern.strip_prefix(INLINE_CASE_FLAG).unwrap_or(pattern)
}

/// Render a JSON scalar as filter text.
///
/// Strings pass through, numbers and booleans are stringified, arrays are
/// re-serialized so set operators can decode them. Null and objects have no
/// scalar text form.
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) => serde_json::to_string(value).ok(),
        Value::Null | Value::Object(_) => None,
    }
}

/// Parse a JSON array of scalars from filter text
pub fn parse_value_array(value: &str) -> Option<Vec<Value>> {
    let trimmed = value.trim();
    if !trimmed.starts_with('[') {
        return None;
    }
    serde_json::from_str::<Vec<Value>>(trimmed).ok()
}

/// Guess the JSON type of a scalar filter value.
///
/// Integers and floats become numbers, `true`/`false` become booleans,
/// everything else stays a string.
pub fn infer_scalar(value: &str) -> Value {
    if let Ok(i) = value.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = value.parse::<f64>()
        && f.is_finite()
        && value.contains(['.', 'e', 'E'])
    {
        return Value::from(f);
    }
    match value {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_snake_case_camel() {
        assert_eq!(to_snake_case("isNotNull"), "is_not_null");
        assert_eq!(to_snake_case("startsWith"), "starts_with");
        assert_eq!(to_snake_case("iLike"), "i_like");
    }

    #[test]
    fn test_to_snake_case_pascal_and_acronym() {
        assert_eq!(to_snake_case("CreatedAt"), "created_at");
        assert_eq!(to_snake_case("HTTPStatus"), "http_status");
        assert_eq!(to_snake_case("EQ"), "eq");
    }

    #[test]
    fn test_to_snake_case_kebab() {
        assert_eq!(to_snake_case("iso-week-day"), "iso_week_day");
        assert_eq!(to_snake_case("greater-or-equal"), "greater_or_equal");
    }

    #[test]
    fn test_to_snake_case_already_snake() {
        assert_eq!(to_snake_case("user_id"), "user_id");
        assert_eq!(to_snake_case("  name  "), "name");
        assert_eq!(to_snake_case("field1Name"), "field1_name");
    }

    #[test]
    fn test_to_snake_case_empty() {
        assert_eq!(to_snake_case(""), "");
        assert_eq!(to_snake_case("__"), "");
    }

    #[test]
    fn test_with_inline_case_flag() {
        assert_eq!(with_inline_case_flag("^abc"), "(?i)^abc");
        assert_eq!(with_inline_case_flag("(?i)^abc"), "(?i)^abc");
        assert_eq!(strip_inline_case_flag("(?i)abc"), "abc");
        assert_eq!(strip_inline_case_flag("abc"), "abc");
    }

    #[test]
    fn test_value_to_text() {
        assert_eq!(value_to_text(&json!("a")), Some("a".to_string()));
        assert_eq!(value_to_text(&json!(42)), Some("42".to_string()));
        assert_eq!(value_to_text(&json!(true)), Some("true".to_string()));
        assert_eq!(value_to_text(&json!([1, 2])), Some("[1,2]".to_string()));
        assert_eq!(value_to_text(&json!(null)), None);
        assert_eq!(value_to_text(&json!({"a": 1})), None);
    }

    #[test]
    fn test_parse_value_array() {
        assert_eq!(
            parse_value_array(r#"["a", 2]"#),
            Some(vec![json!("a"), json!(2)])
        );
        assert_eq!(parse_value_array("not-json"), None);
        assert_eq!(parse_value_array("[1,"), None);
        assert_eq!(parse_value_array("[]"), Some(vec![]));
    }

    #[test]
    fn test_infer_scalar() {
        assert_eq!(infer_scalar("42"), json!(42));
        assert_eq!(infer_scalar("-7"), json!(-7));
        assert_eq!(infer_scalar("1.5"), json!(1.5));
        assert_eq!(infer_scalar("true"), json!(true));
        assert_eq!(infer_scalar("alice"), json!("alice"));
        assert_eq!(infer_scalar("NaN"), json!("NaN"));
    }
}
