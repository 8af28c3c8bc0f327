//! Sort compilation
//!
//! Turns the flat `order_by` list or the structured `sorting` list into
//! validated sort keys. Field names end up in native query text, so each
//! one must pass the identifier check; entries that fail are dropped.

use crate::backend::QueryBuilder;
use crate::filter::field::normalize_path;
use crate::types::{SortOrder, Sorting};

/// One validated ORDER BY instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortOrder,
}

impl SortKey {
    /// Validated sort key; `None` for an invalid field name
    pub fn new(field: &str, direction: SortOrder) -> Option<Self> {
        let field = normalize_path(field)?;
        Some(Self { field, direction })
    }

    /// Parse one flat entry.
    ///
    /// Accepts `field`, `-field`, `+field`, `field desc`, `field:asc`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (field, direction) = if let Some(rest) = s.strip_prefix('-') {
            (rest, SortOrder::Desc)
        } else if let Some(rest) = s.strip_prefix('+') {
            (rest, SortOrder::Asc)
        } else if let Some((field, dir)) = s.split_once(':').or_else(|| s.rsplit_once(' ')) {
            (field, SortOrder::parse(dir)?)
        } else {
            (s, SortOrder::Asc)
        };
        Self::new(field, direction)
    }

    pub fn is_desc(&self) -> bool {
        self.direction.is_desc()
    }

    pub fn to_sql(&self) -> String {
        format!("{} {}", self.field, self.direction.as_str())
    }
}

/// Compile the flat form; `-` marks descending, blank entries are skipped
pub fn build_sort(order_by: &[String]) -> Vec<SortKey> {
    order_by
        .iter()
        .filter(|s| !s.trim().trim_start_matches(['-', '+']).is_empty())
        .filter_map(|s| {
            let key = SortKey::parse(s);
            if key.is_none() {
                tracing::warn!(entry = %s, "Dropping sort entry: invalid field");
            }
            key
        })
        .collect()
}

/// Compile the structured form; entries with an empty field are skipped
pub fn build_structured_sort(sorting: &[Sorting]) -> Vec<SortKey> {
    sorting
        .iter()
        .filter(|s| !s.field.trim().is_empty())
        .filter_map(|s| {
            let key = SortKey::new(&s.field, s.order);
            if key.is_none() {
                tracing::warn!(field = %s.field, "Dropping sort entry: invalid field");
            }
            key
        })
        .collect()
}

/// Use `keys` when non-empty, otherwise a single default key
pub fn build_sort_with_default(
    keys: Vec<SortKey>,
    default_field: Option<&str>,
    default_desc: bool,
) -> Vec<SortKey> {
    if !keys.is_empty() {
        return keys;
    }
    let direction = if default_desc {
        SortOrder::Desc
    } else {
        SortOrder::Asc
    };
    default_field
        .filter(|f| !f.trim().is_empty())
        .and_then(|f| SortKey::new(f, direction))
        .into_iter()
        .collect()
}

/// Push sort keys onto a builder, returning how many were accepted
pub fn apply_sort<B: QueryBuilder + ?Sized>(builder: &mut B, keys: &[SortKey]) -> usize {
    keys.iter().filter(|key| builder.push_sort(key)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_sort_skips_empty_entries() {
        let keys = build_sort(&strings(&["-age", "", "name"]));
        assert_eq!(
            keys,
            vec![
                SortKey::new("age", SortOrder::Desc).unwrap(),
                SortKey::new("name", SortOrder::Asc).unwrap(),
            ]
        );
    }

    #[test]
    fn test_build_sort_skips_delimiter_only() {
        assert!(build_sort(&strings(&["-", "  ", "+"])).is_empty());
    }

    #[test]
    fn test_build_sort_direction_forms() {
        let keys = build_sort(&strings(&["created_at desc", "name:ASC", "+id", "scoreValue"]));
        let sql: Vec<String> = keys.iter().map(|k| k.to_sql()).collect();
        assert_eq!(
            sql,
            vec!["created_at DESC", "name ASC", "id ASC", "score_value ASC"]
        );
    }

    #[test]
    fn test_build_sort_rejects_injection() {
        let keys = build_sort(&strings(&["name; DROP TABLE users", "age"]));
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].field, "age");
        assert!(build_sort(&strings(&["name:sideways"])).is_empty());
    }

    #[test]
    fn test_build_structured_sort() {
        let keys = build_structured_sort(&[
            Sorting::desc("created_at"),
            Sorting::asc(""),
            Sorting::asc("bad-field!"),
            Sorting::asc("meta.rank"),
        ]);
        assert_eq!(keys.len(), 2);
        assert!(keys[0].is_desc());
        assert_eq!(keys[1].field, "meta.rank");
    }

    #[test]
    fn test_build_sort_with_default() {
        let keys = build_sort_with_default(vec![], Some("id"), true);
        assert_eq!(keys, vec![SortKey::new("id", SortOrder::Desc).unwrap()]);

        let given = vec![SortKey::new("name", SortOrder::Asc).unwrap()];
        assert_eq!(build_sort_with_default(given.clone(), Some("id"), true), given);

        assert!(build_sort_with_default(vec![], None, false).is_empty());
        assert!(build_sort_with_default(vec![], Some(""), false).is_empty());
    }
}
