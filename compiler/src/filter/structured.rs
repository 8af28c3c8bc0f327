//! Structured filter compiler
//!
//! Walks a `FilterExpr` tree top-down. Each node combines its own conditions
//! and the compiled result of its groups with the node's own combinator;
//! conditions that compile to nothing are left out of the combination.

use super::processor::Processor;
use crate::backend::QueryBuilder;
use crate::error::{CompileError, Result};
use crate::types::{ExprType, FilterExpr};

/// Compiles `FilterExpr` trees with depth and size guards
#[derive(Debug, Clone, Copy)]
pub struct StructuredFilter {
    max_depth: usize,
    max_conditions: usize,
}

impl StructuredFilter {
    pub fn new(max_depth: usize, max_conditions: usize) -> Self {
        Self {
            max_depth,
            max_conditions,
        }
    }

    /// Decode a filter expression from JSON
    pub fn parse(json: &str) -> Result<FilterExpr> {
        serde_json::from_str(json).map_err(|e| CompileError::InvalidFilterExpr(e.to_string()))
    }

    /// Compile a tree into one fragment; `None` means no filter
    pub fn compile<P: Processor + ?Sized>(
        &self,
        processor: &P,
        expr: Option<&FilterExpr>,
    ) -> Result<Option<P::Fragment>> {
        let Some(expr) = expr else {
            return Ok(None);
        };
        let count = expr.condition_count();
        if count > self.max_conditions {
            return Err(CompileError::too_many_conditions(count, self.max_conditions));
        }
        self.compile_node(processor, expr, 1)
    }

    /// Compile and push the result onto the builder; returns whether a
    /// filter was added
    pub fn apply<P: Processor + ?Sized>(
        &self,
        processor: &P,
        builder: &mut P::Builder,
        expr: Option<&FilterExpr>,
    ) -> Result<bool> {
        match self.compile(processor, expr)? {
            Some(fragment) => {
                builder.push_filter(fragment);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn compile_node<P: Processor + ?Sized>(
        &self,
        processor: &P,
        expr: &FilterExpr,
        depth: usize,
    ) -> Result<Option<P::Fragment>> {
        if depth > self.max_depth {
            return Err(CompileError::too_deep(self.max_depth));
        }

        if expr.expr_type == ExprType::Unspecified {
            if !expr.conditions.is_empty() || !expr.groups.is_empty() {
                tracing::warn!(
                    conditions = expr.conditions.len(),
                    groups = expr.groups.len(),
                    "Skipping filter node without AND/OR type"
                );
            }
            return Ok(None);
        }

        let mut parts = Vec::with_capacity(expr.conditions.len() + expr.groups.len());
        for condition in &expr.conditions {
            if let Some(fragment) = processor.condition(
                condition.op,
                &condition.field,
                condition.value_str(),
                &condition.values,
            ) {
                parts.push(fragment);
            }
        }
        for group in &expr.groups {
            if let Some(fragment) = self.compile_node(processor, group, depth + 1)? {
                parts.push(fragment);
            }
        }

        tracing::trace!(
            expr_type = %expr.expr_type,
            depth,
            parts = parts.len(),
            "Compiled filter node"
        );
        Ok(match expr.expr_type {
            ExprType::Or => processor.or(parts),
            _ => processor.and(parts),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::QueryParam;
    use crate::backend::sql::{Dialect, SqlProcessor, SqlQuery};
    use crate::types::{Condition, Operator};

    fn filter() -> StructuredFilter {
        StructuredFilter::new(32, 100)
    }

    fn sql(expr: &FilterExpr) -> Option<String> {
        let p = SqlProcessor::new(Dialect::Sqlite);
        filter()
            .compile(&p, Some(expr))
            .unwrap()
            .map(|f| f.to_string())
    }

    #[test]
    fn test_none_and_unspecified_are_noops() {
        let p = SqlProcessor::new(Dialect::Sqlite);
        assert!(filter().compile(&p, None).unwrap().is_none());
        let expr = FilterExpr {
            conditions: vec![Condition::new("a", Operator::Eq, "1")],
            ..Default::default()
        };
        assert_eq!(sql(&expr), None);
    }

    #[test]
    fn test_all_noop_and_is_no_filter() {
        let expr = FilterExpr::and(vec![
            Condition::new("a", Operator::In, "not-json"),
            Condition::new("b;drop", Operator::Eq, "1"),
        ]);
        assert_eq!(sql(&expr), None);
        assert_eq!(sql(&FilterExpr::and(vec![])), None);
    }

    #[test]
    fn test_noop_conditions_omitted() {
        let expr = FilterExpr::and(vec![
            Condition::new("a", Operator::Eq, "1"),
            Condition::new("b", Operator::Unspecified, "2"),
        ]);
        assert_eq!(sql(&expr).unwrap(), "a = ?");
    }

    #[test]
    fn test_groups_keep_their_own_type() {
        let a = Condition::new("a", Operator::Eq, "1");
        let b = Condition::new("b", Operator::Eq, "2");
        let c = Condition::new("c", Operator::Eq, "3");

        let a_and_b_or_c = FilterExpr::and(vec![a.clone()])
            .with_group(FilterExpr::or(vec![b.clone(), c.clone()]));
        let ab_or_c = FilterExpr::or(vec![c]).with_group(FilterExpr::and(vec![a, b]));

        assert_eq!(sql(&a_and_b_or_c).unwrap(), "(a = ? AND (b = ? OR c = ?))");
        assert_eq!(sql(&ab_or_c).unwrap(), "(c = ? OR (a = ? AND b = ?))");
    }

    #[test]
    fn test_depth_guard() {
        let mut expr = FilterExpr::and(vec![Condition::new("a", Operator::Eq, "1")]);
        for _ in 0..5 {
            expr = FilterExpr::and(vec![]).with_group(expr);
        }
        let p = SqlProcessor::new(Dialect::Sqlite);
        let err = StructuredFilter::new(3, 100)
            .compile(&p, Some(&expr))
            .unwrap_err();
        assert!(matches!(err, CompileError::FilterTooDeep { limit: 3 }));
        assert!(StructuredFilter::new(6, 100).compile(&p, Some(&expr)).is_ok());
    }

    #[test]
    fn test_condition_limit() {
        let expr = FilterExpr::and(vec![
            Condition::new("a", Operator::Eq, "1"),
            Condition::new("b", Operator::Eq, "2"),
        ]);
        let p = SqlProcessor::new(Dialect::Sqlite);
        let err = StructuredFilter::new(32, 1).compile(&p, Some(&expr)).unwrap_err();
        assert!(matches!(err, CompileError::TooManyConditions { count: 2, limit: 1 }));
    }

    #[test]
    fn test_apply_to_builder() {
        let expr = StructuredFilter::parse(
            r#"{"type": "AND", "conditions": [
                {"field": "created_at", "op": "BETWEEN", "values": ["2020-01-01", "2021-01-01"]}
            ]}"#,
        )
        .unwrap();
        let p = SqlProcessor::new(Dialect::Postgres);
        let mut q = SqlQuery::new(Dialect::Postgres, "events");
        assert!(filter().apply(&p, &mut q, Some(&expr)).unwrap());
        let (text, params) = q.build();
        assert_eq!(
            text,
            "SELECT * FROM events WHERE (created_at >= $1 AND created_at <= $2)"
        );
        assert_eq!(
            params,
            vec![QueryParam::text("2020-01-01"), QueryParam::text("2021-01-01")]
        );
    }

    #[test]
    fn test_parse_error() {
        let err = StructuredFilter::parse("{not json").unwrap_err();
        assert!(matches!(err, CompileError::InvalidFilterExpr(_)));
    }
}
