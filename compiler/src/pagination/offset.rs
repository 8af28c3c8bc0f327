//! Offset/limit paginator

use super::{PaginationMode, Paginator, at_least_one, non_negative};
use crate::backend::QueryBuilder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetPaginator {
    offset: u64,
    limit: u64,
    total: u64,
}

impl OffsetPaginator {
    /// Offsets below 0 are clamped to 0, limits below 1 to 1
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            offset: non_negative(offset),
            limit: at_least_one(limit),
            total: 0,
        }
    }
}

impl Paginator for OffsetPaginator {
    fn mode(&self) -> PaginationMode {
        PaginationMode::Offset
    }

    fn page(&self) -> u64 {
        self.offset / self.limit + 1
    }

    fn size(&self) -> u64 {
        self.limit
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn limit(&self) -> u64 {
        self.limit
    }

    fn total(&self) -> u64 {
        self.total
    }

    fn set_total(&mut self, total: u64) {
        self.total = total;
    }

    fn has_next(&self) -> bool {
        self.offset.saturating_add(self.limit) < self.total
    }

    fn has_prev(&self) -> bool {
        self.offset > 0
    }

    fn with_page(&mut self, page: i64) -> &mut Self {
        self.offset = (at_least_one(page) - 1).saturating_mul(self.limit);
        self
    }

    fn with_size(&mut self, size: i64) -> &mut Self {
        self.with_limit(size)
    }

    fn with_offset(&mut self, offset: i64) -> &mut Self {
        self.offset = non_negative(offset);
        self
    }

    fn with_limit(&mut self, limit: i64) -> &mut Self {
        self.limit = at_least_one(limit);
        self
    }

    fn with_token(&mut self, _token: &str) -> &mut Self {
        self
    }

    fn apply<B: QueryBuilder + ?Sized>(&self, builder: &mut B, _cursor_field: &str) {
        builder.set_offset(self.offset);
        builder.set_limit(self.limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_and_page() {
        let p = OffsetPaginator::new(-5, 0);
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 1);
        assert_eq!(OffsetPaginator::new(25, 10).page(), 3);
    }

    #[test]
    fn test_has_next_prev() {
        let mut p = OffsetPaginator::new(0, 10);
        p.set_total(15);
        assert!(p.has_next());
        assert!(!p.has_prev());
        p.with_offset(10);
        assert!(!p.has_next());
        assert!(p.has_prev());
    }

    #[test]
    fn test_with_page_moves_offset() {
        let mut p = OffsetPaginator::new(0, 20);
        p.with_page(3);
        assert_eq!(p.offset(), 40);
        p.with_page(0);
        assert_eq!(p.offset(), 0);
    }
}
