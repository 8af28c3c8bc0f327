//! Page/size paginator

use super::{PaginationMode, Paginator, at_least_one, non_negative};
use crate::backend::QueryBuilder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePaginator {
    page: u64,
    size: u64,
    total: u64,
}

impl PagePaginator {
    /// Pages and sizes below 1 are clamped to 1
    pub fn new(page: i64, size: i64) -> Self {
        Self {
            page: at_least_one(page),
            size: at_least_one(size),
            total: 0,
        }
    }
}

impl Paginator for PagePaginator {
    fn mode(&self) -> PaginationMode {
        PaginationMode::Page
    }

    fn page(&self) -> u64 {
        self.page
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.size)
    }

    fn limit(&self) -> u64 {
        self.size
    }

    fn total(&self) -> u64 {
        self.total
    }

    fn set_total(&mut self, total: u64) {
        self.total = total;
    }

    fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    fn has_prev(&self) -> bool {
        self.page > 1
    }

    fn with_page(&mut self, page: i64) -> &mut Self {
        self.page = at_least_one(page);
        self
    }

    fn with_size(&mut self, size: i64) -> &mut Self {
        self.size = at_least_one(size);
        self
    }

    fn with_offset(&mut self, offset: i64) -> &mut Self {
        self.page = non_negative(offset) / self.size + 1;
        self
    }

    fn with_limit(&mut self, limit: i64) -> &mut Self {
        self.with_size(limit)
    }

    fn with_token(&mut self, _token: &str) -> &mut Self {
        self
    }

    fn apply<B: QueryBuilder + ?Sized>(&self, builder: &mut B, _cursor_field: &str) {
        builder.set_offset(self.offset());
        builder.set_limit(self.size);
    }
}
