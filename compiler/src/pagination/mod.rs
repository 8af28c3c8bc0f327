//! Pagination
//!
//! Three paginators share one contract: offset/limit, page/size and opaque
//! cursor tokens. A paginator is built per request, applied to a builder
//! once, then optionally fed the total count to derive page statistics.

mod offset;
mod page;
mod token;

pub use offset::OffsetPaginator;
pub use page::PagePaginator;
pub use token::{Cursor, TokenPaginator};

use std::fmt;

use serde::Serialize;

use crate::backend::QueryBuilder;

/// Pagination style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginationMode {
    Offset,
    Page,
    Token,
}

impl PaginationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offset => "offset",
            Self::Page => "page",
            Self::Token => "token",
        }
    }
}

impl fmt::Display for PaginationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clamp a requested count to at least 1
pub(crate) fn at_least_one(n: i64) -> u64 {
    n.max(1) as u64
}

/// Clamp a requested offset to at least 0
pub(crate) fn non_negative(n: i64) -> u64 {
    n.max(0) as u64
}

/// Number of pages for `total` items, at least 1
pub(crate) fn page_count(total: u64, size: u64) -> u64 {
    if size == 0 {
        return 0;
    }
    total.div_ceil(size).max(1)
}

/// Shared paginator contract
pub trait Paginator {
    fn mode(&self) -> PaginationMode;

    /// 1-based page number
    fn page(&self) -> u64;

    fn size(&self) -> u64;

    fn offset(&self) -> u64;

    fn limit(&self) -> u64;

    fn token(&self) -> Option<&str> {
        None
    }

    fn next_token(&self) -> Option<&str> {
        None
    }

    fn prev_token(&self) -> Option<&str> {
        None
    }

    fn total(&self) -> u64;

    fn set_total(&mut self, total: u64);

    fn total_pages(&self) -> u64 {
        page_count(self.total(), self.limit())
    }

    fn has_next(&self) -> bool;

    fn has_prev(&self) -> bool;

    fn with_page(&mut self, page: i64) -> &mut Self;

    fn with_size(&mut self, size: i64) -> &mut Self;

    fn with_offset(&mut self, offset: i64) -> &mut Self;

    fn with_limit(&mut self, limit: i64) -> &mut Self;

    fn with_token(&mut self, token: &str) -> &mut Self;

    /// Apply paging to a builder; `cursor_field` is the monotonically
    /// increasing column used by token mode
    fn apply<B: QueryBuilder + ?Sized>(&self, builder: &mut B, cursor_field: &str);

    /// Serializable page statistics
    fn info(&self) -> PageInfo {
        PageInfo {
            mode: self.mode(),
            page: self.page(),
            size: self.size(),
            offset: self.offset(),
            total: self.total(),
            total_pages: self.total_pages(),
            has_next: self.has_next(),
            has_prev: self.has_prev(),
            next_token: self.next_token().map(str::to_string),
            prev_token: self.prev_token().map(str::to_string),
        }
    }
}

/// Page statistics returned alongside a result set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageInfo {
    pub mode: PaginationMode,
    pub page: u64,
    pub size: u64,
    pub offset: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_token: Option<String>,
}

/// Paginator selected for one request
#[derive(Debug, Clone, PartialEq)]
pub enum Pagination {
    Offset(OffsetPaginator),
    Page(PagePaginator),
    Token(TokenPaginator),
}

macro_rules! delegate {
    ($self:ident, $p:ident => $e:expr) => {
        match $self {
            Pagination::Offset($p) => $e,
            Pagination::Page($p) => $e,
            Pagination::Token($p) => $e,
        }
    };
}

impl Paginator for Pagination {
    fn mode(&self) -> PaginationMode {
        delegate!(self, p => p.mode())
    }

    fn page(&self) -> u64 {
        delegate!(self, p => p.page())
    }

    fn size(&self) -> u64 {
        delegate!(self, p => p.size())
    }

    fn offset(&self) -> u64 {
        delegate!(self, p => p.offset())
    }

    fn limit(&self) -> u64 {
        delegate!(self, p => p.limit())
    }

    fn token(&self) -> Option<&str> {
        delegate!(self, p => p.token())
    }

    fn next_token(&self) -> Option<&str> {
        delegate!(self, p => p.next_token())
    }

    fn prev_token(&self) -> Option<&str> {
        delegate!(self, p => p.prev_token())
    }

    fn total(&self) -> u64 {
        delegate!(self, p => p.total())
    }

    fn set_total(&mut self, total: u64) {
        delegate!(self, p => p.set_total(total))
    }

    fn total_pages(&self) -> u64 {
        delegate!(self, p => p.total_pages())
    }

    fn has_next(&self) -> bool {
        delegate!(self, p => p.has_next())
    }

    fn has_prev(&self) -> bool {
        delegate!(self, p => p.has_prev())
    }

    fn with_page(&mut self, page: i64) -> &mut Self {
        delegate!(self, p => { p.with_page(page); });
        self
    }

    fn with_size(&mut self, size: i64) -> &mut Self {
        delegate!(self, p => { p.with_size(size); });
        self
    }

    fn with_offset(&mut self, offset: i64) -> &mut Self {
        delegate!(self, p => { p.with_offset(offset); });
        self
    }

    fn with_limit(&mut self, limit: i64) -> &mut Self {
        delegate!(self, p => { p.with_limit(limit); });
        self
    }

    fn with_token(&mut self, token: &str) -> &mut Self {
        delegate!(self, p => { p.with_token(token); });
        self
    }

    fn apply<B: QueryBuilder + ?Sized>(&self, builder: &mut B, cursor_field: &str) {
        delegate!(self, p => p.apply(builder, cursor_field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(5, 0), 0);
    }

    #[test]
    fn test_clamps() {
        assert_eq!(at_least_one(-3), 1);
        assert_eq!(at_least_one(7), 7);
        assert_eq!(non_negative(-1), 0);
    }

    #[test]
    fn test_enum_delegates() {
        let mut p = Pagination::Page(PagePaginator::new(2, 10));
        p.set_total(35);
        assert_eq!(p.mode(), PaginationMode::Page);
        assert_eq!(p.offset(), 10);
        assert_eq!(p.total_pages(), 4);
        assert!(p.has_next());
        p.with_page(4);
        assert!(!p.has_next());
    }

    #[test]
    fn test_info_serializes() {
        let mut p = OffsetPaginator::new(20, 10);
        p.set_total(25);
        let json = serde_json::to_value(p.info()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "mode": "offset",
                "page": 3,
                "size": 10,
                "offset": 20,
                "total": 25,
                "total_pages": 3,
                "has_next": false,
                "has_prev": true
            })
        );
    }
}
