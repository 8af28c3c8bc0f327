//! Cursor-token paginator
//!
//! Tokens are `base64(JSON({"last_id": n}))` with the standard alphabet.
//! A missing or undecodable token applies only the page size; it never
//! fails the request.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use super::{PaginationMode, Paginator, at_least_one, page_count};
use crate::backend::QueryBuilder;

/// Decoded cursor payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub last_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPaginator {
    token: Option<String>,
    next_token: Option<String>,
    prev_token: Option<String>,
    size: u64,
    total: u64,
}

impl TokenPaginator {
    /// Blank tokens are treated as absent; sizes below 1 are clamped to 1
    pub fn new(token: Option<&str>, size: i64) -> Self {
        Self {
            token: non_blank(token),
            next_token: None,
            prev_token: None,
            size: at_least_one(size),
            total: 0,
        }
    }

    /// Encode the wire token for `last_id`
    pub fn encode(last_id: i64) -> String {
        // Serializing a struct with one integer field cannot fail
        let json = serde_json::to_vec(&Cursor { last_id }).unwrap_or_default();
        STANDARD.encode(json)
    }

    /// Decode a wire token; `None` when it is not valid base64 JSON
    pub fn decode(token: &str) -> Option<Cursor> {
        let bytes = STANDARD.decode(token.trim()).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Cursor carried by the current token
    pub fn cursor(&self) -> Option<Cursor> {
        self.token.as_deref().and_then(Self::decode)
    }

    pub fn set_next_token(&mut self, token: Option<String>) {
        self.next_token = token.filter(|t| !t.trim().is_empty());
    }

    pub fn set_prev_token(&mut self, token: Option<String>) {
        self.prev_token = token.filter(|t| !t.trim().is_empty());
    }

    /// Set the next token to point past `last_id`
    pub fn set_next_cursor(&mut self, last_id: i64) {
        self.next_token = Some(Self::encode(last_id));
    }
}

fn non_blank(token: Option<&str>) -> Option<String> {
    token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

impl Paginator for TokenPaginator {
    fn mode(&self) -> PaginationMode {
        PaginationMode::Token
    }

    fn page(&self) -> u64 {
        1
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn offset(&self) -> u64 {
        0
    }

    fn limit(&self) -> u64 {
        self.size
    }

    fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn next_token(&self) -> Option<&str> {
        self.next_token.as_deref()
    }

    fn prev_token(&self) -> Option<&str> {
        self.prev_token.as_deref()
    }

    fn total(&self) -> u64 {
        self.total
    }

    fn set_total(&mut self, total: u64) {
        self.total = total;
    }

    /// 0 while the total is unknown
    fn total_pages(&self) -> u64 {
        if self.total == 0 {
            return 0;
        }
        page_count(self.total, self.size)
    }

    fn has_next(&self) -> bool {
        self.next_token.is_some()
    }

    fn has_prev(&self) -> bool {
        self.prev_token.is_some()
    }

    fn with_page(&mut self, _page: i64) -> &mut Self {
        self
    }

    fn with_size(&mut self, size: i64) -> &mut Self {
        self.size = at_least_one(size);
        self
    }

    fn with_offset(&mut self, _offset: i64) -> &mut Self {
        self
    }

    fn with_limit(&mut self, limit: i64) -> &mut Self {
        self.with_size(limit)
    }

    fn with_token(&mut self, token: &str) -> &mut Self {
        self.token = non_blank(Some(token));
        self
    }

    fn apply<B: QueryBuilder + ?Sized>(&self, builder: &mut B, cursor_field: &str) {
        match (self.token.as_deref(), self.cursor()) {
            (_, Some(cursor)) => builder.set_cursor(cursor_field, cursor.last_id),
            (Some(_), None) => {
                tracing::warn!("Ignoring malformed page token, applying limit only");
            }
            (None, None) => {}
        }
        builder.set_limit(self.size);
    }
}
