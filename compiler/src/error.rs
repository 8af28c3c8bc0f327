//! Error type for query compilation
//!
//! Only structural problems surface as errors. Semantic problems inside a
//! single condition (unknown operator, bad field name, blank value) are
//! logged and skipped so the rest of the request still compiles.

use thiserror::Error;

/// Errors raised while compiling a paging request
#[derive(Error, Debug)]
pub enum CompileError {
    /// The query-string filter is not a JSON object or an array of objects
    #[error("invalid filter json: {0}")]
    InvalidFilterJson(String),

    /// The query-string filter exceeds the configured byte limit
    #[error("filter json too large: {size} bytes exceeds limit of {limit}")]
    FilterJsonTooLarge { size: usize, limit: usize },

    /// More conditions than the configured maximum
    #[error("too many filter conditions: {count} exceeds limit of {limit}")]
    TooManyConditions { count: usize, limit: usize },

    /// A structured filter expression could not be decoded
    #[error("invalid filter expression: {0}")]
    InvalidFilterExpr(String),

    /// A structured filter expression nests deeper than allowed
    #[error("filter expression nested deeper than {limit} levels")]
    FilterTooDeep { limit: usize },

    /// The paging request envelope is malformed
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl CompileError {
    /// Create an invalid filter json error
    pub fn invalid_filter_json(reason: impl Into<String>) -> Self {
        Self::InvalidFilterJson(reason.into())
    }

    /// Create a filter too large error
    pub fn filter_too_large(size: usize, limit: usize) -> Self {
        Self::FilterJsonTooLarge { size, limit }
    }

    /// Create a too many conditions error
    pub fn too_many_conditions(count: usize, limit: usize) -> Self {
        Self::TooManyConditions { count, limit }
    }

    /// Create a filter too deep error
    pub fn too_deep(limit: usize) -> Self {
        Self::FilterTooDeep { limit }
    }

    /// Whether the error was caused by the caller's input rather than setup
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;
