//! InfluxQL statements
//!
//! Fragments reuse the shared parameterized `Fragment`; values are bound as
//! `$pN` parameters sent alongside the statement.

mod builder;
mod processor;

pub use builder::InfluxQuery;
pub use processor::InfluxProcessor;

/// Double-quoted InfluxQL identifier
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\\\""))
}
