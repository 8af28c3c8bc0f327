//! Filter compilation
//!
//! Two front ends share one operator dispatcher: structured `FilterExpr`
//! trees and flat `field__op__part` query-string objects.

pub mod field;
pub mod processor;
pub mod query_string;
pub mod structured;

pub use field::FieldRef;
pub use processor::{Case, Comparison, Processor};
pub use query_string::QueryStringFilter;
pub use structured::StructuredFilter;
