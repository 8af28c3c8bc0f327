//! Request and filter data model

pub mod filter;
pub mod operator;
pub mod request;

pub use filter::{Condition, ExprType, FilterExpr};
pub use operator::{DatePart, Operator};
pub use request::{PagingRequest, SortOrder, Sorting};
