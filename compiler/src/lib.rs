pub mod app;
pub mod backend;
pub mod compiler;
pub mod core;
pub mod error;
pub mod filter;
pub mod pagination;
pub mod sorting;
pub mod types;
pub mod utils;

pub use backend::{BackendKind, QueryBuilder};
pub use compiler::{CompiledQuery, NativeQuery, QueryCompiler};
pub use error::{CompileError, Result};
pub use filter::{Processor, QueryStringFilter, StructuredFilter};
pub use pagination::{Pagination, PaginationMode, Paginator};
pub use types::{Condition, DatePart, ExprType, FilterExpr, Operator, PagingRequest};
