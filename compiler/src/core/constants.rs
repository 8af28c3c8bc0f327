// =============================================================================
// Application Identity
// =============================================================================

/// Binary name (for display, paths and identifiers)
pub const APP_NAME: &str = "crudq";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "crudq.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "CRUDQ_CONFIG";

// =============================================================================
// Environment Variables - Logging
// =============================================================================

/// Environment variable for log level/filter (falls back to RUST_LOG)
pub const ENV_LOG: &str = "CRUDQ_LOG";

/// Filter used when neither CRUDQ_LOG nor RUST_LOG is set
pub const DEFAULT_LOG_FILTER: &str = "warn,crud_query=info";

// =============================================================================
// Environment Variables - Compilation
// =============================================================================

/// Environment variable for the default target backend
pub const ENV_BACKEND: &str = "CRUDQ_BACKEND";

/// Environment variable for the maximum structured filter depth
pub const ENV_MAX_FILTER_DEPTH: &str = "CRUDQ_MAX_FILTER_DEPTH";

/// Environment variable for the maximum query-string filter size in bytes
pub const ENV_MAX_FILTER_JSON_SIZE: &str = "CRUDQ_MAX_FILTER_JSON_SIZE";

/// Environment variable for the maximum number of conditions per filter
pub const ENV_MAX_CONDITIONS: &str = "CRUDQ_MAX_CONDITIONS";

// =============================================================================
// Environment Variables - Paging and Sorting
// =============================================================================

/// Environment variable for the page size used when a request omits one
pub const ENV_DEFAULT_PAGE_SIZE: &str = "CRUDQ_DEFAULT_PAGE_SIZE";

/// Environment variable for the page size ceiling (0 = unlimited)
pub const ENV_MAX_PAGE_SIZE: &str = "CRUDQ_MAX_PAGE_SIZE";

/// Environment variable for the column cursor tokens compare against
pub const ENV_CURSOR_FIELD: &str = "CRUDQ_CURSOR_FIELD";

/// Environment variable for the sort applied when a request has none
/// (`field` or `-field`)
pub const ENV_DEFAULT_SORT: &str = "CRUDQ_DEFAULT_SORT";

// =============================================================================
// Filter Defaults
// =============================================================================

/// Maximum nesting of structured filter groups
pub const DEFAULT_MAX_FILTER_DEPTH: usize = 32;

/// Maximum size of a query-string filter (64KB)
pub const DEFAULT_MAX_FILTER_JSON_SIZE: usize = 64 * 1024;

/// Maximum number of conditions in one filter
pub const DEFAULT_MAX_CONDITIONS: usize = 100;

// =============================================================================
// Paging Defaults
// =============================================================================

/// Page size when a request gives a page or token but no size
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// First page number
pub const DEFAULT_PAGE: u64 = 1;

/// Offset when a request gives a limit but no offset
pub const DEFAULT_OFFSET: u64 = 0;

/// Page size ceiling (0 = unlimited)
pub const DEFAULT_MAX_PAGE_SIZE: u64 = 0;

/// Monotonic column used by cursor tokens
pub const DEFAULT_CURSOR_FIELD: &str = "id";
