//! SQL abstraction layer for multi-database support
//!
//! This module provides abstractions for generating SQL that works across
//! different database backends (PostgreSQL, MySQL, SQLite, DuckDB,
//! ClickHouse).

mod builder;
mod clickhouse_dialect;
mod dialect;
mod duckdb_dialect;
mod mysql_dialect;
mod postgres_dialect;
mod processor;
mod sqlite_dialect;

pub use builder::SqlQuery;
pub use clickhouse_dialect::ClickhouseDialect;
pub use dialect::SqlDialect;
pub use duckdb_dialect::DuckdbDialect;
pub use mysql_dialect::MysqlDialect;
pub use postgres_dialect::PostgresDialect;
pub use processor::SqlProcessor;
pub use sqlite_dialect::SqliteDialect;

/// SQL database identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Postgres,
    Mysql,
    Sqlite,
    Duckdb,
    Clickhouse,
}

impl Dialect {
    /// Get the SQL dialect implementation
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Postgres => &PostgresDialect,
            Dialect::Mysql => &MysqlDialect,
            Dialect::Sqlite => &SqliteDialect,
            Dialect::Duckdb => &DuckdbDialect,
            Dialect::Clickhouse => &ClickhouseDialect,
        }
    }

    /// Get the dialect name
    pub fn name(&self) -> &'static str {
        self.dialect().name()
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
