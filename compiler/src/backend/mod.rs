//! Native query builders and their processors
//!
//! Each backend pairs a builder handle (the query being assembled) with a
//! `Processor` that turns conditions into that backend's fragments.

pub mod elastic;
pub mod fragment;
pub mod influx;
pub mod mongo;
pub mod sql;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::sorting::SortKey;

pub use fragment::{Fragment, QueryParam};

/// Single-key JSON document `{key: value}`
pub(crate) fn doc(key: impl Into<String>, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.into(), value);
    Value::Object(map)
}

/// Builder handle that compiled fragments, sorts and paging are applied to
pub trait QueryBuilder {
    type Fragment;

    /// Add a filter fragment; multiple fragments are conjoined
    fn push_filter(&mut self, fragment: Self::Fragment);

    /// Add a sort key; returns false when the backend cannot sort on it
    fn push_sort(&mut self, key: &SortKey) -> bool;

    fn set_limit(&mut self, limit: u64);

    fn set_offset(&mut self, offset: u64);

    /// Keep only rows whose `field` is greater than `last_id`
    fn set_cursor(&mut self, field: &str, last_id: i64);

    /// Restrict the returned fields
    fn select(&mut self, fields: &[String]);
}

/// Supported native targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Postgres,
    Mysql,
    Sqlite,
    Duckdb,
    Clickhouse,
    Mongo,
    Influx,
    Elastic,
}

impl BackendKind {
    pub const ALL: [BackendKind; 8] = [
        BackendKind::Postgres,
        BackendKind::Mysql,
        BackendKind::Sqlite,
        BackendKind::Duckdb,
        BackendKind::Clickhouse,
        BackendKind::Mongo,
        BackendKind::Influx,
        BackendKind::Elastic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Postgres => "postgres",
            BackendKind::Mysql => "mysql",
            BackendKind::Sqlite => "sqlite",
            BackendKind::Duckdb => "duckdb",
            BackendKind::Clickhouse => "clickhouse",
            BackendKind::Mongo => "mongo",
            BackendKind::Influx => "influx",
            BackendKind::Elastic => "elastic",
        }
    }

    /// SQL dialect, `None` for non-SQL targets
    pub fn sql_dialect(&self) -> Option<sql::Dialect> {
        match self {
            BackendKind::Postgres => Some(sql::Dialect::Postgres),
            BackendKind::Mysql => Some(sql::Dialect::Mysql),
            BackendKind::Sqlite => Some(sql::Dialect::Sqlite),
            BackendKind::Duckdb => Some(sql::Dialect::Duckdb),
            BackendKind::Clickhouse => Some(sql::Dialect::Clickhouse),
            BackendKind::Mongo | BackendKind::Influx | BackendKind::Elastic => None,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(BackendKind::Postgres),
            "mysql" | "mariadb" => Ok(BackendKind::Mysql),
            "sqlite" => Ok(BackendKind::Sqlite),
            "duckdb" => Ok(BackendKind::Duckdb),
            "clickhouse" => Ok(BackendKind::Clickhouse),
            "mongo" | "mongodb" => Ok(BackendKind::Mongo),
            "influx" | "influxdb" | "influxql" => Ok(BackendKind::Influx),
            "elastic" | "elasticsearch" | "opensearch" => Ok(BackendKind::Elastic),
            _ => Err(format!(
                "Invalid backend '{}'. Valid options: postgres, mysql, sqlite, duckdb, \
                 clickhouse, mongo, influx, elastic",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_from_str() {
        assert_eq!("PostgreSQL".parse::<BackendKind>(), Ok(BackendKind::Postgres));
        assert_eq!("mongodb".parse::<BackendKind>(), Ok(BackendKind::Mongo));
        assert!("oracle".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_backend_kind_names_parse_back() {
        for kind in BackendKind::ALL {
            assert_eq!(kind.name().parse::<BackendKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_sql_dialect() {
        assert_eq!(BackendKind::Mysql.sql_dialect(), Some(sql::Dialect::Mysql));
        assert_eq!(BackendKind::Elastic.sql_dialect(), None);
    }
}
