//! Utility functions shared by the compilers and backends

pub mod sql;
pub mod string;
