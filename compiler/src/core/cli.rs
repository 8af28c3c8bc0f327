use clap::{ArgGroup, Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    APP_NAME, ENV_BACKEND, ENV_CONFIG, ENV_CURSOR_FIELD, ENV_DEFAULT_PAGE_SIZE, ENV_DEFAULT_SORT,
    ENV_MAX_CONDITIONS, ENV_MAX_FILTER_DEPTH, ENV_MAX_FILTER_JSON_SIZE, ENV_MAX_PAGE_SIZE,
};
use crate::backend::BackendKind;

#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(version, about = "Compile paging requests into native database queries", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Maximum nesting of structured filter groups
    #[arg(long, global = true, env = ENV_MAX_FILTER_DEPTH)]
    pub max_filter_depth: Option<usize>,

    /// Maximum size of a query-string filter in bytes
    #[arg(long, global = true, env = ENV_MAX_FILTER_JSON_SIZE)]
    pub max_filter_json_size: Option<usize>,

    /// Maximum number of conditions in one filter
    #[arg(long, global = true, env = ENV_MAX_CONDITIONS)]
    pub max_conditions: Option<usize>,

    /// Page size used when a request omits one
    #[arg(long, global = true, env = ENV_DEFAULT_PAGE_SIZE)]
    pub default_page_size: Option<u64>,

    /// Page size ceiling (0 = unlimited)
    #[arg(long, global = true, env = ENV_MAX_PAGE_SIZE)]
    pub max_page_size: Option<u64>,

    /// Column compared against cursor tokens
    #[arg(long, global = true, env = ENV_CURSOR_FIELD)]
    pub cursor_field: Option<String>,

    /// Sort applied when a request has none (`field` or `-field`)
    #[arg(long, global = true, env = ENV_DEFAULT_SORT)]
    pub default_sort: Option<String>,
}

/// Parse backend kind from CLI/env string
fn parse_backend(s: &str) -> Result<BackendKind, String> {
    s.parse()
}

/// Parse the request argument: inline JSON, `@path` or `-` for stdin
fn parse_request_source(s: &str) -> Result<RequestSource, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Request must not be empty".to_string());
    }
    Ok(match s {
        "-" => RequestSource::Stdin,
        _ => match s.strip_prefix('@') {
            Some(path) if !path.is_empty() => RequestSource::File(PathBuf::from(path)),
            Some(_) => return Err("Missing file path after '@'".to_string()),
            None => RequestSource::Inline(s.to_string()),
        },
    })
}

/// Where the paging request JSON comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestSource {
    Inline(String),
    File(PathBuf),
    Stdin,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Compile a paging request into a native query
    Compile {
        /// Target backend
        #[arg(long, short = 'b', env = ENV_BACKEND, value_parser = parse_backend, default_value = "postgres")]
        backend: BackendKind,

        /// Table, collection, measurement or index name
        #[arg(long, short = 't')]
        table: String,

        /// Paging request JSON, `@file` or `-` for stdin
        #[arg(long, short = 'r', value_parser = parse_request_source, default_value = "{}")]
        request: RequestSource,

        /// Also print the count query
        #[arg(long)]
        count: bool,
    },
    /// List operators and date parts with their accepted names
    Operators,
    /// Encode or decode cursor tokens
    #[command(group(ArgGroup::new("action").required(true).args(["last_id", "decode"])))]
    Token {
        /// Encode a token pointing past this id
        #[arg(long, allow_negative_numbers = true)]
        last_id: Option<i64>,

        /// Decode a token
        #[arg(long)]
        decode: Option<String>,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub max_filter_depth: Option<usize>,
    pub max_filter_json_size: Option<usize>,
    pub max_conditions: Option<usize>,
    pub default_page_size: Option<u64>,
    pub max_page_size: Option<u64>,
    pub cursor_field: Option<String>,
    pub default_sort: Option<String>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let config = CliConfig {
        config: cli.config,
        max_filter_depth: cli.max_filter_depth,
        max_filter_json_size: cli.max_filter_json_size,
        max_conditions: cli.max_conditions,
        default_page_size: cli.default_page_size,
        max_page_size: cli.max_page_size,
        cursor_field: cli.cursor_field,
        default_sort: cli.default_sort,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compile_command() {
        let cli = Cli::try_parse_from([
            "crudq",
            "compile",
            "--backend",
            "mongo",
            "--table",
            "users",
            "--request",
            r#"{"page": 1}"#,
            "--max-page-size",
            "50",
        ])
        .unwrap();
        assert_eq!(cli.max_page_size, Some(50));
        match cli.command {
            Commands::Compile {
                backend,
                table,
                request,
                count,
            } => {
                assert_eq!(backend, BackendKind::Mongo);
                assert_eq!(table, "users");
                assert_eq!(request, RequestSource::Inline(r#"{"page": 1}"#.to_string()));
                assert!(!count);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_invalid_backend() {
        let result = Cli::try_parse_from(["crudq", "compile", "-b", "oracle", "-t", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_token_requires_action() {
        assert!(Cli::try_parse_from(["crudq", "token"]).is_err());
        let cli = Cli::try_parse_from(["crudq", "token", "--last-id", "42"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Token {
                last_id: Some(42),
                decode: None
            }
        ));
    }

    #[test]
    fn test_request_source() {
        assert_eq!(parse_request_source("-"), Ok(RequestSource::Stdin));
        assert_eq!(
            parse_request_source("@req.json"),
            Ok(RequestSource::File(PathBuf::from("req.json")))
        );
        assert!(parse_request_source("@").is_err());
        assert!(parse_request_source("  ").is_err());
    }
}
