//! Core application

use std::io::Read;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::backend::BackendKind;
use crate::compiler::{CompiledQuery, QueryCompiler};
use crate::core::cli::{self, CliConfig, Commands, RequestSource};
use crate::core::config::CompilerConfig;
use crate::core::constants::{DEFAULT_LOG_FILTER, ENV_LOG};
use crate::pagination::TokenPaginator;
use crate::types::{DatePart, Operator, PagingRequest};

/// Keys of the native query that only concern the count statement
const COUNT_KEYS: [&str; 4] = ["count_sql", "count_params", "count_query", "count"];

pub struct CoreApp {
    pub config: CompilerConfig,
    pub compiler: QueryCompiler,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Commands::Compile {
                backend,
                table,
                request,
                count,
            } => {
                let app = Self::init(&cli_config)?;
                app.compile(backend, &table, &request, count)
            }
            Commands::Operators => {
                Self::print_operators();
                Ok(())
            }
            Commands::Token { last_id, decode } => Self::handle_token(last_id, decode.as_deref()),
        }
    }

    /// Load configuration and build the compiler
    pub fn init(cli_config: &CliConfig) -> Result<Self> {
        let config = CompilerConfig::load(cli_config)?;
        tracing::debug!(
            max_filter_depth = config.max_filter_depth,
            max_conditions = config.max_conditions,
            default_page_size = config.default_page_size,
            max_page_size = config.max_page_size,
            cursor_field = %config.cursor_field,
            "Configuration loaded"
        );
        Ok(Self {
            compiler: QueryCompiler::new(config.clone()),
            config,
        })
    }

    fn init_logging() {
        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    fn compile(
        &self,
        backend: BackendKind,
        table: &str,
        source: &RequestSource,
        count: bool,
    ) -> Result<()> {
        let text = read_request(source)?;
        let request = PagingRequest::from_json(&text)?;
        let compiled = self.compiler.compile_for(backend, table, &request)?;
        tracing::info!(
            backend = %backend,
            table,
            paged = compiled.page.is_some(),
            "Compiled request"
        );
        let output = render(&compiled, count)?;
        println!("{}", output);
        Ok(())
    }

    fn print_operators() {
        println!("Operators:");
        for op in Operator::ALL {
            println!("  {:<22} {}", op.name(), op.number());
        }
        println!();
        println!("Date parts:");
        for part in DatePart::ALL {
            println!("  {}", part.name());
        }
    }

    fn handle_token(last_id: Option<i64>, decode: Option<&str>) -> Result<()> {
        if let Some(id) = last_id {
            println!("{}", TokenPaginator::encode(id));
            return Ok(());
        }
        if let Some(token) = decode {
            let cursor = TokenPaginator::decode(token)
                .with_context(|| format!("Invalid cursor token: {}", token))?;
            println!("{}", serde_json::to_string(&cursor)?);
        }
        Ok(())
    }
}

/// Read request JSON from its source
fn read_request(source: &RequestSource) -> Result<String> {
    match source {
        RequestSource::Inline(json) => Ok(json.clone()),
        RequestSource::File(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file: {}", path.display())),
        RequestSource::Stdin => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request from stdin")?;
            Ok(buf)
        }
    }
}

/// Pretty JSON output; count statements only when requested
fn render(compiled: &CompiledQuery, with_count: bool) -> Result<String> {
    let mut value = serde_json::to_value(compiled)?;
    if !with_count && let Some(Value::Object(query)) = value.get_mut("query") {
        for key in COUNT_KEYS {
            query.remove(key);
        }
    }
    Ok(serde_json::to_string_pretty(&value)?)
}
