use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use super::cli::CliConfig;
use super::constants::{
    CONFIG_FILE_NAME, DEFAULT_CURSOR_FIELD, DEFAULT_MAX_CONDITIONS, DEFAULT_MAX_FILTER_DEPTH,
    DEFAULT_MAX_FILTER_JSON_SIZE, DEFAULT_MAX_PAGE_SIZE, DEFAULT_OFFSET, DEFAULT_PAGE,
    DEFAULT_PAGE_SIZE,
};
use crate::error::CompileError;
use crate::filter::field::normalize_path;

// =============================================================================
// File Configuration
// =============================================================================

#[derive(Debug, Default, Clone, Deserialize)]
pub struct FilterFileConfig {
    pub max_depth: Option<usize>,
    pub max_json_size: Option<usize>,
    pub max_conditions: Option<usize>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct PagingFileConfig {
    pub default_page_size: Option<u64>,
    pub max_page_size: Option<u64>,
    pub cursor_field: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SortFileConfig {
    pub default_field: Option<String>,
    pub default_desc: Option<bool>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub filter: Option<FilterFileConfig>,
    pub paging: Option<PagingFileConfig>,
    pub sort: Option<SortFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(filter) = other.filter {
            let current = self.filter.get_or_insert_with(FilterFileConfig::default);
            if filter.max_depth.is_some() {
                tracing::trace!(max_depth = ?filter.max_depth, "Merging filter.max_depth");
                current.max_depth = filter.max_depth;
            }
            if filter.max_json_size.is_some() {
                tracing::trace!(max_json_size = ?filter.max_json_size, "Merging filter.max_json_size");
                current.max_json_size = filter.max_json_size;
            }
            if filter.max_conditions.is_some() {
                tracing::trace!(max_conditions = ?filter.max_conditions, "Merging filter.max_conditions");
                current.max_conditions = filter.max_conditions;
            }
        }

        if let Some(paging) = other.paging {
            let current = self.paging.get_or_insert_with(PagingFileConfig::default);
            if paging.default_page_size.is_some() {
                tracing::trace!(default_page_size = ?paging.default_page_size, "Merging paging.default_page_size");
                current.default_page_size = paging.default_page_size;
            }
            if paging.max_page_size.is_some() {
                tracing::trace!(max_page_size = ?paging.max_page_size, "Merging paging.max_page_size");
                current.max_page_size = paging.max_page_size;
            }
            if paging.cursor_field.is_some() {
                tracing::trace!(cursor_field = ?paging.cursor_field, "Merging paging.cursor_field");
                current.cursor_field = paging.cursor_field;
            }
        }

        if let Some(sort) = other.sort {
            let current = self.sort.get_or_insert_with(SortFileConfig::default);
            if sort.default_field.is_some() {
                tracing::trace!(default_field = ?sort.default_field, "Merging sort.default_field");
                current.default_field = sort.default_field;
            }
            if sort.default_desc.is_some() {
                tracing::trace!(default_desc = ?sort.default_desc, "Merging sort.default_desc");
                current.default_desc = sort.default_desc;
            }
        }
    }
}

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Limits and defaults applied while compiling requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    pub max_filter_depth: usize,
    pub max_filter_json_size: usize,
    pub max_conditions: usize,
    pub default_page_size: u64,
    pub default_page: u64,
    pub default_offset: u64,
    pub cursor_field: String,
    /// 0 = unlimited
    pub max_page_size: u64,
    pub default_sort_field: Option<String>,
    pub default_sort_desc: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            max_filter_depth: DEFAULT_MAX_FILTER_DEPTH,
            max_filter_json_size: DEFAULT_MAX_FILTER_JSON_SIZE,
            max_conditions: DEFAULT_MAX_CONDITIONS,
            default_page_size: DEFAULT_PAGE_SIZE,
            default_page: DEFAULT_PAGE,
            default_offset: DEFAULT_OFFSET,
            cursor_field: DEFAULT_CURSOR_FIELD.to_string(),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            default_sort_field: None,
            default_sort_desc: false,
        }
    }
}

/// Split `-field` / `field` into field and descending flag
fn parse_default_sort(s: &str) -> (String, bool) {
    let s = s.trim();
    match s.strip_prefix('-') {
        Some(field) => (field.trim().to_string(), true),
        None => (s.trim_start_matches('+').trim().to_string(), false),
    }
}

impl CompilerConfig {
    /// Load configuration with layering: defaults -> crudq.json -> --config file -> CLI/env
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading compiler configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Local directory config - skip if not exists
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            let local_config = FileConfig::load_from_file(&local)?;
            local_config.warn_unknown_fields();
            file_config.merge(local_config);
            found_configs.push(local.display().to_string());
        }

        // 2. CLI-specified path overlays it
        if let Some(ref path) = cli.config {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            let overlay_config = FileConfig::load_from_file(path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::resolve(file_config, cli);
        config.validate()?;
        tracing::debug!(config = ?config, "Configuration resolved");
        Ok(config)
    }

    /// Layer file values and CLI/env overrides over the defaults
    fn resolve(file_config: FileConfig, cli: &CliConfig) -> Self {
        let defaults = Self::default();
        let file_filter = file_config.filter.unwrap_or_default();
        let file_paging = file_config.paging.unwrap_or_default();
        let file_sort = file_config.sort.unwrap_or_default();

        let (default_sort_field, default_sort_desc) = match cli.default_sort.as_deref() {
            Some(sort) => {
                let (field, desc) = parse_default_sort(sort);
                (Some(field), desc)
            }
            None => (
                file_sort.default_field,
                file_sort.default_desc.unwrap_or(defaults.default_sort_desc),
            ),
        };

        Self {
            max_filter_depth: cli
                .max_filter_depth
                .or(file_filter.max_depth)
                .unwrap_or(defaults.max_filter_depth),
            max_filter_json_size: cli
                .max_filter_json_size
                .or(file_filter.max_json_size)
                .unwrap_or(defaults.max_filter_json_size),
            max_conditions: cli
                .max_conditions
                .or(file_filter.max_conditions)
                .unwrap_or(defaults.max_conditions),
            default_page_size: cli
                .default_page_size
                .or(file_paging.default_page_size)
                .unwrap_or(defaults.default_page_size),
            default_page: defaults.default_page,
            default_offset: defaults.default_offset,
            cursor_field: normalize_cursor_field(
                cli.cursor_field
                    .clone()
                    .or(file_paging.cursor_field)
                    .unwrap_or(defaults.cursor_field),
            ),
            max_page_size: cli
                .max_page_size
                .or(file_paging.max_page_size)
                .unwrap_or(defaults.max_page_size),
            default_sort_field: default_sort_field.filter(|f| !f.trim().is_empty()),
            default_sort_desc,
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), CompileError> {
        if self.max_filter_depth == 0 {
            return Err(CompileError::Config(
                "filter.max_depth must be greater than 0".into(),
            ));
        }
        if self.max_filter_json_size == 0 {
            return Err(CompileError::Config(
                "filter.max_json_size must be greater than 0".into(),
            ));
        }
        if self.max_conditions == 0 {
            return Err(CompileError::Config(
                "filter.max_conditions must be greater than 0".into(),
            ));
        }
        if self.default_page_size == 0 {
            return Err(CompileError::Config(
                "paging.default_page_size must be greater than 0".into(),
            ));
        }
        if self.max_page_size > 0 && self.default_page_size > self.max_page_size {
            return Err(CompileError::Config(format!(
                "paging.default_page_size ({}) exceeds paging.max_page_size ({})",
                self.default_page_size, self.max_page_size
            )));
        }
        if normalize_path(&self.cursor_field).as_deref() != Some(self.cursor_field.as_str())
            || self.cursor_field.contains('.')
        {
            return Err(CompileError::Config(format!(
                "paging.cursor_field '{}' must be a plain snake_case column name",
                self.cursor_field
            )));
        }
        if let Some(field) = &self.default_sort_field
            && normalize_path(field).is_none()
        {
            return Err(CompileError::Config(format!(
                "sort.default_field '{}' is not a valid column name",
                field
            )));
        }
        Ok(())
    }

    /// Clamp a requested page size to the configured ceiling
    pub fn clamp_page_size(&self, size: u64) -> u64 {
        if self.max_page_size > 0 && size > self.max_page_size {
            tracing::debug!(requested = size, max = self.max_page_size, "Clamping page size");
            self.max_page_size
        } else {
            size
        }
    }
}

/// Snake-case a configured cursor column; invalid names are kept for `validate` to reject
fn normalize_cursor_field(raw: String) -> String {
    normalize_path(&raw).unwrap_or(raw)
}
