//! Application configuration for CourseHub.
//!
//! Lookup order: an explicit `--config` path, `./coursehub.toml`, then
//! `~/.coursehub/coursehub.toml`. CLI flags override config file values,
//! which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CourseHubError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "coursehub.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".coursehub";

// ---------------------------------------------------------------------------
// Config structs (matching coursehub.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub content: ContentConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub links: LinkCheckConfig,

    #[serde(default)]
    pub quality: QualityConfig,
}

/// `[content]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Directory holding `site.yaml`, `courses/`, `resources/`, `learning-paths/`.
    #[serde(default = "default_content_dir")]
    pub dir: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            dir: default_content_dir(),
        }
    }
}

fn default_content_dir() -> String {
    "content".into()
}

/// `[build]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Static export output directory.
    #[serde(default = "default_out_dir")]
    pub out_dir: String,

    /// Overrides `site.yaml`'s `base_url` when set (e.g. for staging).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            base_url: None,
        }
    }
}

fn default_out_dir() -> String {
    "out".into()
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Quiet period before a query update is executed.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Maximum number of hits returned per query.
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            limit: default_search_limit(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    300
}
fn default_search_limit() -> usize {
    20
}

/// `[links]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkCheckConfig {
    /// Per-request timeout. Each link gets exactly one attempt.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum concurrent requests.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Check loopback/private addresses too (off by default).
    #[serde(default)]
    pub allow_private: bool,

    /// URL glob patterns that are never checked.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

impl Default for LinkCheckConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            concurrency: default_concurrency(),
            allow_private: false,
            exclude_patterns: Vec::new(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}
fn default_concurrency() -> u32 {
    8
}

/// `[quality]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Courses not updated for this many months are reported as stale.
    #[serde(default = "default_stale_after_months")]
    pub stale_after_months: u32,

    /// Summaries shorter than this (in characters) are reported.
    #[serde(default = "default_min_summary_chars")]
    pub min_summary_chars: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            stale_after_months: default_stale_after_months(),
            min_summary_chars: default_min_summary_chars(),
        }
    }
}

fn default_stale_after_months() -> u32 {
    24
}
fn default_min_summary_chars() -> usize {
    40
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.coursehub/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CourseHubError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.coursehub/coursehub.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config. Returns defaults if no config file exists.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return load_config_from(path);
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return load_config_from(&local);
    }

    let path = config_file_path()?;
    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CourseHubError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        CourseHubError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write a default config file into `dir`. Returns the path to the created file.
pub fn init_config(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| CourseHubError::io(dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        return Err(CourseHubError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| CourseHubError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CourseHubError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let toml_str = toml::to_string_pretty(&AppConfig::default()).expect("serialize");
        assert!(toml_str.contains("out_dir"));
        assert!(toml_str.contains("debounce_ms = 300"));
    }

    #[test]
    fn config_roundtrip() {
        let toml_str = toml::to_string_pretty(&AppConfig::default()).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.content.dir, "content");
        assert_eq!(parsed.links.timeout_secs, 10);
        assert_eq!(parsed.quality.stale_after_months, 24);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[build]
out_dir = "/tmp/site"
base_url = "https://staging.example.org"

[links]
exclude_patterns = ["https://doi.org/**"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.build.out_dir, "/tmp/site");
        assert_eq!(
            config.build.base_url.as_deref(),
            Some("https://staging.example.org")
        );
        assert_eq!(config.links.exclude_patterns.len(), 1);
        assert_eq!(config.links.concurrency, 8);
        assert_eq!(config.search.limit, 20);
    }

    #[test]
    fn init_config_refuses_to_overwrite() {
        let dir = std::env::temp_dir().join(format!("ch-config-test-{}", uuid::Uuid::now_v7()));
        let path = init_config(&dir).expect("first init");
        assert!(path.exists());
        assert!(init_config(&dir).is_err());
        let loaded = load_config(Some(&path)).expect("load written config");
        assert_eq!(loaded.search.debounce_ms, 300);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
