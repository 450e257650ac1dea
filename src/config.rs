//! Configuration management using the prefer crate for discovery.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crawler::{CrawlOptions, DEFAULT_ORIGIN, DEFAULT_WORKERS};
use crate::models::{GeographicArea, SearchQuery};
use crate::render::RenderEngineConfig;

/// Config file basename looked up by prefer.
pub const CONFIG_NAME: &str = "centris";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {format} config {path}: {message}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },
}

/// Search filter overrides. Unset keys keep the default query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geography_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geography_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selling_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub land_area_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_min: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_max: Option<u64>,
}

impl QueryConfig {
    pub fn to_query(&self) -> SearchQuery {
        let defaults = SearchQuery::default();
        let geography = GeographicArea {
            text: self
                .geography_text
                .clone()
                .unwrap_or_else(|| defaults.geography().text.clone()),
            id: self
                .geography_id
                .clone()
                .unwrap_or_else(|| defaults.geography().id.clone()),
        };
        let (default_min, default_max) = defaults.price_range();

        SearchQuery::new(geography)
            .with_category(self.category.as_deref().unwrap_or(defaults.category()))
            .with_selling_type(
                self.selling_type
                    .as_deref()
                    .unwrap_or(defaults.selling_type()),
            )
            .with_land_area_unit(
                self.land_area_unit
                    .as_deref()
                    .unwrap_or(defaults.land_area_unit()),
            )
            .with_price_range(
                self.price_min.unwrap_or(default_min),
                self.price_max.unwrap_or(default_max),
            )
    }
}

/// Configuration file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Site origin all API paths are joined to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// User agent: a literal string, or "impersonate" for a real browser UA.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_context: Option<u64>,
    /// Concurrent detail renders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u64>,
    /// Records file (JSON Lines). Relative paths resolve against the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Enrichment failures file (JSON Lines).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failures: Option<String>,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub render: RenderEngineConfig,
    /// Path the config was loaded from.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Discover a `centris.*` config file via prefer, falling back to defaults.
    pub async fn load() -> Self {
        match prefer::load(CONFIG_NAME).await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!("{}; using defaults", e);
                        Self::default_with_env()
                    }
                },
                None => Self::default_with_env(),
            },
            Err(_) => Self::default_with_env(),
        }
    }

    /// Defaults with BROWSER_URL / SPLASH_URL applied.
    pub fn default_with_env() -> Self {
        let mut config = Self::default();
        config.render = config.render.with_env_overrides();
        config
    }

    /// Load from a specific file; the extension selects TOML, YAML or JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let mut config = Self::parse(&contents, path)?;
        config.source_path = Some(path.to_path_buf());
        config.render = config.render.with_env_overrides();
        Ok(config)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_error = |format: &'static str, message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            format,
            message,
        };

        match ext {
            "toml" => toml::from_str(contents).map_err(|e| parse_error("TOML", e.to_string())),
            "yaml" | "yml" => {
                serde_yaml::from_str(contents).map_err(|e| parse_error("YAML", e.to_string()))
            }
            _ => serde_json::from_str(contents).map_err(|e| parse_error("JSON", e.to_string())),
        }
    }

    /// Directory of the config file, if it came from one.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Expand `~` and resolve relative paths against `base_dir`.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref base_url) = self.base_url {
            settings.base_url = base_url.clone();
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(user_context) = self.user_context {
            settings.user_context = user_context;
        }
        if let Some(workers) = self.workers {
            settings.workers = workers;
        }
        if let Some(max_pages) = self.max_pages {
            settings.max_pages = Some(max_pages);
        }
        if let Some(ref output) = self.output {
            settings.output = Some(self.resolve_path(output, base_dir));
        }
        if let Some(ref failures) = self.failures {
            settings.failures = Some(self.resolve_path(failures, base_dir));
        }
        settings.query = self.query.to_query();
        settings.render = self.render.clone();
    }
}

/// Effective settings for one run.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub base_url: String,
    /// None uses the crawler's own user agent.
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    pub user_context: u64,
    pub workers: usize,
    pub max_pages: Option<u64>,
    /// None writes records to stdout.
    pub output: Option<PathBuf>,
    pub failures: Option<PathBuf>,
    pub query: SearchQuery,
    pub render: RenderEngineConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ORIGIN.to_string(),
            user_agent: None,
            request_timeout: 30,
            user_context: 0,
            workers: DEFAULT_WORKERS,
            max_pages: None,
            output: None,
            failures: None,
            query: SearchQuery::default(),
            render: RenderEngineConfig::default(),
        }
    }
}

impl Settings {
    pub fn crawl_options(&self) -> CrawlOptions {
        CrawlOptions {
            user_context: self.user_context,
            workers: self.workers,
            max_pages: self.max_pages,
            render: self.render.render_config(),
            ..CrawlOptions::default()
        }
    }
}

/// Load config (explicit path or discovery) and resolve settings.
///
/// An explicit path that cannot be read or parsed is an error; discovery
/// failures fall back to defaults.
pub async fn load_settings(config_path: Option<&Path>) -> Result<(Settings, Config), ConfigError> {
    let config = match config_path {
        Some(path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);
    Ok((settings, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderEngine;
    use tempfile::tempdir;

    #[test]
    fn test_empty_query_config_is_default_query() {
        assert_eq!(QueryConfig::default().to_query(), SearchQuery::default());
    }

    #[test]
    fn test_query_overrides() {
        let config = QueryConfig {
            geography_text: Some("Laval".to_string()),
            geography_id: Some("GSGS4622".to_string()),
            price_max: Some(500_000),
            ..Default::default()
        };
        let query = config.to_query();
        assert_eq!(query.geography().id, "GSGS4622");
        assert_eq!(query.price_range(), (0, 500_000));
        assert_eq!(query.category(), "Residential");
    }

    #[tokio::test]
    async fn test_load_toml_and_resolve_paths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("centris.toml");
        std::fs::write(
            &path,
            r#"
workers = 8
max_pages = 3
output = "out/listings.jsonl"

[query]
category = "Commercial"

[render]
engine = "splash"
splash_url = "http://localhost:8050"
"#,
        )
        .unwrap();

        let (settings, config) = load_settings(Some(&path)).await.unwrap();
        assert_eq!(config.source_path.as_deref(), Some(path.as_path()));
        assert_eq!(settings.workers, 8);
        assert_eq!(settings.max_pages, Some(3));
        assert_eq!(settings.output, Some(dir.path().join("out/listings.jsonl")));
        assert_eq!(settings.query.category(), "Commercial");
        assert_eq!(settings.render.engine, RenderEngine::Splash);
        assert_eq!(settings.base_url, DEFAULT_ORIGIN);
    }

    #[tokio::test]
    async fn test_load_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("centris.yaml");
        std::fs::write(&path, "user_context: 2\nbase_url: http://localhost:9000\n").unwrap();

        let (settings, _) = load_settings(Some(&path)).await.unwrap();
        assert_eq!(settings.user_context, 2);
        assert_eq!(settings.base_url, "http://localhost:9000");
    }

    #[tokio::test]
    async fn test_invalid_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("centris.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Config::load_from_path(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { format: "JSON", .. }));
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let err = Config::load_from_path(Path::new("/nonexistent/centris.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_crawl_options_from_settings() {
        let settings = Settings {
            workers: 2,
            max_pages: Some(5),
            ..Default::default()
        };
        let options = settings.crawl_options();
        assert_eq!(options.workers, 2);
        assert_eq!(options.max_pages, Some(5));
        assert!(!options.render.images);
    }
}
