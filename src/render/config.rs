//! Rendering engine configuration types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::RenderConfig;

/// Rendering engine selection and connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderEngineConfig {
    #[serde(default)]
    pub engine: RenderEngine,

    /// Run Chromium in headless mode (default: true).
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Proxy server URL for the browser (e.g., "socks5://127.0.0.1:1080").
    #[serde(default)]
    pub proxy: Option<String>,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,

    /// Remote Chrome DevTools URL (e.g., "ws://localhost:9222").
    /// If set, connects to existing browser instead of launching one.
    #[serde(default)]
    pub remote_url: Option<String>,

    /// Splash service base URL (e.g., "http://localhost:8050").
    #[serde(default)]
    pub splash_url: Option<String>,

    #[serde(default)]
    pub splash_user: Option<String>,

    #[serde(default)]
    pub splash_password: Option<String>,

    /// Wait after navigation, in milliseconds.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Render timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub images: bool,

    #[serde(default)]
    pub scripts: bool,

    #[serde(default = "default_blocked")]
    pub block_url_substrings: Vec<String>,
}

impl Default for RenderEngineConfig {
    fn default() -> Self {
        Self {
            engine: RenderEngine::default(),
            headless: default_headless(),
            proxy: None,
            chrome_args: Vec::new(),
            remote_url: None,
            splash_url: None,
            splash_user: None,
            splash_password: None,
            settle_delay_ms: default_settle_delay_ms(),
            timeout: default_timeout(),
            images: false,
            scripts: false,
            block_url_substrings: default_blocked(),
        }
    }
}

pub fn default_headless() -> bool {
    true
}

pub fn default_timeout() -> u64 {
    30
}

fn default_settle_delay_ms() -> u64 {
    500
}

fn default_blocked() -> Vec<String> {
    vec!["css".to_string()]
}

impl RenderEngineConfig {
    /// Apply environment variable overrides (BROWSER_URL, SPLASH_URL).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("BROWSER_URL") {
            if !url.is_empty() {
                self.remote_url = Some(url);
            }
        }
        if let Ok(url) = std::env::var("SPLASH_URL") {
            if !url.is_empty() {
                self.splash_url = Some(url);
            }
        }
        self
    }

    /// Per-request options derived from these settings.
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            images: self.images,
            scripts: self.scripts,
            blocked_url_substrings: self.block_url_substrings.clone(),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            timeout: Duration::from_secs(self.timeout),
        }
    }
}

/// Rendering engines.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RenderEngine {
    /// Chromium over the DevTools protocol (default).
    #[default]
    Browser,
    /// Splash rendering service over HTTP.
    Splash,
}
