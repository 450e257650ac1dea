//! Rendering fetches for JavaScript-populated detail pages.
//!
//! A [`Renderer`] takes a URL plus a [`RenderConfig`] and returns the fully
//! rendered markup. Two engines are provided: a local or remote Chromium
//! driven over CDP, and a Splash rendering service reached over HTTP.

mod browser;
mod config;
mod splash;

pub use browser::BrowserRenderer;
pub use config::{RenderEngine, RenderEngineConfig};
pub use splash::{lua_script, SplashRenderer};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::http_client::{Transport, TransportError};

/// Per-request rendering options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Load images.
    pub images: bool,
    /// Execute page scripts.
    pub scripts: bool,
    /// Abort any sub-request whose URL contains one of these substrings.
    pub blocked_url_substrings: Vec<String>,
    /// Fixed wait after navigation so late content can materialize.
    pub settle_delay: Duration,
    /// Upper bound on the whole render.
    pub timeout: Duration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            images: false,
            scripts: false,
            blocked_url_substrings: vec!["css".to_string()],
            settle_delay: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render service unavailable: {0}")]
    Unavailable(String),
    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },
    #[error("render of {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    #[error("render service returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Headless rendering service.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &str, config: &RenderConfig) -> Result<String, RenderError>;
}

/// Build the renderer selected by `config`.
///
/// Splash requests go through `transport`; the browser engine manages its
/// own connection and launches lazily on first use.
pub fn build_renderer(
    config: &RenderEngineConfig,
    transport: Arc<dyn Transport>,
) -> Result<Arc<dyn Renderer>, RenderError> {
    match config.engine {
        RenderEngine::Browser => Ok(Arc::new(BrowserRenderer::new(config.clone()))),
        RenderEngine::Splash => {
            let url = config.splash_url.clone().ok_or_else(|| {
                RenderError::Unavailable("splash engine selected but no splash_url set".into())
            })?;
            let mut renderer = SplashRenderer::new(url, transport);
            if let Some(ref user) = config.splash_user {
                renderer = renderer
                    .with_credentials(user.clone(), config.splash_password.clone().unwrap_or_default());
            }
            Ok(Arc::new(renderer))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{HttpRequest, HttpResponse};

    struct NoTransport;

    #[async_trait]
    impl Transport for NoTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            Err(TransportError::Request {
                url: request.url,
                message: "offline".to_string(),
            })
        }
    }

    #[test]
    fn test_default_config_disables_assets() {
        let config = RenderConfig::default();
        assert!(!config.images);
        assert!(!config.scripts);
        assert_eq!(config.blocked_url_substrings, vec!["css".to_string()]);
        assert_eq!(config.settle_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_splash_engine_requires_url() {
        let config = RenderEngineConfig {
            engine: RenderEngine::Splash,
            splash_url: None,
            ..Default::default()
        };
        let result = build_renderer(&config, Arc::new(NoTransport));
        assert!(matches!(result, Err(RenderError::Unavailable(_))));
    }

    #[test]
    fn test_splash_engine_builds_with_url() {
        let config = RenderEngineConfig {
            engine: RenderEngine::Splash,
            splash_url: Some("http://localhost:8050".to_string()),
            ..Default::default()
        };
        assert!(build_renderer(&config, Arc::new(NoTransport)).is_ok());
    }
}
