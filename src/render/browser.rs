//! Chromium renderer driven over the DevTools protocol.

#[cfg(feature = "browser")]
use std::sync::Arc;

use async_trait::async_trait;
#[cfg(feature = "browser")]
use tokio::sync::Mutex;
#[cfg(feature = "browser")]
use tracing::{debug, info};

#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::emulation::SetScriptExecutionDisabledParams;
#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::{EnableParams, SetBlockedUrLsParams};
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;

use super::{RenderConfig, RenderEngineConfig, RenderError, Renderer};

/// Extensions blocked when image loading is off.
#[cfg(feature = "browser")]
const IMAGE_PATTERNS: &[&str] = &[
    "*.png*", "*.jpg*", "*.jpeg*", "*.gif*", "*.webp*", "*.svg*", "*.ico*",
];

/// Renders pages in a shared Chromium instance, one tab per request.
#[cfg(feature = "browser")]
pub struct BrowserRenderer {
    config: RenderEngineConfig,
    browser: Mutex<Option<Arc<Mutex<Browser>>>>,
}

#[cfg(feature = "browser")]
impl BrowserRenderer {
    const CHROME_PATHS: &'static [&'static str] = &[
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/opt/google/chrome/google-chrome",
    ];

    pub fn new(config: RenderEngineConfig) -> Self {
        Self {
            config,
            browser: Mutex::new(None),
        }
    }

    fn find_chrome() -> Result<std::path::PathBuf, RenderError> {
        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                info!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
                if output.status.success() {
                    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !path.is_empty() {
                        info!("Found Chrome in PATH: {}", path);
                        return Ok(std::path::PathBuf::from(path));
                    }
                }
            }
        }

        Err(RenderError::Unavailable(
            "Chrome/Chromium not found; install it or set BROWSER_URL".to_string(),
        ))
    }

    /// Launch or connect to the browser on first use.
    async fn ensure_browser(&self) -> Result<Arc<Mutex<Browser>>, RenderError> {
        let mut slot = self.browser.lock().await;
        if let Some(browser) = slot.as_ref() {
            return Ok(browser.clone());
        }

        let browser = match self.config.remote_url.clone() {
            Some(remote_url) => Self::connect_remote(&remote_url).await?,
            None => self.launch().await?,
        };
        let browser = Arc::new(Mutex::new(browser));
        *slot = Some(browser.clone());
        Ok(browser)
    }

    async fn launch(&self) -> Result<Browser, RenderError> {
        info!("Launching browser (headless={})", self.config.headless);
        let chrome_path = Self::find_chrome()?;

        let mut builder = BrowserConfig::builder().chrome_executable(chrome_path);
        if !self.config.headless {
            builder = builder.with_head();
        }
        if let Some(ref proxy) = self.config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }
        builder = builder
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--no-sandbox")
            .arg("--disable-gpu");
        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }

        let config = builder
            .build()
            .map_err(|e| RenderError::Unavailable(format!("invalid browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Unavailable(format!("failed to launch browser: {}", e)))?;

        tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok(browser)
    }

    /// Connect to a remote Chrome through its `/json/version` endpoint.
    async fn connect_remote(url: &str) -> Result<Browser, RenderError> {
        info!("Connecting to remote browser at {}", url);
        let unavailable = |e: String| RenderError::Unavailable(e);

        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .send()
            .await
            .map_err(|e| unavailable(format!("failed to reach remote browser: {}", e)))?
            .json()
            .await
            .map_err(|e| unavailable(format!("failed to parse browser version info: {}", e)))?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| unavailable("no webSocketDebuggerUrl in response".to_string()))?;

        let (browser, mut handler) = Browser::connect(ws_url)
            .await
            .map_err(|e| unavailable(format!("failed to connect to remote browser: {}", e)))?;

        tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok(browser)
    }

    async fn render_page(page: &Page, url: &str, config: &RenderConfig) -> Result<String, RenderError> {
        let nav_error = |e: chromiumoxide::error::CdpError| RenderError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        };

        let patterns = blocked_patterns(config);
        if !patterns.is_empty() {
            page.execute(EnableParams::default()).await.map_err(nav_error)?;
            page.execute(SetBlockedUrLsParams::new(patterns))
                .await
                .map_err(nav_error)?;
        }
        if !config.scripts {
            page.execute(SetScriptExecutionDisabledParams::new(true))
                .await
                .map_err(nav_error)?;
        }

        debug!("Navigating to {}", url);
        page.goto(url).await.map_err(nav_error)?;
        tokio::time::sleep(config.settle_delay).await;

        page.content().await.map_err(nav_error)
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl Renderer for BrowserRenderer {
    async fn render(&self, url: &str, config: &RenderConfig) -> Result<String, RenderError> {
        let browser = self.ensure_browser().await?;
        let page = {
            let browser = browser.lock().await;
            browser
                .new_page("about:blank")
                .await
                .map_err(|e| RenderError::Unavailable(format!("failed to open tab: {}", e)))?
        };

        let result = tokio::time::timeout(config.timeout, Self::render_page(&page, url, config))
            .await
            .unwrap_or_else(|_| {
                Err(RenderError::Timeout {
                    url: url.to_string(),
                    timeout: config.timeout,
                })
            });

        let _ = page.close().await;
        result
    }
}

/// CDP URL patterns for every sub-request the config blocks.
#[cfg(feature = "browser")]
fn blocked_patterns(config: &RenderConfig) -> Vec<String> {
    let mut patterns: Vec<String> = config
        .blocked_url_substrings
        .iter()
        .map(|s| format!("*{}*", s))
        .collect();
    if !config.images {
        patterns.extend(IMAGE_PATTERNS.iter().map(|p| p.to_string()));
    }
    patterns
}

/// Stand-in used when the crate is built without the `browser` feature.
#[cfg(not(feature = "browser"))]
pub struct BrowserRenderer;

#[cfg(not(feature = "browser"))]
impl BrowserRenderer {
    pub fn new(_config: RenderEngineConfig) -> Self {
        Self
    }
}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl Renderer for BrowserRenderer {
    async fn render(&self, _url: &str, _config: &RenderConfig) -> Result<String, RenderError> {
        Err(RenderError::Unavailable(
            "browser support not compiled in; rebuild with --features browser or use splash"
                .to_string(),
        ))
    }
}

#[cfg(all(test, feature = "browser"))]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_patterns_wrap_substrings() {
        let patterns = blocked_patterns(&RenderConfig::default());
        assert!(patterns.contains(&"*css*".to_string()));
        assert!(patterns.contains(&"*.png*".to_string()));
    }

    #[test]
    fn test_blocked_patterns_keep_images_when_enabled() {
        let config = RenderConfig {
            images: true,
            blocked_url_substrings: Vec::new(),
            ..Default::default()
        };
        assert!(blocked_patterns(&config).is_empty());
    }
}
