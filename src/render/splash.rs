//! Splash rendering service client.
//!
//! Rendering is delegated to a Splash instance through its `/execute`
//! endpoint; the render options are compiled into the Lua script it runs.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::{RenderConfig, RenderError, Renderer};
use crate::http_client::{HttpRequest, Transport};

/// Extra time granted to the HTTP round-trip beyond Splash's own timeout.
const TRANSPORT_GRACE: Duration = Duration::from_secs(5);

pub struct SplashRenderer {
    base_url: String,
    transport: Arc<dyn Transport>,
    credentials: Option<(String, String)>,
}

impl SplashRenderer {
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            credentials: None,
        }
    }

    /// Authenticate against Splash with HTTP basic auth.
    pub fn with_credentials(mut self, user: String, password: String) -> Self {
        self.credentials = Some((user, password));
        self
    }

    fn execute_url(&self) -> String {
        format!("{}/execute", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Renderer for SplashRenderer {
    async fn render(&self, url: &str, config: &RenderConfig) -> Result<String, RenderError> {
        let mut request = HttpRequest::post(self.execute_url()).json(json!({
            "lua_source": lua_script(config),
            "url": url,
            "timeout": config.timeout.as_secs_f64(),
        }));
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user.clone(), password.clone());
        }

        debug!("Rendering {} via splash", url);
        let deadline = config.timeout + TRANSPORT_GRACE;
        let response = tokio::time::timeout(deadline, self.transport.send(request))
            .await
            .map_err(|_| RenderError::Timeout {
                url: url.to_string(),
                timeout: deadline,
            })??;

        if !response.is_success() {
            return Err(RenderError::Status {
                url: url.to_string(),
                status: response.status.as_u16(),
            });
        }

        Ok(response.text_lossy().into_owned())
    }
}

/// Lua program Splash runs for one render.
pub fn lua_script(config: &RenderConfig) -> String {
    let mut script = String::from("function main(splash, args)\n");
    let _ = writeln!(script, "  splash.images_enabled = {}", config.images);
    let _ = writeln!(script, "  splash.js_enabled = {}", config.scripts);

    if !config.blocked_url_substrings.is_empty() {
        let condition = config
            .blocked_url_substrings
            .iter()
            .map(|s| format!("request.url:find('{}', 1, true)", lua_escape(s)))
            .collect::<Vec<_>>()
            .join(" or ");
        script.push_str("  splash:on_request(function(request)\n");
        let _ = writeln!(script, "    if {} then", condition);
        script.push_str("      request:abort()\n    end\n  end)\n");
    }

    script.push_str("  assert(splash:go(args.url))\n");
    let _ = writeln!(
        script,
        "  assert(splash:wait({}))",
        config.settle_delay.as_secs_f64()
    );
    script.push_str("  return splash:html()\nend\n");
    script
}

fn lua_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{HttpResponse, TransportError};
    use reqwest::StatusCode;
    use std::sync::Mutex;

    struct RecordingTransport {
        status: StatusCode,
        requests: Mutex<Vec<HttpRequest>>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request);
            Ok(HttpResponse::new(self.status, "<html><h2>rendered</h2></html>"))
        }
    }

    fn transport(status: StatusCode) -> Arc<RecordingTransport> {
        Arc::new(RecordingTransport {
            status,
            requests: Mutex::new(Vec::new()),
        })
    }

    #[test]
    fn test_lua_script_reflects_config() {
        let script = lua_script(&RenderConfig::default());
        assert!(script.contains("splash.images_enabled = false"));
        assert!(script.contains("splash.js_enabled = false"));
        assert!(script.contains("request.url:find('css', 1, true)"));
        assert!(script.contains("request:abort()"));
        assert!(script.contains("splash:wait(0.5)"));
        assert!(script.trim_end().ends_with("end"));
    }

    #[test]
    fn test_lua_script_without_blocking() {
        let config = RenderConfig {
            blocked_url_substrings: Vec::new(),
            images: true,
            ..Default::default()
        };
        let script = lua_script(&config);
        assert!(!script.contains("on_request"));
        assert!(script.contains("splash.images_enabled = true"));
    }

    #[test]
    fn test_lua_escape_quotes() {
        assert_eq!(lua_escape("it's"), "it\\'s");
    }

    #[tokio::test]
    async fn test_render_posts_to_execute() {
        let transport = transport(StatusCode::OK);
        let renderer = SplashRenderer::new("http://splash:8050/", transport.clone())
            .with_credentials("user".to_string(), "userpass".to_string());

        let html = renderer
            .render("https://www.centris.ca/en/x/1", &RenderConfig::default())
            .await
            .unwrap();
        assert!(html.contains("rendered"));

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "http://splash:8050/execute");
        assert_eq!(
            requests[0].basic_auth,
            Some(("user".to_string(), "userpass".to_string()))
        );
        let body = requests[0].body.as_ref().unwrap();
        assert_eq!(body["url"], "https://www.centris.ca/en/x/1");
        assert!(body["lua_source"].as_str().unwrap().contains("splash:html()"));
    }

    #[tokio::test]
    async fn test_render_reports_http_failure() {
        let renderer = SplashRenderer::new("http://splash:8050", transport(StatusCode::BAD_GATEWAY));
        let err = renderer
            .render("https://www.centris.ca/en/x/1", &RenderConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::Status { status: 502, .. }));
    }
}
