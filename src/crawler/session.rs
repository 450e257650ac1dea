//! Session acquisition.

use tracing::{debug, info};

use super::SearchApi;
use crate::error::CrawlError;
use crate::models::Session;

/// Establishes the lock token and authentication token for one crawl.
///
/// Exactly two round-trips, strictly in order and without retries: the lock
/// request, then the token-bearing navigation.
pub struct SessionManager<'a> {
    api: &'a SearchApi,
    user_context: u64,
}

impl<'a> SessionManager<'a> {
    pub fn new(api: &'a SearchApi, user_context: u64) -> Self {
        Self { api, user_context }
    }

    pub async fn acquire_session(&self) -> Result<Session, CrawlError> {
        let response = self
            .api
            .lock(self.user_context)
            .await
            .map_err(|e| CrawlError::Auth(format!("lock request failed: {}", e)))?;
        if !response.is_success() {
            return Err(CrawlError::Auth(format!(
                "lock request returned HTTP {}",
                response.status.as_u16()
            )));
        }

        // The body is the token; it is passed on byte for byte.
        let lock_token = response
            .text()
            .map_err(|e| CrawlError::Auth(format!("lock response body is not UTF-8: {}", e)))?
            .to_string();
        if lock_token.is_empty() {
            return Err(CrawlError::Auth("lock response body is empty".to_string()));
        }
        debug!("Acquired lock token ({} bytes)", lock_token.len());

        let response = self
            .api
            .open_session(self.user_context, &lock_token)
            .await
            .map_err(|e| CrawlError::Auth(format!("session navigation failed: {}", e)))?;
        if !response.is_success() {
            return Err(CrawlError::Auth(format!(
                "session navigation returned HTTP {}",
                response.status.as_u16()
            )));
        }

        let session = Session::new(self.user_context, lock_token.clone(), lock_token);
        info!("Session established (uc={})", session.user_context());
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{HttpRequest, HttpResponse, Transport, TransportError};
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    struct Scripted {
        replies: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<HttpResponse, TransportError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected request")
        }
    }

    fn ok(body: &str) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse::new(StatusCode::OK, body))
    }

    async fn acquire(transport: Arc<Scripted>) -> Result<Session, CrawlError> {
        let api = SearchApi::new(transport, "https://www.centris.ca").unwrap();
        SessionManager::new(&api, 0).acquire_session().await
    }

    #[tokio::test]
    async fn test_lock_body_becomes_tokens_verbatim() {
        let transport = Scripted::new(vec![ok(" opaque-token\n"), ok("<html></html>")]);
        let session = acquire(transport.clone()).await.unwrap();
        assert_eq!(session.user_context(), 0);
        assert_eq!(session.lock_token(), " opaque-token\n");
        assert_eq!(session.auth_token(), " opaque-token\n");

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].url.ends_with("/UserContext/Lock"));
        assert!(seen[1].url.ends_with("/en?uc=0"));
        assert_eq!(seen[1].header_value("x-centris-uck"), Some(" opaque-token\n"));
    }

    #[tokio::test]
    async fn test_lock_rejection_is_auth_failure() {
        let transport = Scripted::new(vec![Ok(HttpResponse::new(StatusCode::FORBIDDEN, ""))]);
        let err = acquire(transport.clone()).await.unwrap_err();
        assert!(matches!(err, CrawlError::Auth(_)));
        assert_eq!(transport.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_lock_body_is_auth_failure() {
        let transport = Scripted::new(vec![ok("")]);
        assert!(matches!(
            acquire(transport).await,
            Err(CrawlError::Auth(_))
        ));
    }

    #[tokio::test]
    async fn test_non_utf8_lock_body_is_auth_failure() {
        let transport = Scripted::new(vec![Ok(HttpResponse::new(
            StatusCode::OK,
            vec![0xff, 0xfe, b't', b'o', b'k'],
        ))]);
        assert!(matches!(
            acquire(transport.clone()).await,
            Err(CrawlError::Auth(_))
        ));
        // No navigation is attempted with a mangled token.
        assert_eq!(transport.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_navigation_failure_is_auth_failure() {
        let transport = Scripted::new(vec![
            ok("tok"),
            Err(TransportError::Request {
                url: "https://www.centris.ca/en?uc=0".to_string(),
                message: "connection reset".to_string(),
            }),
        ]);
        assert!(matches!(
            acquire(transport).await,
            Err(CrawlError::Auth(_))
        ));
    }
}
