//! Client for the session-gated search endpoints.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;
use url::Url;

use crate::error::CrawlError;
use crate::http_client::{origin_url, HttpRequest, HttpResponse, Transport, TransportError};
use crate::models::{SearchQuery, Session, AUTH_TOKEN_HEADER};

pub const DEFAULT_ORIGIN: &str = "https://www.centris.ca";

const LOCK_PATH: &str = "/UserContext/Lock";
const SESSION_PATH: &str = "/en";
const UPDATE_QUERY_PATH: &str = "/property/UpdateQuery";
const INSCRIPTIONS_PATH: &str = "/Property/GetInscriptions";

/// Endpoints of the search backend, all rooted at one origin.
pub struct SearchApi {
    transport: Arc<dyn Transport>,
    origin: Url,
}

impl SearchApi {
    pub fn new(transport: Arc<dyn Transport>, origin: &str) -> Result<Self, CrawlError> {
        let origin = Url::parse(origin).map_err(|e| CrawlError::BaseUrl {
            url: origin.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { transport, origin })
    }

    /// Origin detail links are prefixed with.
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    fn endpoint(&self, path: &str) -> String {
        origin_url(&self.origin, path)
    }

    fn ajax(request: HttpRequest) -> HttpRequest {
        request
            .header("x-requested-with", "XMLHttpRequest")
            .header("content-type", "application/json")
    }

    /// Take the user-context lock. Returns the raw response.
    pub async fn lock(&self, user_context: u64) -> Result<HttpResponse, TransportError> {
        let request = Self::ajax(HttpRequest::post(self.endpoint(LOCK_PATH)))
            .json(json!({ "uc": user_context }));
        self.transport.send(request).await
    }

    /// Navigate to the landing page under the lock so the backend binds
    /// its cookies to the token.
    pub async fn open_session(
        &self,
        user_context: u64,
        lock_token: &str,
    ) -> Result<HttpResponse, TransportError> {
        let url = format!("{}?uc={}", self.endpoint(SESSION_PATH), user_context);
        let request = HttpRequest::get(url).header(AUTH_TOKEN_HEADER, lock_token);
        self.transport.send(request).await
    }

    /// Submit the search filter for this session.
    pub async fn update_query(
        &self,
        session: &Session,
        query: &SearchQuery,
    ) -> Result<HttpResponse, TransportError> {
        let request = Self::ajax(HttpRequest::post(self.endpoint(UPDATE_QUERY_PATH)))
            .headers(session.headers())
            .json(query.to_payload());
        self.transport.send(request).await
    }

    /// Fetch the results page starting at `start_position`.
    pub async fn get_inscriptions(
        &self,
        session: &Session,
        start_position: u64,
    ) -> Result<HttpResponse, TransportError> {
        debug!("Requesting results at position {}", start_position);
        let request = Self::ajax(HttpRequest::post(self.endpoint(INSCRIPTIONS_PATH)))
            .headers(session.headers())
            .json(json!({ "startPosition": start_position }));
        self.transport.send(request).await
    }
}
