//! Fatal crawl errors.
//!
//! Anything in [`CrawlError`] stops pagination and surfaces to the caller.
//! Per-listing problems are values ([`EnrichmentFailure`]) and never appear here.
//!
//! [`EnrichmentFailure`]: crate::models::EnrichmentFailure

use thiserror::Error;

pub use crate::crawler::PaginationError;
pub use crate::extract::ExtractionError;
pub use crate::http_client::TransportError;
pub use crate::output::OutputError;
pub use crate::render::RenderError;

#[derive(Debug, Error)]
pub enum CrawlError {
    /// No valid session could be established.
    #[error("session could not be established: {0}")]
    Auth(String),

    #[error("search query was rejected: {0}")]
    QuerySubmission(String),

    #[error("results page at position {start_position} could not be fetched: {reason}")]
    PageFetch { start_position: u64, reason: String },

    #[error("results page at position {start_position} is malformed: {source}")]
    Extraction {
        start_position: u64,
        #[source]
        source: ExtractionError,
    },

    #[error(transparent)]
    Pagination(#[from] PaginationError),

    #[error("invalid base URL {url}: {message}")]
    BaseUrl { url: String, message: String },

    #[error("crawl task failed: {0}")]
    Task(String),
}

impl CrawlError {
    /// Short machine-readable kind, used in logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            CrawlError::Auth(_) => "auth_failure",
            CrawlError::QuerySubmission(_) => "query_submission_failure",
            CrawlError::PageFetch { .. } => "page_fetch_failure",
            CrawlError::Extraction { .. } => "extraction_failure",
            CrawlError::Pagination(_) => "pagination_failure",
            CrawlError::BaseUrl { .. } => "configuration_failure",
            CrawlError::Task(_) => "task_failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_message_includes_position_and_cause() {
        let err = CrawlError::Extraction {
            start_position: 40,
            source: ExtractionError::MissingField("html"),
        };
        assert_eq!(
            err.to_string(),
            "results page at position 40 is malformed: results envelope is missing `html`"
        );
        assert_eq!(err.kind(), "extraction_failure");
    }

    #[test]
    fn test_auth_kind() {
        assert_eq!(CrawlError::Auth("empty lock token".into()).kind(), "auth_failure");
    }
}
