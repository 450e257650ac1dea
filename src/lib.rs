//! Crawler for the Centris real-estate search backend.
//!
//! The pipeline acquires a session ([`crawler::SessionManager`]), submits a
//! [`models::SearchQuery`], walks the offset-paginated result set with the
//! [`crawler::Pagination`] state machine, extracts listing summaries from each
//! page and enriches them through a [`render::Renderer`].

pub mod config;
pub mod crawler;
pub mod error;
pub mod extract;
pub mod http_client;
pub mod models;
pub mod output;
pub mod render;

pub use crawler::{CrawlOptions, CrawlReport, CrawlStream, Crawler, StopHandle};
pub use error::CrawlError;
