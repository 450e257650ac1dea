//! Data models for the listing crawler.

mod cursor;
mod listing;
mod query;
mod session;

pub use cursor::{PageCursor, PageMeta};
pub use listing::{EnrichmentFailure, ListingRecord, ListingSummary, RecordOutcome};
pub use query::{GeographicArea, SearchQuery};
pub use session::{Session, AUTH_TOKEN_HEADER, SESSION_MARKER_HEADER};
