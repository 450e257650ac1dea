//! Listing summaries and enriched records.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Listing as it appears on a results page.
///
/// Produced by the summary extractor and handed to the detail enricher as
/// opaque context; never modified after extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingSummary {
    /// Property category, e.g. "Condo" or "House".
    pub category: String,
    /// Display string of the form `"<rooms> Beds, <baths> baths"`.
    pub features: String,
    /// Machine-readable asking price, kept as the server's decimal string.
    pub price: Option<String>,
    pub city: Option<String>,
    /// Absolute detail page URL, absent when the fragment had no link.
    #[serde(rename = "url")]
    pub detail_url: Option<String>,
}

/// Fully enriched listing, the crawl's terminal output unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    #[serde(flatten)]
    pub summary: ListingSummary,
    pub address: Option<String>,
    pub description: Option<String>,
}

impl ListingRecord {
    /// Merge detail page fields into a summary.
    pub fn new(summary: ListingSummary, address: Option<String>, description: Option<String>) -> Self {
        Self {
            summary,
            address,
            description,
        }
    }
}

/// A detail page that could not be rendered.
///
/// Reported for the single listing it affects; the originating summary is
/// kept whole so callers can retry or persist what is already known.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("enrichment failed for {}: {reason}", .summary.detail_url.as_deref().unwrap_or("<no detail url>"))]
pub struct EnrichmentFailure {
    #[serde(flatten)]
    pub summary: ListingSummary,
    #[serde(rename = "error")]
    pub reason: String,
}

impl EnrichmentFailure {
    pub fn new(summary: ListingSummary, reason: impl Into<String>) -> Self {
        Self {
            summary,
            reason: reason.into(),
        }
    }
}

/// Result of enriching one summary.
pub type RecordOutcome = Result<ListingRecord, EnrichmentFailure>;
