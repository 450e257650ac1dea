//! Markup extraction for results pages and detail pages.
//!
//! Everything here is synchronous: a parsed [`scraper::Html`] is not `Send`,
//! so callers parse, collect owned values and only then await.

mod detail;
mod features;
mod page;
mod summary;

pub use detail::{extract_detail, DetailFields};
pub use features::features;
pub use page::{parse_results_page, ResultsPage};
pub use summary::{extract_summaries, SummaryExtractor};

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// A results page whose envelope could not be read.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("results body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("results envelope is missing `{0}`")]
    MissingField(&'static str),
    #[error("results envelope field `{field}` is not {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
    #[error("server reported a page size of zero")]
    ZeroPageSize,
}

static XML_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\r\n]+").expect("whitespace pattern should compile"));

/// Trim and collapse runs of XML whitespace to single spaces.
///
/// Non-breaking spaces are not XML whitespace and survive untouched, which
/// the category split relies on.
pub fn normalize_space(text: &str) -> String {
    XML_WHITESPACE
        .replace_all(text, " ")
        .trim_matches(' ')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_space_collapses_runs() {
        assert_eq!(normalize_space("  a \n\t b  c\r\n"), "a b c");
    }

    #[test]
    fn test_normalize_space_keeps_nbsp() {
        assert_eq!(normalize_space(" Condo\u{a0}for sale "), "Condo\u{a0}for sale");
    }

    #[test]
    fn test_normalize_space_empty() {
        assert_eq!(normalize_space(" \n "), "");
    }
}
