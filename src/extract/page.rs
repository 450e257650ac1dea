//! GetInscriptions response envelope.

use serde_json::Value;

use super::ExtractionError;
use crate::models::PageMeta;

/// Markup and pagination metadata of one results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsPage {
    pub html: String,
    pub meta: PageMeta,
}

/// Read `{"d": {"Result": {"html", "count", "inscNumberPerPage"}}}` from a raw body.
///
/// The markup is returned untouched; listing fragments are pulled out of it
/// separately so a page with no fragments is still a valid page.
pub fn parse_results_page(body: impl AsRef<[u8]>) -> Result<ResultsPage, ExtractionError> {
    let value: Value = serde_json::from_slice(body.as_ref())?;
    let result = value
        .get("d")
        .and_then(|d| d.get("Result"))
        .ok_or(ExtractionError::MissingField("d.Result"))?;

    let html = result
        .get("html")
        .ok_or(ExtractionError::MissingField("html"))?
        .as_str()
        .ok_or(ExtractionError::InvalidField {
            field: "html",
            expected: "a string",
        })?
        .to_string();
    let total_count = count_field(result, "count")?;
    let page_size = count_field(result, "inscNumberPerPage")?;
    if page_size == 0 {
        return Err(ExtractionError::ZeroPageSize);
    }

    Ok(ResultsPage {
        html,
        meta: PageMeta {
            total_count,
            page_size,
        },
    })
}

fn count_field(result: &Value, field: &'static str) -> Result<u64, ExtractionError> {
    result
        .get(field)
        .ok_or(ExtractionError::MissingField(field))?
        .as_u64()
        .ok_or(ExtractionError::InvalidField {
            field,
            expected: "a non-negative integer",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(result: Value) -> String {
        json!({ "d": { "Result": result } }).to_string()
    }

    #[test]
    fn test_parses_complete_envelope() {
        let body = envelope(json!({"html": "<div></div>", "count": 1234, "inscNumberPerPage": 20}));
        let page = parse_results_page(&body).unwrap();
        assert_eq!(page.html, "<div></div>");
        assert_eq!(page.meta.total_count, 1234);
        assert_eq!(page.meta.page_size, 20);
    }

    #[test]
    fn test_missing_html_is_error() {
        let body = envelope(json!({"count": 10, "inscNumberPerPage": 20}));
        assert!(matches!(
            parse_results_page(&body),
            Err(ExtractionError::MissingField("html"))
        ));
    }

    #[test]
    fn test_missing_count_is_error() {
        let body = envelope(json!({"html": "", "inscNumberPerPage": 20}));
        assert!(matches!(
            parse_results_page(&body),
            Err(ExtractionError::MissingField("count"))
        ));
    }

    #[test]
    fn test_missing_result_container_is_error() {
        assert!(matches!(
            parse_results_page(r#"{"d": {}}"#),
            Err(ExtractionError::MissingField("d.Result"))
        ));
    }

    #[test]
    fn test_zero_page_size_is_error() {
        let body = envelope(json!({"html": "", "count": 10, "inscNumberPerPage": 0}));
        assert!(matches!(
            parse_results_page(&body),
            Err(ExtractionError::ZeroPageSize)
        ));
    }

    #[test]
    fn test_negative_count_is_invalid() {
        let body = envelope(json!({"html": "", "count": -1, "inscNumberPerPage": 20}));
        assert!(matches!(
            parse_results_page(&body),
            Err(ExtractionError::InvalidField { field: "count", .. })
        ));
    }

    #[test]
    fn test_invalid_utf8_is_error() {
        let mut body = br#"{"d": {"Result": {"html": ""#.to_vec();
        body.extend_from_slice(&[0xff, 0xfe]);
        body.extend_from_slice(br#"", "count": 1, "inscNumberPerPage": 20}}}"#);
        assert!(matches!(
            parse_results_page(&body),
            Err(ExtractionError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_not_json_is_error() {
        assert!(matches!(
            parse_results_page("<html>blocked</html>"),
            Err(ExtractionError::InvalidJson(_))
        ));
    }
}
