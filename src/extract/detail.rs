//! Fields read from a rendered detail page.

use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::normalize_space;

static ADDRESS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"h2[itemprop="address"]"#).expect("address selector should parse")
});
static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"div[itemprop="description"]"#).expect("description selector should parse")
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    pub address: Option<String>,
    pub description: Option<String>,
}

/// Pull the address heading and description text out of rendered markup.
///
/// A missing element leaves its field `None`.
pub fn extract_detail(html: &str) -> DetailFields {
    let document = Html::parse_document(html);

    let address = document
        .select(&ADDRESS)
        .next()
        .and_then(|e| e.text().next())
        .map(|t| t.trim().to_string());
    let description = document
        .select(&DESCRIPTION)
        .next()
        .map(|e| normalize_space(&e.text().collect::<String>()));

    DetailFields {
        address,
        description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_both_fields() {
        let html = r#"<html><body>
            <h2 itemprop="address"> 1200 Rue Peel, Montréal </h2>
            <div itemprop="description">
                Bright corner unit,
                close to the metro.
            </div>
        </body></html>"#;
        let fields = extract_detail(html);
        assert_eq!(fields.address.as_deref(), Some("1200 Rue Peel, Montréal"));
        assert_eq!(
            fields.description.as_deref(),
            Some("Bright corner unit, close to the metro.")
        );
    }

    #[test]
    fn test_missing_elements_are_none() {
        let fields = extract_detail("<html><body><p>Nothing here</p></body></html>");
        assert_eq!(fields, DetailFields::default());
    }

    #[test]
    fn test_empty_description_is_present_but_empty() {
        let fields = extract_detail(r#"<div itemprop="description">   </div>"#);
        assert_eq!(fields.description.as_deref(), Some(""));
        assert!(fields.address.is_none());
    }
}
