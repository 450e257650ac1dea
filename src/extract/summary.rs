//! Listing summaries from a results page's embedded markup.

use std::sync::LazyLock;

use scraper::html::Select;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::{features, normalize_space};
use crate::http_client::origin_url;
use crate::models::ListingSummary;

static LISTING: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"div[data-id="templateThumbnailItem"]"#)
        .expect("listing selector should parse")
});
static LOCATION_LABEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.location-container > span > div")
        .expect("location selector should parse")
});
static FEATURES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.features").expect("features selector should parse"));
static PRICE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"span[itemprop="price"]"#).expect("price selector should parse")
});
static CITY: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("span.address > div:nth-of-type(2)").expect("city selector should parse")
});
static DETAIL_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div > a.a-more-detail").expect("detail link selector should parse")
});

/// Walks the listing fragments of a parsed results page in document order.
///
/// Each fragment is read once, when the iterator reaches it. The iterator
/// borrows the document and cannot be rewound.
pub struct SummaryExtractor<'a> {
    listings: Select<'a, 'static>,
    origin: &'a Url,
}

impl<'a> SummaryExtractor<'a> {
    pub fn new(document: &'a Html, origin: &'a Url) -> Self {
        Self {
            listings: document.select(&LISTING),
            origin,
        }
    }
}

impl Iterator for SummaryExtractor<'_> {
    type Item = ListingSummary;

    fn next(&mut self) -> Option<Self::Item> {
        let fragment = self.listings.next()?;
        Some(summarize(fragment, self.origin))
    }
}

/// Parse `html` and collect every summary it contains.
pub fn extract_summaries(html: &str, origin: &Url) -> Vec<ListingSummary> {
    let document = Html::parse_fragment(html);
    SummaryExtractor::new(&document, origin).collect()
}

fn summarize(fragment: ElementRef<'_>, origin: &Url) -> ListingSummary {
    ListingSummary {
        category: category(fragment),
        features: features(fragment.select(&FEATURES).next()),
        price: fragment
            .select(&PRICE)
            .next()
            .and_then(|e| e.value().attr("content"))
            .map(str::to_string),
        city: fragment
            .select(&CITY)
            .next()
            .and_then(|e| e.text().next())
            .map(|t| t.trim().to_string()),
        detail_url: fragment
            .select(&DETAIL_LINK)
            .next()
            .and_then(|e| e.value().attr("href"))
            .map(|href| origin_url(origin, href.trim())),
    }
}

/// Text of the location label up to the first non-breaking space.
fn category(fragment: ElementRef<'_>) -> String {
    let Some(label) = fragment
        .select(&LOCATION_LABEL)
        .next()
        .and_then(|e| e.text().next())
    else {
        return String::new();
    };

    let label = normalize_space(label);
    match label.split_once('\u{a0}') {
        Some((head, _)) => head.trim_end().to_string(),
        None => label,
    }
}
