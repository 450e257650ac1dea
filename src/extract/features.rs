//! Bed/bath descriptor for a listing's feature block.

use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

static ROOMS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.cac").expect("rooms selector should parse"));
static BATHS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.sdb").expect("baths selector should parse"));

/// Format the feature block as `"<rooms> Beds, <baths> baths"`.
///
/// A missing or empty count renders as `0`. Passing `None` (no feature
/// block at all) yields `"0 Beds, 0 baths"`.
pub fn features(block: Option<ElementRef<'_>>) -> String {
    let rooms = block.and_then(|b| count_text(b, &ROOMS));
    let baths = block.and_then(|b| count_text(b, &BATHS));
    format!(
        "{} Beds, {} baths",
        rooms.as_deref().unwrap_or("0"),
        baths.as_deref().unwrap_or("0")
    )
}

fn count_text(block: ElementRef<'_>, selector: &Selector) -> Option<String> {
    let element = block.select(selector).next()?;
    let text = element.text().next()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
