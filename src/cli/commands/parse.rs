//! Offline extraction from a saved results response.

use std::path::Path;

use url::Url;

use centris::config::Settings;
use centris::extract::{extract_summaries, parse_results_page};

use crate::cli::icons::{dim_arrow, success};

pub async fn cmd_parse(settings: &Settings, file: &Path, html: bool) -> anyhow::Result<()> {
    let body = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", file.display(), e))?;
    let origin = Url::parse(&settings.base_url)?;

    let (markup, meta) = if html {
        (body, None)
    } else {
        let page = parse_results_page(&body)?;
        (page.html, Some(page.meta))
    };

    let summaries = extract_summaries(&markup, &origin);
    println!("{}", serde_json::to_string_pretty(&summaries)?);

    eprintln!("{} {} listings extracted", success(), summaries.len());
    if let Some(meta) = meta {
        eprintln!(
            "  {} Total count {}, page size {}",
            dim_arrow(),
            meta.total_count,
            meta.page_size
        );
    }
    Ok(())
}
