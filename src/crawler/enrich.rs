//! Detail page enrichment and its worker pool.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::extract::extract_detail;
use crate::models::{EnrichmentFailure, ListingRecord, ListingSummary, RecordOutcome};
use crate::render::{RenderConfig, Renderer};

/// Default number of concurrent detail renders.
pub const DEFAULT_WORKERS: usize = 4;

/// Renders a listing's detail page and merges its fields into a record.
pub struct DetailEnricher {
    renderer: Arc<dyn Renderer>,
    config: RenderConfig,
}

impl DetailEnricher {
    pub fn new(renderer: Arc<dyn Renderer>, config: RenderConfig) -> Self {
        Self { renderer, config }
    }

    /// Enrich one summary. Failures are confined to this listing.
    pub async fn enrich(&self, summary: ListingSummary) -> RecordOutcome {
        let Some(url) = summary.detail_url.clone() else {
            return Err(EnrichmentFailure::new(summary, "listing has no detail url"));
        };

        match self.renderer.render(&url, &self.config).await {
            Ok(html) => {
                let fields = extract_detail(&html);
                debug!("Enriched {}", url);
                Ok(ListingRecord::new(summary, fields.address, fields.description))
            }
            Err(e) => {
                let failure = EnrichmentFailure::new(summary, e.to_string());
                warn!("{}", failure);
                Err(failure)
            }
        }
    }
}

/// Spawn `count` tasks that enrich summaries until the input channel closes.
///
/// Workers stop early when nobody is listening for outcomes any more.
pub fn spawn_enrich_workers(
    count: usize,
    summaries: mpsc::Receiver<ListingSummary>,
    enricher: Arc<DetailEnricher>,
    outcomes: mpsc::Sender<RecordOutcome>,
) -> Vec<JoinHandle<()>> {
    let summaries = Arc::new(Mutex::new(summaries));
    let mut handles = Vec::with_capacity(count);

    for _ in 0..count.max(1) {
        let summaries = summaries.clone();
        let enricher = enricher.clone();
        let outcomes = outcomes.clone();

        handles.push(tokio::spawn(async move {
            loop {
                let summary = {
                    let mut rx = summaries.lock().await;
                    rx.recv().await
                };
                let Some(summary) = summary else {
                    break;
                };

                let outcome = enricher.enrich(summary).await;
                if outcomes.send(outcome).await.is_err() {
                    break;
                }
            }
        }));
    }

    handles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderError;
    use async_trait::async_trait;

    struct PageRenderer;

    #[async_trait]
    impl Renderer for PageRenderer {
        async fn render(&self, url: &str, _config: &RenderConfig) -> Result<String, RenderError> {
            if url.ends_with("/broken") {
                return Err(RenderError::Navigation {
                    url: url.to_string(),
                    message: "net::ERR_ABORTED".to_string(),
                });
            }
            Ok(format!(
                r#"<h2 itemprop="address">{url}</h2><div itemprop="description"> nice  place </div>"#
            ))
        }
    }

    fn summary(path: Option<&str>) -> ListingSummary {
        ListingSummary {
            category: "House".to_string(),
            features: "4 Beds, 2 baths".to_string(),
            price: Some("799000".to_string()),
            city: Some("Laval".to_string()),
            detail_url: path.map(|p| format!("https://www.centris.ca{p}")),
        }
    }

    fn enricher() -> DetailEnricher {
        DetailEnricher::new(Arc::new(PageRenderer), RenderConfig::default())
    }

    #[tokio::test]
    async fn test_enrich_merges_detail_fields() {
        let record = enricher().enrich(summary(Some("/en/1"))).await.unwrap();
        assert_eq!(record.address.as_deref(), Some("https://www.centris.ca/en/1"));
        assert_eq!(record.description.as_deref(), Some("nice place"));
        assert_eq!(record.summary, summary(Some("/en/1")));
    }

    #[tokio::test]
    async fn test_render_failure_keeps_summary() {
        let failure = enricher().enrich(summary(Some("/broken"))).await.unwrap_err();
        assert_eq!(failure.summary, summary(Some("/broken")));
        assert!(failure.reason.contains("ERR_ABORTED"));
    }

    #[tokio::test]
    async fn test_missing_url_is_failure_without_render() {
        let failure = enricher().enrich(summary(None)).await.unwrap_err();
        assert_eq!(failure.reason, "listing has no detail url");
    }

    #[tokio::test]
    async fn test_workers_drain_queue() {
        let (summary_tx, summary_rx) = mpsc::channel(16);
        let (outcome_tx, mut outcome_rx) = mpsc::channel(16);
        let workers = spawn_enrich_workers(3, summary_rx, Arc::new(enricher()), outcome_tx);

        for i in 0..5 {
            summary_tx.send(summary(Some(&format!("/en/{i}")))).await.unwrap();
        }
        summary_tx.send(summary(Some("/broken"))).await.unwrap();
        drop(summary_tx);

        for worker in workers {
            worker.await.unwrap();
        }

        let mut ok = 0;
        let mut failed = 0;
        while let Some(outcome) = outcome_rx.recv().await {
            match outcome {
                Ok(_) => ok += 1,
                Err(_) => failed += 1,
            }
        }
        assert_eq!((ok, failed), (5, 1));
    }
}
