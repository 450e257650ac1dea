//! Crawl orchestration.
//!
//! A [`Crawler`] acquires a session, then drives the [`Pagination`] state
//! machine one effect at a time. Summaries from each page go to a pool of
//! enrichment workers while the next page is already being requested; the
//! resulting records stream back to the caller through a [`CrawlStream`].

mod api;
mod enrich;
mod pagination;
mod session;

pub use api::{SearchApi, DEFAULT_ORIGIN};
pub use enrich::{spawn_enrich_workers, DetailEnricher, DEFAULT_WORKERS};
pub use pagination::{Effect, PageEvent, Pagination, PaginationError, PaginationState};
pub use session::SessionManager;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::CrawlError;
use crate::extract::{extract_summaries, parse_results_page};
use crate::models::{ListingSummary, PageCursor, PageMeta, RecordOutcome, SearchQuery, Session};
use crate::render::{RenderConfig, Renderer};

/// Knobs for one crawl.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// User-context id the session is locked under.
    pub user_context: u64,
    /// Concurrent detail renders.
    pub workers: usize,
    /// Stop after this many results pages.
    pub max_pages: Option<u64>,
    pub render: RenderConfig,
    /// Summaries buffered ahead of the enrichment workers.
    pub queue_capacity: usize,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            user_context: 0,
            workers: DEFAULT_WORKERS,
            max_pages: None,
            render: RenderConfig::default(),
            queue_capacity: 500,
        }
    }
}

/// Snapshot published after every results page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlProgress {
    pub pages_fetched: u64,
    pub total_count: Option<u64>,
    pub summaries_dispatched: u64,
    pub cursor: Option<PageCursor>,
    pub state: PaginationState,
}

/// Summary of a finished crawl.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub pages_fetched: u64,
    pub total_count: Option<u64>,
    pub summaries_dispatched: u64,
    /// Ended by a stop request or page limit rather than by exhausting results.
    pub stopped_early: bool,
}

/// Requests a clean stop at the next page boundary.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    /// Whether a stop has already been requested.
    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Live view of a running crawl.
pub struct CrawlStream {
    /// Enrichment outcomes, in completion order.
    pub receiver: mpsc::Receiver<RecordOutcome>,
    pub progress: watch::Receiver<CrawlProgress>,
    stop: StopHandle,
    handle: JoinHandle<Result<CrawlReport, CrawlError>>,
}

impl CrawlStream {
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Wait for the crawl task. Outcomes not yet received are dropped.
    pub async fn finish(self) -> Result<CrawlReport, CrawlError> {
        drop(self.receiver);
        self.handle
            .await
            .map_err(|e| CrawlError::Task(e.to_string()))?
    }

    /// Receive every outcome, then wait for the crawl task.
    pub async fn collect(mut self) -> (Vec<RecordOutcome>, Result<CrawlReport, CrawlError>) {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.receiver.recv().await {
            outcomes.push(outcome);
        }
        let report = self.finish().await;
        (outcomes, report)
    }
}

pub struct Crawler {
    api: SearchApi,
    enricher: Arc<DetailEnricher>,
    query: SearchQuery,
    options: CrawlOptions,
}

impl Crawler {
    pub fn new(
        api: SearchApi,
        renderer: Arc<dyn Renderer>,
        query: SearchQuery,
        options: CrawlOptions,
    ) -> Self {
        let enricher = Arc::new(DetailEnricher::new(renderer, options.render.clone()));
        Self {
            api,
            enricher,
            query,
            options,
        }
    }

    /// Spawn the crawl and return its stream.
    pub fn start(self) -> CrawlStream {
        let id = Uuid::new_v4().to_string();
        let (outcome_tx, outcome_rx) = mpsc::channel(self.options.queue_capacity.max(1));
        let (progress_tx, progress_rx) = watch::channel(CrawlProgress::default());
        let (stop_tx, stop_rx) = watch::channel(false);

        let span = info_span!("crawl", id = %id);
        let handle = tokio::spawn(
            async move { self.run(id, outcome_tx, progress_tx, stop_rx).await }.instrument(span),
        );

        CrawlStream {
            receiver: outcome_rx,
            progress: progress_rx,
            stop: StopHandle {
                tx: Arc::new(stop_tx),
            },
            handle,
        }
    }

    async fn run(
        self,
        id: String,
        outcomes: mpsc::Sender<RecordOutcome>,
        progress: watch::Sender<CrawlProgress>,
        stop: watch::Receiver<bool>,
    ) -> Result<CrawlReport, CrawlError> {
        let started_at = Utc::now();
        info!("Starting crawl against {}", self.api.origin());

        let session = SessionManager::new(&self.api, self.options.user_context)
            .acquire_session()
            .await
            .inspect_err(|e| error!(kind = e.kind(), "{}", e))?;

        let (summary_tx, summary_rx) = mpsc::channel(self.options.queue_capacity.max(1));
        let workers = spawn_enrich_workers(
            self.options.workers,
            summary_rx,
            self.enricher.clone(),
            outcomes,
        );

        let pagination = match self.paginate(&session, summary_tx, &progress, &stop).await {
            Ok(pagination) => pagination,
            Err(e) => {
                error!(kind = e.kind(), "Crawl aborted: {}", e);
                for worker in &workers {
                    worker.abort();
                }
                return Err(e);
            }
        };

        // Summary sender is gone, so workers exit once the queue drains.
        for worker in workers {
            if let Err(e) = worker.await {
                warn!("Enrichment worker ended abnormally: {}", e);
            }
        }

        let snapshot = progress.borrow().clone();
        let stopped_early = pagination
            .cursor()
            .map_or(pagination.pages_fetched() == 0, |c| c.has_next());
        let report = CrawlReport {
            id,
            started_at,
            finished_at: Utc::now(),
            pages_fetched: pagination.pages_fetched(),
            total_count: snapshot.total_count,
            summaries_dispatched: snapshot.summaries_dispatched,
            stopped_early,
        };
        info!(
            "Crawl finished: {} pages, {} listings dispatched",
            report.pages_fetched, report.summaries_dispatched
        );
        Ok(report)
    }

    /// Run the state machine to completion, feeding summaries to `summaries`.
    async fn paginate(
        &self,
        session: &Session,
        summaries: mpsc::Sender<ListingSummary>,
        progress: &watch::Sender<CrawlProgress>,
        stop: &watch::Receiver<bool>,
    ) -> Result<Pagination, CrawlError> {
        let mut machine = Pagination::new();
        if let Some(limit) = self.options.max_pages {
            machine = machine.with_page_limit(limit);
        }

        let mut event = PageEvent::Start;
        let mut workers_gone = false;
        loop {
            let (next, effect) = machine.step(event)?;
            machine = next;
            progress.send_modify(|p| p.state = machine.state());

            event = match effect {
                Effect::SubmitQuery => {
                    self.submit_query(session).await?;
                    PageEvent::QueryAcknowledged
                }
                Effect::FetchPage { .. } if workers_gone => PageEvent::Stop,
                Effect::FetchPage { start_position } => {
                    let stop_requested = *stop.borrow();
                    if stop_requested {
                        info!("Stop requested before position {}", start_position);
                        PageEvent::Stop
                    } else {
                        let (meta, listening) = self
                            .fetch_page(session, start_position, &summaries, progress)
                            .await?;
                        if !listening {
                            warn!("No enrichment workers left; stopping");
                            workers_gone = true;
                        }
                        PageEvent::PageReceived(meta)
                    }
                }
                Effect::Finish => break,
            };
        }

        Ok(machine)
    }

    async fn submit_query(&self, session: &Session) -> Result<(), CrawlError> {
        let response = self
            .api
            .update_query(session, &self.query)
            .await
            .map_err(|e| CrawlError::QuerySubmission(e.to_string()))?;
        if !response.is_success() {
            return Err(CrawlError::QuerySubmission(format!(
                "HTTP {}",
                response.status.as_u16()
            )));
        }
        info!("Query submitted for {}", self.query.geography().text);
        Ok(())
    }

    /// Fetch and parse one page and dispatch its summaries.
    ///
    /// Returns the page metadata and whether the enrichment workers are
    /// still accepting summaries.
    async fn fetch_page(
        &self,
        session: &Session,
        start_position: u64,
        summaries: &mpsc::Sender<ListingSummary>,
        progress: &watch::Sender<CrawlProgress>,
    ) -> Result<(PageMeta, bool), CrawlError> {
        let page_fetch = |reason: String| CrawlError::PageFetch {
            start_position,
            reason,
        };

        let response = self
            .api
            .get_inscriptions(session, start_position)
            .await
            .map_err(|e| page_fetch(e.to_string()))?;
        if !response.is_success() {
            return Err(page_fetch(format!("HTTP {}", response.status.as_u16())));
        }

        let page = parse_results_page(&response.body).map_err(|source| CrawlError::Extraction {
            start_position,
            source,
        })?;
        let found = extract_summaries(&page.html, self.api.origin());
        info!(
            "Page at {}: {} listings (total {}, page size {})",
            start_position,
            found.len(),
            page.meta.total_count,
            page.meta.page_size
        );

        let mut dispatched = 0;
        let mut workers_gone = false;
        for summary in found {
            if summaries.send(summary).await.is_err() {
                workers_gone = true;
                break;
            }
            dispatched += 1;
        }

        progress.send_modify(|p| {
            p.pages_fetched += 1;
            p.total_count = Some(page.meta.total_count);
            p.summaries_dispatched += dispatched;
            p.cursor = Some(PageCursor::new(start_position, page.meta));
        });

        Ok((page.meta, !workers_gone))
    }
}
