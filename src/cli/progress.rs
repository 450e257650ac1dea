//! Progress display for a running crawl.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use centris::crawler::{CrawlProgress, PaginationState};

/// Two bars: results pages walked, and listings enriched out of those found.
pub struct CrawlProgressDisplay {
    multi: MultiProgress,
    pages: ProgressBar,
    listings: ProgressBar,
    failed: u64,
}

impl CrawlProgressDisplay {
    pub fn new() -> Self {
        let multi = MultiProgress::new();

        let pages = multi.add(ProgressBar::new_spinner());
        pages.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .expect("pages template should parse"),
        );
        pages.set_message("Acquiring session");
        pages.enable_steady_tick(std::time::Duration::from_millis(100));

        let listings = multi.add(ProgressBar::new(0));
        listings.set_style(
            ProgressStyle::default_bar()
                .template("  {msg} [{bar:30.cyan/blue}] {pos}/{len}")
                .expect("listings template should parse")
                .progress_chars("█▓░"),
        );
        listings.set_message("Enriched");

        Self {
            multi,
            pages,
            listings,
            failed: 0,
        }
    }

    /// Reflect a new pagination snapshot.
    pub fn update(&self, progress: &CrawlProgress) {
        match (progress.state, progress.total_count) {
            (PaginationState::Init, _) => self.pages.set_message("Acquiring session"),
            (PaginationState::QuerySubmitted, _) => self.pages.set_message("Submitting query"),
            (PaginationState::FetchingPage { start_position }, Some(total)) => {
                self.pages.set_message(format!(
                    "Page {} (position {} of {})",
                    progress.pages_fetched + 1,
                    start_position,
                    total
                ))
            }
            (PaginationState::FetchingPage { .. }, None) => {
                self.pages.set_message("Fetching first page")
            }
            (PaginationState::Done, _) => self.pages.set_message(format!(
                "{} pages walked",
                progress.pages_fetched
            )),
        }
        self.listings.set_length(progress.summaries_dispatched);
    }

    /// Count one finished enrichment.
    pub fn record_done(&mut self, ok: bool) {
        if !ok {
            self.failed += 1;
            self.listings
                .set_message(format!("Enriched ({} failed)", self.failed));
        }
        self.listings.inc(1);
    }

    /// Print above the bars without corrupting them.
    pub fn println(&self, message: &str) {
        let _ = self.multi.println(message);
    }

    pub fn finish(&self) {
        self.pages.finish_and_clear();
        self.listings.finish_and_clear();
    }
}
