//! The crawl command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use console::style;

use centris::config::Settings;
use centris::crawler::{CrawlReport, Crawler, SearchApi};
use centris::http_client::{HttpClient, Transport};
use centris::output::JsonLinesSink;
use centris::render::{build_renderer, RenderEngine};

use crate::cli::icons::{dim_arrow, info, success, warn};
use crate::cli::progress::CrawlProgressDisplay;

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// Number of concurrent detail renders
    #[arg(short, long)]
    workers: Option<usize>,
    /// Stop after this many results pages
    #[arg(short, long)]
    max_pages: Option<u64>,
    /// Records file (JSON Lines); stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Write enrichment failures to this file (JSON Lines)
    #[arg(long)]
    failures: Option<PathBuf>,
    /// Rendering engine for detail pages
    #[arg(long, value_enum)]
    engine: Option<RenderEngine>,
    /// Splash service URL (implies --engine splash unless set)
    #[arg(long, env = "SPLASH_URL")]
    splash_url: Option<String>,
    /// Write the crawl report (JSON) to this file
    #[arg(long)]
    report: Option<PathBuf>,
    /// Disable the progress display; progress snapshots go to stderr as JSON Lines
    #[arg(long)]
    no_progress: bool,
}

impl CrawlArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(workers) = self.workers {
            settings.workers = workers;
        }
        if let Some(max_pages) = self.max_pages {
            settings.max_pages = Some(max_pages);
        }
        if let Some(ref output) = self.output {
            settings.output = Some(output.clone());
        }
        if let Some(ref failures) = self.failures {
            settings.failures = Some(failures.clone());
        }
        if let Some(ref url) = self.splash_url {
            settings.render.splash_url = Some(url.clone());
            if self.engine.is_none() {
                settings.render.engine = RenderEngine::Splash;
            }
        }
        if let Some(engine) = self.engine {
            settings.render.engine = engine;
        }
    }
}

pub async fn cmd_crawl(mut settings: Settings, args: CrawlArgs) -> anyhow::Result<()> {
    args.apply(&mut settings);

    let transport: Arc<dyn Transport> = Arc::new(HttpClient::with_user_agent(
        Duration::from_secs(settings.request_timeout),
        settings.user_agent.as_deref(),
    )?);
    let renderer = build_renderer(&settings.render, transport.clone())?;
    let api = SearchApi::new(transport, &settings.base_url)?;

    let mut records = match settings.output {
        Some(ref path) => JsonLinesSink::create(path).await?,
        None => JsonLinesSink::stdout(),
    };
    let mut failures = match settings.failures {
        Some(ref path) => Some(JsonLinesSink::create(path).await?),
        None => None,
    };

    eprintln!(
        "{} Crawling {} ({} workers, {:?} renderer)",
        info(),
        settings.query.geography().text,
        settings.workers,
        settings.render.engine
    );

    let crawler = Crawler::new(
        api,
        renderer,
        settings.query.clone(),
        settings.crawl_options(),
    );
    let mut stream = crawler.start();

    let stop = stream.stop_handle();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if stop.is_stopped() {
                eprintln!("{} Interrupted again; exiting", warn());
                std::process::exit(130);
            }
            eprintln!("{} Stopping after the current page (Ctrl-C again to exit)", warn());
            stop.stop();
        }
    });

    let mut display = (!args.no_progress).then(CrawlProgressDisplay::new);
    let mut progress = stream.progress.clone();

    let mut failed = 0u64;
    let mut progress_open = true;
    loop {
        tokio::select! {
            outcome = stream.receiver.recv() => {
                let Some(outcome) = outcome else { break };
                let ok = outcome.is_ok();
                match outcome {
                    Ok(record) => {
                        records.write(&record).await?;
                    }
                    Err(failure) => {
                        failed += 1;
                        let line = format!("{} {}", warn(), failure);
                        match display {
                            Some(ref d) => d.println(&line),
                            None => eprintln!("{}", line),
                        }
                        if let Some(ref mut sink) = failures {
                            sink.write(&failure).await?;
                        }
                    }
                }
                if let Some(ref mut d) = display {
                    d.record_done(ok);
                }
            }
            changed = progress.changed(), if progress_open => {
                match changed {
                    Ok(()) => {
                        let snapshot = progress.borrow_and_update().clone();
                        match display {
                            Some(ref d) => d.update(&snapshot),
                            None => eprintln!("{}", serde_json::to_string(&snapshot)?),
                        }
                    }
                    Err(_) => progress_open = false,
                }
            }
        }
    }

    records.flush().await?;
    if let Some(ref mut sink) = failures {
        sink.flush().await?;
    }
    if let Some(ref d) = display {
        d.finish();
    }

    let report = stream.finish().await?;
    if let Some(ref path) = args.report {
        tokio::fs::write(path, serde_json::to_string_pretty(&report)?)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path.display(), e))?;
    }
    print_report(&report, records.written(), failed, &settings);
    Ok(())
}

fn print_report(report: &CrawlReport, enriched: u64, failed: u64, settings: &Settings) {
    eprintln!(
        "{} Crawl {} finished in {}s",
        success(),
        style(&report.id[..8]).dim(),
        (report.finished_at - report.started_at).num_seconds()
    );
    eprintln!(
        "  {} {} pages, {} of {} listings",
        dim_arrow(),
        report.pages_fetched,
        report.summaries_dispatched,
        report
            .total_count
            .map(|t| t.to_string())
            .unwrap_or_else(|| "?".to_string())
    );
    eprintln!("  {} {} enriched, {} failed", dim_arrow(), enriched, failed);
    if let Some(ref path) = settings.output {
        eprintln!("  {} Records: {}", dim_arrow(), path.display());
    }
    if report.stopped_early {
        eprintln!("{} Stopped before the end of the result set", warn());
    }
}
