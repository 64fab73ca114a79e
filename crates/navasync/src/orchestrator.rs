//! Batch orchestrator
//!
//! ```text
//! enumerate pages ─→ source page: extract + persist fragment + rewrite  (one blocking task)
//!                          │ fragment synced to disk
//!                          ▼
//!                 worker pool (N blocking tasks) ─→ mpsc ─→ collector ─→ BatchResult
//!                                                              └──→ EventBus (progress)
//! ```
//!
//! Pages are disjoint units of work. Workers share the read-only rewriter
//! and a queue of paths; every document is owned by the worker parsing it.

use serde::Serialize;
use std::collections::{BTreeSet, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use uuid::Uuid;
use walkdir::WalkDir;

use dom::Document;

use crate::assets::install_spinner;
use crate::config::NavAsyncConfig;
use crate::error::{NavAsyncError, Result};
use crate::events::{BatchEvent, EventBus};
use crate::extractor::FragmentExtractor;
use crate::locator::NavLocator;
use crate::placeholder::PlaceholderSpec;
use crate::rewriter::{write_document, PageOutcome, PageReport, PageRewriter, RewriteOutcome};

#[derive(Debug, Clone, Serialize)]
pub struct PageFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Aggregate outcome of one batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
    pub run_id: Uuid,
    pub total: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<PageFailure>,
    pub fragment_path: Option<PathBuf>,
    pub elapsed: Duration,
}

impl BatchResult {
    fn record(&mut self, report: &PageReport) {
        match &report.outcome {
            PageOutcome::Processed => self.processed += 1,
            PageOutcome::Skipped(reason) => {
                tracing::debug!("Skipped {} ({:?})", report.path.display(), reason);
                self.skipped += 1;
            }
            PageOutcome::Failed(reason) => {
                tracing::warn!("Failed {}: {}", report.path.display(), reason);
                self.failed += 1;
                self.failures.push(PageFailure {
                    path: report.path.clone(),
                    reason: reason.clone(),
                });
            }
        }
    }

    /// Pages with a reported outcome so far
    pub fn completed(&self) -> usize {
        self.processed + self.skipped + self.failed
    }
}

pub struct BatchOrchestrator {
    config: NavAsyncConfig,
    rewriter: Arc<PageRewriter>,
    pub event_bus: EventBus,
}

impl BatchOrchestrator {
    pub fn new(config: NavAsyncConfig) -> Self {
        let locator = NavLocator::from_config(&config);
        let placeholder = PlaceholderSpec::from_config(&config, &locator);
        Self {
            config,
            rewriter: Arc::new(PageRewriter::new(locator, placeholder)),
            event_bus: EventBus::new(),
        }
    }

    pub fn config(&self) -> &NavAsyncConfig {
        &self.config
    }

    /// Run the whole batch.
    ///
    /// Errors returned here are fatal and happen before any page other than
    /// the source is written. Pages lost with a dead worker are counted as
    /// failed instead.
    pub async fn run(&self) -> Result<BatchResult> {
        let started = Instant::now();
        self.config.validate()?;

        let run_id = Uuid::now_v7();
        let pages = enumerate_pages(&self.config)?;
        let mut result = BatchResult {
            run_id,
            total: pages.len(),
            ..BatchResult::default()
        };

        let Some((source, rest)) = pages.split_first() else {
            tracing::warn!("No pages found under {}", self.config.site_dir.display());
            result.elapsed = started.elapsed();
            return Ok(result);
        };

        tracing::info!(
            "Run {}: {} pages under {}",
            run_id,
            pages.len(),
            self.config.site_dir.display()
        );
        self.event_bus.publish(BatchEvent::Started {
            run_id,
            total: pages.len(),
        });

        let source_report = self.process_source(source.clone()).await?;
        result.fragment_path = Some(self.config.nav_file_path());
        self.event_bus.publish(BatchEvent::SourceExtracted {
            source: source.clone(),
            fragment: self.config.nav_file_path(),
        });
        self.collect(&mut result, source_report);

        self.rewrite_pages(rest.to_vec(), &mut result).await;

        result.elapsed = started.elapsed();
        tracing::info!(
            "Run {} finished: {} processed, {} skipped, {} failed in {:.2}s",
            run_id,
            result.processed,
            result.skipped,
            result.failed,
            result.elapsed.as_secs_f64()
        );
        self.event_bus.publish(BatchEvent::Finished {
            run_id,
            processed: result.processed,
            skipped: result.skipped,
            failed: result.failed,
        });

        Ok(result)
    }

    /// Extraction fused with rewriting for the source page, off the async threads
    async fn process_source(&self, path: PathBuf) -> Result<PageReport> {
        let config = self.config.clone();
        let rewriter = Arc::clone(&self.rewriter);

        tokio::task::spawn_blocking(move || {
            let outcome = extract_source(&config, &rewriter, &path)?;
            Ok(PageReport { path, outcome })
        })
        .await
        .map_err(|e| NavAsyncError::Worker(format!("source extraction task failed: {e}")))?
    }

    async fn rewrite_pages(&self, pages: Vec<PathBuf>, result: &mut BatchResult) {
        if pages.is_empty() {
            return;
        }

        let pool_size = self.config.workers.clamp(1, pages.len());
        tracing::info!("Rewriting {} pages with {} workers", pages.len(), pool_size);

        let mut unreported: BTreeSet<PathBuf> = pages.iter().cloned().collect();
        let queue = Arc::new(Mutex::new(VecDeque::from(pages)));
        let (tx, mut rx) = mpsc::unbounded_channel::<PageReport>();
        let mut workers = JoinSet::new();

        for worker_id in 0..pool_size {
            let queue = Arc::clone(&queue);
            let rewriter = Arc::clone(&self.rewriter);
            let tx = tx.clone();
            workers.spawn_blocking(move || worker_loop(worker_id, &queue, &rewriter, &tx));
        }
        // Channel closes once every worker has dropped its sender
        drop(tx);

        while let Some(report) = rx.recv().await {
            unreported.remove(&report.path);
            self.collect(result, report);
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Rewrite worker stopped abnormally: {}", e);
            }
        }

        self.fail_unreported(result, unreported);
    }

    /// Count pages no worker reported on (their worker died) as failed
    fn fail_unreported(&self, result: &mut BatchResult, unreported: BTreeSet<PathBuf>) {
        if unreported.is_empty() {
            return;
        }
        tracing::error!("{} pages were not reported by any worker", unreported.len());
        for path in unreported {
            self.collect(
                result,
                PageReport {
                    path,
                    outcome: PageOutcome::Failed("worker stopped".to_string()),
                },
            );
        }
    }

    fn collect(&self, result: &mut BatchResult, report: PageReport) {
        result.record(&report);
        self.event_bus.publish(BatchEvent::PageFinished {
            path: report.path,
            outcome: report.outcome,
            completed: result.completed(),
            total: result.total,
        });
    }
}

/// Convenience entry point for build hooks
pub async fn run_batch(site_dir: impl Into<PathBuf>, base_path: &str) -> Result<BatchResult> {
    BatchOrchestrator::new(NavAsyncConfig::new(site_dir, base_path))
        .run()
        .await
}

/// All page files under the site root, fragment file excluded.
///
/// Sorted by path components, not by the raw string: `a/index.html` comes
/// before `a.html`. The first entry is the source page.
pub fn enumerate_pages(config: &NavAsyncConfig) -> Result<Vec<PathBuf>> {
    let mut pages = Vec::new();

    for entry in WalkDir::new(&config.site_dir) {
        let entry = entry.map_err(|e| {
            let path = e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| config.site_dir.clone());
            NavAsyncError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let is_page = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&config.page_extension));
        if !is_page || entry.file_name() == config.nav_file_name.as_str() {
            continue;
        }
        pages.push(path.to_path_buf());
    }

    pages.sort();
    Ok(pages)
}

/// Parse the source page, persist the fragment, install the spinner and
/// write the rewritten page back. Every error before the final write is
/// fatal for the batch.
fn extract_source(
    config: &NavAsyncConfig,
    rewriter: &PageRewriter,
    path: &Path,
) -> Result<PageOutcome> {
    tracing::info!("Taking navigation from: {}", path.display());

    let bytes = std::fs::read(path).map_err(|e| NavAsyncError::io(path, e))?;
    let mut doc = Document::parse(&bytes)
        .map_err(|e| NavAsyncError::parse(path, e))?
        .with_source_path(path);

    let extractor = FragmentExtractor::new(rewriter.locator(), config.nav_file_path());
    let extraction = extractor.extract(&mut doc)?;

    install_spinner(config)?;

    let outcome = rewriter
        .rewrite_located(&mut doc, extraction.nav_id)
        .map_err(|e| NavAsyncError::parse(path, e))?;
    Ok(match outcome {
        RewriteOutcome::Rewritten => write_document(&doc, path),
        RewriteOutcome::Skipped(reason) => PageOutcome::Skipped(reason),
    })
}

fn worker_loop(
    worker_id: usize,
    queue: &Mutex<VecDeque<PathBuf>>,
    rewriter: &PageRewriter,
    tx: &mpsc::UnboundedSender<PageReport>,
) {
    loop {
        let next = match queue.lock() {
            Ok(mut pending) => pending.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        };
        let Some(path) = next else {
            break;
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| rewriter.rewrite_file(&path)))
            .unwrap_or_else(|_| PageOutcome::Failed("rewrite panicked".to_string()));
        tracing::debug!("[worker {}] {}: {:?}", worker_id, path.display(), outcome);

        if tx.send(PageReport { path, outcome }).is_err() {
            // Collector is gone, nobody is waiting for more work
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_enumerate_pages_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.html", "");
        write(dir.path(), "a/index.html", "");
        write(dir.path(), "a.html", "");
        write(dir.path(), "nav.html", "");
        write(dir.path(), "sub/nav.html", "");
        write(dir.path(), "style.css", "");
        write(dir.path(), "UPPER.HTML", "");

        let config = NavAsyncConfig::new(dir.path(), "");
        let pages = enumerate_pages(&config).unwrap();
        let rel: Vec<String> = pages
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();

        // Ordered by path components: "a" sorts before "a.html"
        assert_eq!(rel, vec!["UPPER.HTML", "a/index.html", "a.html", "b.html"]);
    }

    #[test]
    fn test_batch_result_record() {
        let mut result = BatchResult::default();
        result.record(&PageReport {
            path: "a.html".into(),
            outcome: PageOutcome::Processed,
        });
        result.record(&PageReport {
            path: "b.html".into(),
            outcome: PageOutcome::Failed("boom".into()),
        });

        assert_eq!(result.completed(), 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.failures[0].path, PathBuf::from("b.html"));
    }

    #[tokio::test]
    async fn test_unreported_pages_count_as_failed() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = BatchOrchestrator::new(NavAsyncConfig::new(dir.path(), ""));
        let mut rx = orchestrator.event_bus.subscribe();
        let mut result = BatchResult {
            total: 3,
            ..BatchResult::default()
        };
        result.record(&PageReport {
            path: "a.html".into(),
            outcome: PageOutcome::Processed,
        });

        let unreported = BTreeSet::from([PathBuf::from("c.html"), PathBuf::from("b.html")]);
        orchestrator.fail_unreported(&mut result, unreported);

        assert_eq!(result.processed, 1);
        assert_eq!(result.failed, 2);
        assert_eq!(result.completed(), result.total);
        let failed: Vec<_> = result.failures.iter().map(|f| f.path.clone()).collect();
        assert_eq!(failed, vec![PathBuf::from("b.html"), PathBuf::from("c.html")]);
        assert!(result.failures.iter().all(|f| f.reason == "worker stopped"));

        let mut completed = Vec::new();
        while let Ok(BatchEvent::PageFinished { completed: n, .. }) = rx.try_recv() {
            completed.push(n);
        }
        assert_eq!(completed, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_run_empty_site() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_batch(dir.path(), "").await.unwrap();

        assert_eq!(result.total, 0);
        assert!(result.fragment_path.is_none());
        assert!(!dir.path().join("nav.html").exists());
    }

    #[tokio::test]
    async fn test_run_rejects_missing_site_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_batch(dir.path().join("nope"), "").await.unwrap_err();
        assert!(matches!(err, NavAsyncError::Config(_)));
    }
}
