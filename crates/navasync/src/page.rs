//! Per-page mode
//!
//! For generators that hand over pages one at a time as they are written.
//! The first page seen with a navigation container provides the fragment
//! (whichever invocation creates the file first wins); every page is then
//! rewritten exactly like in a batch run.

use dom::Document;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::assets::{install_spinner, write_if_absent};
use crate::config::NavAsyncConfig;
use crate::error::{NavAsyncError, Result};
use crate::locator::NavLocator;
use crate::placeholder::PlaceholderSpec;
use crate::rewriter::{PageRewriter, RewriteOutcome, SkipReason};
use dom::utils::collapse_blank_lines;

#[derive(Debug, Clone)]
pub struct ProcessedPage {
    pub html: String,
    pub outcome: RewriteOutcome,
    /// This page's navigation was written to the fragment file
    pub fragment_written: bool,
    pub elapsed: Duration,
}

pub struct PageProcessor {
    config: NavAsyncConfig,
    rewriter: PageRewriter,
}

impl PageProcessor {
    pub fn new(config: NavAsyncConfig) -> Result<Self> {
        config.validate()?;
        let locator = NavLocator::from_config(&config);
        let placeholder = PlaceholderSpec::from_config(&config, &locator);
        Ok(Self {
            config,
            rewriter: PageRewriter::new(locator, placeholder),
        })
    }

    /// Rewrite one page held in memory and return the new markup.
    ///
    /// Pages without navigation come back unchanged.
    pub fn process_html(&self, html: &str) -> Result<ProcessedPage> {
        self.process(html, None)
    }

    /// Rewrite one page file in place
    pub fn process_file(&self, path: &Path) -> Result<ProcessedPage> {
        let bytes = std::fs::read(path).map_err(|e| NavAsyncError::io(path, e))?;
        let html = dom::parser::decode(&bytes).map_err(|e| NavAsyncError::parse(path, e))?;

        let page = self.process(html, Some(path))?;
        if page.outcome == RewriteOutcome::Rewritten {
            std::fs::write(path, &page.html).map_err(|e| NavAsyncError::io(path, e))?;
        }
        tracing::info!(
            "Processed {} in {:.2} seconds",
            path.display(),
            page.elapsed.as_secs_f64()
        );
        Ok(page)
    }

    /// `page` names the file in errors; in-memory pages have none
    fn process(&self, html: &str, page: Option<&Path>) -> Result<ProcessedPage> {
        let doc_error = |e: dom::DomError| page_error(page, e);
        let started = Instant::now();
        install_spinner(&self.config)?;

        let mut doc = Document::parse_str(html);
        let locator = self.rewriter.locator();
        let Some(nav_id) = locator.locate(&doc) else {
            return Ok(ProcessedPage {
                html: html.to_string(),
                outcome: RewriteOutcome::Skipped(SkipReason::NoNavigation),
                fragment_written: false,
                elapsed: started.elapsed(),
            });
        };

        let mut fragment_written = false;
        let fragment_path = self.config.nav_file_path();
        if !locator.is_placeholder(&doc, nav_id) && !fragment_path.exists() {
            let markup = doc.serialize_node(nav_id).map_err(doc_error)?;
            let content = collapse_blank_lines(&markup);
            fragment_written = write_if_absent(&fragment_path, content.as_bytes())?;
            if fragment_written {
                tracing::info!("Navigation saved to: {}", fragment_path.display());
            }
        }

        let outcome = self
            .rewriter
            .rewrite_located(&mut doc, nav_id)
            .map_err(doc_error)?;
        let html = match outcome {
            RewriteOutcome::Rewritten => doc.serialize().map_err(doc_error)?,
            RewriteOutcome::Skipped(_) => html.to_string(),
        };

        Ok(ProcessedPage {
            html,
            outcome,
            fragment_written,
            elapsed: started.elapsed(),
        })
    }
}

/// Document errors are reported against the page being processed
fn page_error(page: Option<&Path>, source: dom::DomError) -> NavAsyncError {
    NavAsyncError::parse(page.map(Path::to_path_buf).unwrap_or_default(), source)
}
