//! Page rewriting
//!
//! Replaces the navigation container's content with the loading indicator
//! and injects the bootstrap script. Works on one owned `Document`; the
//! rewriter itself is immutable and shared by all workers.

use dom::{Document, NodeId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::locator::NavLocator;
use crate::placeholder::{PlaceholderSpec, SCRIPT_ID};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The page has no navigation container
    NoNavigation,
    /// The container already holds the loading indicator
    AlreadyRewritten,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewriteOutcome {
    Rewritten,
    Skipped(SkipReason),
}

/// Per-file result reported by the batch workers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageOutcome {
    Processed,
    Skipped(SkipReason),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct PageRewriter {
    locator: NavLocator,
    placeholder: PlaceholderSpec,
}

impl PageRewriter {
    pub fn new(locator: NavLocator, placeholder: PlaceholderSpec) -> Self {
        Self {
            locator,
            placeholder,
        }
    }

    pub fn locator(&self) -> &NavLocator {
        &self.locator
    }

    pub fn placeholder(&self) -> &PlaceholderSpec {
        &self.placeholder
    }

    /// Locate the navigation and rewrite the page in memory
    pub fn rewrite(&self, doc: &mut Document) -> dom::Result<RewriteOutcome> {
        match self.locator.locate(doc) {
            Some(nav_id) => self.rewrite_located(doc, nav_id),
            None => Ok(RewriteOutcome::Skipped(SkipReason::NoNavigation)),
        }
    }

    /// Rewrite around an already located container (fused extraction case)
    pub fn rewrite_located(
        &self,
        doc: &mut Document,
        nav_id: NodeId,
    ) -> dom::Result<RewriteOutcome> {
        if self.locator.is_placeholder(doc, nav_id) {
            return Ok(RewriteOutcome::Skipped(SkipReason::AlreadyRewritten));
        }

        doc.clear_children(nav_id)?;
        doc.retain_attributes(nav_id, &[self.locator.attr()])?;

        let indicator = self.placeholder.build_indicator(doc)?;
        doc.append_child(nav_id, indicator)?;

        if doc.find_by_id(SCRIPT_ID).is_none() {
            let script = self.placeholder.build_script(doc)?;
            let host = script_host(doc);
            doc.append_child(host, script)?;
        }

        Ok(RewriteOutcome::Rewritten)
    }

    /// Read, rewrite and write back one page file.
    ///
    /// Skipped pages are not written, so they stay byte-identical.
    pub fn rewrite_file(&self, path: &Path) -> PageOutcome {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => return PageOutcome::Failed(format!("read failed: {e}")),
        };
        let mut doc = match Document::parse(&bytes) {
            Ok(doc) => doc.with_source_path(path),
            Err(e) => return PageOutcome::Failed(format!("parse failed: {e}")),
        };

        match self.rewrite(&mut doc) {
            Ok(RewriteOutcome::Rewritten) => write_document(&doc, path),
            Ok(RewriteOutcome::Skipped(reason)) => PageOutcome::Skipped(reason),
            Err(e) => PageOutcome::Failed(format!("rewrite failed: {e}")),
        }
    }
}

/// Element the bootstrap script goes into: body, else html, else the root
fn script_host(doc: &Document) -> NodeId {
    doc.body()
        .or_else(|| doc.arena().find_one(|node| node.is_tag("html")))
        .unwrap_or_else(|| doc.root_id())
}

/// Serialize `doc` over `path`
pub fn write_document(doc: &Document, path: &Path) -> PageOutcome {
    let html = match doc.serialize() {
        Ok(html) => html,
        Err(e) => return PageOutcome::Failed(format!("serialize failed: {e}")),
    };
    match std::fs::write(path, html) {
        Ok(()) => PageOutcome::Processed,
        Err(e) => PageOutcome::Failed(format!("write failed: {e}")),
    }
}

/// Outcome of one file as sent to the collector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageReport {
    pub path: PathBuf,
    pub outcome: PageOutcome,
}
