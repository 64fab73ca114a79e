//! Fragment extraction
//!
//! Runs once per batch on the source page: serialize the navigation
//! subtree, persist it next to the pages, then drain the container so the
//! same document can go straight through the rewriter.

use dom::utils::collapse_blank_lines;
use dom::{Document, NodeId};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::assets::write_if_absent;
use crate::error::{NavAsyncError, Result};
use crate::locator::NavLocator;

/// The persisted navigation subtree
#[derive(Debug, Clone, Serialize)]
pub struct NavigationFragment {
    pub path: PathBuf,
    pub content: String,
    /// False when the file already existed and was left alone
    pub written: bool,
}

/// Result of extracting from the source document
#[derive(Debug)]
pub struct Extraction {
    pub fragment: NavigationFragment,
    /// Navigation container in the source document, now without children
    pub nav_id: NodeId,
    /// The source page was already rewritten by an earlier run
    pub reused: bool,
}

pub struct FragmentExtractor<'a> {
    locator: &'a NavLocator,
    fragment_path: PathBuf,
}

impl<'a> FragmentExtractor<'a> {
    pub fn new(locator: &'a NavLocator, fragment_path: impl Into<PathBuf>) -> Self {
        Self {
            locator,
            fragment_path: fragment_path.into(),
        }
    }

    pub fn fragment_path(&self) -> &Path {
        &self.fragment_path
    }

    /// Extract the navigation from `doc` and persist it.
    ///
    /// `NavigationNotFound` means no fragment can be produced and the batch
    /// must stop before touching any page.
    pub fn extract(&self, doc: &mut Document) -> Result<Extraction> {
        let source_path = doc
            .source_path()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let not_found = || NavAsyncError::NavigationNotFound {
            path: source_path.clone(),
            selector: self.locator.selector(),
        };

        let nav_id = self.locator.locate(doc).ok_or_else(not_found)?;

        if self.locator.is_placeholder(doc, nav_id) {
            // Rewritten by an earlier run: only the persisted fragment is left
            let content = match std::fs::read_to_string(&self.fragment_path) {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
                Err(e) => return Err(NavAsyncError::io(&self.fragment_path, e)),
            };
            tracing::info!(
                "Source page {} already rewritten, reusing {}",
                source_path.display(),
                self.fragment_path.display()
            );
            return Ok(Extraction {
                fragment: NavigationFragment {
                    path: self.fragment_path.clone(),
                    content,
                    written: false,
                },
                nav_id,
                reused: true,
            });
        }

        let markup = doc
            .serialize_node(nav_id)
            .map_err(|e| NavAsyncError::parse(&source_path, e))?;
        let content = collapse_blank_lines(&markup);

        let written = write_if_absent(&self.fragment_path, content.as_bytes())?;
        if written {
            tracing::info!("Navigation saved to: {}", self.fragment_path.display());
        } else {
            tracing::info!(
                "Navigation file {} already exists, keeping it",
                self.fragment_path.display()
            );
        }

        doc.clear_children(nav_id)
            .map_err(|e| NavAsyncError::parse(&source_path, e))?;

        Ok(Extraction {
            fragment: NavigationFragment {
                path: self.fragment_path.clone(),
                content,
                written,
            },
            nav_id,
            reused: false,
        })
    }
}
