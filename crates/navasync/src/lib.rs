//! Asynchronous navigation for statically generated documentation sites
//!
//! Large documentation sites repeat the same navigation tree in every page.
//! This crate pulls that tree out once into a standalone fragment file and
//! rewrites every page so the container holds only a loading indicator plus a
//! small script that fetches the fragment after load.
//!
//! # Architecture
//!
//! 1. **One source page**: the first page in path order provides the fragment
//! 2. **Pages are independent**: each worker owns the document it parses
//! 3. **Idempotent**: already rewritten pages are recognised and left alone

pub mod assets;
pub mod config;
pub mod error;
pub mod events;
pub mod extractor;
pub mod locator;
pub mod orchestrator;
pub mod page;
pub mod placeholder;
pub mod rewriter;

pub use config::NavAsyncConfig;
pub use error::{NavAsyncError, Result};
pub use events::{BatchEvent, EventBus};
pub use extractor::{FragmentExtractor, NavigationFragment};
pub use locator::NavLocator;
pub use orchestrator::{enumerate_pages, run_batch, BatchOrchestrator, BatchResult, PageFailure};
pub use page::{PageProcessor, ProcessedPage};
pub use placeholder::{BasePath, PlaceholderSpec};
pub use rewriter::{PageOutcome, PageRewriter, RewriteOutcome, SkipReason};
