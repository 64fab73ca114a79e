//! HTML document model
//!
//! Mutable, arena-backed HTML trees for batch page rewriting.
//!
//! ## Core Design
//!
//! ```text
//! page bytes → html5ever (scraper) → DomArena (owned) → mutate → HtmlSerializer → bytes
//!                                        ↓
//!                                  NodeId (u32)
//! ```
//!
//! - **Data structures first**: every node lives in one `Vec`, links are indices
//! - **Tolerant input**: parsing never fails on malformed markup, only on bad encoding
//! - **Faithful output**: serialize → parse gives back an equivalent tree

pub mod arena;
pub mod document;
pub mod error;
pub mod parser;
pub mod serializer;
pub mod types;
pub mod utils;

pub use arena::DomArena;
pub use document::Document;
pub use error::{DomError, Result};
pub use serializer::{HtmlSerializer, SerializerConfig};
pub use types::*;
