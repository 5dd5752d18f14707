//! localimg - Markdown image canonicalizer and localizer
//!
//! Rewrites every image reference in a tree of Markdown documents into one
//! canonical form and downloads remote images next to the documents that use
//! them.
//!
//! # Pipeline
//!
//! ```text
//! TreeWalker → DocumentProcessor → Rewriter → AssetCache → Fetcher
//! ```
//!
//! - Remote images are cached at `<doc dir>/assets/<sha1(url)><ext>` and
//!   never fetched twice while the file exists
//! - A document is only written when its text changes, and only after the
//!   original has been copied to `<doc>.bak`
//! - A failed download leaves its reference exactly as written
//!
//! # Modules
//!
//! - `adapters`: Remote fetching (HTTP)
//! - `core`: Pipeline (AssetCache, Rewriter, DocumentProcessor, TreeWalker, Orchestrator)
//! - `domain`: Data structures (ImageReference, Document, RunSummary)
//! - `config`: Layered configuration
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Rewrite everything under docs/
//! localimg run docs
//!
//! # See what would change
//! localimg run docs --dry-run --offline
//!
//! # List references
//! localimg scan docs
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use crate::adapters::{FetchError, Fetcher, HttpFetcher};
pub use crate::config::{Overrides, ResolvedConfig};
pub use crate::core::{
    AssetCache, CacheError, DocumentProcessor, Orchestrator, Rewriter, TreeWalker,
};
pub use crate::domain::{Document, DocumentReport, ImageReference, Outcome, RunSummary, Syntax};
