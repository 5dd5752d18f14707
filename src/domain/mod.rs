//! Domain types for localimg.
//!
//! This module contains the core data structures:
//! - Reference: Image occurrences and their syntax
//! - Document: Loaded files and per-document results
//! - Summary: Run totals

pub mod document;
pub mod reference;
pub mod summary;

// Re-export commonly used types
pub use document::{Document, DocumentReport, Outcome, RewriteStats};
pub use reference::{canonical, ImageReference, Source, Syntax};
pub use summary::RunSummary;
