//! Core rewrite pipeline.
//!
//! This module contains:
//! - AssetCache: URL-addressed image cache beside each document
//! - Rewriter: Reference matching and canonical rewriting
//! - DocumentProcessor: Read, rewrite, back up and write one document
//! - TreeWalker: Document discovery
//! - Orchestrator: Runs the pipeline over a tree

pub mod asset_cache;
pub mod orchestrator;
pub mod processor;
pub mod rewriter;
pub mod walker;

// Re-export commonly used types
pub use asset_cache::{asset_extension, asset_file_name, asset_key, AssetCache, CacheError};
pub use orchestrator::Orchestrator;
pub use processor::DocumentProcessor;
pub use rewriter::{
    rewrite, scan, HtmlMatcher, MarkdownMatcher, ReferenceMatcher, RewriteContext, Rewriter,
    Rewritten,
};
pub use walker::TreeWalker;
