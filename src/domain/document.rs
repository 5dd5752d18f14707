//! Documents and per-document results.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

/// A Markdown document loaded for rewriting
#[derive(Debug, Clone)]
pub struct Document {
    /// Path to the file
    pub path: PathBuf,

    /// Parent directory, the base for relative asset paths
    pub directory: PathBuf,

    /// Current (possibly rewritten) text
    pub content: String,

    /// Text as read from disk
    pub original_content: String,
}

impl Document {
    /// Read a document from disk and snapshot its content
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read document: {}", path.display()))?;

        let directory = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            path: path.to_path_buf(),
            directory,
            original_content: content.clone(),
            content,
        })
    }

    /// Whether the content differs from the snapshot
    pub fn is_changed(&self) -> bool {
        self.content != self.original_content
    }

    /// Sibling path holding the pre-rewrite bytes (`<path><suffix>`)
    pub fn backup_path(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    }
}

/// Counts gathered while rewriting one document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteStats {
    /// References matched by either syntax
    pub references: usize,

    /// Local references put into canonical form
    pub local: usize,

    /// Remote references replaced by a cached asset path
    pub localized: usize,

    /// Remote references left untouched because resolution failed
    pub unresolved: usize,
}

impl RewriteStats {
    /// Add another set of counts into this one
    pub fn merge(&mut self, other: &RewriteStats) {
        self.references += other.references;
        self.local += other.local;
        self.localized += other.localized;
        self.unresolved += other.unresolved;
    }
}

/// What happened to a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Content changed; backup written and document overwritten
    Updated,

    /// Content unchanged; nothing written
    Skipped,

    /// Processing failed (lenient runs only)
    Failed,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Updated => write!(f, "updated"),
            Outcome::Skipped => write!(f, "skipped"),
            Outcome::Failed => write!(f, "failed"),
        }
    }
}

/// Result of processing a single document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    /// Document path
    pub path: PathBuf,

    /// What happened
    pub outcome: Outcome,

    /// Rewrite counts
    pub stats: RewriteStats,

    /// Error message (failed documents only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
