//! Per-document read → rewrite → backup → write.
//!
//! A document is only touched when its rewritten text differs from what was
//! read. When it does, the original bytes are copied to `<path>.bak` before
//! the document is overwritten, so a crash between the two steps never loses
//! the original.

use std::path::Path;

use anyhow::{Context, Result};
use filetime::FileTime;
use tokio::fs;
use tracing::{debug, info, instrument};

use crate::domain::{Document, DocumentReport, Outcome};

use super::rewriter::Rewriter;

/// Default suffix appended to a document path to name its backup
pub const DEFAULT_BACKUP_SUFFIX: &str = ".bak";

/// Rewrites documents in place
pub struct DocumentProcessor {
    /// Rewriter (and the asset cache behind it)
    rewriter: Rewriter,

    /// Appended to the document path to name the backup
    backup_suffix: String,

    /// Report changes without writing
    dry_run: bool,
}

impl DocumentProcessor {
    /// Create a processor that writes changes
    pub fn new(rewriter: Rewriter) -> Self {
        Self {
            rewriter,
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            dry_run: false,
        }
    }

    /// Override the backup suffix
    pub fn with_backup_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.backup_suffix = suffix.into();
        self
    }

    /// Leave documents and backups untouched
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Process one document.
    ///
    /// Fetch failures are absorbed by the rewriter. Filesystem errors on the
    /// document or its backup are returned.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn process(&self, path: &Path) -> Result<DocumentReport> {
        let mut doc = Document::load(path).await?;

        let rewritten = self.rewriter.rewrite(&doc.content, &doc.directory).await;
        doc.content = rewritten.content;

        let outcome = if !doc.is_changed() {
            debug!("No changes");
            Outcome::Skipped
        } else if self.dry_run {
            info!("Would update (dry run)");
            Outcome::Updated
        } else {
            self.write_with_backup(&doc).await?;
            Outcome::Updated
        };

        Ok(DocumentReport {
            path: doc.path,
            outcome,
            stats: rewritten.stats,
            error: None,
        })
    }

    /// Replace any previous backup with the current file, then overwrite it
    async fn write_with_backup(&self, doc: &Document) -> Result<()> {
        let backup = doc.backup_path(&self.backup_suffix);

        if backup.exists() {
            fs::remove_file(&backup)
                .await
                .with_context(|| format!("Failed to remove old backup: {}", backup.display()))?;
        }

        fs::copy(&doc.path, &backup)
            .await
            .with_context(|| format!("Failed to create backup: {}", backup.display()))?;

        let metadata = fs::metadata(&doc.path)
            .await
            .with_context(|| format!("Failed to stat document: {}", doc.path.display()))?;
        filetime::set_file_mtime(&backup, FileTime::from_last_modification_time(&metadata))
            .with_context(|| format!("Failed to set backup mtime: {}", backup.display()))?;

        fs::write(&doc.path, &doc.content)
            .await
            .with_context(|| format!("Failed to write document: {}", doc.path.display()))?;

        Ok(())
    }
}
