//! Main orchestrator for a run over a document tree.
//!
//! Walks the root, processes documents one at a time and aggregates a
//! [`RunSummary`]. In strict mode the first filesystem error aborts the run;
//! otherwise the failing document is recorded and the walk continues.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, instrument};

use crate::adapters::{Fetcher, HttpFetcher};
use crate::config::ResolvedConfig;
use crate::domain::{DocumentReport, Outcome, RewriteStats, RunSummary};

use super::asset_cache::AssetCache;
use super::processor::DocumentProcessor;
use super::rewriter::{relative_source, Rewriter};
use super::walker::TreeWalker;

/// Drives the rewrite pipeline over every document under a root
pub struct Orchestrator {
    /// Run settings
    config: ResolvedConfig,

    /// Per-document pipeline
    processor: DocumentProcessor,
}

impl Orchestrator {
    /// Create an orchestrator that fetches over HTTP
    pub fn new(config: ResolvedConfig) -> Result<Self> {
        let fetcher = HttpFetcher::with_timeout(config.timeout, config.user_agent.clone())?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    /// Create an orchestrator with a custom fetcher
    pub fn with_fetcher(config: ResolvedConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        let cache = AssetCache::new(fetcher).offline(config.offline);
        let rewriter = Rewriter::new(cache)
            .with_style(config.style.clone())
            .with_assets_dir(config.assets_dir.clone());
        let processor = DocumentProcessor::new(rewriter)
            .with_backup_suffix(config.backup_suffix.clone())
            .dry_run(config.dry_run);

        Self { config, processor }
    }

    /// Settings in use
    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Process every document under the configured root
    #[instrument(skip(self), fields(root = %self.config.root.display()))]
    pub async fn run(&self) -> Result<RunSummary> {
        let walker = TreeWalker::new(&self.config.root, &self.config.extension)
            .with_excludes(&self.config.exclude)?;

        let mut summary = RunSummary::new(self.config.root.clone(), self.config.dry_run);

        for entry in walker.documents()? {
            let report = match entry {
                Ok(path) => self.process_document(&path).await?,
                Err(e) => self.handle_failure(None, e)?,
            };
            summary.record(report);
        }

        info!(
            updated = summary.updated,
            skipped = summary.skipped,
            failed = summary.failed,
            "Run complete"
        );

        Ok(summary)
    }

    /// Process one document, applying the failure policy
    async fn process_document(&self, path: &Path) -> Result<DocumentReport> {
        let relative = relative_source(path, &self.config.root);

        match self.processor.process(path).await {
            Ok(report) => {
                match report.outcome {
                    Outcome::Updated if self.config.dry_run => {
                        info!("Would update: {}", relative)
                    }
                    Outcome::Updated => info!("Updated: {} (backup replaced)", relative),
                    Outcome::Skipped => info!("Skipped: {}", relative),
                    Outcome::Failed => {}
                }
                Ok(report)
            }
            Err(e) => self.handle_failure(Some(path), e),
        }
    }

    /// Abort in strict mode; otherwise log and record the failure
    fn handle_failure(&self, path: Option<&Path>, err: anyhow::Error) -> Result<DocumentReport> {
        if self.config.strict {
            return Err(err);
        }

        let path = path.map(Path::to_path_buf).unwrap_or_default();
        error!("Failed: {} ({:#})", path.display(), err);

        Ok(DocumentReport {
            path,
            outcome: Outcome::Failed,
            stats: RewriteStats::default(),
            error: Some(format!("{:#}", err)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_orchestrator_creation() {
        let orchestrator = Orchestrator::new(ResolvedConfig::for_root("/docs")).unwrap();
        assert_eq!(orchestrator.config().root, Path::new("/docs"));
        assert_eq!(orchestrator.config().extension, "md");
    }

    #[tokio::test]
    async fn test_run_on_missing_root_fails() {
        let temp = TempDir::new().unwrap();
        let orchestrator =
            Orchestrator::new(ResolvedConfig::for_root(temp.path().join("missing"))).unwrap();
        assert!(orchestrator.run().await.is_err());
    }

    // End-to-end runs with a fake fetcher are in tests/pipeline.rs
}
