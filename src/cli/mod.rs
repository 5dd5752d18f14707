//! Command-line interface for localimg.
//!
//! Provides commands for rewriting a document tree, listing the image
//! references it contains, and showing the resolved configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::config::{self, Overrides, ResolvedConfig};
use crate::core::{scan, Orchestrator, TreeWalker};
use crate::domain::RunSummary;

/// localimg - Canonicalize Markdown images and localize remote ones
#[derive(Parser, Debug)]
#[command(name = "localimg")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options selecting which documents to look at
#[derive(Args, Debug, Clone, Default)]
pub struct TreeArgs {
    /// Root directory (defaults to config, then the current directory)
    pub root: Option<PathBuf>,

    /// Document extension
    #[arg(short, long)]
    pub ext: Option<String>,

    /// Skip documents matching this glob (relative to root, repeatable)
    #[arg(long)]
    pub exclude: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rewrite image references and download remote images
    Run {
        #[command(flatten)]
        tree: TreeArgs,

        /// Abort on the first document that cannot be read or written
        #[arg(long)]
        strict: bool,

        /// Report what would change without writing documents
        #[arg(long)]
        dry_run: bool,

        /// Never download; only reuse already cached images
        #[arg(long)]
        offline: bool,

        /// Per-download timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List image references without changing anything
    Scan {
        #[command(flatten)]
        tree: TreeArgs,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run {
                tree,
                strict,
                dry_run,
                offline,
                timeout,
                json,
            } => {
                let overrides = Overrides {
                    strict: strict.then_some(true),
                    dry_run: dry_run.then_some(true),
                    offline: offline.then_some(true),
                    timeout_seconds: timeout,
                    ..tree_overrides(tree)
                };
                run_tree(&overrides, json).await
            }
            Commands::Scan { tree } => {
                scan_tree(&tree_overrides(tree)).await
            }
            Commands::Config => {
                show_config()
            }
        }
    }
}

fn tree_overrides(tree: TreeArgs) -> Overrides {
    Overrides {
        root: tree.root,
        extension: tree.ext,
        exclude: tree.exclude,
        ..Default::default()
    }
}

/// Rewrite every document under the root
async fn run_tree(overrides: &Overrides, json: bool) -> Result<()> {
    let cfg = config::load_config(overrides)?;
    let orchestrator = Orchestrator::new(cfg)?;
    let summary = orchestrator.run().await?;

    if json {
        let out =
            serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
        println!("{}", out);
    } else {
        print_summary(&summary);
    }

    if !summary.is_success() {
        std::process::exit(1);
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let verb = if summary.dry_run { "would update" } else { "updated" };
    println!(
        "{} documents: {} {}, {} skipped, {} failed",
        summary.total(),
        summary.updated,
        verb,
        summary.skipped,
        summary.failed
    );
    println!(
        "{} references: {} local, {} downloaded or cached, {} unresolved",
        summary.stats.references,
        summary.stats.local,
        summary.stats.localized,
        summary.stats.unresolved
    );

    for report in summary.documents.iter().filter(|r| r.error.is_some()) {
        eprintln!(
            "  failed: {} ({})",
            report.path.display(),
            report.error.as_deref().unwrap_or_default()
        );
    }
}

/// List references per document
async fn scan_tree(overrides: &Overrides) -> Result<()> {
    let cfg = config::load_config(overrides)?;
    let walker = TreeWalker::new(&cfg.root, &cfg.extension).with_excludes(&cfg.exclude)?;

    let mut total = 0;
    for entry in walker.documents()? {
        let path = entry?;
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read document: {}", path.display()))?;

        let references = scan(&content);
        if references.is_empty() {
            continue;
        }

        println!("{}", path.display());
        for reference in &references {
            println!(
                "  {:<9} {:<7} {}",
                reference.syntax,
                reference.kind(),
                reference.source
            );
        }
        total += references.len();
    }

    if total == 0 {
        println!("No image references found");
    }

    Ok(())
}

/// Print the resolved configuration
fn show_config() -> Result<()> {
    let cfg: ResolvedConfig = config::load_config(&Overrides::default())?;

    println!("localimg configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Documents:");
    println!("  Root:       {}", cfg.root.display());
    println!("  Extension:  .{}", cfg.extension);
    if cfg.exclude.is_empty() {
        println!("  Exclude:    (none)");
    } else {
        println!("  Exclude:    {}", cfg.exclude.join(", "));
    }
    println!();
    println!("Rewriting:");
    println!("  Assets dir: {}", cfg.assets_dir);
    println!("  Backup:     <document>{}", cfg.backup_suffix);
    println!("  Style:      {}", cfg.style);
    println!();
    println!("Downloads:");
    println!("  Timeout:    {}s", cfg.timeout.as_secs());
    println!("  User agent: {}", cfg.user_agent);
    println!("  Offline:    {}", cfg.offline);
    println!();
    println!("Failure mode: {}", if cfg.strict { "strict" } else { "lenient" });

    Ok(())
}
