//! Document discovery under a root directory.
//!
//! The tree is walked with `jwalk`, sorted within each directory. Symlinked
//! directories are never entered, so a link back up the tree cannot make the
//! walk revisit documents or run forever.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::Pattern;
use jwalk::{Parallelism, WalkDir};

use super::rewriter::relative_source;

/// Walks a directory tree for documents with one extension
#[derive(Debug, Clone)]
pub struct TreeWalker {
    /// Directory to walk
    root: PathBuf,

    /// Extension without the dot
    extension: String,

    /// Documents to skip, matched against the root-relative path
    exclude: Vec<Pattern>,
}

impl TreeWalker {
    /// Create a walker for `*.<extension>` files under `root`
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        let extension: String = extension.into();
        Self {
            root: root.into(),
            extension: extension.trim_start_matches('.').to_string(),
            exclude: Vec::new(),
        }
    }

    /// Skip documents whose root-relative path matches any of `patterns`
    pub fn with_excludes(mut self, patterns: &[String]) -> Result<Self> {
        for pattern in patterns {
            let compiled = Pattern::new(pattern)
                .with_context(|| format!("Invalid exclude pattern: {}", pattern))?;
            self.exclude.push(compiled);
        }
        Ok(self)
    }

    /// The directory being walked
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File name pattern a document must match
    pub fn pattern(&self) -> Result<Pattern> {
        let pattern = format!("*.{}", Pattern::escape(&self.extension));
        Pattern::new(&pattern).with_context(|| format!("Invalid document pattern: {}", pattern))
    }

    /// Whether a document path is excluded
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.exclude.is_empty() {
            return false;
        }
        let relative = relative_source(path, &self.root);
        self.exclude.iter().any(|pattern| pattern.matches(&relative))
    }

    /// Lazily enumerate document files.
    ///
    /// Errors reading a directory are yielded in place of the entry.
    pub fn documents(&self) -> Result<impl Iterator<Item = Result<PathBuf>> + '_> {
        if !self.root.is_dir() {
            anyhow::bail!("Root directory does not exist: {}", self.root.display());
        }

        let pattern = self.pattern()?;
        let entries = WalkDir::new(&self.root)
            .parallelism(Parallelism::Serial)
            .sort(true)
            .skip_hidden(false)
            .follow_links(false);

        Ok(entries.into_iter().filter_map(move |entry| match entry {
            Ok(entry) => {
                if entry.file_type().is_dir() {
                    return None;
                }
                let path = entry.path();
                let matches = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| pattern.matches(name));
                if matches && path.is_file() && !self.is_excluded(&path) {
                    Some(Ok(path))
                } else {
                    None
                }
            }
            Err(e) => Some(Err(anyhow::Error::new(e).context("Failed to read directory entry"))),
        }))
    }
}
