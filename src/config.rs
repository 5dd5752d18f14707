//! Configuration for localimg runs.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags
//! 2. Environment variables (LOCALIMG_ROOT, LOCALIMG_TIMEOUT, LOCALIMG_OFFLINE)
//! 3. Config file (.localimg/config.yaml)
//! 4. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .localimg/config.yaml
//! - Paths in config file are relative to the directory containing .localimg/
//!
//! The result is a plain [`ResolvedConfig`] value handed to the orchestrator;
//! nothing is cached globally.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::http::default_user_agent;
use crate::adapters::DEFAULT_TIMEOUT;
use crate::core::processor::DEFAULT_BACKUP_SUFFIX;
use crate::core::rewriter::{DEFAULT_ASSETS_DIR, DEFAULT_STYLE};

/// Directory holding the config file
pub const CONFIG_DIR: &str = ".localimg";

/// Config file name inside [`CONFIG_DIR`]
pub const CONFIG_FILE: &str = "config.yaml";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub version: Option<String>,
    /// Document root (relative to the project directory)
    pub root: Option<String>,
    /// Document extension, without the dot
    pub extension: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub assets_dir: Option<String>,
    pub backup_suffix: Option<String>,
    pub style: Option<String>,
    pub user_agent: Option<String>,
    pub strict: Option<bool>,
    pub offline: Option<bool>,
    /// Glob patterns (relative to root) of documents to leave alone
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub root: Option<PathBuf>,
    pub extension: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub strict: Option<bool>,
    pub offline: Option<bool>,
    pub dry_run: Option<bool>,
    pub exclude: Vec<String>,
}

/// Resolved configuration
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// Directory walked for documents
    pub root: PathBuf,
    /// Document extension, without the dot
    pub extension: String,
    /// Bound on each remote fetch
    pub timeout: Duration,
    /// Asset directory name, relative to each document
    pub assets_dir: String,
    /// Appended to a document path to name its backup
    pub backup_suffix: String,
    /// Inline style in canonical references
    pub style: String,
    /// HTTP User-Agent header
    pub user_agent: String,
    /// Abort the run on the first document error
    pub strict: bool,
    /// Never fetch; only reuse cached assets
    pub offline: bool,
    /// Report changes without writing documents
    pub dry_run: bool,
    /// Glob patterns of documents to skip
    pub exclude: Vec<String>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            extension: "md".to_string(),
            timeout: DEFAULT_TIMEOUT,
            assets_dir: DEFAULT_ASSETS_DIR.to_string(),
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            style: DEFAULT_STYLE.to_string(),
            user_agent: default_user_agent(),
            strict: false,
            offline: false,
            dry_run: false,
            exclude: Vec::new(),
            config_file: None,
        }
    }
}

impl ResolvedConfig {
    /// Defaults rooted at `root`
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the project directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Load configuration from the process environment and working directory
pub fn load_config(overrides: &Overrides) -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    load_config_with(&cwd, overrides, |key| std::env::var(key).ok())
}

/// Load configuration with an explicit starting directory and env lookup
pub fn load_config_with<E>(start: &Path, overrides: &Overrides, env: E) -> Result<ResolvedConfig>
where
    E: Fn(&str) -> Option<String>,
{
    let defaults = ResolvedConfig::default();

    let config_file = find_config_file(start);
    let (file, base_dir) = match &config_file {
        Some(path) => {
            let file = load_config_file(path)?;
            // Base directory is the parent of .localimg/
            let base_dir = path
                .parent()
                .and_then(|p| p.parent())
                .unwrap_or(Path::new("."))
                .to_path_buf();
            (file, base_dir)
        }
        None => (ConfigFile::default(), start.to_path_buf()),
    };

    let root = if let Some(root) = &overrides.root {
        root.clone()
    } else if let Some(root) = env("LOCALIMG_ROOT") {
        PathBuf::from(root)
    } else if let Some(root) = &file.root {
        resolve_path(&base_dir, root)
    } else {
        start.to_path_buf()
    };

    let timeout_seconds = match overrides.timeout_seconds {
        Some(secs) => secs,
        None => match env("LOCALIMG_TIMEOUT") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid LOCALIMG_TIMEOUT: {}", raw))?,
            None => file
                .timeout_seconds
                .unwrap_or(defaults.timeout.as_secs()),
        },
    };
    if timeout_seconds == 0 {
        anyhow::bail!("Timeout must be at least one second");
    }

    let offline = overrides
        .offline
        .or_else(|| env("LOCALIMG_OFFLINE").map(|v| parse_bool(&v)))
        .or(file.offline)
        .unwrap_or(defaults.offline);

    let extension = overrides
        .extension
        .clone()
        .or(file.extension)
        .unwrap_or(defaults.extension);
    let extension = extension.trim_start_matches('.').to_string();
    if extension.is_empty() {
        anyhow::bail!("Document extension must not be empty");
    }

    let mut exclude = file.exclude;
    exclude.extend(overrides.exclude.iter().cloned());

    Ok(ResolvedConfig {
        root,
        extension,
        timeout: Duration::from_secs(timeout_seconds),
        assets_dir: file.assets_dir.unwrap_or(defaults.assets_dir),
        backup_suffix: file.backup_suffix.unwrap_or(defaults.backup_suffix),
        style: file.style.unwrap_or(defaults.style),
        user_agent: file.user_agent.unwrap_or(defaults.user_agent),
        strict: overrides.strict.or(file.strict).unwrap_or(defaults.strict),
        offline,
        dry_run: overrides.dry_run.unwrap_or(defaults.dry_run),
        exclude,
        config_file,
    })
}
