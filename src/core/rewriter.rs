//! Image reference matching and rewriting.
//!
//! Two matchers run in a fixed order over a document's text:
//!
//! 1. [`MarkdownMatcher`]: `![alt](source)` not already followed by a
//!    `{: ... }` attribute annotation.
//! 2. [`HtmlMatcher`]: `<img ... src="..." ... alt="..." ...>`.
//!
//! The Markdown pass is fully substituted before the HTML pass scans the
//! result. Every match becomes
//! `![alt](source){: style="..." }`, with remote sources swapped for the path
//! of their cached copy. A remote source that cannot be cached leaves its
//! match untouched.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{canonical, ImageReference, RewriteStats, Source, Syntax};

use super::asset_cache::AssetCache;

/// Inline style written into every canonical reference
pub const DEFAULT_STYLE: &str = "display: block; margin: auto; width: 60%;";

/// Directory (relative to a document) holding its cached assets
pub const DEFAULT_ASSETS_DIR: &str = "assets";

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

regex!(MARKDOWN_IMAGE_REGEX, r"!\[([^\]]*)\]\(([^)\s]+)\)");
regex!(
    HTML_IMAGE_REGEX,
    r#"(?i)<img\s+[^>]*src=["']([^"']+)["'][^>]*alt=["']([^"']*)["'][^>]*>"#
);

/// Finds image references of one syntax
pub trait ReferenceMatcher: Send + Sync {
    /// Syntax this matcher recognizes
    fn syntax(&self) -> Syntax;

    /// First reference starting at or after byte offset `from`
    fn find_next(&self, text: &str, from: usize) -> Option<ImageReference>;
}

/// Markdown inline images without an attribute annotation
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownMatcher;

impl MarkdownMatcher {
    /// `{:` followed by a `}` on the same line
    fn is_annotated(rest: &str) -> bool {
        match rest.strip_prefix("{:") {
            Some(tail) => {
                let line = tail.split('\n').next().unwrap_or_default();
                line.contains('}')
            }
            None => false,
        }
    }
}

impl ReferenceMatcher for MarkdownMatcher {
    fn syntax(&self) -> Syntax {
        Syntax::Markdown
    }

    fn find_next(&self, text: &str, from: usize) -> Option<ImageReference> {
        let mut pos = from;
        while pos <= text.len() {
            let caps = MARKDOWN_IMAGE_REGEX.captures_at(text, pos)?;
            let whole = caps.get(0)?;

            if Self::is_annotated(&text[whole.end()..]) {
                // Already canonical. Matches start with '!', so one byte on is
                // always a char boundary.
                pos = whole.start() + 1;
                continue;
            }

            return Some(ImageReference {
                alt: caps[1].to_string(),
                source: caps[2].to_string(),
                syntax: Syntax::Markdown,
                span: whole.range(),
            });
        }
        None
    }
}

/// HTML `<img>` tags with `src` before `alt`
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlMatcher;

impl ReferenceMatcher for HtmlMatcher {
    fn syntax(&self) -> Syntax {
        Syntax::Html
    }

    fn find_next(&self, text: &str, from: usize) -> Option<ImageReference> {
        let caps = HTML_IMAGE_REGEX.captures_at(text, from)?;
        let whole = caps.get(0)?;

        Some(ImageReference {
            alt: caps[2].to_string(),
            source: caps[1].to_string(),
            syntax: Syntax::Html,
            span: whole.range(),
        })
    }
}

/// Matchers in the order they are applied
pub fn matchers() -> [&'static dyn ReferenceMatcher; 2] {
    [&MarkdownMatcher, &HtmlMatcher]
}

/// Everything one document's rewrite needs
pub struct RewriteContext<'a> {
    /// Directory containing the document
    pub document_dir: &'a Path,

    /// Where remote images for this document are cached
    pub asset_dir: PathBuf,

    /// Cache resolving remote sources
    pub cache: &'a AssetCache,

    /// Inline style for canonical references
    pub style: &'a str,
}

/// Output of a rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    /// New document text
    pub content: String,

    /// What was found and done
    pub stats: RewriteStats,
}

/// Owns the cache and formatting settings shared by every document
pub struct Rewriter {
    cache: AssetCache,
    style: String,
    assets_dir: String,
}

impl Rewriter {
    /// Create a rewriter with the default style and assets directory name
    pub fn new(cache: AssetCache) -> Self {
        Self {
            cache,
            style: DEFAULT_STYLE.to_string(),
            assets_dir: DEFAULT_ASSETS_DIR.to_string(),
        }
    }

    /// Override the inline style
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    /// Override the assets directory name
    pub fn with_assets_dir(mut self, assets_dir: impl Into<String>) -> Self {
        self.assets_dir = assets_dir.into();
        self
    }

    /// Build the context for a document living in `document_dir`
    pub fn context<'a>(&'a self, document_dir: &'a Path) -> RewriteContext<'a> {
        RewriteContext {
            document_dir,
            asset_dir: document_dir.join(&self.assets_dir),
            cache: &self.cache,
            style: &self.style,
        }
    }

    /// Rewrite a document's text
    pub async fn rewrite(&self, text: &str, document_dir: &Path) -> Rewritten {
        rewrite(text, &self.context(document_dir)).await
    }
}

/// Run every matcher over `text` in order, substituting as it goes
pub async fn rewrite(text: &str, ctx: &RewriteContext<'_>) -> Rewritten {
    let mut stats = RewriteStats::default();
    let mut content = text.to_string();

    for matcher in matchers() {
        content = rewrite_pass(matcher, &content, ctx, &mut stats).await;
    }

    Rewritten { content, stats }
}

async fn rewrite_pass(
    matcher: &dyn ReferenceMatcher,
    text: &str,
    ctx: &RewriteContext<'_>,
    stats: &mut RewriteStats,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;

    while let Some(reference) = matcher.find_next(text, pos) {
        out.push_str(&text[pos..reference.span.start]);
        out.push_str(&replacement(&reference, text, ctx, stats).await);
        pos = reference.span.end;
    }

    out.push_str(&text[pos..]);
    out
}

async fn replacement(
    reference: &ImageReference,
    text: &str,
    ctx: &RewriteContext<'_>,
    stats: &mut RewriteStats,
) -> String {
    stats.references += 1;

    match reference.kind() {
        Source::Local => {
            stats.local += 1;
            canonical(&reference.alt, &reference.source, ctx.style)
        }
        Source::Remote => match ctx.cache.resolve(&reference.source, &ctx.asset_dir).await {
            Ok(path) => {
                stats.localized += 1;
                let source = relative_source(&path, ctx.document_dir);
                canonical(&reference.alt, &source, ctx.style)
            }
            Err(_) => {
                stats.unresolved += 1;
                reference.matched(text).to_string()
            }
        },
    }
}

/// `path` relative to `base`, joined with `/` on every platform
pub fn relative_source(path: &Path, base: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// List the references in `text` without resolving or rewriting anything.
///
/// Markdown references come first, then HTML ones, each in text order.
pub fn scan(text: &str) -> Vec<ImageReference> {
    let mut found = Vec::new();
    for matcher in matchers() {
        let mut pos = 0;
        while let Some(reference) = matcher.find_next(text, pos) {
            pos = reference.span.end;
            found.push(reference);
        }
    }
    found
}
