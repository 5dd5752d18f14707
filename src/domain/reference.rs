//! Image references found in document text.
//!
//! A reference is a single image inclusion, written either as a Markdown
//! inline image or as an HTML `<img>` tag.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Syntax a reference was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Syntax {
    /// `![alt](source)`
    Markdown,

    /// `<img src="source" alt="alt">`
    Html,
}

impl std::fmt::Display for Syntax {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Syntax::Markdown => f.pad("markdown"),
            Syntax::Html => f.pad("html"),
        }
    }
}

/// Where a reference points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// `http://` or `https://` URL, eligible for localization
    Remote,

    /// Anything else, left as written
    Local,
}

impl Source {
    /// Classify a raw source string
    pub fn classify(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            Source::Remote
        } else {
            Source::Local
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Remote => f.pad("remote"),
            Source::Local => f.pad("local"),
        }
    }
}

/// A parsed occurrence of an image inside a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Display text, possibly empty
    pub alt: String,

    /// Remote URL or local relative path, exactly as written
    pub source: String,

    /// Which syntax matched
    pub syntax: Syntax,

    /// Byte range of the whole match in the scanned text
    pub span: Range<usize>,
}

impl ImageReference {
    /// Classification of the source
    pub fn kind(&self) -> Source {
        Source::classify(&self.source)
    }

    /// The original matched text
    pub fn matched<'t>(&self, text: &'t str) -> &'t str {
        &text[self.span.clone()]
    }
}

/// Render a reference in canonical form.
///
/// `style` is the inline CSS placed in the attribute annotation.
pub fn canonical(alt: &str, source: &str, style: &str) -> String {
    format!("![{}]({}){{: style=\"{}\" }}", alt, source, style)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_classification() {
        assert_eq!(Source::classify("https://example.com/a.png"), Source::Remote);
        assert_eq!(Source::classify("http://x/y.png"), Source::Remote);
        assert_eq!(Source::classify("./img/cat.png"), Source::Local);
        assert_eq!(Source::classify("HTTPS://example.com/a.png"), Source::Local);
        assert_eq!(Source::classify("ftp://example.com/a.png"), Source::Local);
    }

    #[test]
    fn test_canonical_format_is_exact() {
        assert_eq!(
            canonical("cat", "./img/cat.png", "display: block; margin: auto; width: 60%;"),
            r#"![cat](./img/cat.png){: style="display: block; margin: auto; width: 60%;" }"#
        );
    }

    #[test]
    fn test_matched_text() {
        let text = "see ![a](b.png) here";
        let reference = ImageReference {
            alt: "a".to_string(),
            source: "b.png".to_string(),
            syntax: Syntax::Markdown,
            span: 4..15,
        };
        assert_eq!(reference.matched(text), "![a](b.png)");
        assert_eq!(reference.kind(), Source::Local);
    }
}
