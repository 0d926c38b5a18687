//! Markup assembler
//!
//! Merges the chapters of one book into a single self-contained HTML
//! document: style block, title page, then one `<section class="chapter">`
//! per chapter in reading order, with every resource reference either
//! inlined as a `data:` URI or neutralized.

mod references;
mod style;

pub use style::style_block;

use crate::config::StyleConfig;
use crate::types::{Chapter, ResolvedMetadata, ResourceMap};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

static XML_DECL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<\?xml.*?\?>").unwrap());
static DOCTYPE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<!DOCTYPE[^>]*>").unwrap());
static BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*)</body\s*>").unwrap());
static HEAD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<head\b.*?</head\s*>").unwrap());
static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</?html\b[^>]*>").unwrap());
static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script\b(?:[^>"']|"[^"]*"|'[^']*')*/>|<script\b.*?</script\s*>"#).unwrap()
});
static STYLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<style\b.*?</style\s*>").unwrap());
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<(?:link|base)\b(?:[^>"']|"[^"]*"|'[^']*')*>"#).unwrap()
});

/// A referenced resource that could not be inlined. Not an error: the
/// reference is neutralized and the book still converts.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MissingResourceWarning {
    /// Archive path of the chapter containing the reference
    pub chapter: String,

    /// The reference as written in the markup
    pub reference: String,
}

impl fmt::Display for MissingResourceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: missing resource {}", self.chapter, self.reference)
    }
}

/// One styled, self-contained HTML document for a whole book
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    html: String,

    /// Number of chapter sections
    pub chapter_count: usize,

    /// Number of references rewritten to `data:` URIs
    pub inlined_references: usize,

    /// References that were neutralized
    pub warnings: Vec<MissingResourceWarning>,
}

impl AssembledDocument {
    /// The markup
    pub fn as_str(&self) -> &str {
        &self.html
    }

    /// Consume the document, returning the markup
    pub fn into_string(self) -> String {
        self.html
    }

    /// The markup with an extra stylesheet appended to the head, so its rules
    /// take precedence over the document's own style block
    pub fn with_stylesheet(&self, css: &str) -> String {
        let block = format!("<style>\n{}</style>\n", css);
        match self.html.find("</head>") {
            Some(idx) => {
                let mut html = String::with_capacity(self.html.len() + block.len());
                html.push_str(&self.html[..idx]);
                html.push_str(&block);
                html.push_str(&self.html[idx..]);
                html
            }
            None => format!("{}{}", block, self.html),
        }
    }
}

/// Build the document for one book
pub fn assemble(
    metadata: &ResolvedMetadata,
    chapters: &[Chapter],
    resources: &ResourceMap,
    style: &StyleConfig,
) -> AssembledDocument {
    let mut body = String::new();
    let mut inlined_references = 0;
    let mut warnings = Vec::new();

    body.push_str(&front_matter(metadata));

    for (index, chapter) in chapters.iter().enumerate() {
        let content = clean_chapter(&chapter.content);
        let rewritten = references::rewrite_references(&content, chapter.base_dir(), resources);

        inlined_references += rewritten.inlined;
        for reference in rewritten.missing {
            let warning = MissingResourceWarning {
                chapter: chapter.href.clone(),
                reference,
            };
            tracing::warn!("{}", warning);
            warnings.push(warning);
        }

        body.push_str(&format!(
            "<section class=\"chapter\" id=\"chapter-{}\" data-source=\"{}\">\n{}\n</section>\n",
            index + 1,
            escape_html(&chapter.href),
            rewritten.markup.trim()
        ));
    }

    let lang = metadata
        .language
        .as_deref()
        .map(|l| format!(" lang=\"{}\"", escape_html(l)))
        .unwrap_or_default();

    let html = format!(
        "<!DOCTYPE html>\n<html{}>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>\n{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        lang,
        escape_html(&metadata.title),
        style_block(style),
        body
    );

    AssembledDocument {
        html,
        chapter_count: chapters.len(),
        inlined_references,
        warnings,
    }
}

/// Title page block shown before the first chapter
pub fn front_matter(metadata: &ResolvedMetadata) -> String {
    format!(
        "<div class=\"title-page\">\n<div class=\"title\">{}</div>\n<div class=\"author\">{}</div>\n</div>\n",
        escape_html(&metadata.title),
        escape_html(&metadata.author)
    )
}

/// Body content of a chapter without scripts, stylesheets, or document scaffolding
fn clean_chapter(content: &str) -> String {
    let content = XML_DECL_RE.replace_all(content, "");
    let content = DOCTYPE_RE.replace_all(&content, "");

    let body = match BODY_RE.captures(&content) {
        Some(caps) => caps[1].to_string(),
        None => {
            let without_head = HEAD_RE.replace_all(&content, "");
            HTML_TAG_RE.replace_all(&without_head, "").into_owned()
        }
    };

    let body = SCRIPT_RE.replace_all(&body, "");
    let body = STYLE_RE.replace_all(&body, "");
    LINK_RE.replace_all(&body, "").into_owned()
}

/// Escape text for element content and double-quoted attributes
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
