//! Rewriting of resource references inside chapter markup
//!
//! Every start tag is scanned for attributes the renderer would fetch:
//! `src`, `poster`, `background`, `data` on `<object>`, `href|xlink:href`
//! on SVG `<image>`, `<use>` and `<feImage>`, `url(...)` inside `style`, and
//! `srcset`. Each one either becomes a `data:` URI or an inert
//! `data-missing-*` attribute, so the renderer never reads files or the
//! network.

use crate::types::{EmbeddedResource, ResourceMap};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// A start tag; quoted attribute values may contain `>`
static START_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<([A-Za-z][A-Za-z0-9:_.-]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#).unwrap()
});

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\s)([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
        .unwrap()
});

static CSS_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^)]*?))\s*\)"#).unwrap()
});

static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[xX][0-9A-Fa-f]+|#[0-9]+|[A-Za-z]+);").unwrap());

/// Outcome of looking up one reference
#[derive(Debug)]
pub(crate) enum Resolution<'a> {
    /// Found in the manifest
    Inline(&'a EmbeddedResource),
    /// Already self-contained (`data:` URI or same-document fragment)
    Keep,
    /// Unknown or external
    Missing,
}

/// Result of rewriting one chapter
#[derive(Debug, Default)]
pub(crate) struct Rewritten {
    pub markup: String,
    pub inlined: usize,
    pub missing: Vec<String>,
}

/// Rewrite every fetching reference in `markup`, resolving relative paths against `base_dir`
pub(crate) fn rewrite_references(markup: &str, base_dir: &str, resources: &ResourceMap) -> Rewritten {
    let mut rewriter = Rewriter {
        base_dir,
        resources,
        inlined: 0,
        missing: Vec::new(),
    };

    let markup = START_TAG_RE
        .replace_all(markup, |tag: &Captures| rewriter.rewrite_tag(tag))
        .into_owned();

    Rewritten {
        markup,
        inlined: rewriter.inlined,
        missing: rewriter.missing,
    }
}

struct Rewriter<'a> {
    base_dir: &'a str,
    resources: &'a ResourceMap,
    inlined: usize,
    missing: Vec<String>,
}

impl Rewriter<'_> {
    fn rewrite_tag(&mut self, tag: &Captures) -> String {
        let element = tag[1].to_ascii_lowercase();
        let attrs = ATTR_RE
            .replace_all(&tag[2], |attr: &Captures| self.rewrite_attr(&element, attr))
            .into_owned();
        format!("<{}{}>", &tag[1], attrs)
    }

    fn rewrite_attr(&mut self, element: &str, attr: &Captures) -> String {
        let lead = &attr[1];
        let name = attr[2].to_ascii_lowercase();
        let (raw, quote) = match (attr.get(3), attr.get(4), attr.get(5)) {
            (Some(m), _, _) => (m.as_str(), '"'),
            (_, Some(m), _) => (m.as_str(), '\''),
            (_, _, Some(m)) => (m.as_str(), '"'),
            _ => ("", '"'),
        };

        if name == "srcset" {
            self.missing.push(raw.to_string());
            return missing_attr(lead, &name, raw);
        }
        if name == "style" {
            let css = self.rewrite_css(raw);
            return format!("{}{}={}{}{}", lead, &attr[2], quote, css, quote);
        }
        if !is_fetching(element, &name) {
            return attr[0].to_string();
        }

        match resolve(raw, self.base_dir, self.resources) {
            Resolution::Inline(resource) => {
                self.inlined += 1;
                format!("{}{}=\"{}\"", lead, &attr[2], resource.data_uri())
            }
            Resolution::Keep => attr[0].to_string(),
            Resolution::Missing => {
                self.missing.push(raw.to_string());
                missing_attr(lead, &name, raw)
            }
        }
    }

    /// Inline `url(...)` targets in a style attribute; unresolvable ones become `none`
    fn rewrite_css(&mut self, css: &str) -> String {
        CSS_URL_RE
            .replace_all(css, |url: &Captures| {
                let raw = url
                    .get(1)
                    .or_else(|| url.get(2))
                    .or_else(|| url.get(3))
                    .map(|m| m.as_str())
                    .unwrap_or_default();
                // `url(&quot;a.png&quot;)` in a double-quoted attribute
                let decoded = decode_entities(raw);
                let reference = decoded.trim().trim_matches(|c| c == '"' || c == '\'');

                match resolve(reference, self.base_dir, self.resources) {
                    Resolution::Inline(resource) => {
                        self.inlined += 1;
                        format!("url({})", resource.data_uri())
                    }
                    Resolution::Keep => url[0].to_string(),
                    Resolution::Missing => {
                        self.missing.push(reference.to_string());
                        "none".to_string()
                    }
                }
            })
            .into_owned()
    }
}

/// Attributes the renderer would load as a subresource
fn is_fetching(element: &str, attribute: &str) -> bool {
    match attribute {
        "src" | "poster" | "background" => true,
        "data" => element == "object",
        "href" | "xlink:href" => matches!(
            element.rsplit(':').next().unwrap_or(element),
            "image" | "use" | "feimage"
        ),
        _ => false,
    }
}

fn missing_attr(lead: &str, name: &str, raw: &str) -> String {
    format!(
        "{}data-missing-{}=\"{}\"",
        lead,
        name.replace(':', "-"),
        raw.replace('"', "&quot;")
    )
}

/// Look a reference up: by archive path, then by manifest id, then by unique file name
pub(crate) fn resolve<'a>(reference: &str, base_dir: &str, resources: &'a ResourceMap) -> Resolution<'a> {
    let reference = reference.trim();
    if reference.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("data:")) {
        return Resolution::Keep;
    }
    if reference.len() > 1 && reference.starts_with('#') {
        return Resolution::Keep;
    }
    if reference.is_empty() || has_scheme(reference) {
        return Resolution::Missing;
    }

    let path_part = reference.split(['#', '?']).next().unwrap_or_default();
    let decoded = percent_decode(&decode_entities(path_part));
    if decoded.is_empty() {
        return Resolution::Missing;
    }

    let archive_path = normalize(base_dir, &decoded);
    let file_name = decoded.rsplit('/').next().unwrap_or(&decoded);

    resources
        .get_by_path(&archive_path)
        .or_else(|| resources.get(&decoded))
        .or_else(|| resources.find_unique_by_file_name(file_name))
        .map(Resolution::Inline)
        .unwrap_or(Resolution::Missing)
}

/// `http:`, `https:`, `file:` and the like
fn has_scheme(reference: &str) -> bool {
    let Some(colon) = reference.find(':') else {
        return false;
    };
    let scheme = &reference[..colon];
    scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Resolve `reference` relative to `base_dir`, collapsing `.` and `..`
fn normalize(base_dir: &str, reference: &str) -> String {
    let mut segments: Vec<&str> = if reference.starts_with('/') {
        Vec::new()
    } else {
        base_dir.split('/').filter(|s| !s.is_empty()).collect()
    };

    for segment in reference.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// Decode character references in one pass, so `&amp;lt;` stays `&lt;`
fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    ENTITY_RE
        .replace_all(s, |entity: &Captures| {
            let body = &entity[1];
            let decoded = match body.strip_prefix('#') {
                Some(number) => {
                    let code = match number.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => number.parse::<u32>().ok(),
                    };
                    code.and_then(char::from_u32)
                }
                None => match body {
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "amp" => Some('&'),
                    _ => None,
                },
            };
            decoded.map_or_else(|| entity[0].to_string(), String::from)
        })
        .into_owned()
}

fn percent_decode(s: &str) -> String {
    if !s.contains('%') {
        return s.to_string();
    }

    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(value) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(value);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
