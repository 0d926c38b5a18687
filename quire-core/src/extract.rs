//! EPUB resource extractor
//!
//! Reads an EPUB 2/3 container and returns its declared metadata, the content
//! documents in spine order, and the non-document manifest items keyed by
//! manifest identifier.

use crate::config::ExtractOptions;
use crate::error::{ContainerParseError, ConvertError, FilesystemError};
use crate::types::{BookMetadata, Chapter, EmbeddedResource, ResourceMap};
use epub::doc::EpubDoc;
use serde::Serialize;
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

type Epub = EpubDoc<Cursor<Vec<u8>>>;

/// Everything pulled out of one container
#[derive(Debug, Clone)]
pub struct Extraction {
    pub metadata: BookMetadata,

    /// Content documents in reading order
    pub chapters: Vec<Chapter>,

    /// Non-document manifest items
    pub resources: ResourceMap,

    /// Spine entries that could not be resolved to content
    pub skipped: Vec<SkippedEntry>,
}

/// A spine entry left out of the reading order
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Index of the entry in the spine
    pub position: usize,

    /// The entry's `idref`
    pub idref: String,

    pub reason: SkipReason,
}

/// Why a spine entry was skipped
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The idref names no manifest item
    NotInManifest,

    /// The manifest item's file is absent from the archive
    MissingContent,
}

/// Extractor for EPUB 2/3 containers
pub struct EpubExtractor {
    options: ExtractOptions,
}

impl EpubExtractor {
    pub fn new() -> Self {
        Self {
            options: ExtractOptions::default(),
        }
    }

    /// Set the resource limits
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Read and extract the container at `path`
    pub fn extract(&self, path: &Path) -> Result<Extraction, ConvertError> {
        let data = std::fs::read(path).map_err(|source| FilesystemError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.extract_bytes(data)?)
    }

    /// Extract a container already held in memory
    pub fn extract_bytes(&self, data: Vec<u8>) -> Result<Extraction, ContainerParseError> {
        let mut epub = EpubDoc::from_reader(Cursor::new(data))
            .map_err(|e| ContainerParseError::InvalidEpub(e.to_string()))?;

        let metadata = Self::extract_metadata(&epub);

        let spine: Vec<String> = epub.spine.iter().map(|item| item.idref.clone()).collect();
        if spine.is_empty() {
            return Err(ContainerParseError::EmptyReadingOrder);
        }

        let (chapters, skipped) = Self::extract_chapters(&mut epub, &spine);
        if chapters.is_empty() {
            return Err(ContainerParseError::NoReadableChapters(spine.len()));
        }

        let spine_ids: HashSet<&str> = spine.iter().map(String::as_str).collect();
        let resources = self.extract_resources(&mut epub, &spine_ids);

        tracing::debug!(
            "Extracted '{}': {} chapters, {} resources ({} bytes), {} skipped entries",
            metadata.title.as_deref().unwrap_or("<untitled>"),
            chapters.len(),
            resources.len(),
            resources.total_bytes(),
            skipped.len()
        );

        Ok(Extraction {
            metadata,
            chapters,
            resources,
            skipped,
        })
    }

    /// Extract metadata from EPUB
    fn extract_metadata(epub: &Epub) -> BookMetadata {
        let get_meta = |key: &str| -> Option<String> { epub.mdata(key).map(|item| item.value.clone()) };

        BookMetadata {
            title: get_meta("title"),
            author: get_meta("creator"),
            language: get_meta("language"),
        }
    }

    /// Walk the spine in declared order, keeping entries that resolve to content
    fn extract_chapters(epub: &mut Epub, spine: &[String]) -> (Vec<Chapter>, Vec<SkippedEntry>) {
        let mut chapters = Vec::with_capacity(spine.len());
        let mut skipped = Vec::new();

        for (position, idref) in spine.iter().enumerate() {
            let Some(href) = epub.resources.get(idref).map(|item| archive_path(&item.path)) else {
                tracing::warn!("Skipping spine entry {} ({}): not in manifest", position, idref);
                skipped.push(SkippedEntry {
                    position,
                    idref: idref.clone(),
                    reason: SkipReason::NotInManifest,
                });
                continue;
            };

            let Some((bytes, _mime)) = epub.get_resource(idref) else {
                tracing::warn!("Skipping spine entry {} ({}): {} missing from archive", position, idref, href);
                skipped.push(SkippedEntry {
                    position,
                    idref: idref.clone(),
                    reason: SkipReason::MissingContent,
                });
                continue;
            };

            chapters.push(Chapter::new(position, idref.clone(), href, decode_text(&bytes)));
        }

        (chapters, skipped)
    }

    /// Collect manifest items that are not documents, stylesheets or scripts
    fn extract_resources(&self, epub: &mut Epub, spine_ids: &HashSet<&str>) -> ResourceMap {
        let mut map = ResourceMap::new();

        let mut entries: Vec<(String, String, String)> = epub
            .resources
            .iter()
            .filter(|(id, item)| !spine_ids.contains(id.as_str()) && !is_markup(&item.mime))
            .map(|(id, item)| (id.clone(), archive_path(&item.path), item.mime.clone()))
            .collect();
        entries.sort();

        for (id, href, declared_mime) in entries {
            if map.len() >= self.options.max_resources {
                tracing::warn!(
                    "Resource limit ({}) reached, ignoring remaining resources",
                    self.options.max_resources
                );
                break;
            }

            let Some((data, _)) = epub.get_resource(&id) else {
                tracing::warn!("Resource {} ({}) missing from archive", id, href);
                continue;
            };

            if data.len() as u64 > self.options.max_resource_bytes {
                tracing::warn!(
                    "Resource {} is too large ({} bytes, limit {}), skipping",
                    href,
                    data.len(),
                    self.options.max_resource_bytes
                );
                continue;
            }

            let mime = effective_mime(&declared_mime, &href);
            if let Some(previous) = map.insert(EmbeddedResource::new(id, href, mime, data)) {
                tracing::debug!("Duplicate resource id {}, keeping the last one", previous.id);
            }
        }

        map
    }
}

impl Default for EpubExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract `path` with the given limits
pub fn extract(path: &Path, options: &ExtractOptions) -> Result<Extraction, ConvertError> {
    EpubExtractor::new().with_options(options.clone()).extract(path)
}

/// Archive paths always use `/`
fn archive_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Lossy UTF-8 decoding without a leading byte-order mark
fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Content documents, navigation files, stylesheets and scripts are not resources
fn is_markup(mime: &str) -> bool {
    let mime = mime.to_ascii_lowercase();
    mime.contains("html")
        || mime == "application/x-dtbncx+xml"
        || mime == "text/css"
        || mime.contains("javascript")
        || mime.contains("ecmascript")
}

/// Manifest type, or a guess from the extension when the manifest is unhelpful
fn effective_mime(declared: &str, href: &str) -> String {
    let declared = declared.trim();
    if declared.is_empty() || declared.eq_ignore_ascii_case("application/octet-stream") {
        guess_image_mime(href).to_string()
    } else {
        declared.to_string()
    }
}

fn guess_image_mime(href: &str) -> &'static str {
    let ext = href.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}
