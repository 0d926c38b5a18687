//! Embedded binary assets (images, fonts, etc.) collected from the manifest

use base64::{engine::general_purpose::STANDARD, Engine};
use std::collections::{BTreeMap, HashMap};

/// A single manifest resource with its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedResource {
    /// Manifest identifier, unique within one book
    pub id: String,

    /// Path inside the archive, `/`-separated
    pub href: String,

    /// MIME type (e.g., "image/png")
    pub mime_type: String,

    /// Raw bytes
    pub data: Vec<u8>,
}

impl EmbeddedResource {
    pub fn new(
        id: impl Into<String>,
        href: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            id: id.into(),
            href: href.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Self-contained `data:` URI carrying the payload
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }

    /// Last path segment of the archive path
    pub fn file_name(&self) -> &str {
        self.href.rsplit('/').next().unwrap_or(&self.href)
    }
}

/// Resources of one book keyed by manifest identifier.
/// Iteration is ordered by identifier.
#[derive(Debug, Clone, Default)]
pub struct ResourceMap {
    resources: BTreeMap<String, EmbeddedResource>,
    by_path: HashMap<String, String>,
}

impl ResourceMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resource. A duplicate identifier replaces the earlier entry
    /// (last wins) and the replaced resource is returned.
    pub fn insert(&mut self, resource: EmbeddedResource) -> Option<EmbeddedResource> {
        let previous = self.resources.remove(&resource.id);
        if let Some(prev) = &previous {
            if self.by_path.get(&prev.href) == Some(&prev.id) {
                self.by_path.remove(&prev.href);
            }
        }

        self.by_path.insert(resource.href.clone(), resource.id.clone());
        self.resources.insert(resource.id.clone(), resource);
        previous
    }

    /// Get a resource by manifest identifier
    pub fn get(&self, id: &str) -> Option<&EmbeddedResource> {
        self.resources.get(id)
    }

    /// Get a resource by its archive path
    pub fn get_by_path(&self, href: &str) -> Option<&EmbeddedResource> {
        self.by_path.get(href).and_then(|id| self.resources.get(id))
    }

    /// Get the only resource whose file name matches, if exactly one does
    pub fn find_unique_by_file_name(&self, name: &str) -> Option<&EmbeddedResource> {
        let mut matches = self.resources.values().filter(|r| r.file_name() == name);
        match (matches.next(), matches.next()) {
            (Some(found), None) => Some(found),
            _ => None,
        }
    }

    /// Iterate over all resources
    pub fn iter(&self) -> impl Iterator<Item = &EmbeddedResource> {
        self.resources.values()
    }

    /// Number of resources in the map
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check if the map is empty
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Sum of all payload sizes
    pub fn total_bytes(&self) -> usize {
        self.resources.values().map(|r| r.data.len()).sum()
    }
}
