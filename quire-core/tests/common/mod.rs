//! In-memory EPUB fixtures shared by the integration and CLI tests

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::Path;
use std::time::{Duration, SystemTime};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// 1x1 transparent PNG
pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

struct FixtureChapter {
    id: String,
    href: String,
    body: String,
}

struct FixtureResource {
    id: String,
    href: String,
    mime: String,
    data: Vec<u8>,
}

/// Builder for a small EPUB 3 container
#[derive(Default)]
pub struct EpubFixture {
    title: Option<String>,
    author: Option<String>,
    language: Option<String>,
    chapters: Vec<FixtureChapter>,
    resources: Vec<FixtureResource>,
    dangling_spine: Vec<String>,
    omitted_files: Vec<String>,
    reversed: bool,
}

impl EpubFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    pub fn language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }

    /// Add a chapter at `OEBPS/text/{id}.xhtml`; spine order follows call order
    pub fn chapter(mut self, id: &str, body: &str) -> Self {
        self.chapters.push(FixtureChapter {
            id: id.to_string(),
            href: format!("text/{}.xhtml", id),
            body: body.to_string(),
        });
        self
    }

    /// Add a manifest resource; `href` is relative to `OEBPS/`
    pub fn resource(mut self, id: &str, href: &str, mime: &str, data: &[u8]) -> Self {
        self.resources.push(FixtureResource {
            id: id.to_string(),
            href: href.to_string(),
            mime: mime.to_string(),
            data: data.to_vec(),
        });
        self
    }

    /// Add a PNG at `OEBPS/images/{name}`
    pub fn image(self, id: &str, name: &str) -> Self {
        self.resource(id, &format!("images/{}", name), "image/png", PNG_BYTES)
    }

    /// Spine entry whose idref is not in the manifest
    pub fn dangling_spine_entry(mut self, idref: &str) -> Self {
        self.dangling_spine.push(idref.to_string());
        self
    }

    /// Declare the item in the manifest but leave its file out of the archive
    pub fn omit_file(mut self, id: &str) -> Self {
        self.omitted_files.push(id.to_string());
        self
    }

    /// Write content files into the archive in reverse order
    pub fn reversed_archive_order(mut self) -> Self {
        self.reversed = true;
        self
    }

    fn package_document(&self) -> String {
        let mut metadata = String::new();
        if let Some(title) = &self.title {
            metadata.push_str(&format!("    <dc:title>{}</dc:title>\n", title));
        }
        if let Some(author) = &self.author {
            metadata.push_str(&format!("    <dc:creator>{}</dc:creator>\n", author));
        }
        if let Some(language) = &self.language {
            metadata.push_str(&format!("    <dc:language>{}</dc:language>\n", language));
        }

        let mut manifest = String::new();
        for chapter in &self.chapters {
            manifest.push_str(&format!(
                "    <item id=\"{}\" href=\"{}\" media-type=\"application/xhtml+xml\"/>\n",
                chapter.id, chapter.href
            ));
        }
        for resource in &self.resources {
            manifest.push_str(&format!(
                "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"/>\n",
                resource.id, resource.href, resource.mime
            ));
        }

        let mut spine = String::new();
        for chapter in &self.chapters {
            spine.push_str(&format!("    <itemref idref=\"{}\"/>\n", chapter.id));
        }
        for idref in &self.dangling_spine {
            spine.push_str(&format!("    <itemref idref=\"{}\"/>\n", idref));
        }

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">urn:uuid:00000000-0000-4000-8000-000000000000</dc:identifier>
{}  </metadata>
  <manifest>
{}  </manifest>
  <spine>
{}  </spine>
</package>
"#,
            metadata, manifest, spine
        )
    }

    /// Serialize the container
    pub fn build(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default();

        zip.start_file("mimetype", stored).unwrap();
        zip.write_all(b"application/epub+zip").unwrap();
        zip.start_file("META-INF/container.xml", deflated).unwrap();
        zip.write_all(CONTAINER_XML.as_bytes()).unwrap();
        zip.start_file("OEBPS/content.opf", deflated).unwrap();
        zip.write_all(self.package_document().as_bytes()).unwrap();

        let mut files: Vec<(&str, String, Vec<u8>)> = Vec::new();
        for chapter in &self.chapters {
            files.push((
                chapter.id.as_str(),
                format!("OEBPS/{}", chapter.href),
                xhtml(&chapter.id, &chapter.body).into_bytes(),
            ));
        }
        for resource in &self.resources {
            files.push((
                resource.id.as_str(),
                format!("OEBPS/{}", resource.href),
                resource.data.clone(),
            ));
        }
        if self.reversed {
            files.reverse();
        }

        for (id, name, data) in files {
            if self.omitted_files.iter().any(|o| o == id) {
                continue;
            }
            zip.start_file(name, deflated).unwrap();
            zip.write_all(&data).unwrap();
        }

        zip.finish().unwrap().into_inner()
    }

    /// Write the container to `path`, creating parent directories, with an
    /// mtime an hour in the past so fresh outputs compare as newer
    pub fn write_to(&self, path: &Path) {
        write_aged(path, &self.build());
    }
}

/// Minimal XHTML content document
pub fn xhtml(title: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>{}</title><link rel="stylesheet" type="text/css" href="../style.css"/></head>
<body>
{}
</body>
</html>
"#,
        title, body
    )
}

/// Write bytes that are not a ZIP archive
pub fn write_corrupt(path: &Path) {
    write_aged(path, b"PK\x03\x04 this is not really an epub");
}

/// The `source_book/a.epub` of the end-to-end scenarios
pub fn sample_book() -> EpubFixture {
    EpubFixture::new()
        .title("T")
        .author("Someone")
        .language("en")
        .chapter("c1", r#"<h1>One</h1><p>Text</p><img src="../images/a.png" alt="a"/>"#)
        .image("img1", "a.png")
}

/// Move a file's modification time `offset` into the future
pub fn touch_forward(path: &Path, offset: Duration) {
    let mtime = filetime::FileTime::from_system_time(SystemTime::now() + offset);
    filetime::set_file_mtime(path, mtime).unwrap();
}

fn write_aged(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, bytes).unwrap();
    let past = filetime::FileTime::from_system_time(SystemTime::now() - Duration::from_secs(3600));
    filetime::set_file_mtime(path, past).unwrap();
}
