//! EPUB book writer.
//!
//! Serializes a [`Book`] into an EPUB 3 container (with an EPUB 2 NCX for
//! older readers). The archive is built in a hidden temporary file next to
//! the target and renamed over it only once it is complete, so a failed
//! write never leaves a truncated book behind.

mod templates;

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use wallabook_shared::{Book, Result, WallabookError};

use templates::PackageMeta;

/// Persists an assembled book.
pub trait BookWriter: Send + Sync {
    /// Write `book` to `path`.
    fn write(&self, book: &Book, path: &Path) -> Result<()>;
}

/// Writes books as `.epub` files.
#[derive(Debug, Clone)]
pub struct EpubWriter {
    /// BCP 47 language tag recorded in the package.
    pub language: String,
}

impl Default for EpubWriter {
    fn default() -> Self {
        Self {
            language: "en".into(),
        }
    }
}

impl BookWriter for EpubWriter {
    #[instrument(skip_all, fields(path = %path.display(), sections = book.len()))]
    fn write(&self, book: &Book, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                WallabookError::write(path, format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let temp = temp_path(path)?;
        let meta = PackageMeta {
            identifier: format!("urn:uuid:{}", uuid::Uuid::now_v7()),
            modified: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            language: self.language.clone(),
        };

        if let Err(e) = write_container(book, &meta, &temp) {
            if let Err(cleanup) = std::fs::remove_file(&temp) {
                debug!(temp = %temp.display(), error = %cleanup, "no temp file to clean up");
            }
            return Err(WallabookError::write(path, e));
        }

        // Atomic rename
        if let Err(e) = std::fs::rename(&temp, path) {
            if let Err(cleanup) = std::fs::remove_file(&temp) {
                warn!(temp = %temp.display(), error = %cleanup, "failed to remove temp file");
            }
            return Err(WallabookError::write(path, format!("rename failed: {e}")));
        }

        info!(path = %path.display(), sections = book.len(), "wrote EPUB");
        Ok(())
    }
}

/// `dir/.name.tmp` for target `dir/name`.
fn temp_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| WallabookError::write(path, "target has no file name"))?;
    let mut temp_name = std::ffi::OsString::from(".");
    temp_name.push(name);
    temp_name.push(".tmp");
    Ok(path.with_file_name(temp_name))
}

/// Build the whole archive at `target`. Errors are flattened to strings;
/// the caller attaches the user-facing path.
fn write_container(book: &Book, meta: &PackageMeta, target: &Path) -> std::result::Result<(), String> {
    let file = File::create(target).map_err(|e| format!("cannot create {}: {e}", target.display()))?;
    let mut zip = ZipWriter::new(file);

    // The mimetype entry must come first and be stored uncompressed.
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    add_entry(&mut zip, "mimetype", templates::MIMETYPE, stored)?;
    add_entry(&mut zip, "META-INF/container.xml", templates::CONTAINER_XML, deflated)?;
    add_entry(&mut zip, "EPUB/package.opf", &templates::package_opf(book, meta), deflated)?;
    add_entry(&mut zip, "EPUB/nav.xhtml", &templates::nav_xhtml(book, &meta.language), deflated)?;
    add_entry(&mut zip, "EPUB/toc.ncx", &templates::toc_ncx(book, meta), deflated)?;

    for (index, section) in book.sections.iter().enumerate() {
        let name = format!("EPUB/{}", templates::section_href(index));
        add_entry(&mut zip, &name, &templates::section_xhtml(section, &meta.language), deflated)?;
        debug!(index, heading = %section.heading, "added section");
    }

    let file = zip.finish().map_err(|e| format!("cannot finish archive: {e}"))?;
    file.sync_all().map_err(|e| format!("cannot flush archive: {e}"))?;
    Ok(())
}

fn add_entry(
    zip: &mut ZipWriter<File>,
    name: &str,
    content: &str,
    options: SimpleFileOptions,
) -> std::result::Result<(), String> {
    zip.start_file(name, options)
        .map_err(|e| format!("cannot add {name}: {e}"))?;
    zip.write_all(content.as_bytes())
        .map_err(|e| format!("cannot write {name}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use wallabook_shared::Section;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("wb-epub-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn make_book() -> Book {
        let mut book = Book::new("Wallabooks", "Wallabook");
        for title in ["Long read", "Long read", "Another"] {
            book.sections.push(Section {
                heading: title.into(),
                body: format!("<h1>{title}</h1>\n<p>{}</p>", "x".repeat(600)),
            });
        }
        book
    }

    fn read_entry(path: &Path, name: &str) -> String {
        let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn writes_valid_container_layout() {
        let tmp = temp_dir();
        let target = tmp.join("result.epub");

        EpubWriter::default().write(&make_book(), &target).unwrap();

        let mut archive = zip::ZipArchive::new(File::open(&target).unwrap()).unwrap();
        {
            let first = archive.by_index(0).unwrap();
            assert_eq!(first.name(), "mimetype");
            assert_eq!(first.compression(), CompressionMethod::Stored);
        }
        assert_eq!(read_entry(&target, "mimetype"), "application/epub+zip");
        assert!(read_entry(&target, "META-INF/container.xml").contains("EPUB/package.opf"));

        // Duplicate titles stay distinct chapters.
        assert!(archive.by_name("EPUB/xhtml/section0003.xhtml").is_ok());
        assert!(archive.by_name("EPUB/xhtml/section0004.xhtml").is_err());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn section_files_carry_rendered_body() {
        let tmp = temp_dir();
        let target = tmp.join("result.epub");

        EpubWriter::default().write(&make_book(), &target).unwrap();

        let chapter = read_entry(&target, "EPUB/xhtml/section0003.xhtml");
        assert!(chapter.contains("<h1>Another</h1>"));
        let nav = read_entry(&target, "EPUB/nav.xhtml");
        assert!(nav.find("Long read").unwrap() < nav.find("Another").unwrap());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn writes_empty_book() {
        let tmp = temp_dir();
        let target = tmp.join("empty.epub");

        EpubWriter::default()
            .write(&Book::new("Wallabooks", "Wallabook"), &target)
            .unwrap();

        assert!(target.exists());
        assert!(read_entry(&target, "EPUB/package.opf").contains(r#"<itemref idref="nav"/>"#));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn creates_missing_parent_directories() {
        let tmp = temp_dir();
        let target = tmp.join("Wallabook").join("result.epub");

        EpubWriter::default().write(&make_book(), &target).unwrap();
        assert!(target.exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn overwrites_previous_book() {
        let tmp = temp_dir();
        let target = tmp.join("result.epub");
        std::fs::write(&target, "stale").unwrap();

        EpubWriter::default().write(&make_book(), &target).unwrap();
        assert_eq!(read_entry(&target, "mimetype"), "application/epub+zip");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn failed_write_leaves_no_temp_file() {
        let tmp = temp_dir();
        // A directory in the way makes the final rename fail.
        let target = tmp.join("result.epub");
        std::fs::create_dir_all(target.join("occupied")).unwrap();

        let err = EpubWriter::default().write(&make_book(), &target).unwrap_err();
        assert!(matches!(err, WallabookError::Write { .. }));

        for entry in std::fs::read_dir(&tmp).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().to_string();
            assert!(!name.ends_with(".tmp"), "temp file left behind: {name}");
        }

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn temp_path_is_hidden_sibling() {
        let temp = temp_path(Path::new("/mnt/ext1/Wallabook/result.epub")).unwrap();
        assert_eq!(temp, PathBuf::from("/mnt/ext1/Wallabook/.result.epub.tmp"));
        assert!(temp_path(Path::new("/")).is_err());
    }
}
