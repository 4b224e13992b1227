//! XML documents that make up an EPUB container.
//!
//! Metadata text is XML-escaped. Section bodies are passed through as-is:
//! the store already hands out XHTML fragments.

use std::fmt::Write as _;

use quick_xml::escape::escape;

use wallabook_shared::{Book, Section};

pub(crate) const MIMETYPE: &str = "application/epub+zip";

pub(crate) const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="EPUB/package.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

/// Per-write package metadata that is not part of the book itself.
#[derive(Debug, Clone)]
pub(crate) struct PackageMeta {
    /// `urn:uuid:...` identifier.
    pub identifier: String,
    /// `dcterms:modified`, `CCYY-MM-DDThh:mm:ssZ`.
    pub modified: String,
    pub language: String,
}

/// Path of the n-th section (0-based) relative to `EPUB/`.
pub(crate) fn section_href(index: usize) -> String {
    format!("xhtml/section{:04}.xhtml", index + 1)
}

fn section_id(index: usize) -> String {
    format!("section{:04}", index + 1)
}

pub(crate) fn section_xhtml(section: &Section, language: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" xml:lang="{lang}" lang="{lang}">
  <head>
    <meta charset="utf-8"/>
    <title>{title}</title>
  </head>
  <body>
{body}
  </body>
</html>
"#,
        lang = escape(language),
        title = escape(section.heading.as_str()),
        body = section.body,
    )
}

pub(crate) fn package_opf(book: &Book, meta: &PackageMeta) -> String {
    let mut manifest = String::new();
    let mut spine = String::new();

    for index in 0..book.sections.len() {
        let _ = writeln!(
            manifest,
            r#"    <item id="{}" href="{}" media-type="application/xhtml+xml"/>"#,
            section_id(index),
            section_href(index),
        );
        let _ = writeln!(spine, r#"    <itemref idref="{}"/>"#, section_id(index));
    }

    // A spine needs at least one item; an empty book shows its contents page.
    if book.sections.is_empty() {
        spine.push_str("    <itemref idref=\"nav\"/>\n");
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package version="3.0" unique-identifier="pub-id" xmlns="http://www.idpf.org/2007/opf">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="pub-id">{identifier}</dc:identifier>
    <dc:title>{title}</dc:title>
    <dc:creator>{author}</dc:creator>
    <dc:language>{lang}</dc:language>
    <meta property="dcterms:modified">{modified}</meta>
  </metadata>
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
{manifest}  </manifest>
  <spine toc="ncx">
{spine}  </spine>
</package>
"#,
        identifier = escape(meta.identifier.as_str()),
        title = escape(book.title.as_str()),
        author = escape(book.author.as_str()),
        lang = escape(meta.language.as_str()),
        modified = meta.modified,
    )
}

/// EPUB 3 navigation document.
pub(crate) fn nav_xhtml(book: &Book, language: &str) -> String {
    let mut items = String::new();
    for (index, section) in book.sections.iter().enumerate() {
        let _ = writeln!(
            items,
            r#"        <li><a href="{}">{}</a></li>"#,
            section_href(index),
            escape(section.heading.as_str()),
        );
    }
    if book.sections.is_empty() {
        let _ = writeln!(
            items,
            r#"        <li><a href="nav.xhtml">{}</a></li>"#,
            escape(book.title.as_str())
        );
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" xml:lang="{lang}" lang="{lang}">
  <head>
    <meta charset="utf-8"/>
    <title>{title}</title>
  </head>
  <body>
    <nav epub:type="toc" id="toc">
      <h1>{title}</h1>
      <ol>
{items}      </ol>
    </nav>
  </body>
</html>
"#,
        lang = escape(language),
        title = escape(book.title.as_str()),
    )
}

/// EPUB 2 NCX, still read by older e-reader firmware.
pub(crate) fn toc_ncx(book: &Book, meta: &PackageMeta) -> String {
    let mut points = String::new();
    let mut push_point = |order: usize, label: &str, src: &str| {
        let _ = write!(
            points,
            r#"    <navPoint id="navPoint-{order}" playOrder="{order}">
      <navLabel><text>{label}</text></navLabel>
      <content src="{src}"/>
    </navPoint>
"#,
            label = escape(label),
        );
    };

    for (index, section) in book.sections.iter().enumerate() {
        push_point(index + 1, &section.heading, &section_href(index));
    }
    if book.sections.is_empty() {
        push_point(1, &book.title, "nav.xhtml");
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="{identifier}"/>
  </head>
  <docTitle><text>{title}</text></docTitle>
  <navMap>
{points}  </navMap>
</ncx>
"#,
        identifier = escape(meta.identifier.as_str()),
        title = escape(book.title.as_str()),
    )
}
