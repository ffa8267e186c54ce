//! EPUB format handler.

use crate::error::Result;
use crate::formats::text;
use crate::formats::{ExtractedMetadata, FormatHandler};
use roxmltree::{Document, Node, ParsingOptions};
use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// Handler for EPUB files.
pub struct EpubHandler;

impl EpubHandler {
    /// Find the package document, trusting container.xml first and then any
    /// `.opf` entry in the archive.
    fn find_opf_path<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Option<String> {
        if let Some(path) = Self::opf_path_from_container(archive)
            && archive.index_for_name(&path).is_some()
        {
            return Some(path);
        }

        archive
            .file_names()
            .find(|name| name.to_lowercase().ends_with(".opf"))
            .map(String::from)
    }

    fn opf_path_from_container<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Option<String> {
        let content = read_entry_string(archive, "META-INF/container.xml").ok()?;
        let doc = parse_xml(&content).ok()?;

        doc.descendants()
            .find(|n| n.has_tag_name("rootfile"))
            .and_then(|n| n.attribute("full-path"))
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
    }

    /// Read Dublin Core and Calibre fields from the package document.
    fn parse_metadata(doc: &Document<'_>, meta: &mut ExtractedMetadata) {
        let metadata = doc
            .descendants()
            .find(|n| n.is_element() && n.tag_name().name() == "metadata")
            .unwrap_or_else(|| doc.root_element());

        let mut authors = Vec::new();
        let mut tags = Vec::new();
        let mut collection_id: Option<String> = None;

        for node in metadata.descendants().filter(|n| n.is_element()) {
            match node.tag_name().name() {
                "title" => {
                    if meta.title.is_none() {
                        meta.title = non_empty(&node_text(node));
                    }
                }
                "creator" => {
                    if let Some(author) = non_empty(&node_text(node)) {
                        authors.push(author);
                    }
                }
                "date" => {
                    if meta.publication_year.is_none() {
                        meta.publication_year = text::extract_year(&node_text(node));
                    }
                }
                "description" => {
                    if meta.summary.is_none() {
                        meta.summary = text::clean_description(&node_text(node));
                    }
                }
                "subject" => {
                    if let Some(tag) = text::sanitize_tag(&node_text(node)) {
                        tags.push(tag);
                    }
                }
                "meta" => {
                    // Calibre series metadata
                    match node.attribute("name") {
                        Some("calibre:series") => {
                            meta.series = node.attribute("content").and_then(non_empty);
                        }
                        Some("calibre:series_index") => {
                            meta.series_number =
                                node.attribute("content").and_then(normalize_series_index);
                        }
                        _ => {}
                    }

                    // EPUB 3 collections
                    match node.attribute("property") {
                        Some("belongs-to-collection") if meta.series.is_none() => {
                            meta.series = non_empty(&node_text(node));
                            collection_id = node.attribute("id").map(|id| format!("#{}", id));
                        }
                        Some("group-position")
                            if meta.series_number.is_none()
                                && collection_id.is_some()
                                && node.attribute("refines") == collection_id.as_deref() =>
                        {
                            meta.series_number = normalize_series_index(&node_text(node));
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        if meta.series.is_none() {
            meta.series_number = None;
        }
        if !authors.is_empty() {
            meta.authors = Some(authors);
        }
        if !tags.is_empty() {
            meta.tags = Some(tags);
        }
    }

    /// Hrefs of every HTML/XHTML manifest item, URL-decoded.
    fn content_hrefs(doc: &Document<'_>) -> Vec<String> {
        doc.descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "item")
            .filter(|n| {
                n.attribute("media-type")
                    .map(|t| t.contains("html"))
                    .unwrap_or(false)
            })
            .filter_map(|n| n.attribute("href"))
            .map(|href| {
                urlencoding::decode(href)
                    .map(|d| d.into_owned())
                    .unwrap_or_else(|_| href.to_string())
            })
            .collect()
    }

    /// Sum the words of every content document that can be located.
    fn count_words<R: Read + Seek>(
        archive: &mut ZipArchive<R>,
        opf_dir: &str,
        hrefs: &[String],
    ) -> Option<u64> {
        let names: HashSet<String> = archive.file_names().map(String::from).collect();
        let mut total = 0u64;

        for href in hrefs {
            let Some(entry) = resolve_href(opf_dir, href, &names) else {
                tracing::debug!(href = %href, "Manifest item not found in archive");
                continue;
            };

            match read_entry_bytes(archive, &entry) {
                Ok(bytes) => {
                    let content = String::from_utf8_lossy(&bytes).replace('\u{FFFD}', "");
                    total += text::count_words(&text::strip_html(&content));
                }
                Err(e) => {
                    tracing::debug!(entry = %entry, error = %e, "Failed to read content document");
                }
            }
        }

        (total > 0).then_some(total)
    }

    /// Extract metadata from an already opened archive.
    fn extract_from_archive<R: Read + Seek>(archive: &mut ZipArchive<R>) -> ExtractedMetadata {
        let mut meta = ExtractedMetadata::default();

        let Some(opf_path) = Self::find_opf_path(archive) else {
            tracing::debug!("No package document in EPUB");
            return meta;
        };
        let opf_dir = opf_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");

        let opf_content = match read_entry_string(archive, &opf_path) {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!(opf = %opf_path, error = %e, "Failed to read package document");
                return meta;
            }
        };

        let doc = match parse_xml(&opf_content) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::debug!(opf = %opf_path, error = %e, "Failed to parse package document");
                return meta;
            }
        };

        Self::parse_metadata(&doc, &mut meta);
        let hrefs = Self::content_hrefs(&doc);
        meta.word_count = Self::count_words(archive, opf_dir, &hrefs);

        meta
    }
}

impl FormatHandler for EpubHandler {
    fn extract_metadata(&self, path: &Path) -> Result<ExtractedMetadata> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(file)?;

        Ok(Self::extract_from_archive(&mut archive))
    }
}

/// Ordered candidate archive paths for a manifest href.
///
/// Producers disagree on whether hrefs are relative to the package document
/// or to the archive root, so every interpretation is tried in turn.
fn candidate_paths(opf_dir: &str, href: &str) -> Vec<String> {
    let mut candidates = Vec::with_capacity(4);

    if opf_dir.is_empty() {
        candidates.push(href.to_string());
    } else {
        candidates.push(format!("{}/{}", opf_dir.trim_end_matches('/'), href));
    }
    candidates.push(href.to_string());
    if let Some(stripped) = href.strip_prefix('/') {
        candidates.push(stripped.to_string());
    }
    if href.contains("..") {
        candidates.push(normalize_path(opf_dir, href));
    }

    candidates
}

fn resolve_href(opf_dir: &str, href: &str, names: &HashSet<String>) -> Option<String> {
    candidate_paths(opf_dir, href)
        .into_iter()
        .find(|candidate| names.contains(candidate))
}

/// Resolve `.` and `..` segments of `href` against `base`.
fn normalize_path(base: &str, href: &str) -> String {
    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();

    for segment in href.split('/') {
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

fn parse_xml(content: &str) -> std::result::Result<Document<'_>, roxmltree::Error> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(content.trim_start_matches('\u{feff}'), options)
}

fn read_entry_bytes<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Vec<u8>> {
    let mut entry = archive.by_name(name)?;
    let mut data = Vec::new();
    entry.read_to_end(&mut data)?;
    Ok(data)
}

fn read_entry_string<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String> {
    let bytes = read_entry_bytes(archive, name)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// All text below `node`, including nested inline elements.
fn node_text(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// "2.0" becomes "2", "1.50" becomes "1.5"; non-numeric values are dropped.
fn normalize_series_index(raw: &str) -> Option<String> {
    let value: f64 = raw.trim().parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    if value.fract() == 0.0 {
        Some(format!("{}", value as i64))
    } else {
        Some(format!("{}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures::write_zip;

    const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

    const OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE package>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
    <dc:title>The Final Empire</dc:title>
    <dc:creator opf:role="aut">Brandon Sanderson</dc:creator>
    <dc:creator>   </dc:creator>
    <creator>Isaac Stewart</creator>
    <dc:date>2006-07-17T00:00:00+00:00</dc:date>
    <dc:description>&lt;p&gt;For a thousand years the ash fell&amp;nbsp;and&lt;/p&gt;  &lt;p&gt;no flowers bloomed.&lt;/p&gt;</dc:description>
    <dc:subject>Epic Fantasy</dc:subject>
    <dc:subject>Heist!</dc:subject>
    <meta name="calibre:series" content="Mistborn"/>
    <meta name="calibre:series_index" content="1.0"/>
  </metadata>
  <manifest>
    <item id="c1" href="Text/chapter1.xhtml" media-type="application/xhtml+xml"/>
    <item id="c2" href="/OEBPS/Text/chapter%202.xhtml" media-type="application/xhtml+xml"/>
    <item id="c3" href="../Extra/notes.html" media-type="text/html"/>
    <item id="c4" href="OEBPS/Text/rooted.xhtml" media-type="application/xhtml+xml"/>
    <item id="missing" href="Text/gone.xhtml" media-type="application/xhtml+xml"/>
    <item id="css" href="Styles/style.css" media-type="text/css"/>
  </manifest>
</package>"#;

    fn sample_epub(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("book.epub");
        write_zip(
            &path,
            &[
                ("mimetype", "application/epub+zip"),
                ("META-INF/container.xml", CONTAINER),
                ("OEBPS/content.opf", OPF),
                (
                    "OEBPS/Text/chapter1.xhtml",
                    "<html><body><p>one two three</p><p>four</p></body></html>",
                ),
                ("OEBPS/Text/chapter 2.xhtml", "<html><body>five six</body></html>"),
                ("Extra/notes.html", "<p>seven</p>"),
                ("OEBPS/Text/rooted.xhtml", "<p>eight nine ten</p>"),
                ("OEBPS/Styles/style.css", "p { margin: 0 auto; color: red }"),
            ],
        );
        path
    }

    #[test]
    fn extracts_dublin_core_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let meta = EpubHandler
            .extract_metadata(&sample_epub(tmp.path()))
            .unwrap();

        assert_eq!(meta.title.as_deref(), Some("The Final Empire"));
        assert_eq!(
            meta.authors,
            Some(vec![
                "Brandon Sanderson".to_string(),
                "Isaac Stewart".to_string()
            ])
        );
        assert_eq!(meta.publication_year, Some(2006));
        assert_eq!(
            meta.summary.as_deref(),
            Some("For a thousand years the ash fell and no flowers bloomed.")
        );
        assert_eq!(
            meta.tags,
            Some(vec!["epic-fantasy".to_string(), "heist".to_string()])
        );
        assert_eq!(meta.series.as_deref(), Some("Mistborn"));
        assert_eq!(meta.series_number.as_deref(), Some("1"));
    }

    #[test]
    fn word_count_resolves_every_href_style() {
        let tmp = tempfile::tempdir().unwrap();
        let path = sample_epub(tmp.path());

        let first = EpubHandler.extract_metadata(&path).unwrap();
        let second = EpubHandler.extract_metadata(&path).unwrap();

        // 4 (relative) + 2 (absolute, url-encoded) + 1 (parent dir) + 3 (archive-rooted)
        assert_eq!(first.word_count, Some(10));
        assert_eq!(first.word_count, second.word_count);
    }

    #[test]
    fn falls_back_to_scanning_for_opf() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nocontainer.epub");
        write_zip(
            &path,
            &[
                ("book/package.OPF", r#"<package><metadata><title>Bare Tags</title><creator>Ann Author</creator></metadata>
                    <manifest><item href="ch.html" media-type="text/html"/></manifest></package>"#),
                ("book/ch.html", "<p>alpha beta</p>"),
            ],
        );

        let meta = EpubHandler.extract_metadata(&path).unwrap();
        assert_eq!(meta.title.as_deref(), Some("Bare Tags"));
        assert_eq!(meta.authors, Some(vec!["Ann Author".to_string()]));
        assert_eq!(meta.word_count, Some(2));
        assert_eq!(meta.series, None);
    }

    #[test]
    fn container_pointing_nowhere_falls_back() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("stale.epub");
        write_zip(
            &path,
            &[
                ("META-INF/container.xml", CONTAINER),
                ("content.opf", "<package><metadata><title>Found</title></metadata></package>"),
            ],
        );

        let meta = EpubHandler.extract_metadata(&path).unwrap();
        assert_eq!(meta.title.as_deref(), Some("Found"));
    }

    #[test]
    fn package_with_byte_order_mark_parses() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bom.epub");
        let opf = format!("\u{feff}{}", OPF);
        write_zip(
            &path,
            &[
                ("META-INF/container.xml", CONTAINER),
                ("OEBPS/content.opf", &opf),
            ],
        );

        let meta = EpubHandler.extract_metadata(&path).unwrap();
        assert_eq!(meta.title.as_deref(), Some("The Final Empire"));
        assert_eq!(meta.series.as_deref(), Some("Mistborn"));
    }

    #[test]
    fn malformed_package_yields_empty_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.epub");
        write_zip(
            &path,
            &[
                ("META-INF/container.xml", CONTAINER),
                ("OEBPS/content.opf", "<package><metadata><title>Unclosed"),
            ],
        );

        let meta = EpubHandler.extract_metadata(&path).unwrap();
        assert_eq!(meta, ExtractedMetadata::default());
    }

    #[test]
    fn epub3_collection_is_a_series() {
        let opf = r##"<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>The Well of Ascension</dc:title>
    <meta property="belongs-to-collection" id="c01">Mistborn</meta>
    <meta refines="#c01" property="collection-type">series</meta>
    <meta refines="#c01" property="group-position">2</meta>
  </metadata>
</package>"##;
        let doc = parse_xml(opf).unwrap();
        let mut meta = ExtractedMetadata::default();
        EpubHandler::parse_metadata(&doc, &mut meta);

        assert_eq!(meta.series.as_deref(), Some("Mistborn"));
        assert_eq!(meta.series_number.as_deref(), Some("2"));
    }

    #[test]
    fn candidates_are_ordered() {
        assert_eq!(
            candidate_paths("OEBPS", "/Text/a.xhtml"),
            vec!["OEBPS//Text/a.xhtml", "/Text/a.xhtml", "Text/a.xhtml"]
        );
        assert_eq!(
            candidate_paths("OEBPS/content", "../Text/a.xhtml"),
            vec![
                "OEBPS/content/../Text/a.xhtml",
                "../Text/a.xhtml",
                "OEBPS/Text/a.xhtml"
            ]
        );
        assert_eq!(candidate_paths("", "a.xhtml"), vec!["a.xhtml", "a.xhtml"]);
    }

    #[test]
    fn normalize_handles_dots() {
        assert_eq!(normalize_path("a/b", "../c/./d.html"), "a/c/d.html");
        assert_eq!(normalize_path("", "../../x.html"), "x.html");
    }

    #[test]
    fn series_index_normalization() {
        assert_eq!(normalize_series_index("2.0").as_deref(), Some("2"));
        assert_eq!(normalize_series_index(" 1.50 ").as_deref(), Some("1.5"));
        assert_eq!(normalize_series_index("three"), None);
    }
}
