//! Document loading.
//!
//! Every supported format is reduced to one `String` of text; the rest of the
//! reader treats all sources alike. Extraction picks a strategy from the file
//! extension and falls back to reading the bytes as text.

use crate::error::ExtractionError;
use epub::doc::EpubDoc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};
use unicode_normalization::UnicodeNormalization;

pub const PASTED_SOURCE_NAME: &str = "Pasted Text";
pub const SAMPLE_SOURCE_NAME: &str = "Sample Novel";

const SAMPLE_TEXT: &str = "Chapter 1: The Beginning

It was a bright cold day in April, and the clocks were striking thirteen. The protagonist walked down the cobblestone street, lost in thought about the adventures that lay ahead. The morning sun cast long shadows across the pavement.

Chapter 2: The Discovery

The shop was much larger than it appeared from the outside. Rows upon rows of bookshelves stretched into the dim recesses of the building. Each shelf seemed to lean slightly, as if weighted down by the centuries of knowledge they contained.

Chapter 3: The Journey

Days turned into weeks as the adventure continued. New friends were made, challenges were overcome, and the protagonist grew wiser with each passing moment.";

static RE_DOCX_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<w:t(?:\s[^>]*)?>([^<]+)</w:t>").unwrap());
static RE_RTF_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\{\\rtf.*?\\viewkind\d+").unwrap());
static RE_RTF_CONTROL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\[a-z]+\d*\s?").unwrap());
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Loaded text plus the name it is known by; progress is keyed on the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub raw_text: String,
    pub source_name: String,
}

impl Document {
    /// Wrap already extracted text. Blank text is rejected.
    pub fn new(raw_text: String, source_name: impl Into<String>) -> Result<Self, ExtractionError> {
        let source_name = source_name.into();
        if raw_text.trim().is_empty() {
            return Err(ExtractionError::Empty(source_name));
        }
        Ok(Self {
            raw_text,
            source_name,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, ExtractionError> {
        let text = extract_text(path)?;
        let source_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(text, source_name)
    }

    pub fn from_pasted(text: &str) -> Result<Self, ExtractionError> {
        Self::new(text.trim().nfc().collect(), PASTED_SOURCE_NAME)
    }

    pub fn sample() -> Self {
        Self {
            raw_text: SAMPLE_TEXT.to_string(),
            source_name: SAMPLE_SOURCE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    Text,
    Pdf,
    Epub,
    Docx,
    Rtf,
}

impl SourceFormat {
    fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("pdf") => SourceFormat::Pdf,
            Some("epub") => SourceFormat::Epub,
            Some("docx") => SourceFormat::Docx,
            Some("rtf") => SourceFormat::Rtf,
            _ => SourceFormat::Text,
        }
    }

    fn label(self) -> &'static str {
        match self {
            SourceFormat::Text => "TXT",
            SourceFormat::Pdf => "PDF",
            SourceFormat::Epub => "EPUB",
            SourceFormat::Docx => "DOCX",
            SourceFormat::Rtf => "RTF",
        }
    }
}

/// Extract the text of a file, NFC-normalized.
pub fn extract_text(path: &Path) -> Result<String, ExtractionError> {
    let format = SourceFormat::from_path(path);
    info!(path = %path.display(), format = format.label(), "Extracting document text");

    let text = match format {
        SourceFormat::Text => read_lossy(path)?,
        SourceFormat::Rtf => strip_rtf(&read_lossy(path)?),
        SourceFormat::Pdf => extract_pdf(path)?,
        SourceFormat::Epub => extract_epub(path)?,
        SourceFormat::Docx => extract_docx(path)?,
    };

    let text: String = text.nfc().collect();
    if text.trim().is_empty() {
        return Err(ExtractionError::Empty(path.display().to_string()));
    }
    info!(total_chars = text.len(), "Finished extracting document text");
    Ok(text)
}

fn read_lossy(path: &Path) -> Result<String, ExtractionError> {
    let bytes = fs::read(path).map_err(|source| io_error(path, source))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn io_error(path: &Path, source: std::io::Error) -> ExtractionError {
    ExtractionError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn malformed(format: SourceFormat, reason: impl ToString) -> ExtractionError {
    ExtractionError::Malformed {
        format: format.label().to_string(),
        reason: reason.to_string(),
    }
}

fn extract_pdf(path: &Path) -> Result<String, ExtractionError> {
    let bytes = fs::read(path).map_err(|source| io_error(path, source))?;
    pdf_extract::extract_text_from_mem(&bytes).map_err(|err| malformed(SourceFormat::Pdf, err))
}

fn extract_epub(path: &Path) -> Result<String, ExtractionError> {
    let mut doc = EpubDoc::new(path).map_err(|err| malformed(SourceFormat::Epub, err))?;

    let mut combined = String::new();
    let mut sections = 0usize;

    loop {
        if let Some((section, _mime)) = doc.get_current_str() {
            sections += 1;
            if !combined.is_empty() {
                combined.push_str("\n\n");
            }
            // A very large width keeps html2text from baking in line breaks.
            let plain = match html2text::from_read(section.as_bytes(), 10_000) {
                Ok(clean) => clean,
                Err(err) => {
                    warn!(section = sections, "html2text failed: {err}");
                    section
                }
            };
            debug!(section = sections, added_chars = plain.len(), "Parsed EPUB section");
            combined.push_str(&plain);
        }

        if !doc.go_next() {
            break;
        }
    }

    if sections == 0 {
        return Err(ExtractionError::Unsupported {
            format: SourceFormat::Epub.label().to_string(),
            reason: "spine has no readable sections".to_string(),
        });
    }
    Ok(combined)
}

fn extract_docx(path: &Path) -> Result<String, ExtractionError> {
    let file = fs::File::open(path).map_err(|source| io_error(path, source))?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|err| malformed(SourceFormat::Docx, err))?;
    let mut entry = archive
        .by_name("word/document.xml")
        .map_err(|err| malformed(SourceFormat::Docx, err))?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|source| io_error(path, source))?;
    Ok(docx_xml_to_text(&xml))
}

/// Collect `<w:t>` runs, one paragraph per `</w:p>`.
fn docx_xml_to_text(xml: &str) -> String {
    xml.split("</w:p>")
        .map(|paragraph| {
            RE_DOCX_RUN
                .captures_iter(paragraph)
                .filter_map(|caps| caps.get(1))
                .map(|run| decode_xml_entities(run.as_str()))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|paragraph| !paragraph.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn decode_xml_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Control-word stripping heuristic; good enough for plain prose RTF.
fn strip_rtf(raw: &str) -> String {
    let text = RE_RTF_HEADER.replace(raw, "");
    let text = RE_RTF_CONTROL.replace_all(&text, " ");
    let text = text.replace(['{', '}'], "");
    RE_WHITESPACE.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn plain_text_is_read_and_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("story.txt");
        // "e" followed by a combining acute accent.
        fs::write(&path, "Cafe\u{301} time.").unwrap();
        let doc = Document::from_path(&path).unwrap();
        assert_eq!(doc.raw_text, "Caf\u{e9} time.");
        assert_eq!(doc.source_name, "story.txt");
    }

    #[test]
    fn unknown_extensions_are_read_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.log");
        fs::write(&path, "Chapter 1 hello").unwrap();
        assert_eq!(extract_text(&path).unwrap(), "Chapter 1 hello");
    }

    #[test]
    fn blank_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        fs::write(&path, "  \n\t").unwrap();
        assert!(matches!(extract_text(&path), Err(ExtractionError::Empty(_))));
    }

    #[test]
    fn missing_files_report_io_errors() {
        let err = extract_text(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, ExtractionError::Io { .. }));
    }

    #[test]
    fn rtf_control_words_are_stripped() {
        let raw = r"{\rtf1\ansi{\fonttbl\f0\fswiss Helvetica;}\viewkind4\uc1 \pard\f0\fs24 Chapter 1\par Hello world.\par}";
        assert_eq!(strip_rtf(raw), "Chapter 1 Hello world.");
    }

    #[test]
    fn docx_runs_become_paragraphs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.docx");
        let file = fs::File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(
            br#"<w:document><w:body><w:p><w:r><w:t>Chapter 1</w:t></w:r></w:p><w:p><w:r><w:t xml:space="preserve">Tom &amp; Jerry</w:t></w:r><w:r><w:t>ran.</w:t></w:r></w:p></w:body></w:document>"#,
        )
        .unwrap();
        zip.finish().unwrap();

        assert_eq!(extract_text(&path).unwrap(), "Chapter 1\n\nTom & Jerry ran.");
    }

    #[test]
    fn corrupt_docx_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.docx");
        fs::write(&path, "not a zip").unwrap();
        let err = extract_text(&path).unwrap_err();
        assert!(matches!(err, ExtractionError::Malformed { .. }));
        assert!(err.to_string().contains("Try converting to TXT format"));
    }

    #[test]
    fn pasted_text_is_trimmed_and_named() {
        let doc = Document::from_pasted("  Some words.  ").unwrap();
        assert_eq!(doc.raw_text, "Some words.");
        assert_eq!(doc.source_name, PASTED_SOURCE_NAME);
        assert!(Document::from_pasted("   ").is_err());
    }

    #[test]
    fn sample_has_three_chapters() {
        let doc = Document::sample();
        assert_eq!(doc.source_name, SAMPLE_SOURCE_NAME);
        assert_eq!(crate::chapters::segment(&doc.raw_text).len(), 3);
    }
}
