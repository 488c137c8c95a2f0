mod xml;

use crate::config::{SourceLang, TargetLang};
use crate::translate::{TranslateError, Translator};
use bytes::Bytes;
use std::io::{Cursor, Read, Seek, Write};
use std::string::FromUtf8Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub use xml::{Paragraph, XmlPart};

pub const MAIN_DOCUMENT_PART: &str = "word/document.xml";
const DETECTION_SAMPLE_CHARS: usize = 1000;

/// Upper bounds on how much an uploaded package may inflate to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArchiveLimits {
    pub max_entry_bytes: u64,
    pub max_total_bytes: u64,
}

impl Default for ArchiveLimits {
    fn default() -> Self {
        Self {
            max_entry_bytes: 64 * 1024 * 1024,
            max_total_bytes: 256 * 1024 * 1024,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum DocumentError {
    #[error("invalid docx document: {0}")]
    InvalidDocument(String),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("document part is not valid utf-8: {0}")]
    Encoding(#[from] FromUtf8Error),

    #[error("translation failed: {0}")]
    Translate(#[from] TranslateError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Entry {
    name: String,
    compression: CompressionMethod,
    is_dir: bool,
    data: Vec<u8>,
}

/// Parts whose paragraphs carry user-visible text.
pub fn is_translatable_part(name: &str) -> bool {
    if name == MAIN_DOCUMENT_PART || name == "word/footnotes.xml" || name == "word/endnotes.xml" {
        return true;
    }
    let Some(file) = name.strip_prefix("word/") else {
        return false;
    };
    !file.contains('/')
        && file.ends_with(".xml")
        && (file.starts_with("header") || file.starts_with("footer"))
}

/// A `.docx` package with its text runs translated, ready to be saved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranslatedDocument {
    entries: Vec<Entry>,
}

impl TranslatedDocument {
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn save<W: Write + Seek>(&self, writer: W) -> Result<(), DocumentError> {
        let mut zip = ZipWriter::new(writer);
        for entry in &self.entries {
            let options = SimpleFileOptions::default().compression_method(entry.compression);
            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), options)?;
            } else {
                zip.start_file(entry.name.as_str(), options)?;
                zip.write_all(&entry.data)?;
            }
        }
        zip.finish()?;
        Ok(())
    }
}

/// Translates the text of a `.docx` file into `target`, paragraph by
/// paragraph, keeping every non-text part of the package as it was.
pub struct DocxTranslator<'a> {
    content: Bytes,
    target: TargetLang,
    translator: &'a dyn Translator,
    limits: ArchiveLimits,
    detected_language: Option<String>,
}

impl<'a> DocxTranslator<'a> {
    pub fn new(content: Bytes, target: TargetLang, translator: &'a dyn Translator) -> Self {
        Self {
            content,
            target,
            translator,
            limits: ArchiveLimits::default(),
            detected_language: None,
        }
    }

    pub fn with_limits(mut self, limits: ArchiveLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Source language found by the last [`DocxTranslator::process_document`]
    /// call; empty when the document had no text to detect from.
    pub fn detected_language(&self) -> &str {
        self.detected_language.as_deref().unwrap_or_default()
    }

    pub async fn process_document(&mut self) -> Result<TranslatedDocument, DocumentError> {
        let mut entries = read_entries(&self.content, self.limits)?;
        if !entries.iter().any(|e| e.name == MAIN_DOCUMENT_PART) {
            return Err(DocumentError::InvalidDocument(format!(
                "missing {MAIN_DOCUMENT_PART}"
            )));
        }

        let mut parts = Vec::new();
        for (idx, entry) in entries.iter_mut().enumerate() {
            if !entry.is_dir && is_translatable_part(&entry.name) {
                // Rewritten from the parsed part below.
                let xml = String::from_utf8(std::mem::take(&mut entry.data))?;
                parts.push((idx, XmlPart::parse(xml)));
            }
        }

        let sample = detection_sample(parts.iter().map(|(_, part)| part));
        self.detected_language = if sample.is_empty() {
            None
        } else {
            Some(self.translator.detect_language(sample).await?)
        };
        let source = match &self.detected_language {
            Some(code) => SourceLang::Code(code.clone()),
            None => SourceLang::Auto,
        };
        tracing::debug!(
            detected = %self.detected_language(),
            parts = parts.len(),
            "docx source language"
        );

        for (idx, part) in parts {
            let mut translations = Vec::with_capacity(part.paragraphs().len());
            for paragraph in part.paragraphs() {
                if paragraph.is_blank() {
                    translations.push(None);
                    continue;
                }
                let translated = self
                    .translator
                    .translate_text(paragraph.text().to_owned(), source.clone(), self.target.clone())
                    .await?;
                translations.push(Some(translated));
            }

            let entry = &mut entries[idx];
            entry.data = part.apply(&translations).into_bytes();
            entry.compression = CompressionMethod::Deflated;
        }

        Ok(TranslatedDocument { entries })
    }
}

fn read_entries(content: &Bytes, limits: ArchiveLimits) -> Result<Vec<Entry>, DocumentError> {
    let mut archive = ZipArchive::new(Cursor::new(content.clone()))
        .map_err(|e| DocumentError::InvalidDocument(e.to_string()))?;

    let mut entries = Vec::with_capacity(archive.len());
    let mut total = 0u64;
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let name = file.name().to_owned();

        // Sizes in the zip headers are whatever the uploader wrote; only
        // the inflated bytes count.
        let budget = limits.max_entry_bytes.min(limits.max_total_bytes - total);
        let mut data = Vec::new();
        file.by_ref().take(budget.saturating_add(1)).read_to_end(&mut data)?;
        let read = data.len() as u64;
        if read > budget {
            return Err(DocumentError::InvalidDocument(
                if budget < limits.max_entry_bytes {
                    format!("package inflates past {} bytes", limits.max_total_bytes)
                } else {
                    format!("{name} inflates past {} bytes", limits.max_entry_bytes)
                },
            ));
        }
        total += read;

        entries.push(Entry {
            name,
            compression: file.compression(),
            is_dir: file.is_dir(),
            data,
        });
    }
    Ok(entries)
}

fn detection_sample<'p>(parts: impl Iterator<Item = &'p XmlPart>) -> String {
    let text = parts
        .flat_map(|part| part.paragraphs())
        .filter(|p| !p.is_blank())
        .map(|p| p.text())
        .collect::<Vec<_>>()
        .join("\n");
    text.chars().take(DETECTION_SAMPLE_CHARS).collect()
}
