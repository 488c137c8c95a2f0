//! File-type dispatch for uploaded documents.
//!
//! [`process_file`] picks exactly one strategy from the lower-cased file
//! extension; both strategies return the translated bytes in a fresh
//! in-memory buffer positioned at offset 0.

use crate::config::{SourceLang, TargetLang};
use crate::document::{DocumentError, DocxTranslator};
use crate::translate::{TranslateError, Translator};
use bytes::Bytes;
use std::fmt;
use std::io::{Cursor, Seek, SeekFrom};
use std::path::Path;
use std::string::FromUtf8Error;

pub const SUPPORTED_FORMATS: &str = ".txt, .docx";

#[derive(thiserror::Error, Debug)]
pub enum ProcessError {
    #[error("{}", unsupported_message(.extension.as_deref()))]
    UnsupportedFileFormat { extension: Option<String> },

    #[error("file is not valid utf-8 text: {0}")]
    Decode(#[from] FromUtf8Error),

    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn unsupported_message(extension: Option<&str>) -> String {
    match extension {
        Some(ext) => format!(
            "unsupported file format '.{ext}' (supported formats: {SUPPORTED_FORMATS})"
        ),
        None => format!(
            "unsupported file format: no file extension (supported formats: {SUPPORTED_FORMATS})"
        ),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileKind {
    PlainText,
    Docx,
}

impl FileKind {
    pub fn from_filename(filename: &str) -> Result<Self, ProcessError> {
        let extension = Path::new(filename)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());

        match extension.as_deref() {
            Some("txt") => Ok(Self::PlainText),
            Some("docx") => Ok(Self::Docx),
            _ => Err(ProcessError::UnsupportedFileFormat { extension }),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::PlainText => "txt",
            Self::Docx => "docx",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::PlainText => "text/plain; charset=utf-8",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// Download name for the translated file: `report.docx` -> `report_fr.docx`.
    pub fn translated_filename(self, original: &str, target: &TargetLang) -> String {
        let stem = Path::new(original)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "translated".to_owned());
        format!("{stem}_{target}.{}", self.extension())
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: String,
    pub content: Bytes,
}

impl UploadedFile {
    pub fn new<S: Into<String>, B: Into<Bytes>>(filename: S, content: B) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug)]
pub struct TranslationResult {
    pub file: Cursor<Vec<u8>>,
    pub detected_language: String,
    pub kind: FileKind,
}

impl TranslationResult {
    pub fn into_bytes(self) -> Vec<u8> {
        self.file.into_inner()
    }
}

pub async fn process_file(
    file: UploadedFile,
    target: TargetLang,
    translator: &dyn Translator,
) -> Result<TranslationResult, ProcessError> {
    let kind = FileKind::from_filename(&file.filename)?;
    tracing::info!(
        filename = %file.filename,
        kind = %kind,
        target_lang = %target,
        "processing upload"
    );

    match kind {
        FileKind::PlainText => process_txt_file(file, target, translator).await,
        FileKind::Docx => process_docx_file(file, target, translator).await,
    }
}

pub async fn process_txt_file(
    file: UploadedFile,
    target: TargetLang,
    translator: &dyn Translator,
) -> Result<TranslationResult, ProcessError> {
    let text = String::from_utf8(file.content.to_vec())?;

    let source_language = translator.detect_language(text.clone()).await?;
    let translated = translator
        .translate_text(text, SourceLang::Code(source_language.clone()), target)
        .await?;

    Ok(TranslationResult {
        file: Cursor::new(translated.into_bytes()),
        detected_language: source_language,
        kind: FileKind::PlainText,
    })
}

pub async fn process_docx_file(
    file: UploadedFile,
    target: TargetLang,
    translator: &dyn Translator,
) -> Result<TranslationResult, ProcessError> {
    let mut docx = DocxTranslator::new(file.content, target, translator);
    let translated = docx.process_document().await?;

    let mut buffer = Cursor::new(Vec::new());
    translated.save(&mut buffer)?;
    buffer.seek(SeekFrom::Start(0))?;

    Ok(TranslationResult {
        file: buffer,
        detected_language: docx.detected_language().to_owned(),
        kind: FileKind::Docx,
    })
}
