#![deny(warnings)]

pub mod config;
pub mod document;
pub mod languages;
pub mod process;
pub mod translate;

pub use process::{process_file, FileKind, ProcessError, TranslationResult, UploadedFile};
