mod deepl;
mod dummy;

use crate::config::{SourceLang, TargetLang};
use crate::languages::Language;
use futures::future::BoxFuture;

pub use deepl::DeepLTranslator;
pub use dummy::DummyTranslator;

#[derive(thiserror::Error, Debug)]
pub enum TranslateError {
    #[error("nothing to translate: input text is empty")]
    EmptyText,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("translation service returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid response from translation service: {0}")]
    InvalidResponse(String),
}

/// External translation capability. Implementations do the actual
/// detection and translation; this crate only routes text through them.
pub trait Translator: Send + Sync {
    /// Returns the lower-cased code of the language `text` is written in.
    fn detect_language(&self, text: String) -> BoxFuture<'_, Result<String, TranslateError>>;

    fn translate_text(
        &self,
        text: String,
        source: SourceLang,
        target: TargetLang,
    ) -> BoxFuture<'_, Result<String, TranslateError>>;

    fn list_languages(&self) -> BoxFuture<'_, Result<Vec<Language>, TranslateError>>;
}
