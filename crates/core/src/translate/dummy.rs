use crate::config::{SourceLang, TargetLang};
use crate::languages::{builtin_languages, Language};
use crate::translate::{TranslateError, Translator};
use futures::future::BoxFuture;
use futures::FutureExt;

/// Offline backend: reports a fixed source language and echoes text back.
#[derive(Clone, Debug)]
pub struct DummyTranslator {
    detected: String,
}

impl DummyTranslator {
    pub fn new() -> Self {
        Self {
            detected: "en".to_string(),
        }
    }

    pub fn with_detected<S: Into<String>>(detected: S) -> Self {
        Self {
            detected: detected.into(),
        }
    }
}

impl Default for DummyTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator for DummyTranslator {
    fn detect_language(&self, _text: String) -> BoxFuture<'_, Result<String, TranslateError>> {
        async move { Ok(self.detected.clone()) }.boxed()
    }

    fn translate_text(
        &self,
        text: String,
        _source: SourceLang,
        _target: TargetLang,
    ) -> BoxFuture<'_, Result<String, TranslateError>> {
        async move { Ok(text) }.boxed()
    }

    fn list_languages(&self) -> BoxFuture<'_, Result<Vec<Language>, TranslateError>> {
        async move { Ok(builtin_languages()) }.boxed()
    }
}
