use crate::config::{SourceLang, TargetLang};
use crate::languages::Language;
use crate::translate::{TranslateError, Translator};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

const FREE_API_URL: &str = "https://api-free.deepl.com";
const PRO_API_URL: &str = "https://api.deepl.com";
const DETECTION_TARGET: &str = "EN-US";
const DETECTION_SAMPLE_CHARS: usize = 200;

#[derive(Clone)]
pub struct DeepLTranslator {
    client: Client,
    api_key: String,
    base_url: String,
}

impl DeepLTranslator {
    pub fn new(api_key: String) -> Self {
        // Free-tier keys carry a ":fx" suffix and live on a separate host.
        let base_url = if api_key.ends_with(":fx") {
            FREE_API_URL
        } else {
            PRO_API_URL
        };
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn translate_one(
        &self,
        text: String,
        source_lang: Option<String>,
        target_lang: String,
    ) -> Result<DeepLTranslation, TranslateError> {
        if text.trim().is_empty() {
            return Err(TranslateError::EmptyText);
        }

        let request = DeepLRequest {
            text: vec![text],
            target_lang,
            source_lang,
        };

        let response = self
            .client
            .post(format!("{}/v2/translate", self.base_url))
            .header("Authorization", self.auth_header())
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let body: DeepLResponse = response
            .json()
            .await
            .map_err(|e| TranslateError::InvalidResponse(format!("Failed to parse JSON: {}", e)))?;

        body.translations
            .into_iter()
            .next()
            .ok_or_else(|| TranslateError::InvalidResponse("No translations in response".to_string()))
    }

    fn auth_header(&self) -> String {
        format!("DeepL-Auth-Key {}", self.api_key)
    }
}

#[derive(Serialize)]
struct DeepLRequest {
    text: Vec<String>,
    target_lang: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_lang: Option<String>,
}

#[derive(Deserialize)]
struct DeepLResponse {
    translations: Vec<DeepLTranslation>,
}

#[derive(Deserialize)]
struct DeepLTranslation {
    detected_source_language: String,
    text: String,
}

#[derive(Deserialize)]
struct DeepLLanguage {
    language: String,
    name: String,
}

/// DeepL wants upper-case targets, except for the regional variants it
/// spells with a lower-case language part.
fn normalize_target(target: &TargetLang) -> String {
    match target.as_str().to_lowercase().as_str() {
        "pt-br" => "pt-BR".to_string(),
        "pt-pt" => "pt-PT".to_string(),
        "en-gb" => "en-GB".to_string(),
        "en-us" => "en-US".to_string(),
        _ => target.as_str().to_uppercase(),
    }
}

/// Source languages are accepted without regional variant only.
fn normalize_source(source: &SourceLang) -> Option<String> {
    source.code().map(|code| {
        code.split(['-', '_'])
            .next()
            .unwrap_or(code)
            .to_uppercase()
    })
}

async fn check_status(response: Response) -> Result<Response, TranslateError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    tracing::warn!(status, "deepl request failed");
    Err(TranslateError::Api { status, body })
}

impl Translator for DeepLTranslator {
    fn detect_language(&self, text: String) -> BoxFuture<'_, Result<String, TranslateError>> {
        async move {
            let sample: String = text.trim_start().chars().take(DETECTION_SAMPLE_CHARS).collect();
            let translation = self
                .translate_one(sample, None, DETECTION_TARGET.to_string())
                .await?;
            let detected = translation.detected_source_language.to_lowercase();
            tracing::debug!(detected = %detected, "deepl detected source language");
            Ok(detected)
        }
        .boxed()
    }

    fn translate_text(
        &self,
        text: String,
        source: SourceLang,
        target: TargetLang,
    ) -> BoxFuture<'_, Result<String, TranslateError>> {
        async move {
            let translation = self
                .translate_one(text, normalize_source(&source), normalize_target(&target))
                .await?;
            Ok(translation.text)
        }
        .boxed()
    }

    fn list_languages(&self) -> BoxFuture<'_, Result<Vec<Language>, TranslateError>> {
        async move {
            let response = self
                .client
                .get(format!("{}/v2/languages?type=target", self.base_url))
                .header("Authorization", self.auth_header())
                .send()
                .await?;
            let response = check_status(response).await?;

            let languages: Vec<DeepLLanguage> = response.json().await.map_err(|e| {
                TranslateError::InvalidResponse(format!("Failed to parse JSON: {}", e))
            })?;

            Ok(languages
                .into_iter()
                .map(|l| Language::new(l.language, l.name))
                .collect())
        }
        .boxed()
    }
}
