use crate::error::{ApiError, FieldErrors};
use crate::AppState;
use axum::extract::{Multipart, State};
use axum::http::header::{self, HeaderName};
use axum::response::IntoResponse;
use axum::{Form, Json};
use doc_translator_core::config::{SourceLang, TargetLang};
use doc_translator_core::{process_file, UploadedFile};
use serde::{Deserialize, Serialize};

pub const DETECTED_LANGUAGE_HEADER: &str = "x-detected-language";

/// Fields of the browser's translation form.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranslationForm {
    #[serde(default)]
    pub source_language: String,
    #[serde(default)]
    pub target_language: String,
    #[serde(default)]
    pub text_to_translate: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranslateResponse {
    pub translated_text: String,
    pub source_language: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LanguagesResponse {
    pub source: Vec<(String, String)>,
    pub target: Vec<(String, String)>,
}

pub async fn languages(State(state): State<AppState>) -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        source: state.catalog.source_choices(),
        target: state.catalog.target_choices(),
    })
}

/// Fills in `source_language` when the form asks for auto detection.
pub async fn detect_language(
    State(state): State<AppState>,
    Form(mut form): Form<TranslationForm>,
) -> Result<Json<TranslationForm>, ApiError> {
    if form.text_to_translate.trim().is_empty() {
        return Ok(Json(form));
    }
    if SourceLang::parse(&form.source_language).is_auto() {
        form.source_language = state
            .translator
            .detect_language(form.text_to_translate.clone())
            .await?;
        tracing::debug!(detected = %form.source_language, "detected form language");
    }
    Ok(Json(form))
}

pub async fn translate(
    State(state): State<AppState>,
    Form(form): Form<TranslationForm>,
) -> Result<Json<TranslateResponse>, ApiError> {
    let target = validate_form(&form)?;

    let source = match SourceLang::parse(&form.source_language) {
        SourceLang::Auto => state
            .translator
            .detect_language(form.text_to_translate.clone())
            .await?,
        SourceLang::Code(code) => code,
    };

    let translated_text = state
        .translator
        .translate_text(
            form.text_to_translate,
            SourceLang::Code(source.clone()),
            target,
        )
        .await?;

    Ok(Json(TranslateResponse {
        translated_text,
        source_language: source,
    }))
}

fn validate_form(form: &TranslationForm) -> Result<TargetLang, ApiError> {
    let mut errors = FieldErrors::new();

    if form.text_to_translate.trim().is_empty() {
        errors.insert(
            "text-to-translate".into(),
            "Text : This field is required".into(),
        );
    }
    let target = TargetLang::new(form.target_language.as_str()).ok();
    if target.is_none() {
        errors.insert(
            "target-language".into(),
            "Target language : This field is required".into(),
        );
    }
    if let (Some(source), Some(target)) = (SourceLang::parse(&form.source_language).code(), &target)
    {
        if source.eq_ignore_ascii_case(target.as_str()) {
            errors.insert(
                "same-languages".into(),
                "Source and target language must be different".into(),
            );
        }
    }

    match target {
        Some(target) if errors.is_empty() => Ok(target),
        _ => Err(ApiError::Validation(errors)),
    }
}

pub async fn file_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut upload = None;
    let mut target_language = String::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_owned();
                let content = field.bytes().await?;
                upload = Some(UploadedFile::new(filename, content));
            }
            "target_language" => target_language = field.text().await?,
            _ => {}
        }
    }

    let upload = upload
        .filter(|u| !u.filename.is_empty())
        .ok_or_else(|| ApiError::field("file", "No file provided"))?;
    let target = TargetLang::new(target_language)
        .map_err(|_| ApiError::field("target-language", "Target language : This field is required"))?;

    let filename = upload.filename.clone();
    let result = process_file(upload, target.clone(), state.translator.as_ref()).await?;
    let download_name = result.kind.translated_filename(&filename, &target);

    tracing::info!(
        filename = %filename,
        detected = %result.detected_language,
        target_lang = %target,
        "file translated"
    );

    Ok((
        [
            (header::CONTENT_TYPE, result.kind.mime_type().to_owned()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&download_name),
            ),
            (
                HeaderName::from_static(DETECTED_LANGUAGE_HEADER),
                result.detected_language.clone(),
            ),
        ],
        result.into_bytes(),
    ))
}

/// `attachment` disposition carrying an ASCII fallback name plus the exact
/// name as RFC 5987 `filename*`.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            ' ' => c,
            c if c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(filename)
    )
}
