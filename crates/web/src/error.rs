use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use doc_translator_core::document::DocumentError;
use doc_translator_core::translate::TranslateError;
use doc_translator_core::ProcessError;
use std::collections::BTreeMap;

/// Field id -> message, the shape the browser client renders.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("invalid request")]
    Validation(FieldErrors),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error(transparent)]
    Multipart(#[from] MultipartError),
}

impl ApiError {
    pub fn field<K: Into<String>, M: Into<String>>(key: K, message: M) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(key.into(), message.into());
        Self::Validation(errors)
    }

    fn status_and_field(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation(_) => (StatusCode::BAD_REQUEST, ""),
            Self::Multipart(e) => (e.status(), "file"),
            Self::Translate(e) => translate_status(e),
            Self::Process(e) => match e {
                ProcessError::UnsupportedFileFormat { .. } => {
                    (StatusCode::UNSUPPORTED_MEDIA_TYPE, "file")
                }
                ProcessError::Decode(_) => (StatusCode::UNPROCESSABLE_ENTITY, "file"),
                ProcessError::Translate(e)
                | ProcessError::Document(DocumentError::Translate(e)) => upload_translate_status(e),
                ProcessError::Document(DocumentError::Io(_)) | ProcessError::Io(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "server")
                }
                ProcessError::Document(_) => (StatusCode::UNPROCESSABLE_ENTITY, "file"),
            },
        }
    }
}

fn translate_status(e: &TranslateError) -> (StatusCode, &'static str) {
    match e {
        TranslateError::EmptyText => (StatusCode::BAD_REQUEST, "text-to-translate"),
        _ => (StatusCode::BAD_GATEWAY, "translation"),
    }
}

/// Translation failures while processing an upload; the form there only
/// has a `file` field to report blank content against.
fn upload_translate_status(e: &TranslateError) -> (StatusCode, &'static str) {
    match e {
        TranslateError::EmptyText => (StatusCode::BAD_REQUEST, "file"),
        _ => translate_status(e),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, field) = self.status_and_field();
        let errors = match self {
            Self::Validation(errors) => errors,
            other => {
                if status.is_server_error() {
                    tracing::error!(error = %other, status = status.as_u16(), "request failed");
                } else {
                    tracing::warn!(error = %other, status = status.as_u16(), "request rejected");
                }
                let message = match &other {
                    Self::Multipart(e) => e.body_text(),
                    _ => other.to_string(),
                };
                let mut errors = FieldErrors::new();
                errors.insert(field.to_owned(), message);
                errors
            }
        };
        (status, Json(errors)).into_response()
    }
}
