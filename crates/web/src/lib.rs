#![deny(warnings)]

//! HTTP front-end: the browser's translation form and file upload.

pub mod error;
pub mod handlers;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use doc_translator_core::config::ServerConfig;
use doc_translator_core::languages::LanguageCatalog;
use doc_translator_core::translate::Translator;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub translator: Arc<dyn Translator>,
    pub catalog: LanguageCatalog,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Builds the state, asking the translator for its language list and
    /// falling back to the built-in catalog when that fails.
    pub async fn load(translator: Arc<dyn Translator>, max_upload_bytes: usize) -> Self {
        let catalog = match translator.list_languages().await {
            Ok(languages) if !languages.is_empty() => LanguageCatalog::new(languages),
            Ok(_) => {
                tracing::warn!("translator returned no languages, using built-in catalog");
                LanguageCatalog::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to list languages, using built-in catalog");
                LanguageCatalog::default()
            }
        };
        Self {
            translator,
            catalog,
            max_upload_bytes,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let limit = state.max_upload_bytes;
    Router::new()
        .route("/api/languages", get(handlers::languages))
        .route("/api/detect-language", post(handlers::detect_language))
        .route("/api/translate", post(handlers::translate))
        .route("/api/file-upload", post(handlers::file_upload))
        .layer(DefaultBodyLimit::max(limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: &ServerConfig, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!(
        addr = %config.bind,
        max_upload_mb = config.upload_limit.max_mb,
        "doc-translator listening"
    );
    axum::serve(listener, router(state)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{LanguagesResponse, TranslateResponse, DETECTED_LANGUAGE_HEADER};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use doc_translator_core::config::{SourceLang, TargetLang};
    use doc_translator_core::languages::Language;
    use doc_translator_core::translate::TranslateError;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    const BOUNDARY: &str = "XBOUNDARYX";

    #[derive(Default)]
    struct StubTranslator {
        detects: AtomicUsize,
        fail: bool,
    }

    impl Translator for StubTranslator {
        fn detect_language(&self, text: String) -> BoxFuture<'_, Result<String, TranslateError>> {
            async move {
                if text.trim().is_empty() {
                    return Err(TranslateError::EmptyText);
                }
                self.detects.fetch_add(1, Ordering::SeqCst);
                Ok("en".to_string())
            }
            .boxed()
        }

        fn translate_text(
            &self,
            text: String,
            _source: SourceLang,
            target: TargetLang,
        ) -> BoxFuture<'_, Result<String, TranslateError>> {
            async move {
                if self.fail {
                    return Err(TranslateError::Api {
                        status: 500,
                        body: "boom".into(),
                    });
                }
                Ok(format!("[{target}] {text}"))
            }
            .boxed()
        }

        fn list_languages(&self) -> BoxFuture<'_, Result<Vec<Language>, TranslateError>> {
            async move {
                Ok(vec![
                    Language::new("en", "English"),
                    Language::new("fr", "French"),
                ])
            }
            .boxed()
        }
    }

    async fn app_with(stub: Arc<StubTranslator>) -> Router {
        router(AppState::load(stub, 1024 * 1024).await)
    }

    async fn app() -> Router {
        app_with(Arc::new(StubTranslator::default())).await
    }

    fn form_request(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    fn upload_request(filename: Option<&str>, content: &[u8], target: &str) -> Request<Body> {
        let mut body = Vec::new();
        if let Some(filename) = filename {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"target_language\"\r\n\r\n{target}\r\n--{BOUNDARY}--\r\n"
            )
            .as_bytes(),
        );
        Request::post("/api/file-upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn languages_lists_choices_from_translator() {
        let response = app()
            .await
            .oneshot(Request::get("/api/languages").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: LanguagesResponse = json_body(response).await;
        assert_eq!(body.source[0], ("auto".to_string(), "Auto".to_string()));
        assert_eq!(body.target[0].0, "");
        assert_eq!(body.target[2], ("fr".to_string(), "French".to_string()));
    }

    #[tokio::test]
    async fn detect_fills_auto_source() {
        let response = app()
            .await
            .oneshot(form_request(
                "/api/detect-language",
                "source_language=auto&target_language=fr&text_to_translate=Hello",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let form: handlers::TranslationForm = json_body(response).await;
        assert_eq!(form.source_language, "en");
        assert_eq!(form.text_to_translate, "Hello");
    }

    #[tokio::test]
    async fn detect_skips_empty_text_and_explicit_source() {
        let stub = Arc::new(StubTranslator::default());
        let app = app_with(stub.clone()).await;

        let response = app
            .clone()
            .oneshot(form_request(
                "/api/detect-language",
                "source_language=auto&target_language=fr&text_to_translate=",
            ))
            .await
            .unwrap();
        let form: handlers::TranslationForm = json_body(response).await;
        assert_eq!(form.source_language, "auto");

        let response = app
            .oneshot(form_request(
                "/api/detect-language",
                "source_language=de&target_language=fr&text_to_translate=Hallo",
            ))
            .await
            .unwrap();
        let form: handlers::TranslationForm = json_body(response).await;
        assert_eq!(form.source_language, "de");
        assert_eq!(stub.detects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn translate_returns_text_and_source() {
        let response = app()
            .await
            .oneshot(form_request(
                "/api/translate",
                "source_language=auto&target_language=fr&text_to_translate=Hello",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: TranslateResponse = json_body(response).await;
        assert_eq!(body.translated_text, "[fr] Hello");
        assert_eq!(body.source_language, "en");
    }

    #[tokio::test]
    async fn translate_validates_languages() {
        let response = app()
            .await
            .oneshot(form_request(
                "/api/translate",
                "source_language=fr&target_language=FR&text_to_translate=Salut",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let errors: BTreeMap<String, String> = json_body(response).await;
        assert_eq!(
            errors.get("same-languages").map(String::as_str),
            Some("Source and target language must be different")
        );

        let response = app()
            .await
            .oneshot(form_request(
                "/api/translate",
                "source_language=auto&target_language=&text_to_translate=Hello",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let errors: BTreeMap<String, String> = json_body(response).await;
        assert!(errors.contains_key("target-language"));
    }

    #[tokio::test]
    async fn translate_maps_service_failure_to_bad_gateway() {
        let stub = Arc::new(StubTranslator {
            fail: true,
            ..Default::default()
        });
        let response = app_with(stub)
            .await
            .oneshot(form_request(
                "/api/translate",
                "source_language=en&target_language=fr&text_to_translate=Hello",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let errors: BTreeMap<String, String> = json_body(response).await;
        assert!(errors["translation"].contains("500"));
    }

    #[tokio::test]
    async fn upload_txt_returns_translated_attachment() {
        let response = app()
            .await
            .oneshot(upload_request(Some("note.TXT"), b"Hello", "fr"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"note_fr.txt\"; filename*=UTF-8''note_fr.txt"
        );
        assert_eq!(headers[DETECTED_LANGUAGE_HEADER], "en");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"[fr] Hello");
    }

    #[tokio::test]
    async fn upload_rejects_unsupported_format() {
        let stub = Arc::new(StubTranslator::default());
        let response = app_with(stub.clone())
            .await
            .oneshot(upload_request(Some("report.pdf"), b"%PDF", "fr"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let errors: BTreeMap<String, String> = json_body(response).await;
        assert!(errors["file"].contains(".txt, .docx"));
        assert_eq!(stub.detects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn upload_requires_file_and_target() {
        let response = app()
            .await
            .oneshot(upload_request(None, b"", "fr"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let errors: BTreeMap<String, String> = json_body(response).await;
        assert_eq!(errors["file"], "No file provided");

        let response = app()
            .await
            .oneshot(upload_request(Some("a.txt"), b"Hi", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let errors: BTreeMap<String, String> = json_body(response).await;
        assert!(errors.contains_key("target-language"));
    }

    #[tokio::test]
    async fn upload_with_invalid_utf8_is_unprocessable() {
        let response = app()
            .await
            .oneshot(upload_request(Some("bad.txt"), &[0xff, 0xfe], "fr"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn blank_upload_is_reported_against_the_file() {
        let response = app()
            .await
            .oneshot(upload_request(Some("empty.txt"), b"  \n", "fr"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let errors: BTreeMap<String, String> = json_body(response).await;
        assert!(errors.contains_key("file"));
        assert!(!errors.contains_key("text-to-translate"));
    }

    #[tokio::test]
    async fn upload_over_limit_is_rejected() {
        let state = AppState::load(Arc::new(StubTranslator::default()), 64).await;
        let response = router(state)
            .oneshot(upload_request(Some("big.txt"), &[b'a'; 4096], "fr"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
