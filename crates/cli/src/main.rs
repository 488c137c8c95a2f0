#![deny(warnings)]

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use doc_translator_core::config::{
    resolve_api_key, resolve_optional_string, resolve_string_with_default, ApiKeys, AppConfig,
    Env, ServerConfig, StdEnv, TargetLang, UploadLimit, DEFAULT_BIND_ADDR, DEFAULT_MAX_UPLOAD_MB,
    ENV_BIND_ADDR, ENV_DEEPL_API_KEY, ENV_DEEPL_BASE_URL,
};
use doc_translator_core::translate::{DeepLTranslator, DummyTranslator, Translator};
use doc_translator_core::{process_file, FileKind, UploadedFile};
use doc_translator_web::AppState;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "doc-translator")]
#[command(about = "Translate text and .txt/.docx documents through DeepL")]
struct Args {
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP front-end
    Serve {
        #[arg(long)]
        bind: Option<String>,

        #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_MB)]
        max_upload_mb: u64,

        #[command(flatten)]
        backend: BackendArgs,
    },
    /// Translate a single local file
    Translate {
        path: PathBuf,

        #[arg(long)]
        target_lang: String,

        #[arg(long, short)]
        output: Option<PathBuf>,

        #[command(flatten)]
        backend: BackendArgs,
    },
}

#[derive(ClapArgs, Debug, Clone, Default)]
struct BackendArgs {
    #[arg(long)]
    deepl_api_key: Option<String>,

    #[arg(long)]
    deepl_base_url: Option<String>,

    /// Echo text back instead of calling DeepL
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let env = StdEnv;
    match args.command {
        Command::Serve {
            bind,
            max_upload_mb,
            backend,
        } => {
            let cfg = build_config(bind, max_upload_mb, &backend, &env)?;
            tracing::info!(
                bind = %cfg.server.bind,
                max_upload_mb = cfg.server.upload_limit.max_mb,
                offline = backend.offline,
                "config loaded"
            );
            let translator = build_translator(&cfg, backend.offline)?;
            let state = AppState::load(translator, cfg.server.upload_limit.bytes()).await;
            doc_translator_web::serve(&cfg.server, state).await?;
        }
        Command::Translate {
            path,
            target_lang,
            output,
            backend,
        } => {
            let cfg = build_config(None, DEFAULT_MAX_UPLOAD_MB, &backend, &env)?;
            let translator = build_translator(&cfg, backend.offline)?;
            let target = TargetLang::new(target_lang)?;
            let written = run_translate(&path, target, output, translator.as_ref()).await?;
            println!("{}", written.display());
        }
    }

    Ok(())
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn build_config(
    bind: Option<String>,
    max_upload_mb: u64,
    backend: &BackendArgs,
    env: &impl Env,
) -> anyhow::Result<AppConfig> {
    let bind = resolve_string_with_default(bind, ENV_BIND_ADDR, env, DEFAULT_BIND_ADDR);
    let server = ServerConfig::new(&bind, UploadLimit::new(max_upload_mb)?)?;
    let deepl = resolve_api_key(backend.deepl_api_key.clone(), ENV_DEEPL_API_KEY, env)?;
    let deepl_base_url =
        resolve_optional_string(backend.deepl_base_url.clone(), ENV_DEEPL_BASE_URL, env);

    Ok(AppConfig {
        api_keys: ApiKeys { deepl },
        deepl_base_url,
        server,
    })
}

fn build_translator(cfg: &AppConfig, offline: bool) -> anyhow::Result<Arc<dyn Translator>> {
    if offline {
        tracing::warn!("offline mode: text is echoed back untranslated");
        return Ok(Arc::new(DummyTranslator::new()));
    }
    let Some(key) = cfg.api_keys.deepl.clone() else {
        anyhow::bail!("DeepL API key is required for translation (--deepl-api-key or {ENV_DEEPL_API_KEY})");
    };
    let mut translator = DeepLTranslator::new(key.expose().to_string());
    if let Some(base_url) = cfg.deepl_base_url.clone() {
        translator = translator.with_base_url(base_url);
    }
    Ok(Arc::new(translator))
}

fn default_output_path(input: &Path, kind: FileKind, target: &TargetLang) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(kind.translated_filename(&name, target))
}

async fn run_translate(
    path: &Path,
    target: TargetLang,
    output: Option<PathBuf>,
    translator: &dyn Translator,
) -> anyhow::Result<PathBuf> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("not a file path: {}", path.display()))?;
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let result = process_file(UploadedFile::new(filename, content), target.clone(), translator).await?;
    tracing::info!(
        detected = %result.detected_language,
        target_lang = %target,
        "translated {}",
        path.display()
    );

    let output = output.unwrap_or_else(|| default_output_path(path, result.kind, &target));
    tokio::fs::write(&output, result.into_bytes())
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_translator_core::config::MapEnv;

    #[test]
    fn config_prefers_cli_over_env() {
        let env = MapEnv::default()
            .with_var(ENV_BIND_ADDR, "0.0.0.0:9000")
            .with_var(ENV_DEEPL_API_KEY, "env-key");
        let backend = BackendArgs {
            deepl_api_key: Some("cli-key".into()),
            ..Default::default()
        };
        let cfg = build_config(Some("127.0.0.1:7000".into()), 4, &backend, &env).unwrap();
        assert_eq!(cfg.server.bind.port(), 7000);
        assert_eq!(cfg.server.upload_limit.max_mb, 4);
        assert_eq!(cfg.api_keys.deepl.unwrap().expose(), "cli-key");
    }

    #[test]
    fn config_reads_env_when_cli_missing() {
        let env = MapEnv::default()
            .with_var(ENV_BIND_ADDR, "0.0.0.0:9000")
            .with_var(ENV_DEEPL_BASE_URL, "http://localhost:3000");
        let cfg = build_config(None, 1, &BackendArgs::default(), &env).unwrap();
        assert_eq!(cfg.server.bind.port(), 9000);
        assert!(cfg.api_keys.deepl.is_none());
        assert_eq!(cfg.deepl_base_url.as_deref(), Some("http://localhost:3000"));
    }

    #[test]
    fn translator_requires_key_unless_offline() {
        let cfg = AppConfig::default();
        assert!(build_translator(&cfg, false).is_err());
        assert!(build_translator(&cfg, true).is_ok());
    }

    #[test]
    fn default_output_sits_next_to_input() {
        let target = TargetLang::new("de").unwrap();
        let out = default_output_path(Path::new("/tmp/in/report.docx"), FileKind::Docx, &target);
        assert_eq!(out, PathBuf::from("/tmp/in/report_de.docx"));
    }

    #[tokio::test]
    async fn translate_command_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("note.txt");
        std::fs::write(&input, "Hello").unwrap();

        let written = run_translate(
            &input,
            TargetLang::new("fr").unwrap(),
            None,
            &DummyTranslator::new(),
        )
        .await
        .unwrap();

        assert_eq!(written, dir.path().join("note_fr.txt"));
        assert_eq!(std::fs::read_to_string(written).unwrap(), "Hello");
    }

    #[tokio::test]
    async fn translate_command_rejects_unsupported_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("slides.pptx");
        std::fs::write(&input, "x").unwrap();

        let err = run_translate(&input, TargetLang::new("fr").unwrap(), None, &DummyTranslator::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unsupported file format"));
    }
}
