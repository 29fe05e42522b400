//! Estate CLI: push one file through the upload pipeline.
//!
//! Storage is configured from the environment (`STORAGE_BACKEND` and
//! friends, see `estate_core::Config`).

use std::path::{Path, PathBuf};

use anyhow::Context;
use bytes::Bytes;
use clap::Parser;
use estate_core::{AssetCategory, CandidateFile, Config, MediaKind};
use estate_processing::MediaValidator;
use estate_upload::{StoredAsset, UploadPipeline};

#[derive(Debug, Parser)]
#[command(name = "estate-upload", about = "Upload a property image or document")]
pub struct UploadArgs {
    /// Path to the file to upload
    pub file: PathBuf,

    /// buildings, units, components, requests, contingency_docs or providers
    #[arg(long)]
    pub category: String,

    /// Owning entity id; omit for an entity that does not exist yet
    #[arg(long)]
    pub entity_id: Option<String>,

    /// image or document
    #[arg(long, default_value = "image")]
    pub kind: String,

    /// File-name prefix inside the entity folder (defaults to the kind)
    #[arg(long)]
    pub prefix: Option<String>,

    /// Declared MIME type; guessed from the extension when omitted
    #[arg(long)]
    pub content_type: Option<String>,

    /// Print the stored asset as JSON
    #[arg(long)]
    pub json: bool,
}

/// MIME type for the formats the pipeline accepts.
pub fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

pub async fn run(args: &UploadArgs, config: &Config) -> anyhow::Result<StoredAsset> {
    let category: AssetCategory = args.category.parse()?;
    let kind: MediaKind = args.kind.parse()?;
    let prefix = args.prefix.clone().unwrap_or_else(|| kind.to_string());

    let data = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let name = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    let content_type = args
        .content_type
        .clone()
        .unwrap_or_else(|| guess_content_type(&args.file).to_string());

    let file = CandidateFile::new(name, content_type, Bytes::from(data));
    let validator = MediaValidator::from_config(kind, config);
    let pipeline = UploadPipeline::from_config(config).await?;

    let asset = pipeline
        .validate_and_store(
            &validator,
            file,
            category,
            &prefix,
            args.entity_id.as_deref(),
        )
        .await?;

    tracing::info!(
        key = %asset.key,
        url = %asset.url,
        size_bytes = asset.size_bytes,
        "File uploaded"
    );
    Ok(asset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use estate_core::{AppError, StorageBackend, UploadErrorKind};
    use tempfile::tempdir;

    fn args(file: PathBuf) -> UploadArgs {
        UploadArgs {
            file,
            category: "buildings".into(),
            entity_id: Some("b1".into()),
            kind: "image".into(),
            prefix: None,
            content_type: None,
            json: false,
        }
    }

    #[test]
    fn guesses_content_type_from_extension() {
        assert_eq!(guess_content_type(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(guess_content_type(Path::new("plan.pdf")), "application/pdf");
        assert_eq!(guess_content_type(Path::new("notes")), "application/octet-stream");
    }

    #[test]
    fn parses_command_line() {
        let parsed = UploadArgs::try_parse_from([
            "estate-upload",
            "lobby.png",
            "--category",
            "units",
            "--entity-id",
            "u1",
            "--kind",
            "image",
        ])
        .unwrap();
        assert_eq!(parsed.file, PathBuf::from("lobby.png"));
        assert_eq!(parsed.category, "units");
        assert_eq!(parsed.entity_id.as_deref(), Some("u1"));
        assert!(!parsed.json);
    }

    #[tokio::test]
    async fn uploads_to_local_storage() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("lobby.png");
        std::fs::write(&source, b"not really a png").unwrap();

        let config = Config {
            storage_backend: Some(StorageBackend::Local),
            local_storage_path: Some(dir.path().join("media").display().to_string()),
            local_storage_base_url: Some("http://localhost:8080/media".into()),
            ..Config::default()
        };

        let asset = run(&args(source), &config).await.unwrap();
        assert!(asset.key.starts_with("buildings/b1/image_"));
        assert!(asset.url.starts_with("http://localhost:8080/media/buildings/b1/"));
        assert!(dir.path().join("media").join(&asset.key).is_file());
    }

    #[tokio::test]
    async fn rejects_disallowed_type() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("notes.txt");
        std::fs::write(&source, b"hello").unwrap();

        let err = run(&args(source), &Config::default()).await.unwrap_err();
        let app = err.downcast_ref::<AppError>().unwrap();
        assert_eq!(app.kind(), UploadErrorKind::ImageTypeInvalid);
    }

    #[tokio::test]
    async fn missing_storage_is_reported() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("a.jpg");
        std::fs::write(&source, b"jpg").unwrap();

        let err = run(&args(source), &Config::default()).await.unwrap_err();
        let app = err.downcast_ref::<AppError>().unwrap();
        assert_eq!(app.kind(), UploadErrorKind::StorageUnavailable);
    }
}
