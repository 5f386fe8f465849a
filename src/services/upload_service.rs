//! Image uploads stored on local disk and served from `{public_url}/uploads`.

use std::path::Path;

use serde::Serialize;
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Raster formats only; SVG can carry script.
const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Storage subfolder, chosen by the `type` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Profile,
    Post,
    Team,
}

impl UploadKind {
    /// # Errors
    ///
    /// `BadRequest` for anything other than `profile`, `post` or `team`.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw {
            "profile" => Ok(Self::Profile),
            "post" => Ok(Self::Post),
            "team" => Ok(Self::Team),
            other => Err(AppError::BadRequest(format!(
                "Unknown upload type: {other}. Allowed: profile, post, team."
            ))),
        }
    }

    pub const fn folder(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Post => "post",
            Self::Team => "team",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub url: String,
    pub file_name: String,
}

fn extension_of(file_name: &str) -> Result<String, AppError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(AppError::BadRequest(
            "Unsupported file type. Allowed: PNG, JPG, GIF, WEBP, SVG.".to_string(),
        ))
    }
}

/// Write `data` under `{upload_dir}/{kind}/` with a fresh name and return its public URL.
///
/// # Errors
///
/// `BadRequest` for empty files or unsupported extensions, `PayloadTooLarge` over
/// [`MAX_UPLOAD_BYTES`], `Internal` on I/O failures.
pub async fn store(
    config: &Config,
    kind: UploadKind,
    original_name: &str,
    data: &[u8],
) -> Result<UploadedFile, AppError> {
    if data.is_empty() {
        return Err(AppError::BadRequest("No file provided.".to_string()));
    }
    if data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::PayloadTooLarge(
            "File exceeds the 5 MB size limit.".to_string(),
        ));
    }
    let extension = extension_of(original_name)?;

    let dir = Path::new(&config.upload_dir).join(kind.folder());
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create upload dir: {e}")))?;

    let file_name = format!("{}.{extension}", Uuid::new_v4());
    tokio::fs::write(dir.join(&file_name), data)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to write file: {e}")))?;

    let url = format!(
        "{}/uploads/{}/{file_name}",
        config.public_url.trim_end_matches('/'),
        kind.folder()
    );
    tracing::debug!(%url, bytes = data.len(), "File uploaded");
    Ok(UploadedFile { url, file_name })
}
