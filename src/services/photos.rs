use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::fs;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;

const PHOTO_DIR: &str = "trip-photos";
pub const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Local object storage for trip cover photos. Files are written under
/// `root/trip-photos` and handed back as URLs below `public_base`.
#[derive(Clone)]
pub struct PhotoStorage {
    root: Arc<PathBuf>,
    public_base: Arc<str>,
}

impl PhotoStorage {
    pub fn new(root: PathBuf, public_base: impl Into<String>) -> Self {
        let public_base: String = public_base.into();
        Self {
            root: Arc::new(root),
            public_base: Arc::from(public_base.trim_end_matches('/')),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_structure(&self) -> Result<(), AppError> {
        fs::create_dir_all(self.root().join(PHOTO_DIR)).await?;
        Ok(())
    }

    /// Stores an uploaded photo for `trip_id` and returns its public URL.
    pub async fn upload(
        &self,
        trip_id: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, AppError> {
        let extension = file_extension(file_name);
        if matches!(extension.as_str(), "heic" | "heif") {
            return Err(AppError::validation(
                "HEIC photos aren't supported yet. Please convert the photo to JPG first.",
            ));
        }
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(AppError::validation(
                "Unsupported file type. Please use JPG, PNG, GIF or WebP.",
            ));
        }
        if bytes.is_empty() {
            return Err(AppError::validation("The uploaded file is empty."));
        }
        if bytes.len() > MAX_PHOTO_BYTES {
            return Err(AppError::validation(
                "The photo is too large. Please use files smaller than 10 MB.",
            ));
        }
        let mime = sniff_image(bytes).ok_or_else(|| {
            AppError::validation("The file content doesn't look like an image.")
        })?;

        let stored_name = format!("{trip_id}-{}.{}", Uuid::new_v4(), extension_for(mime));
        let relative = format!("{PHOTO_DIR}/{stored_name}");
        self.ensure_structure().await?;
        fs::write(self.root().join(&relative), bytes).await?;
        info!(%trip_id, file = %relative, size = bytes.len(), "trip photo stored");

        Ok(format!("{}/{relative}", self.public_base))
    }
}

fn file_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

fn sniff_image(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        _ => None,
    }
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "jpg",
    }
}
