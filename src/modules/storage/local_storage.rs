//! Local disk storage for uploaded images
//!
//! Images live in a single upload directory under the web root and are
//! referenced by their public path (`/<upload_dir>/<file name>`), which is what
//! the static file service serves.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::core::config::StorageConfig;
use crate::core::error::{AppError, Result};
use crate::shared::validation::{FILE_EXTENSION_REGEX, UNSAFE_FILE_STEM_CHARS};

/// Timestamp appended to every stored file name (millisecond precision)
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%3f";

/// Collision suffixes tried before giving up on a name
const MAX_NAME_ATTEMPTS: u32 = 100;

/// Local filesystem image store rooted at `<web_root>/<upload_dir>`
#[derive(Debug, Clone)]
pub struct LocalImageStorage {
    upload_dir: String,
    upload_path: PathBuf,
}

impl LocalImageStorage {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            upload_dir: config.upload_dir.clone(),
            upload_path: config.upload_path(),
        }
    }

    /// Directory the images are written to
    pub fn upload_path(&self) -> &Path {
        &self.upload_path
    }

    /// Write an uploaded image and return its public path
    ///
    /// The name is derived from the client file name plus the current local
    /// time. An existing file is never overwritten: on a name clash a numeric
    /// suffix is added before the extension.
    pub async fn save(&self, original_filename: &str, data: &[u8]) -> Result<String> {
        fs::create_dir_all(&self.upload_path).await?;

        let now = Local::now();

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let file_name = stored_file_name(original_filename, now, attempt);
            let path = self.upload_path.join(&file_name);

            let mut file = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!("Image name already taken, retrying: {}", file_name);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if let Err(e) = write_all(&mut file, data).await {
                drop(file);
                let _ = fs::remove_file(&path).await;
                return Err(e.into());
            }

            info!("Image stored: path={}, size={}", path.display(), data.len());
            return Ok(self.public_path(&file_name));
        }

        Err(AppError::Storage(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free file name for '{}'", original_filename),
        )))
    }

    /// Delete the file behind a public path
    ///
    /// Returns `Ok(false)` when the path does not point into the upload
    /// directory or the file is already gone.
    pub async fn remove(&self, public_path: &str) -> Result<bool> {
        let Some(path) = self.resolve(public_path) else {
            return Ok(false);
        };

        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Image removed: {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Map a public path (`/uploads/name.png`) to its file on disk
    pub fn resolve(&self, public_path: &str) -> Option<PathBuf> {
        let file_name = public_path
            .strip_prefix('/')?
            .strip_prefix(self.upload_dir.as_str())?
            .strip_prefix('/')?;

        if file_name.is_empty()
            || file_name == "."
            || file_name == ".."
            || file_name.contains(['/', '\\'])
        {
            return None;
        }

        Some(self.upload_path.join(file_name))
    }

    fn public_path(&self, file_name: &str) -> String {
        format!("/{}/{}", self.upload_dir, file_name)
    }
}

async fn write_all(file: &mut fs::File, data: &[u8]) -> std::io::Result<()> {
    file.write_all(data).await?;
    file.flush().await
}

/// Name a stored image: sanitized stem + timestamp [+ "-attempt"] + extension
fn stored_file_name(original_filename: &str, now: DateTime<Local>, attempt: u32) -> String {
    let (stem, extension) = split_file_name(original_filename);
    let timestamp = now.format(TIMESTAMP_FORMAT);
    if attempt == 0 {
        format!("{}{}{}", stem, timestamp, extension)
    } else {
        format!("{}{}-{}{}", stem, timestamp, attempt, extension)
    }
}

/// Split a client file name into a safe stem and a `.ext` suffix (possibly empty)
fn split_file_name(original_filename: &str) -> (String, String) {
    // Browsers on Windows may send the full client path
    let base = original_filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_filename);
    // A dot-file such as ".png" is an extension with no stem
    let (stem, extension) = base.rsplit_once('.').unwrap_or((base, ""));

    let stem = UNSAFE_FILE_STEM_CHARS
        .replace_all(stem, "_")
        .trim_matches('_')
        .to_string();
    let stem = if stem.is_empty() {
        "image".to_string()
    } else {
        stem
    };

    let extension = extension.to_lowercase();
    let extension = if FILE_EXTENSION_REGEX.is_match(&extension) {
        format!(".{}", extension)
    } else {
        String::new()
    };

    (stem, extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn storage_in(dir: &TempDir) -> LocalImageStorage {
        LocalImageStorage::new(&StorageConfig {
            web_root: dir.path().to_path_buf(),
            upload_dir: "uploads".to_string(),
            max_image_size: 1024 * 1024,
        })
    }

    fn fixed_time() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 10, 16, 9, 30, 15)
            .unwrap()
            + chrono::Duration::milliseconds(123)
    }

    #[test]
    fn test_stored_file_name_appends_timestamp_before_extension() {
        assert_eq!(
            stored_file_name("lipstick.png", fixed_time(), 0),
            "lipstick20261016093015123.png"
        );
    }

    #[test]
    fn test_stored_file_name_collision_suffix() {
        assert_eq!(
            stored_file_name("lipstick.png", fixed_time(), 2),
            "lipstick20261016093015123-2.png"
        );
    }

    #[test]
    fn test_stored_file_name_strips_client_directories() {
        assert_eq!(
            stored_file_name(r"C:\Users\ana\Pictures\Rouge Noir.JPG", fixed_time(), 0),
            "Rouge_Noir20261016093015123.jpg"
        );
        assert_eq!(
            stored_file_name("../../etc/passwd", fixed_time(), 0),
            "passwd20261016093015123"
        );
    }

    #[test]
    fn test_stored_file_name_without_usable_stem() {
        assert_eq!(
            stored_file_name(".png", fixed_time(), 0),
            "image20261016093015123.png"
        );
        assert_eq!(
            stored_file_name("...", fixed_time(), 0),
            "image20261016093015123"
        );
        assert_eq!(stored_file_name("", fixed_time(), 0), "image20261016093015123");
    }

    #[tokio::test]
    async fn test_save_creates_directory_and_writes_bytes() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        assert!(!storage.upload_path().exists());

        let public_path = storage.save("serum.webp", b"RIFF-webp").await.unwrap();

        assert!(public_path.starts_with("/uploads/serum"));
        assert!(public_path.ends_with(".webp"));
        let on_disk = storage.resolve(&public_path).unwrap();
        assert_eq!(std::fs::read(on_disk).unwrap(), b"RIFF-webp");
    }

    #[tokio::test]
    async fn test_save_never_overwrites_same_name() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);

        let mut paths = Vec::new();
        for i in 0..5u8 {
            paths.push(storage.save("mask.png", &[i]).await.unwrap());
        }

        let mut unique = paths.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), paths.len());
        for (i, path) in paths.iter().enumerate() {
            let bytes = std::fs::read(storage.resolve(path).unwrap()).unwrap();
            assert_eq!(bytes, vec![i as u8]);
        }
    }

    #[tokio::test]
    async fn test_remove_existing_and_missing() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        let public_path = storage.save("toner.jpg", b"jpeg").await.unwrap();

        assert!(storage.remove(&public_path).await.unwrap());
        assert!(!storage.resolve(&public_path).unwrap().exists());
        assert!(!storage.remove(&public_path).await.unwrap());
    }

    #[test]
    fn test_resolve_rejects_paths_outside_upload_dir() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);

        assert!(storage.resolve("/uploads/a.png").is_some());
        assert!(storage.resolve("uploads/a.png").is_none());
        assert!(storage.resolve("/images/a.png").is_none());
        assert!(storage.resolve("/uploads/../secret").is_none());
        assert!(storage.resolve("/uploads/..").is_none());
        assert!(storage.resolve("/uploads/").is_none());
        assert!(storage.resolve("/uploadsx/a.png").is_none());
    }
}
