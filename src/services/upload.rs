use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

/// Writes uploaded bytes under the configured upload dir and hands back
/// storage paths relative to it. Rows in the database only ever hold these
/// relative paths; the dir itself is served as static files.
pub struct UploadService {
    upload_path: PathBuf,
}

/// Subdirectory an upload lands in.
#[derive(Debug, Clone, Copy)]
pub enum UploadKind {
    ProjectImage,
    Attachment,
}

impl UploadKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::ProjectImage => "covers",
            Self::Attachment => "attachments",
        }
    }
}

impl UploadService {
    #[must_use]
    pub fn new(upload_path: &str) -> Self {
        Self {
            upload_path: PathBuf::from(upload_path),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.upload_path
    }

    /// Store a file and return its path relative to the upload dir, e.g.
    /// "attachments/<uuid>/report.pdf". A per-file directory keeps the
    /// original filename intact without collisions.
    pub async fn save(&self, kind: UploadKind, filename: &str, bytes: &[u8]) -> Result<String> {
        let safe_name = sanitize_filename(filename);
        let relative = format!("{}/{}/{}", kind.as_str(), Uuid::new_v4(), safe_name);

        let full_path = self.upload_path.join(&relative);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create upload dir {}", parent.display())
            })?;
        }

        fs::write(&full_path, bytes)
            .await
            .with_context(|| format!("Failed to write upload to {}", full_path.display()))?;

        info!(path = %full_path.display(), size = bytes.len(), "Stored upload");

        Ok(relative)
    }

    /// Best-effort removal of a stored file, used when the owning row goes
    /// away or a transaction failed after files were already written.
    pub async fn delete(&self, relative_path: &str) {
        let full_path = self.upload_path.join(relative_path);
        if let Err(e) = fs::remove_file(&full_path).await {
            warn!(path = %full_path.display(), "Failed to remove stored upload: {e}");
            return;
        }

        // Drop the per-file uuid dir as well if it is now empty.
        if let Some(parent) = full_path.parent() {
            let _ = fs::remove_dir(parent).await;
        }
    }

    pub async fn delete_all(&self, relative_paths: &[String]) {
        for path in relative_paths {
            self.delete(path).await;
        }
    }
}

/// Strip directory components and control characters from a client-supplied
/// filename so it cannot escape the upload dir.
fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();

    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control() && *c != ':')
        .collect();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::sanitize_filename;

    #[test]
    fn strips_path_components() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("c:\\temp\\notes.txt"), "notes.txt");
    }

    #[test]
    fn rejects_empty_and_dot_names() {
        assert_eq!(sanitize_filename(""), "unnamed");
        assert_eq!(sanitize_filename(".."), "unnamed");
    }

    #[test]
    fn keeps_ordinary_names() {
        assert_eq!(sanitize_filename("watering schedule.pdf"), "watering schedule.pdf");
    }
}
