//! Upload capture: turns a multipart file field into an opaque stored
//! path kept on the owning record and served back under `/uploads`.

use std::path::Path;

use chrono::Utc;
use uuid::Uuid;

use crate::error::AppError;

/// Maximum accepted file size (5MB).
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// Write `data` into the uploads directory under a unique name derived
/// from the field name, returning the relative path to store.
pub async fn save_upload(
    uploads_dir: &Path,
    field: &str,
    original_name: &str,
    data: &[u8],
) -> Result<String, AppError> {
    if data.is_empty() {
        return Err(AppError::ValidationError("uploaded file is empty".into()));
    }
    if data.len() > MAX_FILE_SIZE {
        return Err(AppError::ValidationError(format!(
            "uploaded file exceeds {MAX_FILE_SIZE} bytes"
        )));
    }

    tokio::fs::create_dir_all(uploads_dir)
        .await
        .map_err(|e| AppError::InternalServerError(format!("Failed to create uploads dir: {e}")))?;

    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    let filename = format!(
        "{field}-{}-{}{ext}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    );

    let path = uploads_dir.join(&filename);
    tokio::fs::write(&path, data)
        .await
        .map_err(|e| AppError::InternalServerError(format!("Failed to store upload: {e}")))?;

    Ok(path.to_string_lossy().into_owned())
}
