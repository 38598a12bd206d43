//! Receipt photos stored under the receipts directory, addressed by a
//! generated relative path (`<created_by>/<uuid>.<ext>`).

use std::path::{Component, Path, PathBuf};

use crate::error::{AppError, Result};

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "heic", "webp", "pdf"];

fn safe_segment(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

/// Resolve a stored path under `root`, rejecting anything that would escape it.
fn resolve(root: &Path, relative: &str) -> Result<PathBuf> {
    let relative = Path::new(relative);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if escapes || relative.as_os_str().is_empty() {
        return Err(AppError::validation(format!(
            "Invalid receipt path '{}'",
            relative.display()
        )));
    }
    Ok(root.join(relative))
}

/// Write the photo and return its path relative to `root`.
pub fn save_receipt(root: &Path, created_by: &str, extension: &str, bytes: &[u8]) -> Result<String> {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(AppError::validation(format!(
            "Unsupported receipt type '{extension}'"
        )));
    }
    if bytes.is_empty() {
        return Err(AppError::validation("Receipt file is empty"));
    }

    let relative = format!(
        "{}/{}.{}",
        safe_segment(created_by),
        uuid::Uuid::new_v4(),
        ext
    );
    let path = resolve(root, &relative)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, bytes)?;

    tracing::info!(path = %relative, size = bytes.len(), "Receipt saved");
    Ok(relative)
}

pub fn load_receipt(root: &Path, relative: &str) -> Result<Vec<u8>> {
    let path = resolve(root, relative)?;
    match std::fs::read(&path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AppError::not_found("Receipt", relative))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn delete_receipt(root: &Path, relative: &str) -> Result<()> {
    let path = resolve(root, relative)?;
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}
