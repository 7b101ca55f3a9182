//! Loading notice drafts and attachments from disk.

use color_eyre::{eyre::eyre, Result};
use std::path::Path;

use super::types::{Attachment, NoticeDraft, MAX_ATTACHMENT_BYTES};

/// Read a draft from a YAML file.
///
/// ```yaml
/// title: Mid-term timetable
/// date: 2024-09-02
/// subject: Revised slots for CS
/// department: CS
/// body: |
///   <p>See the <b>attached</b> timetable.</p>
/// ```
pub fn load_draft(path: &Path) -> Result<NoticeDraft> {
  let contents = std::fs::read_to_string(path)
    .map_err(|e| eyre!("Failed to read draft {}: {}", path.display(), e))?;
  parse_draft(&contents).map_err(|e| eyre!("Failed to parse draft {}: {}", path.display(), e))
}

pub fn parse_draft(contents: &str) -> Result<NoticeDraft> {
  let draft: NoticeDraft = serde_yaml::from_str(contents)?;
  Ok(draft)
}

/// Read a file into an inline attachment
pub fn load_attachment(path: &Path) -> Result<Attachment> {
  let metadata = std::fs::metadata(path)
    .map_err(|e| eyre!("Failed to read attachment {}: {}", path.display(), e))?;
  if metadata.len() > MAX_ATTACHMENT_BYTES {
    return Err(eyre!(
      "File too large: {}. Maximum size is 10MB.",
      path.display()
    ));
  }

  let bytes = std::fs::read(path)
    .map_err(|e| eyre!("Failed to read attachment {}: {}", path.display(), e))?;
  let name = path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .ok_or_else(|| eyre!("Attachment path has no file name: {}", path.display()))?;

  Ok(Attachment::from_bytes(name, mime_for(path), &bytes))
}

/// Best-effort MIME type from the file extension
pub fn mime_for(path: &Path) -> &'static str {
  let ext = path
    .extension()
    .map(|e| e.to_string_lossy().to_lowercase())
    .unwrap_or_default();

  match ext.as_str() {
    "pdf" => "application/pdf",
    "csv" => "text/csv",
    "txt" => "text/plain",
    "png" => "image/png",
    "jpg" | "jpeg" => "image/jpeg",
    "gif" => "image/gif",
    "webp" => "image/webp",
    "doc" => "application/msword",
    "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "xls" => "application/vnd.ms-excel",
    "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    _ => "application/octet-stream",
  }
}

/// Human-readable size, as the admin form showed it
pub fn format_size(bytes: u64) -> String {
  if bytes >= 1024 * 1024 {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
  } else {
    format!("{:.2} KB", bytes as f64 / 1024.0)
  }
}
