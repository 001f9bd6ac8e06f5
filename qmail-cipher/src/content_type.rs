//! Filename-based helpers for attachments.
//!
//! Content types are advisory labels for the recipient's mail client and
//! never influence how a payload is encrypted.

use std::path::Path;

/// Fallback content type for unknown or missing extensions.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Extensions accepted by [`is_allowed_file`].
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[
    // Images
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".svg",
    // Documents
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".txt", ".rtf", ".odt", ".ods",
    ".odp",
    // Archives
    ".zip", ".rar", ".tar", ".gz", ".7z",
    // Other
    ".csv", ".json", ".xml",
];

const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".svg", ".ico", ".tiff", ".tif",
];

const CONTENT_TYPES: &[(&str, &str)] = &[
    (".7z", "application/x-7z-compressed"),
    (".bmp", "image/bmp"),
    (".css", "text/css"),
    (".csv", "text/csv"),
    (".doc", "application/msword"),
    (
        ".docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    (".eml", "message/rfc822"),
    (".gif", "image/gif"),
    (".gz", "application/gzip"),
    (".htm", "text/html"),
    (".html", "text/html"),
    (".ico", "image/vnd.microsoft.icon"),
    (".ics", "text/calendar"),
    (".jpeg", "image/jpeg"),
    (".jpg", "image/jpeg"),
    (".js", "text/javascript"),
    (".json", "application/json"),
    (".md", "text/markdown"),
    (".mp3", "audio/mpeg"),
    (".mp4", "video/mp4"),
    (".odp", "application/vnd.oasis.opendocument.presentation"),
    (".ods", "application/vnd.oasis.opendocument.spreadsheet"),
    (".odt", "application/vnd.oasis.opendocument.text"),
    (".pdf", "application/pdf"),
    (".png", "image/png"),
    (".ppt", "application/vnd.ms-powerpoint"),
    (
        ".pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    (".rar", "application/vnd.rar"),
    (".rtf", "application/rtf"),
    (".svg", "image/svg+xml"),
    (".tar", "application/x-tar"),
    (".tif", "image/tiff"),
    (".tiff", "image/tiff"),
    (".txt", "text/plain"),
    (".wav", "audio/wav"),
    (".webp", "image/webp"),
    (".xls", "application/vnd.ms-excel"),
    (
        ".xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    (".xml", "application/xml"),
    (".zip", "application/zip"),
];

/// Lowercased extension with its leading dot (`"Report.PDF"` → `".pdf"`).
/// Empty when the name has none.
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Infers a content type from the filename's extension.
pub fn guess_content_type(filename: &str) -> &'static str {
    let ext = extension_of(filename);
    CONTENT_TYPES
        .binary_search_by(|(candidate, _)| candidate.cmp(&ext.as_str()))
        .map(|i| CONTENT_TYPES[i].1)
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

/// Checks the filename against [`DEFAULT_ALLOWED_EXTENSIONS`].
pub fn is_allowed_file(filename: &str) -> bool {
    is_allowed_file_with(filename, DEFAULT_ALLOWED_EXTENSIONS)
}

/// Checks the filename against a caller-supplied extension list (with dots).
pub fn is_allowed_file_with(filename: &str, allowed: &[&str]) -> bool {
    let ext = extension_of(filename);
    !ext.is_empty() && allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext))
}

/// Whether a file is an image. A content type, when given, takes precedence
/// over the filename.
pub fn is_image_file(filename: Option<&str>, content_type: Option<&str>) -> bool {
    if let Some(content_type) = content_type.filter(|ct| !ct.is_empty()) {
        return content_type.starts_with("image/");
    }
    filename
        .map(|name| IMAGE_EXTENSIONS.contains(&extension_of(name).as_str()))
        .unwrap_or(false)
}

/// Human-readable size with one decimal place (`1536` → `"1.5 KB"`).
pub fn format_file_size(size: u64) -> String {
    let mut value = size as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if value < 1024.0 {
            return format!("{value:.1} {unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.1} TB")
}
