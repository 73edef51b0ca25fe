//! Helpers for sanitizing names and messages before they reach disk,
//! the database, or tracing span attributes.

use std::path::Path;

/// Characters and sequences that may not appear in a stored filename.
const DANGEROUS_SEQUENCES: &[&str] = &["/", "\\", "..", "\0", ":", "*", "?", "\"", "<", ">", "|"];

/// Maximum length (in chars) of a filename stem after sanitization.
const MAX_STEM_CHARS: usize = 200;

/// Returns only the filename component of a path (no directory).
///
/// Used in span fields so logs carry the file name but not the full path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Makes an uploaded filename safe to use as a path component.
///
/// Every dangerous character or sequence is replaced by `_` and the stem is
/// cut to 200 characters. The extension is kept as-is.
pub fn sanitize_filename(filename: &str) -> String {
    let mut cleaned = filename.to_string();
    for seq in DANGEROUS_SEQUENCES {
        cleaned = cleaned.replace(seq, "_");
    }

    let (stem, ext) = match cleaned.rfind('.') {
        Some(pos) if pos > 0 => (&cleaned[..pos], &cleaned[pos..]),
        _ => (cleaned.as_str(), ""),
    };

    let stem: String = stem.chars().take(MAX_STEM_CHARS).collect();
    format!("{}{}", stem, ext)
}

/// Truncates `message` to at most `max_chars` characters, appending an
/// ellipsis when anything was cut.
pub fn truncate_message(message: &str, max_chars: usize) -> String {
    if message.chars().count() <= max_chars {
        return message.to_string();
    }
    let mut out: String = message.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
