use encoding_rs::{Encoding, UTF_8};
use std::{borrow::Cow, path::Path};

use crate::error::{CleanError, Result};

/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

/// A cell is missing when it is empty or whitespace only.
pub fn cell_value(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Look up a codec by name. Accepts WHATWG labels plus the Python-style
/// aliases report configs tend to use (`cp932`, `latin-1`, ...).
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding> {
    let lowered = label.trim().to_ascii_lowercase();
    let canonical = match lowered.as_str() {
        "cp932" | "ms-932" | "mskanji" => "windows-31j",
        "utf_8" | "u8" => "utf-8",
        "latin-1" | "latin_1" | "l1" => "windows-1252",
        "euc_jp" => "euc-jp",
        "shiftjis" | "s_jis" => "shift_jis",
        other => other,
    };
    Encoding::for_label(canonical.as_bytes())
        .ok_or_else(|| CleanError::UnknownEncoding(label.to_string()))
}

/// Strictly decode `bytes`: any malformed sequence fails the whole file.
pub fn decode_text(path: &Path, bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let body = if encoding == UTF_8 {
        bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
    } else {
        bytes
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(Cow::into_owned)
        .ok_or_else(|| CleanError::Encoding {
            path: path.to_path_buf(),
            encoding: encoding.name().to_string(),
        })
}
