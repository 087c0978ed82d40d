//! Utility functions with platform-specific implementations.

use std::borrow::Cow;

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// On native platforms, uses `SystemTime::now()`.
/// On WASM, uses `js_sys::Date::now()`.
#[cfg(not(target_arch = "wasm32"))]
pub fn time_now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(target_arch = "wasm32")]
pub fn time_now_millis() -> u64 {
    js_sys::Date::now() as u64
}

/// Decode bytes to a string.
///
/// 1. UTF-8 first (a BOM is handled by encoding_rs)
/// 2. If malformed, the hinted encoding (from a `<meta charset>`)
/// 3. Windows-1252 as a last resort, which never fails
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Find the charset named by `<meta charset="...">` or
/// `<meta http-equiv="Content-Type" content="...; charset=...">` in the first
/// kilobyte of a document.
pub fn extract_meta_charset(bytes: &[u8]) -> Option<&str> {
    let head = &bytes[..bytes.len().min(1024)];
    let head = std::str::from_utf8(head)
        .or_else(|e| std::str::from_utf8(&head[..e.valid_up_to()]))
        .ok()?;

    let lower = head.to_ascii_lowercase();
    let at = lower.find("charset=")? + "charset=".len();
    let rest = &head[at..];
    let rest = rest.trim_start_matches(['"', '\'']);
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(rest.len());
    (end > 0).then(|| &rest[..end])
}
