//! File naming for staged uploads and artifacts
//!
//! Every name on disk is `<token>_<sanitized original name>`, where the
//! token is a simple-format v4 UUID.

/// Length of a simple-format UUID
const TOKEN_LEN: usize = 32;

/// Name used when sanitizing leaves nothing usable
const FALLBACK_NAME: &str = "file";

/// Strip everything except ASCII alphanumerics, `.`, `-` and `_`
pub fn sanitize_file_name(name: &str) -> String {
    // browsers may send a full client path
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();

    if cleaned.chars().all(|c| c == '.') {
        FALLBACK_NAME.to_string()
    } else {
        cleaned
    }
}

/// A fresh random token
pub(crate) fn new_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// `<token>_<sanitized name>`
pub(crate) fn unique_name(original_name: &str) -> String {
    format!("{}_{}", new_token(), sanitize_file_name(original_name))
}

/// Whether `reference` could name a file this crate created. Rejects path
/// separators, parent components and hidden names.
pub fn is_valid_reference(reference: &str) -> bool {
    !reference.is_empty()
        && !reference.starts_with('.')
        && reference
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

/// Recover the sanitized original name from a stored file name
pub fn original_name_of(reference: &str) -> &str {
    match reference.split_once('_') {
        Some((token, rest))
            if token.len() == TOKEN_LEN && token.chars().all(|c| c.is_ascii_hexdigit()) =>
        {
            rest
        }
        _ => reference,
    }
}
