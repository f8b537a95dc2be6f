//! Channel identifier normalization and URL construction
//!
//! Raw identifiers arrive in many shapes: "@handle", "/@handle", "@@handle",
//! "/channel/UC...", "//channel//@handle", percent-encoded handles, or a bare
//! channel ID. Normalization reduces all of them to a single stable form so
//! that overrides, cache entries, and stored channels agree on one key.

/// Strip one leading "channel/", "user/", or "c/" path segment, optionally
/// preceded by a slash, case-insensitive. The slash only counts together
/// with a keyword ("/foo" is untouched here).
fn strip_path_prefix(s: &str) -> Option<&str> {
    let rest = s.strip_prefix('/').unwrap_or(s);
    for prefix in ["channel/", "user/", "c/"] {
        if let Some(head) = rest.get(..prefix.len()) {
            if head.eq_ignore_ascii_case(prefix) {
                return Some(&rest[prefix.len()..]);
            }
        }
    }
    None
}

/// Strip one maximal leading run of slashes, '@' signs, and whitespace
fn strip_marker_run(s: &str) -> Option<&str> {
    let rest = s.trim_start_matches(|c: char| c == '/' || c == '@' || c.is_whitespace());
    if rest.len() < s.len() {
        Some(rest)
    } else {
        None
    }
}

/// Normalize an identifier while preserving its original casing
///
/// Steps: trim, percent-decode once (decode failure leaves the input as-is),
/// strip leading path prefixes and marker runs until nothing more strips,
/// then strip trailing slashes. Total: never fails, empty input yields an
/// empty string.
pub fn display_form(raw: &str) -> String {
    let trimmed = raw.trim();

    let decoded = match urlencoding::decode(trimmed) {
        Ok(cow) => cow.into_owned(),
        Err(_) => trimmed.to_string(),
    };

    let mut s = decoded.as_str();
    loop {
        if let Some(rest) = strip_path_prefix(s) {
            s = rest;
            continue;
        }
        if let Some(rest) = strip_marker_run(s) {
            s = rest;
            continue;
        }
        break;
    }

    s.trim_end_matches('/').to_string()
}

/// Normalize an identifier into its storage-key form
///
/// Same as [`display_form`] plus lowercasing, so lookups are
/// case-insensitive. Idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> String {
    display_form(raw).to_lowercase()
}

/// Whether a cleaned identifier has the stable channel-ID shape
/// ("UC" followed by exactly 22 word characters)
pub fn is_channel_id(s: &str) -> bool {
    s.len() == 24
        && s.starts_with("UC")
        && s[2..]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Build a canonical channel URL from an identifier in any raw form
///
/// Channel IDs use the /channel/ path; everything else is treated as a
/// handle and uses the @ form. Unusable input yields "#".
pub fn channel_url(identifier: &str) -> String {
    let clean = display_form(identifier);
    if clean.is_empty() {
        return "#".to_string();
    }

    if is_channel_id(&clean) {
        format!("https://www.youtube.com/channel/{}", clean)
    } else {
        format!("https://www.youtube.com/@{}", clean)
    }
}
