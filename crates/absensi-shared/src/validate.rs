//! Pure form validators.
//!
//! These are a client-side fast path only; the server re-validates every
//! submission and stays authoritative.

use url::Url;

use crate::constants::DRIVE_ALLOWED_HOSTS;

/// Accepts Google Drive / Docs share links of known shapes.
///
/// Rules:
/// - absolute URL, `https` only;
/// - host must be `drive.google.com` or `docs.google.com`;
/// - the path must match a known share shape (file, open-by-id, folder
///   variants, direct download, or a Docs/Sheets/Slides document);
/// - shapes that carry an identifier (file / open / folders / uc) must
///   actually have one, either in the path segment after the `d` /
///   `folders` marker or as an `id` query parameter.
///
/// Anything malformed fails closed.
pub fn is_acceptable_drive_link(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw.trim()) else {
        return false;
    };

    if url.scheme() != "https" {
        return false;
    }

    let Some(host) = url.host_str() else {
        return false;
    };
    if !DRIVE_ALLOWED_HOSTS.contains(&host) {
        return false;
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();

    let id_in_query = url
        .query_pairs()
        .any(|(key, value)| key == "id" && !value.is_empty());

    // Identifier embedded in the path segment right after `marker`.
    let id_after = |marker: &str| {
        segments
            .iter()
            .position(|s| *s == marker)
            .and_then(|i| segments.get(i + 1))
            .map(|s| !s.is_empty())
            .unwrap_or(false)
    };

    match segments.first().copied() {
        // https://drive.google.com/file/d/<id>/view
        Some("file") => id_after("d") || id_in_query,
        // https://drive.google.com/open?id=<id>
        Some("open") => id_in_query,
        // https://drive.google.com/uc?id=<id>&export=download
        Some("uc") => id_after("d") || id_in_query,
        // https://drive.google.com/drive/folders/<id>
        // https://drive.google.com/drive/u/0/folders/<id>
        Some("drive") => id_after("folders") || id_in_query,
        // Old-style folder link: https://drive.google.com/folderview?id=<id>
        Some("folderview") => id_in_query,
        // Docs / Sheets / Slides documents.
        Some("document") | Some("spreadsheets") | Some("presentation") => {
            segments.get(1).copied() == Some("d")
        }
        _ => false,
    }
}

/// Trimmed character count is at least `min`.
pub fn is_min_length_text(s: &str, min: usize) -> bool {
    s.trim().chars().count() >= min
}

/// Normalize a student-id input by dropping every non-digit character.
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// A non-empty string of ASCII digits.
pub fn is_valid_nim(nim: &str) -> bool {
    !nim.is_empty() && nim.chars().all(|c| c.is_ascii_digit())
}
