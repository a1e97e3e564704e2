use blobbridge_protocol::DEFAULT_FILENAME;

/// Longest sanitized name in bytes. Leaves room under the usual 255-byte
/// component limit for the finalizer's partial-file decoration.
pub const MAX_FILENAME_BYTES: usize = 200;

/// Extensions longer than this are treated as part of the stem when
/// truncating.
const MAX_EXTENSION_BYTES: usize = 16;

/// Turns a requested filename into a single safe path component.
///
/// - Path separators (`/`, `\`, `:`) and control characters become `_`.
/// - Surrounding whitespace is trimmed.
/// - Empty names, `.` and `..` fall back to [`DEFAULT_FILENAME`].
/// - Names over [`MAX_FILENAME_BYTES`] are shortened at a char boundary,
///   keeping the extension.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if matches!(c, '/' | '\\' | ':') || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = cleaned.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        return DEFAULT_FILENAME.to_string();
    }
    truncate_name(trimmed)
}

fn truncate_name(name: &str) -> String {
    if name.len() <= MAX_FILENAME_BYTES {
        return name.to_string();
    }

    let (stem, ext) = match name.rfind('.') {
        Some(dot) if dot > 0 && name.len() - dot <= MAX_EXTENSION_BYTES => name.split_at(dot),
        _ => (name, ""),
    };
    let stem = floor_to_char_boundary(stem, MAX_FILENAME_BYTES - ext.len()).trim_end();
    if stem.is_empty() {
        return DEFAULT_FILENAME.to_string();
    }
    format!("{stem}{ext}")
}

fn floor_to_char_boundary(s: &str, max: usize) -> &str {
    let mut end = max.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
