/// Returns the default file extension for a MIME type, if one is known.
///
/// Matching is case-insensitive. Parameters such as `; charset=utf-8`
/// are not stripped, so only bare MIME types match.
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    let ext = match mime.to_ascii_lowercase().as_str() {
        "application/pdf" => "pdf",
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "text/plain" => "txt",
        "application/json" => "json",
        "application/zip" => "zip",
        "application/octet-stream" => "bin",
        _ => return None,
    };
    Some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_types() {
        assert_eq!(extension_for_mime("application/pdf"), Some("pdf"));
        assert_eq!(extension_for_mime("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for_mime("application/octet-stream"), Some("bin"));
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(extension_for_mime("IMAGE/PNG"), Some("png"));
    }

    #[test]
    fn unknown_and_empty() {
        assert_eq!(extension_for_mime("video/mp4"), None);
        assert_eq!(extension_for_mime(""), None);
    }
}
