use blobbridge_transfer::sanitize_filename;
use percent_encoding::percent_decode_str;
use reqwest::Url;

/// Extracts the filename from a `Content-Disposition` header value.
///
/// An RFC 5987 `filename*=charset''value` parameter wins over a plain
/// `filename=` one. Returns `None` if neither yields a non-empty name.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for param in header.split(';') {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"');
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                // charset'language'percent-encoded-value
                let encoded = value.splitn(3, '\'').nth(2).unwrap_or(value);
                let decoded = percent_decode_str(encoded).decode_utf8_lossy();
                if !decoded.is_empty() {
                    extended = Some(decoded.into_owned());
                }
            }
            "filename" if !value.is_empty() => plain = Some(value.to_string()),
            _ => {}
        }
    }

    extended.or(plain)
}

/// Returns the percent-decoded last non-empty path segment of `url`.
pub fn filename_from_url(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let decoded = percent_decode_str(segment).decode_utf8_lossy();
    if decoded.is_empty() {
        None
    } else {
        Some(decoded.into_owned())
    }
}

/// Picks the staged filename for a direct download.
///
/// Tries the disposition header, then the URL, then the default name;
/// the result is always sanitized.
pub fn derive_filename(disposition: Option<&str>, url: &Url) -> String {
    let raw = disposition
        .and_then(filename_from_disposition)
        .or_else(|| filename_from_url(url))
        .unwrap_or_default();
    sanitize_filename(&raw)
}
