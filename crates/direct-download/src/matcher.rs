use std::collections::HashSet;

use reqwest::Url;

/// File extensions intercepted by default.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "pdf", "zip", "rar", "7z", "tar", "gz", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "csv",
    "txt", "json", "png", "jpg", "jpeg", "gif", "webp", "svg", "mp3", "mp4", "mov", "apk", "ipa",
    "dmg", "exe", "msi",
];

/// Decides whether a navigation should become a direct download.
#[derive(Debug, Clone)]
pub struct DownloadMatcher {
    extensions: HashSet<String>,
}

impl DownloadMatcher {
    /// Creates a matcher for the given extensions (without the leading dot).
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Returns `true` if the URL's path ends in a downloadable extension.
    ///
    /// Query strings and fragments are ignored; only http(s) URLs match.
    pub fn matches(&self, url: &str) -> bool {
        let Ok(url) = Url::parse(url) else {
            return false;
        };
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }
        self.matches_url(&url)
    }

    pub(crate) fn matches_url(&self, url: &Url) -> bool {
        let Some(segment) = url.path_segments().and_then(|s| s.last()) else {
            return false;
        };
        match segment.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => {
                self.extensions.contains(&ext.to_ascii_lowercase())
            }
            _ => false,
        }
    }
}

impl Default for DownloadMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_known_extension() {
        let m = DownloadMatcher::default();
        assert!(m.matches("https://example.com/files/report.pdf"));
        assert!(m.matches("http://example.com/a/b/archive.ZIP"));
    }

    #[test]
    fn ignores_query_and_fragment() {
        let m = DownloadMatcher::default();
        assert!(m.matches("https://example.com/report.pdf?token=abc#page=2"));
        assert!(!m.matches("https://example.com/view?file=report.pdf"));
    }

    #[test]
    fn rejects_pages_and_directories() {
        let m = DownloadMatcher::default();
        assert!(!m.matches("https://example.com/"));
        assert!(!m.matches("https://example.com/index.html"));
        assert!(!m.matches("https://example.com/docs/"));
        assert!(!m.matches("https://example.com/.pdf"));
    }

    #[test]
    fn rejects_non_http_schemes() {
        let m = DownloadMatcher::default();
        assert!(!m.matches("blob:https://example.com/1234"));
        assert!(!m.matches("file:///tmp/report.pdf"));
        assert!(!m.matches("not a url"));
    }

    #[test]
    fn custom_extensions_normalized() {
        let m = DownloadMatcher::new([".EPUB", "mobi", ""]);
        assert!(m.matches("https://example.com/book.epub"));
        assert!(m.matches("https://example.com/book.mobi"));
        assert!(!m.matches("https://example.com/book.pdf"));
    }
}
