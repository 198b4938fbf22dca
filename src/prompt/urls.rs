use std::path::Path;

use crate::core::errors::ApiError;

/// The closed-world URL allow-list, loaded once at startup and read-only for
/// the process lifetime.
///
/// `verify` compares full untruncated strings. A candidate that matches
/// nothing is dropped by the caller; this type never invents or rewrites a
/// URL.
#[derive(Debug, Clone)]
pub struct TrustedUrls {
    urls: Vec<String>,
}

impl TrustedUrls {
    pub fn load(path: &Path) -> Result<Self, ApiError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ApiError::Config(format!(
                "cannot read trusted URL list {}: {e}",
                path.display()
            ))
        })?;
        Ok(Self::from_lines(&contents))
    }

    pub fn from_lines(contents: &str) -> Self {
        let urls = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();
        Self { urls }
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Exact full-string match first; failing that, a single deterministic
    /// tolerance for a doubled path separator. Anything else returns `None`.
    pub fn verify(&self, candidate: &str) -> Option<&str> {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return None;
        }

        if let Some(url) = self.urls.iter().find(|url| *url == candidate) {
            return Some(url);
        }

        let collapsed = collapse_separators(candidate);
        self.urls
            .iter()
            .find(|url| collapse_separators(url) == collapsed)
            .map(String::as_str)
    }

    /// The list rendered for the system prompt, one URL per line.
    pub fn as_block(&self) -> String {
        self.urls.join("\n")
    }
}

/// Collapse runs of `/` in the path part, leaving the `scheme://` prefix
/// untouched.
fn collapse_separators(url: &str) -> String {
    let (scheme, rest) = match url.split_once("://") {
        Some((scheme, rest)) => (Some(scheme), rest),
        None => (None, url),
    };

    let mut collapsed = String::with_capacity(rest.len());
    let mut last_was_slash = false;
    for c in rest.chars() {
        if c == '/' {
            if last_was_slash {
                continue;
            }
            last_was_slash = true;
        } else {
            last_was_slash = false;
        }
        collapsed.push(c);
    }

    match scheme {
        Some(scheme) => format!("{scheme}://{collapsed}"),
        None => collapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const LONG_URL: &str = "https://docs.example.com/manuals/site-4/V112/operation/noise-modes/V112-3.45MW-noise-curves-rev07.pdf";

    fn sample() -> TrustedUrls {
        TrustedUrls::from_lines(&format!(
            "https://docs.example.com/manuals/a.pdf\n\
             {LONG_URL}\n\
             \n\
             # comment line\n\
             https://docs.example.com/specs/b.pdf\n"
        ))
    }

    #[test]
    fn exact_match_returns_the_stored_url() {
        let urls = sample();
        assert_eq!(urls.verify(LONG_URL), Some(LONG_URL));
    }

    #[test]
    fn doubled_separator_matches_the_canonical_url() {
        let urls = sample();
        let near = "https://docs.example.com/manuals//a.pdf";
        assert_eq!(
            urls.verify(near),
            Some("https://docs.example.com/manuals/a.pdf")
        );
    }

    #[test]
    fn unknown_url_is_dropped_not_guessed() {
        let urls = sample();
        assert_eq!(urls.verify("https://docs.example.com/manuals/c.pdf"), None);
        assert_eq!(urls.verify(""), None);
    }

    #[test]
    fn prefix_of_a_trusted_url_does_not_match() {
        let urls = sample();
        // Full-string comparison: a truncated candidate must not resolve.
        let prefix = &LONG_URL[..LONG_URL.len() - 10];
        assert_eq!(urls.verify(prefix), None);
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        let urls = sample();
        assert_eq!(urls.len(), 3);
    }

    #[test]
    fn block_lists_urls_verbatim() {
        let urls = sample();
        let block = urls.as_block();
        assert!(block.contains(LONG_URL));
        assert_eq!(block.lines().count(), 3);
    }

    #[test]
    fn loads_from_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "https://docs.example.com/one.pdf").unwrap();
        writeln!(file, "https://docs.example.com/two.pdf").unwrap();

        let urls = TrustedUrls::load(file.path()).unwrap();
        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = TrustedUrls::load(Path::new("/nonexistent/urls.txt")).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }
}
