//! URL classification: interception eligibility, HTML detection, and
//! origin whitelist matching. No state.

use bridgeview_common::SurfaceError;
use regex::Regex;
use reqwest::header::{HeaderMap, CONTENT_TYPE};

pub const MIME_TEXT_HTML: &str = "text/html";
pub const MIME_UNKNOWN: &str = "application/octet-stream";

/// Whether a URL should be kept away from the interception fetch.
///
/// True when the URL is blank, does not start with `http` (or starts with
/// `www`), or contains a literal `|`. Navigation itself is unaffected.
pub fn looks_invalid(url: &str) -> bool {
    url.trim().is_empty()
        || !(url.starts_with("http") && !url.starts_with("www"))
        || url.contains('|')
}

/// HTTP redirect status codes (300, 301, 302, 303, 307, 308).
pub fn is_redirect_status(status: u16) -> bool {
    matches!(status, 300..=303 | 307 | 308)
}

/// The declared content type, or [`MIME_UNKNOWN`] when absent or unreadable.
pub fn content_type(headers: &HeaderMap) -> &str {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(MIME_UNKNOWN)
}

/// Whether a fetched response should get script spliced into it.
pub fn requires_injection(headers: &HeaderMap, is_redirect: bool) -> bool {
    if is_redirect {
        return false;
    }
    content_type(headers).starts_with(MIME_TEXT_HTML)
}

/// `scheme://authority` of a URL, with empty strings for missing parts.
///
/// Both parts are taken verbatim from the input: case, default ports and
/// non-ASCII hosts are not normalised, so patterns match what the page
/// actually asked for.
pub fn origin_of(url: &str) -> String {
    const NO_ORIGIN: &str = "://";
    if url::Url::parse(url).is_err() {
        return NO_ORIGIN.to_string();
    }
    let raw = url.trim_matches(|c: char| c <= ' ');
    let Some((scheme, rest)) = raw.split_once(':') else {
        return NO_ORIGIN.to_string();
    };
    let authority = rest
        .strip_prefix("//")
        .and_then(|r| r.split(['/', '?', '#']).next())
        .unwrap_or("");
    format!("{scheme}://{authority}")
}

/// A compiled matcher over `scheme://authority`. Matches the whole string.
#[derive(Debug, Clone)]
pub struct OriginPattern {
    source: String,
    regex: Regex,
}

impl OriginPattern {
    pub fn compile(pattern: &str) -> Result<Self, SurfaceError> {
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
            SurfaceError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// The pattern as configured.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, origin: &str) -> bool {
        self.regex.is_match(origin)
    }
}

impl PartialEq for OriginPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// True iff any pattern matches the URL's `scheme://authority`.
pub fn matches_origin(url: &str, patterns: &[OriginPattern]) -> bool {
    let origin = origin_of(url);
    patterns.iter().any(|p| p.matches(&origin))
}

/// The configured origin whitelist. Replaced wholesale, never edited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OriginWhitelist {
    patterns: Vec<OriginPattern>,
}

impl OriginWhitelist {
    /// Compile every pattern; the first invalid one fails the whole list.
    pub fn compile<I, S>(patterns: I) -> Result<Self, SurfaceError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| OriginPattern::compile(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn matches(&self, url: &str) -> bool {
        matches_origin(url, &self.patterns)
    }

    pub fn patterns(&self) -> &[OriginPattern] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers_with(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    // -- looks_invalid --

    #[test]
    fn http_urls_are_valid() {
        assert!(!looks_invalid("http://x"));
        assert!(!looks_invalid("https://example.com/path?q=1"));
    }

    #[test]
    fn www_prefix_is_invalid() {
        assert!(looks_invalid("wwwhttp://x"));
        assert!(looks_invalid("www.example.com"));
    }

    #[test]
    fn blank_is_invalid() {
        assert!(looks_invalid(""));
        assert!(looks_invalid("   "));
    }

    #[test]
    fn non_http_schemes_are_invalid() {
        assert!(looks_invalid("about:blank"));
        assert!(looks_invalid("file:///etc/hosts"));
        assert!(looks_invalid("javascript:alert(1)"));
        assert!(looks_invalid("data:text/html,<h1>x</h1>"));
    }

    #[test]
    fn pipe_is_invalid() {
        assert!(looks_invalid("https://example.com/a|b"));
    }

    // -- requires_injection --

    #[test]
    fn html_requires_injection() {
        assert!(requires_injection(&headers_with("text/html"), false));
        assert!(requires_injection(
            &headers_with("text/html; charset=ISO-8859-1"),
            false
        ));
    }

    #[test]
    fn redirects_never_require_injection() {
        assert!(!requires_injection(&headers_with("text/html"), true));
    }

    #[test]
    fn missing_content_type_defaults_to_unknown() {
        let headers = HeaderMap::new();
        assert_eq!(content_type(&headers), MIME_UNKNOWN);
        assert!(!requires_injection(&headers, false));
    }

    #[test]
    fn non_html_does_not_require_injection() {
        assert!(!requires_injection(&headers_with("application/json"), false));
        assert!(!requires_injection(&headers_with("text/plain"), false));
        assert!(!requires_injection(&headers_with("image/png"), false));
    }

    #[test]
    fn redirect_statuses() {
        for status in [300, 301, 302, 303, 307, 308] {
            assert!(is_redirect_status(status), "{status}");
        }
        for status in [200, 204, 304, 305, 404, 500] {
            assert!(!is_redirect_status(status), "{status}");
        }
    }

    // -- origins --

    #[test]
    fn origin_of_keeps_port_and_userinfo() {
        assert_eq!(origin_of("https://example.com/a/b?c"), "https://example.com");
        assert_eq!(origin_of("http://localhost:8080/x"), "http://localhost:8080");
        assert_eq!(origin_of("https://user@host.io/"), "https://user@host.io");
    }

    #[test]
    fn origin_of_is_not_normalised() {
        assert_eq!(origin_of("HTTPS://Example.COM:443/x"), "HTTPS://Example.COM:443");
        assert_eq!(origin_of("https://bücher.de/"), "https://bücher.de");
        assert_eq!(origin_of("https://a.test?q=1"), "https://a.test");

        let whitelist = OriginWhitelist::compile([r"https://example\.com"]).unwrap();
        assert!(!whitelist.matches("https://example.com:443/"));
        assert!(!whitelist.matches("https://EXAMPLE.com/"));
    }

    #[test]
    fn origin_of_opaque_and_relative() {
        assert_eq!(origin_of("intent:#Intent;end"), "intent://");
        assert_eq!(origin_of("not a url"), "://");
    }

    #[test]
    fn whitelist_rejects_other_origin() {
        let whitelist = OriginWhitelist::compile([r"https://example\.com"]).unwrap();
        assert!(!whitelist.matches("https://evil.com"));
        assert!(whitelist.matches("https://example.com/login"));
    }

    #[test]
    fn pattern_must_match_whole_origin() {
        let whitelist = OriginWhitelist::compile([r"https://example\.com"]).unwrap();
        assert!(!whitelist.matches("https://example.com.evil.net/"));
        assert!(!whitelist.matches("http://example.com/"));
    }

    #[test]
    fn wildcard_patterns() {
        let whitelist = OriginWhitelist::compile([r"https://.*\.example\.com", "about://.*"]).unwrap();
        assert!(whitelist.matches("https://cdn.example.com/app.js"));
        assert!(!whitelist.matches("https://example.com/"));
    }

    #[test]
    fn any_match_is_monotonic() {
        let narrow = OriginWhitelist::compile([r"https://example\.com"]).unwrap();
        let wide =
            OriginWhitelist::compile([r"ftp://nothing", r"https://example\.com", r"https://x\.y"])
                .unwrap();
        let url = "https://example.com/page";
        assert!(narrow.matches(url));
        assert!(wide.matches(url));
    }

    #[test]
    fn empty_whitelist_matches_nothing() {
        let whitelist = OriginWhitelist::default();
        assert!(whitelist.is_empty());
        assert!(!whitelist.matches("https://example.com"));
    }

    #[test]
    fn invalid_pattern_fails_whole_list() {
        let err = OriginWhitelist::compile([r"https://ok\.com", "https://(bad"]).unwrap_err();
        assert!(matches!(err, SurfaceError::InvalidPattern { ref pattern, .. } if pattern == "https://(bad"));
    }

    #[test]
    fn pattern_keeps_source() {
        let pattern = OriginPattern::compile(r"https://a\.b").unwrap();
        assert_eq!(pattern.as_str(), r"https://a\.b");
        assert!(pattern.matches("https://a.b"));
    }
}
