use crate::{UrlError, UrlResult};
use url::Url;

/// Parses and validates the seed URL given at startup
///
/// The seed must be an absolute `http` or `https` URL with a host. The
/// returned value is serialized by the `url` crate, which is the same form
/// discovered links take, so the seed and links to it dedup against each other.
///
/// # Examples
///
/// ```
/// use sumi_trawl::url::parse_seed_url;
///
/// let seed = parse_seed_url("https://example.com").unwrap();
/// assert_eq!(seed.as_str(), "https://example.com/");
/// assert!(parse_seed_url("ftp://example.com/").is_err());
/// ```
pub fn parse_seed_url(seed: &str) -> UrlResult<Url> {
    let url = Url::parse(seed.trim()).map_err(|e| UrlError::Parse(format!("{}: {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost(seed.to_string()));
    }

    Ok(url)
}

/// Resolves an attribute value (href/src) against the page URL
///
/// Returns None if the value should be ignored:
/// - empty values and fragment-only anchors
/// - javascript:, mailto:, tel: and data: schemes
/// - values that fail to resolve
/// - anything that is not HTTP(S) after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => Some(absolute_url),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/docs/page").unwrap()
    }

    #[test]
    fn test_seed_is_serialized() {
        let url = parse_seed_url("  https://example.com  ").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn test_seed_rejects_relative() {
        assert!(matches!(parse_seed_url("/just/a/path"), Err(UrlError::Parse(_))));
    }

    #[test]
    fn test_seed_rejects_non_http() {
        assert!(matches!(
            parse_seed_url("file:///etc/passwd"),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        assert_eq!(
            resolve_link("other", &base_url()).unwrap().as_str(),
            "https://example.com/docs/other"
        );
        assert_eq!(
            resolve_link("/root", &base_url()).unwrap().as_str(),
            "https://example.com/root"
        );
        assert_eq!(
            resolve_link("//cdn.example.com/a.png", &base_url())
                .unwrap()
                .as_str(),
            "https://cdn.example.com/a.png"
        );
    }

    #[test]
    fn test_resolve_skips_special_schemes() {
        for href in [
            "javascript:void(0)",
            "JavaScript:alert(1)",
            "mailto:a@example.com",
            "tel:+123",
            "data:image/png;base64,AAAA",
            "#top",
            "   ",
        ] {
            assert!(resolve_link(href, &base_url()).is_none(), "{}", href);
        }
    }

    #[test]
    fn test_resolve_skips_unresolvable() {
        assert!(resolve_link("http://[::1", &base_url()).is_none());
        assert!(resolve_link("ftp://example.com/file", &base_url()).is_none());
    }
}
