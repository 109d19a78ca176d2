//! HTML parser for extracting page text, links and media
//!
//! This module turns a fetched HTML document into:
//! - The rendered body text (no markup)
//! - Links to follow (from `<a href>`)
//! - Media sources (from `<img>` and `<video>`)
//! - The page title, for logging

use crate::crawler::media::MediaKind;
use crate::url::resolve_link;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Elements whose text content is never part of the rendered page text
const NON_RENDERED: &[&str] = &["script", "style", "noscript", "template"];

/// A media element found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    /// Absolute source URL
    pub url: String,
    /// Image or video
    pub kind: MediaKind,
}

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Body text with markup removed and whitespace collapsed
    pub text: String,

    /// All links found on the page (absolute URLs, document order)
    pub links: Vec<String>,

    /// All images and videos with a resolvable source (document order)
    pub media: Vec<MediaRef>,
}

/// Parses HTML content and extracts text, links and media
///
/// # Link Extraction Rules
///
/// - Every `<a href="...">` is resolved against `base_url`
/// - `javascript:`, `mailto:`, `tel:`, `data:` and fragment-only hrefs are skipped
/// - Hrefs that do not resolve to an HTTP(S) URL are skipped
/// - Duplicates are kept; the visited set deals with them
///
/// # Media Extraction Rules
///
/// - `<img src="...">` yields one image
/// - `<video src="...">` yields one video; without `src` the first
///   `<source src="...">` child is used
/// - Elements without a resolvable source are skipped
///
/// # Example
///
/// ```
/// use sumi_trawl::crawler::parse_page;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_page(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn parse_page(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        text: extract_text(&document),
        links: extract_links(&document, base_url),
        media: extract_media(&document, base_url),
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = selector("title")?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts the rendered body text
///
/// Text nodes are joined with single spaces and all whitespace runs are
/// collapsed, so block boundaries always separate words.
fn extract_text(document: &Html) -> String {
    let body_selector = match selector("body") {
        Some(s) => s,
        None => return String::new(),
    };
    let body = match document.select(&body_selector).next() {
        Some(body) => body,
        None => return String::new(),
    };

    let mut words: Vec<&str> = Vec::new();
    for node in body.descendants() {
        let text = match node.value().as_text() {
            Some(text) => text,
            None => continue,
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map_or(false, |el| NON_RENDERED.contains(&el.name()))
        });
        if hidden {
            continue;
        }

        words.extend(text.split_whitespace());
    }

    words.join(" ")
}

/// Extracts all valid links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();

    if let Some(a_selector) = selector("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url.to_string());
                }
            }
        }
    }

    links
}

/// Extracts image and video sources from the HTML document
fn extract_media(document: &Html, base_url: &Url) -> Vec<MediaRef> {
    let mut media = Vec::new();

    if let Some(img_selector) = selector("img") {
        for element in document.select(&img_selector) {
            if let Some(url) = element
                .value()
                .attr("src")
                .and_then(|src| resolve_link(src, base_url))
            {
                media.push(MediaRef {
                    url: url.to_string(),
                    kind: MediaKind::Image,
                });
            }
        }
    }

    if let Some(video_selector) = selector("video") {
        for element in document.select(&video_selector) {
            if let Some(url) = video_source(element, base_url) {
                media.push(MediaRef {
                    url: url.to_string(),
                    kind: MediaKind::Video,
                });
            }
        }
    }

    media
}

/// Source of a `<video>`: its own `src`, else the first `<source src>` child
fn video_source(video: ElementRef<'_>, base_url: &Url) -> Option<Url> {
    if let Some(src) = video.value().attr("src") {
        return resolve_link(src, base_url);
    }

    let source_selector = selector("source[src]")?;
    let source = video
        .select(&source_selector)
        .filter_map(|source| source.value().attr("src"))
        .find_map(|src| resolve_link(src, base_url));
    source
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/blog/post").unwrap()
    }

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>  Test Page  </title></head><body></body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(parsed.title, Some("Test Page".to_string()));
    }

    #[test]
    fn test_no_title() {
        let parsed = parse_page("<html><head></head><body></body></html>", &base_url());
        assert_eq!(parsed.title, None);
    }

    #[test]
    fn test_text_strips_markup() {
        let html = r#"<html><head><title>T</title></head><body>
            <h1>Hello</h1>
            <p>First   paragraph with <b>bold</b> text.</p>
            <p>Second</p>
        </body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(
            parsed.text,
            "Hello First paragraph with bold text. Second"
        );
    }

    #[test]
    fn test_text_skips_script_and_style() {
        let html = r#"<html><body>
            <script>var hidden = 1;</script>
            <style>body { color: red; }</style>
            <p>Visible</p>
        </body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(parsed.text, "Visible");
    }

    #[test]
    fn test_title_is_not_body_text() {
        let html = r#"<html><head><title>Only title</title></head><body></body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(parsed.text, "");
    }

    #[test]
    fn test_extract_relative_and_absolute_links() {
        let html = r#"<html><body>
            <a href="next">Relative</a>
            <a href="/root">Rooted</a>
            <a href="https://other.com/page">Absolute</a>
        </body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(
            parsed.links,
            vec![
                "https://example.com/blog/next".to_string(),
                "https://example.com/root".to_string(),
                "https://other.com/page".to_string(),
            ]
        );
    }

    #[test]
    fn test_anchor_without_href_is_ignored() {
        let html = r#"<html><body><a name="top">Anchor</a><a href="/x">X</a></body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(parsed.links, vec!["https://example.com/x".to_string()]);
    }

    #[test]
    fn test_mixed_valid_and_invalid_links() {
        let html = r#"
            <html>
            <body>
                <a href="/valid">Valid</a>
                <a href="javascript:alert('no')">Invalid</a>
                <a href="mailto:test@example.com">Invalid</a>
                <a href="http://[broken">Invalid</a>
                <a href="/another-valid">Valid</a>
            </body>
            </html>
        "#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(parsed.links.len(), 2);
    }

    #[test]
    fn test_duplicate_links_are_kept() {
        let html = r#"<html><body><a href="/a">1</a><a href="/a">2</a></body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(parsed.links.len(), 2);
    }

    #[test]
    fn test_extract_images() {
        let html = r#"<html><body>
            <img src="/static/logo.png">
            <img alt="no source">
            <img src="https://cdn.example.com/cat.jpg">
        </body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert_eq!(
            parsed.media,
            vec![
                MediaRef {
                    url: "https://example.com/static/logo.png".to_string(),
                    kind: MediaKind::Image,
                },
                MediaRef {
                    url: "https://cdn.example.com/cat.jpg".to_string(),
                    kind: MediaKind::Image,
                },
            ]
        );
    }

    #[test]
    fn test_extract_video_src_and_source_child() {
        let html = r#"<html><body>
            <video src="clip.mp4"></video>
            <video controls>
                <source src="/media/fallback.webm" type="video/webm">
                <source src="/media/other.mp4" type="video/mp4">
            </video>
            <video></video>
        </body></html>"#;
        let parsed = parse_page(html, &base_url());
        let videos: Vec<&str> = parsed
            .media
            .iter()
            .filter(|m| m.kind == MediaKind::Video)
            .map(|m| m.url.as_str())
            .collect();
        assert_eq!(
            videos,
            vec![
                "https://example.com/blog/clip.mp4",
                "https://example.com/media/fallback.webm",
            ]
        );
    }

    #[test]
    fn test_data_uri_image_is_skipped() {
        let html = r#"<html><body><img src="data:image/png;base64,AAAA"></body></html>"#;
        let parsed = parse_page(html, &base_url());
        assert!(parsed.media.is_empty());
    }
}
