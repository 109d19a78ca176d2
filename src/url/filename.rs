/// Placeholder used when a URL has nothing after its last `/`
const INDEX_NAME: &str = "index";

/// Derives the local file name for a URL and a content suffix
///
/// Takes everything after the last `/` in the URL, substitutes `index` when
/// that is empty, and appends `extension` verbatim (including its leading dot).
///
/// Different URLs can map to the same name (`/a/logo.png` and `/b/logo.png`);
/// callers accept that later text writes win and later media downloads are
/// skipped.
///
/// # Examples
///
/// ```
/// use sumi_trawl::url::derive_file_name;
///
/// assert_eq!(derive_file_name("https://x.com/a/b.png", ".img"), "b.png.img");
/// assert_eq!(derive_file_name("https://x.com/", ".txt"), "index.txt");
/// ```
pub fn derive_file_name(url: &str, extension: &str) -> String {
    let tail = match url.rfind('/') {
        Some(idx) => &url[idx + 1..],
        None => url,
    };

    let stem = if tail.is_empty() { INDEX_NAME } else { tail };
    format!("{}{}", stem, extension)
}
