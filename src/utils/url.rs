//! URL sanitization for rendered attributes.

/// Schemes a rendered `href`/`src` may carry.
const ALLOWED_SCHEMES: [&str; 4] = ["http", "https", "mailto", "tel"];

/// Replacement for anything that fails the allow-list.
pub const BLOCKED_HREF: &str = "#";

/// Return `raw` when it parses as an absolute URL with an allowed scheme,
/// otherwise [`BLOCKED_HREF`].
///
/// Uses the `url` crate so scheme detection matches what a browser would
/// resolve, including mixed-case and whitespace-padded input:
///
/// ```ignore
/// sanitize_href("https://example.com")     -> "https://example.com"
/// sanitize_href(" MAILTO:me@example.com ") -> "MAILTO:me@example.com"
/// sanitize_href("javascript:alert(1)")     -> "#"
/// sanitize_href("/relative/path")          -> "#"
/// ```
pub fn sanitize_href(raw: &str) -> &str {
    let trimmed = raw.trim();
    match url::Url::parse(trimmed) {
        Ok(parsed) if ALLOWED_SCHEMES.contains(&parsed.scheme()) => trimmed,
        _ => BLOCKED_HREF,
    }
}
