//! URL handling module for Gallery Harvester
//!
//! This module provides href resolution, the sub-page link rule, and the
//! mapping from URLs to on-disk folder and file names.

mod matcher;
mod naming;

// Re-export main functions
pub use matcher::{matches_link_rule, LinkSelector};
pub use naming::{folder_name_for, image_extension, image_file_name, sanitize_segment};

use url::Url;

/// Resolves a raw attribute value against the page it was found on
///
/// Uses standard URL joining, so absolute, protocol-relative, path-relative
/// and fragment-only references all resolve. Returns None if the reference
/// cannot be joined (e.g. an unparsable port).
///
/// # Examples
///
/// ```
/// use gallery_harvester::url::resolve_href;
/// use url::Url;
///
/// let page = Url::parse("https://example.com/gallery/index").unwrap();
/// let link = resolve_href(&page, "NO.12.html").unwrap();
/// assert_eq!(link.as_str(), "https://example.com/gallery/NO.12.html");
/// ```
pub fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    match base.join(href) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::debug!("Cannot resolve {:?} against {}: {}", href, base, e);
            None
        }
    }
}
