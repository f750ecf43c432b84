//! Mapping from URLs to on-disk names
//!
//! Sub-page links become folder names and image URLs become positional file
//! names. Both are single path segments.

use url::Url;

/// Characters that are unsafe in a file or folder name on common filesystems
const UNSAFE_CHARS: [char; 9] = ['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Replaces every filesystem-unsafe character with `_`
///
/// # Examples
///
/// ```
/// use gallery_harvester::url::sanitize_segment;
///
/// assert_eq!(sanitize_segment("b?c:d.html"), "b_c_d.html");
/// assert_eq!(sanitize_segment("plain"), "plain");
/// ```
pub fn sanitize_segment(raw: &str) -> String {
    raw.chars()
        .map(|c| if UNSAFE_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Derives the destination folder name for a sub-page link
///
/// Takes the text after the last `/` of the link (query included), ignoring
/// trailing slashes, and sanitizes it. A name made only of dots is rewritten
/// so it can never address the parent directory.
///
/// # Examples
///
/// ```
/// use gallery_harvester::url::folder_name_for;
///
/// assert_eq!(folder_name_for("https://example.com/a/b?c:d.html"), "b_c_d.html");
/// assert_eq!(folder_name_for("https://example.com/set/NO.4/"), "NO.4");
/// ```
pub fn folder_name_for(link: &str) -> String {
    let segment = link
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();

    let name = sanitize_segment(segment);

    if name.is_empty() {
        "_".to_string()
    } else if name.chars().all(|c| c == '.') {
        name.replace('.', "_")
    } else {
        name
    }
}

/// Extracts the file extension of an image URL, including the leading dot
///
/// Only the last segment of the path component is considered, so query
/// strings and fragments never leak into the extension. Leading dots of the
/// segment do not start an extension. Returns an empty string when there is
/// no extension.
pub fn image_extension(url: &Url) -> String {
    let name = url.path().rsplit('/').next().unwrap_or_default();
    let stem_start = name.len() - name.trim_start_matches('.').len();

    match name[stem_start..].rfind('.') {
        Some(dot) => sanitize_segment(&name[stem_start + dot..]),
        None => String::new(),
    }
}

/// Builds the file name for the image at a 1-based position
///
/// # Examples
///
/// ```
/// use gallery_harvester::url::image_file_name;
/// use url::Url;
///
/// let url = Url::parse("https://img.example.com/p/4f2a.webp?w=800").unwrap();
/// assert_eq!(image_file_name(7, &url), "007.webp");
/// ```
pub fn image_file_name(position: usize, url: &Url) -> String {
    format!("{:03}{}", position, image_extension(url))
}
