//! HTML document model and extraction
//!
//! This module handles parsing page text and pulling out:
//! - Sub-page links (from `<a href>` tags, filtered by a [`LinkSelector`])
//! - Image references (from `<img src>` tags, in document order)

use crate::url::{resolve_href, LinkSelector};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// One fetched and parsed HTML page
///
/// The parsed tree is not `Send`; keep documents out of scope across await
/// points and extract what is needed right after fetching.
#[derive(Debug)]
pub struct PageDocument {
    url: Url,
    text: String,
    html: Html,
}

impl PageDocument {
    /// Parses page text with the lenient HTML5 parser
    ///
    /// # Example
    ///
    /// ```
    /// use gallery_harvester::crawler::PageDocument;
    /// use url::Url;
    ///
    /// let url = Url::parse("https://example.com/").unwrap();
    /// let doc = PageDocument::parse(url, "<p><img src=a.png><img src=b.png>".to_string());
    /// assert_eq!(doc.attribute_values("img", "src"), vec!["a.png", "b.png"]);
    /// ```
    pub fn parse(url: Url, text: String) -> Self {
        let html = Html::parse_document(&text);
        Self { url, text, html }
    }

    /// URL the page was requested from; base for relative references
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Decoded page text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// All elements with the given tag name, in document order
    ///
    /// Returns nothing if `tag` is not a valid selector.
    pub fn elements_by_tag(&self, tag: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(tag) {
            Ok(selector) => self.html.select(&selector).collect(),
            Err(e) => {
                tracing::debug!("Invalid tag selector {:?}: {:?}", tag, e);
                Vec::new()
            }
        }
    }

    /// Values of `attribute` on every `tag` element that carries it
    pub fn attribute_values(&self, tag: &str, attribute: &str) -> Vec<&str> {
        self.elements_by_tag(tag)
            .into_iter()
            .filter_map(|element| element.value().attr(attribute))
            .collect()
    }
}

/// An image found on a sub-page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// 1-based position among the page's images; names the output file
    pub position: usize,

    /// Absolute image URL
    pub url: Url,
}

/// Extracts sub-page links from a page
///
/// Every `<a href>` is visited in document order; hrefs accepted by
/// `selector` are resolved against the page URL. Duplicates are kept.
///
/// # Example
///
/// ```
/// use gallery_harvester::crawler::{extract_sub_page_links, PageDocument};
/// use gallery_harvester::url::LinkSelector;
/// use url::Url;
///
/// let html = r#"<a href="NO.1.html">1</a><a href="/about">About</a>"#;
/// let doc = PageDocument::parse(Url::parse("https://example.com/set/").unwrap(), html.to_string());
/// let links = extract_sub_page_links(&doc, &LinkSelector::default());
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].as_str(), "https://example.com/set/NO.1.html");
/// ```
pub fn extract_sub_page_links(doc: &PageDocument, selector: &LinkSelector) -> Vec<Url> {
    doc.attribute_values("a", "href")
        .into_iter()
        .filter(|href| selector.matches(href))
        .filter_map(|href| resolve_href(doc.url(), href))
        .collect()
}

/// Extracts image references from a page
///
/// `<img>` elements without a non-empty `src` are skipped and do not consume
/// a position, so positions are always `1..=N`.
pub fn extract_image_refs(doc: &PageDocument) -> Vec<ImageRef> {
    doc.attribute_values("img", "src")
        .into_iter()
        .filter(|src| !src.is_empty())
        .filter_map(|src| resolve_href(doc.url(), src))
        .enumerate()
        .map(|(i, url)| ImageRef {
            position: i + 1,
            url,
        })
        .collect()
}
