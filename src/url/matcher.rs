use crate::config::LinkRuleConfig;

/// Checks if an href qualifies as a gallery sub-page
///
/// The href matches when it ends with any of `suffixes` or contains any of
/// `markers`. Matching is case-sensitive and applied to the raw attribute
/// text, before resolution.
///
/// # Examples
///
/// ```
/// use gallery_harvester::url::matches_link_rule;
///
/// let suffixes = [".html".to_string()];
/// let markers = ["NO.".to_string()];
///
/// assert!(matches_link_rule("page2.html", &suffixes, &markers));
/// assert!(matches_link_rule("/set/NO.17", &suffixes, &markers));
/// assert!(!matches_link_rule("page2.HTML", &suffixes, &markers));
/// assert!(!matches_link_rule("/about", &suffixes, &markers));
/// ```
pub fn matches_link_rule(href: &str, suffixes: &[String], markers: &[String]) -> bool {
    suffixes.iter().any(|suffix| href.ends_with(suffix.as_str()))
        || markers.iter().any(|marker| href.contains(marker.as_str()))
}

/// Configurable predicate selecting sub-page links on the index page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSelector {
    suffixes: Vec<String>,
    markers: Vec<String>,
}

impl LinkSelector {
    pub fn new<S, M>(suffixes: S, markers: M) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        Self {
            suffixes: suffixes.into_iter().map(Into::into).collect(),
            markers: markers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &LinkRuleConfig) -> Self {
        Self::new(config.suffixes.iter().cloned(), config.markers.iter().cloned())
    }

    /// Returns true if the raw href selects a sub-page
    pub fn matches(&self, href: &str) -> bool {
        matches_link_rule(href, &self.suffixes, &self.markers)
    }
}

impl Default for LinkSelector {
    fn default() -> Self {
        Self::from_config(&LinkRuleConfig::default())
    }
}
