//! Internal/external link classification.

use url::Url;

use crate::dom::PageDocument;
use crate::report::LinkAnalysis;

/// Classify every `<a href>` on the page.
///
/// `http`-prefixed hrefs are external; hrefs with no scheme prefix (and not
/// `mailto:`) are internal. Anything else (`mailto:`, `tel:`, `javascript:`)
/// is neither. External domains are the parsed hosts of external hrefs,
/// deduplicated in document order; hrefs whose host cannot be parsed are
/// excluded from the domain list but still counted as external.
pub fn classify_links(doc: &PageDocument) -> LinkAnalysis {
    let mut internal_count = 0;
    let mut external_count = 0;
    let mut external_domains: Vec<String> = Vec::new();

    for anchor in doc.find_all("a") {
        let Some(href) = doc.attr(anchor, "href") else {
            continue;
        };
        if href.starts_with("http") {
            external_count += 1;
            if let Some(host) = host_of(href) {
                if !external_domains.iter().any(|d| d == &host) {
                    external_domains.push(host);
                }
            }
        } else if !has_scheme(href) && !href.starts_with("mailto:") {
            internal_count += 1;
        }
    }

    LinkAnalysis {
        internal_count,
        external_count,
        external_domains,
    }
}

/// Host component of an absolute URL; `None` when absent or unparseable.
fn host_of(href: &str) -> Option<String> {
    let url = Url::parse(href).ok()?;
    url.host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_string())
}

/// True if the href carries any `scheme:` prefix.
fn has_scheme(href: &str) -> bool {
    href.split_once(':')
        .map(|(scheme, _)| {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
        })
        .unwrap_or(false)
}
