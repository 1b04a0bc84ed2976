//! Best-effort application of accepted suggestions to the original
//! document.
//!
//! Non-transactional: each suggestion is applied independently; a step
//! that cannot find its target is skipped with a log line and the rest
//! proceed. The serialized document is always returned; a document with
//! no applicable suggestions serializes unchanged.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::dom::PageDocument;
use crate::report::{Suggestion, SuggestionKind};

/// Path root every generated internal link points under.
const LINK_PATH_ROOT: &str = "/blog/";

static NON_SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());
static SEPARATOR_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s-]+").unwrap());

/// Apply accepted suggestions to the document and serialize it.
pub fn apply_to_document(doc: &mut PageDocument, suggestions: &[Suggestion]) -> String {
    for suggestion in suggestions {
        let applied = match suggestion.kind {
            SuggestionKind::AiMeta => apply_meta(doc, &suggestion.content),
            SuggestionKind::AiAltText => apply_alt(doc, suggestion),
            SuggestionKind::AiConclusion => apply_conclusion(doc, &suggestion.content),
            SuggestionKind::InternalLink => apply_internal_link(doc, suggestion),
        };
        if !applied {
            warn!(kind = ?suggestion.kind, "patch step skipped, target not applicable");
        }
    }
    doc.to_html()
}

/// Set the meta-description content, inserting the element if absent.
fn apply_meta(doc: &mut PageDocument, content: &str) -> bool {
    if let Some(meta) = doc.find_first_with_attr("meta", "name", "description") {
        return doc.set_attr(meta, "content", content);
    }
    let Some(head) = doc.find_first("head") else {
        return false;
    };
    doc.append_element(head, "meta", &[("name", "description"), ("content", content)])
        .is_some()
}

/// Set `alt` on the image the suggestion's `src` context points at.
///
/// An `AiAltText` suggestion without a context locator is a defect upstream;
/// here it is skipped rather than guessed at.
fn apply_alt(doc: &mut PageDocument, suggestion: &Suggestion) -> bool {
    let Some(src) = suggestion.context.as_deref().filter(|s| !s.is_empty()) else {
        return false;
    };
    let Some(img) = doc.find_first_with_attr("img", "src", src) else {
        return false;
    };
    doc.set_attr(img, "alt", &suggestion.content)
}

/// Append a closing paragraph to `<body>`.
fn apply_conclusion(doc: &mut PageDocument, conclusion: &str) -> bool {
    let Some(body) = doc.find_first("body") else {
        return false;
    };
    match doc.append_element(body, "p", &[]) {
        Some(p) => doc.append_text(p, conclusion).is_some(),
        None => false,
    }
}

/// Wrap the first visible occurrence of the anchor text in a generated
/// hyperlink. Skips silently when the text cannot be located or the
/// occurrence is already inside an anchor. Never double-links.
fn apply_internal_link(doc: &mut PageDocument, suggestion: &Suggestion) -> bool {
    let anchor_text = suggestion.content.trim();
    if anchor_text.is_empty() {
        return false;
    }
    let topic = suggestion.context.as_deref().unwrap_or(anchor_text);
    let slug = slugify(topic);
    if slug.is_empty() {
        return false;
    }
    let href = format!("{LINK_PATH_ROOT}{slug}");

    for (id, text) in doc.text_nodes() {
        if matches!(doc.parent_tag(id), Some("a" | "script" | "style" | "title" | "head")) {
            continue;
        }
        let Some((start, end)) = find_case_insensitive(&text, anchor_text) else {
            continue;
        };
        let before = &text[..start];
        let matched = text[start..end].to_string();
        let after = text[end..].to_string();

        if !doc.set_text_value(id, before) {
            return false;
        }
        let Some(a) = doc.insert_element_after(id, "a", &[("href", &href)]) else {
            return false;
        };
        doc.append_text(a, &matched);
        if !after.is_empty() {
            doc.insert_text_after(a, &after);
        }
        return true;
    }
    false
}

/// Case-insensitive substring search returning the byte range of the match
/// in `haystack`, preserving the original casing for the caller.
fn find_case_insensitive(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    if needle.is_empty() {
        return None;
    }
    for (start, _) in haystack.char_indices() {
        let mut rest = haystack[start..].chars();
        let mut matched_bytes = 0;
        let mut matched = true;
        for nch in needle.chars() {
            match rest.next() {
                Some(hch) if hch.to_lowercase().eq(nch.to_lowercase()) => {
                    matched_bytes += hch.len_utf8();
                }
                _ => {
                    matched = false;
                    break;
                }
            }
        }
        if matched {
            return Some((start, start + matched_bytes));
        }
    }
    None
}

/// Derive a URL slug from a topic: lowercase, non-word/space characters
/// stripped, separator runs collapsed to a single hyphen.
fn slugify(topic: &str) -> String {
    let lower = topic.to_lowercase();
    let stripped = NON_SLUG.replace_all(&lower, "");
    SEPARATOR_RUN
        .replace_all(stripped.trim(), "-")
        .to_string()
}
