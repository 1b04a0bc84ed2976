//! Plain-text extraction for prompts and keyword statistics.

use crate::dom::PageDocument;

/// Tags whose subtrees must not bleed into extracted text.
const STRIP_TAGS: &[&str] = &["script", "style"];

/// Extract the page's visible text.
///
/// Destructively removes every `<script>`/`<style>` subtree from the
/// document, then joins the remaining text nodes with single spaces,
/// collapsing any whitespace run (newlines, tabs, no-break spaces) to one
/// ASCII space and trimming the ends. Idempotent: extracting from text that
/// contains no tags returns it unchanged.
///
/// Callers that need the original document afterwards must extract as the
/// last read of the script/style nodes, or work on a clone.
pub fn page_text(doc: &mut PageDocument) -> String {
    doc.remove_subtrees(STRIP_TAGS);
    let joined = doc
        .text_nodes()
        .into_iter()
        .map(|(_, text)| text)
        .collect::<Vec<_>>()
        .join(" ");
    collapse_whitespace(&joined)
}

/// First `max` codepoints of `s` (`src` values and page text are arbitrary
/// UTF-8, so byte slicing is not safe).
pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Collapse every whitespace run to a single ASCII space and trim.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_ws = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            in_ws = true;
        } else {
            if in_ws && !out.is_empty() {
                out.push(' ');
            }
            in_ws = false;
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> String {
        let mut doc = PageDocument::parse(html);
        page_text(&mut doc)
    }

    #[test]
    fn script_content_does_not_bleed() {
        let text = extract(
            "<html><body><script>var secret = 1;</script><p>visible</p></body></html>",
        );
        assert_eq!(text, "visible");
    }

    #[test]
    fn style_content_does_not_bleed() {
        let text = extract("<html><body><style>p { color: red }</style><p>visible</p></body></html>");
        assert_eq!(text, "visible");
    }

    #[test]
    fn whitespace_runs_collapse_to_single_space() {
        let text = extract("<html><body><p>a\n\t b</p><p>  c  </p></body></html>");
        assert_eq!(text, "a b c");
    }

    #[test]
    fn nbsp_collapses_too() {
        let text = extract("<html><body><p>a\u{00A0}\u{00A0}b</p></body></html>");
        assert_eq!(text, "a b");
    }

    #[test]
    fn empty_body_yields_empty_text() {
        assert_eq!(extract("<html><body></body></html>"), "");
    }

    #[test]
    fn extraction_is_idempotent_on_plain_text() {
        let once = extract("<html><body><p>already   extracted text</p></body></html>");
        assert_eq!(collapse_whitespace(&once), once);
    }

    #[test]
    fn strip_is_destructive_on_the_document() {
        let mut doc =
            PageDocument::parse("<html><body><script>x</script><p>t</p></body></html>");
        let _ = page_text(&mut doc);
        assert!(doc.find_first("script").is_none());
    }
}
