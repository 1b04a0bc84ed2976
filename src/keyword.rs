//! Keyword presence and density statistics.

use crate::report::KeywordAnalysis;

/// Compute keyword statistics for a page.
///
/// Presence checks are case-insensitive substring matches against the title
/// text, the meta-description content, and the joined text of every `<h1>`.
/// `body_count` counts non-overlapping occurrences in the extracted page
/// text; density is that count over the total word count, as a percentage
/// rounded to 2 decimals. Empty page text yields a density of 0.
pub fn analyze_keyword(
    target_keyword: &str,
    page_text: &str,
    title_text: Option<&str>,
    meta_content: Option<&str>,
    h1_texts: &[String],
) -> KeywordAnalysis {
    let keyword = target_keyword.to_lowercase();
    let text = page_text.to_lowercase();

    let found_in = |haystack: Option<&str>| {
        haystack
            .map(|h| h.to_lowercase().contains(&keyword))
            .unwrap_or(false)
    };
    let h1_joined = h1_texts.join(" ").to_lowercase();

    let body_count = if keyword.is_empty() {
        0
    } else {
        text.matches(&keyword).count()
    };
    let total_words = text.split_whitespace().count();
    let density = if total_words == 0 {
        0.0
    } else {
        let pct = body_count as f64 / total_words as f64 * 100.0;
        (pct * 100.0).round() / 100.0
    };

    KeywordAnalysis {
        target_keyword: target_keyword.to_string(),
        found_in_title: found_in(title_text),
        found_in_meta: found_in(meta_content),
        found_in_h1: !h1_joined.is_empty() && h1_joined.contains(&keyword),
        body_count,
        density,
    }
}
