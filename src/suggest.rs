//! Suggestion orchestration: turns AI-fixable violations into ranked,
//! typed suggestions, and produces the optional collaborator-backed
//! secondary reports.
//!
//! Calls run sequentially in rule-evaluation order. Every failure (quota,
//! empty reply, malformed payload) degrades to "no suggestion";
//! the underlying issue stands and nothing is fabricated in its place.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::ai::{decode_fix_reply, decode_typed_reply, AiTask, Collaborator, FixDraft};
use crate::extract::truncate_chars;
use crate::report::{
    CompetitorAnalysis, SemanticRelevance, Suggestion, SuggestionKind, WritingAssistance,
};
use crate::Config;

/// The AI-fixable violations one rule pass produced.
pub(crate) struct FixableViolations<'a> {
    pub meta_missing: bool,
    pub images_missing_alt: &'a [String],
}

/// Draft fixes for every AI-fixable violation, in rule order.
pub(crate) fn draft_fixes(
    collaborator: &dyn Collaborator,
    violations: &FixableViolations<'_>,
    page_text: &str,
    config: &Config,
) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    if violations.meta_missing {
        debug!("meta description missing, asking collaborator for a draft");
        let prompt = meta_prompt(page_text, config.meta_prompt_chars);
        if let Some(draft) = call_fix(collaborator, AiTask::MetaDescription, &prompt) {
            suggestions.push(Suggestion {
                kind: SuggestionKind::AiMeta,
                message: "An AI-generated meta description to fix this issue:".to_string(),
                content: draft.suggestion,
                explanation: draft.explanation,
                context: None,
                potential_score_gain: Some(config.penalty_missing_meta),
            });
        }
    }

    for src in violations.images_missing_alt {
        debug!(src = src.as_str(), "alt text missing, asking collaborator for a draft");
        let prompt = alt_prompt(src, page_text, config.alt_prompt_chars);
        if let Some(draft) = call_fix(collaborator, AiTask::AltText, &prompt) {
            suggestions.push(Suggestion {
                kind: SuggestionKind::AiAltText,
                message: format!(
                    "AI-generated alt text for \"{}\":",
                    truncate_chars(src, config.src_display_chars)
                ),
                content: draft.suggestion,
                explanation: draft.explanation,
                // Full src, untruncated; the patch applier matches on it.
                context: Some(src.clone()),
                potential_score_gain: Some(config.penalty_missing_alt),
            });
        }
    }

    suggestions
}

/// Collaborator-scored relevance of the page text to the target keyword.
/// Scores outside 0–100 are clamped.
pub(crate) fn semantic_relevance(
    collaborator: &dyn Collaborator,
    keyword: &str,
    page_text: &str,
    config: &Config,
) -> Option<SemanticRelevance> {
    let prompt = format!(
        "Rate how semantically relevant the following webpage text is to the \
         topic \"{keyword}\", from 0 (unrelated) to 100 (fully on-topic).\n\
         Respond with ONLY a JSON object: \
         {{\"relevance_score\": <int>, \"justification\": \"<one sentence>\"}}\n\n\
         Webpage text:\n\"{}\"",
        truncate_chars(page_text, config.insight_prompt_chars)
    );
    let mut relevance: SemanticRelevance =
        call_typed(collaborator, AiTask::SemanticRelevance, &prompt)?;
    relevance.relevance_score = relevance.relevance_score.clamp(0, 100);
    Some(relevance)
}

#[derive(Debug, Deserialize)]
struct LinkIdea {
    anchor_text: String,
    suggested_topic: String,
}

/// Internal-link opportunities; each becomes an `InternalLink` suggestion
/// carrying the anchor text as content and the topic as context.
pub(crate) fn link_suggestions(
    collaborator: &dyn Collaborator,
    page_text: &str,
    config: &Config,
) -> Vec<Suggestion> {
    let prompt = format!(
        "Suggest up to 3 internal links for the following webpage text. Pick \
         phrases that already appear in the text as anchor text, and for each \
         name the topic the link should point to.\n\
         Respond with ONLY a JSON array of \
         {{\"anchor_text\": \"...\", \"suggested_topic\": \"...\"}} objects.\n\n\
         Webpage text:\n\"{}\"",
        truncate_chars(page_text, config.insight_prompt_chars)
    );
    let Some(ideas) = call_typed::<Vec<LinkIdea>>(collaborator, AiTask::LinkSuggestions, &prompt)
    else {
        return Vec::new();
    };
    ideas
        .into_iter()
        .filter(|idea| !idea.anchor_text.trim().is_empty() && !idea.suggested_topic.trim().is_empty())
        .map(|idea| Suggestion {
            kind: SuggestionKind::InternalLink,
            message: format!("Link \"{}\" to a page about it:", idea.anchor_text),
            content: idea.anchor_text,
            explanation: None,
            context: Some(idea.suggested_topic),
            potential_score_gain: None,
        })
        .collect()
}

/// Collaborator-researched competitor overview.
pub(crate) fn competitor_analysis(
    collaborator: &dyn Collaborator,
    topic: &str,
    page_text: &str,
    config: &Config,
) -> Option<CompetitorAnalysis> {
    let prompt = format!(
        "List the top pages competing for the topic \"{topic}\".\n\
         Respond with ONLY a JSON object: {{\"competitors\": [{{\"link\": \
         \"...\", \"description\": \"...\", \"seoScore\": <int>}}]}}\n\n\
         Webpage text for context:\n\"{}\"",
        truncate_chars(page_text, config.insight_prompt_chars)
    );
    call_typed(collaborator, AiTask::CompetitorAnalysis, &prompt)
}

/// A replacement conclusion for the page, reported and also returned as an
/// `AiConclusion` suggestion so the patch applier can inline it.
pub(crate) fn writing_assistance(
    collaborator: &dyn Collaborator,
    page_text: &str,
    config: &Config,
) -> Option<(WritingAssistance, Suggestion)> {
    let prompt = format!(
        "Write a short closing paragraph that summarizes the following webpage \
         text and invites the reader to act. Respond with ONLY the paragraph.\n\n\
         Webpage text:\n\"{}\"",
        truncate_chars(page_text, config.insight_prompt_chars)
    );
    let draft = call_fix(collaborator, AiTask::Conclusion, &prompt)?;
    let assistance = WritingAssistance {
        conclusion: draft.suggestion.clone(),
    };
    let suggestion = Suggestion {
        kind: SuggestionKind::AiConclusion,
        message: "An AI-drafted closing paragraph:".to_string(),
        content: draft.suggestion,
        explanation: draft.explanation,
        context: None,
        potential_score_gain: None,
    };
    Some((assistance, suggestion))
}

/// One fix-shaped collaborator call; failures are logged and become `None`.
fn call_fix(collaborator: &dyn Collaborator, task: AiTask, prompt: &str) -> Option<FixDraft> {
    match collaborator
        .generate(task, prompt)
        .and_then(|reply| decode_fix_reply(&reply))
    {
        Ok(draft) => Some(draft),
        Err(err) => {
            warn!(task = %task, %err, "collaborator call failed, suggestion omitted");
            None
        }
    }
}

/// One typed collaborator call; failures are logged and become `None`.
fn call_typed<T: serde::de::DeserializeOwned>(
    collaborator: &dyn Collaborator,
    task: AiTask,
    prompt: &str,
) -> Option<T> {
    match collaborator
        .generate(task, prompt)
        .and_then(|reply| decode_typed_reply(&reply))
    {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(task = %task, %err, "collaborator call failed, report omitted");
            None
        }
    }
}

fn meta_prompt(page_text: &str, max_chars: usize) -> String {
    format!(
        "You are an expert SEO copywriter. Based on the following webpage \
         text, write a compelling meta description. It must be under 160 \
         characters, in active voice, and encourage clicks. Respond with ONLY \
         the meta description and no other text.\n\n\
         Webpage text:\n\"{}\"",
        truncate_chars(page_text, max_chars)
    )
}

fn alt_prompt(src: &str, page_text: &str, max_chars: usize) -> String {
    format!(
        "You are an expert SEO copywriter. Generate a concise, descriptive \
         alt text for an image. The image's filename is: \"{}\", a strong \
         hint. The surrounding page text is: \"{}\". Use both to infer the \
         image's content. Respond with ONLY the descriptive alt text \
         (e.g., \"A red car driving on a highway\").",
        filename_hint(src),
        truncate_chars(page_text, max_chars)
    )
}

/// Derive a hint from the image path: last segment, query string stripped,
/// separators spaced, extension dropped.
fn filename_hint(src: &str) -> String {
    let last = src.rsplit('/').next().unwrap_or(src);
    let last = last.split('?').next().unwrap_or(last);
    let stem = match last.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => last,
    };
    stem.replace(['-', '_'], " ")
}
