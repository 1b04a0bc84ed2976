//! Report model: typed issues, suggestions, and the aggregate analysis report.
//!
//! Everything here is plain data: constructed once per request, serialized
//! for the caller, never mutated after [`AnalysisReport::build`] returns.

use serde::{Deserialize, Serialize};

/// Severity classification for a detected issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A detected on-page problem.
///
/// Issues accumulate in rule-evaluation order (title → meta → h1 → images →
/// heading hierarchy → links → keyword) and are never re-sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl Issue {
    pub(crate) fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            line: None,
        }
    }

    pub(crate) fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub(crate) fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub(crate) fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }
}

/// Which fix a suggestion represents.
///
/// Closed set; every consumer matches exhaustively so a new kind cannot be
/// silently ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    /// AI-drafted meta description replacing a missing/empty one.
    AiMeta,
    /// AI-drafted alt text for a specific image; `context` carries the `src`.
    AiAltText,
    /// AI-drafted closing paragraph; appended to `<body>` when applied.
    AiConclusion,
    /// Internal-link opportunity; `content` is the anchor text, `context`
    /// the suggested topic the slug is derived from.
    InternalLink,
}

/// A proposed fix, optionally AI-authored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    /// Human-readable label for the suggestion.
    pub message: String,
    /// The proposed replacement text.
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Locator tying the suggestion back to a specific element.
    /// `AiAltText` suggestions always carry the originating image `src` here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(rename = "potentialScoreGain", skip_serializing_if = "Option::is_none")]
    pub potential_score_gain: Option<i32>,
}

/// Keyword statistics, computed once per request when a target keyword is
/// supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordAnalysis {
    #[serde(rename = "targetKeyword")]
    pub target_keyword: String,
    #[serde(rename = "foundInTitle")]
    pub found_in_title: bool,
    #[serde(rename = "foundInMeta")]
    pub found_in_meta: bool,
    #[serde(rename = "foundInH1")]
    pub found_in_h1: bool,
    #[serde(rename = "bodyCount")]
    pub body_count: usize,
    /// Percentage of body words that are the keyword, rounded to 2 decimals.
    pub density: f64,
}

/// Collaborator-scored relevance of the page text to the target keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticRelevance {
    pub relevance_score: i32,
    pub justification: String,
}

/// Deterministic link statistics for the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkAnalysis {
    pub internal_count: usize,
    pub external_count: usize,
    /// Unique external hosts in document order; empty hosts excluded.
    pub external_domains: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub link: String,
    pub description: String,
    #[serde(rename = "seoScore")]
    pub seo_score: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorAnalysis {
    pub competitors: Vec<Competitor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WritingAssistance {
    pub conclusion: String,
}

/// The aggregate result of one analysis request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Final score, clamped to `[0, 100]`.
    pub score: i32,
    pub issues: Vec<Issue>,
    pub suggestions: Vec<Suggestion>,
    #[serde(rename = "keywordAnalysis", skip_serializing_if = "Option::is_none")]
    pub keyword_analysis: Option<KeywordAnalysis>,
    #[serde(rename = "semanticRelevance", skip_serializing_if = "Option::is_none")]
    pub semantic_relevance: Option<SemanticRelevance>,
    #[serde(rename = "linkAnalysis", skip_serializing_if = "Option::is_none")]
    pub link_analysis: Option<LinkAnalysis>,
    #[serde(rename = "competitorAnalysis", skip_serializing_if = "Option::is_none")]
    pub competitor_analysis: Option<CompetitorAnalysis>,
    #[serde(rename = "writingAssistance", skip_serializing_if = "Option::is_none")]
    pub writing_assistance: Option<WritingAssistance>,
}

impl AnalysisReport {
    /// Fold the accumulated penalty (and any bonus) into the final score.
    ///
    /// Deltas are simple additive integers; the clamp to `[0, 100]` is
    /// applied exactly once, here, so cascading penalties never interact
    /// mid-pass.
    pub(crate) fn build(
        penalty: i32,
        bonus: i32,
        issues: Vec<Issue>,
        suggestions: Vec<Suggestion>,
    ) -> Self {
        let score = (100 - penalty + bonus).clamp(0, 100);
        Self {
            score,
            issues,
            suggestions,
            keyword_analysis: None,
            semantic_relevance: None,
            link_analysis: None,
            competitor_analysis: None,
            writing_assistance: None,
        }
    }

    /// The short-circuit report for a request whose content type is not HTML.
    pub(crate) fn unsupported_content_type(content_type: &str) -> Self {
        Self {
            score: 0,
            issues: vec![Issue::error(format!(
                "Unsupported contentType \"{content_type}\". Only \"html\" is supported."
            ))],
            suggestions: Vec::new(),
            keyword_analysis: None,
            semantic_relevance: None,
            link_analysis: None,
            competitor_analysis: None,
            writing_assistance: None,
        }
    }
}
