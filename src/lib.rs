//! On-page SEO analysis for HTML.
//!
//! `seolens` runs a deterministic pass over a parsed HTML document,
//! extracting structural signals (title, meta description, heading tree,
//! image alt coverage, links, keyword occurrences) and folding them into a
//! bounded score with an ordered list of typed issues. Fix drafting for
//! missing metadata is delegated to an external [`Collaborator`]; the
//! analysis itself never depends on one succeeding.
//!
//! # Quick start
//!
//! ```rust
//! use seolens::{analyze, AnalysisRequest, Config, NoCollaborator, RequestOptions};
//!
//! let request = AnalysisRequest {
//!     content: "<html><head><title>Hi</title></head><body><h1>Hi</h1></body></html>".into(),
//!     content_type: "html".into(),
//!     config: RequestOptions::default(),
//! };
//! let report = analyze(&request, &NoCollaborator, &Config::default()).unwrap();
//! println!("score: {}", report.score);
//! ```

mod ai;
mod analytics;
mod dom;
mod error;
mod extract;
mod keyword;
mod links;
mod patch;
mod report;
mod rules;
mod suggest;

pub use ai::{decode_fix_reply, decode_typed_reply, AiError, AiTask, Collaborator, FixDraft, NoCollaborator};
pub use analytics::{BehaviorSample, SuggestionRecord};
pub use dom::PageDocument;
pub use error::EngineError;
pub use report::{
    AnalysisReport, Competitor, CompetitorAnalysis, Issue, KeywordAnalysis, LinkAnalysis,
    SemanticRelevance, Severity, Suggestion, SuggestionKind, WritingAssistance,
};

use serde::Deserialize;
use tracing::debug;

/// Rule thresholds, penalties, and prompt bounds.
///
/// Defaults are the pinned reference constants; every field has a builder
/// method for callers that tune individual rules.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    pub max_title_chars: usize,
    pub max_meta_chars: usize,
    pub penalty_missing_title: i32,
    pub penalty_long_title: i32,
    pub penalty_missing_meta: i32,
    pub penalty_long_meta: i32,
    pub penalty_missing_h1: i32,
    /// Flat penalty when more than one `<h1>` is present, regardless of count.
    pub penalty_multiple_h1: i32,
    pub penalty_missing_alt: i32,
    pub penalty_heading_skip: i32,
    pub penalty_no_internal_links: i32,
    pub penalty_keyword_not_in_title: i32,
    pub penalty_keyword_not_in_h1: i32,
    /// Max characters of an image `src` echoed into issue messages.
    pub src_display_chars: usize,
    /// Page-text excerpt bound for the meta-description prompt.
    pub meta_prompt_chars: usize,
    /// Page-text excerpt bound for alt-text prompts.
    pub alt_prompt_chars: usize,
    /// Page-text excerpt bound for the broader analysis prompts.
    pub insight_prompt_chars: usize,
    /// Score bonus when semantic relevance reaches the threshold.
    pub relevance_bonus: i32,
    pub relevance_bonus_threshold: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_title_chars: 60,
            max_meta_chars: 160,
            penalty_missing_title: 20,
            penalty_long_title: 5,
            penalty_missing_meta: 20,
            penalty_long_meta: 5,
            penalty_missing_h1: 15,
            penalty_multiple_h1: 10,
            penalty_missing_alt: 5,
            penalty_heading_skip: 5,
            penalty_no_internal_links: 2,
            penalty_keyword_not_in_title: 5,
            penalty_keyword_not_in_h1: 5,
            src_display_chars: 50,
            meta_prompt_chars: 2000,
            alt_prompt_chars: 1500,
            insight_prompt_chars: 3000,
            relevance_bonus: 5,
            relevance_bonus_threshold: 80,
        }
    }
}

impl Config {
    pub fn with_max_title_chars(mut self, n: usize) -> Self {
        self.max_title_chars = n;
        self
    }
    pub fn with_max_meta_chars(mut self, n: usize) -> Self {
        self.max_meta_chars = n;
        self
    }
    pub fn with_penalty_missing_title(mut self, p: i32) -> Self {
        self.penalty_missing_title = p;
        self
    }
    pub fn with_penalty_missing_meta(mut self, p: i32) -> Self {
        self.penalty_missing_meta = p;
        self
    }
    pub fn with_penalty_missing_h1(mut self, p: i32) -> Self {
        self.penalty_missing_h1 = p;
        self
    }
    pub fn with_penalty_multiple_h1(mut self, p: i32) -> Self {
        self.penalty_multiple_h1 = p;
        self
    }
    pub fn with_penalty_missing_alt(mut self, p: i32) -> Self {
        self.penalty_missing_alt = p;
        self
    }
    pub fn with_penalty_heading_skip(mut self, p: i32) -> Self {
        self.penalty_heading_skip = p;
        self
    }
    pub fn with_meta_prompt_chars(mut self, n: usize) -> Self {
        self.meta_prompt_chars = n;
        self
    }
    pub fn with_alt_prompt_chars(mut self, n: usize) -> Self {
        self.alt_prompt_chars = n;
        self
    }
    pub fn with_insight_prompt_chars(mut self, n: usize) -> Self {
        self.insight_prompt_chars = n;
        self
    }
    pub fn with_relevance_bonus(mut self, bonus: i32, threshold: i32) -> Self {
        self.relevance_bonus = bonus;
        self.relevance_bonus_threshold = threshold;
        self
    }
}

/// One analysis request, as handed over by the transport layer.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRequest {
    /// Raw HTML.
    pub content: String,
    /// Must be `"html"`; anything else short-circuits to a zero-score report.
    #[serde(rename = "contentType")]
    pub content_type: String,
    #[serde(default)]
    pub config: RequestOptions,
}

/// Per-request options. Secondary collaborator-backed reports are opt-in.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestOptions {
    pub target_keyword: Option<String>,
    pub semantic_relevance: bool,
    pub link_suggestions: bool,
    pub competitor_analysis: bool,
    pub writing_assistance: bool,
}

/// Analyze one HTML document.
///
/// The caller receives either a complete report or a single
/// [`EngineError::Internal`]; recoverable problems (unsupported content
/// type, malformed HTML, rule faults, collaborator failures) degrade inside
/// the report and never abort the analysis.
pub fn analyze(
    request: &AnalysisRequest,
    collaborator: &dyn Collaborator,
    config: &Config,
) -> Result<AnalysisReport, EngineError> {
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        analyze_inner(request, collaborator, config)
    }))
    .map_err(|panic| {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        EngineError::Internal(message)
    })
}

fn analyze_inner(
    request: &AnalysisRequest,
    collaborator: &dyn Collaborator,
    config: &Config,
) -> AnalysisReport {
    if request.content_type != "html" {
        debug!(content_type = request.content_type.as_str(), "short-circuit: unsupported content type");
        return AnalysisReport::unsupported_content_type(&request.content_type);
    }

    // The request owns its document exclusively; script/style removal during
    // text extraction is destructive, and the rules never look inside those
    // subtrees anyway.
    let mut doc = PageDocument::parse(&request.content);
    let page_text = extract::page_text(&mut doc);

    let outcome = rules::evaluate(&doc, config);
    let mut issues = outcome.issues;
    let mut penalty = outcome.penalty;

    let target_keyword = request
        .config
        .target_keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty());

    let keyword_analysis = target_keyword.map(|kw| {
        debug!(keyword = kw, "running keyword analysis");
        keyword::analyze_keyword(
            kw,
            &page_text,
            outcome.title_text.as_deref(),
            outcome.meta_content.as_deref(),
            &outcome.h1_texts,
        )
    });
    if let Some(analysis) = &keyword_analysis {
        let (keyword_issues, keyword_penalty) = rules::keyword_rules(analysis, config);
        issues.extend(keyword_issues);
        penalty += keyword_penalty;
    }

    let violations = suggest::FixableViolations {
        meta_missing: outcome.meta_missing,
        images_missing_alt: &outcome.images_missing_alt,
    };
    let mut suggestions = suggest::draft_fixes(collaborator, &violations, &page_text, config);

    let semantic = match (request.config.semantic_relevance, target_keyword) {
        (true, Some(kw)) => suggest::semantic_relevance(collaborator, kw, &page_text, config),
        _ => None,
    };
    let bonus = semantic
        .as_ref()
        .filter(|s| s.relevance_score >= config.relevance_bonus_threshold)
        .map(|_| config.relevance_bonus)
        .unwrap_or(0);

    if request.config.link_suggestions {
        suggestions.extend(suggest::link_suggestions(collaborator, &page_text, config));
    }

    let competitors = if request.config.competitor_analysis {
        let topic = target_keyword
            .or(outcome.title_text.as_deref())
            .unwrap_or("this page");
        suggest::competitor_analysis(collaborator, topic, &page_text, config)
    } else {
        None
    };

    let writing = if request.config.writing_assistance {
        suggest::writing_assistance(collaborator, &page_text, config).map(
            |(assistance, suggestion)| {
                suggestions.push(suggestion);
                assistance
            },
        )
    } else {
        None
    };

    let mut report = AnalysisReport::build(penalty, bonus, issues, suggestions);
    report.keyword_analysis = keyword_analysis;
    report.semantic_relevance = semantic;
    report.link_analysis = Some(outcome.links);
    report.competitor_analysis = competitors;
    report.writing_assistance = writing;
    report
}

/// Apply accepted suggestions to the original HTML and return the patched
/// serialization. Best-effort: inapplicable suggestions are skipped; with
/// none applicable the output is a structurally-equivalent serialization of
/// the input.
pub fn apply_suggestions(content: &str, suggestions: &[Suggestion]) -> String {
    let mut doc = PageDocument::parse(content);
    patch::apply_to_document(&mut doc, suggestions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(html: &str) -> AnalysisRequest {
        AnalysisRequest {
            content: html.to_string(),
            content_type: "html".to_string(),
            config: RequestOptions::default(),
        }
    }

    #[test]
    fn non_html_content_type_short_circuits() {
        let mut req = request("<html></html>");
        req.content_type = "markdown".to_string();
        let report = analyze(&req, &NoCollaborator, &Config::default()).unwrap();
        assert_eq!(report.score, 0);
        assert_eq!(report.issues.len(), 1);
        assert!(report.link_analysis.is_none(), "no further processing");
    }

    #[test]
    fn request_options_deserialize_from_camel_case_mapping() {
        let json = r#"{"targetKeyword": "rust", "semanticRelevance": true}"#;
        let options: RequestOptions = serde_json::from_str(json).unwrap();
        assert_eq!(options.target_keyword.as_deref(), Some("rust"));
        assert!(options.semantic_relevance);
        assert!(!options.competitor_analysis);
    }

    #[test]
    fn blank_target_keyword_is_ignored() {
        let mut req = request("<html><head><title>t</title></head><body><h1>h</h1></body></html>");
        req.config.target_keyword = Some("   ".to_string());
        let report = analyze(&req, &NoCollaborator, &Config::default()).unwrap();
        assert!(report.keyword_analysis.is_none());
    }

    #[test]
    fn config_builders_chain() {
        let config = Config::default()
            .with_penalty_missing_title(15)
            .with_max_title_chars(70)
            .with_relevance_bonus(10, 90);
        assert_eq!(config.penalty_missing_title, 15);
        assert_eq!(config.max_title_chars, 70);
        assert_eq!(config.relevance_bonus, 10);
        assert_eq!(config.relevance_bonus_threshold, 90);
    }
}
