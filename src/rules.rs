//! The structural rule engine: a stateless single pass of ordered,
//! independent rules, each contributing issues and an additive score
//! penalty.
//!
//! Rules run in a fixed order (title → meta description → h1 → images →
//! heading hierarchy → links); keyword rules are appended afterwards when a
//! target keyword was supplied. A rule that fails internally is logged and
//! rolled back so it contributes no issue and no penalty; the rest of the
//! pass always completes.

use thiserror::Error;
use tracing::warn;

use crate::dom::PageDocument;
use crate::extract::{collapse_whitespace, truncate_chars};
use crate::links::classify_links;
use crate::report::{Issue, KeywordAnalysis, LinkAnalysis};
use crate::Config;

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Internal failure of a single rule evaluation.
#[derive(Debug, Error)]
#[error("{0}")]
pub(crate) struct RuleFault(pub String);

/// Everything one rule pass produces, including the element captures the
/// keyword analyzer and suggestion orchestrator need afterwards.
#[derive(Debug)]
pub(crate) struct RuleOutcome {
    pub issues: Vec<Issue>,
    pub penalty: i32,
    /// The meta description is missing or empty (AI-fixable).
    pub meta_missing: bool,
    /// `src` of every image with missing/empty alt, in document order (AI-fixable).
    pub images_missing_alt: Vec<String>,
    pub links: LinkAnalysis,
    pub title_text: Option<String>,
    pub meta_content: Option<String>,
    pub h1_texts: Vec<String>,
}

/// Accumulator threaded through the rule pass.
struct Audit<'a> {
    doc: &'a PageDocument,
    config: &'a Config,
    outcome: RuleOutcome,
}

/// Run the structural rules over a parsed document.
pub(crate) fn evaluate(doc: &PageDocument, config: &Config) -> RuleOutcome {
    let mut audit = Audit {
        doc,
        config,
        outcome: RuleOutcome {
            issues: Vec::new(),
            penalty: 0,
            meta_missing: false,
            images_missing_alt: Vec::new(),
            links: LinkAnalysis {
                internal_count: 0,
                external_count: 0,
                external_domains: Vec::new(),
            },
            title_text: None,
            meta_content: None,
            h1_texts: Vec::new(),
        },
    };

    run_rule(&mut audit, "title", title_rule);
    run_rule(&mut audit, "meta_description", meta_rule);
    run_rule(&mut audit, "h1", h1_rule);
    run_rule(&mut audit, "image_alt", images_rule);
    run_rule(&mut audit, "heading_hierarchy", heading_hierarchy_rule);
    run_rule(&mut audit, "links", links_rule);

    audit.outcome
}

/// Evaluate one rule; on failure, log it and roll the accumulator back so
/// the rule contributes nothing.
fn run_rule(
    audit: &mut Audit<'_>,
    name: &str,
    rule: impl Fn(&mut Audit<'_>) -> Result<(), RuleFault>,
) {
    let issues_before = audit.outcome.issues.len();
    let penalty_before = audit.outcome.penalty;
    if let Err(fault) = rule(audit) {
        warn!(rule = name, %fault, "rule evaluation failed, contributes nothing");
        audit.outcome.issues.truncate(issues_before);
        audit.outcome.penalty = penalty_before;
    }
}

fn title_rule(audit: &mut Audit<'_>) -> Result<(), RuleFault> {
    let title = audit.doc.find_first("title");
    let text = title.map(|id| collapse_whitespace(&audit.doc.text_content(id)));

    match &text {
        None => {
            audit.outcome.issues.push(Issue::error("Missing <title> tag."));
            audit.outcome.penalty += audit.config.penalty_missing_title;
        }
        Some(t) if t.is_empty() => {
            audit.outcome.issues.push(Issue::error("Missing <title> tag."));
            audit.outcome.penalty += audit.config.penalty_missing_title;
        }
        Some(t) if t.chars().count() > audit.config.max_title_chars => {
            audit.outcome.issues.push(Issue::warning(format!(
                "Title is too long. Aim for under {} characters.",
                audit.config.max_title_chars
            )));
            audit.outcome.penalty += audit.config.penalty_long_title;
        }
        Some(_) => {}
    }
    audit.outcome.title_text = text;
    Ok(())
}

fn meta_rule(audit: &mut Audit<'_>) -> Result<(), RuleFault> {
    let meta = audit.doc.find_first_with_attr("meta", "name", "description");
    let content = meta.and_then(|id| audit.doc.attr(id, "content").map(|c| c.to_string()));

    match &content {
        Some(c) if !c.is_empty() => {
            if c.chars().count() > audit.config.max_meta_chars {
                audit.outcome.issues.push(Issue::warning(format!(
                    "Meta description is too long. Aim for under {} characters.",
                    audit.config.max_meta_chars
                )));
                audit.outcome.penalty += audit.config.penalty_long_meta;
            }
        }
        _ => {
            audit
                .outcome
                .issues
                .push(Issue::error("Missing <meta name=\"description\"> tag."));
            audit.outcome.penalty += audit.config.penalty_missing_meta;
            audit.outcome.meta_missing = true;
        }
    }
    audit.outcome.meta_content = content;
    Ok(())
}

fn h1_rule(audit: &mut Audit<'_>) -> Result<(), RuleFault> {
    let h1s = audit.doc.find_all("h1");
    audit.outcome.h1_texts = h1s
        .iter()
        .map(|&id| collapse_whitespace(&audit.doc.text_content(id)))
        .collect();

    if h1s.is_empty() {
        audit
            .outcome
            .issues
            .push(Issue::error("Missing <h1> tag. Every page needs one main heading."));
        audit.outcome.penalty += audit.config.penalty_missing_h1;
    } else if h1s.len() > 1 {
        // Flat penalty regardless of count; pinned by multiple_h1_flat_penalty.
        audit.outcome.issues.push(Issue::warning(format!(
            "Found {} <h1> tags. A page should only have one.",
            h1s.len()
        )));
        audit.outcome.penalty += audit.config.penalty_multiple_h1;
    }
    Ok(())
}

fn images_rule(audit: &mut Audit<'_>) -> Result<(), RuleFault> {
    for img in audit.doc.find_all("img") {
        let src = audit.doc.attr(img, "src").unwrap_or("unknown image");
        let alt_missing = audit
            .doc
            .attr(img, "alt")
            .map(|alt| alt.is_empty())
            .unwrap_or(true);
        if alt_missing {
            audit.outcome.issues.push(Issue::warning(format!(
                "Image is missing alt text. (src: {}...)",
                truncate_chars(src, audit.config.src_display_chars)
            )));
            audit.outcome.penalty += audit.config.penalty_missing_alt;
            audit.outcome.images_missing_alt.push(src.to_string());
        }
    }
    Ok(())
}

fn heading_hierarchy_rule(audit: &mut Audit<'_>) -> Result<(), RuleFault> {
    let mut last_level: u32 = 0;
    for heading in audit.doc.find_all_of(HEADING_TAGS) {
        let Some(tag) = audit.doc.tag_name(heading) else {
            continue;
        };
        let Some(level) = tag.strip_prefix('h').and_then(|n| n.parse::<u32>().ok()) else {
            warn!(tag, "unparseable heading level, skipping");
            continue;
        };
        if level > last_level + 1 {
            audit.outcome.issues.push(Issue::warning(format!(
                "Heading hierarchy skip: <{tag}> found after <h{last_level}>. Use <h{}> first.",
                last_level + 1
            )));
            audit.outcome.penalty += audit.config.penalty_heading_skip;
        }
        last_level = level;
    }
    Ok(())
}

fn links_rule(audit: &mut Audit<'_>) -> Result<(), RuleFault> {
    let links = classify_links(audit.doc);
    if links.internal_count == 0 {
        audit
            .outcome
            .issues
            .push(Issue::warning("No internal links found. Link related pages together."));
        audit.outcome.penalty += audit.config.penalty_no_internal_links;
    }
    if links.external_count == 0 {
        audit
            .outcome
            .issues
            .push(Issue::info("No external links found."));
    }
    audit.outcome.links = links;
    Ok(())
}

/// Keyword rules, appended after the structural pass when a target keyword
/// was supplied.
pub(crate) fn keyword_rules(analysis: &KeywordAnalysis, config: &Config) -> (Vec<Issue>, i32) {
    let mut issues = Vec::new();
    let mut penalty = 0;
    if !analysis.found_in_title {
        issues.push(Issue::info(format!(
            "Target keyword '{}' not found in <title>.",
            analysis.target_keyword
        )));
        penalty += config.penalty_keyword_not_in_title;
    }
    if !analysis.found_in_h1 {
        issues.push(Issue::info(format!(
            "Target keyword '{}' not found in <h1>.",
            analysis.target_keyword
        )));
        penalty += config.penalty_keyword_not_in_h1;
    }
    (issues, penalty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Severity;

    fn outcome(html: &str) -> RuleOutcome {
        let doc = PageDocument::parse(html);
        evaluate(&doc, &Config::default())
    }

    fn issues_with(outcome: &RuleOutcome, needle: &str) -> usize {
        outcome
            .issues
            .iter()
            .filter(|i| i.message.contains(needle))
            .count()
    }

    #[test]
    fn missing_title_is_exactly_one_error() {
        let out = outcome("<html><head></head><body><h1>x</h1><a href=\"/a\">a</a></body></html>");
        assert_eq!(issues_with(&out, "Missing <title>"), 1);
        // title 20 + meta 20, everything else satisfied
        assert_eq!(out.penalty, 40);
    }

    #[test]
    fn empty_title_counts_as_missing() {
        let out = outcome("<html><head><title>   </title></head><body></body></html>");
        assert_eq!(issues_with(&out, "Missing <title>"), 1);
    }

    #[test]
    fn long_title_is_a_warning() {
        let title = "x".repeat(61);
        let out = outcome(&format!(
            "<html><head><title>{title}</title></head><body></body></html>"
        ));
        assert_eq!(issues_with(&out, "Title is too long"), 1);
        let issue = out
            .issues
            .iter()
            .find(|i| i.message.contains("Title is too long"))
            .unwrap();
        assert_eq!(issue.severity, Severity::Warning);
    }

    #[test]
    fn missing_meta_sets_fixable_flag() {
        let out = outcome("<html><head><title>t</title></head><body></body></html>");
        assert!(out.meta_missing);
        assert_eq!(issues_with(&out, "Missing <meta"), 1);
    }

    #[test]
    fn empty_meta_content_counts_as_missing() {
        let out = outcome(
            r#"<html><head><meta name="description" content=""></head><body></body></html>"#,
        );
        assert!(out.meta_missing);
    }

    #[test]
    fn long_meta_is_a_warning_not_fixable() {
        let content = "y".repeat(161);
        let out = outcome(&format!(
            r#"<html><head><meta name="description" content="{content}"></head><body></body></html>"#
        ));
        assert!(!out.meta_missing);
        assert_eq!(issues_with(&out, "Meta description is too long"), 1);
    }

    #[test]
    fn missing_h1_is_an_error() {
        let out = outcome("<html><body><p>no headings</p></body></html>");
        assert_eq!(issues_with(&out, "Missing <h1>"), 1);
    }

    #[test]
    fn multiple_h1_flat_penalty() {
        // Pinned formula: flat 10 whether there are 2 or 4 extra h1s.
        let two = outcome("<html><body><h1>a</h1><h1>b</h1></body></html>");
        let four = outcome("<html><body><h1>a</h1><h1>b</h1><h1>c</h1><h1>d</h1></body></html>");
        let base = outcome("<html><body><h1>a</h1></body></html>");
        assert_eq!(two.penalty - base.penalty, 10);
        assert_eq!(four.penalty - base.penalty, 10);
        assert_eq!(issues_with(&four, "Found 4 <h1> tags"), 1);
    }

    #[test]
    fn empty_alt_is_treated_like_missing_alt() {
        let out = outcome(concat!(
            "<html><body>",
            r#"<img src="/no-alt.png">"#,
            r#"<img src="/empty-alt.png" alt="">"#,
            r#"<img src="/good.png" alt="described">"#,
            "</body></html>",
        ));
        assert_eq!(out.images_missing_alt.len(), 2);
        assert_eq!(
            out.images_missing_alt,
            vec!["/no-alt.png", "/empty-alt.png"]
        );
        assert_eq!(issues_with(&out, "missing alt text"), 2);
    }

    #[test]
    fn long_src_is_truncated_in_message() {
        let src = format!("/images/{}.png", "a".repeat(100));
        let out = outcome(&format!(r#"<html><body><img src="{src}"></body></html>"#));
        let issue = out
            .issues
            .iter()
            .find(|i| i.message.contains("missing alt text"))
            .unwrap();
        assert!(issue.message.len() < src.len() + 40);
        // Full src is still carried for the suggestion flow.
        assert_eq!(out.images_missing_alt[0], src);
    }

    #[test]
    fn heading_skip_h1_to_h3_flags_once() {
        let out = outcome("<html><body><h1>a</h1><h3>b</h3></body></html>");
        assert_eq!(issues_with(&out, "Heading hierarchy skip"), 1);
        assert_eq!(issues_with(&out, "<h3> found after <h1>"), 1);
    }

    #[test]
    fn contiguous_hierarchy_flags_nothing() {
        let out = outcome("<html><body><h1>a</h1><h2>b</h2><h3>c</h3></body></html>");
        assert_eq!(issues_with(&out, "Heading hierarchy skip"), 0);
    }

    #[test]
    fn h2_as_first_heading_is_a_skip() {
        // last_level starts at 0, so a leading h2 skips h1.
        let out = outcome("<html><body><h2>first</h2></body></html>");
        assert_eq!(issues_with(&out, "Heading hierarchy skip"), 1);
        assert_eq!(issues_with(&out, "<h2> found after <h0>"), 1);
    }

    #[test]
    fn level_always_advances_after_a_skip() {
        // h1, h4, h5: the h4 is a skip, but h5 after h4 is not.
        let out = outcome("<html><body><h1>a</h1><h4>b</h4><h5>c</h5></body></html>");
        assert_eq!(issues_with(&out, "Heading hierarchy skip"), 1);
    }

    #[test]
    fn zero_internal_links_is_a_small_warning() {
        let out = outcome("<html><body><h1>a</h1></body></html>");
        assert_eq!(issues_with(&out, "No internal links"), 1);
        let out_with = outcome(r#"<html><body><h1>a</h1><a href="/b">b</a></body></html>"#);
        assert_eq!(issues_with(&out_with, "No internal links"), 0);
        assert_eq!(out.penalty - out_with.penalty, 2);
    }

    #[test]
    fn zero_external_links_is_info_only() {
        let out = outcome(r#"<html><body><a href="/b">b</a></body></html>"#);
        let issue = out
            .issues
            .iter()
            .find(|i| i.message.contains("No external links"))
            .unwrap();
        assert_eq!(issue.severity, Severity::Info);
        // No penalty for it: missing title 20 + meta 20 + h1 15 only.
        assert_eq!(out.penalty, 55);
    }

    #[test]
    fn failed_rule_rolls_back_its_contributions() {
        let doc = PageDocument::parse("<html><body></body></html>");
        let config = Config::default();
        let mut audit = Audit {
            doc: &doc,
            config: &config,
            outcome: RuleOutcome {
                issues: Vec::new(),
                penalty: 0,
                meta_missing: false,
                images_missing_alt: Vec::new(),
                links: LinkAnalysis {
                    internal_count: 0,
                    external_count: 0,
                    external_domains: Vec::new(),
                },
                title_text: None,
                meta_content: None,
                h1_texts: Vec::new(),
            },
        };
        run_rule(&mut audit, "faulty", |audit| {
            audit.outcome.issues.push(Issue::error("half-applied"));
            audit.outcome.penalty += 50;
            Err(RuleFault("boom".to_string()))
        });
        assert!(audit.outcome.issues.is_empty());
        assert_eq!(audit.outcome.penalty, 0);
    }

    #[test]
    fn keyword_rules_flag_absent_title_and_h1() {
        let analysis = KeywordAnalysis {
            target_keyword: "rust".to_string(),
            found_in_title: false,
            found_in_meta: true,
            found_in_h1: false,
            body_count: 3,
            density: 1.5,
        };
        let (issues, penalty) = keyword_rules(&analysis, &Config::default());
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.severity == Severity::Info));
        assert_eq!(penalty, 10);
    }

    #[test]
    fn keyword_rules_quiet_when_present() {
        let analysis = KeywordAnalysis {
            target_keyword: "rust".to_string(),
            found_in_title: true,
            found_in_meta: false,
            found_in_h1: true,
            body_count: 3,
            density: 1.5,
        };
        let (issues, penalty) = keyword_rules(&analysis, &Config::default());
        assert!(issues.is_empty());
        assert_eq!(penalty, 0);
    }

    #[test]
    fn issue_order_follows_rule_order() {
        let out = outcome(concat!(
            "<html><head></head><body>",
            r#"<h2>skipped</h2><img src="/x.png">"#,
            "</body></html>",
        ));
        let positions: Vec<usize> = ["Missing <title>", "Missing <meta", "Missing <h1>", "missing alt", "Heading hierarchy", "No internal links"]
            .iter()
            .map(|needle| {
                out.issues
                    .iter()
                    .position(|i| i.message.contains(needle))
                    .unwrap_or_else(|| panic!("issue not found: {needle}"))
            })
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted, "issues must follow rule order");
    }
}
