//! The generative-AI collaborator contract.
//!
//! The engine defines exactly what it sends (a task label and a bounded
//! text prompt), what it expects back, and how each failure degrades. The
//! provider behind the trait (HTTP client, SDK, test stub) is out of
//! scope; implementations only need to return the model's raw text reply.

use serde::Deserialize;
use thiserror::Error;

/// Label identifying which call a prompt belongs to, for diagnosability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiTask {
    MetaDescription,
    AltText,
    SemanticRelevance,
    LinkSuggestions,
    CompetitorAnalysis,
    Conclusion,
}

impl AiTask {
    pub fn label(self) -> &'static str {
        match self {
            AiTask::MetaDescription => "meta_description",
            AiTask::AltText => "alt_text",
            AiTask::SemanticRelevance => "semantic_relevance",
            AiTask::LinkSuggestions => "link_suggestions",
            AiTask::CompetitorAnalysis => "competitor_analysis",
            AiTask::Conclusion => "conclusion",
        }
    }
}

impl std::fmt::Display for AiTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Ways a collaborator call can fail. Every variant degrades to "no
/// suggestion"; none aborts an analysis.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("provider quota exceeded")]
    QuotaExceeded,

    #[error("provider returned an empty reply")]
    EmptyReply,

    #[error("malformed provider payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("provider error: {0}")]
    Provider(String),
}

/// An external generative-AI provider.
///
/// `Send + Sync` so a transport-layer implementation may share one client
/// across requests; the engine itself issues calls sequentially.
pub trait Collaborator: Send + Sync {
    /// Run one generation task and return the model's raw text reply.
    fn generate(&self, task: AiTask, prompt: &str) -> Result<String, AiError>;
}

/// A collaborator that declines every task. Analyses run fine without AI:
/// issues are still reported, suggestions are simply absent.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCollaborator;

impl Collaborator for NoCollaborator {
    fn generate(&self, _task: AiTask, _prompt: &str) -> Result<String, AiError> {
        Err(AiError::Provider("no collaborator configured".to_string()))
    }
}

/// A decoded fix reply: the proposed text plus an optional rationale.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FixDraft {
    pub suggestion: String,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Decode a fix-shaped reply, tolerating the missing envelope.
///
/// The expected shape is a JSON object with a `suggestion` field and an
/// optional `explanation`. A reply that skipped the envelope (a bare
/// string, or prose that is not JSON at all) is still usable: the whole
/// reply becomes the suggestion and a generic explanation is synthesized.
/// Only an empty reply is rejected.
pub fn decode_fix_reply(reply: &str) -> Result<FixDraft, AiError> {
    let trimmed = reply.trim().trim_matches('"').trim();
    if trimmed.is_empty() {
        return Err(AiError::EmptyReply);
    }
    if let Ok(draft) = serde_json::from_str::<FixDraft>(reply) {
        if draft.suggestion.trim().is_empty() {
            return Err(AiError::EmptyReply);
        }
        return Ok(draft);
    }
    Ok(FixDraft {
        suggestion: trimmed.to_string(),
        explanation: Some("Drafted from the page content.".to_string()),
    })
}

/// Decode a strictly-typed payload (relevance scores, link suggestions,
/// competitor lists). No raw-text fallback here: free text cannot fill a
/// typed report, so a malformed reply is a collaborator failure.
pub fn decode_typed_reply<T: serde::de::DeserializeOwned>(reply: &str) -> Result<T, AiError> {
    if reply.trim().is_empty() {
        return Err(AiError::EmptyReply);
    }
    Ok(serde_json::from_str(strip_code_fence(reply))?)
}

/// Providers often wrap JSON in a Markdown code fence; strip it before
/// decoding.
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.trim().strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_reply_decodes() {
        let draft = decode_fix_reply(
            r#"{"suggestion": "A concise description.", "explanation": "Active voice."}"#,
        )
        .unwrap();
        assert_eq!(draft.suggestion, "A concise description.");
        assert_eq!(draft.explanation.as_deref(), Some("Active voice."));
    }

    #[test]
    fn structured_reply_without_explanation_decodes() {
        let draft = decode_fix_reply(r#"{"suggestion": "Just the text."}"#).unwrap();
        assert_eq!(draft.suggestion, "Just the text.");
        assert!(draft.explanation.is_none());
    }

    #[test]
    fn unstructured_reply_falls_back_to_whole_string() {
        let draft = decode_fix_reply("A plain prose meta description.").unwrap();
        assert_eq!(draft.suggestion, "A plain prose meta description.");
        assert!(draft.explanation.is_some(), "fallback synthesizes a rationale");
    }

    #[test]
    fn quoted_reply_is_unquoted() {
        let draft = decode_fix_reply("\"Quoted by the model.\"").unwrap();
        assert_eq!(draft.suggestion, "Quoted by the model.");
    }

    #[test]
    fn empty_reply_is_an_error() {
        assert!(matches!(decode_fix_reply("   "), Err(AiError::EmptyReply)));
        assert!(matches!(
            decode_fix_reply(r#"{"suggestion": ""}"#),
            Err(AiError::EmptyReply)
        ));
    }

    #[test]
    fn typed_reply_decodes_through_code_fence() {
        #[derive(Deserialize)]
        struct Score {
            relevance_score: i32,
        }
        let reply = "```json\n{\"relevance_score\": 85}\n```";
        let score: Score = decode_typed_reply(reply).unwrap();
        assert_eq!(score.relevance_score, 85);
    }

    #[test]
    fn typed_reply_rejects_prose() {
        #[derive(Deserialize)]
        struct Score {
            #[allow(dead_code)]
            relevance_score: i32,
        }
        let result: Result<Score, _> = decode_typed_reply("very relevant, trust me");
        assert!(matches!(result, Err(AiError::Malformed(_))));
    }

    #[test]
    fn no_collaborator_declines() {
        let result = NoCollaborator.generate(AiTask::MetaDescription, "prompt");
        assert!(matches!(result, Err(AiError::Provider(_))));
    }
}
