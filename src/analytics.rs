//! Well-formed tuples for the external analytics/persistence collaborator.
//!
//! The engine only produces these records; storing and aggregating them is
//! the collaborator's business. Nothing here is read back.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::report::SuggestionKind;

/// One page-behavior measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BehaviorSample {
    #[serde(rename = "pageUrl")]
    pub page_url: String,
    #[serde(rename = "timeOnPageSecs")]
    pub time_on_page_secs: f64,
    /// Always within 0–100.
    #[serde(rename = "scrollDepthPercent")]
    pub scroll_depth_percent: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "userAgent")]
    pub user_agent: String,
}

impl BehaviorSample {
    /// Build a sample, normalizing out-of-range scroll depth so the
    /// collaborator always receives a well-formed tuple.
    pub fn new(
        page_url: impl Into<String>,
        time_on_page_secs: f64,
        scroll_depth_percent: f64,
        timestamp: DateTime<Utc>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            page_url: page_url.into(),
            time_on_page_secs: time_on_page_secs.max(0.0),
            scroll_depth_percent: scroll_depth_percent.clamp(0.0, 100.0),
            timestamp,
            user_agent: user_agent.into(),
        }
    }
}

/// An audit record of one emitted suggestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionRecord {
    #[serde(rename = "pageUrl")]
    pub page_url: String,
    pub kind: SuggestionKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}
