use thiserror::Error;

/// Top-level analyzer failure.
///
/// Everything recoverable (unsupported content type, malformed HTML, rule
/// faults, collaborator failures) degrades inside a successful report;
/// `Internal` is the single signal for an unexpected fault, and it never
/// accompanies a partial report.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("internal analyzer fault: {0}")]
    Internal(String),
}
