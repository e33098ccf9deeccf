//! Structured logging for generation runs.

use tracing::{error, info, warn, Span};
use uuid::Uuid;

use flashgen_models::SourceKind;

/// Logger carrying the run id and source kind of one generation.
#[derive(Debug, Clone)]
pub struct PipelineLogger {
    run_id: String,
    source_kind: SourceKind,
}

impl PipelineLogger {
    /// Create a logger with a fresh run id.
    pub fn new(source_kind: SourceKind) -> Self {
        Self::with_run_id(Uuid::new_v4().to_string(), source_kind)
    }

    pub fn with_run_id(run_id: impl Into<String>, source_kind: SourceKind) -> Self {
        Self {
            run_id: run_id.into(),
            source_kind,
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            source_kind = %self.source_kind,
            "Generation started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            source_kind = %self.source_kind,
            "Generation progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            run_id = %self.run_id,
            source_kind = %self.source_kind,
            "Generation warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            run_id = %self.run_id,
            source_kind = %self.source_kind,
            "Generation failed: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            source_kind = %self.source_kind,
            "Generation completed: {}", message
        );
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source_kind
    }

    /// Span wrapping the whole run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "generation",
            run_id = %self.run_id,
            source_kind = %self.source_kind
        )
    }
}
