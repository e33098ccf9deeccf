//! Generation metrics.

use metrics::{counter, histogram};

use flashgen_models::SourceKind;

/// Metric name constants.
pub mod names {
    /// Runs by source kind and outcome.
    pub const RUNS_TOTAL: &str = "flashgen_generation_runs_total";
    /// Cards produced per successful run.
    pub const CARDS_GENERATED: &str = "flashgen_cards_generated";
    pub const DOWNLOAD_DURATION_SECONDS: &str = "flashgen_download_duration_seconds";
    pub const TRANSCRIPTION_DURATION_SECONDS: &str = "flashgen_transcription_duration_seconds";
    pub const GENERATION_DURATION_SECONDS: &str = "flashgen_generation_duration_seconds";
}

/// Pipeline stage with its own latency histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Download,
    Transcription,
    Generation,
}

impl Stage {
    fn metric_name(self) -> &'static str {
        match self {
            Stage::Download => names::DOWNLOAD_DURATION_SECONDS,
            Stage::Transcription => names::TRANSCRIPTION_DURATION_SECONDS,
            Stage::Generation => names::GENERATION_DURATION_SECONDS,
        }
    }
}

/// Record a finished run. `outcome` is `"success"` or an error kind.
pub fn record_run(source_kind: SourceKind, outcome: &str, cards: usize) {
    let labels = [
        ("source_kind", source_kind.as_str().to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!(names::RUNS_TOTAL, &labels).increment(1);

    if outcome == "success" {
        histogram!(names::CARDS_GENERATED, "source_kind" => source_kind.as_str())
            .record(cards as f64);
    }
}

pub fn record_stage(stage: Stage, duration_secs: f64) {
    histogram!(stage.metric_name()).record(duration_secs);
}
