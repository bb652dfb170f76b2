pub mod telemetry;
pub mod training_stats;

pub use telemetry::{
    EpisodeSummary, LogTelemetry, NoTelemetry, RecordingTelemetry, TelemetrySink, TickSnapshot,
};
pub use training_stats::TrainingStats;
