pub mod analyzer;
pub mod metrics;

pub use analyzer::{BatchError, BatchOutcome, ChestAnalyzer};
pub use metrics::{AnalyzerMetrics, MetricsSnapshot};
