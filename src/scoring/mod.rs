pub mod algorithm;
pub mod confidence;
pub mod requirement;
pub mod resolver;
pub mod weights;

pub use algorithm::BandScorer;
pub use resolver::{resolve_band, resolve_gated};
pub use weights::{BandCeilings, BandWeights};

use serde::{Deserialize, Serialize};

/// Which scoring policy the analyzer runs, selected at construction.
///
/// The two policies produce different result shapes: weighted-band yields a
/// 0-100 score with a confidence estimate, requirement-gated yields a 0-1
/// fit score with a potential monetary value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    WeightedBand,
    RequirementGated,
}
