// =============================================================================
// Signals Module
// =============================================================================
//
// Turns the latest indicator values into discrete labels and then into a
// single weighted recommendation:
// - Threshold classification (classifier)
// - Six-factor weighted scoring (weighted_score)

pub mod classifier;
pub mod weighted_score;

pub use classifier::{classify, MissingValuePolicy, SignalError, SignalKey, SignalSet};
pub use weighted_score::{score, Recommendation, ScoredRecommendation};
