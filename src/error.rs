//! Errors returned by scenario evaluation and the derived analyses.

/// Every way an evaluation, matrix, or bridge can be refused.
///
/// None of these are recovered locally: the caller always receives enough
/// context (the offending field, computed vs. expected value) to display or log.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ScenarioError {
    /// The baseline record violates one of its invariants.
    #[error("inconsistent baseline: {field} is {computed}, expected {expected}")]
    InconsistentBaseline {
        field: &'static str,
        computed: f64,
        expected: f64,
    },

    /// A scenario parameter is not finite, not allowed by configuration,
    /// or would force a negative rate or value under the `Reject` clamp policy.
    #[error("invalid parameter {field} = {value}: {reason}")]
    InvalidParameter {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// Allocation rules violate their invariants.
    #[error("invalid allocation rules: {0}")]
    InvalidRules(String),

    /// A waterfall bridge failed to close. Signals a programming defect.
    #[error("imbalanced bridge: steps end at {actual}, expected {expected}")]
    ImbalancedBridge { expected: f64, actual: f64 },
}

pub type Result<T> = std::result::Result<T, ScenarioError>;
