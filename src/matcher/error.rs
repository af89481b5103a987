use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("No version grammar registered for ecosystem '{0}'")]
    UnsupportedEcosystem(String),

    #[error("Version '{spec}' does not conform to the {ecosystem} grammar")]
    InvalidVersion { ecosystem: String, spec: String },

    #[error("Range cannot be resolved to version intervals: {0}")]
    UnsupportedRangeType(String),
}
