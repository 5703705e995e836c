//! Domain error types.

/// Top-level error type for rulesim.
///
/// The first four variants are the core's validation surface: they are
/// raised during the pre-pass, before any day is simulated. The loop itself
/// does not raise; warm-up gaps and arithmetic edge cases resolve to the
/// sentinel instead.
#[derive(Debug, thiserror::Error)]
pub enum RulesimError {
    #[error("malformed strategy: {reason}")]
    MalformedStrategy { reason: String },

    #[error("indicator rule '{key}': {reason}")]
    Indicator { key: String, reason: String },

    #[error("insufficient data: have {bars} bars, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("contract violation: {reason}")]
    Contract { reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RulesimError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        RulesimError::MalformedStrategy {
            reason: reason.into(),
        }
    }

    pub fn indicator(key: impl Into<String>, reason: impl Into<String>) -> Self {
        RulesimError::Indicator {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn contract(reason: impl Into<String>) -> Self {
        RulesimError::Contract {
            reason: reason.into(),
        }
    }
}

impl From<&RulesimError> for std::process::ExitCode {
    fn from(err: &RulesimError) -> Self {
        let code: u8 = match err {
            RulesimError::Io(_) => 1,
            RulesimError::ConfigParse { .. }
            | RulesimError::ConfigMissing { .. }
            | RulesimError::ConfigInvalid { .. } => 2,
            RulesimError::Data { .. } => 3,
            RulesimError::MalformedStrategy { .. } | RulesimError::Indicator { .. } => 4,
            RulesimError::InsufficientData { .. } => 5,
            RulesimError::Contract { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
