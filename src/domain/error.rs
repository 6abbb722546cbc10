//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for rsitrader.
#[derive(Debug, thiserror::Error)]
pub enum TraderError {
    #[error("no price data for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("insufficient history for {symbol}: have {have} observations, need {need}")]
    InsufficientHistory {
        symbol: String,
        have: usize,
        need: usize,
    },

    #[error("invalid configuration {key}: {reason}")]
    InvalidConfiguration { key: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("degenerate price for {symbol} on {date}: {reason}")]
    ArithmeticDegenerate {
        symbol: String,
        date: NaiveDate,
        reason: String,
    },

    #[error("report sink error: {reason}")]
    Sink { reason: String },

    #[error("model error: {reason}")]
    Model { reason: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TraderError {
    pub fn invalid(key: &str, reason: impl Into<String>) -> Self {
        TraderError::InvalidConfiguration {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors that exclude a single symbol rather than the whole run.
    pub fn is_per_symbol(&self) -> bool {
        matches!(
            self,
            TraderError::DataUnavailable { .. }
                | TraderError::InsufficientHistory { .. }
                | TraderError::ArithmeticDegenerate { .. }
        )
    }
}

impl From<&TraderError> for std::process::ExitCode {
    fn from(err: &TraderError) -> Self {
        let code: u8 = match err {
            TraderError::Io(_) | TraderError::Csv(_) => 1,
            TraderError::InvalidConfiguration { .. }
            | TraderError::ConfigParse { .. }
            | TraderError::ConfigMissing { .. } => 2,
            TraderError::DataUnavailable { .. }
            | TraderError::InsufficientHistory { .. }
            | TraderError::ArithmeticDegenerate { .. } => 5,
            TraderError::Sink { .. } => 6,
            TraderError::Model { .. } => 7,
        };
        std::process::ExitCode::from(code)
    }
}
