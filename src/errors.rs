//! Error types for the crashlab engine and configuration layer.

use thiserror::Error;

/// Typed rejection for bet placement.
///
/// Rejections are synchronous and mutate nothing; callers render them however
/// they like (the API maps them onto 400/409 responses).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BetError {
    #[error("bet amount must be a positive number, got {0}")]
    InvalidAmount(f64),

    #[error("bet of {bet} exceeds balance of {balance}")]
    InsufficientFunds { bet: f64, balance: f64 },

    #[error("round is not accepting bets")]
    RoundNotIdle,
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bet_error_display() {
        let err = BetError::InsufficientFunds {
            bet: 2000.0,
            balance: 1000.0,
        };
        assert!(err.to_string().contains("2000"));
        assert!(err.to_string().contains("1000"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            field: "engine.growth_rate".to_string(),
            value: "0".to_string(),
            reason: "must be positive".to_string(),
        };
        assert!(err.to_string().contains("engine.growth_rate"));
    }
}
