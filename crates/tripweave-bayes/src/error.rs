use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
/// Error type for category parsing and belief construction.
pub enum BayesError {
    #[error("unknown preference category '{name}'")]
    UnknownCategory { name: String },

    #[error("unknown weather class '{name}'")]
    UnknownWeatherClass { name: String },

    #[error("beta parameters must be finite and > 0, got alpha={alpha} beta={beta}")]
    InvalidBelief { alpha: f64, beta: f64 },
}
