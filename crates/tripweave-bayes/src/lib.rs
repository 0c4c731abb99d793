//! Bayesian preference learning and weather classification.
//!
//! Preferences are Beta beliefs updated from 1..=5 star ratings. Weather is a
//! naive-Bayes posterior over three classes with fixed likelihood tables.

mod beta;
mod category;
mod error;
mod preference;
mod weather;

pub use beta::{BetaBelief, ConfidenceInterval, Z_95};
pub use category::Category;
pub use error::BayesError;
pub use preference::{
    LIKE_THRESHOLD, MAX_RATING, MIN_RATING, Observation, PreferenceModel, PreferenceSummary,
};
pub use weather::{
    WeatherClass, WeatherFeatures, WeatherPosterior, WeatherPrediction, WeatherRisk,
    naive_bayes_weather, predict_weather,
};
