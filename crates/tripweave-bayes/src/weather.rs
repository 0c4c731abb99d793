use std::{fmt, str::FromStr};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::BayesError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherClass {
    Sunny,
    Cloudy,
    Rainy,
}

impl WeatherClass {
    pub const ALL: [WeatherClass; 3] = [
        WeatherClass::Sunny,
        WeatherClass::Cloudy,
        WeatherClass::Rainy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WeatherClass::Sunny => "sunny",
            WeatherClass::Cloudy => "cloudy",
            WeatherClass::Rainy => "rainy",
        }
    }

    pub fn prior(self) -> f64 {
        match self {
            WeatherClass::Sunny => 0.5,
            WeatherClass::Cloudy => 0.3,
            WeatherClass::Rainy => 0.2,
        }
    }

    /// Product of the four per-feature likelihoods.
    fn likelihood(self, f: &WeatherFeatures) -> f64 {
        let pick = |hit: bool, yes: f64, no: f64| if hit { yes } else { no };
        match self {
            WeatherClass::Sunny => {
                pick(f.temp > 25.0, 0.7, 0.3)
                    * pick(f.humidity < 60.0, 0.8, 0.2)
                    * pick(f.pressure > 1013.0, 0.7, 0.3)
                    * pick(f.clouds < 30.0, 0.9, 0.1)
            }
            WeatherClass::Cloudy => {
                pick(f.temp > 20.0, 0.6, 0.4)
                    * pick(f.humidity > 50.0, 0.7, 0.3)
                    * pick(f.pressure > 1010.0, 0.6, 0.4)
                    * pick(f.clouds > 40.0 && f.clouds < 80.0, 0.8, 0.2)
            }
            WeatherClass::Rainy => {
                pick(f.temp < 25.0, 0.6, 0.4)
                    * pick(f.humidity > 70.0, 0.9, 0.1)
                    * pick(f.pressure < 1010.0, 0.8, 0.2)
                    * pick(f.clouds > 70.0, 0.9, 0.1)
            }
        }
    }
}

impl fmt::Display for WeatherClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeatherClass {
    type Err = BayesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WeatherClass::ALL
            .into_iter()
            .find(|class| class.as_str() == s)
            .ok_or_else(|| BayesError::UnknownWeatherClass {
                name: s.to_string(),
            })
    }
}

/// Observed conditions: temperature in C, humidity in %, pressure in hPa,
/// cloud cover in %.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherFeatures {
    pub temp: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub clouds: f64,
}

impl WeatherFeatures {
    /// Draw synthetic features from the ranges the forecaster simulates.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        WeatherFeatures {
            temp: rng.gen_range(20.0..35.0),
            humidity: rng.gen_range(40.0..80.0),
            pressure: rng.gen_range(1005.0..1020.0),
            clouds: rng.gen_range(10.0..90.0),
        }
    }
}

/// Normalized posterior over the three weather classes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherPosterior {
    pub sunny: f64,
    pub cloudy: f64,
    pub rainy: f64,
}

impl WeatherPosterior {
    pub fn get(&self, class: WeatherClass) -> f64 {
        match class {
            WeatherClass::Sunny => self.sunny,
            WeatherClass::Cloudy => self.cloudy,
            WeatherClass::Rainy => self.rainy,
        }
    }

    /// Class with the highest probability. On a tie the later class wins.
    pub fn most_likely(&self) -> WeatherClass {
        let mut best = WeatherClass::Sunny;
        for class in [WeatherClass::Cloudy, WeatherClass::Rainy] {
            if self.get(best) <= self.get(class) {
                best = class;
            }
        }
        best
    }

    pub fn risk(&self) -> WeatherRisk {
        WeatherRisk::from_rain_probability(self.rainy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherRisk {
    Low,
    Medium,
    High,
}

impl WeatherRisk {
    pub fn from_rain_probability(rain: f64) -> Self {
        if rain > 0.7 {
            WeatherRisk::High
        } else if rain > 0.4 {
            WeatherRisk::Medium
        } else {
            WeatherRisk::Low
        }
    }
}

/// Naive-Bayes posterior over weather classes for fixed likelihood tables.
pub fn naive_bayes_weather(features: &WeatherFeatures) -> WeatherPosterior {
    let score = |class: WeatherClass| class.prior() * class.likelihood(features);
    let sunny = score(WeatherClass::Sunny);
    let cloudy = score(WeatherClass::Cloudy);
    let rainy = score(WeatherClass::Rainy);
    let total = sunny + cloudy + rainy;

    WeatherPosterior {
        sunny: sunny / total,
        cloudy: cloudy / total,
        rainy: rainy / total,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherPrediction {
    pub predictions: WeatherPosterior,
    pub most_likely: WeatherClass,
    pub features: WeatherFeatures,
    pub risk: WeatherRisk,
}

impl WeatherPrediction {
    pub fn from_features(features: WeatherFeatures) -> Self {
        let predictions = naive_bayes_weather(&features);
        WeatherPrediction {
            predictions,
            most_likely: predictions.most_likely(),
            features,
            risk: predictions.risk(),
        }
    }
}

/// Forecast from freshly sampled synthetic features.
pub fn predict_weather<R: Rng + ?Sized>(rng: &mut R) -> WeatherPrediction {
    let prediction = WeatherPrediction::from_features(WeatherFeatures::sample(rng));
    tracing::debug!(
        target: "tripweave::weather",
        most_likely = %prediction.most_likely,
        rainy = prediction.predictions.rainy,
        "weather predicted"
    );
    prediction
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(temp: f64, humidity: f64, pressure: f64, clouds: f64) -> WeatherFeatures {
        WeatherFeatures {
            temp,
            humidity,
            pressure,
            clouds,
        }
    }

    #[test]
    fn clear_hot_day_is_sunny() {
        let posterior = naive_bayes_weather(&features(30.0, 45.0, 1016.0, 15.0));
        assert_eq!(posterior.most_likely(), WeatherClass::Sunny);
        assert!(posterior.sunny > 0.9);
    }

    #[test]
    fn wet_low_pressure_day_is_rainy() {
        let posterior = naive_bayes_weather(&features(22.0, 78.0, 1006.0, 85.0));
        assert_eq!(posterior.most_likely(), WeatherClass::Rainy);
        assert_eq!(posterior.risk(), WeatherRisk::High);
    }

    #[test]
    fn posterior_matches_hand_computed_values() {
        // sunny .5*.7*.2*.3*.1, cloudy .3*.6*.7*.6*.8, rainy .2*.4*.9*.2*.1
        let posterior = naive_bayes_weather(&features(28.0, 75.0, 1012.0, 50.0));
        let sunny = 0.5 * 0.7 * 0.2 * 0.3 * 0.1;
        let cloudy = 0.3 * 0.6 * 0.7 * 0.6 * 0.8;
        let rainy = 0.2 * 0.4 * 0.9 * 0.2 * 0.1;
        let total = sunny + cloudy + rainy;
        assert!((posterior.cloudy - cloudy / total).abs() < 1e-12);
        assert!((posterior.rainy - rainy / total).abs() < 1e-12);
    }

    #[test]
    fn ties_go_to_the_later_class() {
        let posterior = WeatherPosterior {
            sunny: 0.4,
            cloudy: 0.4,
            rainy: 0.2,
        };
        assert_eq!(posterior.most_likely(), WeatherClass::Cloudy);
    }

    #[test]
    fn risk_bands() {
        assert_eq!(WeatherRisk::from_rain_probability(0.2), WeatherRisk::Low);
        assert_eq!(WeatherRisk::from_rain_probability(0.5), WeatherRisk::Medium);
        assert_eq!(WeatherRisk::from_rain_probability(0.71), WeatherRisk::High);
    }
}
