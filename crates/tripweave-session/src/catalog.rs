use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};
use tripweave_bayes::{Category, WeatherClass};

use crate::SessionError;

const DEFAULT_CATALOG_YAML: &str = include_str!("../config/catalog.default.yaml");

/// Expected crowding at an activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrowdTag {
    Low,
    #[default]
    Medium,
    High,
}

impl CrowdTag {
    /// Representative crowd level on the 0..=100 scale of the trip state.
    pub fn level(self) -> f64 {
        match self {
            CrowdTag::Low => 30.0,
            CrowdTag::Medium => 60.0,
            CrowdTag::High => 90.0,
        }
    }

    /// Fraction of enjoyment lost to crowding.
    pub fn penalty(self) -> f64 {
        match self {
            CrowdTag::Low => 0.02,
            CrowdTag::Medium => 0.08,
            CrowdTag::High => 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub name: String,
    #[serde(rename = "type")]
    pub category: Category,
    /// Hours.
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default, alias = "crowd_level")]
    pub crowd_level: CrowdTag,
    /// Weather classes the activity suits.
    #[serde(default)]
    pub weather: Vec<WeatherClass>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    /// `[longitude, latitude]`.
    #[serde(default)]
    pub coords: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    #[serde(default)]
    pub center: [f64; 2],
    pub cities: Vec<City>,
}

/// Destinations, their cities in visiting order, and activities per city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub default_city: String,
    #[serde(default)]
    pub destinations: BTreeMap<String, Destination>,
    #[serde(default)]
    pub activities: BTreeMap<String, Vec<Activity>>,
}

impl Catalog {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SessionError> {
        let catalog: Catalog = serde_yaml::from_str(yaml)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// The bundled Rajasthan and Kerala catalog.
    pub fn default_yaml() -> &'static str {
        DEFAULT_CATALOG_YAML
    }

    pub fn from_default_yaml() -> Result<Self, SessionError> {
        Self::from_yaml_str(Self::default_yaml())
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.default_city.trim().is_empty() {
            return Err(SessionError::InvalidConfig(
                "catalog default_city must not be empty".to_string(),
            ));
        }
        if self.activities_for(&self.default_city).is_none() {
            return Err(SessionError::InvalidConfig(format!(
                "catalog has no activities for default city '{}'",
                self.default_city
            )));
        }
        for (city, activities) in &self.activities {
            for activity in activities {
                if !activity.cost.is_finite() || activity.cost < 0.0 {
                    return Err(SessionError::InvalidConfig(format!(
                        "activity '{}' in '{city}' has invalid cost {}",
                        activity.name, activity.cost
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn cities(&self, destination: &str) -> Option<&[City]> {
        self.destinations
            .get(destination)
            .map(|d| d.cities.as_slice())
            .filter(|cities| !cities.is_empty())
    }

    /// Activities of `city`, `None` when the city has none listed.
    pub fn activities_for(&self, city: &str) -> Option<&[Activity]> {
        self.activities
            .get(city)
            .map(Vec::as_slice)
            .filter(|activities| !activities.is_empty())
    }

    pub fn default_activities(&self) -> &[Activity] {
        self.activities_for(&self.default_city).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_loads() {
        let catalog = Catalog::from_default_yaml().expect("default catalog");
        assert_eq!(catalog.default_city, "Jaipur");

        let cities: Vec<&str> = catalog
            .cities("Rajasthan, India")
            .expect("rajasthan")
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(cities, ["Jaipur", "Udaipur", "Jodhpur", "Jaisalmer"]);

        let jaipur = catalog.activities_for("Jaipur").expect("jaipur");
        assert_eq!(jaipur.len(), 5);
        assert_eq!(jaipur[3].category, Category::Adventure);
        assert_eq!(jaipur[0].crowd_level, CrowdTag::High);
        assert!(catalog.activities_for("Jaisalmer").is_none());
    }

    #[test]
    fn rejects_default_city_without_activities() {
        let yaml = "default_city: Nowhere\nactivities: {}\n";
        let err = Catalog::from_yaml_str(yaml).expect_err("invalid");
        assert!(matches!(err, SessionError::InvalidConfig(_)));
    }

    #[test]
    fn activity_json_is_camel_case() {
        let catalog = Catalog::from_default_yaml().expect("default catalog");
        let json = serde_json::to_value(&catalog.default_activities()[0]).expect("json");
        assert_eq!(json["type"], "cultural");
        assert_eq!(json["crowdLevel"], "high");
    }
}
