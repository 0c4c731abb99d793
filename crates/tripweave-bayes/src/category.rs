use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{BayesError, BetaBelief};

/// Activity category a traveller can like or dislike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Cultural,
    Adventure,
    Relaxation,
    Food,
    Nightlife,
    Shopping,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Cultural,
        Category::Adventure,
        Category::Relaxation,
        Category::Food,
        Category::Nightlife,
        Category::Shopping,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Cultural => "cultural",
            Category::Adventure => "adventure",
            Category::Relaxation => "relaxation",
            Category::Food => "food",
            Category::Nightlife => "nightlife",
            Category::Shopping => "shopping",
        }
    }

    /// Prior belief before any rating is observed.
    pub fn prior(self) -> BetaBelief {
        let (alpha, beta) = match self {
            Category::Cultural | Category::Adventure | Category::Food => (2.0, 2.0),
            Category::Relaxation | Category::Shopping => (1.0, 3.0),
            Category::Nightlife => (1.0, 4.0),
        };
        BetaBelief { alpha, beta }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = BayesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == lowered)
            .ok_or_else(|| BayesError::UnknownCategory {
                name: s.to_string(),
            })
    }
}
