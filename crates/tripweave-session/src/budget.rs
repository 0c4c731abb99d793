use serde::{Deserialize, Serialize};

/// Spending so far, split by kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetBreakdown {
    pub accommodation: f64,
    pub food: f64,
    pub transport: f64,
    pub activities: f64,
}

impl Default for BudgetBreakdown {
    fn default() -> Self {
        BudgetBreakdown {
            accommodation: 2_100.0,
            food: 1_800.0,
            transport: 1_000.0,
            activities: 500.0,
        }
    }
}

impl BudgetBreakdown {
    pub fn sum(&self) -> f64 {
        self.accommodation + self.food + self.transport + self.activities
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetRecord {
    pub total: f64,
    pub used: f64,
    pub breakdown: BudgetBreakdown,
}

impl Default for BudgetRecord {
    fn default() -> Self {
        BudgetRecord {
            total: 15_000.0,
            used: 5_400.0,
            breakdown: BudgetBreakdown::default(),
        }
    }
}

impl BudgetRecord {
    pub fn with_total(total: f64) -> Self {
        BudgetRecord {
            total,
            ..Self::default()
        }
    }

    /// Unspent amount, never negative.
    pub fn remaining(&self) -> f64 {
        (self.total - self.used).max(0.0)
    }

    pub fn is_valid(&self) -> bool {
        [
            self.total,
            self.used,
            self.breakdown.accommodation,
            self.breakdown.food,
            self.breakdown.transport,
            self.breakdown.activities,
        ]
        .iter()
        .all(|v| v.is_finite() && *v >= 0.0)
    }
}
