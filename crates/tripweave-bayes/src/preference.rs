use std::collections::{BTreeMap, VecDeque};

use rand::Rng;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{BetaBelief, Category, ConfidenceInterval};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;
/// Ratings at or above this count as a success.
pub const LIKE_THRESHOLD: u8 = 4;

/// One rating as it was applied to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub category: Category,
    pub rating: u8,
    /// Posterior mean right after the update.
    pub probability: f64,
    /// Unix time in milliseconds.
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PreferenceSummary {
    pub probability: f64,
    pub confidence: ConfidenceInterval,
    pub samples: f64,
}

/// Per-category Beta beliefs plus the log of ratings that shaped them.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceModel {
    beliefs: BTreeMap<Category, BetaBelief>,
    observations: VecDeque<Observation>,
    observation_limit: Option<usize>,
}

impl Default for PreferenceModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PreferenceModel {
    /// Model holding the prior of every category.
    pub fn new() -> Self {
        PreferenceModel {
            beliefs: Category::ALL
                .into_iter()
                .map(|category| (category, category.prior()))
                .collect(),
            observations: VecDeque::new(),
            observation_limit: None,
        }
    }

    /// Keep at most `limit` observations, dropping the oldest first.
    pub fn with_observation_limit(mut self, limit: Option<usize>) -> Self {
        self.observation_limit = limit;
        self.trim_observations();
        self
    }

    pub fn belief(&self, category: Category) -> BetaBelief {
        self.beliefs
            .get(&category)
            .copied()
            .unwrap_or_else(|| category.prior())
    }

    pub fn beliefs(&self) -> &BTreeMap<Category, BetaBelief> {
        &self.beliefs
    }

    pub fn probability(&self, category: Category) -> f64 {
        self.belief(category).mean()
    }

    /// One Beta update for `category`. Returns the posterior mean.
    pub fn update_beta(&mut self, category: Category, success: bool) -> f64 {
        self.beliefs
            .entry(category)
            .or_insert_with(|| category.prior())
            .observe(success)
    }

    /// Apply a 1..=5 star rating. Out-of-range ratings are clamped first.
    pub fn update_preference(&mut self, category: Category, rating: u8) -> f64 {
        let rating = rating.clamp(MIN_RATING, MAX_RATING);
        let previous = self.probability(category);
        let probability = self.update_beta(category, rating >= LIKE_THRESHOLD);

        self.observations.push_back(Observation {
            category,
            rating,
            probability,
            timestamp: unix_millis(),
        });
        self.trim_observations();

        tracing::debug!(
            target: "tripweave::preference",
            category = %category,
            rating,
            previous,
            probability,
            "preference updated"
        );
        probability
    }

    pub fn observations(&self) -> impl ExactSizeIterator<Item = &Observation> {
        self.observations.iter()
    }

    pub fn confidence_interval(&self, category: Category) -> ConfidenceInterval {
        self.belief(category).confidence_interval()
    }

    /// Dirichlet posterior mean from the prior alphas and per-category counts.
    /// Categories without a count use 0.
    pub fn dirichlet_update(&self, counts: &BTreeMap<Category, u64>) -> BTreeMap<Category, f64> {
        let count = |category: &Category| counts.get(category).copied().unwrap_or(0) as f64;
        let total: f64 = Category::ALL
            .iter()
            .map(|category| category.prior().alpha + count(category))
            .sum();

        Category::ALL
            .iter()
            .map(|category| (*category, (category.prior().alpha + count(category)) / total))
            .collect()
    }

    pub fn preference_probabilities(&self) -> BTreeMap<Category, PreferenceSummary> {
        self.beliefs
            .iter()
            .map(|(category, belief)| {
                (
                    *category,
                    PreferenceSummary {
                        probability: belief.mean(),
                        confidence: belief.confidence_interval(),
                        samples: belief.samples(),
                    },
                )
            })
            .collect()
    }

    /// Categories by descending probability; ties keep category order.
    pub fn ranked(&self) -> Vec<(Category, f64)> {
        let mut ranked: Vec<(Category, f64)> = self
            .beliefs
            .iter()
            .map(|(category, belief)| (*category, belief.mean()))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    /// Monte Carlo estimate of `P(theta_first > theta_second)`.
    pub fn compare_categories<R: Rng + ?Sized>(
        &self,
        first: Category,
        second: Category,
        draws: usize,
        rng: &mut R,
    ) -> f64 {
        if draws == 0 {
            return 0.5;
        }
        let a = self.belief(first);
        let b = self.belief(second);
        let wins = (0..draws)
            .filter(|_| a.sample(rng) > b.sample(rng))
            .count();
        wins as f64 / draws as f64
    }

    /// Monte Carlo estimate of `P(theta > threshold)`.
    pub fn probability_above<R: Rng + ?Sized>(
        &self,
        category: Category,
        threshold: f64,
        draws: usize,
        rng: &mut R,
    ) -> f64 {
        if draws == 0 {
            return 0.0;
        }
        let belief = self.belief(category);
        let hits = (0..draws)
            .filter(|_| belief.sample(rng) > threshold)
            .count();
        hits as f64 / draws as f64
    }

    /// Replace beliefs from saved data. Invalid beliefs keep the prior and
    /// are logged. Returns how many were rejected.
    pub fn restore_beliefs<I>(&mut self, beliefs: I) -> usize
    where
        I: IntoIterator<Item = (Category, BetaBelief)>,
    {
        let mut rejected = 0;
        for (category, belief) in beliefs {
            if belief.is_valid() {
                self.beliefs.insert(category, belief);
            } else {
                rejected += 1;
                tracing::warn!(
                    target: "tripweave::preference",
                    category = %category,
                    alpha = belief.alpha,
                    beta = belief.beta,
                    "rejected saved belief, keeping prior"
                );
                self.beliefs.insert(category, category.prior());
            }
        }
        rejected
    }

    fn trim_observations(&mut self) {
        if let Some(limit) = self.observation_limit {
            while self.observations.len() > limit {
                self.observations.pop_front();
            }
        }
    }
}

fn unix_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
