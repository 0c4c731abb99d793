/// Visit count and accumulated return of one node.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodeStats {
    visits: u64,
    value_sum: f64,
}

impl NodeStats {
    /// Stats for a freshly expanded node whose value starts at the reward
    /// observed on the transition that created it.
    pub fn seeded(initial_value: f64) -> Self {
        NodeStats {
            visits: 0,
            value_sum: initial_value,
        }
    }

    pub fn visits(&self) -> u64 {
        self.visits
    }

    pub fn value_sum(&self) -> f64 {
        self.value_sum
    }

    /// Backpropagation step: one more visit carrying `rollout_return`.
    pub fn record(&mut self, rollout_return: f64) {
        self.visits += 1;
        self.value_sum += rollout_return;
    }

    /// Mean value with a one-visit pseudo count, so unvisited nodes stay finite.
    pub fn smoothed_mean(&self) -> f64 {
        self.value_sum / (self.visits as f64 + 1.0)
    }

    /// Plain mean value, 0 for unvisited nodes.
    pub fn q(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.value_sum / self.visits as f64
        }
    }
}
