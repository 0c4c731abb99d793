use std::collections::{HashMap, VecDeque};

use crate::{Action, MdpState};

type Row = [Option<f64>; Action::COUNT];

/// Sparse `(state, action) -> value` table. Unseen entries read as 0.
///
/// Rows are created on first write. With a state cap, the oldest row is
/// evicted when a new state would exceed it.
#[derive(Debug, Clone, Default)]
pub struct QTable {
    rows: HashMap<MdpState, Row>,
    order: VecDeque<MdpState>,
    entries: usize,
    max_states: Option<usize>,
}

impl QTable {
    pub fn new(max_states: Option<usize>) -> Self {
        QTable {
            max_states,
            ..QTable::default()
        }
    }

    pub fn get(&self, state: &MdpState, action: Action) -> f64 {
        self.rows
            .get(state)
            .and_then(|row| row[action.index()])
            .unwrap_or(0.0)
    }

    pub fn set(&mut self, state: &MdpState, action: Action, value: f64) {
        if !self.rows.contains_key(state) {
            self.evict_for_insert();
            self.rows.insert(state.clone(), [None; Action::COUNT]);
            self.order.push_back(state.clone());
        }
        if let Some(row) = self.rows.get_mut(state) {
            if row[action.index()].replace(value).is_none() {
                self.entries += 1;
            }
        }
    }

    /// Largest value over every action of `state`, 0 for unseen entries.
    pub fn max_value(&self, state: &MdpState) -> f64 {
        self.best(state).1
    }

    /// Greedy action; ties keep the earliest action in enumeration order.
    pub fn best_action(&self, state: &MdpState) -> Action {
        self.best(state).0
    }

    fn best(&self, state: &MdpState) -> (Action, f64) {
        let mut best = (Action::KeepPlan, self.get(state, Action::KeepPlan));
        for action in Action::ALL.into_iter().skip(1) {
            let value = self.get(state, action);
            if value > best.1 {
                best = (action, value);
            }
        }
        best
    }

    /// Number of stored `(state, action)` entries.
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    pub fn state_count(&self) -> usize {
        self.rows.len()
    }

    /// States in insertion order.
    pub fn states(&self) -> impl Iterator<Item = &MdpState> {
        self.order.iter()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.order.clear();
        self.entries = 0;
    }

    fn evict_for_insert(&mut self) {
        let Some(max) = self.max_states else {
            return;
        };
        while self.rows.len() >= max {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if let Some(row) = self.rows.remove(&oldest) {
                self.entries -= row.iter().filter(|v| v.is_some()).count();
            }
        }
    }
}
