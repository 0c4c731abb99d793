use crate::tree::{
    ids::{ActionId, NodeId},
    stats::NodeStats,
};

#[derive(Debug, Clone)]
/// A decision state in the search tree.
/// Owns its state by value and the ids of its children; the parent link is
/// an arena index and never keeps the parent alive.
pub struct Node<S> {
    state: S,
    depth: u64,
    parent: Option<NodeId>,
    action: Option<ActionId>,
    children: Vec<NodeId>,
    stats: NodeStats,
}

impl<S> Node<S> {
    /// Create the root node, which has no parent and no producing action.
    pub fn root(state: S) -> Self {
        Node {
            state,
            depth: 0,
            parent: None,
            action: None,
            children: Vec::new(),
            stats: NodeStats::default(),
        }
    }

    /// Create a child reached from `parent` by taking `action`.
    /// `initial_value` is the reward observed on that transition.
    pub fn child(state: S, parent: NodeId, depth: u64, action: ActionId, initial_value: f64) -> Self {
        Node {
            state,
            depth,
            parent: Some(parent),
            action: Some(action),
            children: Vec::new(),
            stats: NodeStats::seeded(initial_value),
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn depth(&self) -> u64 {
        self.depth
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Action that produced this node, `None` for the root.
    pub fn action(&self) -> Option<ActionId> {
        self.action
    }

    /// Children in expansion order, which is the action order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn visits(&self) -> u64 {
        self.stats.visits()
    }

    pub fn value_sum(&self) -> f64 {
        self.stats.value_sum()
    }

    pub fn q(&self) -> f64 {
        self.stats.q()
    }

    pub(crate) fn stats_mut(&mut self) -> &mut NodeStats {
        &mut self.stats
    }

    pub(crate) fn push_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    /// UCB1 score of this node seen from a parent with `parent_visits`.
    ///
    /// `value / (n + 1) + sqrt(c * ln(N + 1) / (n + 1))`
    ///
    /// Both terms use `+1` pseudo counts, so unvisited nodes get a finite score.
    pub fn ucb1_score(&self, parent_visits: u64, c: f64) -> f64 {
        let n = self.stats.visits() as f64 + 1.0;
        let exploitation = self.stats.smoothed_mean();
        let exploration = (c * (parent_visits as f64 + 1.0).ln() / n).sqrt();
        exploitation + exploration
    }
}
