use crate::tree::{
    arena::Arena,
    error::TreeError,
    ids::{ActionId, NodeId},
    node::Node,
};

#[derive(Debug, Clone)]
/// Outcome of the selection and expansion phases of one iteration.
pub struct TreePolicyResult {
    pub path: Vec<NodeId>, // nodes visited from root to leaf, inclusive
    pub leaf: NodeId,      // node the rollout starts from
    pub expanded: bool,    // whether the selected leaf was expanded this iteration
}

#[derive(Debug, Clone)]
/// Owns the arena and provides the four search phases.
/// The tree does not know the domain; it only queries it through closures.
pub struct Tree<S> {
    arena: Arena<Node<S>>,
    root: NodeId,
}

impl<S: Clone> Tree<S> {
    /// Create a tree with a single root node holding a copy of `root_state`.
    pub fn new(root_state: S) -> Self {
        let mut arena = Arena::new();
        let root = arena.allocate(Node::root(root_state));
        Tree { arena, root }
    }

    /// Return the root node id.
    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// Return how many nodes exist in the tree arena.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Return an immutable node handle.
    pub fn node(&self, node_id: NodeId) -> Result<&Node<S>, TreeError> {
        self.arena
            .get(node_id)
            .ok_or(TreeError::MissingNode { node_id })
    }

    pub(crate) fn node_mut(&mut self, node_id: NodeId) -> Result<&mut Node<S>, TreeError> {
        self.arena
            .get_mut(node_id)
            .ok_or(TreeError::MissingNode { node_id })
    }

    pub(crate) fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node<S>)> {
        self.arena.iter_with_ids()
    }

    /// Selection: descend from the root while the current node has children,
    /// following the child with the highest UCB1 score.
    /// Ties keep the first child in expansion order.
    pub fn select(&self, c: f64) -> Result<Vec<NodeId>, TreeError> {
        let mut current = self.root_id();
        let mut path = vec![current];

        loop {
            let node = self.node(current)?;
            if node.is_leaf() {
                return Ok(path);
            }

            let parent_visits = node.visits();
            let mut best: Option<(NodeId, f64)> = None;
            for &child_id in node.children() {
                let score = self.node(child_id)?.ucb1_score(parent_visits, c);
                // strict comparison keeps the earliest child on ties
                if best.is_none_or(|(_, best_score)| score > best_score) {
                    best = Some((child_id, score));
                }
            }

            let (next, _) = best.ok_or(TreeError::ChildSelectionFailed { node_id: current })?;
            path.push(next);
            current = next;
        }
    }

    /// Expansion: create one child per action by calling `step` once for each,
    /// in action order. Returns the ids of the new children.
    pub fn expand<FStep>(
        &mut self,
        node_id: NodeId,
        num_actions: usize,
        mut step: FStep,
    ) -> Result<Vec<NodeId>, TreeError>
    where
        FStep: FnMut(&S, ActionId) -> (S, f64),
    {
        let (state, depth) = {
            let node = self.node(node_id)?;
            if !node.is_leaf() {
                return Err(TreeError::AlreadyExpanded { node_id });
            }
            (node.state().clone(), node.depth())
        };

        let mut created = Vec::with_capacity(num_actions);
        for idx in 0..num_actions {
            let action = ActionId::from(idx);
            let (next_state, reward) = step(&state, action);
            let child = Node::child(next_state, node_id, depth + 1, action, reward);
            let child_id = self.arena.allocate(child);
            self.node_mut(node_id)?.push_child(child_id);
            created.push(child_id);
        }

        Ok(created)
    }

    /// Backpropagation: add one visit and `total_return` to `from` and every ancestor.
    pub fn backpropagate(&mut self, from: NodeId, total_return: f64) -> Result<(), TreeError> {
        let mut current = Some(from);
        while let Some(node_id) = current {
            let node = self.node_mut(node_id)?;
            node.stats_mut().record(total_return);
            current = node.parent();
        }
        Ok(())
    }

    /// Selection followed by expansion of a leaf that has been visited before.
    /// After expansion the first new child becomes the leaf.
    pub fn tree_policy<FNum, FStep>(
        &mut self,
        c: f64,
        mut num_actions: FNum,
        step: FStep,
    ) -> Result<TreePolicyResult, TreeError>
    where
        FNum: FnMut(&S) -> usize,
        FStep: FnMut(&S, ActionId) -> (S, f64),
    {
        let mut path = self.select(c)?;
        let leaf = *path.last().ok_or(TreeError::MissingNode {
            node_id: self.root_id(),
        })?;

        let (visits, action_count) = {
            let node = self.node(leaf)?;
            (node.visits(), num_actions(node.state()))
        };

        // A never-visited leaf is simulated as is; zero-action states stay leaves.
        if visits == 0 || action_count == 0 {
            return Ok(TreePolicyResult {
                path,
                leaf,
                expanded: false,
            });
        }

        let children = self.expand(leaf, action_count, step)?;
        let first = *children
            .first()
            .ok_or(TreeError::ChildSelectionFailed { node_id: leaf })?;
        path.push(first);

        Ok(TreePolicyResult {
            path,
            leaf: first,
            expanded: true,
        })
    }

    /// Pick the root action with the highest visit count.
    /// Ties keep the earliest action; `None` when the root was never expanded.
    pub fn best_root_action_by_visits(&self) -> Result<Option<ActionId>, TreeError> {
        let root = self.node(self.root_id())?;
        let mut best: Option<(ActionId, u64)> = None;

        for &child_id in root.children() {
            let child = self.node(child_id)?;
            let Some(action) = child.action() else {
                continue;
            };
            if best.is_none_or(|(_, best_visits)| child.visits() > best_visits) {
                best = Some((action, child.visits()));
            }
        }

        Ok(best.map(|(action, _)| action))
    }

    /// Pick the root action with the highest mean value estimate.
    pub fn best_root_action_by_value(&self) -> Result<Option<ActionId>, TreeError> {
        let root = self.node(self.root_id())?;
        let mut best: Option<(ActionId, f64)> = None;

        for &child_id in root.children() {
            let child = self.node(child_id)?;
            let Some(action) = child.action() else {
                continue;
            };
            if best.is_none_or(|(_, best_q)| child.q() > best_q) {
                best = Some((action, child.q()));
            }
        }

        Ok(best.map(|(action, _)| action))
    }
}
