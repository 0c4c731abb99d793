use serde::Serialize;

use crate::tree::search_tree::Tree;

/// Bumped whenever the snapshot layout changes.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct TreeSnapshot<S> {
    pub schema_version: u32,
    pub root_node_id: usize,
    pub node_count: usize,
    pub nodes: Vec<NodeSnapshot<S>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot<S> {
    pub node_id: usize,
    pub state: S,
    pub depth: u64,
    pub parent_node_id: Option<usize>,
    pub action_id: Option<usize>,
    pub visits: u64,
    pub value_sum: f64,
    pub children: Vec<usize>,
}

impl<S: Clone> Tree<S> {
    /// Copy the whole tree into a serializable form for audit display.
    pub fn snapshot(&self) -> TreeSnapshot<S> {
        let nodes: Vec<NodeSnapshot<S>> = self
            .nodes()
            .map(|(node_id, node)| NodeSnapshot {
                node_id: node_id.index(),
                state: node.state().clone(),
                depth: node.depth(),
                parent_node_id: node.parent().map(|p| p.index()),
                action_id: node.action().map(|a| a.index()),
                visits: node.visits(),
                value_sum: node.value_sum(),
                children: node.children().iter().map(|c| c.index()).collect(),
            })
            .collect();

        TreeSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            root_node_id: self.root_id().index(),
            node_count: nodes.len(),
            nodes,
        }
    }
}

impl<S: Serialize> TreeSnapshot<S> {
    /// Render the snapshot as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
