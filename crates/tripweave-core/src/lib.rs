mod tree;

pub use tree::error::TreeError;
pub use tree::ids::{ActionId, NodeId};
pub use tree::mcts::{IterationMetrics, RunMetrics, SearchConfig, SearchConfigError};
pub use tree::node::Node;
pub use tree::rollout::{ReturnType, RolloutParams, rollout};
pub use tree::search_tree::{Tree, TreePolicyResult};
pub use tree::snapshot::{NodeSnapshot, SNAPSHOT_SCHEMA_VERSION, TreeSnapshot};
