use crate::tree::ids::NodeId;

/// Flat node storage. Nodes are never removed, so a `NodeId` stays valid
/// for the lifetime of the tree that handed it out.
#[derive(Debug, Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<T>,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Arena { slots: Vec::new() }
    }

    /// Push an item and return the id it can be looked up with.
    pub fn allocate(&mut self, item: T) -> NodeId {
        let id = NodeId::from(self.slots.len());
        self.slots.push(item);
        id
    }

    pub fn get(&self, node_id: NodeId) -> Option<&T> {
        self.slots.get(node_id.index())
    }

    pub fn get_mut(&mut self, node_id: NodeId) -> Option<&mut T> {
        self.slots.get_mut(node_id.index())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Walk every slot in allocation order together with its id.
    pub fn iter_with_ids(&self) -> impl Iterator<Item = (NodeId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(idx, item)| (NodeId::from(idx), item))
    }
}
