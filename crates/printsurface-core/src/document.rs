//! Design tree and its snapshot encoding.
//!
//! A [`DesignTree`] is the live, editable content of one side. Stored sides
//! are kept as [`DesignSnapshot`]s, an opaque JSON blob the host can persist
//! and hand back later.

use crate::nodes::{Node, NodeId};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of undo states to keep.
pub const MAX_UNDO_HISTORY: usize = 50;

/// Version written into every snapshot.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors raised while encoding or decoding a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
}

/// Serialized design tree of one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DesignSnapshot(String);

impl DesignSnapshot {
    /// Wrap a JSON string handed over by the host.
    pub fn from_json(json: impl Into<String>) -> Self {
        Self(json.into())
    }

    /// The raw JSON text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the snapshot, surfacing corrupt or unsupported data as an error.
    pub fn decode(&self) -> Result<DesignTree, SnapshotError> {
        DesignTree::from_snapshot(self)
    }

    /// Check that the snapshot decodes without keeping the result.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        self.decode().map(|_| ())
    }
}

/// Wire form of a snapshot.
#[derive(Serialize, Deserialize)]
struct SnapshotData {
    version: u32,
    nodes: Vec<Node>,
}

/// Nodes of one side, back to front.
#[derive(Debug, Clone)]
pub struct DesignTree {
    nodes: Vec<Node>,
    undo_stack: Vec<Vec<Node>>,
    redo_stack: Vec<Vec<Node>>,
    undo_limit: usize,
}

impl Default for DesignTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for DesignTree {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
    }
}

impl DesignTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::with_undo_limit(MAX_UNDO_HISTORY)
    }

    /// Create an empty tree keeping at most `limit` undo states.
    pub fn with_undo_limit(limit: usize) -> Self {
        Self {
            nodes: Vec::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            undo_limit: limit,
        }
    }

    /// Build a tree from nodes given back to front.
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            ..Self::new()
        }
    }

    /// Change the undo limit, dropping the oldest states if needed.
    pub fn set_undo_limit(&mut self, limit: usize) {
        self.undo_limit = limit;
        self.trim_undo();
    }

    fn trim_undo(&mut self) {
        if self.undo_stack.len() > self.undo_limit {
            let excess = self.undo_stack.len() - self.undo_limit;
            self.undo_stack.drain(..excess);
        }
    }

    /// Push current state to undo stack (call before making changes).
    pub fn push_undo(&mut self) {
        self.undo_stack.push(self.nodes.clone());
        self.redo_stack.clear();
        self.trim_undo();
    }

    /// Undo the last change.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some(previous) => {
                let current = std::mem::replace(&mut self.nodes, previous);
                self.redo_stack.push(current);
                true
            }
            None => false,
        }
    }

    /// Redo the last undone change.
    /// Returns true if redo was performed, false if nothing to redo.
    pub fn redo(&mut self) -> bool {
        match self.redo_stack.pop() {
            Some(next) => {
                let current = std::mem::replace(&mut self.nodes, next);
                self.undo_stack.push(current);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Add a node on top of the others.
    ///
    /// A node with the same id is replaced in place instead.
    pub fn add_node(&mut self, node: Node) {
        self.upsert(node);
    }

    /// Replace the node with the same id, or append it on top.
    pub fn upsert(&mut self, node: Node) {
        match self.position(node.id()) {
            Some(index) => self.nodes[index] = node,
            None => self.nodes.push(node),
        }
    }

    /// Remove a node from the tree.
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        self.position(id).map(|index| self.nodes.remove(index))
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id() == id)
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Get nodes in z-order (back to front).
    pub fn nodes_ordered(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Node ids in z-order.
    pub fn ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.id().to_string()).collect()
    }

    /// Find visible nodes at a point, frontmost first.
    pub fn nodes_at_point(&self, point: Point, tolerance: f64) -> Vec<NodeId> {
        self.nodes
            .iter()
            .rev()
            .filter(|n| n.is_visible() && n.hit_test(point, tolerance))
            .map(|n| n.id().to_string())
            .collect()
    }

    /// Get the bounding box of all nodes.
    pub fn bounds(&self) -> Option<Rect> {
        self.nodes
            .iter()
            .map(Node::bounds)
            .reduce(|acc, b| acc.union(b))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Serialize the nodes into a snapshot. History is not included.
    pub fn to_snapshot(&self) -> Result<DesignSnapshot, SnapshotError> {
        let data = SnapshotData {
            version: SNAPSHOT_VERSION,
            nodes: self.nodes.clone(),
        };
        Ok(DesignSnapshot(serde_json::to_string(&data)?))
    }

    /// Rebuild a tree from a snapshot.
    pub fn from_snapshot(snapshot: &DesignSnapshot) -> Result<Self, SnapshotError> {
        let data: SnapshotData = serde_json::from_str(snapshot.as_str())?;
        if data.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(data.version));
        }
        Ok(Self::from_nodes(data.nodes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{Rectangle, Text};

    fn rect(id: &str, x: f64) -> Node {
        Rectangle::with_id(id, Point::new(x, 0.0), 10.0, 10.0).into()
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut tree = DesignTree::from_nodes(vec![rect("a", 0.0), rect("b", 20.0)]);
        tree.upsert(rect("a", 50.0));
        assert_eq!(tree.ids(), vec!["a", "b"]);
        assert_eq!(tree.get("a").unwrap().bounds().x0, 50.0);
        tree.upsert(rect("c", 0.0));
        assert_eq!(tree.ids(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_nodes_at_point_frontmost_first() {
        let tree = DesignTree::from_nodes(vec![rect("c", 0.0), rect("b", 0.0), rect("a", 0.0)]);
        assert_eq!(tree.nodes_at_point(Point::new(5.0, 5.0), 0.0), vec!["a", "b", "c"]);
        assert!(tree.nodes_at_point(Point::new(50.0, 50.0), 0.0).is_empty());
    }

    #[test]
    fn test_hidden_nodes_are_not_hit() {
        let mut tree = DesignTree::from_nodes(vec![rect("a", 0.0)]);
        tree.get_mut("a").unwrap().set_visible(false);
        assert!(tree.nodes_at_point(Point::new(5.0, 5.0), 0.0).is_empty());
    }

    #[test]
    fn test_undo_redo() {
        let mut tree = DesignTree::new();
        tree.push_undo();
        tree.add_node(rect("a", 0.0));
        assert!(tree.can_undo());
        assert!(tree.undo());
        assert!(tree.is_empty());
        assert!(tree.redo());
        assert_eq!(tree.len(), 1);
        assert!(!tree.redo());
    }

    #[test]
    fn test_undo_limit() {
        let mut tree = DesignTree::with_undo_limit(3);
        for i in 0..10 {
            tree.push_undo();
            tree.add_node(rect(&format!("n{i}"), 0.0));
        }
        let mut undone = 0;
        while tree.undo() {
            undone += 1;
        }
        assert_eq!(undone, 3);
        assert_eq!(tree.len(), 7);
    }

    #[test]
    fn test_snapshot_preserves_order_and_kinds() {
        let tree = DesignTree::from_nodes(vec![
            rect("bg", 0.0),
            Text::new("Logo", Point::new(10.0, 10.0), "ACME").into(),
        ]);
        let snapshot = tree.to_snapshot().unwrap();
        let restored = DesignTree::from_snapshot(&snapshot).unwrap();
        assert_eq!(restored, tree);
        assert_eq!(restored.ids(), vec!["bg", "Logo"]);
        assert!(restored.get("Logo").unwrap().as_text().is_some());
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let snapshot = DesignSnapshot::from_json("{not json");
        assert!(matches!(snapshot.decode(), Err(SnapshotError::Serialization(_))));
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let snapshot = DesignSnapshot::from_json(r#"{"version": 7, "nodes": []}"#);
        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::UnsupportedVersion(7))
        ));
    }
}
