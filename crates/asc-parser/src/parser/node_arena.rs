//! Node arena for AST storage.

use super::node::{DeclData, Node, NodeData, NodeIndex, NodeKind};
use serde::Serialize;

/// Arena-based storage for AST nodes.
/// Nodes are stored contiguously and referenced by index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeArena {
    pub nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> NodeArena {
        NodeArena { nodes: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> NodeArena {
        NodeArena {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Add a node to the arena and return its index
    pub fn add(&mut self, node: Node) -> NodeIndex {
        let index = self.nodes.len() as u32;
        self.nodes.push(node);
        NodeIndex(index)
    }

    /// Get a node by index
    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get(index.0 as usize)
        }
    }

    /// Get a mutable node by index
    pub fn get_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get_mut(index.0 as usize)
        }
    }

    pub fn kind(&self, index: NodeIndex) -> Option<NodeKind> {
        self.get(index).map(|n| n.kind)
    }

    pub fn children(&self, index: NodeIndex) -> &[NodeIndex] {
        self.get(index).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn decl(&self, index: NodeIndex) -> Option<&DeclData> {
        self.get(index).and_then(Node::decl)
    }

    /// Identifier text, or dotted text for a qualified name.
    pub fn identifier_text(&self, index: NodeIndex) -> Option<&str> {
        let node = self.get(index)?;
        match (&node.kind, &node.data) {
            (NodeKind::Identifier | NodeKind::QualifiedName, NodeData::Name(name)) => Some(name),
            _ => None,
        }
    }

    /// Name of a declaration, read through its name identifier.
    pub fn decl_name(&self, index: NodeIndex) -> Option<&str> {
        let decl = self.decl(index)?;
        self.identifier_text(decl.name)
    }

    /// Set `parent` on every node reachable from `root`, in a single pass.
    pub fn link_parents(&mut self, root: NodeIndex) {
        let mut stack = vec![(root, NodeIndex::NONE)];
        while let Some((index, parent)) = stack.pop() {
            let Some(node) = self.get_mut(index) else {
                continue;
            };
            node.parent = parent;
            let children = node.children.clone();
            let metadata = node.decl().map(|d| d.metadata).unwrap_or(NodeIndex::NONE);
            stack.extend(children.into_iter().map(|child| (child, index)));
            // Attached metadata is not a child but still points at its owner.
            if metadata.is_some() {
                stack.push((metadata, index));
            }
        }
    }

    /// Insert `child` into `parent`'s child list, keeping source order.
    /// Ties go after existing children with the same start.
    pub fn insert_child(&mut self, parent: NodeIndex, child: NodeIndex) {
        let Some(child_start) = self.get(child).map(|n| n.start) else {
            return;
        };
        let position = {
            let children = self.children(parent);
            children
                .iter()
                .position(|&c| self.get(c).is_some_and(|n| n.start > child_start))
                .unwrap_or(children.len())
        };
        if let Some(node) = self.get_mut(parent) {
            node.children.insert(position, child);
        }
        if let Some(node) = self.get_mut(child) {
            node.parent = parent;
        }
    }

    /// Get the number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
