//! Offset and ancestry queries over a `FileNode`.

use super::file_node::{FileNode, NodeRef};
use super::node::{NodeFlags, NodeKind};

impl FileNode {
    /// `start <= offset < end` for `r`.
    pub fn contains(&self, r: NodeRef, offset: u32) -> bool {
        self.get(r).is_some_and(|n| n.contains(offset))
    }

    /// Deepest node containing `offset`. At each level the first child in
    /// source order that contains the offset wins; implicit nodes never do.
    /// `NodeRef::NONE` when the offset is outside the file.
    pub fn containing_node_at(&self, offset: u32) -> NodeRef {
        let mut current = NodeRef::file(self.root());
        if !self.contains(current, offset) {
            return NodeRef::NONE;
        }
        'descend: loop {
            for child in self.children(current) {
                let Some(node) = self.get(child) else {
                    continue;
                };
                if node.flags.contains(NodeFlags::IMPLICIT) {
                    continue;
                }
                if node.contains(offset) {
                    current = child;
                    continue 'descend;
                }
            }
            return current;
        }
    }

    /// First node in preorder that starts after `offset`, refined to the
    /// deepest descendant sharing that start.
    pub fn succeeding_node(&self, offset: u32) -> NodeRef {
        let mut stack = vec![NodeRef::file(self.root())];
        let mut found = NodeRef::NONE;
        while let Some(r) = stack.pop() {
            let Some(node) = self.get(r) else {
                continue;
            };
            if node.flags.contains(NodeFlags::IMPLICIT) {
                continue;
            }
            if node.start > offset {
                found = r;
                break;
            }
            // Nothing inside a node that ends at or before the offset can start after it.
            if node.end <= offset {
                continue;
            }
            let children = self.children(r);
            stack.extend(children.into_iter().rev());
        }
        if found.is_none() {
            return found;
        }
        loop {
            let start = self.get(found).map_or(0, |n| n.start);
            let next = self
                .children(found)
                .into_iter()
                .find(|&c| self.get(c).is_some_and(|n| n.start == start && !n.is_implicit()));
            match next {
                Some(child) => found = child,
                None => return found,
            }
        }
    }

    /// Nearest strict ancestor of `r` with the given kind.
    pub fn ancestor_of_kind(&self, r: NodeRef, kind: NodeKind) -> NodeRef {
        let mut current = self.parent(r);
        while current.is_some() {
            if self.get(current).is_some_and(|n| n.kind == kind) {
                return current;
            }
            current = self.parent(current);
        }
        NodeRef::NONE
    }

    /// Nearest strict ancestor that owns a lexical scope.
    pub fn containing_scope_node(&self, r: NodeRef) -> NodeRef {
        let mut current = self.parent(r);
        while current.is_some() {
            if self.get(current).is_some_and(|n| n.kind.is_scope_owner()) {
                return current;
            }
            current = self.parent(current);
        }
        NodeRef::NONE
    }

    /// `r` and everything below it in preorder. Deferred bodies are entered
    /// (and parsed) only when `enter_bodies` is set.
    pub fn descendants(&self, r: NodeRef, enter_bodies: bool) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut stack = vec![r];
        while let Some(current) = stack.pop() {
            let Some(node) = self.get(current) else {
                continue;
            };
            out.push(current);
            if !enter_bodies
                && current.body.is_none()
                && node.flags.contains(NodeFlags::DEFERRED_BODY)
            {
                continue;
            }
            stack.extend(self.children(current).into_iter().rev());
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/queries_tests.rs"]
mod queries_tests;
