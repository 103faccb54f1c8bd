//! `[Bindable]` classes without an `extends` clause get an implicit
//! `flash.events.EventDispatcher` base class and a matching import.
//!
//! Runs on a freshly parsed tree, before it is shared or bound. The inserted
//! nodes are zero-width and flagged `IMPLICIT`. A class whose base is already
//! set is left alone, so running the rewrite twice changes nothing.

use asc_binder::BuiltinType;
use asc_parser::{FileNode, Node, NodeData, NodeFlags, NodeIndex, NodeKind};
use std::sync::Arc;
use tracing::debug;

pub const BINDABLE_TAG: &str = "Bindable";

/// Rewrite every eligible class; returns how many were rewritten.
pub fn apply_bindable_rewrite(file: &mut FileNode) -> usize {
    let candidates: Vec<NodeIndex> = file
        .arena()
        .nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.kind == NodeKind::Class)
        .map(|(i, _)| NodeIndex(i as u32))
        .filter(|&class| needs_rewrite(file, class))
        .collect();

    for &class in &candidates {
        rewrite_class(file, class);
    }
    if !candidates.is_empty() {
        debug!(file = %file.file_name(), classes = candidates.len(), "applied bindable rewrite");
    }
    candidates.len()
}

fn needs_rewrite(file: &FileNode, class: NodeIndex) -> bool {
    let arena = file.arena();
    let Some(decl) = arena.decl(class) else {
        return false;
    };
    decl.base.is_none()
        && arena
            .get(decl.metadata)
            .is_some_and(|m| m.meta_tags().iter().any(|t| &*t.name == BINDABLE_TAG))
}

fn rewrite_class(file: &mut FileNode, class: NodeIndex) {
    let qname: Arc<str> = Arc::from(BuiltinType::EventDispatcher.qname());
    let arena = file.arena_mut();
    let (name_end, parent) = {
        let Some(node) = arena.get(class) else {
            return;
        };
        let name_end = node
            .decl()
            .and_then(|d| arena.get(d.name))
            .map_or(node.start, |n| n.end);
        (name_end, node.parent)
    };

    let base = arena.add(
        Node::new(NodeKind::QualifiedName, name_end, name_end)
            .with_data(NodeData::Name(qname.clone()))
            .with_flags(NodeFlags::IMPLICIT),
    );
    if let Some(decl) = arena.get_mut(class).and_then(Node::decl_mut) {
        decl.base = base;
    }
    arena.insert_child(class, base);

    if parent.is_none() || has_import(file, parent, &qname) {
        return;
    }
    let arena = file.arena_mut();
    let Some(at) = arena.get(parent).map(|p| {
        if p.kind == NodeKind::Block {
            (p.start + 1).min(p.end)
        } else {
            p.start
        }
    }) else {
        return;
    };
    let name = arena.add(
        Node::new(NodeKind::QualifiedName, at, at)
            .with_data(NodeData::Name(qname.clone()))
            .with_flags(NodeFlags::IMPLICIT),
    );
    let import = arena.add(
        Node::new(NodeKind::Import, at, at)
            .with_children(vec![name])
            .with_data(NodeData::Import(qname))
            .with_flags(NodeFlags::IMPLICIT),
    );
    if let Some(node) = arena.get_mut(name) {
        node.parent = import;
    }
    arena.insert_child(parent, import);
}

fn has_import(file: &FileNode, parent: NodeIndex, qname: &str) -> bool {
    let arena = file.arena();
    arena.children(parent).iter().any(|&c| {
        arena.get(c).is_some_and(|n| {
            n.kind == NodeKind::Import
                && !n.flags.contains(NodeFlags::WILDCARD)
                && n.name().is_some_and(|name| &**name == qname)
        })
    })
}

#[cfg(test)]
#[path = "../tests/bindable_tests.rs"]
mod bindable_tests;
