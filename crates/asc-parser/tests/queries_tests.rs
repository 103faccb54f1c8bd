use super::*;
use crate::parser::{ParseOptions, parse_file};
use std::sync::Arc;

fn parse(text: &str, defer: bool) -> FileNode {
    parse_file(
        Arc::from("Test.as"),
        Arc::from(text),
        None,
        ParseOptions {
            defer_function_bodies: defer,
        },
    )
}

#[test]
fn test_containing_node_at_function_name() {
    let text = "class A { function f():void {} }";
    let offset = text.find(" f(").unwrap() as u32 + 1;
    for defer in [false, true] {
        let file = parse(text, defer);
        let found = file.containing_node_at(offset);
        let node = file.get(found).unwrap();
        assert_eq!(node.kind, NodeKind::Identifier);
        assert_eq!(file.identifier_text(found), Some("f"));
        let function = file.parent(found);
        assert_eq!(file.get(function).unwrap().kind, NodeKind::Function);
    }
}

#[test]
fn test_containing_node_at_enters_deferred_body() {
    let text = "function f():void { var x:int = 1; }";
    let file = parse(text, true);
    let block = file.deferred_blocks()[0];
    assert!(!file.is_body_parsed(block));

    let offset = text.find("x:").unwrap() as u32;
    let found = file.containing_node_at(offset);
    assert!(found.in_body());
    assert_eq!(file.identifier_text(found), Some("x"));
    assert!(file.is_body_parsed(block));

    // The body's top-level statement hangs off the placeholder.
    let variable = file.parent(found);
    let list = file.parent(variable);
    assert_eq!(file.parent(list), NodeRef::file(block));
}

#[test]
fn test_containing_node_outside_file() {
    let file = parse("var a;", false);
    assert!(file.containing_node_at(1000).is_none());
}

#[test]
fn test_succeeding_node() {
    let text = "var a:int = 1;\nvar b:String;";
    let file = parse(text, false);
    let after_first = text.find('\n').unwrap() as u32;
    let found = file.succeeding_node(after_first);
    let node = file.get(found).unwrap();
    // Deepest node starting at the second `var` is the list itself.
    assert_eq!(node.kind, NodeKind::VariableList);
    assert_eq!(node.start, after_first + 1);

    let found = file.succeeding_node(after_first + 1);
    assert_eq!(file.identifier_text(found), Some("b"));
}

#[test]
fn test_succeeding_node_past_end() {
    let file = parse("var a;", false);
    assert!(file.succeeding_node(100).is_none());
}

#[test]
fn test_ancestor_and_scope_queries() {
    let text = "package p { class A { function f():void { var y = 2; } } }";
    let file = parse(text, true);
    let offset = text.find("y =").unwrap() as u32;
    let y = file.containing_node_at(offset);
    assert_eq!(file.identifier_text(y), Some("y"));

    let class = file.ancestor_of_kind(y, NodeKind::Class);
    assert_eq!(file.get(class).unwrap().kind, NodeKind::Class);
    let package = file.ancestor_of_kind(y, NodeKind::Package);
    assert!(package.is_some());

    let scope = file.containing_scope_node(y);
    assert_eq!(file.get(scope).unwrap().kind, NodeKind::Function);
    let outer = file.containing_scope_node(scope);
    assert_eq!(outer, class);
    assert!(file.ancestor_of_kind(NodeRef::file(file.root()), NodeKind::File).is_none());
}

#[test]
fn test_descendants_respects_deferral() {
    let text = "function f() { var inner; }";
    let file = parse(text, true);
    let root = NodeRef::file(file.root());
    let shallow = file.descendants(root, false);
    assert!(shallow.iter().all(|r| !r.in_body()));
    assert!(!file.is_body_parsed(file.deferred_blocks()[0]));

    let deep = file.descendants(root, true);
    assert!(deep.len() > shallow.len());
    assert!(deep.iter().any(|&r| file.identifier_text(r) == Some("inner")));
}
