use super::*;
use asc_parser::{NodeRef, ParseOptions, parse_file};

fn parse(text: &str) -> FileNode {
    parse_file(
        Arc::from("Test.as"),
        Arc::from(text),
        None,
        ParseOptions::default(),
    )
}

fn class_named(file: &FileNode, name: &str) -> NodeIndex {
    file.descendants(NodeRef::file(file.root()), false)
        .into_iter()
        .find(|&r| {
            file.get(r).is_some_and(|n| n.kind == NodeKind::Class)
                && file.arena().decl_name(r.node) == Some(name)
        })
        .map(|r| r.node)
        .unwrap_or_else(|| panic!("no class {name}"))
}

fn imports(file: &FileNode) -> Vec<(String, bool)> {
    file.descendants(NodeRef::file(file.root()), false)
        .into_iter()
        .filter_map(|r| file.get(r))
        .filter(|n| n.kind == NodeKind::Import)
        .map(|n| (n.name().map(|s| s.to_string()).unwrap_or_default(), n.is_implicit()))
        .collect()
}

#[test]
fn test_bindable_class_gets_event_dispatcher_base() {
    let mut file = parse("package p {\n[Bindable]\npublic class Y {}\n}");
    assert_eq!(apply_bindable_rewrite(&mut file), 1);

    let class = class_named(&file, "Y");
    let arena = file.arena();
    let decl = arena.decl(class).unwrap();
    let base = arena.get(decl.base).unwrap();
    assert_eq!(base.kind, NodeKind::QualifiedName);
    assert!(base.is_implicit());
    assert_eq!(base.start, base.end);
    assert_eq!(arena.identifier_text(decl.base), Some("flash.events.EventDispatcher"));
    assert_eq!(base.parent, class);
    // Base follows the name among the class children.
    let children = arena.children(class);
    assert_eq!(children[0], decl.name);
    assert_eq!(children[1], decl.base);

    assert_eq!(
        imports(&file),
        vec![("flash.events.EventDispatcher".to_string(), true)]
    );
}

#[test]
fn test_rewrite_is_idempotent() {
    let mut file = parse("[Bindable] class Y {}");
    assert_eq!(apply_bindable_rewrite(&mut file), 1);
    let nodes = file.arena().len();
    let children = file.arena().children(class_named(&file, "Y")).to_vec();

    assert_eq!(apply_bindable_rewrite(&mut file), 0);
    assert_eq!(file.arena().len(), nodes);
    assert_eq!(file.arena().children(class_named(&file, "Y")), &children[..]);
    assert_eq!(imports(&file).len(), 1);
}

#[test]
fn test_explicit_base_and_untagged_classes_are_untouched() {
    let mut file = parse(
        "package {\n[Bindable] public class A extends B {}\npublic class C {}\n[Event] class D {}\n}",
    );
    let before = file.arena().len();
    assert_eq!(apply_bindable_rewrite(&mut file), 0);
    assert_eq!(file.arena().len(), before);
    assert!(imports(&file).is_empty());
}

#[test]
fn test_existing_import_is_not_duplicated() {
    let mut file = parse(
        "package {\nimport flash.events.EventDispatcher;\n[Bindable] public class Y {}\n}",
    );
    assert_eq!(apply_bindable_rewrite(&mut file), 1);
    assert_eq!(
        imports(&file),
        vec![("flash.events.EventDispatcher".to_string(), false)]
    );
}

#[test]
fn test_rewritten_spans_stay_inside_parents() {
    let mut file = parse("package q {\n[Bindable]\npublic class Y {\n  var x:int;\n}\n}");
    apply_bindable_rewrite(&mut file);
    let arena = file.arena();
    for r in file.descendants(NodeRef::file(file.root()), false) {
        let node = file.get(r).unwrap();
        let parent = file.parent(r);
        if let Some(p) = file.get(parent) {
            assert!(p.start <= node.start && node.end <= p.end, "{:?} escapes {:?}", node.kind, p.kind);
        }
    }
    assert!(arena.len() > 0);
}
