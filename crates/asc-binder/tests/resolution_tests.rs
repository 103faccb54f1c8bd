//! Name resolution across several in-memory compilation units.

use asc_binder::{
    Definition, DefinitionKind, DefinitionOrigin, DefinitionPriority, FileScope,
    ProjectScope, ReferenceCache, ResolutionContext, ScopeCache, ScopeId, ScopeKind, bind_file,
    Reference, find_property, find_property_multiname, find_property_qualified,
    resolve_base_class, resolve_type,
};
use asc_binder::namespace::NamespaceKey;
use asc_common::{DependencyType, UnitId};
use asc_parser::{FileNode, NodeKind, NodeRef, ParseOptions, parse_file};
use rayon::prelude::*;
use std::sync::{Arc, Mutex};

const BUILTINS: &str = r#"
package {
    public class Object {}
    public class String {}
    public class Number {}
    public class Function {}
    public class Class {}
    public dynamic class Vector {}
}
"#;

type Edge = (UnitId, UnitId, DependencyType, String);

/// A fully bound project: unit 0 is the builtins file, the rest follow in
/// the order given.
struct TestProject {
    project: ProjectScope,
    trees: Vec<Arc<FileNode>>,
    scopes: Vec<Arc<FileScope>>,
    caches: Vec<Arc<ScopeCache>>,
    edges: Mutex<Vec<Edge>>,
}

impl ResolutionContext for TestProject {
    fn project_scope(&self) -> &ProjectScope {
        &self.project
    }

    fn file_scope(&self, unit: UnitId) -> Option<Arc<FileScope>> {
        self.scopes.get(unit.0 as usize).cloned()
    }

    fn add_dependency(&self, from: UnitId, to: UnitId, dependency: DependencyType, qname: &str) {
        self.edges
            .lock()
            .unwrap()
            .push((from, to, dependency, qname.to_string()));
    }

    fn scope_cache(&self, unit: UnitId) -> Option<Arc<ScopeCache>> {
        self.caches.get(unit.0 as usize).cloned()
    }
}

impl TestProject {
    fn new(sources: &[&str]) -> TestProject {
        let refs = Arc::new(ReferenceCache::new());
        let project = ProjectScope::new();
        let mut trees = Vec::new();
        let mut scopes = Vec::new();
        let all = std::iter::once(BUILTINS).chain(sources.iter().copied());
        for (i, text) in all.enumerate() {
            let tree = Arc::new(parse_file(
                Arc::from(format!("Unit{i}.as")),
                Arc::from(text),
                None,
                ParseOptions {
                    defer_function_bodies: true,
                },
            ));
            let fs = Arc::new(bind_file(UnitId(i as u32), &tree, refs.clone()));
            let origin = if i == 0 {
                DefinitionOrigin::Library
            } else {
                DefinitionOrigin::SourceList
            };
            project.add_file_scope(&fs, DefinitionPriority::new(origin, i as u32));
            trees.push(tree);
            scopes.push(fs);
        }
        let caches = scopes.iter().map(|_| Arc::new(ScopeCache::new())).collect();
        TestProject {
            project,
            trees,
            scopes,
            caches,
            edges: Mutex::new(Vec::new()),
        }
    }

    fn unit(&self, i: u32) -> (&FileNode, &FileScope) {
        (&self.trees[i as usize], &self.scopes[i as usize])
    }

    fn def(&self, i: u32, qname: &str) -> Arc<Definition> {
        self.scopes[i as usize]
            .definitions()
            .iter()
            .find(|d| &**d.qname() == qname)
            .cloned()
            .unwrap_or_else(|| panic!("no {qname} in unit {i}"))
    }

    fn lookup(&self, i: u32, scope: ScopeId, name: &str) -> Option<Arc<Definition>> {
        let (_, fs) = self.unit(i);
        find_property(self, fs, scope, name, None, false, true)
    }

    fn edges(&self) -> Vec<Edge> {
        self.edges.lock().unwrap().clone()
    }

    /// Body scope of the function declared as `name` in unit `i`.
    fn body_of(&self, i: u32, name: &str) -> ScopeId {
        let (file, fs) = self.unit(i);
        let function = file
            .descendants(NodeRef::file(file.root()), false)
            .into_iter()
            .find(|&r| {
                file.get(r).is_some_and(|n| n.kind == NodeKind::Function)
                    && file.arena().decl_name(r.node) == Some(name)
            })
            .unwrap_or_else(|| panic!("no function {name}"));
        fs.body_scope(file, function.node).unwrap()
    }

    fn first_node(&self, i: u32, kind: NodeKind) -> NodeRef {
        let (file, _) = self.unit(i);
        file.descendants(NodeRef::file(file.root()), true)
            .into_iter()
            .find(|&r| file.get(r).is_some_and(|n| n.kind == kind))
            .unwrap_or_else(|| panic!("no {kind:?} node"))
    }
}

#[test]
fn test_same_package_class_resolves_and_records_dependency() {
    let p = TestProject::new(&[
        "package app { public class A { public var b:B; } }",
        "package app { public class B {} }",
    ]);
    let field = p.def(1, "b");
    let (_, fs) = p.unit(1);
    let ty = resolve_type(&p, fs, &field, Some(DependencyType::Signature)).unwrap();
    assert!(Arc::ptr_eq(&ty, &p.def(2, "app.B")));
    assert_eq!(
        p.edges(),
        vec![(UnitId(1), UnitId(2), DependencyType::Signature, "app.B".to_string())]
    );
}

#[test]
fn test_lookups_are_identity_stable() {
    let p = TestProject::new(&["package app { public class A { public var s:String; } }"]);
    let class = p.def(1, "app.A");
    let first = p.lookup(1, class.members_scope(), "String").unwrap();
    let second = p.lookup(1, class.members_scope(), "String").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &p.def(0, "String")));
    // Builtins resolve without a dependency type, so nothing is recorded.
    assert!(p.edges().is_empty());
}

#[test]
fn test_imports_open_other_packages() {
    let p = TestProject::new(&[
        "package lib { public class Tool {} public class Other {} }",
        "package app { import lib.Tool; public class User {} }",
        "package app2 { import lib.*; public class User {} }",
        "package app3 { public class User {} }",
    ]);
    let user2 = p.def(2, "app.User");
    assert!(p.lookup(2, user2.members_scope(), "Tool").is_some());
    assert!(p.lookup(2, user2.members_scope(), "Other").is_none());

    let user3 = p.def(3, "app2.User");
    assert!(p.lookup(3, user3.members_scope(), "Tool").is_some());
    assert!(p.lookup(3, user3.members_scope(), "Other").is_some());

    let user4 = p.def(4, "app3.User");
    assert!(p.lookup(4, user4.members_scope(), "Tool").is_none());
}

#[test]
fn test_internal_definitions_stay_in_package() {
    let p = TestProject::new(&[
        "package lib { internal class Secret {} }",
        "package lib { public class Insider {} }",
        "package other { import lib.*; public class Outsider {} }",
    ]);
    let insider = p.def(2, "lib.Insider");
    assert!(p.lookup(2, insider.members_scope(), "Secret").is_some());
    let outsider = p.def(3, "other.Outsider");
    assert!(p.lookup(3, outsider.members_scope(), "Secret").is_none());
}

#[test]
fn test_two_imported_classes_are_ambiguous() {
    let p = TestProject::new(&[
        "package a { public class Foo {} }",
        "package b { public class Foo {} }",
        "package c { import a.*; import b.*; public class User {} }",
        "package d { import a.*; import b.*; public class Foo {} }",
    ]);
    let user = p.def(3, "c.User");
    let found = p.lookup(3, user.members_scope(), "Foo").unwrap();
    assert!(found.is_ambiguous());
    assert!(Arc::ptr_eq(&found, &Definition::ambiguous()));

    // A qualified reference is not ambiguous.
    let (_, fs) = p.unit(3);
    let qualified = find_property_qualified(
        &p,
        fs,
        user.members_scope(),
        &NamespaceKey::Public(Arc::from("b")),
        "Foo",
        None,
        false,
    )
    .unwrap();
    assert!(Arc::ptr_eq(&qualified, &p.def(2, "b.Foo")));

    // The candidate declared in the referencing unit wins.
    let local = p.def(4, "d.Foo");
    let found = p.lookup(4, local.members_scope(), "Foo").unwrap();
    assert!(Arc::ptr_eq(&found, &local));
}

#[test]
fn test_ambiguous_results_record_no_dependency() {
    let p = TestProject::new(&[
        "package a { public class Foo {} }",
        "package b { public class Foo {} }",
        "package c { import a.*; import b.*; public class User {} }",
    ]);
    let user = p.def(3, "c.User");
    let (_, fs) = p.unit(3);
    let found = find_property(
        &p,
        fs,
        user.members_scope(),
        "Foo",
        Some(DependencyType::Expression),
        false,
        true,
    )
    .unwrap();
    assert!(found.is_ambiguous());
    assert!(p.edges().is_empty());
    assert!(p.caches[3].is_empty());
}

#[test]
fn test_inherited_members_respect_access() {
    let p = TestProject::new(&[
        r#"package q {
            public class Base {
                protected var shared:String;
                private var hidden:String;
                internal var packaged:String;
                public function greet():void {}
            }
        }"#,
        "package q { public class Derived extends Base { } }",
        "package r { import q.Base; public class Far extends Base { } }",
    ]);
    let derived = p.def(2, "q.Derived");
    let members = derived.members_scope();
    let shared = p.lookup(2, members, "shared").unwrap();
    assert!(Arc::ptr_eq(&shared, &p.def(1, "shared")));
    assert!(p.lookup(2, members, "hidden").is_none());
    assert!(p.lookup(2, members, "packaged").is_some());
    assert!(p.lookup(2, members, "greet").is_some());

    let far = p.def(3, "r.Far");
    assert!(p.lookup(3, far.members_scope(), "shared").is_some());
    assert!(p.lookup(3, far.members_scope(), "packaged").is_none());
}

#[test]
fn test_base_class_resolution() {
    let p = TestProject::new(&[
        "package q { public class Base {} public interface IThing {} }",
        "package q { public class Derived extends Base implements IThing {} }",
        "package q { public class Bad extends IThing {} }",
    ]);
    let (_, fs) = p.unit(2);
    let base = resolve_base_class(&p, fs, &p.def(2, "q.Derived")).unwrap();
    assert!(Arc::ptr_eq(&base, &p.def(1, "q.Base")));

    let (_, fs1) = p.unit(1);
    let object = resolve_base_class(&p, fs1, &p.def(1, "q.Base")).unwrap();
    assert!(Arc::ptr_eq(&object, &p.def(0, "Object")));

    let (_, fs3) = p.unit(3);
    assert!(resolve_base_class(&p, fs3, &p.def(3, "q.Bad")).is_none());
    assert_eq!(p.def(2, "q.Derived").interface_refs().len(), 1);
}

#[test]
fn test_circular_inheritance_terminates() {
    let p = TestProject::new(&[
        "package loop { public class A extends B {} }",
        "package loop { public class B extends A {} }",
    ]);
    let a = p.def(1, "loop.A");
    assert!(p.lookup(1, a.members_scope(), "nothingHere").is_none());
}

#[test]
fn test_with_hides_outer_definitions() {
    let p = TestProject::new(&[r#"
        package w {
            public class WithUser {
                public function run(o:Object):void {
                    var local:String;
                    with (o) {
                        local;
                    }
                }
            }
        }
    "#]);
    let (file, fs) = p.unit(1);
    let with = p.first_node(1, NodeKind::With);
    let block = file.children(with)[1];
    let scope = fs.scope_at(file, block);
    assert_eq!(fs.scope(scope).unwrap().kind, ScopeKind::With);

    assert!(find_property(&p, fs, scope, "local", None, false, false).is_none());
    let escaped = find_property(&p, fs, scope, "local", None, true, false).unwrap();
    assert_eq!(escaped.kind, DefinitionKind::Variable);

    // Outside the `with` the local is visible either way.
    let body = p.body_of(1, "run");
    assert!(find_property(&p, fs, body, "local", None, false, false).is_some());
}

#[test]
fn test_getter_setter_pair_resolves_to_getter() {
    let p = TestProject::new(&[r#"
        package g {
            public class Acc {
                public function get v():String { return null; }
                public function set v(x:String):void {}
            }
        }
    "#]);
    let acc = p.def(1, "g.Acc");
    let found = p.lookup(1, acc.members_scope(), "v").unwrap();
    assert_eq!(found.kind, DefinitionKind::Getter);
}

#[test]
fn test_function_and_class_prefer_by_context() {
    let p = TestProject::new(&["class Thing {} function Thing():void {}"]);
    let (_, fs) = p.unit(1);
    let as_type = find_property(&p, fs, ScopeId::FILE, "Thing", None, false, true).unwrap();
    assert_eq!(as_type.kind, DefinitionKind::Class);
    let as_value = find_property(&p, fs, ScopeId::FILE, "Thing", None, false, false).unwrap();
    assert_eq!(as_value.kind, DefinitionKind::Function);
}

#[test]
fn test_redeclared_variables_merge() {
    let p = TestProject::new(&[r#"
        function same():void { var a:String; var a:String; }
        function widen():void { var b; var b:String; }
        function narrow():void { var c:String; var c; }
        function clash():void { var d:String; var d:Number; }
    "#]);
    let (_, fs) = p.unit(1);

    let body = p.body_of(1, "same");
    let found = p.lookup(1, body, "a").unwrap();
    let declared = &fs.scope(body).unwrap().get("a").to_vec();
    assert!(Arc::ptr_eq(&found, &declared[0]));

    let body = p.body_of(1, "widen");
    let found = p.lookup(1, body, "b").unwrap();
    assert!(Arc::ptr_eq(&found, &fs.scope(body).unwrap().get("b")[1]));

    let body = p.body_of(1, "narrow");
    let found = p.lookup(1, body, "c").unwrap();
    assert!(Arc::ptr_eq(&found, &fs.scope(body).unwrap().get("c")[0]));

    let body = p.body_of(1, "clash");
    assert!(p.lookup(1, body, "d").unwrap().is_ambiguous());
}

#[test]
fn test_redeclared_function_keeps_last() {
    let p = TestProject::new(&["function twice():void {} function twice():String { return null; }"]);
    let (_, fs) = p.unit(1);
    let found = find_property(&p, fs, ScopeId::FILE, "twice", None, false, false).unwrap();
    let declared = fs.scope(ScopeId::FILE).unwrap().get("twice").to_vec();
    assert_eq!(declared.len(), 2);
    assert!(Arc::ptr_eq(&found, &declared[1]));
}

#[test]
fn test_function_beats_untyped_variable() {
    let p = TestProject::new(&[
        "var handler; function handler():void {}",
        "var typed:String; function typed():void {}",
    ]);
    let (_, fs) = p.unit(1);
    let found = find_property(&p, fs, ScopeId::FILE, "handler", None, false, false).unwrap();
    assert_eq!(found.kind, DefinitionKind::Function);

    let (_, fs) = p.unit(2);
    let found = find_property(&p, fs, ScopeId::FILE, "typed", None, false, false).unwrap();
    assert!(found.is_ambiguous());
}

#[test]
fn test_constants_never_merge() {
    let p = TestProject::new(&["function f():void { const k:String = null; var k:String; }"]);
    let body = p.body_of(1, "f");
    assert!(p.lookup(1, body, "k").unwrap().is_ambiguous());
}

#[test]
fn test_vector_types_are_applied() {
    let p = TestProject::new(&[
        "package v { public class Holder { public var names:Vector.<String>; public var more:Vector.<String>; } }",
    ]);
    let (_, fs) = p.unit(1);
    let names = resolve_type(&p, fs, &p.def(1, "names"), None).unwrap();
    let more = resolve_type(&p, fs, &p.def(1, "more"), None).unwrap();
    assert_eq!(names.kind, DefinitionKind::AppliedVector);
    assert_eq!(names.element_type(), Some("String"));
    assert!(Arc::ptr_eq(&names, &more));
}

#[test]
fn test_cache_hit_records_dependency_again() {
    let p = TestProject::new(&[
        "package app { public class A { public var b:B; } }",
        "package app { public class B {} }",
    ]);
    let field = p.def(1, "b");
    let (_, fs) = p.unit(1);
    let first = resolve_type(&p, fs, &field, Some(DependencyType::Signature)).unwrap();
    assert_eq!(p.caches[1].len(), 1);
    let second = resolve_type(&p, fs, &field, Some(DependencyType::Signature)).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(p.edges().len(), 2);
    assert_eq!(p.caches[1].len(), 1);
}

#[test]
fn test_cache_hit_records_the_callers_dependency_type() {
    let p = TestProject::new(&[
        "package app { public class A { public var b:B; } }",
        "package app { public class B {} }",
    ]);
    let class = p.def(1, "app.A");
    let (_, fs) = p.unit(1);
    let scope = class.members_scope();
    let signature = find_property(&p, fs, scope, "B", Some(DependencyType::Signature), false, true)
        .unwrap();
    let inheritance =
        find_property(&p, fs, scope, "B", Some(DependencyType::Inheritance), false, true).unwrap();
    assert!(Arc::ptr_eq(&signature, &inheritance));
    assert_eq!(p.caches[1].len(), 1);
    let kinds: Vec<DependencyType> = p.edges().iter().map(|e| e.2).collect();
    assert_eq!(kinds, vec![DependencyType::Signature, DependencyType::Inheritance]);
}

#[test]
fn test_multiname_lookup_returns_stable_ambiguity() {
    let p = TestProject::new(&[
        "package a { public class Foo {} }",
        "package b { public class Foo {} }",
        "package c { public class User {} }",
    ]);
    let user = p.def(3, "c.User");
    let (_, fs) = p.unit(3);
    let namespaces = [
        NamespaceKey::Public(Arc::from("a")),
        NamespaceKey::Public(Arc::from("b")),
    ];
    let first = find_property_multiname(
        &p,
        fs,
        user.members_scope(),
        &namespaces,
        "Foo",
        Some(DependencyType::Expression),
        false,
    )
    .unwrap();
    let second = find_property_multiname(
        &p,
        fs,
        user.members_scope(),
        &namespaces,
        "Foo",
        Some(DependencyType::Expression),
        false,
    )
    .unwrap();
    assert!(first.is_ambiguous());
    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &Definition::ambiguous()));
    assert!(p.edges().is_empty());

    // The same lookup through a multi-qualifier reference.
    let reference = Reference::qualified(namespaces.iter().cloned(), "Foo");
    let via_reference = reference
        .resolve(&p, fs, user.members_scope(), None, false)
        .unwrap();
    assert!(Arc::ptr_eq(&via_reference, &first));

    // One matching namespace among several is not ambiguous.
    let narrowed = [
        NamespaceKey::Public(Arc::from("b")),
        NamespaceKey::Public(Arc::from("nowhere")),
    ];
    let found = find_property_multiname(&p, fs, user.members_scope(), &narrowed, "Foo", None, false)
        .unwrap();
    assert!(Arc::ptr_eq(&found, &p.def(2, "b.Foo")));
}

#[test]
fn test_resolved_and_not_a_type_references() {
    let p = TestProject::new(&["package app { public class A {} }"]);
    let class = p.def(1, "app.A");
    let (_, fs) = p.unit(1);

    let bound = Reference::Resolved(p.def(0, "String"));
    let found = bound
        .resolve(&p, fs, class.members_scope(), None, false)
        .unwrap();
    assert!(Arc::ptr_eq(&found, &p.def(0, "String")));
    assert_eq!(&*bound.name(), "String");

    let broken = Reference::NotAType(Arc::from("Oops"));
    assert!(
        broken
            .resolve(&p, fs, class.members_scope(), Some(DependencyType::Signature), false)
            .is_none()
    );
    assert_eq!(&*broken.name(), "Oops");
    assert!(p.edges().is_empty());
}

#[test]
fn test_file_level_imports_stay_outside_the_package() {
    let p = TestProject::new(&[
        "package lib { public class Tool {} }",
        "package app { public class User {} } import lib.Tool; class Helper {}",
    ]);
    let user = p.def(2, "app.User");
    assert!(p.lookup(2, user.members_scope(), "Tool").is_none());

    let (_, fs) = p.unit(2);
    let outside = find_property(&p, fs, ScopeId::FILE, "Tool", None, false, true).unwrap();
    assert!(Arc::ptr_eq(&outside, &p.def(1, "lib.Tool")));
}

#[test]
fn test_stale_cache_entries_are_recomputed() {
    let p = TestProject::new(&[
        "package app { public class A { public var b:B; } }",
        "package app { public class B {} }",
    ]);
    let field = p.def(1, "b");
    let (_, fs) = p.unit(1);
    resolve_type(&p, fs, &field, Some(DependencyType::Signature)).unwrap();

    p.project.remove_unit(UnitId(2), None);
    assert!(resolve_type(&p, fs, &field, Some(DependencyType::Signature)).is_none());
    assert_eq!(p.project.unfound_dependents("B"), vec![UnitId(1)]);
}

#[test]
fn test_parallel_lookups_agree() {
    let p = TestProject::new(&[
        "package app { public class A { public var b:B; public var s:String; } }",
        "package app { public class B {} }",
    ]);
    let class = p.def(1, "app.A");
    let scope = class.members_scope();
    let expected = p.lookup(1, scope, "B").unwrap();
    let results: Vec<Arc<Definition>> = (0..64)
        .into_par_iter()
        .map(|i| {
            let (_, fs) = p.unit(1);
            let dependency = (i % 2 == 0).then_some(DependencyType::Expression);
            find_property(&p, fs, scope, "B", dependency, false, true).unwrap()
        })
        .collect();
    assert!(results.iter().all(|d| Arc::ptr_eq(d, &expected)));
    assert!(
        p.edges()
            .iter()
            .all(|e| e.0 == UnitId(1) && e.1 == UnitId(2) && e.2 == DependencyType::Expression)
    );
}

#[test]
fn test_parallel_body_population() {
    let p = TestProject::new(&[r#"
        package app {
            public class Many {
                public function a():void { var x:String; }
                public function b():void { var x:String; }
                public function c():void { var x:String; }
                public function d():void { var x:String; }
            }
        }
    "#]);
    let names = ["a", "b", "c", "d"];
    let scopes: Vec<ScopeId> = names
        .par_iter()
        .map(|name| p.body_of(1, name))
        .collect();
    let mut unique = scopes.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), names.len());
    let (_, fs) = p.unit(1);
    for scope in scopes {
        let s = fs.scope(scope).unwrap();
        assert_eq!(s.kind, ScopeKind::FunctionBody);
        assert_eq!(s.get("x").len(), 1);
        let found = p.lookup(1, scope, "String").unwrap();
        assert!(Arc::ptr_eq(&found, &p.def(0, "String")));
    }
}
