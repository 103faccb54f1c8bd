//! End-to-end behaviour of the compilation unit request pipeline.

use asc_binder::{ResolutionContext, resolve_base_class};
use asc_common::problems::problem_codes;
use asc_common::{DependencyTypeSet, UnitId};
use asc_parser::{ParseOptions, parse_file};
use asc_units::{
    AbcResult, CodeGenerator, CompilationUnit, CompileError, Flavor, GenerateInput, Operations,
    Project, ProjectConfig, SummaryGenerator, Workspace,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const ROOT: &str = "/mem/src";

fn setup(
    config: ProjectConfig,
    generator: Arc<dyn CodeGenerator>,
    files: &[(&str, &str)],
) -> (Arc<Project>, Vec<Arc<CompilationUnit>>) {
    let workspace = Arc::new(Workspace::new());
    let project = Project::with_generator(config, workspace.clone(), generator);
    let root = Path::new(ROOT);
    let units = files
        .iter()
        .map(|(relative, text)| {
            let path = root.join(relative);
            workspace.set_file_text(&path.to_string_lossy(), text);
            project.add_source_path_file(root, &path)
        })
        .collect();
    (project, units)
}

fn default_setup(files: &[(&str, &str)]) -> (Arc<Project>, Vec<Arc<CompilationUnit>>) {
    setup(ProjectConfig::default(), Arc::new(SummaryGenerator), files)
}

/// Counts calls and delegates to the summary generator.
#[derive(Default)]
struct CountingGenerator {
    calls: AtomicUsize,
}

impl CodeGenerator for CountingGenerator {
    fn generate(&self, input: &GenerateInput<'_>) -> Result<AbcResult, CompileError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        SummaryGenerator.generate(input)
    }
}

struct PanickingGenerator;

impl CodeGenerator for PanickingGenerator {
    fn generate(&self, _input: &GenerateInput<'_>) -> Result<AbcResult, CompileError> {
        panic!("emitter exploded")
    }
}

#[test]
fn test_concurrent_abc_requests_generate_once() {
    let generator = Arc::new(CountingGenerator::default());
    let (_project, units) = setup(
        ProjectConfig::default(),
        generator.clone(),
        &[("p/Shared.as", "package p { public class Shared { public function f():int { return 1; } } }")],
    );
    let unit = &units[0];
    let barrier = Barrier::new(8);

    let results: Vec<Arc<AbcResult>> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    unit.abc_bytes_result().unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
    assert!(unit.operations().contains(Operations::ABC_BYTES));
}

#[test]
fn test_evicted_tree_is_reparsed_on_demand() {
    let text = "package p {\n  public class Kept {\n    public function f(a:int):int { return a + 1; }\n  }\n}";
    let (_project, units) = default_setup(&[("p/Kept.as", text)]);
    let unit = &units[0];

    let syntax = unit.syntax_tree_result().unwrap();
    assert!(syntax.is_ast_resident());
    unit.outgoing_dependencies_result().unwrap();
    assert!(syntax.is_ast_resident(), "released before code generation ran");
    unit.abc_bytes_result().unwrap();
    assert!(!syntax.is_ast_resident());

    let reference = parse_file(
        Arc::from("/mem/src/p/Kept.as"),
        Arc::from(text),
        None,
        ParseOptions {
            defer_function_bodies: true,
        },
    );
    let tree = syntax.ast().unwrap();
    assert!(tree.structurally_equal(&reference));
    // The unit answers with the re-parsed tree from now on.
    assert!(Arc::ptr_eq(&unit.ast().unwrap(), &tree));
    assert!(unit.file_scope_result().unwrap().file_scope.tree().is_some());
}

#[test]
fn test_externally_visible_name_uses_earliest_definition() {
    let workspace = Arc::new(Workspace::new());
    let project = Project::new(ProjectConfig::default(), workspace.clone());
    let text = "package {\n  public function zeta():void {}\n  public class Alpha {}\n}";
    workspace.set_file_text("/mem/Loose.as", text);
    let unit = project.add_source_file("/mem/Loose.as");

    for _ in 0..3 {
        let fs = unit.file_scope_result().unwrap();
        let visible = fs.file_scope.externally_visible();
        assert!(visible[0].span().start < visible[1].span().start);
        assert_eq!(unit.externally_visible_name(&fs.file_scope), "zeta");
        assert_eq!(&*unit.swf_tags_result().unwrap().tag_name, "zeta");
        unit.clean(true);
    }
}

#[test]
fn test_base_class_resolution_records_inheritance_edge() {
    let (project, units) = default_setup(&[
        ("X.as", "package { import a.b.C; public class X extends C {} }"),
        ("a/b/C.as", "package a.b { public class C {} }"),
    ]);
    let (x_unit, c_unit) = (&units[0], &units[1]);
    assert!(x_unit.outgoing_dependencies_result().unwrap().problems.is_empty());

    let types = project
        .dependency_graph()
        .dependency_types(x_unit.id(), c_unit.id());
    assert!(types.contains(DependencyTypeSet::INHERITANCE));

    let x_scope = x_unit.file_scope_result().unwrap().file_scope.clone();
    let x = project.scope().lookup_qname(project.as_ref(), "X").unwrap();
    let c = project.scope().lookup_qname(project.as_ref(), "a.b.C").unwrap();
    let base = resolve_base_class(project.as_ref(), &x_scope, &x).unwrap();
    assert!(Arc::ptr_eq(&base, &c));
    assert_eq!(c.unit(), c_unit.id());
}

#[test]
fn test_bindable_class_extends_event_dispatcher() {
    let text = "package p {\n  [Bindable]\n  public class Y {\n    public var label:String;\n  }\n}";
    let (project, units) = default_setup(&[("p/Y.as", text)]);
    let unit = &units[0];
    assert_eq!(project.config().flavor, Flavor::Royale);

    let tree = unit.ast().unwrap();
    let y = project.scope().lookup_qname(project.as_ref(), "p.Y").unwrap();
    let base_node = tree.arena().decl(y.node().node).unwrap().base;
    assert_eq!(
        tree.arena().identifier_text(base_node),
        Some("flash.events.EventDispatcher")
    );
    assert!(unit.wait_for_build_finish().unwrap().is_empty());

    let fs = unit.file_scope_result().unwrap().file_scope.clone();
    let base = resolve_base_class(project.as_ref(), &fs, &y).unwrap();
    assert_eq!(&**base.qname(), "flash.events.EventDispatcher");
    assert_eq!(base.unit(), UnitId(0));
}

#[test]
fn test_flash_flavor_leaves_bindable_classes_alone() {
    let config = ProjectConfig {
        flavor: Flavor::Flash,
        ..ProjectConfig::default()
    };
    let (project, units) = setup(
        config,
        Arc::new(SummaryGenerator),
        &[("p/Y.as", "package p { [Bindable] public class Y {} }")],
    );
    let tree = units[0].ast().unwrap();
    let y = project.scope().lookup_qname(project.as_ref(), "p.Y").unwrap();
    assert!(tree.arena().decl(y.node().node).unwrap().base.is_none());
}

#[test]
fn test_generator_panic_becomes_internal_error_problem() {
    let (_project, units) = setup(
        ProjectConfig::default(),
        Arc::new(PanickingGenerator),
        &[("p/Boom.as", "package p { public class Boom {} }")],
    );
    let problems = units[0].wait_for_build_finish().unwrap();
    let internal: Vec<_> = problems
        .iter()
        .filter(|p| p.code == problem_codes::INTERNAL_ERROR)
        .collect();
    assert_eq!(internal.len(), 1, "{problems:?}");
    assert!(internal[0].message.contains("emitter exploded"));

    // The failure is published: asking again does not re-run the generator.
    assert!(matches!(
        units[0].abc_bytes_result(),
        Err(CompileError::Internal { .. })
    ));
}

#[test]
fn test_cancelled_build_can_be_resumed() {
    let (project, units) = default_setup(&[("p/Later.as", "package p { public class Later {} }")]);
    project.cancel();
    assert!(matches!(
        units[0].wait_for_build_finish(),
        Err(CompileError::Cancelled)
    ));
    assert!(matches!(project.build_all(), Err(CompileError::Cancelled)));
    assert_eq!(units[0].operations(), Operations::empty());

    project.reset_cancel();
    let output = project.build_all().unwrap();
    assert!(output.problems.is_empty());
    assert_eq!(output.order, vec![units[0].id()]);
    assert_eq!(&*output.tags[0].tag_name, "p/Later");
}

#[test]
fn test_async_build_then_wait() {
    let (project, units) = default_setup(&[
        ("p/A.as", "package p { public class A { public var b:B; } }"),
        ("p/B.as", "package p { public class B { public function make():A { return new A(); } } }"),
    ]);
    for unit in &units {
        unit.start_build_async();
    }
    for unit in &units {
        assert!(unit.wait_for_build_finish().unwrap().is_empty());
        assert!(unit.operations().contains(Operations::all()));
    }
    let graph = project.dependency_graph();
    assert!(
        graph
            .dependency_types(units[0].id(), units[1].id())
            .contains(DependencyTypeSet::SIGNATURE)
    );
    assert!(
        graph
            .dependency_types(units[1].id(), units[0].id())
            .contains(DependencyTypeSet::SIGNATURE | DependencyTypeSet::EXPRESSION)
    );
}

#[test]
fn test_resolution_context_builds_missing_file_scopes() {
    let (project, units) = default_setup(&[("p/Lazy.as", "package p { public class Lazy {} }")]);
    assert!(!units[0].operations().contains(Operations::FILE_SCOPE));
    let fs = project.file_scope(units[0].id()).unwrap();
    assert_eq!(fs.unit(), units[0].id());
    assert!(units[0].operations().contains(Operations::FILE_SCOPE));
    assert!(project.file_scope(UnitId(999)).is_none());
}
