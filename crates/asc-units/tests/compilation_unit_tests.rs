use super::*;
use crate::config::ProjectConfig;
use crate::workspace::Workspace;

const ROOT: &str = "/mem/src";

/// Units under a source root, in the order given.
fn project_with(files: &[(&str, &str)]) -> (Arc<Project>, Vec<Arc<CompilationUnit>>) {
    let workspace = Arc::new(Workspace::new());
    let project = Project::new(ProjectConfig::default(), workspace.clone());
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

fn outgoing_codes(unit: &CompilationUnit) -> Vec<u32> {
    unit.outgoing_dependencies_result()
        .unwrap()
        .problems
        .iter()
        .map(|p| p.code)
        .collect()
}

#[test]
fn test_name_hashes_path_and_mangles_file_name() {
    let (project, _) = project_with(&[]);
    let unit = project.add_source_file("/mem/My.Component.as");
    let name = unit.name();
    let (hash, file) = name.split_once(':').unwrap();
    assert_eq!(hash.len(), 16);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(file, "My_Component_as");
    assert_eq!(unit.name(), name);

    let other = project.add_source_file("/other/My.Component.as");
    assert_ne!(other.name(), name);
}

#[test]
fn test_externally_visible_name_prefers_location_qname() {
    let (project, units) = project_with(&[("p/Widget.as", "package p { public class Widget {} }")]);
    let fs = units[0].file_scope_result().unwrap();
    assert_eq!(units[0].externally_visible_name(&fs.file_scope), "p.Widget");

    project
        .workspace()
        .set_file_text("/mem/loose.as", "package q { public function helper():void {} public class Loose {} }");
    let loose = project.add_source_file("/mem/loose.as");
    let fs = loose.file_scope_result().unwrap();
    assert_eq!(loose.externally_visible_name(&fs.file_scope), "q.helper");

    project.workspace().set_file_text("/mem/empty.as", "");
    let empty = project.add_source_file("/mem/empty.as");
    let fs = empty.file_scope_result().unwrap();
    assert_eq!(empty.externally_visible_name(&fs.file_scope), empty.name());
}

#[test]
fn test_clean_keeps_file_scope_unless_asked() {
    let (project, _) = project_with(&[]);
    project
        .workspace()
        .set_file_text("/mem/Loose.as", "package { public class Loose {} }");
    let unit = project.add_source_file("/mem/Loose.as");
    unit.outgoing_dependencies_result().unwrap();
    assert!(unit.operations().contains(Operations::FILE_SCOPE | Operations::SEMANTIC_PROBLEMS));
    assert!(project.scope().contains_qname("Loose"));

    unit.clean(false);
    assert_eq!(unit.operations(), Operations::SYNTAX_TREE | Operations::FILE_SCOPE);
    assert!(project.scope().contains_qname("Loose"));

    unit.clean(true);
    assert_eq!(unit.operations(), Operations::empty());
    assert!(!project.scope().contains_qname("Loose"));

    unit.file_scope_result().unwrap();
    assert!(project.scope().contains_qname("Loose"));
}

#[test]
fn test_circular_inheritance_is_reported() {
    let (_project, units) = project_with(&[
        ("p/A.as", "package p { public class A extends B {} }"),
        ("p/B.as", "package p { public class B extends A {} }"),
    ]);
    assert_eq!(outgoing_codes(&units[0]), vec![problem_codes::CIRCULAR_INHERITANCE]);
    assert_eq!(outgoing_codes(&units[1]), vec![problem_codes::CIRCULAR_INHERITANCE]);
}

#[test]
fn test_extending_an_interface_is_reported() {
    let (project, units) = project_with(&[
        ("p/I.as", "package p { public interface I {} }"),
        ("p/C.as", "package p { public class C extends I {} }"),
    ]);
    assert_eq!(outgoing_codes(&units[1]), vec![problem_codes::BASE_NOT_A_CLASS]);
    // The edge is recorded even though the base is unusable.
    assert!(project.dependency_graph().edge(units[1].id(), units[0].id()).is_some());
}

#[test]
fn test_unknown_imports_are_reported() {
    let (_project, units) = project_with(&[(
        "p/User.as",
        "package p { import nowhere.Thing; import gone.*; import flash.events.Event; public class User {} }",
    )]);
    let problems = units[0].outgoing_dependencies_result().unwrap();
    let problems = &problems.problems;
    assert_eq!(problems.len(), 2);
    assert!(problems.iter().all(|p| p.code == problem_codes::UNRESOLVED_IMPORT));
    assert!(problems[1].message.contains("gone.*"), "{}", problems[1].message);
}

#[test]
fn test_signature_types_are_checked() {
    let (project, units) = project_with(&[
        (
            "p/Holder.as",
            "package p { public class Holder { public var a:Missing; public var b:Array.<int>; public var c:Vector.<Item>; } }",
        ),
        ("p/Item.as", "package p { public class Item {} }"),
    ]);
    assert_eq!(
        outgoing_codes(&units[0]),
        vec![problem_codes::UNRESOLVED_TYPE, problem_codes::INVALID_TYPE_APPLICATION]
    );
    let types = project
        .dependency_graph()
        .dependency_types(units[0].id(), units[1].id());
    assert!(types.contains(asc_common::DependencyTypeSet::SIGNATURE));
}

#[test]
fn test_missing_file_is_a_problem_not_an_error() {
    let (project, _) = project_with(&[]);
    let unit = project.add_source_file("/definitely/not/here/Nope.as");
    let syntax = unit.syntax_tree_result().unwrap();
    assert_eq!(syntax.problems.len(), 1);
    assert_eq!(syntax.problems[0].code, problem_codes::FILE_NOT_FOUND);
    let problems = unit.wait_for_build_finish().unwrap();
    assert_eq!(
        problems.iter().filter(|p| p.code == problem_codes::FILE_NOT_FOUND).count(),
        1
    );
}

#[test]
fn test_orphaned_result_reports_error() {
    let (project, units) = project_with(&[("p/Gone.as", "package p { public class Gone {} }")]);
    let syntax = units[0].syntax_tree_result().unwrap();
    units[0].outgoing_dependencies_result().unwrap();
    units[0].abc_bytes_result().unwrap();
    assert!(!syntax.is_ast_resident());

    drop(units);
    drop(project);
    assert!(matches!(syntax.ast(), Err(CompileError::OrphanedResult)));
}

#[test]
fn test_pending_edges_reach_the_graph_only_when_published() {
    let (project, units) = project_with(&[
        ("p/A.as", "package p { public class A {} }"),
        ("p/B.as", "package p { public class B {} }"),
    ]);
    let (a, b) = (units[0].id(), units[1].id());
    let edges = PendingEdges::new(&project);
    edges.add_dependency(a, b, DependencyType::Signature, "p.B");
    assert!(project.dependency_graph().direct_dependencies(a).is_empty());

    edges.publish();
    let graph = project.dependency_graph();
    assert_eq!(graph.direct_dependencies(a), vec![b]);
    assert!(
        graph
            .dependency_types(a, b)
            .contains(asc_common::DependencyTypeSet::SIGNATURE)
    );
}

#[test]
fn test_cancelled_semantic_check_records_no_edges() {
    let (project, units) = project_with(&[
        ("p/A.as", "package p { public class A { public var b:B; } }"),
        ("p/B.as", "package p { public class B {} }"),
    ]);
    let (a, b) = (units[0].id(), units[1].id());
    for unit in &units {
        unit.file_scope_result().unwrap();
    }

    project.cancel();
    assert!(matches!(
        units[0].outgoing_dependencies_result(),
        Err(CompileError::Cancelled)
    ));
    assert!(project.dependency_graph().direct_dependencies(a).is_empty());

    project.reset_cancel();
    assert!(units[0].outgoing_dependencies_result().unwrap().problems.is_empty());
    assert!(
        project
            .dependency_graph()
            .dependency_types(a, b)
            .contains(asc_common::DependencyTypeSet::SIGNATURE)
    );
}
