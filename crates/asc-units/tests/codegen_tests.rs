use super::*;
use crate::compilation_unit::CompilationUnit;
use crate::config::ProjectConfig;
use crate::project::Project;
use crate::workspace::Workspace;
use asc_common::DependencyTypeSet;

/// One source-list unit per file, file scopes built.
fn build(config: ProjectConfig, files: &[(&str, &str)]) -> (Arc<Project>, Vec<Arc<CompilationUnit>>) {
    let workspace = Arc::new(Workspace::new());
    for (path, text) in files {
        workspace.set_file_text(path, text);
    }
    let project = Project::new(config, workspace);
    let units: Vec<_> = files.iter().map(|(path, _)| project.add_source_file(path)).collect();
    for unit in &units {
        unit.file_scope_result().unwrap();
    }
    (project, units)
}

fn strict() -> ProjectConfig {
    ProjectConfig {
        strict: true,
        ..ProjectConfig::default()
    }
}

const USES_MISSING: &str = "package { public class Main { public function run():void { var n:int = missing; } } }";

#[test]
fn test_unresolved_identifier_warns_only_when_strict() {
    let (_project, units) = build(strict(), &[("/mem/Main.as", USES_MISSING)]);
    let abc = units[0].abc_bytes_result().unwrap();
    assert_eq!(abc.problems.len(), 1);
    assert_eq!(abc.problems[0].code, problem_codes::UNDEFINED_PROPERTY);
    assert!(!abc.problems[0].is_error());

    let (_project, units) = build(ProjectConfig::default(), &[("/mem/Main.as", USES_MISSING)]);
    assert!(units[0].abc_bytes_result().unwrap().problems.is_empty());
}

#[test]
fn test_summary_lists_definitions_and_references() {
    let (_project, units) = build(ProjectConfig::default(), &[("/mem/Main.as", USES_MISSING)]);
    let abc = units[0].abc_bytes_result().unwrap();
    let summary: serde_json::Value = serde_json::from_slice(&abc.bytes).unwrap();

    assert_eq!(summary["script"], "/mem/Main.as");
    let qnames: Vec<&str> = summary["definitions"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["qname"].as_str())
        .collect();
    assert!(qnames.contains(&"Main"), "{qnames:?}");

    let references = summary["references"].as_array().unwrap();
    let missing = references.iter().find(|r| r["name"] == "missing").unwrap();
    assert!(missing["qname"].is_null());
}

#[test]
fn test_body_references_record_expression_dependencies() {
    let (project, units) = build(
        ProjectConfig::default(),
        &[
            (
                "/mem/Main.as",
                "package { public class Main { public function run():void { var h:Object = new Helper(); } } }",
            ),
            ("/mem/Helper.as", "package { public class Helper {} }"),
        ],
    );
    let (main, helper) = (&units[0], &units[1]);
    assert!(main.abc_bytes_result().unwrap().problems.is_empty());
    let types = project.dependency_graph().dependency_types(main.id(), helper.id());
    assert_eq!(types, DependencyTypeSet::EXPRESSION);
}

#[test]
fn test_ambiguous_body_reference_is_reported() {
    let (_project, units) = build(
        ProjectConfig::default(),
        &[
            ("/mem/a/Foo.as", "package a { public class Foo {} }"),
            ("/mem/b/Foo.as", "package b { public class Foo {} }"),
            (
                "/mem/c/User.as",
                "package c { import a.*; import b.*; public class User { public function f():void { var x:Object = Foo; } } }",
            ),
        ],
    );
    let abc = units[2].abc_bytes_result().unwrap();
    let codes: Vec<u32> = abc.problems.iter().map(|p| p.code).collect();
    assert_eq!(codes, vec![problem_codes::AMBIGUOUS_REFERENCE]);
}

#[test]
fn test_embed_tags_become_descriptors() {
    let (_project, units) = build(
        ProjectConfig::default(),
        &[(
            "/mem/Assets.as",
            r#"package { public class Assets { [Embed(source="logo.png")] public var logo:Class; [Embed("icon.svg")] public var icon:Class; } }"#,
        )],
    );
    let embeds = units[0].get_embeds().unwrap();
    let sources: Vec<&str> = embeds.iter().map(|e| &*e.source).collect();
    assert_eq!(sources, vec!["logo.png", "icon.svg"]);
    assert!(embeds[0].owner.ends_with("logo"));
}
