//! Driver runs over small projects on disk.

use asc::cli::args::CliArgs;
use asc::cli::driver::compile;
use asc::common::problems::problem_codes;
use clap::Parser;
use std::fs;
use std::path::Path;

fn write(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn args(list: &[&str]) -> CliArgs {
    CliArgs::try_parse_from(std::iter::once("asc").chain(list.iter().copied())).unwrap()
}

#[test]
fn compiles_a_clean_project() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    write(&src.join("app/Model.as"), "package app {\n  [Bindable]\n  public class Model {\n    public var name:String;\n  }\n}");
    write(
        &src.join("app/Main.as"),
        "package app {\n  public class Main {\n    public function run():void {\n      var m:Model = new Model();\n      m.name = \"x\";\n    }\n  }\n}",
    );

    let src_arg = src.to_string_lossy().into_owned();
    let result = compile(&args(&["--source-path", &src_arg])).unwrap();
    assert!(result.problems.is_empty(), "{:?}", result.problems);
    assert!(!result.has_errors());
    assert_eq!(result.scripts, vec!["app/Main", "app/Model"]);
}

#[test]
fn reports_errors_for_broken_sources() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("Broken.as");
    write(&file, "package { import no.such.Thing; public class Broken extends Missing {} }");

    let file_arg = file.to_string_lossy().into_owned();
    let result = compile(&args(&[&file_arg])).unwrap();
    assert!(result.has_errors());
    let mut codes: Vec<u32> = result.problems.iter().map(|p| p.code).collect();
    codes.sort();
    assert_eq!(
        codes,
        vec![problem_codes::UNRESOLVED_IMPORT, problem_codes::UNRESOLVED_TYPE]
    );
}

#[test]
fn dump_ast_skips_the_build() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("Tiny.as");
    write(&file, "package { public class Tiny extends Missing {} }");

    let file_arg = file.to_string_lossy().into_owned();
    let result = compile(&args(&["--dump-ast", &file_arg])).unwrap();
    assert!(result.problems.is_empty());
    let ast = result.ast.unwrap();
    assert_eq!(ast.as_array().map(Vec::len), Some(1));
}

#[test]
fn missing_source_root_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope").to_string_lossy().into_owned();
    let err = compile(&args(&["--source-path", &missing])).unwrap_err();
    assert!(err.to_string().contains("failed to collect source files"));
}
