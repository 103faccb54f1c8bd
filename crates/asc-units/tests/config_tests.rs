use super::*;

#[test]
fn test_defaults_apply_to_missing_fields() {
    let config = ProjectConfig::from_json(r#"{ "strict": true }"#).unwrap();
    assert!(config.strict);
    assert!(config.defer_function_bodies);
    assert!(config.parallel);
    assert_eq!(config.flavor, Flavor::Royale);
    assert!(config.source_path.is_empty());
}

#[test]
fn test_camel_case_fields() {
    let config = ProjectConfig::from_json(
        r#"{
            "flavor": "flash",
            "deferFunctionBodies": false,
            "sourcePath": ["src"],
            "sourceFiles": ["Main.as"],
            "libraryFiles": ["lib/Lib.as"]
        }"#,
    )
    .unwrap();
    assert_eq!(config.flavor, Flavor::Flash);
    assert!(!config.defer_function_bodies);
    assert_eq!(config.source_path, vec![PathBuf::from("src")]);
    assert_eq!(config.source_files, vec![PathBuf::from("Main.as")]);
    assert_eq!(config.library_files, vec![PathBuf::from("lib/Lib.as")]);
}

#[test]
fn test_invalid_json_is_a_config_error() {
    let err = ProjectConfig::from_json(r#"{ "flavor": "air" }"#).unwrap_err();
    assert!(matches!(err, CompileError::Config(_)));
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ProjectConfig::load(&dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, CompileError::Io { .. }));
}

#[test]
fn test_load_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("asc.json");
    let config = ProjectConfig {
        strict: true,
        ..ProjectConfig::default()
    };
    std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();
    assert_eq!(ProjectConfig::load(&path).unwrap(), config);
}
