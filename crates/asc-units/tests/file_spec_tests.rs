use super::*;
use std::collections::HashMap;

#[test]
fn test_normalize_path() {
    assert_eq!(normalize_path("src/./a/../B.as"), "src/B.as");
    assert_eq!(normalize_path("../x/../../y.as"), "../../y.as");
    assert_eq!(normalize_path("/root/../a.as"), "/a.as");
    assert_eq!(normalize_path("A.as"), "A.as");
}

#[test]
fn test_memory_file_bumps_stamp() {
    let file = MemoryFile::new("./src/A.as", "class A {}");
    assert_eq!(file.path(), "src/A.as");
    let before = file.last_modified();
    file.set_text("class A { var x; }");
    assert!(file.last_modified() > before);
    assert_eq!(&*file.read().unwrap(), "class A { var x; }");
}

#[test]
fn test_disk_file_reads_and_reports_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("A.as");
    std::fs::write(&path, "class A {}").unwrap();
    let file = DiskFile::new(&path.to_string_lossy());
    assert_eq!(&*file.read().unwrap(), "class A {}");
    assert!(file.last_modified() > 0);

    let missing = DiskFile::new(&dir.path().join("B.as").to_string_lossy());
    assert!(matches!(missing.read(), Err(CompileError::Io { .. })));
    assert_eq!(missing.last_modified(), 0);
}

struct Files(HashMap<String, Arc<MemoryFile>>);

impl FileSpecificationGetter for Files {
    fn get_file_specification(&self, path: &str) -> Arc<dyn FileSpecification> {
        match self.0.get(path) {
            Some(file) => file.clone(),
            None => Arc::new(DiskFile::new(path)),
        }
    }
}

#[test]
fn test_include_loader_resolves_relative_to_including_file() {
    let inc = Arc::new(MemoryFile::new("proj/src/inc/part.as", "var x;"));
    inc.set_text("var y;");
    let files = Files(HashMap::from([(
        "proj/src/inc/part.as".to_string(),
        inc.clone(),
    )]));
    let loader = SpecIncludeLoader::new(&files);
    let loaded = loader.load("proj/src/Main.as", "./inc/part.as").unwrap();
    assert_eq!(&*loaded.path, "proj/src/inc/part.as");
    assert_eq!(&*loaded.text, "var y;");
    assert_eq!(loader.newest_modified(), inc.last_modified());

    assert!(loader.load("proj/src/Main.as", "nowhere.as").is_none());
}
