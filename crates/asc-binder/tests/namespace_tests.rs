use super::*;

#[test]
fn test_split_and_make_qname() {
    assert_eq!(split_qname("a.b.C"), ("a.b", "C"));
    assert_eq!(split_qname("C"), ("", "C"));
    assert_eq!(&*make_qname("a.b", "C"), "a.b.C");
    assert_eq!(&*make_qname("", "C"), "C");
}

#[test]
fn test_explicit_import_opens_single_name() {
    let mut open = OpenNamespaces::new();
    open.open_for_name("a.b", "C");
    let ns = NamespaceKey::Public(Arc::from("a.b"));
    assert!(open.admits(&ns, "C"));
    assert!(!open.admits(&ns, "D"));
    assert!(!open.is_open(&ns));
}

#[test]
fn test_wildcard_opens_whole_package() {
    let mut open = OpenNamespaces::new();
    open.open(NamespaceKey::Public(Arc::from("a.b")));
    let ns = NamespaceKey::Public(Arc::from("a.b"));
    assert!(open.admits(&ns, "C"));
    assert!(open.admits(&ns, "D"));
    assert!(!open.admits(&NamespaceKey::Internal(Arc::from("a.b")), "C"));
}

#[test]
fn test_candidate_packages_sorted_and_deduplicated() {
    let mut open = OpenNamespaces::new();
    open.open(NamespaceKey::public_root());
    open.open(NamespaceKey::Public(Arc::from("z")));
    open.open(NamespaceKey::Internal(Arc::from("z")));
    open.open_for_name("a", "C");
    let packages = open.candidate_packages("C");
    let names: Vec<&str> = packages.iter().map(|p| &**p).collect();
    assert_eq!(names, vec!["", "a", "z"]);
    let packages = open.candidate_packages("D");
    assert_eq!(packages.len(), 2);
}

#[test]
fn test_custom_namespaces_compare_by_name() {
    let a = NamespaceKey::Custom(Arc::from("mx_internal"));
    let b = NamespaceKey::Custom(Arc::from(String::from("mx_internal")));
    assert_eq!(a, b);
    assert_eq!(a.to_string(), "mx_internal");
}
