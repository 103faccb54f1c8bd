use super::*;

fn variable(name: &str) -> Definition {
    Definition::new(DefinitionInit::new(
        DefinitionKind::Variable,
        Arc::from(name),
        Arc::from(name),
        NamespaceKey::public_root(),
        UnitId(0),
    ))
}

#[test]
fn test_ambiguous_sentinel_is_shared() {
    let a = Definition::ambiguous();
    let b = Definition::ambiguous();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(a.is_ambiguous());
    assert!(a.is_implicit());
}

#[test]
fn test_equality_is_identity() {
    let a = variable("x");
    let b = variable("x");
    assert_ne!(a, b);
    assert_eq!(a, a);
}

#[test]
fn test_node_link_can_be_rewritten() {
    let def = variable("x");
    assert!(def.node().is_none());
    def.set_node(NodeRef::file(asc_parser::NodeIndex(4)));
    assert_eq!(def.node(), NodeRef::file(asc_parser::NodeIndex(4)));
}

#[test]
fn test_package_name_from_qname() {
    let def = Definition::new(DefinitionInit::new(
        DefinitionKind::Class,
        Arc::from("C"),
        Arc::from("a.b.C"),
        NamespaceKey::Public(Arc::from("a.b")),
        UnitId(1),
    ));
    assert_eq!(def.package_name(), "a.b");
    assert_eq!(&**def.base_name(), "C");
    assert!(def.kind.is_type());
}

#[test]
fn test_flags_from_modifiers() {
    let flags = DefinitionFlags::from_modifiers(ModifierFlags::STATIC | ModifierFlags::PUBLIC);
    assert!(flags.contains(DefinitionFlags::STATIC));
    assert!(!flags.contains(DefinitionFlags::FINAL));
}

#[test]
fn test_builtin_qnames() {
    assert_eq!(BuiltinType::EventDispatcher.qname(), "flash.events.EventDispatcher");
    assert!(BuiltinType::Any.is_implicit());
    assert!(!BuiltinType::Object.is_implicit());
}
