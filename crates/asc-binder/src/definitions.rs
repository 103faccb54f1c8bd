//! Semantic definitions.
//!
//! A `Definition` is created once per declaration during scope population
//! and shared as `Arc<Definition>`; identity (`Arc::ptr_eq`) is what
//! resolution results are compared by. Its link back to the declaring node is
//! a `NodeRef`, which survives the syntax tree being dropped and re-parsed.

use crate::namespace::{NamespaceKey, split_qname};
use crate::references::Reference;
use crate::scopes::ScopeId;
use asc_common::{Span, UnitId};
use asc_parser::{MetaTagData, ModifierFlags, NodeRef};
use bitflags::bitflags;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DefinitionKind {
    Class,
    Interface,
    Function,
    Getter,
    Setter,
    Variable,
    Constant,
    Parameter,
    Namespace,
    /// `Vector.<T>` specialized from the builtin `Vector`.
    AppliedVector,
    /// `*`, `void`, `null` and `undefined`, owned by the project.
    Implicit,
    /// The shared sentinel returned for unresolvable ambiguity.
    Ambiguous,
}

impl DefinitionKind {
    pub fn is_type(self) -> bool {
        matches!(
            self,
            DefinitionKind::Class
                | DefinitionKind::Interface
                | DefinitionKind::AppliedVector
                | DefinitionKind::Implicit
        )
    }

    pub fn is_function(self) -> bool {
        matches!(
            self,
            DefinitionKind::Function | DefinitionKind::Getter | DefinitionKind::Setter
        )
    }

    pub fn is_variable(self) -> bool {
        matches!(
            self,
            DefinitionKind::Variable | DefinitionKind::Constant | DefinitionKind::Parameter
        )
    }

    pub fn is_accessor(self) -> bool {
        matches!(self, DefinitionKind::Getter | DefinitionKind::Setter)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct DefinitionFlags: u16 {
        const STATIC = 1 << 0;
        const FINAL = 1 << 1;
        const OVERRIDE = 1 << 2;
        const DYNAMIC = 1 << 3;
        const NATIVE = 1 << 4;
        const REST = 1 << 5;
        const HAS_DEFAULT = 1 << 6;
        /// Synthesized; no declaring node in source.
        const IMPLICIT = 1 << 7;
        /// Declared inside a function body.
        const LOCAL = 1 << 8;
    }
}

impl DefinitionFlags {
    pub fn from_modifiers(modifiers: ModifierFlags) -> DefinitionFlags {
        let mut flags = DefinitionFlags::empty();
        flags.set(DefinitionFlags::STATIC, modifiers.contains(ModifierFlags::STATIC));
        flags.set(DefinitionFlags::FINAL, modifiers.contains(ModifierFlags::FINAL));
        flags.set(DefinitionFlags::OVERRIDE, modifiers.contains(ModifierFlags::OVERRIDE));
        flags.set(DefinitionFlags::DYNAMIC, modifiers.contains(ModifierFlags::DYNAMIC));
        flags.set(DefinitionFlags::NATIVE, modifiers.contains(ModifierFlags::NATIVE));
        flags
    }
}

/// Fixed builtin types the project always knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BuiltinType {
    Any,
    Void,
    Null,
    Undefined,
    Object,
    String,
    Int,
    Uint,
    Number,
    Boolean,
    Array,
    Class,
    Function,
    Vector,
    EventDispatcher,
}

impl BuiltinType {
    pub fn qname(self) -> &'static str {
        match self {
            BuiltinType::Any => "*",
            BuiltinType::Void => "void",
            BuiltinType::Null => "null",
            BuiltinType::Undefined => "undefined",
            BuiltinType::Object => "Object",
            BuiltinType::String => "String",
            BuiltinType::Int => "int",
            BuiltinType::Uint => "uint",
            BuiltinType::Number => "Number",
            BuiltinType::Boolean => "Boolean",
            BuiltinType::Array => "Array",
            BuiltinType::Class => "Class",
            BuiltinType::Function => "Function",
            BuiltinType::Vector => "Vector",
            BuiltinType::EventDispatcher => "flash.events.EventDispatcher",
        }
    }

    /// Types synthesized by the project rather than declared in source.
    pub fn is_implicit(self) -> bool {
        matches!(
            self,
            BuiltinType::Any | BuiltinType::Void | BuiltinType::Null | BuiltinType::Undefined
        )
    }

    pub const IMPLICIT: [BuiltinType; 4] = [
        BuiltinType::Any,
        BuiltinType::Void,
        BuiltinType::Null,
        BuiltinType::Undefined,
    ];
}

#[derive(Debug, Clone)]
pub struct ParamInfo {
    pub name: Arc<str>,
    pub type_ref: Option<Reference>,
    pub has_default: bool,
    pub rest: bool,
}

/// Everything needed to build a `Definition`.
#[derive(Debug, Clone)]
pub struct DefinitionInit {
    pub kind: DefinitionKind,
    pub base_name: Arc<str>,
    pub qname: Arc<str>,
    pub namespace: NamespaceKey,
    pub unit: UnitId,
    pub containing_scope: ScopeId,
    pub members_scope: ScopeId,
    pub node: NodeRef,
    pub span: Span,
    pub flags: DefinitionFlags,
    pub metadata: Vec<MetaTagData>,
    pub type_ref: Option<Reference>,
    pub base_ref: Option<Reference>,
    pub interface_refs: Vec<Reference>,
    pub params: Vec<ParamInfo>,
    /// Namespace URI literal, or the element type of an applied vector.
    pub detail: Option<Arc<str>>,
}

impl DefinitionInit {
    pub fn new(
        kind: DefinitionKind,
        base_name: Arc<str>,
        qname: Arc<str>,
        namespace: NamespaceKey,
        unit: UnitId,
    ) -> DefinitionInit {
        DefinitionInit {
            kind,
            base_name,
            qname,
            namespace,
            unit,
            containing_scope: ScopeId::NONE,
            members_scope: ScopeId::NONE,
            node: NodeRef::NONE,
            span: Span::default(),
            flags: DefinitionFlags::empty(),
            metadata: Vec::new(),
            type_ref: None,
            base_ref: None,
            interface_refs: Vec::new(),
            params: Vec::new(),
            detail: None,
        }
    }
}

#[derive(Debug)]
pub struct Definition {
    pub kind: DefinitionKind,
    base_name: Arc<str>,
    qname: Arc<str>,
    namespace: NamespaceKey,
    unit: UnitId,
    containing_scope: ScopeId,
    members_scope: ScopeId,
    /// Rewritten when a re-parsed tree is reconnected.
    node: RwLock<NodeRef>,
    span: Span,
    pub flags: DefinitionFlags,
    pub metadata: Vec<MetaTagData>,
    type_ref: Option<Reference>,
    base_ref: Option<Reference>,
    interface_refs: Vec<Reference>,
    params: Vec<ParamInfo>,
    detail: Option<Arc<str>>,
}

static AMBIGUOUS: Lazy<Arc<Definition>> = Lazy::new(|| {
    let mut init = DefinitionInit::new(
        DefinitionKind::Ambiguous,
        Arc::from("<ambiguous>"),
        Arc::from("<ambiguous>"),
        NamespaceKey::public_root(),
        UnitId::NONE,
    );
    init.flags = DefinitionFlags::IMPLICIT;
    Arc::new(Definition::new(init))
});

impl Definition {
    pub fn new(init: DefinitionInit) -> Definition {
        Definition {
            kind: init.kind,
            base_name: init.base_name,
            qname: init.qname,
            namespace: init.namespace,
            unit: init.unit,
            containing_scope: init.containing_scope,
            members_scope: init.members_scope,
            node: RwLock::new(init.node),
            span: init.span,
            flags: init.flags,
            metadata: init.metadata,
            type_ref: init.type_ref,
            base_ref: init.base_ref,
            interface_refs: init.interface_refs,
            params: init.params,
            detail: init.detail,
        }
    }

    /// The shared sentinel for a name that resolves to several definitions
    /// with no applicable precedence.
    pub fn ambiguous() -> Arc<Definition> {
        AMBIGUOUS.clone()
    }

    pub fn is_ambiguous(&self) -> bool {
        self.kind == DefinitionKind::Ambiguous
    }

    pub fn base_name(&self) -> &Arc<str> {
        &self.base_name
    }

    pub fn qname(&self) -> &Arc<str> {
        &self.qname
    }

    /// Package part of the qname (`""` when unqualified).
    pub fn package_name(&self) -> &str {
        split_qname(&self.qname).0
    }

    pub fn namespace(&self) -> &NamespaceKey {
        &self.namespace
    }

    pub fn unit(&self) -> UnitId {
        self.unit
    }

    pub fn containing_scope(&self) -> ScopeId {
        self.containing_scope
    }

    /// Scope holding the members of a class or interface, or the parameters
    /// of a function.
    pub fn members_scope(&self) -> ScopeId {
        self.members_scope
    }

    pub fn node(&self) -> NodeRef {
        *self.node.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_node(&self, node: NodeRef) {
        *self.node.write().unwrap_or_else(PoisonError::into_inner) = node;
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Absolute start of the declaring node.
    pub fn start(&self) -> u32 {
        self.span.start
    }

    /// Declared variable type or function return type.
    pub fn type_ref(&self) -> Option<&Reference> {
        self.type_ref.as_ref()
    }

    /// `extends` clause of a class.
    pub fn base_ref(&self) -> Option<&Reference> {
        self.base_ref.as_ref()
    }

    pub fn interface_refs(&self) -> &[Reference] {
        &self.interface_refs
    }

    pub fn params(&self) -> &[ParamInfo] {
        &self.params
    }

    /// URI of a namespace definition.
    pub fn namespace_uri(&self) -> Option<&str> {
        match self.kind {
            DefinitionKind::Namespace => self.detail.as_deref(),
            _ => None,
        }
    }

    /// Element type qname of an applied vector.
    pub fn element_type(&self) -> Option<&str> {
        match self.kind {
            DefinitionKind::AppliedVector => self.detail.as_deref(),
            _ => None,
        }
    }

    pub fn is_implicit(&self) -> bool {
        self.flags.contains(DefinitionFlags::IMPLICIT)
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(DefinitionFlags::STATIC)
    }

    pub fn has_meta_tag(&self, name: &str) -> bool {
        self.metadata.iter().any(|tag| &*tag.name == name)
    }

    pub fn meta_tags<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MetaTagData> + 'a {
        self.metadata.iter().filter(move |tag| &*tag.name == name)
    }
}

impl PartialEq for Definition {
    fn eq(&self, other: &Definition) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for Definition {}

#[cfg(test)]
#[path = "../tests/definitions_tests.rs"]
mod definitions_tests;
