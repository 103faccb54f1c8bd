//! Code generation collaborator of the ABC request.
//!
//! Instruction encoding is not part of this front end. The default
//! `SummaryGenerator` does the part of code generation that matters to the
//! pipeline: it resolves every name used in function bodies and initializers
//! (recording expression dependencies), reports what cannot be resolved, and
//! serializes a script summary as the stand-in artifact bytes.

use crate::error::CompileError;
use asc_binder::{
    Definition, DefinitionKind, FileScope, Reference, ResolutionContext, find_property,
    resolve_base_class, resolve_type,
};
use asc_common::problems::problem_codes;
use asc_common::{CompilerProblem, DependencyType, Span, UnitId};
use asc_parser::{FileNode, NodeKind, NodeRef};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, debug_span};

pub struct GenerateInput<'a> {
    pub ctx: &'a dyn ResolutionContext,
    pub unit: UnitId,
    pub file_name: &'a str,
    pub tree: &'a FileNode,
    pub file_scope: &'a FileScope,
    /// Report unresolved identifiers as warnings.
    pub strict: bool,
}

/// An `[Embed]` asset referenced by a definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedDescriptor {
    pub owner: Arc<str>,
    pub source: Arc<str>,
    pub span: Span,
}

#[derive(Debug, Clone, Default)]
pub struct AbcResult {
    pub bytes: Vec<u8>,
    pub embeds: Vec<EmbedDescriptor>,
    pub problems: Vec<CompilerProblem>,
}

pub trait CodeGenerator: Send + Sync {
    fn generate(&self, input: &GenerateInput<'_>) -> Result<AbcResult, CompileError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SummaryGenerator;

#[derive(Serialize)]
struct ScriptSummary<'a> {
    script: &'a str,
    unit: u32,
    definitions: Vec<DefinitionSummary>,
    references: Vec<ReferenceSummary>,
}

#[derive(Serialize)]
struct DefinitionSummary {
    qname: Arc<str>,
    kind: DefinitionKind,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    ty: Option<Arc<str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    base: Option<Arc<str>>,
}

#[derive(Serialize)]
struct ReferenceSummary {
    name: Arc<str>,
    qname: Option<Arc<str>>,
    offset: u32,
}

impl CodeGenerator for SummaryGenerator {
    fn generate(&self, input: &GenerateInput<'_>) -> Result<AbcResult, CompileError> {
        let _span = debug_span!("generate", file = input.file_name).entered();
        input.file_scope.populate_all_bodies(input.tree);

        let mut walker = Walker {
            input,
            problems: Vec::new(),
            references: Vec::new(),
        };
        walker.walk(NodeRef::file(input.tree.root()));

        let summary = ScriptSummary {
            script: input.file_name,
            unit: input.unit.0,
            definitions: summarize_definitions(input),
            references: walker.references,
        };
        let bytes = serde_json::to_vec(&summary).map_err(|err| CompileError::Internal {
            unit: input.file_name.to_string(),
            message: err.to_string(),
        })?;
        let embeds = collect_embeds(input.file_scope.definitions());
        debug!(
            bytes = bytes.len(),
            embeds = embeds.len(),
            problems = walker.problems.len(),
            "generated script summary"
        );
        Ok(AbcResult {
            bytes,
            embeds,
            problems: walker.problems,
        })
    }
}

struct Walker<'i, 'a> {
    input: &'i GenerateInput<'a>,
    problems: Vec<CompilerProblem>,
    references: Vec<ReferenceSummary>,
}

impl Walker<'_, '_> {
    fn walk(&mut self, r: NodeRef) {
        let tree = self.input.tree;
        let Some(node) = tree.get(r) else {
            return;
        };
        match node.kind {
            NodeKind::Import | NodeKind::UseNamespace | NodeKind::Metadata | NodeKind::QualifiedName => {
                return;
            }
            NodeKind::Identifier => {
                self.resolve_identifier(r);
                return;
            }
            _ => {}
        }
        let kind = node.kind;
        let decl = node.decl().cloned();
        for (i, child) in tree.children(r).into_iter().enumerate() {
            if let Some(decl) = &decl
                && child.body == r.body
            {
                if child.node == decl.name {
                    continue;
                }
                // File-level signatures are resolved with the declarations.
                if child.node == decl.type_annotation
                    || child.node == decl.base
                    || decl.interfaces.contains(&child.node)
                {
                    if r.in_body() {
                        self.resolve_type_node(child);
                    }
                    continue;
                }
            }
            let skip = match kind {
                NodeKind::MemberAccess | NodeKind::NamespaceAccess => i == 1,
                NodeKind::ObjectProperty => i == 0,
                _ => false,
            };
            if !skip {
                self.walk(child);
            }
        }
    }

    fn resolve_identifier(&mut self, r: NodeRef) {
        let input = self.input;
        let (Some(node), Some(name)) = (input.tree.get(r), input.tree.identifier_text(r)) else {
            return;
        };
        let scope = input.file_scope.scope_at(input.tree, r);
        let def = find_property(
            input.ctx,
            input.file_scope,
            scope,
            name,
            Some(DependencyType::Expression),
            true,
            false,
        );
        match &def {
            Some(def) if def.is_ambiguous() => {
                self.report(problem_codes::AMBIGUOUS_REFERENCE, node.span(), name);
            }
            None if input.strict => {
                self.report(problem_codes::UNDEFINED_PROPERTY, node.span(), name);
            }
            _ => {}
        }
        self.references.push(ReferenceSummary {
            name: Arc::from(name),
            qname: def.filter(|d| !d.is_ambiguous()).map(|d| d.qname().clone()),
            offset: node.start,
        });
    }

    /// Type annotation of a declaration inside a function body.
    fn resolve_type_node(&mut self, r: NodeRef) {
        let input = self.input;
        let (Some(node), Some(arena)) = (input.tree.get(r), input.tree.arena_for(r.body)) else {
            return;
        };
        let reference = Reference::from_type_node(input.file_scope.references(), arena, r.node);
        if matches!(reference, Reference::NotAType(_)) {
            return;
        }
        let scope = input.file_scope.scope_at(input.tree, r);
        let found = reference.resolve(
            input.ctx,
            input.file_scope,
            scope,
            Some(DependencyType::Expression),
            true,
        );
        let name = reference.name();
        match found {
            Some(def) if def.is_ambiguous() => {
                self.report(problem_codes::AMBIGUOUS_REFERENCE, node.span(), &name);
            }
            Some(_) => {}
            None => self.report(problem_codes::UNRESOLVED_TYPE, node.span(), &name),
        }
    }

    fn report(&mut self, code: u32, span: Span, name: &str) {
        self.problems.push(
            CompilerProblem::new(code, self.input.file_name, span, &[name])
                .locate(self.input.tree.lookup()),
        );
    }
}

fn summarize_definitions(input: &GenerateInput<'_>) -> Vec<DefinitionSummary> {
    input
        .file_scope
        .definitions()
        .iter()
        .filter(|def| def.kind != DefinitionKind::Parameter)
        .map(|def| {
            let ty = if def.kind.is_variable() || def.kind.is_function() {
                resolve_type(input.ctx, input.file_scope, def, None)
                    .filter(|t| !t.is_ambiguous())
                    .map(|t| t.qname().clone())
            } else {
                None
            };
            let base = resolve_base_class(input.ctx, input.file_scope, def).map(|b| b.qname().clone());
            DefinitionSummary {
                qname: def.qname().clone(),
                kind: def.kind,
                ty,
                base,
            }
        })
        .collect()
}

fn collect_embeds(definitions: &[Arc<Definition>]) -> Vec<EmbedDescriptor> {
    let mut embeds = Vec::new();
    for def in definitions.iter().filter(|d| d.kind.is_variable()) {
        for tag in def.meta_tags("Embed") {
            let source = tag
                .arg("source")
                .or_else(|| tag.args.iter().find(|a| a.key.is_none()).map(|a| &*a.value));
            if let Some(source) = source {
                embeds.push(EmbedDescriptor {
                    owner: def.qname().clone(),
                    source: Arc::from(source),
                    span: tag.span,
                });
            }
        }
    }
    embeds
}

#[cfg(test)]
#[path = "../tests/codegen_tests.rs"]
mod codegen_tests;
