//! Symbol resolution and elaboration for the svlang SystemVerilog front-end.
//!
//! A [`Compilation`] owns everything: the source manager, parsed trees, the
//! symbol arena, the type interner, and the diagnostic engine. Syntax trees
//! are added one at a time; their declarations are bound into the symbol
//! hierarchy eagerly, while derived data (types, parameter values, delays)
//! resolves lazily on first query.

mod declared;
mod elab;
mod eval;
mod symbol;
mod types;
mod value;

#[cfg(test)]
mod tests;

use std::collections::HashMap;

use indexmap::IndexMap;
use rowan::TextSize;

use std::path::Path;

use svlang_core::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use svlang_core::intern::{Interner, Name};
use svlang_core::source::{FileSpan, SourceManager};
use svlang_syntax::{PreprocessorOptions, SyntaxNode, SyntaxTree, TimeScaleValue};

pub use symbol::{
    AssertionPortType, DeclaredType, DeclaredTypeFlags, DefinitionKind, Direction, EdgeKind,
    ElabTaskKind, Lifetime, LookupLocation, NetKind, ParamKey, ParamValue, ScopeData, ScopeId,
    SkewInfo, SubroutineKind, SymbolData, SymbolId, SymbolKind, UdpInfo, VarFlags,
};
pub use types::{IntegralKind, RealKind, Type, TypeId, TypeInterner};
pub use value::{ConstValue, SvInt, format_message};

/// Hard failures while building a compilation's inputs. Everything a user
/// can get wrong in their source is a diagnostic instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Loading or parsing an input failed outright.
    #[error(transparent)]
    Syntax(#[from] svlang_syntax::Error),
}

/// Result type for compilation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Options controlling unqualified lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct LookupFlags {
    /// See members regardless of their position in source order.
    pub allow_declared_after: bool,
    /// Do not continue into parent scopes.
    pub no_parent: bool,
}

/// One fully owned compilation: sources, trees, symbols, types, diagnostics.
///
/// Not thread-safe for concurrent mutation; independent compilations can run
/// on independent threads because nothing here is process-global.
pub struct Compilation {
    sources: SourceManager,
    trees: Vec<SyntaxTree>,
    symbols: Vec<SymbolData>,
    scopes: Vec<ScopeData>,
    types: TypeInterner,
    names: Interner,
    diagnostics: Diagnostics,
    root: SymbolId,
    definitions: IndexMap<Name, SymbolId>,
    packages: IndexMap<Name, SymbolId>,
    instance_cache: HashMap<(SymbolId, ParamKey), SymbolId>,
    /// Symbols currently being evaluated or resolved; the cycle guard.
    eval_in_progress: std::collections::HashSet<SymbolId>,
    /// Registered drivers of signals (clocking outputs and the like).
    drivers: HashMap<SymbolId, Vec<SymbolId>>,
    decl_counter: u32,
    /// Established time unit, for consistency checks across declarations.
    time_scale: Option<(TimeScaleValue, Option<FileSpan>)>,
}

impl Default for Compilation {
    fn default() -> Self {
        Self::new()
    }
}

impl Compilation {
    pub fn new() -> Self {
        let mut compilation = Compilation {
            sources: SourceManager::new(),
            trees: Vec::new(),
            symbols: Vec::new(),
            scopes: Vec::new(),
            types: TypeInterner::new(),
            names: Interner::new(),
            diagnostics: Diagnostics::new(),
            root: SymbolId(0),
            definitions: IndexMap::new(),
            packages: IndexMap::new(),
            instance_cache: HashMap::new(),
            eval_in_progress: std::collections::HashSet::new(),
            drivers: HashMap::new(),
            decl_counter: 0,
            time_scale: None,
        };
        let root_name = compilation.names.intern("$root");
        let root = compilation.alloc_symbol(SymbolData {
            name: root_name,
            span: None,
            parent: None,
            scope: None,
            decl_index: 0,
            kind: SymbolKind::Root,
        });
        let scope = compilation.alloc_scope();
        compilation.symbols[root.0 as usize].scope = Some(scope);
        compilation.root = root;
        compilation
    }

    /// The source manager all trees of this compilation must be built with.
    pub fn sources(&self) -> &SourceManager {
        &self.sources
    }

    pub fn sources_mut(&mut self) -> &mut SourceManager {
        &mut self.sources
    }

    /// Binds a parsed tree's declarations into the symbol hierarchy.
    pub fn add_tree(&mut self, tree: SyntaxTree) -> usize {
        let index = self.trees.len();
        self.trees.push(tree);
        self.bind_unit(index as u32);
        index
    }

    /// Loads, parses, and binds a file in one step.
    pub fn add_file(
        &mut self,
        path: impl AsRef<Path>,
        options: &PreprocessorOptions,
    ) -> Result<usize> {
        let tree = SyntaxTree::from_file(path, &mut self.sources, options)?;
        Ok(self.add_tree(tree))
    }

    pub fn trees(&self) -> &[SyntaxTree] {
        &self.trees
    }

    pub fn root(&self) -> SymbolId {
        self.root
    }

    // --- symbol plumbing ----------------------------------------------------

    pub(crate) fn alloc_symbol(&mut self, data: SymbolData) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(data);
        id
    }

    pub(crate) fn alloc_scope(&mut self) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(ScopeData::default());
        id
    }

    pub fn symbol(&self, id: SymbolId) -> &SymbolData {
        &self.symbols[id.0 as usize]
    }

    pub(crate) fn symbol_mut(&mut self, id: SymbolId) -> &mut SymbolData {
        &mut self.symbols[id.0 as usize]
    }

    pub(crate) fn scope_data(&self, id: ScopeId) -> &ScopeData {
        &self.scopes[id.0 as usize]
    }

    pub(crate) fn scope_data_mut(&mut self, id: ScopeId) -> &mut ScopeData {
        &mut self.scopes[id.0 as usize]
    }

    pub(crate) fn next_decl_index(&mut self) -> u32 {
        self.decl_counter += 1;
        self.decl_counter
    }

    pub fn symbol_name(&self, id: SymbolId) -> &str {
        self.names.resolve(self.symbol(id).name)
    }

    pub(crate) fn intern(&mut self, text: &str) -> Name {
        self.names.intern(text)
    }

    pub fn name_interner(&self) -> &Interner {
        &self.names
    }

    pub fn type_interner(&self) -> &TypeInterner {
        &self.types
    }

    pub(crate) fn types_mut(&mut self) -> &mut TypeInterner {
        &mut self.types
    }

    /// Ordered members of a scope symbol.
    pub fn members(&self, scope_owner: SymbolId) -> &[SymbolId] {
        match self.symbol(scope_owner).scope {
            Some(scope) => &self.scope_data(scope).members,
            None => &[],
        }
    }

    /// Adds a member to a scope, diagnosing name collisions.
    pub(crate) fn add_member(&mut self, scope: ScopeId, member: SymbolId) {
        let name = self.symbol(member).name;
        let span = self.symbol(member).span;
        let named = !self.names.resolve(name).is_empty();

        self.scope_data_mut(scope).members.push(member);
        if !named {
            return;
        }
        match self.scope_data(scope).name_map.get(&name).copied() {
            Some(existing) => {
                let previous = self.symbol(existing).span;
                if let Some(span) = span {
                    let name = self.names.resolve(name).to_string();
                    self.diagnostics
                        .report(DiagnosticKind::DuplicateDefinition, span)
                        .arg(name)
                        .note(previous, "previous declaration is here")
                        .emit();
                }
            }
            None => {
                self.scope_data_mut(scope).name_map.insert(name, member);
            }
        }
    }

    // --- lookup -------------------------------------------------------------

    /// Unqualified lookup from a scope, bounded by a lookup location.
    pub fn lookup(
        &mut self,
        scope_owner: SymbolId,
        name: Name,
        at: LookupLocation,
        flags: LookupFlags,
    ) -> Option<SymbolId> {
        let mut current = Some(scope_owner);
        let mut location = at;
        while let Some(owner) = current {
            if let Some(scope) = self.symbol(owner).scope
                && let Some(found) = self.lookup_in_scope(scope, name, location, flags)
            {
                return Some(found);
            }
            if flags.no_parent {
                return None;
            }
            current = self.symbol(owner).parent;
            // Upward lookup is not position-bounded: an inner scope can see
            // enclosing members declared after it.
            location = LookupLocation::ANYWHERE;
        }
        None
    }

    fn lookup_in_scope(
        &mut self,
        scope: ScopeId,
        name: Name,
        at: LookupLocation,
        flags: LookupFlags,
    ) -> Option<SymbolId> {
        if let Some(&sym) = self.scope_data(scope).name_map.get(&name) {
            let data = self.symbol(sym);
            if flags.allow_declared_after
                || data.kind.allow_declared_after()
                || data.decl_index < at.0
            {
                return Some(sym);
            }
        }

        if let Some(&sym) = self.scope_data(scope).imported.get(&name) {
            return Some(sym);
        }

        // Wildcard imports materialize a name lazily at first lookup, then
        // pin it so later lookups agree.
        let imports = self.scope_data(scope).wildcard_imports.clone();
        for import in imports {
            if !flags.allow_declared_after && import.decl_index >= at.0 {
                continue;
            }
            let package_scope = self.symbol(import.package).scope?;
            if let Some(&sym) = self.scope_data(package_scope).name_map.get(&name) {
                self.scope_data_mut(scope).imported.insert(name, sym);
                return Some(sym);
            }
        }
        None
    }

    /// Looks up a dotted hierarchical path from the root: definitions,
    /// packages, then members at each level.
    pub fn find(&mut self, path: &str) -> Option<SymbolId> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let first_name = self.names.get(first)?;

        let mut current = if let Some(&def) = self.definitions.get(&first_name) {
            self.definition_body(def)?
        } else if let Some(&pkg) = self.packages.get(&first_name) {
            pkg
        } else {
            // Unit-scope members live under the root's compilation units.
            let units: Vec<SymbolId> = {
                let root_scope = self.symbol(self.root).scope?;
                self.scope_data(root_scope).members.clone()
            };
            units.into_iter().find_map(|unit| {
                self.lookup(
                    unit,
                    first_name,
                    LookupLocation::ANYWHERE,
                    LookupFlags {
                        allow_declared_after: true,
                        no_parent: true,
                    },
                )
            })?
        };

        for segment in segments {
            let name = self.names.get(segment)?;
            let scope_owner = self.deref_instance(current)?;
            let scope = self.symbol(scope_owner).scope?;
            current = *self.scope_data(scope).name_map.get(&name)?;
        }
        Some(current)
    }

    /// Follows instances and definitions through to the scope that holds
    /// their members.
    pub fn deref_instance(&mut self, id: SymbolId) -> Option<SymbolId> {
        match &self.symbol(id).kind {
            SymbolKind::Instance { body } => Some(*body),
            SymbolKind::Definition { .. } => self.definition_body(id),
            _ => Some(id),
        }
    }

    /// All module/interface/program definitions, in declaration order.
    pub fn definitions(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.definitions.values().copied()
    }

    pub fn packages(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.packages.values().copied()
    }

    pub(crate) fn register_definition(&mut self, name: Name, id: SymbolId) {
        self.definitions.insert(name, id);
    }

    pub(crate) fn register_package(&mut self, name: Name, id: SymbolId) {
        self.packages.insert(name, id);
    }

    pub(crate) fn lookup_definition(&self, name: Name) -> Option<SymbolId> {
        self.definitions.get(&name).copied()
    }

    pub(crate) fn instance_cache(&mut self) -> &mut HashMap<(SymbolId, ParamKey), SymbolId> {
        &mut self.instance_cache
    }

    /// Records `driver` as a driver of `signal`.
    pub(crate) fn add_driver(&mut self, signal: SymbolId, driver: SymbolId) {
        self.drivers.entry(signal).or_default().push(driver);
    }

    /// Symbols registered as drivers of a signal.
    pub fn drivers_of(&self, signal: SymbolId) -> &[SymbolId] {
        self.drivers.get(&signal).map(Vec::as_slice).unwrap_or(&[])
    }

    // --- diagnostics and spans ----------------------------------------------

    /// Diagnostics produced by elaboration.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub(crate) fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// All diagnostics: per-tree syntax diagnostics first, then elaboration.
    pub fn all_diagnostics(&self) -> Vec<&Diagnostic> {
        self.trees
            .iter()
            .flat_map(|t| t.diagnostics().iter())
            .chain(self.diagnostics.iter())
            .collect()
    }

    /// Original file span of a node in tree `tree`.
    pub fn span_of(&self, tree: u32, node: &SyntaxNode) -> Option<FileSpan> {
        let map = self.trees.get(tree as usize)?.span_map();
        let start = node.text_range().start();
        let span = map.file_span(start)?;
        // Extend to the node's full width in its own buffer where possible.
        let end_offset = node.text_range().end();
        let end = map.file_span(end_offset.checked_sub(TextSize::from(1)).unwrap_or(end_offset));
        Some(match end {
            Some(end) => span.cover(end),
            None => span,
        })
    }

    /// The preprocessor's significant-token index of a node's first token.
    pub(crate) fn token_index_of(&self, tree: u32, node: &SyntaxNode) -> Option<usize> {
        self.trees
            .get(tree as usize)?
            .span_map()
            .token_index(node.text_range().start())
    }

    pub(crate) fn tree(&self, index: u32) -> &SyntaxTree {
        &self.trees[index as usize]
    }

    pub(crate) fn established_time_scale(&self) -> Option<TimeScaleValue> {
        self.time_scale.as_ref().map(|(v, _)| *v)
    }

    pub(crate) fn set_time_scale(&mut self, value: TimeScaleValue, span: Option<FileSpan>) {
        if self.time_scale.is_none() {
            self.time_scale = Some((value, span));
        }
    }
}
