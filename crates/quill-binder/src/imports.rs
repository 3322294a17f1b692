//! Per-unit import indexes.
//!
//! Imports resolve eagerly when the unit scope is assembled: single-type
//! clashes are diagnosed here (JLS 7.5.1), while on-demand imports stay
//! ambiguous-on-clash at lookup time (JLS 7.5.2). Static imports feed two
//! consumers: member *types* into the scope chain, and member *fields*
//! into constant-expression resolution via [`MemberImportIndex`].

use std::collections::HashMap;
use std::sync::Arc;

use quill_core::Name;
use quill_tree as tree;

use crate::diag::{Diags, DUPLICATE_IMPORT, IMPORT_NOT_FOUND};
use crate::lookup::{LookupKey, NameLookup, PackageNode, Scope, TopLevelIndex};
use crate::resolve::CanonicalResolver;
use crate::sym::ClassSymbol;

/// Resolves a fully qualified type: the top-level index for the package-and-
/// class prefix, canonical member resolution for the rest.
fn resolve_qualified_type(
    resolver: &CanonicalResolver<'_>,
    tli: &TopLevelIndex,
    segments: &[Name],
) -> Option<ClassSymbol> {
    if segments.is_empty() {
        return None;
    }
    match tli.lookup(&LookupKey::new(segments.to_vec())) {
        NameLookup::Found(result) => resolver.resolve_rest(&result),
        _ => None,
    }
}

/// Single-type imports: an explicit `name -> symbol` map.
#[derive(Debug, Default)]
pub struct ImportIndex {
    map: HashMap<Name, ClassSymbol>,
}

impl ImportIndex {
    pub fn create(
        resolver: &CanonicalResolver<'_>,
        tli: &TopLevelIndex,
        imports: &[tree::ImportDecl],
        diags: &Diags,
    ) -> Self {
        let mut index = ImportIndex::default();
        for import in imports.iter().filter(|i| !i.wildcard) {
            let Some(simple) = import.path.last().cloned() else {
                continue;
            };
            if import.is_static {
                // `import static T.M;` only contributes to the type scope
                // when M is a member type; anything else resolves silently
                // to nothing here (it may be a field or method).
                if import.path.len() < 2 {
                    continue;
                }
                let owner = resolve_qualified_type(
                    resolver,
                    tli,
                    &import.path[..import.path.len() - 1],
                );
                if let Some(owner) = owner {
                    if let Some(sym) = resolver.resolve_member(&owner, &simple) {
                        index.insert(simple, sym, import, diags);
                    }
                }
            } else {
                match resolve_qualified_type(resolver, tli, &import.path) {
                    Some(sym) => index.insert(simple, sym, import, diags),
                    None => diags.error(
                        None,
                        IMPORT_NOT_FOUND,
                        format!("could not resolve import {}", dotted(&import.path)),
                        Some(import.span),
                    ),
                }
            }
        }
        index
    }

    fn insert(&mut self, name: Name, sym: ClassSymbol, import: &tree::ImportDecl, diags: &Diags) {
        use std::collections::hash_map::Entry;
        match self.map.entry(name) {
            Entry::Occupied(existing) => {
                if *existing.get() != sym {
                    diags.error(
                        None,
                        DUPLICATE_IMPORT,
                        format!(
                            "the name {} is already imported as {}",
                            existing.key(),
                            existing.get()
                        ),
                        Some(import.span),
                    );
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(sym);
            }
        }
    }
}

impl Scope for ImportIndex {
    fn lookup(&self, key: &LookupKey) -> NameLookup {
        match self.map.get(key.first()) {
            Some(sym) => NameLookup::found(sym.clone(), key.rest().to_vec()),
            None => NameLookup::NotFound,
        }
    }
}

/// One on-demand source: a package, or the visible declared member types of
/// a named type (covering both `import p.Outer.*;` and
/// `import static p.Outer.*;`).
#[derive(Debug)]
enum WildSource {
    Package(Arc<PackageNode>),
    MemberTypes(HashMap<Name, ClassSymbol>),
}

impl WildSource {
    fn get(&self, name: &Name) -> Option<ClassSymbol> {
        match self {
            WildSource::Package(node) => node.get(name).cloned(),
            WildSource::MemberTypes(map) => map.get(name).cloned(),
        }
    }
}

/// On-demand imports. Two sources supplying the same short name make that
/// name ambiguous rather than silently picking one.
#[derive(Debug, Default)]
pub struct WildImportIndex {
    sources: Vec<WildSource>,
}

impl WildImportIndex {
    pub fn create(
        resolver: &CanonicalResolver<'_>,
        tli: &TopLevelIndex,
        imports: &[tree::ImportDecl],
        diags: &Diags,
    ) -> Self {
        let mut index = WildImportIndex::default();
        for import in imports.iter().filter(|i| i.wildcard) {
            if !import.is_static {
                // `import X.*;` where X is a package-or-type name.
                if let Some(node) = tli.lookup_package(&import.path) {
                    index.sources.push(WildSource::Package(node));
                    continue;
                }
            }
            match resolve_qualified_type(resolver, tli, &import.path) {
                Some(sym) => index.sources.push(WildSource::MemberTypes(
                    resolver.visible_members(&sym).into_iter().collect(),
                )),
                None => diags.error(
                    None,
                    IMPORT_NOT_FOUND,
                    format!("could not resolve import {}.*", dotted(&import.path)),
                    Some(import.span),
                ),
            }
        }
        index
    }
}

impl Scope for WildImportIndex {
    fn lookup(&self, key: &LookupKey) -> NameLookup {
        let name = key.first();
        let mut candidates: Vec<ClassSymbol> = Vec::new();
        for source in &self.sources {
            if let Some(sym) = source.get(name) {
                if !candidates.contains(&sym) {
                    candidates.push(sym);
                }
            }
        }
        match candidates.len() {
            0 => NameLookup::NotFound,
            1 => NameLookup::found(candidates.pop().unwrap(), key.rest().to_vec()),
            _ => NameLookup::Ambiguous {
                name: name.clone(),
                candidates,
            },
        }
    }
}

/// Static member imports as seen by constant evaluation: single imports map
/// a member name to its declaring type, on-demand imports contribute their
/// type wholesale.
#[derive(Debug, Default)]
pub struct MemberImportIndex {
    singles: Vec<(Name, ClassSymbol)>,
    on_demand: Vec<ClassSymbol>,
}

impl MemberImportIndex {
    pub fn create(
        resolver: &CanonicalResolver<'_>,
        tli: &TopLevelIndex,
        imports: &[tree::ImportDecl],
    ) -> Self {
        let mut index = MemberImportIndex::default();
        for import in imports.iter().filter(|i| i.is_static) {
            if import.wildcard {
                if let Some(sym) = resolve_qualified_type(resolver, tli, &import.path) {
                    index.on_demand.push(sym);
                }
            } else {
                if import.path.len() < 2 {
                    continue;
                }
                let member = import.path.last().unwrap().clone();
                if let Some(owner) = resolve_qualified_type(
                    resolver,
                    tli,
                    &import.path[..import.path.len() - 1],
                ) {
                    index.singles.push((member, owner));
                }
            }
        }
        index
    }

    /// The declaring type of a single-imported static member with this name.
    pub fn singleton_owner(&self, name: &Name) -> Option<&ClassSymbol> {
        self.singles
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, owner)| owner)
    }

    pub fn on_demand_owners(&self) -> &[ClassSymbol] {
        &self.on_demand
    }
}

fn dotted(path: &[Name]) -> String {
    path.iter()
        .map(Name::as_str)
        .collect::<Vec<_>>()
        .join(".")
}
