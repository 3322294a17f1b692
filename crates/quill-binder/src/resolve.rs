//! Member-class resolution.
//!
//! Two flavors share the visibility rule but differ in what they walk:
//! canonical resolution (imports, qualified names outside a class body) sees
//! only *declared* members, while hierarchy-aware resolution (supertype and
//! signature binding) also finds members inherited through superclasses and
//! interfaces, driving lazy completion as it goes.

use std::collections::HashSet;

use quill_core::flags::{ACC_PROTECTED, ACC_PUBLIC};
use quill_core::Name;

use crate::bound::{BoundClassView, HeaderBoundView};
use crate::env::{CycleError, Env};
use crate::lookup::LookupResult;
use crate::sym::ClassSymbol;

/// Private members are never resolvable; package-private members only from
/// the same package.
fn visible(origin_pkg: &str, sym: &ClassSymbol, access: u32) -> bool {
    access & (ACC_PUBLIC | ACC_PROTECTED) != 0 || sym.package_name() == origin_pkg
}

/// Canonical resolution against declared member maps.
pub struct CanonicalResolver<'e> {
    origin_pkg: String,
    env: &'e dyn Env<ClassSymbol, BoundClassView>,
}

impl<'e> CanonicalResolver<'e> {
    pub fn new(origin_pkg: impl Into<String>, env: &'e dyn Env<ClassSymbol, BoundClassView>) -> Self {
        Self {
            origin_pkg: origin_pkg.into(),
            env,
        }
    }

    /// A declared member class of `sym`, when visible from the origin.
    pub fn resolve_member(&self, sym: &ClassSymbol, name: &Name) -> Option<ClassSymbol> {
        // These envs are eager; the cycle signal cannot occur.
        let info = self.env.get(sym).ok().flatten()?;
        let child = info.child(name)?;
        match self.env.get(&child).ok().flatten() {
            Some(ci) if !visible(&self.origin_pkg, &child, ci.access()) => None,
            _ => Some(child),
        }
    }

    /// Folds the unconsumed segments of a scope hit into member classes.
    pub fn resolve_rest(&self, result: &LookupResult) -> Option<ClassSymbol> {
        let mut sym = result.sym.clone();
        for seg in &result.remaining {
            sym = self.resolve_member(&sym, seg)?;
        }
        Some(sym)
    }

    /// The declared members of `sym` that are visible from the origin, for
    /// on-demand import expansion.
    pub fn visible_members(&self, sym: &ClassSymbol) -> Vec<(Name, ClassSymbol)> {
        let Some(info) = self.env.get(sym).ok().flatten() else {
            return Vec::new();
        };
        info.children()
            .into_iter()
            .filter(|(_, child)| match self.env.get(child).ok().flatten() {
                Some(ci) => visible(&self.origin_pkg, child, ci.access()),
                None => true,
            })
            .collect()
    }
}

/// A member class of `sym`, declared or inherited. Walks the superclass
/// first, then superinterfaces, completing lazily bound classes on the way;
/// re-entering an in-progress completion surfaces the cycle signal.
pub fn resolve_member(
    env: &dyn Env<ClassSymbol, HeaderBoundView>,
    origin_pkg: &str,
    sym: &ClassSymbol,
    name: &Name,
) -> Result<Option<ClassSymbol>, CycleError<ClassSymbol>> {
    let mut seen = HashSet::new();
    resolve_walk(env, origin_pkg, sym, name, &mut seen)
}

fn resolve_walk(
    env: &dyn Env<ClassSymbol, HeaderBoundView>,
    origin_pkg: &str,
    sym: &ClassSymbol,
    name: &Name,
    seen: &mut HashSet<ClassSymbol>,
) -> Result<Option<ClassSymbol>, CycleError<ClassSymbol>> {
    if !seen.insert(sym.clone()) {
        return Ok(None);
    }
    let Some(info) = env.get(sym)? else {
        return Ok(None);
    };
    if let Some(child) = info.child(name) {
        let is_visible = match env.get(&child)? {
            Some(ci) => visible(origin_pkg, &child, ci.access()),
            None => true,
        };
        if is_visible {
            return Ok(Some(child));
        }
    }
    if let Some(superclass) = info.superclass() {
        if let Some(found) = resolve_walk(env, origin_pkg, &superclass, name, seen)? {
            return Ok(Some(found));
        }
    }
    for iface in info.interfaces() {
        if let Some(found) = resolve_walk(env, origin_pkg, &iface, name, seen)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}
