//! The hierarchy pass: resolves each source class's superclass, direct
//! superinterfaces, and type-parameter symbols (bounds wait for the type
//! pass).
//!
//! Runs entirely under the lazy environment so forward references complete
//! on demand; a class that transitively extends itself surfaces as the cycle
//! signal from [`LazyEnv`].

use std::collections::HashMap;
use std::sync::Arc;

use quill_core::{ClassKind, Name};
use quill_tree as tree;

use crate::bound::{HeaderBoundView, PackageSourceBoundClass, SourceHeaderBoundClass};
use crate::diag::{Diags, AMBIGUOUS, DUPLICATE_DECLARATION, NOT_FOUND};
use crate::env::{Completer, CycleError, Env, LazyEnv, SimpleEnv};
use crate::lookup::{LookupKey, LookupResult, NameLookup, Scope};
use crate::resolve;
use crate::sym::{ClassSymbol, TyVarSymbol};

type PackageEnv = SimpleEnv<ClassSymbol, Arc<PackageSourceBoundClass>>;

/// Builds the lazy header environment over every source symbol, with the
/// classpath as base.
pub(crate) fn lazy_env<'e>(
    syms: &[ClassSymbol],
    psenv: &'e PackageEnv,
    base: &'e dyn Env<ClassSymbol, HeaderBoundView>,
    diags: &'e Diags,
) -> LazyEnv<'e, ClassSymbol, HeaderBoundView> {
    let mut completers: HashMap<ClassSymbol, Completer<'e, ClassSymbol, HeaderBoundView>> =
        HashMap::new();
    for sym in syms {
        completers.insert(
            sym.clone(),
            Box::new(move |env, sym| {
                let psb = psenv
                    .get(sym)?
                    .expect("every source symbol is package-bound");
                let bound = HierarchyBinder {
                    sym,
                    psb: &psb,
                    env,
                    psenv,
                    diags,
                }
                .bind()?;
                Ok(Some(HeaderBoundView::Source(Arc::new(bound))))
            }),
        );
    }
    LazyEnv::new(completers, base)
}

struct HierarchyBinder<'a> {
    sym: &'a ClassSymbol,
    psb: &'a Arc<PackageSourceBoundClass>,
    env: &'a dyn Env<ClassSymbol, HeaderBoundView>,
    psenv: &'a PackageEnv,
    diags: &'a Diags,
}

impl HierarchyBinder<'_> {
    fn bind(&self) -> Result<SourceHeaderBoundClass, CycleError<ClassSymbol>> {
        let decl = &self.psb.base.decl;
        let kind = self.psb.base.kind;

        let mut ty_params: Vec<(Name, TyVarSymbol)> = Vec::new();
        for tp in &decl.ty_params {
            if ty_params.iter().any(|(name, _)| *name == tp.name) {
                self.diags.error(
                    Some(self.sym),
                    DUPLICATE_DECLARATION,
                    format!("duplicate type parameter {}", tp.name),
                    Some(tp.span),
                );
                continue;
            }
            let sym = TyVarSymbol::of_class(self.sym.clone(), tp.name.clone());
            ty_params.push((tp.name.clone(), sym));
        }

        let superclass = match kind {
            ClassKind::Enum => Some(ClassSymbol::enum_root()),
            ClassKind::Annotation | ClassKind::Interface => Some(ClassSymbol::object()),
            ClassKind::Class => match &decl.extends {
                // Unresolved extends falls back to the root so the header
                // invariant holds; the diagnostic is already recorded.
                Some(extends) => Some(self.resolve(extends)?.unwrap_or_else(ClassSymbol::object)),
                None if *self.sym == ClassSymbol::object() => None,
                None => Some(ClassSymbol::object()),
            },
        };

        let mut interfaces = Vec::new();
        if kind == ClassKind::Annotation {
            interfaces.push(ClassSymbol::annotation_root());
        }
        // For interfaces the extends list arrives in `implements`.
        for iface in &decl.implements {
            if let Some(sym) = self.resolve(iface)? {
                interfaces.push(sym);
            }
        }

        // Drive the resolved supertypes: an extends graph that reaches back
        // to this class re-enters its in-progress completion and surfaces
        // as the cycle signal.
        if let Some(superclass) = &superclass {
            self.env.get(superclass)?;
        }
        for iface in &interfaces {
            self.env.get(iface)?;
        }

        Ok(SourceHeaderBoundClass {
            base: self.psb.clone(),
            superclass,
            interfaces,
            ty_params,
        })
    }

    /// Resolves a supertype reference: members of the enclosing classes
    /// (including inherited ones, driving completion) shadow the unit scope;
    /// unconsumed segments resolve as members through the hierarchy.
    fn resolve(
        &self,
        ty: &tree::ClassTy,
    ) -> Result<Option<ClassSymbol>, CycleError<ClassSymbol>> {
        let origin_pkg = self.sym.package_name().to_string();
        let key = LookupKey::new(ty.segments.iter().map(|s| s.name.clone()).collect());

        let mut hit: Option<LookupResult> = None;
        let mut enclosing = self.psb.base.owner.clone();
        while let Some(owner) = enclosing {
            if let Some(found) = resolve::resolve_member(self.env, &origin_pkg, &owner, key.first())?
            {
                hit = Some(LookupResult {
                    sym: found,
                    remaining: key.rest().to_vec(),
                });
                break;
            }
            enclosing = self
                .psenv
                .get(&owner)?
                .and_then(|p| p.base.owner.clone());
        }

        let hit = match hit {
            Some(hit) => Some(hit),
            None => match self.psb.scope.lookup(&key) {
                NameLookup::Found(result) => Some(result),
                NameLookup::Ambiguous { name, candidates } => {
                    self.diags.error(
                        Some(self.sym),
                        AMBIGUOUS,
                        format!(
                            "{name} is ambiguous: {}",
                            candidates
                                .iter()
                                .map(ToString::to_string)
                                .collect::<Vec<_>>()
                                .join(", ")
                        ),
                        Some(ty.span),
                    );
                    None
                }
                NameLookup::NotFound => None,
            },
        };

        let Some(result) = hit else {
            self.diags.error(
                Some(self.sym),
                NOT_FOUND,
                format!("could not resolve {}", dotted(&key)),
                Some(ty.span),
            );
            return Ok(None);
        };

        let mut sym = result.sym;
        for seg in &result.remaining {
            match resolve::resolve_member(self.env, &origin_pkg, &sym, seg)? {
                Some(next) => sym = next,
                None => {
                    self.diags.error(
                        Some(self.sym),
                        NOT_FOUND,
                        format!("could not resolve {seg} in {sym}"),
                        Some(ty.span),
                    );
                    return Ok(None);
                }
            }
        }
        Ok(Some(sym))
    }
}

fn dotted(key: &LookupKey) -> String {
    key.segments()
        .iter()
        .map(|n| n.as_str())
        .collect::<Vec<_>>()
        .join(".")
}
