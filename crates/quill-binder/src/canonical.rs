//! Canonicalization: rewrites every class-typed reference so the enclosing
//! chain names the *declaring* class at each level.
//!
//! `C.I` where `I` is inherited from `C`'s superclass `A<X>` becomes
//! `A<X'>.I`, with the type arguments substituted through the superclass
//! chain from `C` to `A`. Type arguments stay on the segment whose class
//! declares the parameters; non-generic enclosing levels get empty
//! segments; raw qualifiers stay raw.

use std::collections::HashMap;
use std::sync::Arc;

use crate::bound::{SourceTypeBoundClass, TypeBoundView};
use crate::env::Env;
use crate::sym::{ClassSymbol, TyVarSymbol};
use crate::ty::{ClassTy, SimpleClassTy, Type, WildBound};

pub(crate) fn bind_class(
    info: &Arc<SourceTypeBoundClass>,
    env: &dyn Env<ClassSymbol, TypeBoundView>,
) -> SourceTypeBoundClass {
    let canon = Canonicalizer { env };
    let mut out = (**info).clone();

    out.superclass_ty = out.superclass_ty.take().map(|ty| canon.canon(ty));
    out.interface_tys = out
        .interface_tys
        .drain(..)
        .map(|ty| canon.canon(ty))
        .collect();
    for tp in &mut out.ty_params {
        tp.bounds = tp.bounds.drain(..).map(|ty| canon.canon(ty)).collect();
    }
    for field in &mut out.fields {
        field.ty = canon.canon(std::mem::replace(&mut field.ty, Type::Error));
    }
    for method in &mut out.methods {
        method.ret = canon.canon(std::mem::replace(&mut method.ret, Type::Error));
        for param in &mut method.params {
            param.ty = canon.canon(std::mem::replace(&mut param.ty, Type::Error));
        }
        if let Some(receiver) = &mut method.receiver {
            receiver.ty = canon.canon(std::mem::replace(&mut receiver.ty, Type::Error));
        }
        method.thrown = method.thrown.drain(..).map(|ty| canon.canon(ty)).collect();
        for tp in &mut method.ty_params {
            tp.bounds = tp.bounds.drain(..).map(|ty| canon.canon(ty)).collect();
        }
    }
    out
}

struct Canonicalizer<'e> {
    env: &'e dyn Env<ClassSymbol, TypeBoundView>,
}

impl Canonicalizer<'_> {
    fn canon(&self, ty: Type) -> Type {
        match ty {
            Type::Class(c) => Type::Class(self.canon_class(c)),
            Type::Array { elem, annos } => Type::Array {
                elem: Box::new(self.canon(*elem)),
                annos,
            },
            Type::Wild { bound, annos } => Type::Wild {
                bound: match bound {
                    WildBound::None => WildBound::None,
                    WildBound::Extends(ty) => WildBound::Extends(Box::new(self.canon(*ty))),
                    WildBound::Super(ty) => WildBound::Super(Box::new(self.canon(*ty))),
                },
                annos,
            },
            other => other,
        }
    }

    fn canon_class(&self, ty: ClassTy) -> ClassTy {
        let mut segments = ty.segments.into_iter();
        let first = segments.next().expect("class type has segments");

        let mut out = self.owner_prefix(&first.sym);
        out.push(SimpleClassTy {
            sym: first.sym,
            targs: first.targs.into_iter().map(|t| self.canon(t)).collect(),
            annos: first.annos,
        });

        for seg in segments {
            let declared_owner = self.owner_of(&seg.sym);
            let qualifier = out.last().expect("canonical chain is non-empty").clone();
            if let Some(owner) = declared_owner {
                if owner != qualifier.sym {
                    // The member was reached through an inheriting qualifier:
                    // rewrite the prefix to the declaring chain, instantiated
                    // through the qualifier's superclass walk.
                    let owner_seg = self.instantiate(&qualifier, &owner);
                    out = self.owner_prefix(&owner);
                    out.push(owner_seg);
                }
            }
            out.push(SimpleClassTy {
                sym: seg.sym,
                targs: seg.targs.into_iter().map(|t| self.canon(t)).collect(),
                annos: seg.annos,
            });
        }
        ClassTy { segments: out }
    }

    /// The declared owner chain, outermost first, as empty segments.
    fn owner_prefix(&self, sym: &ClassSymbol) -> Vec<SimpleClassTy> {
        let mut chain = Vec::new();
        let mut current = self.owner_of(sym);
        while let Some(owner) = current {
            current = self.owner_of(&owner);
            chain.push(owner);
        }
        chain.reverse();
        chain
            .into_iter()
            .map(|sym| SimpleClassTy {
                sym,
                targs: Vec::new(),
                annos: Vec::new(),
            })
            .collect()
    }

    fn owner_of(&self, sym: &ClassSymbol) -> Option<ClassSymbol> {
        self.view(sym)?.owner()
    }

    fn view(&self, sym: &ClassSymbol) -> Option<TypeBoundView> {
        // Eager environments only; no cycle signal by this stage.
        self.env.get(sym).ok().flatten()
    }

    /// The canonical segment for `owner` as instantiated by `qualifier`:
    /// walks the superclass chain from the qualifier to the declaring owner,
    /// composing type-argument substitutions. Raw anywhere on the walk means
    /// the result is raw.
    fn instantiate(&self, qualifier: &SimpleClassTy, owner: &ClassSymbol) -> SimpleClassTy {
        let raw_seg = SimpleClassTy {
            sym: owner.clone(),
            targs: Vec::new(),
            annos: Vec::new(),
        };
        let owner_params = match self.view(owner) {
            Some(view) => view.ty_param_syms(),
            None => return raw_seg,
        };
        if owner_params.is_empty() {
            return raw_seg;
        }

        let qualifier_params = self
            .view(&qualifier.sym)
            .map(|v| v.ty_param_syms())
            .unwrap_or_default();
        if qualifier.targs.is_empty() && !qualifier_params.is_empty() {
            return raw_seg;
        }
        let mut subst: HashMap<TyVarSymbol, Type> = qualifier_params
            .into_iter()
            .zip(qualifier.targs.iter().cloned())
            .collect();

        let mut current = qualifier.sym.clone();
        let mut seen = std::collections::HashSet::new();
        while current != *owner {
            // Malformed archives can make the superclass walk cyclic.
            if !seen.insert(current.clone()) {
                return raw_seg;
            }
            let Some((superclass, targs)) =
                self.view(&current).and_then(|v| v.super_instantiation())
            else {
                return raw_seg;
            };
            let super_params = self
                .view(&superclass)
                .map(|v| v.ty_param_syms())
                .unwrap_or_default();
            if targs.is_empty() && !super_params.is_empty() {
                return raw_seg;
            }
            subst = super_params
                .into_iter()
                .zip(targs.into_iter().map(|t| substitute(t, &subst)))
                .collect();
            current = superclass;
        }

        let owner_targs: Option<Vec<Type>> = owner_params
            .iter()
            .map(|p| subst.get(p).cloned())
            .collect();
        match owner_targs {
            Some(targs) => SimpleClassTy {
                sym: owner.clone(),
                targs,
                annos: Vec::new(),
            },
            None => raw_seg,
        }
    }
}

fn substitute(ty: Type, subst: &HashMap<TyVarSymbol, Type>) -> Type {
    match ty {
        Type::TyVar { sym, annos } => match subst.get(&sym) {
            Some(replacement) => replacement.clone(),
            None => Type::TyVar { sym, annos },
        },
        Type::Class(mut c) => {
            for seg in &mut c.segments {
                seg.targs = seg
                    .targs
                    .drain(..)
                    .map(|t| substitute(t, subst))
                    .collect();
            }
            Type::Class(c)
        }
        Type::Array { elem, annos } => Type::Array {
            elem: Box::new(substitute(*elem, subst)),
            annos,
        },
        Type::Wild { bound, annos } => Type::Wild {
            bound: match bound {
                WildBound::None => WildBound::None,
                WildBound::Extends(ty) => WildBound::Extends(Box::new(substitute(*ty, subst))),
                WildBound::Super(ty) => WildBound::Super(Box::new(substitute(*ty, subst))),
            },
            annos,
        },
        other => other,
    }
}
