//! The type pass: binds type-parameter bounds, field types, method
//! signatures, and raw annotation uses for one source class.
//!
//! Name resolution sees, in order: type variables (method, then class, then
//! enclosing classes up to the first static boundary), members of the class
//! and its enclosing classes (inherited ones included, JLS 6.5.5), and then
//! the unit scope assembled by the package pass.

use std::sync::Arc;

use quill_core::flags::{
    ACC_ABSTRACT, ACC_DEFAULT, ACC_DEPRECATED, ACC_ENUM, ACC_FINAL, ACC_PUBLIC, ACC_STATIC,
};
use quill_core::{ClassKind, Name, Span};
use quill_tree as tree;

use crate::bound::{
    FieldInfo, HeaderBoundView, MethodInfo, ParamInfo, SourceHeaderBoundClass,
    SourceTypeBoundClass, TyVarInfo,
};
use crate::diag::{Diags, AMBIGUOUS, BAD_BOUND, CYCLIC_SUPERTYPE_DEPENDENCY, NOT_FOUND};
use crate::env::{CycleError, Env};
use crate::lookup::{LookupKey, LookupResult, NameLookup, Scope};
use crate::resolve;
use crate::sym::{ClassSymbol, FieldSymbol, MethodSymbol, TyVarSymbol};
use crate::ty::{AnnoInfo, ClassTy, SimpleClassTy, Type, WildBound};

pub(crate) fn bind(
    env: &dyn Env<ClassSymbol, HeaderBoundView>,
    sym: &ClassSymbol,
    shb: &Arc<SourceHeaderBoundClass>,
    diags: &Diags,
) -> SourceTypeBoundClass {
    let mut binder = TypeBinder::new(env, sym, shb, diags);
    binder.bind_class()
}

struct TypeBinder<'e> {
    env: &'e dyn Env<ClassSymbol, HeaderBoundView>,
    sym: &'e ClassSymbol,
    shb: &'e Arc<SourceHeaderBoundClass>,
    diags: &'e Diags,
    origin_pkg: String,
    /// Innermost first: method type parameters (while binding a method),
    /// then the class chain outward to the first static boundary.
    ty_var_scopes: Vec<Vec<(Name, TyVarSymbol)>>,
    /// The class and its lexical enclosers, for member-first resolution.
    enclosing: Vec<ClassSymbol>,
}

impl<'e> TypeBinder<'e> {
    fn new(
        env: &'e dyn Env<ClassSymbol, HeaderBoundView>,
        sym: &'e ClassSymbol,
        shb: &'e Arc<SourceHeaderBoundClass>,
        diags: &'e Diags,
    ) -> Self {
        let mut ty_var_scopes = vec![shb.ty_params.clone()];
        let mut enclosing = vec![sym.clone()];

        let mut view = HeaderBoundView::Source(shb.clone());
        loop {
            // Implicitly static kinds cut off outer type variables too.
            let is_static =
                view.access() & ACC_STATIC != 0 || view.kind() != ClassKind::Class;
            let Some(owner) = view.owner() else {
                break;
            };
            enclosing.push(owner.clone());
            let owner_view = match env.get(&owner) {
                Ok(Some(v)) => v,
                _ => break,
            };
            if !is_static {
                ty_var_scopes.push(owner_view.ty_params());
            }
            view = owner_view;
        }

        Self {
            env,
            sym,
            shb,
            diags,
            origin_pkg: sym.package_name().to_string(),
            ty_var_scopes,
            enclosing,
        }
    }

    fn bind_class(&mut self) -> SourceTypeBoundClass {
        let decl = self.shb.decl().clone();
        let kind = self.shb.kind();

        let annotations = self.bind_annos(&decl.annos);
        let mut access = self.shb.access();
        if is_deprecated(&annotations) {
            access |= ACC_DEPRECATED;
        }

        let ty_params = self.bind_ty_params(&decl.ty_params, |name| {
            self.shb
                .ty_param(name)
                .cloned()
                .unwrap_or_else(|| TyVarSymbol::of_class(self.sym.clone(), name.clone()))
        });

        let superclass_ty = match (&decl.extends, &self.shb.superclass) {
            (Some(extends), _) => match self.bind_class_ty_ref(extends) {
                Type::Class(c) => Some(Type::Class(c)),
                _ => self.shb.superclass.clone().map(|s| Type::Class(ClassTy::plain(s))),
            },
            (None, Some(superclass)) => Some(Type::Class(ClassTy::plain(superclass.clone()))),
            (None, None) => None,
        };

        let mut interface_tys = Vec::new();
        if kind == ClassKind::Annotation {
            interface_tys.push(Type::Class(ClassTy::plain(ClassSymbol::annotation_root())));
        }
        for iface in &decl.implements {
            if let Type::Class(c) = self.bind_class_ty_ref(iface) {
                interface_tys.push(Type::Class(c));
            }
        }

        let mut fields = Vec::new();
        let mut methods = Vec::new();
        for member in &decl.members {
            match member {
                tree::Member::Field(field) => fields.push(self.bind_field(field, kind)),
                tree::Member::EnumConst(ec) => fields.push(self.bind_enum_const(ec)),
                tree::Member::Method(method) => methods.push(self.bind_method(method, kind)),
                // Nested types are bound as their own symbols.
                tree::Member::Type(_) => {}
            }
        }

        SourceTypeBoundClass {
            owner: self.shb.owner().cloned(),
            kind,
            children: self.shb.base.base.children.clone(),
            access,
            ty_params,
            superclass: self.shb.superclass.clone(),
            superclass_ty,
            interfaces: self.shb.interfaces.clone(),
            interface_tys,
            fields,
            methods,
            annotations,
            metadata: None,
            scope: self.shb.base.scope.clone(),
            member_imports: self.shb.base.member_imports.clone(),
            source: self.shb.base.source.clone(),
        }
    }

    fn bind_ty_params(
        &self,
        decls: &[tree::TyParamDecl],
        sym_for: impl Fn(&Name) -> TyVarSymbol,
    ) -> Vec<TyVarInfo> {
        decls
            .iter()
            .map(|tp| {
                let bounds = tp
                    .bounds
                    .iter()
                    .map(|bound| {
                        let ty = self.bind_ty(bound);
                        match &ty {
                            Type::Class(_) | Type::TyVar { .. } | Type::Error => ty,
                            _ => {
                                self.diags.error(
                                    Some(self.sym),
                                    BAD_BOUND,
                                    format!("{} is not a class or interface bound", tp.name),
                                    Some(bound.span()),
                                );
                                Type::Error
                            }
                        }
                    })
                    .collect();
                TyVarInfo {
                    sym: sym_for(&tp.name),
                    name: tp.name.clone(),
                    bounds,
                    annotations: self.bind_annos(&tp.annos),
                }
            })
            .collect()
    }

    fn bind_field(&self, decl: &tree::FieldDecl, enclosing_kind: ClassKind) -> FieldInfo {
        let ty = self.bind_ty(&decl.ty);
        let mut access = decl.mods;
        if enclosing_kind.is_interface_like() {
            // Interface fields are implicitly public static final (JLS 9.3).
            access |= ACC_PUBLIC | ACC_STATIC | ACC_FINAL;
        }
        let annotations = self.bind_annos(&decl.annos);
        if is_deprecated(&annotations) {
            access |= ACC_DEPRECATED;
        }
        FieldInfo {
            sym: FieldSymbol::new(self.sym.clone(), decl.name.clone()),
            ty,
            access,
            decl: Some(decl.clone()),
            annotations,
            value: None,
        }
    }

    fn bind_enum_const(&self, decl: &tree::EnumConstDecl) -> FieldInfo {
        FieldInfo {
            sym: FieldSymbol::new(self.sym.clone(), decl.name.clone()),
            ty: Type::Class(ClassTy::plain(self.sym.clone())),
            access: ACC_PUBLIC | ACC_STATIC | ACC_FINAL | ACC_ENUM,
            decl: None,
            annotations: self.bind_annos(&decl.annos),
            value: None,
        }
    }

    fn bind_method(&mut self, decl: &tree::MethDecl, enclosing_kind: ClassKind) -> MethodInfo {
        let sym = MethodSymbol::new(self.sym.clone(), decl.name.clone());

        let method_ty_vars: Vec<(Name, TyVarSymbol)> = decl
            .ty_params
            .iter()
            .map(|tp| {
                (
                    tp.name.clone(),
                    TyVarSymbol::of_method(sym.clone(), tp.name.clone()),
                )
            })
            .collect();
        self.ty_var_scopes.insert(0, method_ty_vars.clone());

        let ty_params = self.bind_ty_params(&decl.ty_params, |name| {
            method_ty_vars
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, s)| s.clone())
                .expect("method type parameter was just collected")
        });

        let ret = self.bind_ty(&decl.ret);
        let params = decl
            .params
            .iter()
            .map(|p| self.bind_param(p))
            .collect::<Vec<_>>();
        let receiver = decl.receiver.as_ref().map(|p| self.bind_param(p));
        let thrown = decl
            .thrown
            .iter()
            .map(|t| self.bind_class_ty_ref(t))
            .collect();

        self.ty_var_scopes.remove(0);

        let mut access = decl.mods;
        if enclosing_kind.is_interface_like() {
            access |= ACC_PUBLIC;
            if access & (ACC_STATIC | ACC_DEFAULT) == 0 {
                access |= ACC_ABSTRACT;
            }
        }
        let annotations = self.bind_annos(&decl.annos);
        if is_deprecated(&annotations) {
            access |= ACC_DEPRECATED;
        }

        MethodInfo {
            sym,
            ty_params,
            access,
            ret,
            params,
            receiver,
            thrown,
            annotations,
            default_expr: decl.default_value.clone(),
            default_value: None,
        }
    }

    fn bind_param(&self, decl: &tree::ParamDecl) -> ParamInfo {
        ParamInfo {
            name: decl.name.clone(),
            ty: self.bind_ty(&decl.ty),
            access: decl.mods,
            annotations: self.bind_annos(&decl.annos),
        }
    }

    // === Types ==============================================================

    fn bind_ty(&self, ty: &tree::Ty) -> Type {
        match ty {
            tree::Ty::Prim { kind, annos, .. } => Type::Prim {
                kind: *kind,
                annos: self.bind_annos(annos),
            },
            tree::Ty::Void { .. } => Type::Void,
            tree::Ty::Class(cty) => self.bind_class_ty(cty),
            tree::Ty::Array { elem, annos, .. } => Type::Array {
                elem: Box::new(self.bind_ty(elem)),
                annos: self.bind_annos(annos),
            },
            tree::Ty::Wild { bound, annos, .. } => Type::Wild {
                bound: match bound {
                    None => WildBound::None,
                    Some((tree::WildBoundKind::Extends, ty)) => {
                        WildBound::Extends(Box::new(self.bind_ty(ty)))
                    }
                    Some((tree::WildBoundKind::Super, ty)) => {
                        WildBound::Super(Box::new(self.bind_ty(ty)))
                    }
                },
                annos: self.bind_annos(annos),
            },
        }
    }

    fn bind_class_ty_ref(&self, cty: &tree::ClassTy) -> Type {
        self.bind_class_ty(cty)
    }

    fn bind_class_ty(&self, cty: &tree::ClassTy) -> Type {
        // Type variables short-circuit class lookup for simple names.
        if let [seg] = cty.segments.as_slice() {
            if seg.ty_args.is_empty() {
                if let Some(tv) = self.lookup_ty_var(&seg.name) {
                    return Type::TyVar {
                        sym: tv,
                        annos: self.bind_annos(&seg.annos),
                    };
                }
            }
        }

        let key = LookupKey::new(cty.segments.iter().map(|s| s.name.clone()).collect());
        let Some(result) = self.resolve_prefix(&key, cty.span) else {
            return Type::Error;
        };

        // The found symbol corresponds to the written segment just before the
        // unconsumed suffix; earlier segments named packages.
        let consumed = cty.segments.len() - result.remaining.len();
        let first_written = &cty.segments[consumed - 1];
        let mut segments = vec![SimpleClassTy {
            sym: result.sym.clone(),
            targs: first_written.ty_args.iter().map(|t| self.bind_ty(t)).collect(),
            annos: self.bind_annos(&first_written.annos),
        }];

        let mut current = result.sym;
        for (i, member) in result.remaining.iter().enumerate() {
            let written = &cty.segments[consumed + i];
            match resolve::resolve_member(self.env, &self.origin_pkg, &current, member) {
                Ok(Some(next)) => {
                    segments.push(SimpleClassTy {
                        sym: next.clone(),
                        targs: written.ty_args.iter().map(|t| self.bind_ty(t)).collect(),
                        annos: self.bind_annos(&written.annos),
                    });
                    current = next;
                }
                Ok(None) => {
                    self.diags.error(
                        Some(self.sym),
                        NOT_FOUND,
                        format!("could not resolve {member} in {current}"),
                        Some(cty.span),
                    );
                    return Type::Error;
                }
                Err(cycle) => {
                    self.cycle_diag(&cycle, cty.span);
                    return Type::Error;
                }
            }
        }
        Type::Class(ClassTy { segments })
    }

    /// Members of the class and its enclosers first, then the unit scope.
    fn resolve_prefix(&self, key: &LookupKey, span: Span) -> Option<LookupResult> {
        for owner in &self.enclosing {
            match resolve::resolve_member(self.env, &self.origin_pkg, owner, key.first()) {
                Ok(Some(found)) => {
                    return Some(LookupResult {
                        sym: found,
                        remaining: key.rest().to_vec(),
                    })
                }
                Ok(None) => {}
                Err(cycle) => {
                    self.cycle_diag(&cycle, span);
                    return None;
                }
            }
        }
        match self.shb.base.scope.lookup(key) {
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
                    Some(span),
                );
                None
            }
            NameLookup::NotFound => {
                self.diags.error(
                    Some(self.sym),
                    NOT_FOUND,
                    format!(
                        "could not resolve {}",
                        key.segments()
                            .iter()
                            .map(|n| n.as_str())
                            .collect::<Vec<_>>()
                            .join(".")
                    ),
                    Some(span),
                );
                None
            }
        }
    }

    fn lookup_ty_var(&self, name: &Name) -> Option<TyVarSymbol> {
        for scope in &self.ty_var_scopes {
            if let Some((_, sym)) = scope.iter().find(|(n, _)| n == name) {
                return Some(sym.clone());
            }
        }
        None
    }

    fn cycle_diag(&self, cycle: &CycleError<ClassSymbol>, span: Span) {
        self.diags.error(
            Some(self.sym),
            CYCLIC_SUPERTYPE_DEPENDENCY,
            format!("depends on a cyclic hierarchy ({cycle})"),
            Some(span),
        );
    }

    // === Annotations ========================================================

    fn bind_annos(&self, annos: &[tree::Anno]) -> Vec<AnnoInfo> {
        annos.iter().map(|a| self.bind_anno(a)).collect()
    }

    fn bind_anno(&self, anno: &tree::Anno) -> AnnoInfo {
        let key = LookupKey::new(anno.name.clone());
        let sym = self
            .resolve_prefix(&key, anno.span)
            .and_then(|result| {
                let mut sym = result.sym;
                for seg in &result.remaining {
                    match resolve::resolve_member(self.env, &self.origin_pkg, &sym, seg) {
                        Ok(Some(next)) => sym = next,
                        _ => return None,
                    }
                }
                Some(sym)
            });
        AnnoInfo::new(sym, anno.clone())
    }
}

fn is_deprecated(annotations: &[AnnoInfo]) -> bool {
    annotations
        .iter()
        .any(|a| a.sym.as_ref() == Some(&ClassSymbol::deprecated()))
}
