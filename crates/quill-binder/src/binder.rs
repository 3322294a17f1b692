//! The entry point: drives the pass pipeline over a set of compilation
//! units and a classpath, producing the final bound graph.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use quill_core::flags::{
    self, ACC_ABSTRACT, ACC_ANNOTATION, ACC_ENUM, ACC_INTERFACE, ACC_SYNTHETIC,
};
use quill_core::{ClassKind, ConstValue, Name};
use quill_tree as tree;

use crate::bound::{
    BoundClassView, HeaderBoundView, PackageSourceBoundClass, SourceBoundClass,
    SourceTypeBoundClass, TypeBoundView,
};
use crate::classpath::{self, ClasspathEnv, ClasspathError};
use crate::consts;
use crate::diag::{
    BindDiagnostic, Diags, CYCLIC_HIERARCHY, CYCLIC_SUPERTYPE_DEPENDENCY, DUPLICATE_DECLARATION,
};
use crate::disambiguate;
use crate::env::{CompoundEnv, Env, LazyEnv, SimpleEnv};
use crate::hierarchy;
use crate::imports::{ImportIndex, MemberImportIndex, WildImportIndex};
use crate::lookup::{CompoundScope, Scope, TopLevelIndex};
use crate::resolve::CanonicalResolver;
use crate::sym::{ClassSymbol, FieldSymbol};
use crate::canonical;
use crate::type_binder;

/// The result of binding: the fully bound source classes, the retained
/// classpath environment, and every diagnostic the passes recorded.
#[derive(Debug)]
pub struct BindingResult {
    units: HashMap<ClassSymbol, Arc<SourceTypeBoundClass>>,
    order: Vec<ClassSymbol>,
    classpath: ClasspathEnv,
    diagnostics: Vec<BindDiagnostic>,
}

impl BindingResult {
    pub fn get(&self, sym: &ClassSymbol) -> Option<&Arc<SourceTypeBoundClass>> {
        self.units.get(sym)
    }

    /// Bound class symbols in declaration order.
    pub fn symbols(&self) -> &[ClassSymbol] {
        &self.order
    }

    pub fn units(&self) -> &HashMap<ClassSymbol, Arc<SourceTypeBoundClass>> {
        &self.units
    }

    pub fn classpath(&self) -> &ClasspathEnv {
        &self.classpath
    }

    pub fn diagnostics(&self) -> &[BindDiagnostic] {
        &self.diagnostics
    }

    /// The `InnerClasses` attribute chain for `sym`: every nested class on
    /// its enclosing path, outermost member first, `sym` itself last.
    pub fn inner_classes(&self, sym: &ClassSymbol) -> Vec<ClassSymbol> {
        let mut chain = Vec::new();
        let mut current = Some(sym.clone());
        while let Some(s) = current {
            let owner = match self.units.get(&s) {
                Some(info) => info.owner.clone(),
                None => self.classpath.get_class(&s).and_then(|b| b.owner()),
            };
            if owner.is_some() {
                chain.push(s);
            }
            current = owner;
        }
        chain.reverse();
        chain
    }
}

/// Binds symbols and types for the given compilation units against the
/// classpath and bootclasspath archives.
pub fn bind(
    units: &[tree::CompUnit],
    classpath: &[PathBuf],
    bootclasspath: &[PathBuf],
) -> Result<BindingResult, ClasspathError> {
    let diags = Diags::default();
    let mut tli_builder = TopLevelIndex::builder();

    // Source binding seeds the index first: sources outrank every archive.
    let mut ienv: SimpleEnv<ClassSymbol, BoundClassView> = SimpleEnv::new();
    let mut order: Vec<ClassSymbol> = Vec::new();
    let mut unit_syms: Vec<Vec<ClassSymbol>> = Vec::with_capacity(units.len());
    for unit in units {
        let pkg_prefix = match &unit.pkg {
            Some(pkg) => {
                let mut prefix = pkg
                    .name
                    .iter()
                    .map(Name::as_str)
                    .collect::<Vec<_>>()
                    .join("/");
                prefix.push('/');
                prefix
            }
            None => String::new(),
        };
        let mut decls: Vec<tree::TyDecl> = unit.decls.clone();
        if let Some(pkg) = &unit.pkg {
            if !pkg.annos.is_empty() {
                decls.push(package_info_decl(pkg));
            }
        }
        let mut syms_of_unit = Vec::new();
        for decl in &decls {
            let sym = ClassSymbol::new(format!("{pkg_prefix}{}", decl.name));
            bind_source_decl(
                &mut ienv,
                &mut tli_builder,
                &mut order,
                &mut syms_of_unit,
                sym,
                decl,
                None,
                None,
                &diags,
            );
        }
        unit_syms.push(syms_of_unit);
    }
    tracing::debug!(units = units.len(), classes = order.len(), "bound sources");

    let classpath_env = classpath::bind(bootclasspath, classpath, &mut tli_builder)?;
    let tli: Arc<TopLevelIndex> = Arc::new(tli_builder.build());

    // Package binding: one composite scope per unit, shared by its classes.
    let bound_env: CompoundEnv<'_, ClassSymbol, BoundClassView> =
        CompoundEnv::of(&ienv).append(&classpath_env);
    let java_lang = tli.lookup_package(&[Name::from("java"), Name::from("lang")]);
    let mut psenv: SimpleEnv<ClassSymbol, Arc<PackageSourceBoundClass>> = SimpleEnv::new();
    for (unit, syms_of_unit) in units.iter().zip(&unit_syms) {
        if syms_of_unit.is_empty() {
            continue;
        }
        let pkg_segments: Vec<Name> = unit
            .pkg
            .as_ref()
            .map(|p| p.name.clone())
            .unwrap_or_default();
        let pkg_name = pkg_segments
            .iter()
            .map(Name::as_str)
            .collect::<Vec<_>>()
            .join("/");

        let resolver = CanonicalResolver::new(pkg_name, &bound_env);
        let import_index = Arc::new(ImportIndex::create(&resolver, &tli, &unit.imports, &diags));
        let wild_index = Arc::new(WildImportIndex::create(&resolver, &tli, &unit.imports, &diags));
        let member_imports = Arc::new(MemberImportIndex::create(&resolver, &tli, &unit.imports));
        let package_scope = tli.lookup_package(&pkg_segments);

        let scope = CompoundScope::of(tli.clone() as Arc<dyn Scope>)
            .append_opt(java_lang.clone().map(|n| n as Arc<dyn Scope>))
            .append(wild_index as Arc<dyn Scope>)
            .append_opt(package_scope.map(|n| n as Arc<dyn Scope>))
            .append(import_index as Arc<dyn Scope>);

        for sym in syms_of_unit {
            let Some(BoundClassView::Source(base)) = ienv.get_ref(sym) else {
                continue;
            };
            psenv.insert(
                sym.clone(),
                Arc::new(PackageSourceBoundClass {
                    base: base.clone(),
                    scope: scope.clone(),
                    member_imports: member_imports.clone(),
                    source: unit.source.clone(),
                }),
            );
        }
    }

    // Hierarchy and type binding. Driving order is first-request order; a
    // cycle is terminal for the classes on it and their dependents.
    let henv = hierarchy::lazy_env(&order, &psenv, &classpath_env, &diags);
    let mut tenv: SimpleEnv<ClassSymbol, TypeBoundView> = SimpleEnv::new();
    let mut bound_order: Vec<ClassSymbol> = Vec::new();
    for sym in &order {
        match henv.get(sym) {
            Ok(Some(HeaderBoundView::Source(shb))) => {
                let stb = type_binder::bind(&henv, sym, &shb, &diags);
                tenv.insert(sym.clone(), TypeBoundView::Source(Arc::new(stb)));
                bound_order.push(sym.clone());
            }
            Ok(other) => {
                debug_assert!(other.is_none(), "source symbols complete to source views");
            }
            Err(cycle) => {
                if cycle.contains(sym) {
                    diags.error(
                        Some(sym),
                        CYCLIC_HIERARCHY,
                        format!("cyclic inheritance ({cycle})"),
                        None,
                    );
                } else {
                    diags.error(
                        Some(sym),
                        CYCLIC_SUPERTYPE_DEPENDENCY,
                        format!("depends on a cyclic hierarchy ({cycle})"),
                        None,
                    );
                }
            }
        }
    }
    tracing::debug!(classes = bound_order.len(), "bound types");
    drop(henv);

    // Constants: a lazy environment over every source constant field, then
    // the substitution pass.
    let classes: Vec<(ClassSymbol, Arc<SourceTypeBoundClass>)> = bound_order
        .iter()
        .map(|sym| {
            let info = tenv
                .get_ref(sym)
                .and_then(TypeBoundView::as_source)
                .expect("type-bound source class")
                .clone();
            (sym.clone(), info)
        })
        .collect();
    let tview_env: CompoundEnv<'_, ClassSymbol, TypeBoundView> =
        CompoundEnv::of(&tenv).append(&classpath_env);
    let field_base: SimpleEnv<FieldSymbol, ConstValue> = SimpleEnv::new();
    let const_env = LazyEnv::new(consts::completers(&classes, &tview_env, &diags), &field_base);
    let mut cenv: SimpleEnv<ClassSymbol, TypeBoundView> = SimpleEnv::new();
    for (sym, info) in &classes {
        let bound = consts::bind_class(sym, info, &const_env, &tview_env, &diags);
        cenv.insert(sym.clone(), TypeBoundView::Source(Arc::new(bound)));
    }
    drop(const_env);

    // Type-annotation disambiguation.
    let cview_env: CompoundEnv<'_, ClassSymbol, TypeBoundView> =
        CompoundEnv::of(&cenv).append(&classpath_env);
    let mut denv: SimpleEnv<ClassSymbol, TypeBoundView> = SimpleEnv::new();
    for sym in &bound_order {
        let info = cenv
            .get_ref(sym)
            .and_then(TypeBoundView::as_source)
            .expect("constant-bound source class")
            .clone();
        let bound = disambiguate::bind_class(sym, &info, &cview_env, &diags);
        denv.insert(sym.clone(), TypeBoundView::Source(Arc::new(bound)));
    }

    // Canonicalization.
    let dview_env: CompoundEnv<'_, ClassSymbol, TypeBoundView> =
        CompoundEnv::of(&denv).append(&classpath_env);
    let mut result_units: HashMap<ClassSymbol, Arc<SourceTypeBoundClass>> = HashMap::new();
    for sym in &bound_order {
        let info = denv
            .get_ref(sym)
            .and_then(TypeBoundView::as_source)
            .expect("disambiguated source class")
            .clone();
        let bound = canonical::bind_class(&info, &dview_env);
        result_units.insert(sym.clone(), Arc::new(bound));
    }

    Ok(BindingResult {
        units: result_units,
        order: bound_order,
        classpath: classpath_env,
        diagnostics: diags.into_vec(),
    })
}

/// The synthetic `package-info` declaration for an annotated package
/// declaration (JLS 7.4.1).
fn package_info_decl(pkg: &tree::PkgDecl) -> tree::TyDecl {
    tree::TyDecl {
        mods: ACC_SYNTHETIC,
        annos: pkg.annos.clone(),
        name: Name::from("package-info"),
        ty_params: Vec::new(),
        extends: None,
        implements: Vec::new(),
        members: Vec::new(),
        kind: ClassKind::Interface,
        span: pkg.span,
    }
}

#[allow(clippy::too_many_arguments)]
fn bind_source_decl(
    ienv: &mut SimpleEnv<ClassSymbol, BoundClassView>,
    tli: &mut crate::lookup::TopLevelIndexBuilder,
    order: &mut Vec<ClassSymbol>,
    unit_syms: &mut Vec<ClassSymbol>,
    sym: ClassSymbol,
    decl: &tree::TyDecl,
    owner: Option<&ClassSymbol>,
    enclosing_kind: Option<ClassKind>,
    diags: &Diags,
) {
    let mut children: HashMap<Name, ClassSymbol> = HashMap::new();
    for member in &decl.members {
        if let tree::Member::Type(nested) = member {
            let child = sym.member(nested.name.as_str());
            if children.insert(nested.name.clone(), child).is_some() {
                diags.error(
                    Some(&sym),
                    DUPLICATE_DECLARATION,
                    format!("duplicate member class {}", nested.name),
                    Some(nested.span),
                );
            }
        }
    }

    let bound = SourceBoundClass {
        decl: decl.clone(),
        owner: owner.cloned(),
        kind: decl.kind,
        children,
        access: access_flags(enclosing_kind, decl),
    };
    if !ienv.insert(sym.clone(), BoundClassView::Source(Arc::new(bound))) {
        diags.error(
            Some(&sym),
            DUPLICATE_DECLARATION,
            format!("duplicate declaration of {sym}"),
            Some(decl.span),
        );
        return;
    }
    order.push(sym.clone());
    unit_syms.push(sym.clone());
    tli.insert(&sym);

    for member in &decl.members {
        if let tree::Member::Type(nested) = member {
            bind_source_decl(
                ienv,
                tli,
                order,
                unit_syms,
                sym.member(nested.name.as_str()),
                nested,
                Some(&sym),
                Some(decl.kind),
                diags,
            );
        }
    }
}

/// Modifier bits plus kind-implied bits; types declared in interfaces and
/// annotations are implicitly public (JLS 9.5).
fn access_flags(enclosing_kind: Option<ClassKind>, decl: &tree::TyDecl) -> u32 {
    let mut access = decl.mods;
    match decl.kind {
        ClassKind::Interface => access |= ACC_INTERFACE | ACC_ABSTRACT,
        ClassKind::Annotation => access |= ACC_ANNOTATION | ACC_INTERFACE | ACC_ABSTRACT,
        ClassKind::Enum => access |= ACC_ENUM,
        ClassKind::Class => {}
    }
    if enclosing_kind.is_some_and(ClassKind::is_interface_like) {
        access = flags::set_public(access);
    }
    access
}
