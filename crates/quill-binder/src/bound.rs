//! Bound-class records, one per pipeline stage, plus the view enums that
//! let a pass see source and classpath classes uniformly.
//!
//! Each stage record wraps the previous one; entities are immutable once
//! published and shared by `Arc`.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use quill_core::{ClassKind, ConstValue, Name};
use quill_tree as tree;

use crate::classpath::BytecodeBoundClass;
use crate::imports::MemberImportIndex;
use crate::lookup::CompoundScope;
use crate::sym::{ClassSymbol, FieldSymbol, MethodSymbol, TyVarSymbol};
use crate::ty::{AnnoInfo, Const, Type};

/// Stage 1: declaration, nesting, kind, and access flags.
#[derive(Debug, Clone)]
pub struct SourceBoundClass {
    pub decl: tree::TyDecl,
    pub owner: Option<ClassSymbol>,
    pub kind: ClassKind,
    /// Declared member classes by simple name.
    pub children: HashMap<Name, ClassSymbol>,
    pub access: u32,
}

/// Stage 2: the unit's composite scope and member-import index attached.
#[derive(Debug, Clone)]
pub struct PackageSourceBoundClass {
    pub base: Arc<SourceBoundClass>,
    pub scope: CompoundScope,
    pub member_imports: Arc<MemberImportIndex>,
    pub source: Name,
}

/// Stage 3: resolved supertype symbols and type-parameter symbols.
#[derive(Debug, Clone)]
pub struct SourceHeaderBoundClass {
    pub base: Arc<PackageSourceBoundClass>,
    /// Resolved superclass. `None` only for `java/lang/Object` itself.
    pub superclass: Option<ClassSymbol>,
    pub interfaces: Vec<ClassSymbol>,
    /// Declaration order; names are unique per owner.
    pub ty_params: Vec<(Name, TyVarSymbol)>,
}

impl SourceHeaderBoundClass {
    pub fn kind(&self) -> ClassKind {
        self.base.base.kind
    }

    pub fn owner(&self) -> Option<&ClassSymbol> {
        self.base.base.owner.as_ref()
    }

    pub fn access(&self) -> u32 {
        self.base.base.access
    }

    pub fn child(&self, name: &Name) -> Option<&ClassSymbol> {
        self.base.base.children.get(name)
    }

    pub fn decl(&self) -> &tree::TyDecl {
        &self.base.base.decl
    }

    pub fn ty_param(&self, name: &Name) -> Option<&TyVarSymbol> {
        self.ty_params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, sym)| sym)
    }
}

/// Stages 4 and 5: fully bound signatures; constant binding, annotation
/// disambiguation, and canonicalization rewrite this record in place.
#[derive(Debug, Clone)]
pub struct SourceTypeBoundClass {
    pub owner: Option<ClassSymbol>,
    pub kind: ClassKind,
    pub children: HashMap<Name, ClassSymbol>,
    pub access: u32,
    pub ty_params: Vec<TyVarInfo>,
    pub superclass: Option<ClassSymbol>,
    pub superclass_ty: Option<Type>,
    pub interfaces: Vec<ClassSymbol>,
    pub interface_tys: Vec<Type>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub annotations: Vec<AnnoInfo>,
    /// `@Target`/`@Retention` metadata, computed for ANNOTATION kinds during
    /// constant binding.
    pub metadata: Option<AnnotationMetadata>,
    /// Retained for constant evaluation; not part of structural identity.
    pub scope: CompoundScope,
    pub member_imports: Arc<MemberImportIndex>,
    pub source: Name,
}

impl SourceTypeBoundClass {
    pub fn ty_param_syms(&self) -> Vec<TyVarSymbol> {
        self.ty_params.iter().map(|tp| tp.sym.clone()).collect()
    }

    pub fn field(&self, name: &Name) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| &f.sym.name == name)
    }
}

impl PartialEq for SourceTypeBoundClass {
    fn eq(&self, other: &Self) -> bool {
        // The scope is binding machinery, not bound structure.
        self.owner == other.owner
            && self.kind == other.kind
            && self.children == other.children
            && self.access == other.access
            && self.ty_params == other.ty_params
            && self.superclass == other.superclass
            && self.superclass_ty == other.superclass_ty
            && self.interfaces == other.interfaces
            && self.interface_tys == other.interface_tys
            && self.fields == other.fields
            && self.methods == other.methods
            && self.annotations == other.annotations
            && self.metadata == other.metadata
            && self.source == other.source
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TyVarInfo {
    pub sym: TyVarSymbol,
    pub name: Name,
    pub bounds: Vec<Type>,
    pub annotations: Vec<AnnoInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub sym: FieldSymbol,
    pub ty: Type,
    pub access: u32,
    pub decl: Option<tree::FieldDecl>,
    pub annotations: Vec<AnnoInfo>,
    /// The evaluated compile-time constant, when the field is one.
    pub value: Option<ConstValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    pub name: Name,
    pub ty: Type,
    pub access: u32,
    pub annotations: Vec<AnnoInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    pub sym: MethodSymbol,
    pub ty_params: Vec<TyVarInfo>,
    pub access: u32,
    pub ret: Type,
    pub params: Vec<ParamInfo>,
    pub receiver: Option<ParamInfo>,
    pub thrown: Vec<Type>,
    pub annotations: Vec<AnnoInfo>,
    pub default_expr: Option<tree::Expr>,
    pub default_value: Option<Const>,
}

// === Annotation metadata ====================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ElementType {
    Type,
    Field,
    Method,
    Parameter,
    Constructor,
    LocalVariable,
    AnnotationType,
    Package,
    TypeParameter,
    TypeUse,
    Module,
    RecordComponent,
}

impl ElementType {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "TYPE" => ElementType::Type,
            "FIELD" => ElementType::Field,
            "METHOD" => ElementType::Method,
            "PARAMETER" => ElementType::Parameter,
            "CONSTRUCTOR" => ElementType::Constructor,
            "LOCAL_VARIABLE" => ElementType::LocalVariable,
            "ANNOTATION_TYPE" => ElementType::AnnotationType,
            "PACKAGE" => ElementType::Package,
            "TYPE_PARAMETER" => ElementType::TypeParameter,
            "TYPE_USE" => ElementType::TypeUse,
            "MODULE" => ElementType::Module,
            "RECORD_COMPONENT" => ElementType::RecordComponent,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionPolicy {
    Source,
    Class,
    Runtime,
}

impl RetentionPolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "SOURCE" => RetentionPolicy::Source,
            "CLASS" => RetentionPolicy::Class,
            "RUNTIME" => RetentionPolicy::Runtime,
            _ => return None,
        })
    }
}

/// Meta-annotation facts about an annotation interface. `targets: None`
/// means no explicit `@Target`, i.e. every declaration context and no
/// type-use context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationMetadata {
    pub targets: Option<BTreeSet<ElementType>>,
    pub retention: Option<RetentionPolicy>,
}

impl AnnotationMetadata {
    pub fn applies_to_declaration(&self, position: ElementType) -> bool {
        match &self.targets {
            None => true,
            Some(set) => set.contains(&position),
        }
    }

    pub fn applies_to_type_use(&self) -> bool {
        match &self.targets {
            None => false,
            Some(set) => set.contains(&ElementType::TypeUse),
        }
    }
}

// === Stage views ============================================================

/// Stage-1 view: nesting, kind, and access, for canonical import resolution.
#[derive(Clone, Debug)]
pub enum BoundClassView {
    Source(Arc<SourceBoundClass>),
    Bytecode(Arc<BytecodeBoundClass>),
}

impl BoundClassView {
    pub fn kind(&self) -> ClassKind {
        match self {
            BoundClassView::Source(s) => s.kind,
            BoundClassView::Bytecode(b) => b.kind(),
        }
    }

    pub fn access(&self) -> u32 {
        match self {
            BoundClassView::Source(s) => s.access,
            BoundClassView::Bytecode(b) => b.access(),
        }
    }

    pub fn owner(&self) -> Option<ClassSymbol> {
        match self {
            BoundClassView::Source(s) => s.owner.clone(),
            BoundClassView::Bytecode(b) => b.owner(),
        }
    }

    pub fn child(&self, name: &Name) -> Option<ClassSymbol> {
        match self {
            BoundClassView::Source(s) => s.children.get(name).cloned(),
            BoundClassView::Bytecode(b) => b.child(name),
        }
    }

    pub fn children(&self) -> Vec<(Name, ClassSymbol)> {
        match self {
            BoundClassView::Source(s) => s
                .children
                .iter()
                .map(|(n, c)| (n.clone(), c.clone()))
                .collect(),
            BoundClassView::Bytecode(b) => b.children(),
        }
    }
}

impl From<Arc<BytecodeBoundClass>> for BoundClassView {
    fn from(value: Arc<BytecodeBoundClass>) -> Self {
        BoundClassView::Bytecode(value)
    }
}

/// Stage-3 view: adds resolved supertypes and type-parameter symbols.
#[derive(Clone, Debug)]
pub enum HeaderBoundView {
    Source(Arc<SourceHeaderBoundClass>),
    Bytecode(Arc<BytecodeBoundClass>),
}

impl HeaderBoundView {
    pub fn kind(&self) -> ClassKind {
        match self {
            HeaderBoundView::Source(s) => s.kind(),
            HeaderBoundView::Bytecode(b) => b.kind(),
        }
    }

    pub fn access(&self) -> u32 {
        match self {
            HeaderBoundView::Source(s) => s.access(),
            HeaderBoundView::Bytecode(b) => b.access(),
        }
    }

    pub fn owner(&self) -> Option<ClassSymbol> {
        match self {
            HeaderBoundView::Source(s) => s.owner().cloned(),
            HeaderBoundView::Bytecode(b) => b.owner(),
        }
    }

    pub fn child(&self, name: &Name) -> Option<ClassSymbol> {
        match self {
            HeaderBoundView::Source(s) => s.child(name).cloned(),
            HeaderBoundView::Bytecode(b) => b.child(name),
        }
    }

    pub fn superclass(&self) -> Option<ClassSymbol> {
        match self {
            HeaderBoundView::Source(s) => s.superclass.clone(),
            HeaderBoundView::Bytecode(b) => b.superclass(),
        }
    }

    pub fn interfaces(&self) -> Vec<ClassSymbol> {
        match self {
            HeaderBoundView::Source(s) => s.interfaces.clone(),
            HeaderBoundView::Bytecode(b) => b.interfaces(),
        }
    }

    pub fn ty_param(&self, name: &Name) -> Option<TyVarSymbol> {
        match self {
            HeaderBoundView::Source(s) => s.ty_param(name).cloned(),
            HeaderBoundView::Bytecode(b) => b.ty_param(name),
        }
    }

    pub fn ty_params(&self) -> Vec<(Name, TyVarSymbol)> {
        match self {
            HeaderBoundView::Source(s) => s.ty_params.clone(),
            HeaderBoundView::Bytecode(b) => b.ty_params(),
        }
    }

    pub fn as_source(&self) -> Option<&Arc<SourceHeaderBoundClass>> {
        match self {
            HeaderBoundView::Source(s) => Some(s),
            HeaderBoundView::Bytecode(_) => None,
        }
    }
}

impl From<Arc<BytecodeBoundClass>> for HeaderBoundView {
    fn from(value: Arc<BytecodeBoundClass>) -> Self {
        HeaderBoundView::Bytecode(value)
    }
}

/// A field seen through a [`TypeBoundView`]. For bytecode fields `value` is
/// the decoded `ConstantValue`; for source fields constants live in the lazy
/// constant environment instead.
#[derive(Clone, Debug)]
pub struct FieldHandle {
    pub sym: FieldSymbol,
    pub access: u32,
    pub value: Option<ConstValue>,
    pub from_source: bool,
}

/// Stage-4 view: adds bound member signatures and constants.
#[derive(Clone, Debug)]
pub enum TypeBoundView {
    Source(Arc<SourceTypeBoundClass>),
    Bytecode(Arc<BytecodeBoundClass>),
}

impl TypeBoundView {
    pub fn kind(&self) -> ClassKind {
        match self {
            TypeBoundView::Source(s) => s.kind,
            TypeBoundView::Bytecode(b) => b.kind(),
        }
    }

    pub fn owner(&self) -> Option<ClassSymbol> {
        match self {
            TypeBoundView::Source(s) => s.owner.clone(),
            TypeBoundView::Bytecode(b) => b.owner(),
        }
    }

    pub fn child(&self, name: &Name) -> Option<ClassSymbol> {
        match self {
            TypeBoundView::Source(s) => s.children.get(name).cloned(),
            TypeBoundView::Bytecode(b) => b.child(name),
        }
    }

    pub fn superclass(&self) -> Option<ClassSymbol> {
        match self {
            TypeBoundView::Source(s) => s.superclass.clone(),
            TypeBoundView::Bytecode(b) => b.superclass(),
        }
    }

    pub fn interfaces(&self) -> Vec<ClassSymbol> {
        match self {
            TypeBoundView::Source(s) => s.interfaces.clone(),
            TypeBoundView::Bytecode(b) => b.interfaces(),
        }
    }

    /// The superclass with the type arguments of its instantiation, for
    /// canonical substitution. An empty argument list means raw (or a
    /// non-generic superclass).
    pub fn super_instantiation(&self) -> Option<(ClassSymbol, Vec<Type>)> {
        match self {
            TypeBoundView::Source(s) => match &s.superclass_ty {
                Some(Type::Class(c)) => {
                    let seg = c.segments.last()?;
                    Some((seg.sym.clone(), seg.targs.clone()))
                }
                _ => s.superclass.clone().map(|sym| (sym, Vec::new())),
            },
            TypeBoundView::Bytecode(b) => b.super_instantiation(),
        }
    }

    pub fn ty_param_syms(&self) -> Vec<TyVarSymbol> {
        match self {
            TypeBoundView::Source(s) => s.ty_param_syms(),
            TypeBoundView::Bytecode(b) => {
                b.ty_params().into_iter().map(|(_, sym)| sym).collect()
            }
        }
    }

    pub fn field(&self, name: &Name) -> Option<FieldHandle> {
        match self {
            TypeBoundView::Source(s) => s.field(name).map(|f| FieldHandle {
                sym: f.sym.clone(),
                access: f.access,
                value: f.value.clone(),
                from_source: true,
            }),
            TypeBoundView::Bytecode(b) => b.field(name),
        }
    }

    pub fn annotation_metadata(&self) -> Option<AnnotationMetadata> {
        match self {
            TypeBoundView::Source(s) => s.metadata.clone(),
            TypeBoundView::Bytecode(b) => b.annotation_metadata(),
        }
    }

    pub fn as_source(&self) -> Option<&Arc<SourceTypeBoundClass>> {
        match self {
            TypeBoundView::Source(s) => Some(s),
            TypeBoundView::Bytecode(_) => None,
        }
    }
}

impl From<Arc<BytecodeBoundClass>> for TypeBoundView {
    fn from(value: Arc<BytecodeBoundClass>) -> Self {
        TypeBoundView::Bytecode(value)
    }
}
