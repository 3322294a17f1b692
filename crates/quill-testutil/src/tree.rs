//! Builders for compilation-unit trees.
//!
//! The parser is an external collaborator, so tests assemble [`CompUnit`]
//! values directly. Spans are synthetic throughout.

use quill_core::{ClassKind, ConstValue, Name, PrimKind, Span};
use quill_tree::{
    Anno, AnnoArg, BinOp, ClassTy, ClassTySeg, CompUnit, EnumConstDecl, Expr, FieldDecl,
    ImportDecl, Lit, Member, MethDecl, ParamDecl, PkgDecl, TyDecl, TyParamDecl, Ty, UnOp,
    WildBoundKind,
};

fn sp() -> Span {
    Span::synthetic()
}

fn names(dotted: &str) -> Vec<Name> {
    dotted.split('.').map(Name::from).collect()
}

// === Units ==================================================================

pub struct UnitBuilder {
    pkg: Option<PkgDecl>,
    imports: Vec<ImportDecl>,
    decls: Vec<TyDecl>,
    source: Name,
}

pub fn unit(source: &str) -> UnitBuilder {
    UnitBuilder {
        pkg: None,
        imports: Vec::new(),
        decls: Vec::new(),
        source: Name::from(source),
    }
}

impl UnitBuilder {
    pub fn package(mut self, dotted: &str) -> Self {
        self.pkg = Some(PkgDecl {
            annos: Vec::new(),
            name: names(dotted),
            span: sp(),
        });
        self
    }

    pub fn package_annotated(mut self, dotted: &str, annos: Vec<Anno>) -> Self {
        self.pkg = Some(PkgDecl {
            annos,
            name: names(dotted),
            span: sp(),
        });
        self
    }

    pub fn import_single(mut self, dotted: &str) -> Self {
        self.imports.push(ImportDecl {
            path: names(dotted),
            is_static: false,
            wildcard: false,
            span: sp(),
        });
        self
    }

    pub fn import_on_demand(mut self, dotted: &str) -> Self {
        self.imports.push(ImportDecl {
            path: names(dotted),
            is_static: false,
            wildcard: true,
            span: sp(),
        });
        self
    }

    pub fn import_static_single(mut self, dotted: &str) -> Self {
        self.imports.push(ImportDecl {
            path: names(dotted),
            is_static: true,
            wildcard: false,
            span: sp(),
        });
        self
    }

    pub fn import_static_on_demand(mut self, dotted: &str) -> Self {
        self.imports.push(ImportDecl {
            path: names(dotted),
            is_static: true,
            wildcard: true,
            span: sp(),
        });
        self
    }

    pub fn decl(mut self, decl: TyDecl) -> Self {
        self.decls.push(decl);
        self
    }

    pub fn build(self) -> CompUnit {
        CompUnit {
            pkg: self.pkg,
            imports: self.imports,
            decls: self.decls,
            source: self.source,
        }
    }
}

// === Type declarations ======================================================

pub struct TyDeclBuilder {
    decl: TyDecl,
}

fn ty_decl(kind: ClassKind, name: &str) -> TyDeclBuilder {
    TyDeclBuilder {
        decl: TyDecl {
            mods: 0,
            annos: Vec::new(),
            name: Name::from(name),
            ty_params: Vec::new(),
            extends: None,
            implements: Vec::new(),
            members: Vec::new(),
            kind,
            span: sp(),
        },
    }
}

pub fn class_(name: &str) -> TyDeclBuilder {
    ty_decl(ClassKind::Class, name)
}

pub fn interface_(name: &str) -> TyDeclBuilder {
    ty_decl(ClassKind::Interface, name)
}

pub fn enum_(name: &str) -> TyDeclBuilder {
    ty_decl(ClassKind::Enum, name)
}

pub fn annotation_(name: &str) -> TyDeclBuilder {
    ty_decl(ClassKind::Annotation, name)
}

impl TyDeclBuilder {
    pub fn mods(mut self, mods: u32) -> Self {
        self.decl.mods |= mods;
        self
    }

    pub fn anno(mut self, anno: Anno) -> Self {
        self.decl.annos.push(anno);
        self
    }

    pub fn ty_param(mut self, name: &str, bounds: Vec<Ty>) -> Self {
        self.decl.ty_params.push(TyParamDecl {
            name: Name::from(name),
            bounds,
            annos: Vec::new(),
            span: sp(),
        });
        self
    }

    pub fn extends(mut self, ty: ClassTy) -> Self {
        self.decl.extends = Some(ty);
        self
    }

    /// Also carries an interface's `extends` list.
    pub fn implements(mut self, ty: ClassTy) -> Self {
        self.decl.implements.push(ty);
        self
    }

    pub fn field(mut self, field: FieldDecl) -> Self {
        self.decl.members.push(Member::Field(field));
        self
    }

    pub fn method(mut self, method: MethDecl) -> Self {
        self.decl.members.push(Member::Method(method));
        self
    }

    pub fn nested(mut self, decl: TyDecl) -> Self {
        self.decl.members.push(Member::Type(decl));
        self
    }

    pub fn enum_const(mut self, name: &str) -> Self {
        self.decl.members.push(Member::EnumConst(EnumConstDecl {
            annos: Vec::new(),
            name: Name::from(name),
            span: sp(),
        }));
        self
    }

    pub fn build(self) -> TyDecl {
        self.decl
    }
}

// === Members ================================================================

pub struct FieldBuilder {
    field: FieldDecl,
}

pub fn field(ty: Ty, name: &str) -> FieldBuilder {
    FieldBuilder {
        field: FieldDecl {
            mods: 0,
            annos: Vec::new(),
            ty,
            name: Name::from(name),
            init: None,
            span: sp(),
        },
    }
}

impl FieldBuilder {
    pub fn mods(mut self, mods: u32) -> Self {
        self.field.mods |= mods;
        self
    }

    pub fn anno(mut self, anno: Anno) -> Self {
        self.field.annos.push(anno);
        self
    }

    pub fn init(mut self, expr: Expr) -> Self {
        self.field.init = Some(expr);
        self
    }

    pub fn build(self) -> FieldDecl {
        self.field
    }
}

pub struct MethodBuilder {
    method: MethDecl,
}

pub fn method(ret: Ty, name: &str) -> MethodBuilder {
    MethodBuilder {
        method: MethDecl {
            mods: 0,
            annos: Vec::new(),
            ty_params: Vec::new(),
            ret,
            name: Name::from(name),
            params: Vec::new(),
            receiver: None,
            thrown: Vec::new(),
            default_value: None,
            span: sp(),
        },
    }
}

impl MethodBuilder {
    pub fn mods(mut self, mods: u32) -> Self {
        self.method.mods |= mods;
        self
    }

    pub fn anno(mut self, anno: Anno) -> Self {
        self.method.annos.push(anno);
        self
    }

    pub fn ty_param(mut self, name: &str, bounds: Vec<Ty>) -> Self {
        self.method.ty_params.push(TyParamDecl {
            name: Name::from(name),
            bounds,
            annos: Vec::new(),
            span: sp(),
        });
        self
    }

    pub fn param(mut self, ty: Ty, name: &str) -> Self {
        self.method.params.push(ParamDecl {
            mods: 0,
            annos: Vec::new(),
            ty,
            name: Name::from(name),
            span: sp(),
        });
        self
    }

    pub fn receiver(mut self, ty: Ty) -> Self {
        self.method.receiver = Some(ParamDecl {
            mods: 0,
            annos: Vec::new(),
            ty,
            name: Name::from("this"),
            span: sp(),
        });
        self
    }

    pub fn throws(mut self, ty: ClassTy) -> Self {
        self.method.thrown.push(ty);
        self
    }

    pub fn default_value(mut self, expr: Expr) -> Self {
        self.method.default_value = Some(expr);
        self
    }

    pub fn build(self) -> MethDecl {
        self.method
    }
}

// === Types ==================================================================

pub fn prim(kind: PrimKind) -> Ty {
    Ty::Prim {
        kind,
        annos: Vec::new(),
        span: sp(),
    }
}

pub fn prim_annotated(kind: PrimKind, annos: Vec<Anno>) -> Ty {
    Ty::Prim {
        kind,
        annos,
        span: sp(),
    }
}

pub fn void_() -> Ty {
    Ty::Void { span: sp() }
}

pub fn array(elem: Ty) -> Ty {
    Ty::Array {
        elem: Box::new(elem),
        annos: Vec::new(),
        span: sp(),
    }
}

pub fn wild() -> Ty {
    Ty::Wild {
        bound: None,
        annos: Vec::new(),
        span: sp(),
    }
}

pub fn wild_extends(bound: Ty) -> Ty {
    Ty::Wild {
        bound: Some((WildBoundKind::Extends, Box::new(bound))),
        annos: Vec::new(),
        span: sp(),
    }
}

/// `a.b.C.D` as a class type with no type arguments.
pub fn class_ty(dotted: &str) -> ClassTy {
    ClassTy {
        segments: dotted
            .split('.')
            .map(|name| ClassTySeg {
                name: Name::from(name),
                ty_args: Vec::new(),
                annos: Vec::new(),
            })
            .collect(),
        span: sp(),
    }
}

/// `a.b.C<args>`, with the type arguments attached to the last segment.
pub fn class_ty_args(dotted: &str, args: Vec<Ty>) -> ClassTy {
    let mut ty = class_ty(dotted);
    ty.segments.last_mut().unwrap().ty_args = args;
    ty
}

/// A class type from explicit `(name, args)` segments.
pub fn class_ty_segs(segments: Vec<(&str, Vec<Ty>)>) -> ClassTy {
    ClassTy {
        segments: segments
            .into_iter()
            .map(|(name, ty_args)| ClassTySeg {
                name: Name::from(name),
                ty_args,
                annos: Vec::new(),
            })
            .collect(),
        span: sp(),
    }
}

// === Expressions ============================================================

fn lit(value: ConstValue) -> Expr {
    Expr::Literal(Lit { value, span: sp() })
}

pub fn lit_int(value: i32) -> Expr {
    lit(ConstValue::Int(value))
}

pub fn lit_long(value: i64) -> Expr {
    lit(ConstValue::Long(value))
}

pub fn lit_bool(value: bool) -> Expr {
    lit(ConstValue::Boolean(value))
}

pub fn lit_char(value: char) -> Expr {
    lit(ConstValue::Char(value as u16))
}

pub fn lit_double(value: f64) -> Expr {
    lit(ConstValue::Double(value))
}

pub fn lit_str(value: &str) -> Expr {
    lit(ConstValue::String(value.to_string()))
}

pub fn name_expr(dotted: &str) -> Expr {
    Expr::Name {
        segments: names(dotted),
        span: sp(),
    }
}

pub fn bin(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        span: sp(),
    }
}

pub fn un(op: UnOp, operand: Expr) -> Expr {
    Expr::Unary {
        op,
        operand: Box::new(operand),
        span: sp(),
    }
}

pub fn cond(guard: Expr, then_branch: Expr, else_branch: Expr) -> Expr {
    Expr::Conditional {
        cond: Box::new(guard),
        then_branch: Box::new(then_branch),
        else_branch: Box::new(else_branch),
        span: sp(),
    }
}

pub fn cast(ty: Ty, operand: Expr) -> Expr {
    Expr::Cast {
        ty,
        operand: Box::new(operand),
        span: sp(),
    }
}

pub fn cast_prim(kind: PrimKind, operand: Expr) -> Expr {
    cast(prim(kind), operand)
}

pub fn array_init(elements: Vec<Expr>) -> Expr {
    Expr::ArrayInit {
        elements,
        span: sp(),
    }
}

pub fn class_lit(ty: Ty) -> Expr {
    Expr::ClassLit { ty, span: sp() }
}

// === Annotations ============================================================

pub fn anno(dotted: &str) -> Anno {
    Anno {
        name: names(dotted),
        args: Vec::new(),
        span: sp(),
    }
}

/// `@A(expr)`, the `value` shorthand.
pub fn anno_val(dotted: &str, value: Expr) -> Anno {
    Anno {
        name: names(dotted),
        args: vec![AnnoArg { name: None, value }],
        span: sp(),
    }
}

pub fn anno_named(dotted: &str, args: Vec<(&str, Expr)>) -> Anno {
    Anno {
        name: names(dotted),
        args: args
            .into_iter()
            .map(|(name, value)| AnnoArg {
                name: Some(Name::from(name)),
                value,
            })
            .collect(),
        span: sp(),
    }
}
