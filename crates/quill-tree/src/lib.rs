//! The syntax-tree contract between the parser and the binder.
//!
//! These are plain data types: a front-end that parses source text produces
//! [`CompUnit`] values, and the binder consumes them. Only the syntax the
//! binder needs for class-file headers is represented: type declarations,
//! member signatures, annotations, and the constant-expression subset that
//! can appear in field initializers and annotation arguments. Statements and
//! method bodies never reach the binder.

use quill_core::{ClassKind, ConstValue, Name, PrimKind, Span};

/// One parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct CompUnit {
    pub pkg: Option<PkgDecl>,
    pub imports: Vec<ImportDecl>,
    pub decls: Vec<TyDecl>,
    /// Source file identity, e.g. a path. Carried through to bound classes.
    pub source: Name,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PkgDecl {
    pub annos: Vec<Anno>,
    pub name: Vec<Name>,
    pub span: Span,
}

/// `import a.b.C;`, `import a.b.*;`, `import static a.b.C.D;`,
/// `import static a.b.C.*;`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub path: Vec<Name>,
    pub is_static: bool,
    pub wildcard: bool,
    pub span: Span,
}

/// A class, interface, enum, or annotation declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct TyDecl {
    /// Modifier keywords folded to `ACC_*` bits.
    pub mods: u32,
    pub annos: Vec<Anno>,
    pub name: Name,
    pub ty_params: Vec<TyParamDecl>,
    /// Only for `kind == Class`; an interface's `extends` list is carried in
    /// `implements`.
    pub extends: Option<ClassTy>,
    pub implements: Vec<ClassTy>,
    pub members: Vec<Member>,
    pub kind: ClassKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Type(TyDecl),
    Field(FieldDecl),
    Method(MethDecl),
    EnumConst(EnumConstDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TyParamDecl {
    pub name: Name,
    pub bounds: Vec<Ty>,
    pub annos: Vec<Anno>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub mods: u32,
    pub annos: Vec<Anno>,
    pub ty: Ty,
    pub name: Name,
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethDecl {
    pub mods: u32,
    pub annos: Vec<Anno>,
    pub ty_params: Vec<TyParamDecl>,
    pub ret: Ty,
    pub name: Name,
    pub params: Vec<ParamDecl>,
    /// An explicit receiver parameter (`Outer.this`), when declared.
    pub receiver: Option<ParamDecl>,
    pub thrown: Vec<ClassTy>,
    /// Default value of an annotation-interface method.
    pub default_value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub mods: u32,
    pub annos: Vec<Anno>,
    pub ty: Ty,
    pub name: Name,
    pub span: Span,
}

/// An enum constant. The binder gives it the enum's own type and
/// `public static final` + enum flags.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumConstDecl {
    pub annos: Vec<Anno>,
    pub name: Name,
    pub span: Span,
}

// === Type syntax =============================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
    Prim {
        kind: PrimKind,
        annos: Vec<Anno>,
        span: Span,
    },
    Void {
        span: Span,
    },
    Class(ClassTy),
    Array {
        elem: Box<Ty>,
        annos: Vec<Anno>,
        span: Span,
    },
    /// A wildcard type argument; only valid inside a type-argument list.
    Wild {
        bound: Option<(WildBoundKind, Box<Ty>)>,
        annos: Vec<Anno>,
        span: Span,
    },
}

impl Ty {
    pub fn span(&self) -> Span {
        match self {
            Ty::Prim { span, .. } | Ty::Void { span } | Ty::Array { span, .. } | Ty::Wild { span, .. } => *span,
            Ty::Class(c) => c.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WildBoundKind {
    Extends,
    Super,
}

/// A possibly-qualified, possibly-parameterized class reference, kept as the
/// written segment list: `a.b.Outer<T>.Inner` is four segments of which the
/// binder decides how many name packages, classes, and members.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassTy {
    pub segments: Vec<ClassTySeg>,
    pub span: Span,
}

/// One dotted segment. An empty `ty_args` list means none were written
/// (there is no syntax for an explicit empty list in this position).
#[derive(Debug, Clone, PartialEq)]
pub struct ClassTySeg {
    pub name: Name,
    pub ty_args: Vec<Ty>,
    pub annos: Vec<Anno>,
}

// === Constant-expression syntax =============================================

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Lit),
    /// A possibly-qualified name: a constant variable, a field of a type, or
    /// a type prefix followed by a field.
    Name {
        segments: Vec<Name>,
        span: Span,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },
    Conditional {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
        span: Span,
    },
    Cast {
        ty: Ty,
        operand: Box<Expr>,
        span: Span,
    },
    /// An array initializer; only constant inside annotation arguments.
    ArrayInit {
        elements: Vec<Expr>,
        span: Span,
    },
    ClassLit {
        ty: Ty,
        span: Span,
    },
    /// A nested annotation as an annotation value.
    Anno(Anno),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(lit) => lit.span,
            Expr::Name { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Conditional { span, .. }
            | Expr::Cast { span, .. }
            | Expr::ArrayInit { span, .. }
            | Expr::ClassLit { span, .. } => *span,
            Expr::Anno(anno) => anno.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lit {
    pub value: ConstValue,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Plus,
    Neg,
    BitNot,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Shl,
    Shr,
    UShr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    AndAnd,
    OrOr,
}

// === Annotations ============================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Anno {
    /// The written name, possibly qualified.
    pub name: Vec<Name>,
    pub args: Vec<AnnoArg>,
    pub span: Span,
}

/// One annotation argument; `name` is absent for the `@A(expr)` shorthand,
/// which means `value`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnoArg {
    pub name: Option<Name>,
    pub value: Expr,
}
