//! Constant evaluation: lazy fixed-point evaluation of constant field
//! initializers, and the pass that substitutes evaluated values into fields
//! and annotation arguments.
//!
//! Evaluation is a pure recursive descent over the initializer syntax.
//! Integral operands narrower than `int` are widened before arithmetic and
//! narrowed only on store (JLS 5.6). The cycle signal from the lazy field
//! environment is caught exactly here: a field whose initializer reaches
//! itself keeps its initializer but loses its compile-time value.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use quill_core::flags::{ACC_ENUM, ACC_FINAL};
use quill_core::{ConstValue, Name, PrimKind, Span};
use quill_tree as tree;

use crate::bound::{
    AnnotationMetadata, ElementType, FieldHandle, FieldInfo, RetentionPolicy,
    SourceTypeBoundClass, TypeBoundView,
};
use crate::diag::{Diags, INVALID_CONSTANT};
use crate::env::{Completer, CycleError, Env};
use crate::lookup::{LookupKey, NameLookup, Scope};
use crate::sym::{ClassSymbol, FieldSymbol};
use crate::ty::{AnnoInfo, ClassTy, Const, Type};

/// A field is a constant iff it is final, has a textual initializer, and its
/// declared type is primitive or `String`.
pub(crate) fn is_const(field: &FieldInfo) -> bool {
    field.access & ACC_FINAL != 0
        && field.decl.as_ref().is_some_and(|d| d.init.is_some())
        && field.ty.is_constable()
}

/// Builds the lazy completer map for every source constant field.
pub(crate) fn completers<'e>(
    classes: &'e [(ClassSymbol, Arc<SourceTypeBoundClass>)],
    env: &'e dyn Env<ClassSymbol, TypeBoundView>,
    diags: &'e Diags,
) -> HashMap<FieldSymbol, Completer<'e, FieldSymbol, ConstValue>> {
    let mut out: HashMap<FieldSymbol, Completer<'e, FieldSymbol, ConstValue>> = HashMap::new();
    for (sym, info) in classes {
        for field in info.fields.iter().filter(|f| is_const(f)) {
            let field_sym = field.sym.clone();
            let init = field
                .decl
                .as_ref()
                .and_then(|d| d.init.clone())
                .expect("constant fields have initializers");
            let ty = field.ty.clone();
            out.insert(
                field_sym,
                Box::new(move |values, _| {
                    let evaluator = ConstEvaluator {
                        sym,
                        info,
                        values,
                        env,
                        diags,
                    };
                    match evaluator.eval_field_initializer(&init, &ty) {
                        Ok(value) => Ok(Some(value)),
                        // Initializers may reference the field being
                        // initialized (or another non-constant); the field
                        // then simply is not a constant.
                        Err(ConstError::Cycle(_) | ConstError::NotConstant) => Ok(None),
                    }
                }),
            );
        }
    }
    out
}

/// Rewrites one class with evaluated constants: field values, annotation
/// element values everywhere, annotation-method defaults, and `@Target` /
/// `@Retention` metadata for annotation interfaces.
pub(crate) fn bind_class(
    sym: &ClassSymbol,
    info: &Arc<SourceTypeBoundClass>,
    values: &dyn Env<FieldSymbol, ConstValue>,
    env: &dyn Env<ClassSymbol, TypeBoundView>,
    diags: &Diags,
) -> SourceTypeBoundClass {
    let evaluator = ConstEvaluator {
        sym,
        info,
        values,
        env,
        diags,
    };
    let mut out = (**info).clone();

    for field in &mut out.fields {
        if is_const(field) {
            field.value = values.get(&field.sym).ok().flatten();
        }
        field.annotations = evaluator.eval_annos(std::mem::take(&mut field.annotations));
    }
    for method in &mut out.methods {
        method.annotations = evaluator.eval_annos(std::mem::take(&mut method.annotations));
        for param in &mut method.params {
            param.annotations = evaluator.eval_annos(std::mem::take(&mut param.annotations));
        }
        if let Some(receiver) = &mut method.receiver {
            receiver.annotations = evaluator.eval_annos(std::mem::take(&mut receiver.annotations));
        }
        for tp in &mut method.ty_params {
            tp.annotations = evaluator.eval_annos(std::mem::take(&mut tp.annotations));
        }
        if let Some(default) = &method.default_expr {
            method.default_value = evaluator.recover(evaluator.eval(default), default.span());
        }
    }
    for tp in &mut out.ty_params {
        tp.annotations = evaluator.eval_annos(std::mem::take(&mut tp.annotations));
    }
    out.annotations = evaluator.eval_annos(std::mem::take(&mut out.annotations));

    if out.kind == quill_core::ClassKind::Annotation {
        out.metadata = Some(metadata_from(&out.annotations));
    }
    out
}

fn metadata_from(annotations: &[AnnoInfo]) -> AnnotationMetadata {
    let target = ClassSymbol::target();
    let retention_sym = ClassSymbol::retention();

    let targets = annotations
        .iter()
        .find(|a| a.sym.as_ref() == Some(&target))
        .map(|anno| {
            let mut set = BTreeSet::new();
            if let Some(value) = anno.value("value") {
                collect_element_types(value, &mut set);
            }
            set
        });
    let retention = annotations
        .iter()
        .find(|a| a.sym.as_ref() == Some(&retention_sym))
        .and_then(|anno| anno.value("value"))
        .and_then(|value| match value {
            Const::EnumConst(field) => RetentionPolicy::from_name(field.name.as_str()),
            _ => None,
        });
    AnnotationMetadata { targets, retention }
}

fn collect_element_types(value: &Const, out: &mut BTreeSet<ElementType>) {
    match value {
        Const::Array(values) => {
            for v in values {
                collect_element_types(v, out);
            }
        }
        Const::EnumConst(field) => {
            if let Some(et) = ElementType::from_name(field.name.as_str()) {
                out.insert(et);
            }
        }
        _ => {}
    }
}

pub(crate) enum ConstError {
    Cycle(CycleError<FieldSymbol>),
    NotConstant,
}

impl From<CycleError<FieldSymbol>> for ConstError {
    fn from(err: CycleError<FieldSymbol>) -> Self {
        ConstError::Cycle(err)
    }
}

pub(crate) struct ConstEvaluator<'e> {
    sym: &'e ClassSymbol,
    info: &'e Arc<SourceTypeBoundClass>,
    values: &'e dyn Env<FieldSymbol, ConstValue>,
    env: &'e dyn Env<ClassSymbol, TypeBoundView>,
    diags: &'e Diags,
}

impl ConstEvaluator<'_> {
    /// Evaluates a constant field initializer and applies the assignment
    /// conversion to the declared type. Out-of-range narrowing still
    /// produces the truncated value (JLS 5.1.3), with a diagnostic.
    pub(crate) fn eval_field_initializer(
        &self,
        init: &tree::Expr,
        declared: &Type,
    ) -> Result<ConstValue, ConstError> {
        let value = self.eval_value(init)?;
        match declared {
            Type::Prim { kind, .. } => {
                if value.prim_kind() == Some(*kind) {
                    return Ok(value);
                }
                let Some(narrowed) = value.cast_to(*kind) else {
                    return Err(ConstError::NotConstant);
                };
                if kind.is_integral()
                    && value.prim_kind().is_some_and(PrimKind::is_integral)
                    && narrowed.long_value() != value.long_value()
                {
                    self.diags.warning(
                        Some(self.sym),
                        INVALID_CONSTANT,
                        format!("constant narrowed out of range for {kind}"),
                        Some(init.span()),
                    );
                }
                Ok(narrowed)
            }
            ty if ty.is_constable() => {
                // The only non-primitive constable type is String.
                if value.is_string() {
                    Ok(value)
                } else {
                    Err(ConstError::NotConstant)
                }
            }
            _ => Err(ConstError::NotConstant),
        }
    }

    fn eval_value(&self, expr: &tree::Expr) -> Result<ConstValue, ConstError> {
        match self.eval(expr)? {
            Const::Value(value) => Ok(value),
            _ => Err(ConstError::NotConstant),
        }
    }

    pub(crate) fn eval(&self, expr: &tree::Expr) -> Result<Const, ConstError> {
        match expr {
            tree::Expr::Literal(lit) => Ok(Const::Value(lit.value.clone())),
            tree::Expr::Name { segments, .. } => self.eval_name(segments),
            tree::Expr::Unary { op, operand, .. } => {
                Ok(Const::Value(self.eval_unary(*op, operand)?))
            }
            tree::Expr::Binary { op, lhs, rhs, .. } => {
                Ok(Const::Value(self.eval_binary(*op, lhs, rhs)?))
            }
            tree::Expr::Conditional {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                let guard = self.eval_bool(cond)?;
                // Exactly one branch is evaluated.
                if guard {
                    self.eval(then_branch)
                } else {
                    self.eval(else_branch)
                }
            }
            tree::Expr::Cast { ty, operand, .. } => {
                Ok(Const::Value(self.eval_cast(ty, operand)?))
            }
            tree::Expr::ArrayInit { elements, .. } => Ok(Const::Array(
                elements
                    .iter()
                    .map(|e| self.eval(e))
                    .collect::<Result<_, _>>()?,
            )),
            tree::Expr::ClassLit { ty, .. } => Ok(Const::ClassLit(self.bind_literal_ty(ty))),
            tree::Expr::Anno(anno) => {
                let sym = self.resolve_type(&anno.name);
                let info = AnnoInfo::new(sym, anno.clone());
                Ok(Const::Anno(Box::new(self.eval_anno(info))))
            }
        }
    }

    // === Names ==============================================================

    fn eval_name(&self, segments: &[Name]) -> Result<Const, ConstError> {
        let handle = self
            .resolve_field(segments)?
            .ok_or(ConstError::NotConstant)?;
        if handle.access & ACC_ENUM != 0 {
            return Ok(Const::EnumConst(handle.sym));
        }
        let value = if handle.from_source {
            self.values
                .get(&handle.sym)
                .map_err(ConstError::Cycle)?
                .ok_or(ConstError::NotConstant)?
        } else {
            handle.value.ok_or(ConstError::NotConstant)?
        };
        Ok(Const::Value(value))
    }

    fn resolve_field(&self, segments: &[Name]) -> Result<Option<FieldHandle>, ConstError> {
        match segments {
            [] => Ok(None),
            [name] => self.find_field_in_scope(name),
            [prefix @ .., name] => match self.resolve_type(prefix) {
                Some(owner) => Ok(self.find_field(&owner, name)),
                None => Ok(None),
            },
        }
    }

    /// A simple name: fields of the class and its lexical enclosers
    /// (inherited ones included), then static single imports, then static
    /// on-demand imports.
    fn find_field_in_scope(&self, name: &Name) -> Result<Option<FieldHandle>, ConstError> {
        let mut current = Some(self.sym.clone());
        while let Some(class) = current {
            if let Some(handle) = self.find_field(&class, name) {
                return Ok(Some(handle));
            }
            current = self.view(&class).and_then(|v| v.owner());
        }
        if let Some(owner) = self.info.member_imports.singleton_owner(name) {
            if let Some(handle) = self.find_field(owner, name) {
                return Ok(Some(handle));
            }
        }
        for owner in self.info.member_imports.on_demand_owners() {
            if let Some(handle) = self.find_field(owner, name) {
                return Ok(Some(handle));
            }
        }
        Ok(None)
    }

    /// A field of `class` or anything it inherits from.
    fn find_field(&self, class: &ClassSymbol, name: &Name) -> Option<FieldHandle> {
        let mut seen = HashSet::new();
        self.find_field_walk(class, name, &mut seen)
    }

    fn find_field_walk(
        &self,
        class: &ClassSymbol,
        name: &Name,
        seen: &mut HashSet<ClassSymbol>,
    ) -> Option<FieldHandle> {
        if !seen.insert(class.clone()) {
            return None;
        }
        let view = self.view(class)?;
        if let Some(handle) = view.field(name) {
            return Some(handle);
        }
        for iface in view.interfaces() {
            if let Some(handle) = self.find_field_walk(&iface, name, seen) {
                return Some(handle);
            }
        }
        let superclass = view.superclass()?;
        self.find_field_walk(&superclass, name, seen)
    }

    /// Resolves a qualified name prefix as a type: member classes of the
    /// enclosing chain first, then the unit scope.
    fn resolve_type(&self, segments: &[Name]) -> Option<ClassSymbol> {
        let first = segments.first()?;

        let mut enclosing = Some(self.sym.clone());
        while let Some(class) = enclosing {
            if let Some(found) = self.resolve_member(&class, first) {
                return self.fold_members(found, &segments[1..]);
            }
            enclosing = self.view(&class).and_then(|v| v.owner());
        }

        let key = LookupKey::new(segments.to_vec());
        match self.info.scope.lookup(&key) {
            NameLookup::Found(result) => self.fold_members(result.sym, &result.remaining),
            _ => None,
        }
    }

    fn fold_members(&self, mut sym: ClassSymbol, rest: &[Name]) -> Option<ClassSymbol> {
        for seg in rest {
            sym = self.resolve_member(&sym, seg)?;
        }
        Some(sym)
    }

    /// A declared or inherited member class, through the type-bound view.
    fn resolve_member(&self, class: &ClassSymbol, name: &Name) -> Option<ClassSymbol> {
        let mut seen = HashSet::new();
        self.resolve_member_walk(class, name, &mut seen)
    }

    fn resolve_member_walk(
        &self,
        class: &ClassSymbol,
        name: &Name,
        seen: &mut HashSet<ClassSymbol>,
    ) -> Option<ClassSymbol> {
        if !seen.insert(class.clone()) {
            return None;
        }
        let view = self.view(class)?;
        if let Some(child) = view.child(name) {
            return Some(child);
        }
        if let Some(superclass) = view.superclass() {
            if let Some(found) = self.resolve_member_walk(&superclass, name, seen) {
                return Some(found);
            }
        }
        for iface in view.interfaces() {
            if let Some(found) = self.resolve_member_walk(&iface, name, seen) {
                return Some(found);
            }
        }
        None
    }

    fn view(&self, sym: &ClassSymbol) -> Option<TypeBoundView> {
        // The type environment is eager by now; no cycles possible.
        self.env.get(sym).ok().flatten()
    }

    // === Operators ==========================================================

    fn eval_bool(&self, expr: &tree::Expr) -> Result<bool, ConstError> {
        match self.eval_value(expr)? {
            ConstValue::Boolean(b) => Ok(b),
            _ => Err(ConstError::NotConstant),
        }
    }

    fn eval_unary(&self, op: tree::UnOp, operand: &tree::Expr) -> Result<ConstValue, ConstError> {
        let value = self.eval_value(operand)?;
        match op {
            tree::UnOp::Not => match value {
                ConstValue::Boolean(b) => Ok(ConstValue::Boolean(!b)),
                _ => Err(ConstError::NotConstant),
            },
            tree::UnOp::Plus => promote(&value).ok_or(ConstError::NotConstant),
            tree::UnOp::Neg => match promote(&value).ok_or(ConstError::NotConstant)? {
                ConstValue::Int(v) => Ok(ConstValue::Int(v.wrapping_neg())),
                ConstValue::Long(v) => Ok(ConstValue::Long(v.wrapping_neg())),
                ConstValue::Float(v) => Ok(ConstValue::Float(-v)),
                ConstValue::Double(v) => Ok(ConstValue::Double(-v)),
                _ => Err(ConstError::NotConstant),
            },
            tree::UnOp::BitNot => match promote(&value).ok_or(ConstError::NotConstant)? {
                ConstValue::Int(v) => Ok(ConstValue::Int(!v)),
                ConstValue::Long(v) => Ok(ConstValue::Long(!v)),
                _ => Err(ConstError::NotConstant),
            },
        }
    }

    fn eval_binary(
        &self,
        op: tree::BinOp,
        lhs: &tree::Expr,
        rhs: &tree::Expr,
    ) -> Result<ConstValue, ConstError> {
        use tree::BinOp::*;
        match op {
            AndAnd => {
                if !self.eval_bool(lhs)? {
                    return Ok(ConstValue::Boolean(false));
                }
                Ok(ConstValue::Boolean(self.eval_bool(rhs)?))
            }
            OrOr => {
                if self.eval_bool(lhs)? {
                    return Ok(ConstValue::Boolean(true));
                }
                Ok(ConstValue::Boolean(self.eval_bool(rhs)?))
            }
            _ => {
                let a = self.eval_value(lhs)?;
                let b = self.eval_value(rhs)?;
                self.eval_binary_values(op, a, b, lhs.span())
            }
        }
    }

    fn eval_binary_values(
        &self,
        op: tree::BinOp,
        a: ConstValue,
        b: ConstValue,
        span: Span,
    ) -> Result<ConstValue, ConstError> {
        use tree::BinOp::*;

        if op == Add && (a.is_string() || b.is_string()) {
            return Ok(ConstValue::String(format!(
                "{}{}",
                a.display(),
                b.display()
            )));
        }

        match op {
            Eq | Ne => {
                let equal = match (&a, &b) {
                    (ConstValue::String(x), ConstValue::String(y)) => x == y,
                    (ConstValue::Boolean(x), ConstValue::Boolean(y)) => x == y,
                    _ => match promote_pair(&a, &b).ok_or(ConstError::NotConstant)? {
                        Promoted::Int(x, y) => x == y,
                        Promoted::Long(x, y) => x == y,
                        Promoted::Float(x, y) => x == y,
                        Promoted::Double(x, y) => x == y,
                    },
                };
                Ok(ConstValue::Boolean(if op == Eq { equal } else { !equal }))
            }
            Lt | Le | Gt | Ge => {
                let ordering = match promote_pair(&a, &b).ok_or(ConstError::NotConstant)? {
                    Promoted::Int(x, y) => x.partial_cmp(&y),
                    Promoted::Long(x, y) => x.partial_cmp(&y),
                    Promoted::Float(x, y) => x.partial_cmp(&y),
                    Promoted::Double(x, y) => x.partial_cmp(&y),
                };
                let Some(ordering) = ordering else {
                    // NaN comparisons are false.
                    return Ok(ConstValue::Boolean(false));
                };
                Ok(ConstValue::Boolean(match op {
                    Lt => ordering.is_lt(),
                    Le => ordering.is_le(),
                    Gt => ordering.is_gt(),
                    Ge => ordering.is_ge(),
                    _ => unreachable!(),
                }))
            }
            BitAnd | BitXor | BitOr => match (&a, &b) {
                (ConstValue::Boolean(x), ConstValue::Boolean(y)) => {
                    Ok(ConstValue::Boolean(match op {
                        BitAnd => *x && *y,
                        BitXor => *x != *y,
                        BitOr => *x || *y,
                        _ => unreachable!(),
                    }))
                }
                _ => match promote_pair(&a, &b).ok_or(ConstError::NotConstant)? {
                    Promoted::Int(x, y) => Ok(ConstValue::Int(match op {
                        BitAnd => x & y,
                        BitXor => x ^ y,
                        BitOr => x | y,
                        _ => unreachable!(),
                    })),
                    Promoted::Long(x, y) => Ok(ConstValue::Long(match op {
                        BitAnd => x & y,
                        BitXor => x ^ y,
                        BitOr => x | y,
                        _ => unreachable!(),
                    })),
                    _ => Err(ConstError::NotConstant),
                },
            },
            Shl | Shr | UShr => {
                let shift = promote(&b)
                    .and_then(|v| v.long_value())
                    .ok_or(ConstError::NotConstant)?;
                match promote(&a).ok_or(ConstError::NotConstant)? {
                    ConstValue::Int(x) => {
                        let s = (shift & 0x1f) as u32;
                        Ok(ConstValue::Int(match op {
                            Shl => x.wrapping_shl(s),
                            Shr => x.wrapping_shr(s),
                            UShr => ((x as u32) >> s) as i32,
                            _ => unreachable!(),
                        }))
                    }
                    ConstValue::Long(x) => {
                        let s = (shift & 0x3f) as u32;
                        Ok(ConstValue::Long(match op {
                            Shl => x.wrapping_shl(s),
                            Shr => x.wrapping_shr(s),
                            UShr => ((x as u64) >> s) as i64,
                            _ => unreachable!(),
                        }))
                    }
                    _ => Err(ConstError::NotConstant),
                }
            }
            Mul | Div | Rem | Add | Sub => {
                match promote_pair(&a, &b).ok_or(ConstError::NotConstant)? {
                    Promoted::Int(x, y) => {
                        if matches!(op, Div | Rem) && y == 0 {
                            self.diags.error(
                                Some(self.sym),
                                INVALID_CONSTANT,
                                "division by zero in constant expression",
                                Some(span),
                            );
                            return Err(ConstError::NotConstant);
                        }
                        Ok(ConstValue::Int(match op {
                            Mul => x.wrapping_mul(y),
                            Div => x.wrapping_div(y),
                            Rem => x.wrapping_rem(y),
                            Add => x.wrapping_add(y),
                            Sub => x.wrapping_sub(y),
                            _ => unreachable!(),
                        }))
                    }
                    Promoted::Long(x, y) => {
                        if matches!(op, Div | Rem) && y == 0 {
                            self.diags.error(
                                Some(self.sym),
                                INVALID_CONSTANT,
                                "division by zero in constant expression",
                                Some(span),
                            );
                            return Err(ConstError::NotConstant);
                        }
                        Ok(ConstValue::Long(match op {
                            Mul => x.wrapping_mul(y),
                            Div => x.wrapping_div(y),
                            Rem => x.wrapping_rem(y),
                            Add => x.wrapping_add(y),
                            Sub => x.wrapping_sub(y),
                            _ => unreachable!(),
                        }))
                    }
                    Promoted::Float(x, y) => Ok(ConstValue::Float(match op {
                        Mul => x * y,
                        Div => x / y,
                        Rem => x % y,
                        Add => x + y,
                        Sub => x - y,
                        _ => unreachable!(),
                    })),
                    Promoted::Double(x, y) => Ok(ConstValue::Double(match op {
                        Mul => x * y,
                        Div => x / y,
                        Rem => x % y,
                        Add => x + y,
                        Sub => x - y,
                        _ => unreachable!(),
                    })),
                }
            }
            AndAnd | OrOr => unreachable!("short-circuit ops handled above"),
        }
    }

    fn eval_cast(&self, ty: &tree::Ty, operand: &tree::Expr) -> Result<ConstValue, ConstError> {
        let value = self.eval_value(operand)?;
        match ty {
            tree::Ty::Prim { kind, .. } => value.cast_to(*kind).ok_or(ConstError::NotConstant),
            tree::Ty::Class(cty) => {
                let names: Vec<Name> = cty.segments.iter().map(|s| s.name.clone()).collect();
                let is_string = self
                    .resolve_type(&names)
                    .map(|sym| sym == ClassSymbol::string())
                    // An unqualified `String` with no classpath still reads
                    // as the string type.
                    .unwrap_or_else(|| names.last().is_some_and(|n| n.as_str() == "String"));
                if is_string && value.is_string() {
                    Ok(value)
                } else {
                    Err(ConstError::NotConstant)
                }
            }
            _ => Err(ConstError::NotConstant),
        }
    }

    // === Annotation values ==================================================

    pub(crate) fn eval_annos(&self, annos: Vec<AnnoInfo>) -> Vec<AnnoInfo> {
        annos.into_iter().map(|anno| self.eval_anno(anno)).collect()
    }

    fn eval_anno(&self, mut anno: AnnoInfo) -> AnnoInfo {
        let mut values = Vec::new();
        for arg in &anno.tree.args {
            let name = arg.name.clone().unwrap_or_else(|| Name::from("value"));
            let span = arg.value.span();
            if let Some(value) = self.recover(self.eval(&arg.value), span) {
                values.push((name, value));
            }
        }
        anno.values = values;
        anno
    }

    /// Applies the local recovery policy: cycles and non-constants inside
    /// annotation arguments are reported and the value omitted.
    fn recover<T>(&self, result: Result<T, ConstError>, span: Span) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(ConstError::Cycle(cycle)) => {
                self.diags.warning(
                    Some(self.sym),
                    INVALID_CONSTANT,
                    format!("annotation argument is not a constant ({cycle})"),
                    Some(span),
                );
                None
            }
            Err(ConstError::NotConstant) => {
                self.diags.warning(
                    Some(self.sym),
                    INVALID_CONSTANT,
                    "annotation argument is not a compile-time constant",
                    Some(span),
                );
                None
            }
        }
    }

    /// The type of a class literal in an annotation argument.
    fn bind_literal_ty(&self, ty: &tree::Ty) -> Type {
        match ty {
            tree::Ty::Prim { kind, .. } => Type::Prim {
                kind: *kind,
                annos: Vec::new(),
            },
            tree::Ty::Void { .. } => Type::Void,
            tree::Ty::Array { elem, .. } => Type::Array {
                elem: Box::new(self.bind_literal_ty(elem)),
                annos: Vec::new(),
            },
            tree::Ty::Class(cty) => {
                let names: Vec<Name> = cty.segments.iter().map(|s| s.name.clone()).collect();
                match self.resolve_type(&names) {
                    Some(sym) => Type::Class(ClassTy::plain(sym)),
                    None => Type::Error,
                }
            }
            tree::Ty::Wild { .. } => Type::Error,
        }
    }
}

enum Promoted {
    Int(i32, i32),
    Long(i64, i64),
    Float(f32, f32),
    Double(f64, f64),
}

/// Unary numeric promotion: byte, short, and char widen to int.
fn promote(value: &ConstValue) -> Option<ConstValue> {
    Some(match value {
        ConstValue::Byte(_) | ConstValue::Short(_) | ConstValue::Char(_) => {
            ConstValue::Int(value.int_value()?)
        }
        ConstValue::Int(v) => ConstValue::Int(*v),
        ConstValue::Long(v) => ConstValue::Long(*v),
        ConstValue::Float(v) => ConstValue::Float(*v),
        ConstValue::Double(v) => ConstValue::Double(*v),
        ConstValue::Boolean(_) | ConstValue::String(_) => return None,
    })
}

/// Binary numeric promotion: the result kind is the wider operand's kind.
fn promote_pair(a: &ConstValue, b: &ConstValue) -> Option<Promoted> {
    let (ak, bk) = (a.prim_kind()?, b.prim_kind()?);
    if !ak.is_numeric() || !bk.is_numeric() {
        return None;
    }
    Some(if ak == PrimKind::Double || bk == PrimKind::Double {
        Promoted::Double(a.double_value()?, b.double_value()?)
    } else if ak == PrimKind::Float || bk == PrimKind::Float {
        Promoted::Float(a.double_value()? as f32, b.double_value()? as f32)
    } else if ak == PrimKind::Long || bk == PrimKind::Long {
        Promoted::Long(a.long_value()?, b.long_value()?)
    } else {
        Promoted::Int(a.int_value()?, b.int_value()?)
    })
}
