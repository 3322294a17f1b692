//! Splits annotations written at a type-or-declaration position into
//! declaration annotations and type annotations, driven by the annotation
//! type's `@Target` meta-annotation.
//!
//! Type annotations sink into the annotated type: for arrays onto the
//! element type, for class types onto the named (innermost) segment.

use std::sync::Arc;

use crate::bound::{ElementType, SourceTypeBoundClass, TypeBoundView};
use crate::diag::{Diags, UNKNOWN_ANNOTATION_TARGET};
use crate::env::Env;
use crate::sym::ClassSymbol;
use crate::ty::{AnnoInfo, Type};

pub(crate) fn bind_class(
    sym: &ClassSymbol,
    info: &Arc<SourceTypeBoundClass>,
    env: &dyn Env<ClassSymbol, TypeBoundView>,
    diags: &Diags,
) -> SourceTypeBoundClass {
    let mut out = (**info).clone();

    for field in &mut out.fields {
        let (decl, ty_use) = partition(
            sym,
            std::mem::take(&mut field.annotations),
            ElementType::Field,
            env,
            diags,
        );
        field.annotations = decl;
        if !ty_use.is_empty() {
            field.ty = add_type_annos(std::mem::replace(&mut field.ty, Type::Error), ty_use);
        }
    }

    for method in &mut out.methods {
        let (decl, ty_use) = partition(
            sym,
            std::mem::take(&mut method.annotations),
            ElementType::Method,
            env,
            diags,
        );
        method.annotations = decl;
        if !ty_use.is_empty() {
            method.ret = add_type_annos(std::mem::replace(&mut method.ret, Type::Error), ty_use);
        }
        for param in &mut method.params {
            let (decl, ty_use) = partition(
                sym,
                std::mem::take(&mut param.annotations),
                ElementType::Parameter,
                env,
                diags,
            );
            param.annotations = decl;
            if !ty_use.is_empty() {
                param.ty = add_type_annos(std::mem::replace(&mut param.ty, Type::Error), ty_use);
            }
        }
        if let Some(receiver) = &mut method.receiver {
            let (decl, ty_use) = partition(
                sym,
                std::mem::take(&mut receiver.annotations),
                ElementType::Parameter,
                env,
                diags,
            );
            receiver.annotations = decl;
            if !ty_use.is_empty() {
                receiver.ty =
                    add_type_annos(std::mem::replace(&mut receiver.ty, Type::Error), ty_use);
            }
        }
    }

    out
}

/// Partition into (declaration annotations, type annotations). Source order
/// is preserved within each bucket; an annotation targeting both positions
/// lands in both.
fn partition(
    sym: &ClassSymbol,
    annos: Vec<AnnoInfo>,
    position: ElementType,
    env: &dyn Env<ClassSymbol, TypeBoundView>,
    diags: &Diags,
) -> (Vec<AnnoInfo>, Vec<AnnoInfo>) {
    let mut decl = Vec::new();
    let mut ty_use = Vec::new();
    for anno in annos {
        let Some(anno_sym) = anno.sym.clone() else {
            diags.warning(
                Some(sym),
                UNKNOWN_ANNOTATION_TARGET,
                "cannot determine targets of unresolved annotation; treating as a declaration annotation",
                Some(anno.tree.span),
            );
            decl.push(anno);
            continue;
        };
        let metadata = env
            .get(&anno_sym)
            .ok()
            .flatten()
            .and_then(|view| view.annotation_metadata());
        let (to_decl, to_type) = match metadata {
            // No @Target: every declaration context, no type-use context.
            None => (true, false),
            Some(md) => {
                let to_decl = md.applies_to_declaration(position);
                let to_type = md.applies_to_type_use();
                // Neither target fits the position: declaration by default.
                if !to_decl && !to_type {
                    (true, false)
                } else {
                    (to_decl, to_type)
                }
            }
        };
        if to_decl {
            decl.push(anno.clone());
        }
        if to_type {
            ty_use.push(anno);
        }
    }
    (decl, ty_use)
}

fn add_type_annos(ty: Type, mut incoming: Vec<AnnoInfo>) -> Type {
    match ty {
        // An annotation written before an array type annotates the element
        // type, stepping through every array dimension.
        Type::Array { elem, annos } => Type::Array {
            elem: Box::new(add_type_annos(*elem, incoming)),
            annos,
        },
        Type::Class(mut c) => {
            if let Some(last) = c.segments.last_mut() {
                last.annos.append(&mut incoming);
            }
            Type::Class(c)
        }
        Type::Prim { kind, mut annos } => {
            annos.append(&mut incoming);
            Type::Prim { kind, annos }
        }
        Type::TyVar { sym, mut annos } => {
            annos.append(&mut incoming);
            Type::TyVar { sym, annos }
        }
        Type::Wild { bound, mut annos } => {
            annos.append(&mut incoming);
            Type::Wild { bound, annos }
        }
        // Nothing to attach to.
        other @ (Type::Void | Type::Error) => other,
    }
}
