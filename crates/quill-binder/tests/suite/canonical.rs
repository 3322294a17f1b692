//! Canonicalization: declaring-chain rewrites and type-argument placement.

use pretty_assertions::assert_eq;
use quill_core::PrimKind;
use quill_testutil::tree::{
    array, class_, class_ty, class_ty_args, class_ty_segs, field, prim, unit, wild,
};
use quill_tree::Ty;

use super::support::{assert_no_errors, bind_units, class, sym};
use quill_binder::ty::{Type, WildBound};

#[test]
fn inherited_member_rewrites_to_the_declaring_class() {
    // class A<T> { class I {} }  class C extends A<S> {}  use: C.I
    let units = [unit("T.java")
        .package("p")
        .decl(class_("S").build())
        .decl(
            class_("A")
                .ty_param("T", vec![])
                .nested(class_("I").build())
                .build(),
        )
        .decl(
            class_("C")
                .extends(class_ty_args("A", vec![Ty::Class(class_ty("S"))]))
                .build(),
        )
        .decl(
            class_("Use")
                .field(field(Ty::Class(class_ty("C.I")), "f").build())
                .build(),
        )
        .build()];
    let result = bind_units(&units);
    assert_no_errors(&result);

    let f = class(&result, "p/Use").field(&"f".into()).unwrap();
    let Type::Class(c) = &f.ty else { panic!("{:?}", f.ty) };
    assert_eq!(c.segments.len(), 2);
    assert_eq!(c.segments[0].sym, sym("p/A"));
    assert_eq!(c.segments[1].sym, sym("p/A$I"));
    // The qualifier carries A's instantiation from C's extends clause.
    assert_eq!(c.segments[0].targs.len(), 1);
    let Type::Class(targ) = &c.segments[0].targs[0] else { panic!() };
    assert_eq!(targ.sym(), &sym("p/S"));
}

#[test]
fn raw_qualifier_stays_raw() {
    // class C extends A (raw): C.I canonicalizes to a raw A.I.
    let units = [unit("T.java")
        .package("p")
        .decl(
            class_("A")
                .ty_param("T", vec![])
                .nested(class_("I").build())
                .build(),
        )
        .decl(class_("C").extends(class_ty("A")).build())
        .decl(
            class_("Use")
                .field(field(Ty::Class(class_ty("C.I")), "f").build())
                .build(),
        )
        .build()];
    let result = bind_units(&units);
    assert_no_errors(&result);

    let f = class(&result, "p/Use").field(&"f".into()).unwrap();
    let Type::Class(c) = &f.ty else { panic!() };
    assert_eq!(c.segments[0].sym, sym("p/A"));
    assert!(c.segments[0].targs.is_empty());
    assert_eq!(c.segments[1].sym, sym("p/A$I"));
}

#[test]
fn type_arguments_stay_on_the_declaring_segment() {
    // A<?, S[]>.I keeps both arguments on the outer segment; the inner
    // segment is empty.
    let units = [unit("T.java")
        .package("p")
        .decl(class_("S").build())
        .decl(
            class_("A")
                .ty_param("T", vec![])
                .ty_param("U", vec![])
                .nested(class_("I").build())
                .build(),
        )
        .decl(
            class_("Use")
                .field(
                    field(
                        Ty::Class(class_ty_segs(vec![
                            (
                                "A",
                                vec![wild(), array(Ty::Class(class_ty("S")))],
                            ),
                            ("I", vec![]),
                        ])),
                        "f",
                    )
                    .build(),
                )
                .build(),
        )
        .build()];
    let result = bind_units(&units);
    assert_no_errors(&result);

    let f = class(&result, "p/Use").field(&"f".into()).unwrap();
    let Type::Class(c) = &f.ty else { panic!() };
    assert_eq!(c.segments.len(), 2);
    assert_eq!(c.segments[0].sym, sym("p/A"));
    assert_eq!(c.segments[1].sym, sym("p/A$I"));
    assert!(c.segments[1].targs.is_empty());

    assert_eq!(c.segments[0].targs.len(), 2);
    let Type::Wild { bound, .. } = &c.segments[0].targs[0] else { panic!() };
    assert_eq!(*bound, WildBound::None);
    let Type::Array { elem, .. } = &c.segments[0].targs[1] else { panic!() };
    let Type::Class(elem) = elem.as_ref() else { panic!() };
    assert_eq!(elem.sym(), &sym("p/S"));
}

#[test]
fn simple_member_use_gains_its_enclosing_chain() {
    // Inside Outer, `In` names Outer.In; the canonical type spells out the
    // enclosing segment.
    let units = [unit("T.java")
        .package("p")
        .decl(
            class_("Outer")
                .nested(class_("In").build())
                .field(field(Ty::Class(class_ty("In")), "f").build())
                .build(),
        )
        .build()];
    let result = bind_units(&units);
    assert_no_errors(&result);

    let f = class(&result, "p/Outer").field(&"f".into()).unwrap();
    let Type::Class(c) = &f.ty else { panic!() };
    assert_eq!(c.segments.len(), 2);
    assert_eq!(c.segments[0].sym, sym("p/Outer"));
    assert!(c.segments[0].targs.is_empty());
    assert_eq!(c.segments[1].sym, sym("p/Outer$In"));
}

#[test]
fn two_level_substitution_composes() {
    // class A<T> { class I {} }  class B<U> extends A<U> {}
    // class C extends B<S> {}  use: C.I canonicalizes to A<S>.I.
    let units = [unit("T.java")
        .package("p")
        .decl(class_("S").build())
        .decl(
            class_("A")
                .ty_param("T", vec![])
                .nested(class_("I").build())
                .build(),
        )
        .decl(
            class_("B")
                .ty_param("U", vec![])
                .extends(class_ty_args("A", vec![Ty::Class(class_ty("U"))]))
                .build(),
        )
        .decl(
            class_("C")
                .extends(class_ty_args("B", vec![Ty::Class(class_ty("S"))]))
                .build(),
        )
        .decl(
            class_("Use")
                .field(field(Ty::Class(class_ty("C.I")), "f").build())
                .build(),
        )
        .build()];
    let result = bind_units(&units);
    assert_no_errors(&result);

    let f = class(&result, "p/Use").field(&"f".into()).unwrap();
    let Type::Class(c) = &f.ty else { panic!() };
    assert_eq!(c.segments[0].sym, sym("p/A"));
    assert_eq!(c.segments[1].sym, sym("p/A$I"));
    let Type::Class(targ) = &c.segments[0].targs[0] else {
        panic!("{:?}", c.segments[0].targs)
    };
    assert_eq!(targ.sym(), &sym("p/S"));
}

#[test]
fn primitive_and_error_types_pass_through() {
    let units = [unit("T.java")
        .package("p")
        .decl(
            class_("T")
                .field(field(prim(PrimKind::Double), "d").build())
                .build(),
        )
        .build()];
    let result = bind_units(&units);
    assert_no_errors(&result);
    let d = class(&result, "p/T").field(&"d".into()).unwrap();
    assert_eq!(
        d.ty,
        Type::Prim {
            kind: PrimKind::Double,
            annos: vec![]
        }
    );
}
