//! The hierarchy pass: implicit supertypes, forward references, and cycle
//! reporting.

use pretty_assertions::assert_eq;
use quill_core::flags::{ACC_ENUM, ACC_FINAL, ACC_PUBLIC, ACC_STATIC};
use quill_testutil::tree::{annotation_, class_, class_ty, enum_, interface_, unit};

use super::support::{assert_no_errors, bind_units, class, error_codes_for, sym};
use quill_binder::{CYCLIC_HIERARCHY, CYCLIC_SUPERTYPE_DEPENDENCY};

#[test]
fn implicit_supertypes_by_kind() {
    let units = [unit("Kinds.java")
        .package("p")
        .decl(class_("C").build())
        .decl(interface_("I").build())
        .decl(enum_("E").enum_const("A").build())
        .decl(annotation_("A").build())
        .build()];
    let result = bind_units(&units);
    assert_no_errors(&result);

    assert_eq!(class(&result, "p/C").superclass, Some(sym("java/lang/Object")));
    assert_eq!(class(&result, "p/I").superclass, Some(sym("java/lang/Object")));
    assert_eq!(class(&result, "p/E").superclass, Some(sym("java/lang/Enum")));
    assert_eq!(class(&result, "p/A").superclass, Some(sym("java/lang/Object")));
    assert_eq!(
        class(&result, "p/A").interfaces,
        vec![sym("java/lang/annotation/Annotation")]
    );

    // Enum constants are public static final enum fields of the enum type.
    let constant = &class(&result, "p/E").fields[0];
    assert_eq!(
        constant.access & (ACC_PUBLIC | ACC_STATIC | ACC_FINAL | ACC_ENUM),
        ACC_PUBLIC | ACC_STATIC | ACC_FINAL | ACC_ENUM
    );
}

#[test]
fn forward_and_backward_references_bind() {
    // B is declared after A but A extends B.
    let units = [unit("AB.java")
        .package("p")
        .decl(class_("A").extends(class_ty("B")).build())
        .decl(class_("B").build())
        .build()];
    let result = bind_units(&units);
    assert_no_errors(&result);
    assert_eq!(class(&result, "p/A").superclass, Some(sym("p/B")));
}

#[test]
fn interface_extends_list_lands_in_interfaces() {
    let units = [unit("I.java")
        .package("p")
        .decl(interface_("J").build())
        .decl(interface_("K").build())
        .decl(
            interface_("I")
                .implements(class_ty("J"))
                .implements(class_ty("K"))
                .build(),
        )
        .build()];
    let result = bind_units(&units);
    assert_no_errors(&result);
    assert_eq!(
        class(&result, "p/I").interfaces,
        vec![sym("p/J"), sym("p/K")]
    );
    assert_eq!(class(&result, "p/I").superclass, Some(sym("java/lang/Object")));
}

#[test]
fn member_of_supertype_resolves_in_extends_clause() {
    // D extends B.C where C is a member of B.
    let units = [unit("M.java")
        .package("p")
        .decl(class_("B").nested(class_("C").build()).build())
        .decl(class_("D").extends(class_ty("B.C")).build())
        .build()];
    let result = bind_units(&units);
    assert_no_errors(&result);
    assert_eq!(class(&result, "p/D").superclass, Some(sym("p/B$C")));
}

#[test]
fn inherited_member_resolves_in_extends_clause() {
    // Base declares I; Sub inherits it; X extends Sub.I resolves to Base$I.
    let units = [unit("M.java")
        .package("p")
        .decl(class_("Base").nested(class_("I").build()).build())
        .decl(class_("Sub").extends(class_ty("Base")).build())
        .decl(class_("X").extends(class_ty("Sub.I")).build())
        .build()];
    let result = bind_units(&units);
    assert_no_errors(&result);
    assert_eq!(class(&result, "p/X").superclass, Some(sym("p/Base$I")));
}

#[test]
fn exactly_the_cycle_members_are_reported() {
    let units = [unit("Cycle.java")
        .package("p")
        .decl(class_("A").extends(class_ty("B")).build())
        .decl(class_("B").extends(class_ty("A")).build())
        .decl(class_("C").extends(class_ty("A")).build())
        .decl(class_("D").build())
        .build()];
    let result = bind_units(&units);

    assert_eq!(error_codes_for(&result, "p/A"), vec![CYCLIC_HIERARCHY]);
    assert_eq!(error_codes_for(&result, "p/B"), vec![CYCLIC_HIERARCHY]);
    assert_eq!(
        error_codes_for(&result, "p/C"),
        vec![CYCLIC_SUPERTYPE_DEPENDENCY]
    );
    assert_eq!(error_codes_for(&result, "p/D"), Vec::<&str>::new());

    // Only the unaffected class binds.
    assert!(result.get(&sym("p/A")).is_none());
    assert!(result.get(&sym("p/B")).is_none());
    assert!(result.get(&sym("p/C")).is_none());
    assert!(result.get(&sym("p/D")).is_some());
}

#[test]
fn self_extends_is_a_single_class_cycle() {
    let units = [unit("S.java")
        .package("p")
        .decl(class_("S").extends(class_ty("S")).build())
        .decl(class_("Ok").build())
        .build()];
    let result = bind_units(&units);
    assert_eq!(error_codes_for(&result, "p/S"), vec![CYCLIC_HIERARCHY]);
    assert!(result.get(&sym("p/Ok")).is_some());
}

#[test]
fn unresolved_extends_falls_back_to_object() {
    let units = [unit("U.java")
        .package("p")
        .decl(class_("U").extends(class_ty("Missing")).build())
        .build()];
    let result = bind_units(&units);

    // Both the hierarchy pass and the type pass resolve the clause; each
    // failure is reported where it happened.
    let codes = error_codes_for(&result, "p/U");
    assert!(!codes.is_empty());
    assert!(codes.iter().all(|c| *c == quill_binder::NOT_FOUND));
    assert_eq!(class(&result, "p/U").superclass, Some(sym("java/lang/Object")));
}
