//! Source binding: nesting, package-info synthesis, and implicit flags.

use pretty_assertions::assert_eq;
use quill_core::flags::{
    ACC_ABSTRACT, ACC_INTERFACE, ACC_PRIVATE, ACC_PUBLIC, ACC_SYNTHETIC,
};
use quill_core::{ClassKind, Name};
use quill_testutil::tree::{anno, class_, interface_, unit};

use super::support::{assert_no_errors, bind_units, class, sym};

#[test]
fn nested_classes_get_dollar_names_and_owners() {
    let units = [unit("Test.java")
        .decl(
            class_("Test")
                .nested(class_("Inner").nested(class_("InnerMost").build()).build())
                .build(),
        )
        .build()];
    let result = bind_units(&units);
    assert_no_errors(&result);

    assert_eq!(
        result.symbols(),
        &[sym("Test"), sym("Test$Inner"), sym("Test$Inner$InnerMost")]
    );
    assert_eq!(class(&result, "Test").owner, None);
    assert_eq!(class(&result, "Test$Inner").owner, Some(sym("Test")));
    assert_eq!(
        class(&result, "Test$Inner$InnerMost").owner,
        Some(sym("Test$Inner"))
    );
    assert_eq!(
        class(&result, "Test")
            .children
            .get(&Name::from("Inner")),
        Some(&sym("Test$Inner"))
    );

    // The InnerClasses attribute chain lists the enclosing member before
    // the class itself.
    assert_eq!(
        result.inner_classes(&sym("Test$Inner$InnerMost")),
        vec![sym("Test$Inner"), sym("Test$Inner$InnerMost")]
    );
}

#[test]
fn annotated_package_synthesizes_package_info() {
    let units = [
        unit("package-info.java")
            .package_annotated("p", vec![anno("PkgAnno")])
            .build(),
        unit("PkgAnno.java")
            .package("p")
            .decl(quill_testutil::tree::annotation_("PkgAnno").build())
            .build(),
    ];
    let result = bind_units(&units);
    assert_no_errors(&result);

    let info = class(&result, "p/package-info");
    assert_eq!(info.kind, ClassKind::Interface);
    assert_ne!(info.access & ACC_SYNTHETIC, 0);
    assert_eq!(info.annotations.len(), 1);
    assert_eq!(info.annotations[0].sym, Some(sym("p/PkgAnno")));
}

#[test]
fn unannotated_package_synthesizes_nothing() {
    let units = [unit("A.java")
        .package("p")
        .decl(class_("A").build())
        .build()];
    let result = bind_units(&units);
    assert_eq!(result.symbols(), &[sym("p/A")]);
}

#[test]
fn types_in_interfaces_are_implicitly_public() {
    let units = [unit("I.java")
        .decl(
            interface_("I")
                .nested(class_("Nested").mods(ACC_PRIVATE).build())
                .build(),
        )
        .build()];
    let result = bind_units(&units);
    assert_no_errors(&result);

    let nested = class(&result, "I$Nested");
    assert_ne!(nested.access & ACC_PUBLIC, 0);
    assert_eq!(nested.access & ACC_PRIVATE, 0);

    let iface = class(&result, "I");
    assert_ne!(iface.access & ACC_INTERFACE, 0);
    assert_ne!(iface.access & ACC_ABSTRACT, 0);
}

#[test]
fn duplicate_top_level_declaration_is_diagnosed() {
    let units = [
        unit("A.java").decl(class_("Dup").build()).build(),
        unit("B.java").decl(class_("Dup").build()).build(),
    ];
    let result = bind_units(&units);
    assert_eq!(
        super::support::error_codes_for(&result, "Dup"),
        vec![quill_binder::DUPLICATE_DECLARATION]
    );
}
