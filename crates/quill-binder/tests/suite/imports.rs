//! Import resolution: priority, on-demand ambiguity, static imports.

use pretty_assertions::assert_eq;
use quill_core::flags::ACC_FINAL;
use quill_core::{ConstValue, PrimKind};
use quill_testutil::classbytes::{ClassBytes, FieldSpec};
use quill_testutil::tree::{class_, class_ty, field, name_expr, prim, unit};
use tempfile::TempDir;

use super::support::{
    assert_no_errors, bind_units, bind_with_boot, bind_with_classpath, boot_classes, class,
    error_codes_for, jar_with, sym,
};
use quill_binder::ty::Type;
use quill_binder::{AMBIGUOUS, DUPLICATE_IMPORT};

fn lib_with_value(value: i32) -> ClassBytes {
    ClassBytes::new("p/Foo").field(
        FieldSpec::new("VALUE", "I").constant(ConstValue::Int(value)),
    )
}

#[test]
fn source_shadows_classpath_for_the_same_name() {
    let dir = TempDir::new().unwrap();
    let jar = jar_with(&dir, "dep.jar", &[lib_with_value(5)]);

    // A source p.Foo with VALUE = 7 outranks the classpath p.Foo.
    let units = [
        unit("Foo.java")
            .package("p")
            .decl(
                class_("Foo")
                    .field(
                        field(prim(PrimKind::Int), "VALUE")
                            .mods(ACC_FINAL)
                            .init(quill_testutil::tree::lit_int(7))
                            .build(),
                    )
                    .build(),
            )
            .build(),
        unit("Test.java")
            .package("q")
            .import_single("p.Foo")
            .decl(
                class_("Test")
                    .field(
                        field(prim(PrimKind::Int), "X")
                            .mods(ACC_FINAL)
                            .init(name_expr("Foo.VALUE"))
                            .build(),
                    )
                    .build(),
            )
            .build(),
    ];
    let result = bind_with_classpath(&units, &[jar]);
    assert_no_errors(&result);

    let x = class(&result, "q/Test").field(&"X".into()).unwrap();
    assert_eq!(x.value, Some(ConstValue::Int(7)));
}

#[test]
fn classpath_order_does_not_change_a_source_first_result() {
    let dir = TempDir::new().unwrap();
    let jar_a = jar_with(&dir, "a.jar", &[lib_with_value(5)]);
    let jar_b = jar_with(&dir, "b.jar", &[lib_with_value(9)]);

    let units = [
        unit("Foo.java")
            .package("p")
            .decl(
                class_("Foo")
                    .field(
                        field(prim(PrimKind::Int), "VALUE")
                            .mods(ACC_FINAL)
                            .init(quill_testutil::tree::lit_int(7))
                            .build(),
                    )
                    .build(),
            )
            .build(),
        unit("Test.java")
            .package("q")
            .import_single("p.Foo")
            .decl(
                class_("Test")
                    .field(
                        field(prim(PrimKind::Int), "X")
                            .mods(ACC_FINAL)
                            .init(name_expr("Foo.VALUE"))
                            .build(),
                    )
                    .build(),
            )
            .build(),
    ];

    for jars in [
        vec![jar_a.clone(), jar_b.clone()],
        vec![jar_b.clone(), jar_a.clone()],
    ] {
        let result = bind_with_classpath(&units, &jars);
        let x = class(&result, "q/Test").field(&"X".into()).unwrap();
        assert_eq!(x.value, Some(ConstValue::Int(7)));
    }
}

#[test]
fn wildcard_clash_is_ambiguous() {
    let units = [
        unit("A.java").package("p1").decl(class_("Dup").build()).build(),
        unit("B.java").package("p2").decl(class_("Dup").build()).build(),
        unit("Use.java")
            .package("q")
            .import_on_demand("p1")
            .import_on_demand("p2")
            .decl(
                class_("Use")
                    .field(field(quill_tree::Ty::Class(class_ty("Dup")), "f").build())
                    .build(),
            )
            .build(),
    ];
    let result = bind_units(&units);
    assert_eq!(error_codes_for(&result, "q/Use"), vec![AMBIGUOUS]);
    let f = class(&result, "q/Use").field(&"f".into()).unwrap();
    assert_eq!(f.ty, Type::Error);
}

#[test]
fn single_import_shadows_wildcards() {
    let units = [
        unit("A.java").package("p1").decl(class_("Dup").build()).build(),
        unit("B.java").package("p2").decl(class_("Dup").build()).build(),
        unit("Use.java")
            .package("q")
            .import_single("p1.Dup")
            .import_on_demand("p2")
            .decl(
                class_("Use")
                    .field(field(quill_tree::Ty::Class(class_ty("Dup")), "f").build())
                    .build(),
            )
            .build(),
    ];
    let result = bind_units(&units);
    assert_no_errors(&result);
    let f = class(&result, "q/Use").field(&"f".into()).unwrap();
    let Type::Class(c) = &f.ty else {
        panic!("expected a class type, got {:?}", f.ty)
    };
    assert_eq!(c.sym(), &sym("p1/Dup"));
}

#[test]
fn duplicate_single_imports_are_diagnosed_at_construction() {
    let units = [
        unit("A.java").package("p1").decl(class_("Dup").build()).build(),
        unit("B.java").package("p2").decl(class_("Dup").build()).build(),
        unit("Use.java")
            .package("q")
            .import_single("p1.Dup")
            .import_single("p2.Dup")
            .decl(class_("Use").build())
            .build(),
    ];
    let result = bind_units(&units);
    let codes: Vec<_> = result.diagnostics().iter().map(|d| d.code()).collect();
    assert_eq!(codes, vec![DUPLICATE_IMPORT]);
}

#[test]
fn explicit_on_demand_import_shadows_java_lang() {
    let dir = TempDir::new().unwrap();
    let boot = jar_with(&dir, "boot.jar", &boot_classes());

    let units = [
        unit("String.java")
            .package("util")
            .decl(class_("String").build())
            .build(),
        unit("Use.java")
            .package("q")
            .import_on_demand("util")
            .decl(
                class_("Use")
                    .field(field(quill_tree::Ty::Class(class_ty("String")), "s").build())
                    .build(),
            )
            .build(),
    ];
    let result = bind_with_boot(&units, &[boot]);
    assert_no_errors(&result);

    let s = class(&result, "q/Use").field(&"s".into()).unwrap();
    let Type::Class(c) = &s.ty else { panic!() };
    assert_eq!(c.sym(), &sym("util/String"));
}

#[test]
fn static_single_import_of_a_field_is_silent_and_resolves_constants() {
    let dir = TempDir::new().unwrap();
    let jar = jar_with(
        &dir,
        "dep.jar",
        &[ClassBytes::new("p/Lib")
            .field(FieldSpec::new("CONST", "I").constant(ConstValue::Int(42)))],
    );

    let units = [unit("Use.java")
        .package("q")
        .import_static_single("p.Lib.CONST")
        .decl(
            class_("Use")
                .field(
                    field(prim(PrimKind::Int), "X")
                        .mods(ACC_FINAL)
                        .init(name_expr("CONST"))
                        .build(),
                )
                .build(),
        )
        .build()];
    let result = bind_with_classpath(&units, &[jar]);
    assert_no_errors(&result);

    let x = class(&result, "q/Use").field(&"X".into()).unwrap();
    assert_eq!(x.value, Some(ConstValue::Int(42)));
}

#[test]
fn static_on_demand_import_resolves_constants() {
    let dir = TempDir::new().unwrap();
    let jar = jar_with(
        &dir,
        "dep.jar",
        &[ClassBytes::new("p/Lib")
            .field(FieldSpec::new("CONST", "I").constant(ConstValue::Int(17)))],
    );

    let units = [unit("Use.java")
        .package("q")
        .import_static_on_demand("p.Lib")
        .decl(
            class_("Use")
                .field(
                    field(prim(PrimKind::Int), "X")
                        .mods(ACC_FINAL)
                        .init(name_expr("CONST"))
                        .build(),
                )
                .build(),
        )
        .build()];
    let result = bind_with_classpath(&units, &[jar]);
    assert_no_errors(&result);

    let x = class(&result, "q/Use").field(&"X".into()).unwrap();
    assert_eq!(x.value, Some(ConstValue::Int(17)));
}

#[test]
fn member_type_import_resolves_through_the_outer_class() {
    let units = [
        unit("Outer.java")
            .package("p")
            .decl(
                class_("Outer")
                    .nested(class_("In").mods(quill_core::flags::ACC_PUBLIC).build())
                    .build(),
            )
            .build(),
        unit("Use.java")
            .package("q")
            .import_single("p.Outer.In")
            .decl(
                class_("Use")
                    .field(field(quill_tree::Ty::Class(class_ty("In")), "f").build())
                    .build(),
            )
            .build(),
    ];
    let result = bind_units(&units);
    assert_no_errors(&result);
    let f = class(&result, "q/Use").field(&"f".into()).unwrap();
    let Type::Class(c) = &f.ty else { panic!() };
    assert_eq!(c.sym(), &sym("p/Outer$In"));
}
