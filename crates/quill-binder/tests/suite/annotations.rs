//! Annotation binding: evaluated element values, `@Target` metadata,
//! deprecation, and the declaration/type-annotation split.

use pretty_assertions::assert_eq;
use quill_core::flags::ACC_DEPRECATED;
use quill_core::{ConstValue, PrimKind};
use quill_testutil::tree::{
    anno, anno_named, anno_val, annotation_, array_init, class_, field, lit_int, lit_str, method,
    name_expr, prim, unit, void_,
};
use tempfile::TempDir;

use super::support::{
    assert_no_errors, bind_with_boot, boot_classes, class, jar_with, sym,
};
use quill_binder::bound::{AnnotationMetadata, ElementType, RetentionPolicy};
use quill_binder::ty::{Const, Type};

fn boot_jar(dir: &TempDir) -> std::path::PathBuf {
    jar_with(dir, "boot.jar", &boot_classes())
}

#[test]
fn deprecated_sets_the_access_bit() {
    let dir = TempDir::new().unwrap();
    let boot = boot_jar(&dir);

    let units = [unit("Test.java")
        .decl(class_("Test").anno(anno("Deprecated")).build())
        .build()];
    let result = bind_with_boot(&units, &[boot]);
    assert_no_errors(&result);
    assert_ne!(class(&result, "Test").access & ACC_DEPRECATED, 0);
}

#[test]
fn deprecated_applies_to_fields_and_methods_too() {
    let dir = TempDir::new().unwrap();
    let boot = boot_jar(&dir);

    let units = [unit("Test.java")
        .decl(
            class_("Test")
                .field(
                    field(prim(PrimKind::Int), "f")
                        .anno(anno("Deprecated"))
                        .build(),
                )
                .method(method(void_(), "m").anno(anno("Deprecated")).build())
                .build(),
        )
        .build()];
    let result = bind_with_boot(&units, &[boot]);
    assert_no_errors(&result);

    let test = class(&result, "Test");
    assert_ne!(test.fields[0].access & ACC_DEPRECATED, 0);
    assert_ne!(test.methods[0].access & ACC_DEPRECATED, 0);
}

#[test]
fn annotation_arguments_fold_to_constants() {
    let dir = TempDir::new().unwrap();
    let boot = boot_jar(&dir);

    let units = [
        unit("Marker.java")
            .package("p")
            .decl(annotation_("Marker").build())
            .build(),
        unit("Use.java")
            .package("p")
            .decl(
                class_("Use")
                    .anno(anno_named(
                        "Marker",
                        vec![
                            ("count", lit_int(2)),
                            ("names", array_init(vec![lit_str("a"), lit_str("b")])),
                        ],
                    ))
                    .build(),
            )
            .build(),
    ];
    let result = bind_with_boot(&units, &[boot]);
    assert_no_errors(&result);

    let use_class = class(&result, "p/Use");
    let marker = &use_class.annotations[0];
    assert_eq!(marker.sym, Some(sym("p/Marker")));
    assert_eq!(marker.value("count"), Some(&Const::Value(ConstValue::Int(2))));
    assert_eq!(
        marker.value("names"),
        Some(&Const::Array(vec![
            Const::Value(ConstValue::String("a".into())),
            Const::Value(ConstValue::String("b".into())),
        ]))
    );
}

#[test]
fn source_annotation_metadata_from_meta_annotations() {
    let dir = TempDir::new().unwrap();
    let boot = boot_jar(&dir);

    let units = [unit("Anno.java")
        .package("p")
        .decl(
            annotation_("Anno")
                .anno(anno_val(
                    "java.lang.annotation.Target",
                    array_init(vec![
                        name_expr("java.lang.annotation.ElementType.FIELD"),
                        name_expr("java.lang.annotation.ElementType.TYPE_USE"),
                    ]),
                ))
                .anno(anno_val(
                    "java.lang.annotation.Retention",
                    name_expr("java.lang.annotation.RetentionPolicy.RUNTIME"),
                ))
                .build(),
        )
        .build()];
    let result = bind_with_boot(&units, &[boot]);
    assert_no_errors(&result);

    let metadata = class(&result, "p/Anno").metadata.as_ref().unwrap();
    let AnnotationMetadata { targets, retention } = metadata;
    let targets = targets.as_ref().unwrap();
    assert!(targets.contains(&ElementType::Field));
    assert!(targets.contains(&ElementType::TypeUse));
    assert_eq!(targets.len(), 2);
    assert_eq!(*retention, Some(RetentionPolicy::Runtime));
}

#[test]
fn type_use_annotation_moves_to_the_array_element_type() {
    let dir = TempDir::new().unwrap();
    let boot = boot_jar(&dir);

    let units = [
        unit("Anno.java")
            .package("p")
            .decl(
                annotation_("Anno")
                    .anno(anno_val(
                        "java.lang.annotation.Target",
                        name_expr("java.lang.annotation.ElementType.TYPE_USE"),
                    ))
                    .build(),
            )
            .build(),
        unit("Test.java")
            .package("p")
            .decl(
                class_("Test")
                    .field(
                        field(
                            quill_testutil::tree::array(quill_testutil::tree::array(prim(
                                PrimKind::Int,
                            ))),
                            "xs",
                        )
                        .anno(anno("Anno"))
                        .build(),
                    )
                    .build(),
            )
            .build(),
    ];
    let result = bind_with_boot(&units, &[boot]);
    assert_no_errors(&result);

    let xs = class(&result, "p/Test").field(&"xs".into()).unwrap();
    // Declaration annotations are empty; the annotation sits on the element
    // type two array steps down.
    assert!(xs.annotations.is_empty());
    let Type::Array { elem, annos } = &xs.ty else { panic!() };
    assert!(annos.is_empty());
    let Type::Array { elem, annos } = elem.as_ref() else { panic!() };
    assert!(annos.is_empty());
    let Type::Prim { kind, annos } = elem.as_ref() else { panic!() };
    assert_eq!(*kind, PrimKind::Int);
    assert_eq!(annos.len(), 1);
    assert_eq!(annos[0].sym, Some(sym("p/Anno")));
}

#[test]
fn both_targets_attach_to_both_positions() {
    let dir = TempDir::new().unwrap();
    let boot = boot_jar(&dir);

    let units = [
        unit("Anno.java")
            .package("p")
            .decl(
                annotation_("Anno")
                    .anno(anno_val(
                        "java.lang.annotation.Target",
                        array_init(vec![
                            name_expr("java.lang.annotation.ElementType.FIELD"),
                            name_expr("java.lang.annotation.ElementType.TYPE_USE"),
                        ]),
                    ))
                    .build(),
            )
            .build(),
        unit("Test.java")
            .package("p")
            .decl(
                class_("Test")
                    .field(field(prim(PrimKind::Int), "x").anno(anno("Anno")).build())
                    .build(),
            )
            .build(),
    ];
    let result = bind_with_boot(&units, &[boot]);
    assert_no_errors(&result);

    let x = class(&result, "p/Test").field(&"x".into()).unwrap();
    assert_eq!(x.annotations.len(), 1);
    let Type::Prim { annos, .. } = &x.ty else { panic!() };
    assert_eq!(annos.len(), 1);
}

#[test]
fn no_target_means_declaration_only() {
    let units = [
        unit("Anno.java").package("p").decl(annotation_("Anno").build()).build(),
        unit("Test.java")
            .package("p")
            .decl(
                class_("Test")
                    .field(field(prim(PrimKind::Int), "x").anno(anno("Anno")).build())
                    .build(),
            )
            .build(),
    ];
    let result = super::support::bind_units(&units);
    assert_no_errors(&result);

    let x = class(&result, "p/Test").field(&"x".into()).unwrap();
    assert_eq!(x.annotations.len(), 1);
    let Type::Prim { annos, .. } = &x.ty else { panic!() };
    assert!(annos.is_empty());
}

#[test]
fn bytecode_target_metadata_drives_the_split() {
    use quill_testutil::classbytes::{AnnoSpec, ClassBytes};

    let dir = TempDir::new().unwrap();
    let mut classes = boot_classes();
    classes.push(
        ClassBytes::new("lib/Tagged")
            .flags(0x2601) // public interface abstract annotation
            .annotation(AnnoSpec::target(&["TYPE_USE"])),
    );
    let boot = jar_with(&dir, "boot.jar", &classes);

    let units = [unit("Test.java")
        .package("p")
        .import_single("lib.Tagged")
        .decl(
            class_("Test")
                .field(field(prim(PrimKind::Int), "x").anno(anno("Tagged")).build())
                .build(),
        )
        .build()];
    let result = bind_with_boot(&units, &[boot]);
    assert_no_errors(&result);

    let x = class(&result, "p/Test").field(&"x".into()).unwrap();
    assert!(x.annotations.is_empty());
    let Type::Prim { annos, .. } = &x.ty else { panic!() };
    assert_eq!(annos.len(), 1);
    assert_eq!(annos[0].sym, Some(sym("lib/Tagged")));
}

#[test]
fn receiver_type_annotations_attach_to_the_receiver_type() {
    let dir = TempDir::new().unwrap();
    let boot = boot_jar(&dir);

    let units = [
        unit("Anno.java")
            .package("p")
            .decl(
                annotation_("Anno")
                    .anno(anno_val(
                        "java.lang.annotation.Target",
                        name_expr("java.lang.annotation.ElementType.TYPE_USE"),
                    ))
                    .build(),
            )
            .build(),
        unit("Test.java")
            .package("p")
            .decl(
                class_("Test")
                    .method({
                        let mut m = method(void_(), "m")
                            .receiver(quill_tree::Ty::Class(
                                quill_testutil::tree::class_ty("Test"),
                            ))
                            .build();
                        m.receiver.as_mut().unwrap().annos.push(anno("Anno"));
                        m
                    })
                    .build(),
            )
            .build(),
    ];
    let result = bind_with_boot(&units, &[boot]);
    assert_no_errors(&result);

    let m = &class(&result, "p/Test").methods[0];
    let receiver = m.receiver.as_ref().unwrap();
    assert!(receiver.annotations.is_empty());
    let Type::Class(c) = &receiver.ty else { panic!() };
    assert_eq!(c.segments.last().unwrap().annos.len(), 1);
}

#[test]
fn annotation_method_defaults_are_evaluated() {
    let units = [unit("A.java")
        .package("p")
        .decl(
            annotation_("A")
                .method(
                    method(prim(PrimKind::Int), "count")
                        .default_value(lit_int(3))
                        .build(),
                )
                .build(),
        )
        .build()];
    let result = super::support::bind_units(&units);
    assert_no_errors(&result);

    let a = class(&result, "p/A");
    assert_eq!(
        a.methods[0].default_value,
        Some(Const::Value(ConstValue::Int(3)))
    );
}

#[test]
fn enum_reference_in_annotation_argument() {
    let units = [
        unit("E.java")
            .package("p")
            .decl(quill_testutil::tree::enum_("E").enum_const("ON").build())
            .build(),
        unit("Anno.java").package("p").decl(annotation_("Anno").build()).build(),
        unit("Use.java")
            .package("p")
            .decl(
                class_("Use")
                    .anno(anno_val("Anno", name_expr("E.ON")))
                    .build(),
            )
            .build(),
    ];
    let result = super::support::bind_units(&units);
    assert_no_errors(&result);

    let use_class = class(&result, "p/Use");
    let value = use_class.annotations[0].value("value").unwrap();
    let Const::EnumConst(field) = value else {
        panic!("expected an enum constant, got {value:?}")
    };
    assert_eq!(field.owner, sym("p/E"));
    assert_eq!(field.name.as_str(), "ON");
}
