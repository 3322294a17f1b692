//! Whole-pipeline properties: idempotence, failure isolation, archive
//! handling.

use pretty_assertions::assert_eq;
use quill_core::flags::{ACC_FINAL, ACC_STATIC};
use quill_core::PrimKind;
use quill_testutil::classbytes::{ClassBytes, FieldSpec};
use quill_testutil::tree::{bin, class_, class_ty, field, lit_int, name_expr, prim, unit};
use quill_tree::BinOp;
use tempfile::TempDir;

use super::support::{assert_no_errors, bind_with_classpath, boot_classes, jar_with, sym};

fn fixture() -> Vec<quill_tree::CompUnit> {
    vec![
        unit("A.java")
            .package("p")
            .decl(
                class_("A")
                    .nested(class_("In").build())
                    .field(
                        field(prim(PrimKind::Int), "K")
                            .mods(ACC_STATIC | ACC_FINAL)
                            .init(lit_int(40))
                            .build(),
                    )
                    .build(),
            )
            .build(),
        unit("B.java")
            .package("p")
            .decl(
                class_("B")
                    .extends(class_ty("A"))
                    .field(
                        field(prim(PrimKind::Int), "K2")
                            .mods(ACC_STATIC | ACC_FINAL)
                            .init(bin(BinOp::Add, name_expr("K"), lit_int(2)))
                            .build(),
                    )
                    .build(),
            )
            .build(),
    ]
}

#[test]
fn binding_twice_yields_structurally_equal_outputs() {
    let dir = TempDir::new().unwrap();
    let boot = jar_with(&dir, "boot.jar", &boot_classes());
    let units = fixture();

    let first = quill_binder::bind(&units, &[], &[boot.clone()]).unwrap();
    let second = quill_binder::bind(&units, &[], &[boot]).unwrap();

    assert_eq!(first.symbols(), second.symbols());
    assert_eq!(first.units(), second.units());
    assert_eq!(first.diagnostics(), second.diagnostics());
}

#[test]
fn corrupt_classpath_entry_poisons_only_itself() {
    let dir = TempDir::new().unwrap();
    let jar_path = dir.path().join("mixed.jar");
    let good = ClassBytes::new("lib/Good")
        .field(FieldSpec::new("K", "I").constant(quill_core::ConstValue::Int(1)));
    quill_testutil::jar(
        &jar_path,
        &[
            ("lib/Broken.class", b"not a classfile".to_vec()),
            ("lib/Good.class", good.build()),
        ],
    )
    .unwrap();

    // Nothing references lib.Broken; binding must not notice it.
    let units = [unit("T.java")
        .package("q")
        .import_single("lib.Good")
        .decl(
            class_("T")
                .field(
                    field(prim(PrimKind::Int), "X")
                        .mods(ACC_STATIC | ACC_FINAL)
                        .init(name_expr("Good.K"))
                        .build(),
                )
                .build(),
        )
        .build()];
    let result = bind_with_classpath(&units, &[jar_path]);
    assert_no_errors(&result);
    assert_eq!(
        super::support::class(&result, "q/T")
            .field(&"X".into())
            .unwrap()
            .value,
        Some(quill_core::ConstValue::Int(1))
    );
    // The broken class is still registered as a symbol.
    assert!(result.classpath().get_class(&sym("lib/Broken")).is_some());
}

#[test]
fn class_directories_work_like_archives() {
    let dir = TempDir::new().unwrap();
    let class_dir = dir.path().join("classes");
    std::fs::create_dir_all(class_dir.join("lib")).unwrap();
    let bytes = ClassBytes::new("lib/Dep")
        .field(FieldSpec::new("K", "I").constant(quill_core::ConstValue::Int(9)))
        .build();
    std::fs::write(class_dir.join("lib/Dep.class"), bytes).unwrap();

    let units = [unit("T.java")
        .package("q")
        .import_single("lib.Dep")
        .decl(
            class_("T")
                .field(
                    field(prim(PrimKind::Int), "X")
                        .mods(ACC_STATIC | ACC_FINAL)
                        .init(name_expr("Dep.K"))
                        .build(),
                )
                .build(),
        )
        .build()];
    let result = bind_with_classpath(&units, &[class_dir]);
    assert_no_errors(&result);
    assert_eq!(
        super::support::class(&result, "q/T")
            .field(&"X".into())
            .unwrap()
            .value,
        Some(quill_core::ConstValue::Int(9))
    );
}

#[test]
fn classpath_generic_supertypes_come_from_signatures() {
    let dir = TempDir::new().unwrap();
    let jar = jar_with(
        &dir,
        "dep.jar",
        &[ClassBytes::new("lib/Box")
            .signature("<T:Ljava/lang/Object;>Ljava/lang/Object;")],
    );

    let units = [unit("T.java")
        .package("q")
        .import_single("lib.Box")
        .decl(class_("T").extends(class_ty("Box")).build())
        .build()];
    let result = bind_with_classpath(&units, &[jar]);
    assert_no_errors(&result);
    assert_eq!(
        super::support::class(&result, "q/T").superclass,
        Some(sym("lib/Box"))
    );

    let box_class = result.classpath().get_class(&sym("lib/Box")).unwrap();
    let params = box_class.ty_params();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].0.as_str(), "T");
}
