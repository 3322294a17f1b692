//! Constant evaluation: narrowing, promotion, cross-unit references, and
//! cycle recovery.

use pretty_assertions::assert_eq;
use quill_core::flags::{ACC_FINAL, ACC_STATIC};
use quill_core::{ConstValue, PrimKind, Severity};
use quill_testutil::classbytes::{ClassBytes, FieldSpec};
use quill_testutil::tree::{
    bin, cast_prim, class_, cond, field, lit_bool, lit_int, lit_str, name_expr, prim, un, unit,
};
use quill_tree::{BinOp, UnOp};
use tempfile::TempDir;

use super::support::{assert_no_errors, bind_units, bind_with_classpath, class, jar_with};
use quill_binder::INVALID_CONSTANT;

fn const_field(ty: quill_tree::Ty, name: &str, init: quill_tree::Expr) -> quill_tree::FieldDecl {
    field(ty, name)
        .mods(ACC_STATIC | ACC_FINAL)
        .init(init)
        .build()
}

fn value_of(result: &quill_binder::BindingResult, class_name: &str, field_name: &str) -> Option<ConstValue> {
    class(result, class_name)
        .field(&field_name.into())
        .unwrap_or_else(|| panic!("{class_name}.{field_name} missing"))
        .value
        .clone()
}

#[test]
fn classpath_constants_narrow_on_read_and_store() {
    // The archive stores 0x7fffffff raw in a short and a boolean slot.
    let dir = TempDir::new().unwrap();
    let jar = jar_with(
        &dir,
        "lib.jar",
        &[ClassBytes::new("Lib")
            .field(FieldSpec::new("SCONST", "S").constant(ConstValue::Int(0x7fff_ffff)))
            .field(FieldSpec::new("ZCONST", "Z").constant(ConstValue::Int(0x7fff_ffff)))],
    );

    let units = [unit("Test.java")
        .decl(
            class_("Test")
                .field(const_field(
                    prim(PrimKind::Short),
                    "SCONST",
                    bin(BinOp::Add, name_expr("Lib.SCONST"), lit_int(0)),
                ))
                .field(const_field(
                    prim(PrimKind::Boolean),
                    "ZCONST",
                    bin(BinOp::OrOr, name_expr("Lib.ZCONST"), lit_bool(false)),
                ))
                .build(),
        )
        .build()];
    let result = bind_with_classpath(&units, &[jar]);
    assert_no_errors(&result);

    assert_eq!(value_of(&result, "Test", "SCONST"), Some(ConstValue::Short(-1)));
    assert_eq!(value_of(&result, "Test", "ZCONST"), Some(ConstValue::Boolean(true)));
}

#[test]
fn out_of_range_store_narrows_with_a_warning() {
    let units = [unit("Test.java")
        .decl(
            class_("Test")
                .field(const_field(
                    prim(PrimKind::Short),
                    "S",
                    lit_int(0x7fff_ffff),
                ))
                .build(),
        )
        .build()];
    let result = bind_units(&units);
    assert_eq!(value_of(&result, "Test", "S"), Some(ConstValue::Short(-1)));

    let warnings: Vec<_> = result
        .diagnostics()
        .iter()
        .filter(|d| d.diagnostic.severity == Severity::Warning)
        .map(|d| d.code())
        .collect();
    assert_eq!(warnings, vec![INVALID_CONSTANT]);
}

#[test]
fn self_referential_constant_binds_without_a_value() {
    let units = [unit("Test.java")
        .decl(
            class_("Test")
                .field(const_field(
                    prim(PrimKind::Int),
                    "X",
                    bin(BinOp::Add, name_expr("X"), lit_int(1)),
                ))
                .build(),
        )
        .build()];
    let result = bind_units(&units);
    assert_no_errors(&result);

    let x = class(&result, "Test").field(&"X".into()).unwrap();
    assert_eq!(x.value, None);
    // The declared access flags are untouched.
    assert_eq!(x.access & (ACC_STATIC | ACC_FINAL), ACC_STATIC | ACC_FINAL);
    // The initializer is retained for lowering.
    assert!(x.decl.as_ref().unwrap().init.is_some());
}

#[test]
fn mutual_constant_cycle_leaves_both_fields_non_constant() {
    let units = [unit("Test.java")
        .decl(
            class_("Test")
                .field(const_field(
                    prim(PrimKind::Int),
                    "X",
                    bin(BinOp::Add, name_expr("Y"), lit_int(1)),
                ))
                .field(const_field(
                    prim(PrimKind::Int),
                    "Y",
                    bin(BinOp::Add, name_expr("X"), lit_int(1)),
                ))
                .build(),
        )
        .build()];
    let result = bind_units(&units);
    assert_no_errors(&result);
    assert_eq!(value_of(&result, "Test", "X"), None);
    assert_eq!(value_of(&result, "Test", "Y"), None);
}

#[test]
fn constants_reference_across_compilation_units() {
    let units = [
        unit("A.java")
            .package("p")
            .decl(
                class_("A")
                    .field(const_field(prim(PrimKind::Int), "BASE", lit_int(40)))
                    .build(),
            )
            .build(),
        unit("B.java")
            .package("p")
            .decl(
                class_("B")
                    .field(const_field(
                        prim(PrimKind::Int),
                        "DERIVED",
                        bin(BinOp::Add, name_expr("A.BASE"), lit_int(2)),
                    ))
                    .build(),
            )
            .build(),
    ];
    let result = bind_units(&units);
    assert_no_errors(&result);
    assert_eq!(value_of(&result, "p/B", "DERIVED"), Some(ConstValue::Int(42)));
}

#[test]
fn inherited_constants_are_visible_by_simple_name() {
    let units = [unit("T.java")
        .package("p")
        .decl(
            class_("Base")
                .field(const_field(prim(PrimKind::Int), "K", lit_int(5)))
                .build(),
        )
        .decl(
            class_("Sub")
                .extends(quill_testutil::tree::class_ty("Base"))
                .field(const_field(
                    prim(PrimKind::Int),
                    "K2",
                    bin(BinOp::Mul, name_expr("K"), lit_int(3)),
                ))
                .build(),
        )
        .build()];
    let result = bind_units(&units);
    assert_no_errors(&result);
    assert_eq!(value_of(&result, "p/Sub", "K2"), Some(ConstValue::Int(15)));
}

#[test]
fn string_concatenation_and_display_forms() {
    let units = [unit("S.java")
        .decl(
            class_("S")
                .field(const_field(
                    quill_tree::Ty::Class(quill_testutil::tree::class_ty("String")),
                    "MSG",
                    bin(
                        BinOp::Add,
                        bin(BinOp::Add, lit_str("v="), lit_int(3)),
                        bin(BinOp::Add, lit_str(", on="), lit_bool(true)),
                    ),
                ))
                .build(),
        )
        .build()];
    let dir = TempDir::new().unwrap();
    let boot = jar_with(&dir, "boot.jar", &super::support::boot_classes());
    let result = super::support::bind_with_boot(&units, &[boot]);
    assert_no_errors(&result);
    assert_eq!(
        value_of(&result, "S", "MSG"),
        Some(ConstValue::String("v=3, on=true".to_string()))
    );
}

#[test]
fn ternary_evaluates_exactly_one_branch() {
    // The untaken branch divides by zero; taking it would poison the field.
    let units = [unit("T.java")
        .decl(
            class_("T")
                .field(const_field(
                    prim(PrimKind::Int),
                    "X",
                    cond(
                        lit_bool(true),
                        lit_int(1),
                        bin(BinOp::Div, lit_int(1), lit_int(0)),
                    ),
                ))
                .build(),
        )
        .build()];
    let result = bind_units(&units);
    assert_no_errors(&result);
    assert_eq!(value_of(&result, "T", "X"), Some(ConstValue::Int(1)));
}

#[test]
fn division_by_zero_is_not_constant() {
    let units = [unit("T.java")
        .decl(
            class_("T")
                .field(const_field(
                    prim(PrimKind::Int),
                    "X",
                    bin(BinOp::Div, lit_int(1), lit_int(0)),
                ))
                .build(),
        )
        .build()];
    let result = bind_units(&units);
    assert_eq!(value_of(&result, "T", "X"), None);
    assert!(result
        .diagnostics()
        .iter()
        .any(|d| d.code() == INVALID_CONSTANT));
}

#[test]
fn widened_arithmetic_and_casts() {
    let units = [unit("W.java")
        .decl(
            class_("W")
                // (byte) (200 + 100) wraps to 44.
                .field(const_field(
                    prim(PrimKind::Byte),
                    "B",
                    cast_prim(PrimKind::Byte, bin(BinOp::Add, lit_int(200), lit_int(100))),
                ))
                // char + char is int.
                .field(const_field(
                    prim(PrimKind::Int),
                    "C",
                    bin(
                        BinOp::Add,
                        quill_testutil::tree::lit_char('a'),
                        quill_testutil::tree::lit_char('b'),
                    ),
                ))
                // -5 >>> 1 on int.
                .field(const_field(
                    prim(PrimKind::Int),
                    "U",
                    bin(BinOp::UShr, lit_int(-5), lit_int(1)),
                ))
                // ~0L is long.
                .field(const_field(
                    prim(PrimKind::Long),
                    "L",
                    un(UnOp::BitNot, quill_testutil::tree::lit_long(0)),
                ))
                .build(),
        )
        .build()];
    let result = bind_units(&units);
    assert_no_errors(&result);
    assert_eq!(value_of(&result, "W", "B"), Some(ConstValue::Byte(44)));
    assert_eq!(value_of(&result, "W", "C"), Some(ConstValue::Int(195)));
    assert_eq!(value_of(&result, "W", "U"), Some(ConstValue::Int(0x7fff_fffd)));
    assert_eq!(value_of(&result, "W", "L"), Some(ConstValue::Long(-1)));
}

#[test]
fn non_final_fields_are_not_constants() {
    let units = [unit("T.java")
        .decl(
            class_("T")
                .field(
                    field(prim(PrimKind::Int), "X")
                        .mods(ACC_STATIC)
                        .init(lit_int(1))
                        .build(),
                )
                .build(),
        )
        .build()];
    let result = bind_units(&units);
    assert_no_errors(&result);
    assert_eq!(value_of(&result, "T", "X"), None);
}
