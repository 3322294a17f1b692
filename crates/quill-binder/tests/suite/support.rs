//! Shared helpers for the binder suite.

use std::path::PathBuf;

use quill_binder::bound::SourceTypeBoundClass;
use quill_binder::sym::ClassSymbol;
use quill_binder::{bind, BindingResult};
use quill_core::Severity;
use quill_testutil::classbytes::{ClassBytes, FieldSpec};
use quill_testutil::jar;
use quill_tree::CompUnit;
use tempfile::TempDir;

pub fn bind_units(units: &[CompUnit]) -> BindingResult {
    bind(units, &[], &[]).expect("binding without archives cannot fail")
}

pub fn bind_with_classpath(units: &[CompUnit], jars: &[PathBuf]) -> BindingResult {
    bind(units, jars, &[]).expect("classpath binding")
}

pub fn bind_with_boot(units: &[CompUnit], boot: &[PathBuf]) -> BindingResult {
    bind(units, &[], boot).expect("bootclasspath binding")
}

/// Writes a jar with the given classes into `dir`.
pub fn jar_with(dir: &TempDir, name: &str, classes: &[ClassBytes]) -> PathBuf {
    let path = dir.path().join(name);
    let entries: Vec<(String, Vec<u8>)> = classes
        .iter()
        .map(|c| (format!("{}.class", c.internal_name()), c.build()))
        .collect();
    let borrowed: Vec<(&str, Vec<u8>)> = entries
        .iter()
        .map(|(n, b)| (n.as_str(), b.clone()))
        .collect();
    jar(&path, &borrowed).expect("write jar");
    path
}

/// A minimal `java.lang` (plus `java.lang.annotation`) for tests that need
/// the implicit import or the well-known supertypes.
pub fn boot_classes() -> Vec<ClassBytes> {
    const ACC_PUBLIC: u16 = 0x0001;
    const ACC_FINAL: u16 = 0x0010;
    const ACC_INTERFACE: u16 = 0x0200;
    const ACC_ABSTRACT: u16 = 0x0400;
    const ACC_ANNOTATION: u16 = 0x2000;
    const ACC_ENUM: u16 = 0x4000;
    const ENUM_CONST: u16 = 0x4019;

    let annotation_iface = ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT | ACC_ANNOTATION;
    let element_type_field =
        |name: &str| FieldSpec::new(name, "Ljava/lang/annotation/ElementType;").flags(ENUM_CONST);

    vec![
        ClassBytes::new("java/lang/Object").super_class(None),
        ClassBytes::new("java/lang/String").flags(ACC_PUBLIC | ACC_FINAL),
        ClassBytes::new("java/lang/Enum").flags(ACC_PUBLIC | ACC_ABSTRACT),
        ClassBytes::new("java/lang/Deprecated").flags(annotation_iface),
        ClassBytes::new("java/lang/annotation/Annotation")
            .flags(ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT),
        ClassBytes::new("java/lang/annotation/Target").flags(annotation_iface),
        ClassBytes::new("java/lang/annotation/Retention").flags(annotation_iface),
        ClassBytes::new("java/lang/annotation/ElementType")
            .flags(ACC_PUBLIC | ACC_FINAL | ACC_ENUM)
            .super_class(Some("java/lang/Enum"))
            .field(element_type_field("TYPE"))
            .field(element_type_field("FIELD"))
            .field(element_type_field("METHOD"))
            .field(element_type_field("PARAMETER"))
            .field(element_type_field("TYPE_USE")),
        ClassBytes::new("java/lang/annotation/RetentionPolicy")
            .flags(ACC_PUBLIC | ACC_FINAL | ACC_ENUM)
            .super_class(Some("java/lang/Enum"))
            .field(
                FieldSpec::new("RUNTIME", "Ljava/lang/annotation/RetentionPolicy;")
                    .flags(ENUM_CONST),
            ),
    ]
}

pub fn sym(name: &str) -> ClassSymbol {
    ClassSymbol::new(name)
}

pub fn class<'r>(result: &'r BindingResult, name: &str) -> &'r SourceTypeBoundClass {
    result
        .get(&sym(name))
        .unwrap_or_else(|| panic!("{name} should be bound"))
}

pub fn assert_no_errors(result: &BindingResult) {
    let errors: Vec<_> = result
        .diagnostics()
        .iter()
        .filter(|d| d.diagnostic.severity == Severity::Error)
        .collect();
    assert!(errors.is_empty(), "unexpected errors: {errors:#?}");
}

pub fn error_codes_for(result: &BindingResult, name: &str) -> Vec<&'static str> {
    result
        .diagnostics()
        .iter()
        .filter(|d| d.sym.as_ref() == Some(&sym(name)))
        .filter(|d| d.diagnostic.severity == Severity::Error)
        .map(|d| d.code())
        .collect()
}
