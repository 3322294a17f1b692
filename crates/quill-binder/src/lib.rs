//! Symbol and type binding for class-file headers.
//!
//! Given parsed compilation units and the classpath/bootclasspath archives,
//! [`bind`] runs the multi-pass pipeline (source binding, the top-level
//! index, package scopes, the hierarchy pass, the type pass, constant
//! evaluation, type-annotation disambiguation, and canonicalization) and
//! returns the fully resolved graph a lowering back-end needs to emit
//! class-file headers. Method bodies are never examined.
//!
//! Binding is single-threaded and cooperative: forward references complete
//! on demand through lazy environments, and the only control-flow escape is
//! the cycle signal, which the constant evaluator recovers from locally and
//! the hierarchy pass reports as a diagnostic.

mod binder;
pub mod bound;
mod canonical;
pub mod classpath;
mod consts;
mod diag;
mod disambiguate;
pub mod env;
mod hierarchy;
pub mod imports;
pub mod lookup;
pub mod resolve;
pub mod sym;
pub mod ty;
mod type_binder;

pub use binder::{bind, BindingResult};
pub use classpath::{BytecodeBoundClass, ClasspathEnv, ClasspathError};
pub use diag::BindDiagnostic;
pub use diag::{
    AMBIGUOUS, BAD_BOUND, CYCLIC_HIERARCHY, CYCLIC_SUPERTYPE_DEPENDENCY, DUPLICATE_DECLARATION,
    DUPLICATE_IMPORT, IMPORT_NOT_FOUND, INVALID_CONSTANT, NOT_FOUND, UNKNOWN_ANNOTATION_TARGET,
};
