//! Class-file decoding for the quill binder.
//!
//! Parses only what header binding needs: the constant pool, class/field/
//! method stubs with their `Signature`, `ConstantValue`, `InnerClasses`,
//! `Deprecated`, and runtime annotation attributes. `Code` and every other
//! attribute are skipped unread.

mod annotation;
mod classfile;
mod constant_pool;
pub mod descriptor;
mod error;
mod reader;
pub mod signature;

pub use annotation::{Annotation, ElementValue};
pub use classfile::{ClassFile, FieldInfo, InnerClassInfo, MethodInfo};
pub use error::{Error, Result};
