//! Binder diagnostics.
//!
//! Resolution failures never abort the pipeline: they are recorded here,
//! attached to the symbol being bound, and a sentinel flows onward.

use std::cell::RefCell;

use quill_core::{Diagnostic, Severity, Span};

use crate::sym::ClassSymbol;

pub const NOT_FOUND: &str = "bind.not-found";
pub const AMBIGUOUS: &str = "bind.ambiguous";
pub const CYCLIC_HIERARCHY: &str = "bind.cyclic-hierarchy";
pub const CYCLIC_SUPERTYPE_DEPENDENCY: &str = "bind.cyclic-supertype-dependency";
pub const BAD_BOUND: &str = "bind.bad-bound";
pub const INVALID_CONSTANT: &str = "bind.invalid-constant";
pub const DUPLICATE_IMPORT: &str = "bind.duplicate-import";
pub const IMPORT_NOT_FOUND: &str = "bind.import-not-found";
pub const DUPLICATE_DECLARATION: &str = "bind.duplicate-declaration";
pub const UNKNOWN_ANNOTATION_TARGET: &str = "bind.unknown-annotation-target";

/// A diagnostic plus the class symbol it is attached to (absent for
/// unit-level problems such as import clashes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindDiagnostic {
    pub sym: Option<ClassSymbol>,
    pub diagnostic: Diagnostic,
}

impl BindDiagnostic {
    pub fn code(&self) -> &'static str {
        self.diagnostic.code
    }
}

/// Shared collector threaded through the passes.
#[derive(Default)]
pub(crate) struct Diags {
    list: RefCell<Vec<BindDiagnostic>>,
}

impl Diags {
    pub(crate) fn error(
        &self,
        sym: Option<&ClassSymbol>,
        code: &'static str,
        message: impl Into<String>,
        span: Option<Span>,
    ) {
        self.push(sym, Diagnostic::error(code, message, span));
    }

    pub(crate) fn warning(
        &self,
        sym: Option<&ClassSymbol>,
        code: &'static str,
        message: impl Into<String>,
        span: Option<Span>,
    ) {
        self.push(sym, Diagnostic::warning(code, message, span));
    }

    pub(crate) fn push(&self, sym: Option<&ClassSymbol>, diagnostic: Diagnostic) {
        if diagnostic.severity == Severity::Error {
            tracing::debug!(code = diagnostic.code, message = %diagnostic.message, "bind diagnostic");
        }
        self.list.borrow_mut().push(BindDiagnostic {
            sym: sym.cloned(),
            diagnostic,
        });
    }

    pub(crate) fn into_vec(self) -> Vec<BindDiagnostic> {
        self.list.into_inner()
    }
}
