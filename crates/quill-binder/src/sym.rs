//! Symbols: opaque identities for classes, fields, methods, and type
//! variables. Equality is by canonical name; entities never own each other,
//! so cyclic graphs exist only through symbols.

use std::fmt;

use quill_core::Name;

// Debug prints the same compact form as Display; the derive's tuple wrapper
// adds nothing in binder logs.
macro_rules! debug_via_display {
    ($ty:ty) => {
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(self, f)
            }
        }
    };
}

/// A class identified by its canonical binary name,
/// e.g. `java/util/Map$Entry`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassSymbol(Name);

impl ClassSymbol {
    pub fn new(binary_name: impl AsRef<str>) -> Self {
        Self(Name::new(binary_name.as_ref()))
    }

    pub fn binary_name(&self) -> &str {
        self.0.as_str()
    }

    /// The simple name: everything after the last `$` or `/`.
    pub fn simple_name(&self) -> &str {
        let name = self.0.as_str();
        let start = name.rfind(['$', '/']).map(|i| i + 1).unwrap_or(0);
        &name[start..]
    }

    /// The package prefix with `/` separators, empty for the default package.
    pub fn package_name(&self) -> &str {
        let name = self.0.as_str();
        match name.rfind('/') {
            Some(i) => &name[..i],
            None => "",
        }
    }

    pub fn package_segments(&self) -> Vec<Name> {
        let pkg = self.package_name();
        if pkg.is_empty() {
            Vec::new()
        } else {
            pkg.split('/').map(Name::from).collect()
        }
    }

    /// The class part of the binary name (after the package prefix).
    pub fn class_part(&self) -> &str {
        let name = self.0.as_str();
        match name.rfind('/') {
            Some(i) => &name[i + 1..],
            None => name,
        }
    }

    /// The enclosing class implied by the binary name, if the class part
    /// contains a `$`. Source and `InnerClasses`-derived owner links are
    /// authoritative; this is the name-shaped fallback.
    pub fn implied_owner(&self) -> Option<ClassSymbol> {
        let name = self.0.as_str();
        let class_start = name.rfind('/').map(|i| i + 1).unwrap_or(0);
        let dollar = name[class_start..].rfind('$')?;
        Some(ClassSymbol::new(&name[..class_start + dollar]))
    }

    /// The symbol of a member class of `self` with the given simple name.
    pub fn member(&self, simple_name: &str) -> ClassSymbol {
        ClassSymbol::new(format!("{}${simple_name}", self.0))
    }

    // Well-known symbols. `Name` stores these short strings inline.

    pub fn object() -> Self {
        Self::new("java/lang/Object")
    }

    pub fn string() -> Self {
        Self::new("java/lang/String")
    }

    pub fn enum_root() -> Self {
        Self::new("java/lang/Enum")
    }

    pub fn annotation_root() -> Self {
        Self::new("java/lang/annotation/Annotation")
    }

    pub fn deprecated() -> Self {
        Self::new("java/lang/Deprecated")
    }

    pub fn target() -> Self {
        Self::new("java/lang/annotation/Target")
    }

    pub fn retention() -> Self {
        Self::new("java/lang/annotation/Retention")
    }
}

debug_via_display!(ClassSymbol);

impl fmt::Display for ClassSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary_name())
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FieldSymbol {
    pub owner: ClassSymbol,
    pub name: Name,
}

impl FieldSymbol {
    pub fn new(owner: ClassSymbol, name: impl Into<Name>) -> Self {
        Self {
            owner,
            name: name.into(),
        }
    }
}

debug_via_display!(FieldSymbol);

impl fmt::Display for FieldSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.owner, self.name)
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MethodSymbol {
    pub owner: ClassSymbol,
    pub name: Name,
}

impl MethodSymbol {
    pub fn new(owner: ClassSymbol, name: impl Into<Name>) -> Self {
        Self {
            owner,
            name: name.into(),
        }
    }
}

debug_via_display!(MethodSymbol);

impl fmt::Display for MethodSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.owner, self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TyVarOwner {
    Class(ClassSymbol),
    Method(MethodSymbol),
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TyVarSymbol {
    pub owner: TyVarOwner,
    pub name: Name,
}

impl TyVarSymbol {
    pub fn of_class(owner: ClassSymbol, name: impl Into<Name>) -> Self {
        Self {
            owner: TyVarOwner::Class(owner),
            name: name.into(),
        }
    }

    pub fn of_method(owner: MethodSymbol, name: impl Into<Name>) -> Self {
        Self {
            owner: TyVarOwner::Method(owner),
            name: name.into(),
        }
    }
}

debug_via_display!(TyVarSymbol);

impl fmt::Display for TyVarSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.owner {
            TyVarOwner::Class(c) => write!(f, "{c}<{}>", self.name),
            TyVarOwner::Method(m) => write!(f, "{m}<{}>", self.name),
        }
    }
}
