//! Name lookup: scopes and the global top-level index.
//!
//! A [`Scope`] maps a qualified name to the longest class prefix it knows,
//! returning the symbol plus the member segments it did not consume;
//! resolving those needs a bound hierarchy and is the caller's job.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use quill_core::Name;

use crate::sym::ClassSymbol;

/// A non-empty sequence of dotted name segments to look up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupKey {
    segments: Vec<Name>,
}

impl LookupKey {
    pub fn new(segments: Vec<Name>) -> Self {
        assert!(!segments.is_empty(), "lookup key must have segments");
        Self { segments }
    }

    pub fn from_dotted(path: &str) -> Self {
        Self::new(path.split('.').map(Name::from).collect())
    }

    pub fn first(&self) -> &Name {
        &self.segments[0]
    }

    pub fn segments(&self) -> &[Name] {
        &self.segments
    }

    pub fn rest(&self) -> &[Name] {
        &self.segments[1..]
    }
}

/// A resolved prefix: the class symbol the scope found and the inner-name
/// segments still to be resolved as members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupResult {
    pub sym: ClassSymbol,
    pub remaining: Vec<Name>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameLookup {
    Found(LookupResult),
    /// Two on-demand sources supplied the same short name.
    Ambiguous {
        name: Name,
        candidates: Vec<ClassSymbol>,
    },
    NotFound,
}

impl NameLookup {
    pub fn found(sym: ClassSymbol, remaining: Vec<Name>) -> Self {
        NameLookup::Found(LookupResult { sym, remaining })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, NameLookup::NotFound)
    }
}

pub trait Scope {
    fn lookup(&self, key: &LookupKey) -> NameLookup;
}

/// A chain of scopes. `append` pushes a scope that shadows everything
/// appended before it, so a unit scope is built base-first:
/// `of(index).append(lang).append(wild).append(package).append(imports)`.
#[derive(Clone, Default)]
pub struct CompoundScope {
    scopes: Vec<Arc<dyn Scope>>,
}

impl CompoundScope {
    pub fn of(base: Arc<dyn Scope>) -> Self {
        Self { scopes: vec![base] }
    }

    #[must_use]
    pub fn append(mut self, scope: Arc<dyn Scope>) -> Self {
        self.scopes.push(scope);
        self
    }

    #[must_use]
    pub fn append_opt(self, scope: Option<Arc<dyn Scope>>) -> Self {
        match scope {
            Some(scope) => self.append(scope),
            None => self,
        }
    }
}

impl Scope for CompoundScope {
    fn lookup(&self, key: &LookupKey) -> NameLookup {
        for scope in self.scopes.iter().rev() {
            match scope.lookup(key) {
                NameLookup::NotFound => continue,
                hit => return hit,
            }
        }
        NameLookup::NotFound
    }
}

impl fmt::Debug for CompoundScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompoundScope({} scopes)", self.scopes.len())
    }
}

/// One package's scope: top-level short names declared in that package.
#[derive(Debug)]
pub struct PackageNode {
    classes: HashMap<Name, ClassSymbol>,
    children: HashMap<Name, Arc<PackageNode>>,
}

impl PackageNode {
    pub fn get(&self, name: &Name) -> Option<&ClassSymbol> {
        self.classes.get(name)
    }

    pub fn child(&self, name: &Name) -> Option<&Arc<PackageNode>> {
        self.children.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.children.is_empty()
    }
}

impl Scope for PackageNode {
    fn lookup(&self, key: &LookupKey) -> NameLookup {
        match self.classes.get(key.first()) {
            Some(sym) => NameLookup::found(sym.clone(), key.rest().to_vec()),
            None => NameLookup::NotFound,
        }
    }
}

/// The global name index: a trie keyed by package segments, with a scope of
/// top-level class names at every node.
///
/// Callers must insert in priority order (sources, then bootclasspath, then
/// classpath) because the first insertion of a short name at a package wins
/// and later duplicates are dropped silently.
#[derive(Debug)]
pub struct TopLevelIndex {
    root: Arc<PackageNode>,
}

impl TopLevelIndex {
    pub fn builder() -> TopLevelIndexBuilder {
        TopLevelIndexBuilder::default()
    }

    /// The scope of a package, or `None` when nothing was inserted there.
    pub fn lookup_package(&self, segments: &[Name]) -> Option<Arc<PackageNode>> {
        let mut node = &self.root;
        for seg in segments {
            node = node.children.get(seg)?;
        }
        Some(node.clone())
    }
}

impl Scope for TopLevelIndex {
    /// Walks the key: segments name sub-packages until one names a class;
    /// the rest are returned unconsumed. A class shadows an equally-named
    /// sub-package at the same node.
    fn lookup(&self, key: &LookupKey) -> NameLookup {
        let mut node = &self.root;
        for (i, seg) in key.segments().iter().enumerate() {
            if let Some(sym) = node.classes.get(seg) {
                return NameLookup::found(sym.clone(), key.segments()[i + 1..].to_vec());
            }
            match node.children.get(seg) {
                Some(child) => node = child,
                None => return NameLookup::NotFound,
            }
        }
        NameLookup::NotFound
    }
}

#[derive(Default)]
struct MutNode {
    classes: HashMap<Name, ClassSymbol>,
    children: HashMap<Name, MutNode>,
}

impl MutNode {
    fn freeze(self) -> Arc<PackageNode> {
        Arc::new(PackageNode {
            classes: self.classes,
            children: self
                .children
                .into_iter()
                .map(|(name, node)| (name, node.freeze()))
                .collect(),
        })
    }
}

#[derive(Default)]
pub struct TopLevelIndexBuilder {
    root: MutNode,
}

impl TopLevelIndexBuilder {
    /// Registers a class symbol. The entry is keyed by the outermost short
    /// name of the class part and maps to the *top-level* symbol, so member
    /// classes may be inserted in any order without clobbering their outer
    /// class. Returns `false` when the short name was already taken.
    pub fn insert(&mut self, sym: &ClassSymbol) -> bool {
        let mut node = &mut self.root;
        for seg in sym.package_segments() {
            node = node.children.entry(seg).or_default();
        }

        let class_part = sym.class_part();
        let top_name = class_part.split('$').next().unwrap_or(class_part);
        let pkg = sym.package_name();
        let top_sym = if pkg.is_empty() {
            ClassSymbol::new(top_name)
        } else {
            ClassSymbol::new(format!("{pkg}/{top_name}"))
        };

        use std::collections::hash_map::Entry;
        match node.classes.entry(Name::from(top_name)) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(top_sym);
                true
            }
        }
    }

    pub fn build(self) -> TopLevelIndex {
        TopLevelIndex {
            root: self.root.freeze(),
        }
    }
}
