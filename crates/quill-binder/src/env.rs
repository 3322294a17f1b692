//! Environments: partial functions from symbol to partially-bound entity.
//!
//! Three variants compose the pipeline: [`SimpleEnv`] (eager), [`CompoundEnv`]
//! (chained lookup, leftmost wins), and [`LazyEnv`] (on-demand completion
//! with cycle detection). Values are cheap to clone (`Arc`s or small view
//! enums), so `get` hands out owned copies.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Raised when a lazy completion re-enters a symbol whose completion is
/// already in progress. The chain runs from the re-entered symbol to the
/// point of re-entry, so it names exactly the members of the cycle.
#[derive(Clone, PartialEq, Eq)]
pub struct CycleError<S> {
    pub chain: Vec<S>,
}

impl<S> CycleError<S> {
    pub fn contains(&self, sym: &S) -> bool
    where
        S: PartialEq,
    {
        self.chain.contains(sym)
    }
}

impl<S: fmt::Display> fmt::Display for CycleError<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cycle: ")?;
        for (i, sym) in self.chain.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{sym}")?;
        }
        Ok(())
    }
}

impl<S: fmt::Display> fmt::Debug for CycleError<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

pub trait Env<S, V> {
    /// Returns the entity for `sym`, `None` when absent, or the cycle signal
    /// when a lazy completion re-entered itself.
    fn get(&self, sym: &S) -> Result<Option<V>, CycleError<S>>;
}

/// An eager map environment.
#[derive(Debug, Clone)]
pub struct SimpleEnv<S, V> {
    map: HashMap<S, V>,
}

impl<S: Eq + Hash, V> SimpleEnv<S, V> {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// First insert wins; returns `false` when `sym` was already present.
    pub fn insert(&mut self, sym: S, value: V) -> bool {
        use std::collections::hash_map::Entry;
        match self.map.entry(sym) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    pub fn contains(&self, sym: &S) -> bool {
        self.map.contains_key(sym)
    }

    pub fn get_ref(&self, sym: &S) -> Option<&V> {
        self.map.get(sym)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<S: Eq + Hash, V> Default for SimpleEnv<S, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Eq + Hash, V: Clone> Env<S, V> for SimpleEnv<S, V> {
    fn get(&self, sym: &S) -> Result<Option<V>, CycleError<S>> {
        Ok(self.map.get(sym).cloned())
    }
}

/// A chain of environments; `of(a).append(b)` consults `a` first and `b`
/// only when `a` has no entry. Append is associative and left-biased.
pub struct CompoundEnv<'e, S, V> {
    envs: Vec<&'e dyn Env<S, V>>,
}

impl<'e, S, V> CompoundEnv<'e, S, V> {
    pub fn of(env: &'e dyn Env<S, V>) -> Self {
        Self { envs: vec![env] }
    }

    #[must_use]
    pub fn append(mut self, env: &'e dyn Env<S, V>) -> Self {
        self.envs.push(env);
        self
    }
}

impl<S, V> Env<S, V> for CompoundEnv<'_, S, V> {
    fn get(&self, sym: &S) -> Result<Option<V>, CycleError<S>> {
        for env in &self.envs {
            if let Some(value) = env.get(sym)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}

/// A completer produces the entity for one symbol, recursively reading other
/// symbols through the environment it is handed. Returning `Ok(None)`
/// publishes "no entity" (e.g. a field that turned out not to be constant).
pub type Completer<'e, S, V> =
    Box<dyn Fn(&dyn Env<S, V>, &S) -> Result<Option<V>, CycleError<S>> + 'e>;

/// On-demand completion with memoization and cycle detection.
///
/// Symbols without a completer delegate to the base environment. Completion
/// is single-threaded and re-entrant: a completer that (transitively) asks
/// for a symbol already being completed gets the cycle signal. Successful
/// completions (including `None`) are memoized; failures are not: they
/// poison only the requested symbol and re-surface on each request.
pub struct LazyEnv<'e, S: Eq + Hash + Clone, V: Clone> {
    completers: HashMap<S, Completer<'e, S, V>>,
    base: &'e dyn Env<S, V>,
    cache: RefCell<HashMap<S, Option<V>>>,
    in_progress: RefCell<Vec<S>>,
}

impl<'e, S: Eq + Hash + Clone, V: Clone> LazyEnv<'e, S, V> {
    pub fn new(completers: HashMap<S, Completer<'e, S, V>>, base: &'e dyn Env<S, V>) -> Self {
        Self {
            completers,
            base,
            cache: RefCell::new(HashMap::new()),
            in_progress: RefCell::new(Vec::new()),
        }
    }
}

impl<S: Eq + Hash + Clone, V: Clone> Env<S, V> for LazyEnv<'_, S, V> {
    fn get(&self, sym: &S) -> Result<Option<V>, CycleError<S>> {
        if let Some(done) = self.cache.borrow().get(sym) {
            return Ok(done.clone());
        }
        let Some(completer) = self.completers.get(sym) else {
            return self.base.get(sym);
        };
        {
            let stack = self.in_progress.borrow();
            if let Some(start) = stack.iter().position(|s| s == sym) {
                return Err(CycleError {
                    chain: stack[start..].to_vec(),
                });
            }
        }

        self.in_progress.borrow_mut().push(sym.clone());
        let result = completer(self, sym);
        self.in_progress.borrow_mut().pop();

        match result {
            Ok(value) => {
                self.cache.borrow_mut().insert(sym.clone(), value.clone());
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }
}
