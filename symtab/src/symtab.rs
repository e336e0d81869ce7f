//! Scope chains for local variables.
//!
//! The type checker uses a `Scoped` to map local names to their
//! declarations, the interpreter uses one per call frame to map names to
//! their current values.
use std::{collections::HashMap, hash::Hash};

/// SymbolTable associates a Symbol `S` with a stored value `T`.
pub type SymbolTable<S, T> = HashMap<S, T>;

#[derive(Debug, Clone, Copy)]
enum ScopeIdx {
    Root,
    Dynamic(usize),
}

/// Scoped implements scoping for SymbolTable.
///
/// A symbol that is visible cannot be defined again, not even in a nested
/// scope (no shadowing). Once the scope of a definition is left, the
/// symbol can be defined anew.
#[derive(Debug)]
pub struct Scoped<S, T>
where
    S: Hash + Eq + Copy,
{
    root: SymbolTable<S, T>,
    scopes: Vec<SymbolTable<S, T>>,
    visible_defs: HashMap<S, ScopeIdx>,
}

#[derive(Debug)]
pub struct CannotLeaveRootScopeError;
#[derive(Debug)]
pub struct RedefinitionError;
#[derive(Debug)]
pub struct UndefinedSymbolError;

impl<S, T> Default for Scoped<S, T>
where
    S: Hash + Eq + Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S, T> Scoped<S, T>
where
    S: Hash + Eq + Copy,
{
    pub fn new() -> Self {
        Scoped {
            root: SymbolTable::new(),
            scopes: Vec::new(),
            visible_defs: HashMap::new(),
        }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(SymbolTable::new())
    }

    pub fn leave_scope(&mut self) -> Result<(), CannotLeaveRootScopeError> {
        let popped = self.scopes.pop().ok_or(CannotLeaveRootScopeError)?;
        for sym in popped.keys() {
            let removed = self.visible_defs.remove(sym);
            debug_assert!(removed.is_some(), "scopes inconsistent with visible_defs");
        }
        Ok(())
    }

    /// Number of scopes entered on top of the root scope.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn define(&mut self, sym: S, val: T) -> Result<(), RedefinitionError> {
        if self.visible_defs.contains_key(&sym) {
            return Err(RedefinitionError);
        }
        let (current_scope, scope_idx) = self.current_scope();
        let insert_res = current_scope.insert(sym, val);
        debug_assert!(
            insert_res.is_none(),
            "current_scope must be consistent with visible_defs"
        );
        self.visible_defs.insert(sym, scope_idx);
        Ok(())
    }

    pub fn visible_definition(&self, sym: S) -> Option<&T> {
        let idx = *self.visible_defs.get(&sym)?;
        self.get_scope(idx).get(&sym)
    }

    pub fn visible_definition_mut(&mut self, sym: S) -> Option<&mut T> {
        let idx = *self.visible_defs.get(&sym)?;
        self.get_scope_mut(idx).get_mut(&sym)
    }

    /// Replace the value of a visible definition, wherever it was defined.
    pub fn update(&mut self, sym: S, val: T) -> Result<T, UndefinedSymbolError> {
        let slot = self.visible_definition_mut(sym).ok_or(UndefinedSymbolError)?;
        Ok(std::mem::replace(slot, val))
    }

    pub fn visible_symbols<'a>(&'a self) -> impl Iterator<Item = S> + 'a {
        self.visible_defs.keys().cloned()
    }

    fn current_scope(&mut self) -> (&mut SymbolTable<S, T>, ScopeIdx) {
        match self.scopes.len() {
            0 => (&mut self.root, ScopeIdx::Root),
            len => (&mut self.scopes[len - 1], ScopeIdx::Dynamic(len - 1)),
        }
    }

    fn get_scope(&self, scope_idx: ScopeIdx) -> &SymbolTable<S, T> {
        match scope_idx {
            ScopeIdx::Root => &self.root,
            ScopeIdx::Dynamic(idx) => &self.scopes[idx],
        }
    }

    fn get_scope_mut(&mut self, scope_idx: ScopeIdx) -> &mut SymbolTable<S, T> {
        match scope_idx {
            ScopeIdx::Root => &mut self.root,
            ScopeIdx::Dynamic(idx) => &mut self.scopes[idx],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use utils::assert_matches;

    macro_rules! def {
        ($scoped:expr, $s:expr) => {
            $scoped.define($s, ()).unwrap();
            $scoped
                .visible_definition($s)
                .expect("just defined successfully, should be visible");
        };
    }

    macro_rules! assert_def {
        ($scoped:expr, $s:expr) => {
            $scoped
                .visible_definition($s)
                .expect(&format!("expecting visible definition for {:?}", $s));
        };
    }

    macro_rules! assert_no_def {
        ($scoped:expr, $s:expr) => {
            assert_matches!($scoped.visible_definition($s), None);
        };
    }

    #[test]
    fn inner_scopes_see_outer_definitions() {
        let mut scoped = Scoped::new();
        def!(scoped, "param");
        scoped.enter_scope();
        def!(scoped, "local");
        scoped.enter_scope();
        def!(scoped, "loop_var");
        assert_eq!(2, scoped.depth());

        assert_def!(scoped, "param");
        assert_def!(scoped, "local");
        assert_def!(scoped, "loop_var");
        scoped.leave_scope().expect("not in root scope");

        assert_def!(scoped, "local");
        assert_no_def!(scoped, "loop_var");
        scoped.leave_scope().expect("not in root scope");

        assert_def!(scoped, "param");
        assert_no_def!(scoped, "local");
    }

    #[test]
    fn sibling_scopes_may_reuse_names() {
        let mut scoped = Scoped::new();
        scoped.enter_scope();
        def!(scoped, "i");
        scoped.leave_scope().expect("not in root scope");
        scoped.enter_scope();
        def!(scoped, "i");
        scoped.leave_scope().expect("not in root scope");
    }

    #[test]
    fn no_shadowing() {
        let mut scoped = Scoped::new();
        def!(scoped, "x");
        scoped.enter_scope();
        assert_matches!(scoped.define("x", ()), Err(RedefinitionError));
    }

    #[test]
    fn update_reaches_outer_scope() {
        let mut scoped = Scoped::new();
        scoped.define("sum", 0).unwrap();
        scoped.enter_scope();
        scoped.define("i", 1).unwrap();
        assert_eq!(0, scoped.update("sum", 5).unwrap());
        *scoped.visible_definition_mut("i").unwrap() += 1;
        scoped.leave_scope().unwrap();

        assert_eq!(Some(&5), scoped.visible_definition("sum"));
        assert_matches!(scoped.update("i", 3), Err(UndefinedSymbolError));
        assert_eq!(vec!["sum"], scoped.visible_symbols().collect::<Vec<_>>());
    }

    #[test]
    fn leaving_root_scope_fails() {
        let mut scoped: Scoped<(), ()> = Scoped::new();
        scoped.enter_scope();
        scoped.leave_scope().unwrap();
        assert_matches!(scoped.leave_scope(), Err(CannotLeaveRootScopeError));
    }
}
