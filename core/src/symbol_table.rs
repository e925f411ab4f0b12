//! Lexically nested scopes shared by the type checker, interpreter, and IR
//! generator. Each pass instantiates its own `SymbolTable<V>` over whatever
//! payload it tracks (`Type`, runtime `Value`, or `IRVar`).

use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    AlreadyDefined(String),
    Undefined(String),
    PopRoot,
}

impl fmt::Display for SymbolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolError::AlreadyDefined(name) => {
                write!(f, "'{name}' is already defined in this scope")
            }
            SymbolError::Undefined(name) => write!(f, "undefined name '{name}'"),
            SymbolError::PopRoot => write!(f, "cannot pop the root scope"),
        }
    }
}

impl std::error::Error for SymbolError {}

/// A stack of scopes. `define` inserts into the innermost scope;
/// `lookup`/`assign` walk outward from the innermost scope to the root.
pub struct SymbolTable<V> {
    scopes: Vec<HashMap<String, V>>,
}

impl<V> SymbolTable<V> {
    /// A fresh table with a single, empty root scope.
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![HashMap::new()],
        }
    }

    /// A fresh table whose root scope is pre-seeded, e.g. with built-ins.
    pub fn with_root(root: HashMap<String, V>) -> Self {
        SymbolTable {
            scopes: vec![root],
        }
    }

    /// Enter a new, empty scope.
    pub fn push(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Leave the innermost scope. Errors if called on the root scope.
    pub fn pop(&mut self) -> Result<(), SymbolError> {
        if self.scopes.len() <= 1 {
            return Err(SymbolError::PopRoot);
        }
        self.scopes.pop();
        Ok(())
    }

    /// Insert `name` into the innermost scope. Errors if `name` is already
    /// defined in that same scope (shadowing an outer scope is fine).
    pub fn define(&mut self, name: &str, value: V) -> Result<(), SymbolError> {
        let innermost = self
            .scopes
            .last_mut()
            .expect("symbol table always has at least the root scope");
        if innermost.contains_key(name) {
            return Err(SymbolError::AlreadyDefined(name.to_string()));
        }
        innermost.insert(name.to_string(), value);
        Ok(())
    }

    /// Walk outward from the innermost scope and return the first binding.
    pub fn lookup(&self, name: &str) -> Option<&V> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// True if `name` is bound in the innermost scope specifically
    /// (as opposed to an enclosing one).
    pub fn defined_locally(&self, name: &str) -> bool {
        self.scopes
            .last()
            .is_some_and(|scope| scope.contains_key(name))
    }

    /// Walk outward to find the scope owning `name` and overwrite its
    /// binding. Errors if `name` is undefined anywhere on the chain.
    pub fn assign(&mut self, name: &str, value: V) -> Result<(), SymbolError> {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.get_mut(name) {
                *slot = value;
                return Ok(());
            }
        }
        Err(SymbolError::Undefined(name.to_string()))
    }
}

impl<V> Default for SymbolTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadowing_across_scopes_is_allowed() {
        let mut st: SymbolTable<i32> = SymbolTable::new();
        st.define("x", 1).unwrap();
        st.push();
        st.define("x", 2).unwrap();
        assert_eq!(st.lookup("x"), Some(&2));
        st.pop().unwrap();
        assert_eq!(st.lookup("x"), Some(&1));
    }

    #[test]
    fn redefining_in_same_scope_errors() {
        let mut st: SymbolTable<i32> = SymbolTable::new();
        st.define("x", 1).unwrap();
        assert_eq!(
            st.define("x", 2),
            Err(SymbolError::AlreadyDefined("x".to_string()))
        );
    }

    #[test]
    fn assign_walks_to_owning_scope() {
        let mut st: SymbolTable<i32> = SymbolTable::new();
        st.define("x", 1).unwrap();
        st.push();
        st.assign("x", 42).unwrap();
        st.pop().unwrap();
        assert_eq!(st.lookup("x"), Some(&42));
    }

    #[test]
    fn assign_undefined_errors() {
        let mut st: SymbolTable<i32> = SymbolTable::new();
        assert_eq!(
            st.assign("x", 1),
            Err(SymbolError::Undefined("x".to_string()))
        );
    }

    #[test]
    fn pop_root_errors() {
        let mut st: SymbolTable<i32> = SymbolTable::new();
        assert_eq!(st.pop(), Err(SymbolError::PopRoot));
    }
}
