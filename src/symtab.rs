//! Symbol table: an owned stack of scope frames rather than a parent-pointer
//! object chain.

use crate::types::Type;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    Var,
    Const,
    Label,
    TypeName,
    Function,
    Procedure,
    EnumMember,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Type,
    /// Parameter (name, type) pairs, for callables.
    pub params: Vec<(String, Type)>,
    /// Declared return type, for functions.
    pub return_type: Option<Type>,
}

impl Symbol {
    pub fn simple(name: impl Into<String>, kind: SymbolKind, ty: Type) -> Self {
        Symbol { name: name.into(), kind, ty, params: Vec::new(), return_type: None }
    }
}

/// A stack of lexical scopes, innermost last. Name resolution walks from the
/// last frame toward the first.
pub struct ScopeStack {
    frames: Vec<HashMap<String, Symbol>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        let mut stack = ScopeStack { frames: vec![HashMap::new()] };
        stack.install_builtins();
        stack
    }

    fn install_builtins(&mut self) {
        for name in ["write", "writeln", "read", "readln"] {
            self.define_global(Symbol::simple(name, SymbolKind::Procedure, Type::Boolean));
        }
        let mut real_cast = Symbol::simple("real", SymbolKind::Function, Type::Real);
        real_cast.params = vec![("x".to_string(), Type::Integer)];
        real_cast.return_type = Some(Type::Real);
        self.define_global(real_cast);
    }

    fn define_global(&mut self, symbol: Symbol) {
        self.frames[0].insert(symbol.name.clone(), symbol);
    }

    pub fn push_scope(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        self.frames.pop();
    }

    /// Defines a symbol in the current (innermost) scope. Returns `false` if
    /// a symbol with the same canonical name already exists in this scope.
    pub fn define(&mut self, symbol: Symbol) -> bool {
        let frame = self.frames.last_mut().expect("at least one scope frame");
        if frame.contains_key(&symbol.name) {
            return false;
        }
        frame.insert(symbol.name.clone(), symbol);
        true
    }

    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        for frame in self.frames.iter().rev() {
            if let Some(sym) = frame.get(name) {
                return Some(sym);
            }
        }
        None
    }

    /// True if `name` is already declared in the *innermost* scope only.
    pub fn declared_locally(&self, name: &str) -> bool {
        self.frames.last().map(|f| f.contains_key(name)).unwrap_or(false)
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scope_shadows_outer() {
        let mut scopes = ScopeStack::new();
        scopes.define(Symbol::simple("x", SymbolKind::Var, Type::Integer));
        scopes.push_scope();
        scopes.define(Symbol::simple("x", SymbolKind::Var, Type::Real));
        assert_eq!(scopes.resolve("x").unwrap().ty, Type::Real);
        scopes.pop_scope();
        assert_eq!(scopes.resolve("x").unwrap().ty, Type::Integer);
    }

    #[test]
    fn redefining_in_the_same_scope_is_rejected() {
        let mut scopes = ScopeStack::new();
        assert!(scopes.define(Symbol::simple("x", SymbolKind::Var, Type::Integer)));
        assert!(!scopes.define(Symbol::simple("x", SymbolKind::Var, Type::Integer)));
    }

    #[test]
    fn declared_locally_ignores_outer_scopes() {
        let mut scopes = ScopeStack::new();
        scopes.define(Symbol::simple("x", SymbolKind::Var, Type::Integer));
        scopes.push_scope();
        assert!(!scopes.declared_locally("x"));
    }

    #[test]
    fn builtin_procedures_are_preinstalled() {
        let scopes = ScopeStack::new();
        assert_eq!(scopes.resolve("writeln").unwrap().kind, SymbolKind::Procedure);
    }
}
