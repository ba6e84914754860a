//! Rewrite context - interning for identifiers and terms.
//!
//! The context owns all allocation behind a rewrite system: identifiers
//! are interned through `lasso`, and terms are hashconsed so that
//! structurally equal symbol strings share one [`Term`] id and equality
//! is a pointer-cheap id comparison.

use crate::symbol::{Ident, Symbol};
use crate::term::{compare_symbol_strings, Term};
use hashbrown::HashMap;
use lasso::ThreadedRodeo;
use parking_lot::RwLock;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::sync::Arc;

/// Interner for identifiers and terms.
///
/// Guarantees:
/// - Structurally equal symbol strings get the same [`Term`] id
/// - A [`Term`] id can be resolved back to its symbols
/// - Identifier comparison is by resolved string, not interning order
pub struct RewriteContext {
    names: ThreadedRodeo,
    terms: RwLock<TermTable>,
}

#[derive(Default)]
struct TermTable {
    symbols: Vec<Arc<[Symbol]>>,
    dedup: HashMap<Arc<[Symbol]>, Term>,
}

impl RewriteContext {
    pub fn new() -> Self {
        Self {
            names: ThreadedRodeo::new(),
            terms: RwLock::new(TermTable::default()),
        }
    }

    /// Intern an identifier.
    pub fn ident(&self, name: &str) -> Ident {
        self.names.get_or_intern(name)
    }

    /// Resolve an identifier back to its string.
    pub fn resolve_ident(&self, id: Ident) -> &str {
        self.names.resolve(&id)
    }

    /// Lexicographic comparison of two identifiers.
    pub fn compare_idents(&self, a: Ident, b: Ident) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        self.resolve_ident(a).cmp(self.resolve_ident(b))
    }

    /// Intern a symbol string, returning its [`Term`] id.
    pub fn term(&self, symbols: &[Symbol]) -> Term {
        let mut table = self.terms.write();
        if let Some(&id) = table.dedup.get(symbols) {
            return id;
        }
        let arc: Arc<[Symbol]> = symbols.into();
        let id = Term::from_raw(table.symbols.len() as u32);
        table.symbols.push(arc.clone());
        table.dedup.insert(arc, id);
        id
    }

    /// Resolve a term id to its symbols.
    ///
    /// Panics if the id was not created by this context.
    pub fn term_symbols(&self, term: Term) -> Arc<[Symbol]> {
        let table = self.terms.read();
        table
            .symbols
            .get(term.raw() as usize)
            .unwrap_or_else(|| panic!("unknown term id {}", term.raw()))
            .clone()
    }

    /// Length of an interned term without materializing its symbols.
    pub fn term_len(&self, term: Term) -> usize {
        self.term_symbols(term).len()
    }

    /// Shortlex comparison of two interned terms.
    pub fn compare_terms(&self, lhs: Term, rhs: Term) -> Ordering {
        if lhs == rhs {
            return Ordering::Equal;
        }
        let a = self.term_symbols(lhs);
        let b = self.term_symbols(rhs);
        compare_symbol_strings(&a, &b, self)
    }

    // Symbol constructors. These are conveniences for the completion layer
    // and for tests; symbols can also be built directly.

    pub fn protocol(&self, name: &str) -> Symbol {
        Symbol::Protocol(self.ident(name))
    }

    pub fn name(&self, name: &str) -> Symbol {
        Symbol::Name(self.ident(name))
    }

    pub fn assoc_type(&self, protocol: &str, name: &str) -> Symbol {
        Symbol::AssociatedType {
            protocols: SmallVec::from_slice(&[self.ident(protocol)]),
            name: self.ident(name),
        }
    }

    pub fn generic_param(&self, depth: u32, index: u32) -> Symbol {
        Symbol::GenericParam { depth, index }
    }

    pub fn superclass(&self, class: &str, substitutions: &[Term]) -> Symbol {
        Symbol::Superclass {
            class: self.ident(class),
            substitutions: SmallVec::from_slice(substitutions),
        }
    }

    pub fn concrete_type(&self, name: &str, substitutions: &[Term]) -> Symbol {
        Symbol::ConcreteType {
            name: self.ident(name),
            substitutions: SmallVec::from_slice(substitutions),
        }
    }

    pub fn concrete_conformance(
        &self,
        name: &str,
        substitutions: &[Term],
        protocol: &str,
    ) -> Symbol {
        Symbol::ConcreteConformance {
            name: self.ident(name),
            substitutions: SmallVec::from_slice(substitutions),
            protocol: self.ident(protocol),
        }
    }
}

impl Default for RewriteContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_same_symbols_returns_same_term() {
        let ctx = RewriteContext::new();
        let a = ctx.term(&[ctx.name("a"), ctx.name("b")]);
        let b = ctx.term(&[ctx.name("a"), ctx.name("b")]);
        assert_eq!(a, b, "structurally equal terms should share an id");
    }

    #[test]
    fn interning_different_symbols_returns_different_terms() {
        let ctx = RewriteContext::new();
        let a = ctx.term(&[ctx.name("a")]);
        let b = ctx.term(&[ctx.name("b")]);
        assert_ne!(a, b);
    }

    #[test]
    fn term_resolves_to_original_symbols() {
        let ctx = RewriteContext::new();
        let symbols = [ctx.protocol("P"), ctx.assoc_type("P", "A")];
        let term = ctx.term(&symbols);
        assert_eq!(&*ctx.term_symbols(term), &symbols[..]);
        assert_eq!(ctx.term_len(term), 2);
    }

    #[test]
    fn ident_comparison_is_lexicographic() {
        let ctx = RewriteContext::new();
        // Intern in reverse order; comparison must not follow interning order.
        let z = ctx.ident("z");
        let a = ctx.ident("a");
        assert_eq!(ctx.compare_idents(a, z), Ordering::Less);
    }

    #[test]
    fn shortlex_prefers_shorter_terms() {
        let ctx = RewriteContext::new();
        let short = ctx.term(&[ctx.name("z")]);
        let long = ctx.term(&[ctx.name("a"), ctx.name("a")]);
        assert_eq!(ctx.compare_terms(short, long), Ordering::Less);
    }
}
