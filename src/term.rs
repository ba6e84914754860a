//! Terms - immutable and mutable symbol strings.
//!
//! A [`Term`] is an interned id into the rewrite context; equality is an
//! id comparison. A [`MutableTerm`] is the working buffer the path
//! evaluator rewrites in place, convertible to and from interned terms.
//!
//! The term order is shortlex: shorter terms compare smaller, terms of
//! equal length compare symbolwise. Rules are oriented so that the left
//! hand side is the larger term.

use crate::context::RewriteContext;
use crate::symbol::Symbol;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::ops::{Index, Range};
use std::sync::Arc;

/// Unique identifier for an interned term.
/// Term ids are stable and can be compared for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Term(u32);

impl Term {
    /// Get the raw u32 value (for debugging/display).
    pub fn raw(self) -> u32 {
        self.0
    }

    pub(crate) fn from_raw(raw: u32) -> Self {
        Term(raw)
    }

    /// The symbols of this term.
    pub fn symbols(self, ctx: &RewriteContext) -> Arc<[Symbol]> {
        ctx.term_symbols(self)
    }

    /// Number of symbols in this term.
    pub fn len(self, ctx: &RewriteContext) -> usize {
        ctx.term_len(self)
    }

    pub fn is_empty(self, ctx: &RewriteContext) -> bool {
        self.len(ctx) == 0
    }

    /// True if any symbol of this term is an unresolved name, including
    /// names nested in substitution terms.
    pub fn contains_unresolved_symbols(self, ctx: &RewriteContext) -> bool {
        self.symbols(ctx)
            .iter()
            .any(|s| s.contains_unresolved_symbols(ctx))
    }

    /// Shortlex comparison.
    pub fn compare(self, other: Term, ctx: &RewriteContext) -> Ordering {
        ctx.compare_terms(self, other)
    }
}

/// Shortlex order on raw symbol strings: length first, then symbolwise.
pub(crate) fn compare_symbol_strings(
    a: &[Symbol],
    b: &[Symbol],
    ctx: &RewriteContext,
) -> Ordering {
    match a.len().cmp(&b.len()) {
        Ordering::Equal => {}
        ord => return ord,
    }
    for (x, y) in a.iter().zip(b.iter()) {
        match x.compare(y, ctx) {
            Ordering::Equal => {}
            ord => return ord,
        }
    }
    Ordering::Equal
}

/// A mutable symbol string, used as the evaluator's working buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MutableTerm {
    symbols: SmallVec<[Symbol; 3]>,
}

impl MutableTerm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_slice(symbols: &[Symbol]) -> Self {
        Self {
            symbols: symbols.iter().cloned().collect(),
        }
    }

    /// Materialize an interned term into a working buffer.
    pub fn from_term(term: Term, ctx: &RewriteContext) -> Self {
        Self::from_slice(&term.symbols(ctx))
    }

    /// Intern the current contents.
    pub fn intern(&self, ctx: &RewriteContext) -> Term {
        ctx.term(&self.symbols)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn last(&self) -> Option<&Symbol> {
        self.symbols.last()
    }

    pub fn last_mut(&mut self) -> Option<&mut Symbol> {
        self.symbols.last_mut()
    }

    pub fn push(&mut self, symbol: Symbol) {
        self.symbols.push(symbol);
    }

    pub fn pop(&mut self) -> Option<Symbol> {
        self.symbols.pop()
    }

    /// Replace the symbols in `range` with `replacement`.
    ///
    /// This is the primitive behind whiskered rule application: the range
    /// is the rule's match site, the replacement is the other side.
    pub fn replace_range(&mut self, range: Range<usize>, replacement: &[Symbol]) {
        debug_assert!(range.start <= range.end && range.end <= self.symbols.len());
        let mut next: SmallVec<[Symbol; 3]> =
            SmallVec::with_capacity(self.symbols.len() - range.len() + replacement.len());
        next.extend(self.symbols[..range.start].iter().cloned());
        next.extend(replacement.iter().cloned());
        next.extend(self.symbols[range.end..].iter().cloned());
        self.symbols = next;
    }

    pub fn contains_unresolved_symbols(&self, ctx: &RewriteContext) -> bool {
        self.symbols
            .iter()
            .any(|s| s.contains_unresolved_symbols(ctx))
    }

    /// Shortlex comparison.
    pub fn compare(&self, other: &MutableTerm, ctx: &RewriteContext) -> Ordering {
        compare_symbol_strings(&self.symbols, &other.symbols, ctx)
    }
}

impl Index<usize> for MutableTerm {
    type Output = Symbol;

    fn index(&self, index: usize) -> &Symbol {
        &self.symbols[index]
    }
}

/// Render a symbol string with `.` separators.
pub fn format_term(symbols: &[Symbol], ctx: &RewriteContext) -> String {
    let rendered: Vec<String> = symbols
        .iter()
        .map(|s| crate::symbol::format_symbol(s, ctx))
        .collect();
    rendered.join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RewriteContext;

    fn ctx() -> RewriteContext {
        RewriteContext::new()
    }

    #[test]
    fn mutable_term_round_trips_through_interning() {
        let ctx = ctx();
        let term = ctx.term(&[ctx.name("a"), ctx.name("b")]);
        let mutable = MutableTerm::from_term(term, &ctx);
        assert_eq!(mutable.len(), 2);
        assert_eq!(mutable.intern(&ctx), term);
    }

    #[test]
    fn replace_range_substitutes_an_infix() {
        let ctx = ctx();
        let mut term = MutableTerm::from_slice(&[
            ctx.name("a"),
            ctx.name("x"),
            ctx.name("y"),
            ctx.name("b"),
        ]);
        term.replace_range(1..3, &[ctx.name("z")]);
        assert_eq!(
            term.symbols(),
            &[ctx.name("a"), ctx.name("z"), ctx.name("b")]
        );
    }

    #[test]
    fn replace_range_with_empty_replacement_deletes() {
        let ctx = ctx();
        let mut term = MutableTerm::from_slice(&[ctx.name("a"), ctx.name("b")]);
        term.replace_range(1..2, &[]);
        assert_eq!(term.symbols(), &[ctx.name("a")]);
    }

    #[test]
    fn shortlex_orders_by_length_then_symbols() {
        let ctx = ctx();
        let ab = MutableTerm::from_slice(&[ctx.name("a"), ctx.name("b")]);
        let ac = MutableTerm::from_slice(&[ctx.name("a"), ctx.name("c")]);
        let a = MutableTerm::from_slice(&[ctx.name("a")]);
        assert_eq!(a.compare(&ab, &ctx), Ordering::Less);
        assert_eq!(ab.compare(&ac, &ctx), Ordering::Less);
        assert_eq!(ab.compare(&ab, &ctx), Ordering::Equal);
    }

    #[test]
    fn unresolved_detection_covers_nested_substitutions() {
        let ctx = ctx();
        let nested = ctx.term(&[ctx.name("X")]);
        let term = MutableTerm::from_slice(&[
            ctx.assoc_type("P", "A"),
            ctx.concrete_type("Array", &[nested]),
        ]);
        assert!(term.contains_unresolved_symbols(&ctx));
    }

    #[test]
    fn format_joins_symbols_with_dots() {
        let ctx = ctx();
        let term = MutableTerm::from_slice(&[ctx.protocol("P"), ctx.assoc_type("P", "A")]);
        assert_eq!(format_term(term.symbols(), &ctx), "[P].[P:A]");
    }
}
