//! Rewrite rules and their lifecycle flags.
//!
//! A rule replaces occurrences of its left hand side with its right hand
//! side; the left hand side is always the larger term in the shortlex
//! order. Rules are never removed from the store - minimization and
//! simplification flip flags instead, so rule ids stay stable and loops
//! can keep referring to rules by id.

use crate::context::RewriteContext;
use crate::symbol::{Ident, Symbol, SymbolKind};
use crate::term::Term;
use std::cmp::Ordering;

/// Unique identifier for a rule in the rewrite system.
///
/// Ids are assigned densely in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(u32);

impl RuleId {
    /// Get the raw u32 value (for debugging/display).
    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn from_raw(raw: u32) -> Self {
        RuleId(raw)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A rewrite rule `lhs => rhs` with `lhs > rhs` in the term order.
#[derive(Debug, Clone)]
pub struct Rule {
    lhs: Term,
    rhs: Term,

    /// A permanent rule cannot be deleted by homotopy reduction. These do
    /// not correspond to generic requirements and are re-added whenever a
    /// rewrite system is rebuilt.
    permanent: bool,

    /// An explicit rule is a requirement written by the user.
    explicit: bool,

    /// A simplified rule was superseded during completion. Simplified
    /// rules do not participate in term rewriting.
    simplified: bool,

    /// A redundant rule was eliminated by homotopy reduction. Redundant
    /// rules still participate in rewriting, but are not part of the
    /// minimal set of requirements.
    redundant: bool,

    /// A conflicting rule is a property rule unsatisfiable by any concrete
    /// type; it is dropped from the minimized output.
    conflicting: bool,
}

impl Rule {
    pub fn new(lhs: Term, rhs: Term) -> Self {
        Self {
            lhs,
            rhs,
            permanent: false,
            explicit: false,
            simplified: false,
            redundant: false,
            conflicting: false,
        }
    }

    pub fn lhs(&self) -> Term {
        self.lhs
    }

    pub fn rhs(&self) -> Term {
        self.rhs
    }

    pub fn is_permanent(&self) -> bool {
        self.permanent
    }

    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    pub fn is_simplified(&self) -> bool {
        self.simplified
    }

    pub fn is_redundant(&self) -> bool {
        self.redundant
    }

    pub fn is_conflicting(&self) -> bool {
        self.conflicting
    }

    pub fn mark_permanent(&mut self) {
        assert!(
            !self.explicit && !self.permanent,
            "permanent and explicit are mutually exclusive"
        );
        self.permanent = true;
    }

    pub fn mark_explicit(&mut self) {
        assert!(
            !self.explicit && !self.permanent,
            "permanent and explicit are mutually exclusive"
        );
        self.explicit = true;
    }

    pub fn mark_simplified(&mut self) {
        assert!(!self.simplified, "rule is already simplified");
        self.simplified = true;
    }

    pub fn mark_redundant(&mut self) {
        assert!(!self.redundant, "rule is already redundant");
        assert!(!self.permanent, "permanent rule cannot be redundant");
        self.redundant = true;
    }

    pub fn mark_conflicting(&mut self) {
        // A rule may conflict with several others; marking repeatedly is fine.
        assert!(
            !self.permanent,
            "permanent rule should not conflict with anything"
        );
        self.conflicting = true;
    }

    pub fn contains_unresolved_symbols(&self, ctx: &RewriteContext) -> bool {
        self.lhs.contains_unresolved_symbols(ctx) || self.rhs.contains_unresolved_symbols(ctx)
    }

    /// If this is a property rule `T.[p] => T`, return the property symbol.
    pub fn is_property_rule(&self, ctx: &RewriteContext) -> Option<Symbol> {
        let lhs = self.lhs.symbols(ctx);
        let rhs = self.rhs.symbols(ctx);

        let property = lhs.last()?;
        if !property.is_property() {
            return None;
        }
        if lhs.len() != rhs.len() + 1 {
            return None;
        }
        if lhs[..rhs.len()] != rhs[..] {
            return None;
        }
        Some(property.clone())
    }

    /// If this is a protocol conformance rule `T.[P] => T`, return the
    /// protocol.
    pub fn is_protocol_conformance_rule(&self, ctx: &RewriteContext) -> Option<Ident> {
        match self.is_property_rule(ctx) {
            Some(Symbol::Protocol(p)) => Some(p),
            _ => None,
        }
    }

    /// True for protocol conformance rules and concrete conformance rules.
    pub fn is_any_conformance_rule(&self, ctx: &RewriteContext) -> bool {
        matches!(
            self.is_property_rule(ctx).map(|s| s.kind()),
            Some(SymbolKind::Protocol) | Some(SymbolKind::ConcreteConformance)
        )
    }

    /// True for the identity conformance `[P].[P] => [P]`.
    pub fn is_identity_conformance_rule(&self, ctx: &RewriteContext) -> bool {
        let lhs = self.lhs.symbols(ctx);
        let rhs = self.rhs.symbols(ctx);
        lhs.len() == 2
            && rhs.len() == 1
            && lhs[0] == rhs[0]
            && lhs[0] == lhs[1]
            && lhs[0].kind() == SymbolKind::Protocol
    }

    /// Total order on rules: left hand sides first, then right hand sides.
    /// Rules comparing larger are less canonical; minimization prefers to
    /// delete them.
    pub fn compare(&self, other: &Rule, ctx: &RewriteContext) -> Ordering {
        ctx.compare_terms(self.lhs, other.lhs)
            .then_with(|| ctx.compare_terms(self.rhs, other.rhs))
    }
}

/// Render a rule as `lhs => rhs` with any set flags appended.
pub fn format_rule(rule: &Rule, ctx: &RewriteContext) -> String {
    let mut out = format!(
        "{} => {}",
        crate::term::format_term(&rule.lhs.symbols(ctx), ctx),
        crate::term::format_term(&rule.rhs.symbols(ctx), ctx)
    );
    if rule.permanent {
        out.push_str(" [permanent]");
    }
    if rule.explicit {
        out.push_str(" [explicit]");
    }
    if rule.simplified {
        out.push_str(" [simplified]");
    }
    if rule.redundant {
        out.push_str(" [redundant]");
    }
    if rule.conflicting {
        out.push_str(" [conflicting]");
    }
    out
}
