//! The rewrite system - rule store, loop store, and witness table.
//!
//! Rules and loops are appended by the completion layer and referred to by
//! stable small-integer ids; nothing is ever removed from storage. After
//! completion hands the system over (`mark_complete`), minimization flips
//! flags in place and downstream readers filter by them.

use crate::context::RewriteContext;
use crate::loops::RewriteLoop;
use crate::path::RewritePath;
use crate::rule::{Rule, RuleId};
use crate::symbol::Symbol;
use crate::term::MutableTerm;
use crate::trie::Trie;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use crate::trace::trace;

/// Debug flags controlling human-readable dumps on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct DebugOptions {
    /// Dump each deleted rule and each updated loop during minimization.
    pub homotopy_reduction: bool,
}

/// A concrete type witness: the concrete type of an associated type in a
/// concrete conformance, backing the two witness step kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcreteTypeWitness {
    pub concrete_conformance: Symbol,
    pub assoc_type: Symbol,
    pub concrete_type: Symbol,
}

/// A term rewrite system over symbol strings.
pub struct RewriteSystem {
    pub(crate) ctx: Arc<RewriteContext>,

    /// Rules added so far, in insertion order. Ids index this vector.
    pub(crate) rules: Vec<Rule>,

    /// Prefix trie of rule left hand sides, for duplicate detection and
    /// for the completion layer's reduction lookups.
    trie: Trie,

    /// Loops recorded while resolving critical pairs.
    pub(crate) loops: Vec<RewriteLoop>,

    /// Cache for concrete type witnesses; the map deduplicates by
    /// (conformance, associated type).
    witnesses: Vec<ConcreteTypeWitness>,
    witness_map: FxHashMap<(Symbol, Symbol), u32>,

    pub(crate) debug: DebugOptions,

    /// Whether the completion layer has handed the system over.
    pub(crate) complete: bool,

    /// Whether the system has been minimized.
    pub(crate) minimized: bool,

    /// If unset, `record_loop` drops loops instead of storing them.
    record_loops: bool,
}

impl RewriteSystem {
    pub fn new(ctx: Arc<RewriteContext>) -> Self {
        Self {
            ctx,
            rules: Vec::new(),
            trie: Trie::new(),
            loops: Vec::new(),
            witnesses: Vec::new(),
            witness_map: FxHashMap::default(),
            debug: DebugOptions::default(),
            complete: false,
            minimized: false,
            record_loops: true,
        }
    }

    pub fn ctx(&self) -> &RewriteContext {
        &self.ctx
    }

    pub fn set_debug_options(&mut self, debug: DebugOptions) {
        self.debug = debug;
    }

    pub fn set_record_loops(&mut self, record_loops: bool) {
        self.record_loops = record_loops;
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.index()]
    }

    pub(crate) fn rule_mut(&mut self, id: RuleId) -> &mut Rule {
        &mut self.rules[id.index()]
    }

    pub fn loops(&self) -> &[RewriteLoop] {
        &self.loops
    }

    /// Add a rule, orienting it so the left hand side is the larger term.
    ///
    /// Returns false without adding anything when the two sides are equal
    /// or the oriented rule is already present.
    pub fn add_rule(&mut self, lhs: MutableTerm, rhs: MutableTerm) -> bool {
        assert!(!self.minimized, "cannot add rules after minimization");

        let (lhs, rhs) = match lhs.compare(&rhs, &self.ctx) {
            Ordering::Equal => return false,
            Ordering::Less => (rhs, lhs),
            Ordering::Greater => (lhs, rhs),
        };

        let lhs_term = lhs.intern(&self.ctx);
        let rhs_term = rhs.intern(&self.ctx);

        if let Some(existing) = self.trie.find_exact(lhs.symbols()) {
            if self.rules[existing.index()].rhs() == rhs_term {
                return false;
            }
        }

        let id = RuleId::from_raw(self.rules.len() as u32);
        #[cfg(feature = "tracing")]
        trace!(rule = id.raw(), "add_rule");

        self.rules.push(Rule::new(lhs_term, rhs_term));
        self.trie.insert(lhs.symbols(), id);
        true
    }

    /// Add a permanent rule (an associated type introduction rule); these
    /// are re-added on every rebuild and never deleted by minimization.
    pub fn add_permanent_rule(&mut self, lhs: MutableTerm, rhs: MutableTerm) -> bool {
        let added = self.add_rule(lhs, rhs);
        if added {
            self.rules.last_mut().unwrap().mark_permanent();
        }
        added
    }

    /// Add an explicit rule (a user-written requirement).
    pub fn add_explicit_rule(&mut self, lhs: MutableTerm, rhs: MutableTerm) -> bool {
        let added = self.add_rule(lhs, rhs);
        if added {
            self.rules.last_mut().unwrap().mark_explicit();
        }
        added
    }

    /// The rule whose left hand side is the shortest marked prefix of
    /// `symbols`, if any. The completion layer uses this to find the rule
    /// reducing a term at a given position.
    pub fn rule_matching_prefix(&self, symbols: &[Symbol]) -> Option<RuleId> {
        self.trie.find_shortest(symbols)
    }

    /// Record a rewrite loop discovered while resolving a critical pair.
    pub fn record_loop(&mut self, basepoint: MutableTerm, path: RewritePath) {
        if !self.record_loops {
            return;
        }
        self.loops.push(RewriteLoop::new(basepoint, path));
    }

    /// Completion hand-off: the system is confluent, rules and loops are
    /// final, and minimization may run.
    pub fn mark_complete(&mut self) {
        assert!(!self.complete, "system is already complete");
        self.complete = true;
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    pub(crate) fn set_minimized(&mut self) {
        self.minimized = true;
    }

    /// Record a concrete type witness, deduplicating by conformance and
    /// associated type. The returned index is stored in witness steps.
    pub fn record_concrete_type_witness(&mut self, witness: ConcreteTypeWitness) -> u32 {
        let key = (
            witness.concrete_conformance.clone(),
            witness.assoc_type.clone(),
        );
        if let Some(&index) = self.witness_map.get(&key) {
            return index;
        }
        let index = self.witnesses.len() as u32;
        self.witness_map.insert(key, index);
        self.witnesses.push(witness);
        index
    }

    pub fn concrete_type_witness(&self, index: u32) -> &ConcreteTypeWitness {
        &self.witnesses[index as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::MutableTerm;

    fn system() -> RewriteSystem {
        RewriteSystem::new(Arc::new(RewriteContext::new()))
    }

    #[test]
    fn add_rule_orients_by_term_order() {
        let mut system = system();
        let ctx = system.ctx.clone();
        // "a" < "b", so the rule is stored as b => a regardless of
        // argument order.
        let a = MutableTerm::from_slice(&[ctx.name("a")]);
        let b = MutableTerm::from_slice(&[ctx.name("b")]);
        assert!(system.add_rule(a.clone(), b.clone()));

        let rule = system.rule(RuleId::from_raw(0));
        assert_eq!(rule.lhs(), b.intern(&ctx));
        assert_eq!(rule.rhs(), a.intern(&ctx));
    }

    #[test]
    fn trivial_and_duplicate_rules_are_rejected() {
        let mut system = system();
        let ctx = system.ctx.clone();
        let a = MutableTerm::from_slice(&[ctx.name("a")]);
        let b = MutableTerm::from_slice(&[ctx.name("b")]);

        assert!(!system.add_rule(a.clone(), a.clone()), "trivial rule");
        assert!(system.add_rule(b.clone(), a.clone()));
        assert!(!system.add_rule(b.clone(), a.clone()), "duplicate rule");
        assert!(!system.add_rule(a, b), "duplicate after orientation");
        assert_eq!(system.rule_count(), 1);
    }

    #[test]
    fn permanent_and_explicit_rules_are_flagged() {
        let mut system = system();
        let ctx = system.ctx.clone();
        let a = MutableTerm::from_slice(&[ctx.name("a")]);
        let b = MutableTerm::from_slice(&[ctx.name("b")]);
        let c = MutableTerm::from_slice(&[ctx.name("c")]);

        assert!(system.add_permanent_rule(b.clone(), a.clone()));
        assert!(system.add_explicit_rule(c, b));
        assert!(system.rule(RuleId::from_raw(0)).is_permanent());
        assert!(system.rule(RuleId::from_raw(1)).is_explicit());
    }

    #[test]
    fn prefix_lookup_finds_reducible_rule() {
        let mut system = system();
        let ctx = system.ctx.clone();
        let x = ctx.name("x");
        let y = ctx.name("y");
        let a = ctx.name("a");
        assert!(system.add_rule(
            MutableTerm::from_slice(&[x.clone(), y.clone()]),
            MutableTerm::from_slice(&[a.clone()]),
        ));

        assert_eq!(
            system.rule_matching_prefix(&[x.clone(), y, a]),
            Some(RuleId::from_raw(0))
        );
        assert_eq!(system.rule_matching_prefix(&[x]), None);
    }

    #[test]
    fn witnesses_are_deduplicated() {
        let mut system = system();
        let ctx = system.ctx.clone();
        let witness = ConcreteTypeWitness {
            concrete_conformance: ctx.concrete_conformance("Int", &[], "P"),
            assoc_type: ctx.assoc_type("P", "A"),
            concrete_type: ctx.concrete_type("Bool", &[]),
        };
        let first = system.record_concrete_type_witness(witness.clone());
        let second = system.record_concrete_type_witness(witness.clone());
        assert_eq!(first, second);
        assert_eq!(system.concrete_type_witness(first), &witness);
    }

    #[test]
    fn record_loop_respects_toggle() {
        let mut system = system();
        let ctx = system.ctx.clone();
        let basepoint = MutableTerm::from_slice(&[ctx.name("a")]);

        system.set_record_loops(false);
        system.record_loop(basepoint.clone(), RewritePath::new());
        assert!(system.loops().is_empty());

        system.set_record_loops(true);
        system.record_loop(basepoint, RewritePath::new());
        assert_eq!(system.loops().len(), 1);
    }
}
