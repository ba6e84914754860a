//! Homotopy reduction - computing a minimal set of rewrite rules.
//!
//! A minimal set of rules is large enough that completion reconstructs
//! the original confluent system, and small enough that no further rule
//! can be deleted without changing the induced equivalence.
//!
//! If a rule appears exactly once in a loop and in empty context, the
//! loop witnesses that the rule is equivalent to traveling around the
//! loop the other way. The rule and the loop can be deleted; every other
//! occurrence of the rule is replaced with the alternate definition
//! obtained by splitting the witnessing loop. Iterating this eventually
//! produces a minimal rule set.
//!
//! Permanent rules (associated type introductions) are never deleted:
//! they are re-added on every rebuild, so it is better to leave them in
//! place and let other rules in the same loop be deleted instead. For a
//! conformance rule, appearing once in empty context is not sufficient;
//! the rule must also fail to be a generating conformance, which a
//! separate algorithm decides between the two reduction passes.

use crate::eval::RewritePathEvaluator;
use crate::loops::format_loop;
use crate::path::{format_path, RewritePath};
use crate::rule::{format_rule, RuleId};
use crate::symbol::{Ident, SymbolKind};
use crate::system::RewriteSystem;
use crate::term::format_term;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::cmp::Ordering;

#[cfg(feature = "tracing")]
use crate::trace::{debug, debug_span};

impl RewriteSystem {
    /// If a loop contains an explicit rule in empty context, propagate the
    /// explicit bit to all other rules appearing once in empty context in
    /// the same loop.
    ///
    /// Requirements are often written in a non-canonical form; completion
    /// adds the canonical rule and a loop connecting the two. Propagating
    /// the bit to the canonical representative keeps minimized
    /// requirements in the protocol where the user wrote them.
    pub(crate) fn propagate_explicit_bits(&mut self) {
        let mut sets: Vec<SmallVec<[RuleId; 1]>> = Vec::with_capacity(self.loops.len());
        for rewrite_loop in &self.loops {
            sets.push(rewrite_loop.find_rules_appearing_once_in_empty_context(self));
        }

        for rules_in_empty_context in sets {
            let saw_explicit = rules_in_empty_context
                .iter()
                .any(|&id| self.rule(id).is_explicit());
            if !saw_explicit {
                continue;
            }
            for id in rules_in_empty_context {
                let rule = self.rule_mut(id);
                if !rule.is_permanent() && !rule.is_explicit() {
                    rule.mark_explicit();
                }
            }
        }
    }

    /// Whether a rule may be deleted in the current pass.
    ///
    /// Pass 1 runs with no redundant-conformance set and skips conformance
    /// rules entirely; pass 3 deletes a conformance rule only when the
    /// generating conformances algorithm reported it redundant.
    pub(crate) fn is_candidate_for_deletion(
        &self,
        rule_id: RuleId,
        redundant_conformances: Option<&FxHashSet<RuleId>>,
    ) -> bool {
        let rule = self.rule(rule_id);

        // A redundant rule has already been replaced with a rewrite path
        // in every loop, so it cannot appear here.
        assert!(
            !rule.is_redundant(),
            "redundant rule still appears in a loop"
        );

        if rule.is_permanent() {
            return false;
        }

        // Rules with unresolved name symbols derive from an associated
        // type introduction composed with a conformance rule; they go
        // first, in either pass.
        if rule.lhs().contains_unresolved_symbols(self.ctx()) {
            return true;
        }

        if rule.is_any_conformance_rule(self.ctx()) {
            match redundant_conformances {
                None => return false,
                Some(set) => {
                    if !set.contains(&rule_id) {
                        return false;
                    }
                }
            }
        }

        true
    }

    /// Scan all loops for a redundant rule to delete. Loops that no longer
    /// witness any redundancy are marked deleted along the way.
    ///
    /// Among the candidates, the rule comparing largest (least canonical)
    /// wins, with ties broken by the first-seen pair. On success the
    /// witnessing loop is split and deleted, the rule is marked redundant,
    /// and the replacement path is returned.
    pub(crate) fn find_rule_to_delete(
        &mut self,
        redundant_conformances: Option<&FxHashSet<RuleId>>,
    ) -> Option<(RuleId, RewritePath)> {
        let mut candidates: Vec<(usize, RuleId)> = Vec::new();
        let mut exhausted: Vec<usize> = Vec::new();

        for (loop_id, rewrite_loop) in self.loops.iter().enumerate() {
            if rewrite_loop.is_deleted() {
                continue;
            }
            let rules = rewrite_loop.find_rules_appearing_once_in_empty_context(self);
            if rules.is_empty() {
                // This loop can never witness a redundancy again.
                exhausted.push(loop_id);
                continue;
            }
            for rule_id in rules {
                candidates.push((loop_id, rule_id));
            }
        }

        for loop_id in exhausted {
            self.loops[loop_id].mark_deleted();
        }

        let mut found: Option<(usize, RuleId)> = None;
        for &(loop_id, rule_id) in &candidates {
            if !self.is_candidate_for_deletion(rule_id, redundant_conformances) {
                continue;
            }
            match found {
                None => found = Some((loop_id, rule_id)),
                Some((_, best)) => {
                    // Prefer to delete less canonical rules.
                    if self.rule(rule_id).compare(self.rule(best), self.ctx())
                        == Ordering::Greater
                    {
                        found = Some((loop_id, rule_id));
                    }
                }
            }
        }

        let (loop_id, rule_id) = found?;

        let replacement = self.loops[loop_id].path.split_cycle_at_rule(rule_id);
        self.loops[loop_id].mark_deleted();
        self.rule_mut(rule_id).mark_redundant();

        #[cfg(feature = "tracing")]
        debug!(rule = rule_id.raw(), loop_id, "found rule to delete");

        Some((rule_id, replacement))
    }

    /// Replace every occurrence of a redundant rule, in every remaining
    /// loop, with the replacement path. Basepoints are unchanged because
    /// substitution preserves endpoints.
    pub(crate) fn delete_rule(&mut self, rule_id: RuleId, replacement: &RewritePath) {
        if self.debug.homotopy_reduction {
            let rule = self.rule(rule_id);
            eprintln!(
                "* Deleting rule {} (#{})",
                format_rule(rule, self.ctx()),
                rule_id.raw()
            );
            eprintln!("* Replacement path: {}", format_path(replacement));
        }

        for loop_id in 0..self.loops.len() {
            if self.loops[loop_id].is_deleted() {
                continue;
            }
            let changed = self.loops[loop_id]
                .path
                .replace_rule_with_path(rule_id, replacement);
            if changed && self.debug.homotopy_reduction {
                eprintln!(
                    "** Updated loop: {}",
                    format_loop(&self.loops[loop_id], self)
                );
            }
        }
    }

    /// One reduction pass: delete rules until none remains that this
    /// pass may delete. Terminates because every iteration marks one more
    /// rule redundant, and the rule count is finite.
    pub(crate) fn perform_homotopy_reduction(
        &mut self,
        redundant_conformances: Option<&FxHashSet<RuleId>>,
    ) {
        while let Some((rule_id, replacement)) = self.find_rule_to_delete(redundant_conformances)
        {
            self.delete_rule(rule_id, &replacement);
        }
    }

    /// Minimize the rewrite system: delete redundant rules via a series of
    /// Tietze transformations, updating the remaining loops as each rule
    /// is deleted. Redundant rules get their flag set; nothing is removed
    /// from storage.
    ///
    /// `compute_generating_conformances` is the external algorithm that
    /// populates the set of conformance rules which are redundant modulo
    /// the generating set; it runs between the two reduction passes.
    pub fn minimize<F>(&mut self, compute_generating_conformances: F)
    where
        F: FnOnce(&RewriteSystem, &mut FxHashSet<RuleId>),
    {
        assert!(self.complete, "minimize requires a completed rewrite system");
        assert!(!self.minimized, "rewrite system is already minimized");
        self.set_minimized();

        #[cfg(feature = "tracing")]
        let _span = debug_span!("minimize", rules = self.rules.len(), loops = self.loops.len())
            .entered();

        self.verify_rewrite_loops();

        self.propagate_explicit_bits();

        // First pass: eliminate redundant rules that are not conformance
        // rules.
        self.perform_homotopy_reduction(None);

        // Now find a minimal set of generating conformances; everything
        // outside it is redundant.
        let mut redundant_conformances = FxHashSet::default();
        compute_generating_conformances(self, &mut redundant_conformances);

        // Second pass: eliminate the redundant conformance rules.
        self.perform_homotopy_reduction(Some(&redundant_conformances));

        self.verify_rewrite_loops();
        self.verify_redundant_conformances(&redundant_conformances);
        self.verify_minimized_rules();
    }

    /// In a conformance-valid rewrite system, any rule with unresolved
    /// symbols should have been simplified away; report logical failure
    /// without aborting.
    pub fn had_error(&self) -> bool {
        assert!(self.complete);
        assert!(self.minimized);

        for rule in &self.rules {
            if rule.is_permanent() {
                continue;
            }
            if rule.is_conflicting() {
                return true;
            }
            if !rule.is_redundant() && rule.contains_unresolved_symbols(self.ctx()) {
                return true;
            }
        }

        false
    }

    /// Rules forming the requirement signatures of the given protocols:
    /// non-permanent, non-redundant, non-conflicting, fully resolved rules
    /// whose left hand side begins with a protocol or associated type
    /// symbol of one of the requested protocols.
    pub fn minimized_protocol_rules(
        &self,
        protos: &[Ident],
    ) -> FxHashMap<Ident, Vec<RuleId>> {
        assert!(self.minimized);

        let mut result: FxHashMap<Ident, Vec<RuleId>> = FxHashMap::default();
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.is_permanent()
                || rule.is_redundant()
                || rule.is_conflicting()
                || rule.contains_unresolved_symbols(self.ctx())
            {
                continue;
            }

            let lhs = rule.lhs().symbols(self.ctx());
            let head = &lhs[0];
            if !matches!(head.kind(), SymbolKind::Protocol | SymbolKind::AssociatedType) {
                continue;
            }

            let domain = head.protocols();
            assert!(
                domain.len() == 1,
                "minimized rule head names more than one protocol"
            );
            let proto = domain[0];
            if protos.contains(&proto) {
                result
                    .entry(proto)
                    .or_default()
                    .push(RuleId::from_raw(index as u32));
            }
        }

        result
    }

    /// Rules forming the top-level generic signature: the same filter,
    /// with the left hand side beginning in a generic parameter symbol.
    pub fn minimized_generic_signature_rules(&self) -> Vec<RuleId> {
        assert!(self.minimized);

        let mut result = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.is_permanent()
                || rule.is_redundant()
                || rule.is_conflicting()
                || rule.contains_unresolved_symbols(self.ctx())
            {
                continue;
            }

            let lhs = rule.lhs().symbols(self.ctx());
            if lhs[0].kind() != SymbolKind::GenericParam {
                continue;
            }

            result.push(RuleId::from_raw(index as u32));
        }

        result
    }

    /// Verify that each loop begins and ends at its basepoint with an
    /// empty evaluator stack.
    pub fn verify_rewrite_loops(&self) {
        for rewrite_loop in &self.loops {
            let mut evaluator = RewritePathEvaluator::new(rewrite_loop.basepoint.clone());
            for step in rewrite_loop.path.iter() {
                evaluator.apply(step, self);
            }

            assert!(
                evaluator.current_term() == &rewrite_loop.basepoint,
                "not a loop: {} ended at {}",
                format_loop(rewrite_loop, self),
                format_term(evaluator.current_term().symbols(), self.ctx()),
            );
            assert!(
                !evaluator.is_in_context(),
                "leftover terms on evaluator stack after {}",
                format_loop(rewrite_loop, self),
            );
        }
    }

    /// Every conformance reported redundant by the generating conformances
    /// algorithm must have been eliminated by homotopy reduction.
    fn verify_redundant_conformances(&self, redundant_conformances: &FxHashSet<RuleId>) {
        for &rule_id in redundant_conformances {
            let rule = self.rule(rule_id);
            assert!(!rule.is_permanent(), "permanent rule cannot be redundant");
            assert!(
                !rule.is_identity_conformance_rule(self.ctx()),
                "identity conformance cannot be redundant"
            );
            assert!(
                rule.is_any_conformance_rule(self.ctx()),
                "redundant conformance is not a conformance rule"
            );
            assert!(
                rule.is_redundant(),
                "homotopy reduction did not eliminate redundant conformance (#{}) {}",
                rule_id.raw(),
                format_rule(rule, self.ctx()),
            );
        }
    }

    /// Check the flag state left behind by minimization.
    fn verify_minimized_rules(&self) {
        for rule in &self.rules {
            // Permanent rules can be simplified, but never redundant.
            if rule.is_permanent() {
                assert!(
                    !rule.is_redundant(),
                    "permanent rule is redundant: {}",
                    format_rule(rule, self.ctx()),
                );
                continue;
            }

            // Simplified rules should be redundant, except protocol
            // conformance rules, which are kept in their original protocol
            // for compatibility with the previous minimization algorithm.
            if rule.is_simplified()
                && !rule.is_redundant()
                && rule.is_protocol_conformance_rule(self.ctx()).is_none()
            {
                panic!(
                    "simplified rule is not redundant: {}",
                    format_rule(rule, self.ctx()),
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/homotopy.rs"]
mod tests;
