//! Rewrite loops - closed paths witnessing identities between rules.
//!
//! A loop is a path that rewrites its basepoint back to itself with an
//! empty evaluator stack. Loops are recorded by the completion procedure
//! while resolving critical pairs; minimization consumes them to detect
//! and eliminate redundant rules. A deleted loop stays in storage with
//! its flag set, so loop indices remain stable.

use crate::eval::RewritePathEvaluator;
use crate::path::{format_path, RewritePath};
use crate::rule::RuleId;
use crate::system::RewriteSystem;
use crate::term::{format_term, MutableTerm};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// A closed rewrite path around a basepoint.
#[derive(Debug, Clone)]
pub struct RewriteLoop {
    pub basepoint: MutableTerm,
    pub path: RewritePath,
    deleted: bool,
}

impl RewriteLoop {
    pub fn new(basepoint: MutableTerm, path: RewritePath) -> Self {
        Self {
            basepoint,
            path,
            deleted: false,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub(crate) fn mark_deleted(&mut self) {
        assert!(!self.deleted, "loop is already deleted");
        self.deleted = true;
    }

    /// Rules applied exactly once in this loop, in empty context: the
    /// step's offsets are zero and the evaluator stack is empty at the
    /// point of application. Such a rule is equivalent to traveling the
    /// rest of the loop the other way, so the loop witnesses that it is
    /// redundant.
    ///
    /// Results are in path order, so candidate selection does not depend
    /// on hash iteration order.
    pub fn find_rules_appearing_once_in_empty_context(
        &self,
        system: &RewriteSystem,
    ) -> SmallVec<[RuleId; 1]> {
        let mut in_empty_context: FxHashSet<RuleId> = FxHashSet::default();
        let mut order: SmallVec<[RuleId; 1]> = SmallVec::new();
        let mut multiplicity: FxHashMap<RuleId, u32> = FxHashMap::default();

        let mut evaluator = RewritePathEvaluator::new(self.basepoint.clone());

        for step in self.path.iter() {
            if let Some(rule_id) = step.rule_id() {
                if !step.is_in_context()
                    && !evaluator.is_in_context()
                    && in_empty_context.insert(rule_id)
                {
                    order.push(rule_id);
                }
                *multiplicity.entry(rule_id).or_insert(0) += 1;
            }
            evaluator.apply(step, system);
        }

        order.retain(|rule_id| multiplicity.get(rule_id) == Some(&1));
        order
    }
}

/// Render a loop as `basepoint: path` for debug dumps.
pub fn format_loop(rewrite_loop: &RewriteLoop, system: &RewriteSystem) -> String {
    let mut out = format!(
        "{}: {}",
        format_term(rewrite_loop.basepoint.symbols(), system.ctx()),
        format_path(&rewrite_loop.path)
    );
    if rewrite_loop.deleted {
        out.push_str(" (deleted)");
    }
    out
}
