//! Rewrite steps and rewrite paths.
//!
//! A path is a list of instructions for the two-stack evaluator in
//! [`crate::eval`]. Apply-rule steps are whiskered, oriented rule
//! applications; the remaining step kinds manipulate the evaluator's
//! stacks while rewriting concrete substitutions.
//!
//! Paths support inversion (invert every step, reverse the order) and the
//! two operations minimization is built from: splitting a cycle at a rule
//! occurrence, and substituting a replacement path for every occurrence
//! of a rule.

use crate::rule::RuleId;
use smallvec::SmallVec;

/// The kind of a rewrite step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    /// Apply a rewrite rule to an infix of the term at the top of the
    /// primary stack. `arg` is the rule id; the offsets are the whisker
    /// sizes on either side of the match site.
    ApplyRewriteRule,
    /// Prepend (inverted: strip) a prefix of the current term to each
    /// substitution of the trailing superclass or concrete type symbol.
    /// `arg` is the prefix length.
    AdjustConcreteType,
    /// Move the top of the primary stack to the secondary stack
    /// (inverted: back).
    Shift,
    /// Push the substitutions of the trailing superclass or concrete type
    /// symbol onto the primary stack (inverted: pop them back in).
    /// `arg` is the number of substitutions.
    Decompose,
    /// Fuse a trailing `[concrete: C].[P]` into `[concrete: C : P]`
    /// (inverted: split).
    ConcreteConformance,
    /// Fuse a trailing `[superclass: C].[P]` into `[concrete: C : P]`
    /// (inverted: split).
    SuperclassConformance,
    /// Eliminate (inverted: introduce) the concrete type symbol of the
    /// recorded type witness. `arg` is the witness index.
    ConcreteTypeWitness,
    /// Eliminate (inverted: introduce) the associated type symbol of the
    /// recorded type witness. `arg` is the witness index.
    SameTypeWitness,
}

/// A single evaluation step in a rewrite path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RewriteStep {
    pub kind: StepKind,

    /// Size of the left whisker: the position within the term where the
    /// rewrite applies. In `A.(X => Y).B` this is `|A|`.
    pub start_offset: u32,

    /// Size of the right whisker: the length of the suffix after the
    /// match site. In `A.(X => Y).B` this is `|B|`.
    pub end_offset: u32,

    /// Rule id for apply-rule steps; prefix length, substitution count,
    /// or witness index for the stack-manipulating kinds.
    pub arg: u32,

    /// If false, the step rewrites the rule's left hand side to its right
    /// hand side; if true, vice versa. Non-apply kinds run backwards when
    /// inverted.
    pub inverse: bool,
}

impl RewriteStep {
    pub fn apply_rule(rule: RuleId, start_offset: u32, end_offset: u32, inverse: bool) -> Self {
        Self {
            kind: StepKind::ApplyRewriteRule,
            start_offset,
            end_offset,
            arg: rule.raw(),
            inverse,
        }
    }

    pub fn adjust_concrete_type(prefix_len: u32, inverse: bool) -> Self {
        Self {
            kind: StepKind::AdjustConcreteType,
            start_offset: 0,
            end_offset: 0,
            arg: prefix_len,
            inverse,
        }
    }

    pub fn shift(inverse: bool) -> Self {
        Self {
            kind: StepKind::Shift,
            start_offset: 0,
            end_offset: 0,
            arg: 0,
            inverse,
        }
    }

    pub fn decompose(num_substitutions: u32, inverse: bool) -> Self {
        Self {
            kind: StepKind::Decompose,
            start_offset: 0,
            end_offset: 0,
            arg: num_substitutions,
            inverse,
        }
    }

    pub fn concrete_conformance(inverse: bool) -> Self {
        Self {
            kind: StepKind::ConcreteConformance,
            start_offset: 0,
            end_offset: 0,
            arg: 0,
            inverse,
        }
    }

    pub fn superclass_conformance(inverse: bool) -> Self {
        Self {
            kind: StepKind::SuperclassConformance,
            start_offset: 0,
            end_offset: 0,
            arg: 0,
            inverse,
        }
    }

    pub fn concrete_type_witness(witness: u32, inverse: bool) -> Self {
        Self {
            kind: StepKind::ConcreteTypeWitness,
            start_offset: 0,
            end_offset: 0,
            arg: witness,
            inverse,
        }
    }

    pub fn same_type_witness(witness: u32, inverse: bool) -> Self {
        Self {
            kind: StepKind::SameTypeWitness,
            start_offset: 0,
            end_offset: 0,
            arg: witness,
            inverse,
        }
    }

    /// Copy of this step with the given whisker offsets.
    pub fn with_offsets(mut self, start_offset: u32, end_offset: u32) -> Self {
        self.start_offset = start_offset;
        self.end_offset = end_offset;
        self
    }

    /// The rule applied by this step, if it is an apply-rule step.
    pub fn rule_id(&self) -> Option<RuleId> {
        match self.kind {
            StepKind::ApplyRewriteRule => Some(RuleId::from_raw(self.arg)),
            _ => None,
        }
    }

    /// A step is in context when it rewrites a proper infix of the
    /// current term.
    pub fn is_in_context(&self) -> bool {
        self.start_offset > 0 || self.end_offset > 0
    }

    pub fn invert(&mut self) {
        self.inverse = !self.inverse;
    }

    pub fn inverted(mut self) -> Self {
        self.invert();
        self
    }
}

/// A sequence of rewrite steps applied to a term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewritePath {
    steps: SmallVec<[RewriteStep; 3]>,
}

impl RewritePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn steps(&self) -> &[RewriteStep] {
        &self.steps
    }

    pub fn push(&mut self, step: RewriteStep) {
        self.steps.push(step);
    }

    /// Horizontal composition: append another path.
    pub fn append(&mut self, other: &RewritePath) {
        self.steps.extend(other.steps.iter().copied());
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RewriteStep> {
        self.steps.iter()
    }

    /// Invert the path: invert every step and reverse the order.
    pub fn invert(&mut self) {
        self.steps.reverse();
        for step in &mut self.steps {
            step.invert();
        }
    }

    pub fn inverted(&self) -> RewritePath {
        let mut path = self.clone();
        path.invert();
        path
    }

    /// Given a cycle in which `rule` is applied exactly once in empty
    /// context, return an alternative definition of the rule: the path
    /// from the rule's left hand side to its right hand side obtained by
    /// traveling around the rest of the cycle.
    pub fn split_cycle_at_rule(&self, rule: RuleId) -> RewritePath {
        // Split the cycle at the occurrence: `before` runs from the
        // basepoint to the rule's match site, `after` from the rewritten
        // site back to the basepoint. Because the rule occurs once,
        // neither part mentions it.
        let mut before = RewritePath::new();
        let mut after = RewritePath::new();

        let mut rule_was_inverted = false;
        let mut saw_rule = false;

        for step in &self.steps {
            if step.rule_id() == Some(rule) {
                assert!(!saw_rule, "rule appears more than once in cycle");
                assert!(!step.is_in_context(), "rule appears in context");
                rule_was_inverted = step.inverse;
                saw_rule = true;
                continue;
            }
            if saw_rule {
                after.push(*step);
            } else {
                before.push(*step);
            }
        }
        assert!(saw_rule, "rule does not appear in cycle");

        // A path from one side of the rule to the other, via the basepoint.
        let mut result = after;
        result.append(&before);

        // We want the path from the lhs to the rhs, so invert it unless
        // the occurrence itself was inverted.
        if !rule_was_inverted {
            result.invert();
        }

        result
    }

    /// Replace every apply-rule step for `rule` with the replacement path
    /// (or its inverse, if the occurrence was inverted), re-contextualized
    /// at each occurrence.
    ///
    /// Returns true if any step was replaced; false means the rule did
    /// not appear in this path.
    pub fn replace_rule_with_path(&mut self, rule: RuleId, replacement: &RewritePath) -> bool {
        let found = self.steps.iter().any(|step| step.rule_id() == Some(rule));
        if !found {
            return false;
        }

        let mut new_steps: SmallVec<[RewriteStep; 3]> = SmallVec::new();

        for step in &self.steps {
            if step.rule_id() != Some(rule) {
                new_steps.push(*step);
                continue;
            }

            // Track Decompose/Compose pairs within this occurrence. Steps
            // in between operate on terms newly pushed onto the stack and
            // must not be re-contextualized.
            let mut decompose_count: u32 = 0;

            if step.inverse {
                for inner in replacement.steps.iter().rev() {
                    adjust_step(step, *inner, &mut decompose_count, &mut new_steps);
                }
            } else {
                for inner in replacement.steps.iter() {
                    adjust_step(step, *inner, &mut decompose_count, &mut new_steps);
                }
            }
        }

        self.steps = new_steps;
        true
    }
}

/// Re-contextualize an inner step being inserted at an outer occurrence:
/// compose the inverse bits, and add the outer whiskers unless the step is
/// bracketed by a Decompose/Compose pair.
fn adjust_step(
    outer: &RewriteStep,
    mut inner: RewriteStep,
    decompose_count: &mut u32,
    out: &mut SmallVec<[RewriteStep; 3]>,
) {
    let inverse = inner.inverse ^ outer.inverse;

    // An inverse Decompose is a Compose: it closes a bracket before the
    // offset decision below.
    if inner.kind == StepKind::Decompose && inverse {
        debug_assert!(*decompose_count > 0);
        *decompose_count -= 1;
    }

    if *decompose_count == 0 {
        inner.start_offset += outer.start_offset;
        inner.end_offset += outer.end_offset;
    }

    inner.inverse = inverse;
    out.push(inner);

    if inner.kind == StepKind::Decompose && !inverse {
        *decompose_count += 1;
    }
}

impl<'a> IntoIterator for &'a RewritePath {
    type Item = &'a RewriteStep;
    type IntoIter = std::slice::Iter<'a, RewriteStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

impl FromIterator<RewriteStep> for RewritePath {
    fn from_iter<I: IntoIterator<Item = RewriteStep>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

/// Render a step for debug dumps, e.g. `!Apply(#3) @1,2`.
pub fn format_step(step: &RewriteStep) -> String {
    let mut out = String::new();
    if step.inverse {
        out.push('!');
    }
    match step.kind {
        StepKind::ApplyRewriteRule => out.push_str(&format!("Apply(#{})", step.arg)),
        StepKind::AdjustConcreteType => out.push_str(&format!("Adjust({})", step.arg)),
        StepKind::Shift => out.push_str("Shift"),
        StepKind::Decompose => out.push_str(&format!("Decompose({})", step.arg)),
        StepKind::ConcreteConformance => out.push_str("ConcreteConformance"),
        StepKind::SuperclassConformance => out.push_str("SuperclassConformance"),
        StepKind::ConcreteTypeWitness => out.push_str(&format!("ConcreteTypeWitness(#{})", step.arg)),
        StepKind::SameTypeWitness => out.push_str(&format!("SameTypeWitness(#{})", step.arg)),
    }
    if step.is_in_context() {
        out.push_str(&format!(" @{},{}", step.start_offset, step.end_offset));
    }
    out
}

/// Render a path as a bracketed step list.
pub fn format_path(path: &RewritePath) -> String {
    let steps: Vec<String> = path.iter().map(format_step).collect();
    format!("[{}]", steps.join("; "))
}

#[cfg(test)]
#[path = "tests/path.rs"]
mod tests;
