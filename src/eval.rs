//! The rewrite path evaluator - a two-stack interpreter for paths.
//!
//! Apply-rule and adjust steps rewrite the term at the top of the primary
//! stack. Shift moves terms between the stacks, and Decompose splits the
//! substitutions off the trailing superclass or concrete type symbol
//! (inverted: reassembles them). The conformance and witness steps fuse,
//! split, eliminate, or introduce the property symbols at the end of the
//! current term.
//!
//! Every shape violation is a programmer error in the caller (completion
//! or minimization) and panics with a descriptive message.

use crate::path::{format_step, RewriteStep, StepKind};
use crate::rule::RuleId;
use crate::symbol::Symbol;
use crate::system::RewriteSystem;
use crate::term::{format_term, MutableTerm, Term};
use smallvec::SmallVec;

/// Evaluator state: a primary stack `a` and a secondary stack `b` of
/// working terms. Constructed with a basepoint on the primary stack.
#[derive(Debug, Clone)]
pub struct RewritePathEvaluator {
    a: SmallVec<[MutableTerm; 2]>,
    b: SmallVec<[MutableTerm; 2]>,
}

impl RewritePathEvaluator {
    pub fn new(basepoint: MutableTerm) -> Self {
        let mut a = SmallVec::new();
        a.push(basepoint);
        Self { a, b: SmallVec::new() }
    }

    /// The term currently being rewritten: the top of the primary stack.
    pub fn current_term(&self) -> &MutableTerm {
        self.a.last().expect("evaluator primary stack is empty")
    }

    fn current_term_mut(&mut self) -> &mut MutableTerm {
        self.a.last_mut().expect("evaluator primary stack is empty")
    }

    /// We are in context while rewriting concrete substitutions, i.e.
    /// when any term beyond the basepoint sits on either stack.
    pub fn is_in_context(&self) -> bool {
        debug_assert!(!self.a.is_empty());
        self.a.len() > 1 || !self.b.is_empty()
    }

    /// Apply a single step, mutating the stacks.
    pub fn apply(&mut self, step: &RewriteStep, system: &RewriteSystem) {
        match step.kind {
            StepKind::ApplyRewriteRule => self.apply_rewrite_rule(step, system),
            StepKind::AdjustConcreteType => self.apply_adjustment(step, system),
            StepKind::Shift => self.apply_shift(step),
            StepKind::Decompose => self.apply_decompose(step, system),
            StepKind::ConcreteConformance => self.apply_conformance(step, false),
            StepKind::SuperclassConformance => self.apply_conformance(step, true),
            StepKind::ConcreteTypeWitness => self.apply_concrete_type_witness(step, system),
            StepKind::SameTypeWitness => self.apply_same_type_witness(step, system),
        }
    }

    /// Whiskered rule application: verify the infix at the match site
    /// equals the expected side of the rule, then splice in the other.
    fn apply_rewrite_rule(&mut self, step: &RewriteStep, system: &RewriteSystem) {
        let ctx = system.ctx();
        let rule = system.rule(RuleId::from_raw(step.arg));
        let lhs = rule.lhs().symbols(ctx);
        let rhs = rule.rhs().symbols(ctx);
        let (from, to): (&[Symbol], &[Symbol]) = if step.inverse {
            (&rhs[..], &lhs[..])
        } else {
            (&lhs[..], &rhs[..])
        };

        let start = step.start_offset as usize;
        let end = step.end_offset as usize;
        let term = self.current_term_mut();
        assert!(
            start + from.len() + end == term.len(),
            "step {} does not span {}",
            format_step(step),
            format_term(term.symbols(), ctx),
        );

        let site = &term.symbols()[start..start + from.len()];
        assert!(
            site == from,
            "step {} does not match: expected {} at offset {} of {}",
            format_step(step),
            format_term(from, ctx),
            start,
            format_term(term.symbols(), ctx),
        );

        term.replace_range(start..start + from.len(), to);
    }

    /// Prepend (inverted: strip) the current term's leading symbols to
    /// each substitution of the trailing symbol.
    fn apply_adjustment(&mut self, step: &RewriteStep, system: &RewriteSystem) {
        let ctx = system.ctx();
        let length = step.arg as usize;

        let adjusted = {
            let term = self.current_term();
            let last = term
                .last()
                .expect("adjust-concrete-type on an empty term");
            assert!(
                last.has_substitutions(),
                "adjust-concrete-type requires a trailing superclass or concrete type symbol, got {}",
                format_term(term.symbols(), ctx),
            );
            assert!(length < term.len(), "adjustment prefix exceeds term");

            let prefix = &term.symbols()[..length];
            let mut substitutions: SmallVec<[Term; 2]> = SmallVec::new();
            for sub in last.substitutions() {
                let symbols = sub.symbols(ctx);
                if !step.inverse {
                    let mut combined: Vec<Symbol> = prefix.to_vec();
                    combined.extend(symbols.iter().cloned());
                    substitutions.push(ctx.term(&combined));
                } else {
                    assert!(
                        symbols.len() >= length && symbols[..length] == prefix[..],
                        "inverse adjustment: substitution {} does not begin with prefix {}",
                        format_term(&symbols, ctx),
                        format_term(prefix, ctx),
                    );
                    substitutions.push(ctx.term(&symbols[length..]));
                }
            }
            last.with_substitutions(substitutions)
        };

        let term = self.current_term_mut();
        *term.last_mut().unwrap() = adjusted;
    }

    fn apply_shift(&mut self, step: &RewriteStep) {
        if !step.inverse {
            let term = self.a.pop().expect("shift with empty primary stack");
            self.b.push(term);
        } else {
            let term = self
                .b
                .pop()
                .expect("inverse shift with empty secondary stack");
            self.a.push(term);
        }
    }

    /// Push the trailing symbol's substitutions onto the primary stack
    /// (inverted: pop them back in as the new substitutions).
    fn apply_decompose(&mut self, step: &RewriteStep, system: &RewriteSystem) {
        let ctx = system.ctx();
        let count = step.arg as usize;

        if !step.inverse {
            let term = self.current_term();
            let last = term.last().expect("decompose on an empty term");
            assert!(
                last.has_substitutions(),
                "decompose requires a trailing superclass or concrete type symbol, got {}",
                format_term(term.symbols(), ctx),
            );
            assert!(
                last.substitutions().len() == count,
                "decompose expected {} substitutions, found {}",
                count,
                last.substitutions().len(),
            );
            let pushed: Vec<MutableTerm> = last
                .substitutions()
                .iter()
                .map(|sub| MutableTerm::from_term(*sub, ctx))
                .collect();
            self.a.extend(pushed);
        } else {
            assert!(
                self.a.len() > count,
                "inverse decompose pops {} terms but the stack holds {}",
                count,
                self.a.len(),
            );
            let mut popped: Vec<MutableTerm> = Vec::with_capacity(count);
            for _ in 0..count {
                popped.push(self.a.pop().unwrap());
            }
            popped.reverse();
            let substitutions: SmallVec<[Term; 2]> =
                popped.iter().map(|t| t.intern(ctx)).collect();

            let term = self.current_term_mut();
            let last = term.last().expect("inverse decompose on an empty term");
            assert!(
                last.has_substitutions(),
                "inverse decompose requires a trailing superclass or concrete type symbol",
            );
            let rebuilt = last.with_substitutions(substitutions);
            *term.last_mut().unwrap() = rebuilt;
        }
    }

    /// Fuse a trailing concrete type (or superclass) symbol with the
    /// protocol symbol after it into a concrete conformance symbol;
    /// inverted, split the conformance back apart.
    fn apply_conformance(&mut self, step: &RewriteStep, from_superclass: bool) {
        let term = self.current_term_mut();

        if !step.inverse {
            let protocol = match term.pop() {
                Some(Symbol::Protocol(p)) => p,
                other => panic!("conformance step expects a trailing protocol symbol, got {other:?}"),
            };
            let last = term
                .last()
                .expect("conformance step on an empty term")
                .clone();
            let fused = match (last, from_superclass) {
                (
                    Symbol::ConcreteType {
                        name,
                        substitutions,
                    },
                    false,
                ) => Symbol::ConcreteConformance {
                    name,
                    substitutions,
                    protocol,
                },
                (
                    Symbol::Superclass {
                        class,
                        substitutions,
                    },
                    true,
                ) => Symbol::ConcreteConformance {
                    name: class,
                    substitutions,
                    protocol,
                },
                (other, _) => panic!(
                    "conformance step expects a trailing concrete type or superclass symbol, got {:?}",
                    other.kind()
                ),
            };
            *term.last_mut().unwrap() = fused;
        } else {
            let last = term
                .last()
                .expect("inverse conformance step on an empty term")
                .clone();
            match last {
                Symbol::ConcreteConformance {
                    name,
                    substitutions,
                    protocol,
                } => {
                    let split = if from_superclass {
                        Symbol::Superclass {
                            class: name,
                            substitutions,
                        }
                    } else {
                        Symbol::ConcreteType {
                            name,
                            substitutions,
                        }
                    };
                    *term.last_mut().unwrap() = split;
                    term.push(Symbol::Protocol(protocol));
                }
                other => panic!(
                    "inverse conformance step expects a trailing concrete conformance symbol, got {:?}",
                    other.kind()
                ),
            }
        }
    }

    /// Eliminate (inverted: introduce) the concrete type symbol of the
    /// recorded type witness at the end of the current term.
    fn apply_concrete_type_witness(&mut self, step: &RewriteStep, system: &RewriteSystem) {
        let witness = system.concrete_type_witness(step.arg).clone();
        let term = self.current_term_mut();

        if !step.inverse {
            let popped = term.pop().expect("concrete type witness on an empty term");
            assert!(
                popped == witness.concrete_type,
                "trailing symbol does not match the recorded concrete type witness",
            );
            let len = term.len();
            assert!(
                len >= 2
                    && term[len - 1] == witness.assoc_type
                    && term[len - 2] == witness.concrete_conformance,
                "concrete type witness context mismatch",
            );
        } else {
            let len = term.len();
            assert!(
                len >= 2
                    && term[len - 1] == witness.assoc_type
                    && term[len - 2] == witness.concrete_conformance,
                "concrete type witness context mismatch",
            );
            term.push(witness.concrete_type);
        }
    }

    /// Eliminate (inverted: introduce) the associated type symbol of the
    /// recorded type witness at the end of the current term.
    fn apply_same_type_witness(&mut self, step: &RewriteStep, system: &RewriteSystem) {
        let witness = system.concrete_type_witness(step.arg).clone();
        let term = self.current_term_mut();

        if !step.inverse {
            let popped = term.pop().expect("same type witness on an empty term");
            assert!(
                popped == witness.assoc_type,
                "trailing symbol does not match the recorded associated type witness",
            );
            assert!(
                term.last() == Some(&witness.concrete_conformance),
                "same type witness context mismatch",
            );
        } else {
            assert!(
                term.last() == Some(&witness.concrete_conformance),
                "same type witness context mismatch",
            );
            term.push(witness.assoc_type);
        }
    }
}

#[cfg(test)]
#[path = "tests/eval.rs"]
mod tests;
