//! Minimization benchmarks using Criterion.
//!
//! Run with: `cargo bench`
//!
//! Builds chain-shaped rewrite systems (a chain of n rules, a shortcut
//! rule, and the loop witnessing the shortcut) and measures a full
//! `minimize` run.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rwmin::context::RewriteContext;
use rwmin::path::{RewritePath, RewriteStep};
use rwmin::rule::RuleId;
use rwmin::system::RewriteSystem;
use rwmin::term::MutableTerm;
use std::hint::black_box;
use std::sync::Arc;

fn build_chain_system(len: usize) -> RewriteSystem {
    let ctx = Arc::new(RewriteContext::new());
    let mut system = RewriteSystem::new(ctx.clone());

    // Names descending with the chain index, so each rule keeps its
    // intended orientation under the shortlex order.
    let terms: Vec<MutableTerm> = (0..=len)
        .map(|i| {
            let name = format!("n{:03}", len - i);
            MutableTerm::from_slice(&[ctx.assoc_type("P", &name)])
        })
        .collect();

    for i in 0..len {
        assert!(system.add_rule(terms[i].clone(), terms[i + 1].clone()));
    }
    assert!(system.add_rule(terms[0].clone(), terms[len].clone()));
    let shortcut = RuleId::from_raw(len as u32);

    let mut path = RewritePath::new();
    path.push(RewriteStep::apply_rule(shortcut, 0, 0, false));
    for i in (0..len).rev() {
        path.push(RewriteStep::apply_rule(
            RuleId::from_raw(i as u32),
            0,
            0,
            true,
        ));
    }
    system.record_loop(terms[0].clone(), path);
    system.mark_complete();
    system
}

fn bench_minimize(c: &mut Criterion) {
    let mut group = c.benchmark_group("minimize_chain");
    for len in [4usize, 16, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            b.iter_batched(
                || build_chain_system(len),
                |mut system| {
                    system.minimize(|_, _| {});
                    black_box(system);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_minimize);
criterion_main!(benches);
