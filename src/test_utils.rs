use crate::context::RewriteContext;
use crate::symbol::Symbol;
use crate::system::RewriteSystem;
use crate::term::MutableTerm;
use std::sync::Arc;

pub(crate) fn new_system() -> (RewriteSystem, Arc<RewriteContext>) {
    let ctx = Arc::new(RewriteContext::new());
    let system = RewriteSystem::new(ctx.clone());
    (system, ctx)
}

/// An associated type symbol `[P:name]`: fully resolved and not a
/// property symbol, so terms built from these stay out of the
/// conformance-rule special cases.
pub(crate) fn sym(ctx: &RewriteContext, name: &str) -> Symbol {
    ctx.assoc_type("P", name)
}

pub(crate) fn term(ctx: &RewriteContext, names: &[&str]) -> MutableTerm {
    let symbols: Vec<Symbol> = names.iter().map(|n| sym(ctx, n)).collect();
    MutableTerm::from_slice(&symbols)
}
