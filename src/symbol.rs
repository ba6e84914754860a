//! Symbols - the atoms of rewrite terms.
//!
//! A symbol is a tagged atom drawn from a closed set of seven kinds.
//! Property symbols (protocol, superclass, concrete type, concrete
//! conformance) may only appear at the end of a term; superclass and
//! concrete-type symbols additionally carry substitution terms for their
//! generic arguments. Name symbols are unresolved identifiers left over
//! from source lowering; a minimized system should contain none outside
//! redundant rules.

use crate::context::RewriteContext;
use crate::term::Term;
use lasso::Spur;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::slice;

/// An interned identifier (protocol, associated type, or class name).
pub type Ident = Spur;

/// The kind of a symbol.
///
/// The derived order is the canonicality rank used by the symbol order:
/// kinds listed earlier compare smaller, i.e. more canonical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolKind {
    /// `[P]` - a protocol symbol.
    Protocol,
    /// `[P:A]` - an associated type symbol.
    AssociatedType,
    /// A generic parameter, identified by depth and index.
    GenericParam,
    /// An unresolved identifier from user-written source.
    Name,
    /// `[superclass: C<...>]` - a superclass constraint.
    Superclass,
    /// `[concrete: C<...>]` - a concrete type constraint.
    ConcreteType,
    /// `[concrete: C<...> : P]` - a concrete conformance.
    ConcreteConformance,
}

/// A symbol in a rewrite term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    Protocol(Ident),
    AssociatedType {
        /// The protocols this associated type belongs to. Usually a single
        /// protocol; completion can merge associated types from several.
        protocols: SmallVec<[Ident; 1]>,
        name: Ident,
    },
    GenericParam {
        depth: u32,
        index: u32,
    },
    Name(Ident),
    Superclass {
        class: Ident,
        substitutions: SmallVec<[Term; 2]>,
    },
    ConcreteType {
        name: Ident,
        substitutions: SmallVec<[Term; 2]>,
    },
    ConcreteConformance {
        name: Ident,
        substitutions: SmallVec<[Term; 2]>,
        protocol: Ident,
    },
}

impl Symbol {
    pub fn kind(&self) -> SymbolKind {
        match self {
            Symbol::Protocol(_) => SymbolKind::Protocol,
            Symbol::AssociatedType { .. } => SymbolKind::AssociatedType,
            Symbol::GenericParam { .. } => SymbolKind::GenericParam,
            Symbol::Name(_) => SymbolKind::Name,
            Symbol::Superclass { .. } => SymbolKind::Superclass,
            Symbol::ConcreteType { .. } => SymbolKind::ConcreteType,
            Symbol::ConcreteConformance { .. } => SymbolKind::ConcreteConformance,
        }
    }

    /// Property symbols may only appear at the end of a term.
    pub fn is_property(&self) -> bool {
        matches!(
            self.kind(),
            SymbolKind::Protocol
                | SymbolKind::Superclass
                | SymbolKind::ConcreteType
                | SymbolKind::ConcreteConformance
        )
    }

    /// The protocols a protocol or associated type symbol belongs to.
    /// Empty for every other kind.
    pub fn protocols(&self) -> &[Ident] {
        match self {
            Symbol::Protocol(p) => slice::from_ref(p),
            Symbol::AssociatedType { protocols, .. } => protocols,
            _ => &[],
        }
    }

    /// The substitution terms of a superclass, concrete type, or concrete
    /// conformance symbol. Empty for every other kind.
    pub fn substitutions(&self) -> &[Term] {
        match self {
            Symbol::Superclass { substitutions, .. }
            | Symbol::ConcreteType { substitutions, .. }
            | Symbol::ConcreteConformance { substitutions, .. } => substitutions,
            _ => &[],
        }
    }

    /// Whether this kind of symbol carries substitution terms.
    pub fn has_substitutions(&self) -> bool {
        matches!(
            self.kind(),
            SymbolKind::Superclass | SymbolKind::ConcreteType | SymbolKind::ConcreteConformance
        )
    }

    /// Copy of this symbol with its substitutions replaced.
    ///
    /// Panics if the symbol kind does not carry substitutions.
    pub fn with_substitutions(&self, substitutions: SmallVec<[Term; 2]>) -> Symbol {
        match self {
            Symbol::Superclass { class, .. } => Symbol::Superclass {
                class: *class,
                substitutions,
            },
            Symbol::ConcreteType { name, .. } => Symbol::ConcreteType {
                name: *name,
                substitutions,
            },
            Symbol::ConcreteConformance { name, protocol, .. } => Symbol::ConcreteConformance {
                name: *name,
                substitutions,
                protocol: *protocol,
            },
            other => panic!(
                "symbol kind {:?} does not carry substitutions",
                other.kind()
            ),
        }
    }

    /// True if this symbol, or any term nested in its substitutions,
    /// is an unresolved name.
    pub fn contains_unresolved_symbols(&self, ctx: &RewriteContext) -> bool {
        match self {
            Symbol::Name(_) => true,
            _ => self
                .substitutions()
                .iter()
                .any(|t| t.contains_unresolved_symbols(ctx)),
        }
    }

    /// Total order on symbols: kind rank first, then payload. Names are
    /// compared lexicographically via the context so the order does not
    /// depend on interning order.
    pub fn compare(&self, other: &Symbol, ctx: &RewriteContext) -> Ordering {
        match self.kind().cmp(&other.kind()) {
            Ordering::Equal => {}
            ord => return ord,
        }

        match (self, other) {
            (Symbol::Protocol(a), Symbol::Protocol(b)) => ctx.compare_idents(*a, *b),
            (
                Symbol::AssociatedType {
                    protocols: pa,
                    name: na,
                },
                Symbol::AssociatedType {
                    protocols: pb,
                    name: nb,
                },
            ) => compare_ident_lists(pa, pb, ctx).then_with(|| ctx.compare_idents(*na, *nb)),
            (
                Symbol::GenericParam {
                    depth: da,
                    index: ia,
                },
                Symbol::GenericParam {
                    depth: db,
                    index: ib,
                },
            ) => (da, ia).cmp(&(db, ib)),
            (Symbol::Name(a), Symbol::Name(b)) => ctx.compare_idents(*a, *b),
            (
                Symbol::Superclass {
                    class: ca,
                    substitutions: sa,
                },
                Symbol::Superclass {
                    class: cb,
                    substitutions: sb,
                },
            ) => ctx
                .compare_idents(*ca, *cb)
                .then_with(|| compare_substitutions(sa, sb, ctx)),
            (
                Symbol::ConcreteType {
                    name: na,
                    substitutions: sa,
                },
                Symbol::ConcreteType {
                    name: nb,
                    substitutions: sb,
                },
            ) => ctx
                .compare_idents(*na, *nb)
                .then_with(|| compare_substitutions(sa, sb, ctx)),
            (
                Symbol::ConcreteConformance {
                    name: na,
                    substitutions: sa,
                    protocol: pa,
                },
                Symbol::ConcreteConformance {
                    name: nb,
                    substitutions: sb,
                    protocol: pb,
                },
            ) => ctx
                .compare_idents(*na, *nb)
                .then_with(|| compare_substitutions(sa, sb, ctx))
                .then_with(|| ctx.compare_idents(*pa, *pb)),
            _ => unreachable!("equal kind ranks imply identical variants"),
        }
    }
}

fn compare_ident_lists(a: &[Ident], b: &[Ident], ctx: &RewriteContext) -> Ordering {
    match a.len().cmp(&b.len()) {
        Ordering::Equal => {}
        ord => return ord,
    }
    for (x, y) in a.iter().zip(b.iter()) {
        match ctx.compare_idents(*x, *y) {
            Ordering::Equal => {}
            ord => return ord,
        }
    }
    Ordering::Equal
}

fn compare_substitutions(a: &[Term], b: &[Term], ctx: &RewriteContext) -> Ordering {
    match a.len().cmp(&b.len()) {
        Ordering::Equal => {}
        ord => return ord,
    }
    for (x, y) in a.iter().zip(b.iter()) {
        match ctx.compare_terms(*x, *y) {
            Ordering::Equal => {}
            ord => return ord,
        }
    }
    Ordering::Equal
}

/// Render a symbol in the bracketed debug notation.
pub fn format_symbol(symbol: &Symbol, ctx: &RewriteContext) -> String {
    fn subs(substitutions: &[Term], ctx: &RewriteContext) -> String {
        if substitutions.is_empty() {
            return String::new();
        }
        let rendered: Vec<String> = substitutions
            .iter()
            .map(|t| crate::term::format_term(&t.symbols(ctx), ctx))
            .collect();
        format!("<{}>", rendered.join(", "))
    }

    match symbol {
        Symbol::Protocol(p) => format!("[{}]", ctx.resolve_ident(*p)),
        Symbol::AssociatedType { protocols, name } => {
            let protos: Vec<&str> = protocols.iter().map(|p| ctx.resolve_ident(*p)).collect();
            format!("[{}:{}]", protos.join("&"), ctx.resolve_ident(*name))
        }
        Symbol::GenericParam { depth, index } => format!("τ_{}_{}", depth, index),
        Symbol::Name(n) => ctx.resolve_ident(*n).to_string(),
        Symbol::Superclass {
            class,
            substitutions,
        } => format!(
            "[superclass: {}{}]",
            ctx.resolve_ident(*class),
            subs(substitutions, ctx)
        ),
        Symbol::ConcreteType {
            name,
            substitutions,
        } => format!(
            "[concrete: {}{}]",
            ctx.resolve_ident(*name),
            subs(substitutions, ctx)
        ),
        Symbol::ConcreteConformance {
            name,
            substitutions,
            protocol,
        } => format!(
            "[concrete: {}{} : {}]",
            ctx.resolve_ident(*name),
            subs(substitutions, ctx),
            ctx.resolve_ident(*protocol)
        ),
    }
}
