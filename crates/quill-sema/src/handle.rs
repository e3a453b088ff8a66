//! Typed handles onto table nodes.
//!
//! A handle is a `Copy` wrapper around a [`NodeId`]. The handle type encodes
//! which kinds of node it may point at; the table checks this on narrowing
//! ([`TypeTable::isa`](crate::table::TypeTable::isa)). Derived equality on a
//! handle is raw node identity. Semantic equality, which looks through
//! representatives, inference and error sentinels, is
//! [`TypeTable::handle_eq`](crate::table::TypeTable::handle_eq).

use crate::node::{Kind, NodeId};

/// Common interface of all typed handles.
pub trait Handle: Copy + std::fmt::Debug + Into<Uni> {
    /// Name of the handle kind, used in narrowing panics.
    const WHAT: &'static str;

    /// Whether a node of `kind` may sit behind this handle.
    fn accepts(kind: Kind) -> bool;

    fn from_id(id: NodeId) -> Self;

    fn id(self) -> NodeId;
}

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, $what:literal, |$k:ident| $accepts:expr) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $name(NodeId);

        impl Handle for $name {
            const WHAT: &'static str = $what;

            fn accepts($k: Kind) -> bool {
                $accepts
            }

            fn from_id(id: NodeId) -> Self {
                $name(id)
            }

            fn id(self) -> NodeId {
                self.0
            }
        }
    };
}

macro_rules! widen {
    ($from:ident => $($to:ident),+) => {
        $(
            impl From<$from> for $to {
                fn from(h: $from) -> Self {
                    $to(h.0)
                }
            }
        )+
    };
}

handle!(
    /// Any node.
    Uni, "node", |_k| true
);
handle!(
    /// Any type: primitives, compound types, sentinels, unknowns and type variables.
    Type, "type", |k| k.is_type()
);
handle!(FnType, "function type", |k| k == Kind::Fn);
handle!(TypeVar, "type variable", |k| k == Kind::TypeVar);
handle!(
    /// A unification metavariable.
    UnknownType, "unknown type", |k| k == Kind::Unknown
);
handle!(Trait, "trait", |k| k == Kind::Trait);
handle!(
    /// A trait applied to concrete type arguments.
    Bound, "bound", |k| k == Kind::Bound
);
handle!(Impl, "impl", |k| k == Kind::Impl);

widen!(Type => Uni);
widen!(FnType => Type, Uni);
widen!(TypeVar => Type, Uni);
widen!(UnknownType => Type, Uni);
widen!(Trait => Uni);
widen!(Bound => Uni);
widen!(Impl => Uni);
