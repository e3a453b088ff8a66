//! Node representation for the Quill type system.
//!
//! Every type, type variable, trait, bound and impl is a node in the
//! [`TypeTable`](crate::table::TypeTable) arena. A node has a kind (with a
//! kind-specific payload), an ordered list of operand types, an ordered list
//! of type variables bound at it, and a representative slot filled exactly
//! once by canonicalization.

use std::cell::Cell;
use std::fmt;

use rustc_hash::FxHashMap;

use crate::handle::{Bound, FnType, Impl, Trait, Type, TypeVar};

/// Index of a node in the type table. Doubles as the node's unique id:
/// ids are issued in allocation order and never reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        match u32::try_from(index) {
            Ok(raw) => NodeId(raw),
            Err(_) => panic!("type table exceeded u32::MAX nodes"),
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque reference to a declaration owned by AST processing (a struct,
/// trait or impl item). The core only compares declaration ids.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub u32);

/// Primitive scalar types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrimKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl PrimKind {
    pub const ALL: [PrimKind; 11] = [
        PrimKind::Bool,
        PrimKind::I8,
        PrimKind::I16,
        PrimKind::I32,
        PrimKind::I64,
        PrimKind::U8,
        PrimKind::U16,
        PrimKind::U32,
        PrimKind::U64,
        PrimKind::F32,
        PrimKind::F64,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PrimKind::Bool => "bool",
            PrimKind::I8 => "i8",
            PrimKind::I16 => "i16",
            PrimKind::I32 => "i32",
            PrimKind::I64 => "i64",
            PrimKind::U8 => "u8",
            PrimKind::U16 => "u16",
            PrimKind::U32 => "u32",
            PrimKind::U64 => "u64",
            PrimKind::F32 => "f32",
            PrimKind::F64 => "f64",
        }
    }

    pub(crate) fn slot(self) -> usize {
        self as usize
    }
}

/// Kind tag of a node, without payload.
///
/// Used for narrowing handles and as the first ingredient of the
/// structural hash.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Prim(PrimKind),
    Fn,
    Tuple,
    Struct,
    OwnedPtr,
    BorrowedPtr,
    DefiniteArray,
    IndefiniteArray,
    Error,
    NoRet,
    Unknown,
    TypeVar,
    Trait,
    Bound,
    Impl,
}

impl Kind {
    /// Whether nodes of this kind are types (as opposed to traits, bounds
    /// and impls).
    pub fn is_type(self) -> bool {
        !matches!(self, Kind::Trait | Kind::Bound | Kind::Impl)
    }
}

/// A unification metavariable key in the table's union-find.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct UnknownKey(pub(crate) u32);

impl UnknownKey {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Payload of a struct type.
#[derive(Clone, Debug)]
pub struct StructInfo {
    pub decl: DeclId,
    pub name: String,
}

/// Payload of a type variable.
#[derive(Clone, Debug)]
pub struct TypeVarInfo {
    pub name: String,
    /// Trait bounds restricting the instantiation of this variable.
    pub bounds: Vec<Bound>,
    /// The generic container this variable is bound at. Written once.
    pub bound_at: Option<NodeId>,
    /// Counterpart variable while two generics are compared for
    /// alpha-equivalence. `None` outside such a comparison.
    pub(crate) equiv: Cell<Option<NodeId>>,
}

impl TypeVarInfo {
    pub(crate) fn new(name: String) -> Self {
        TypeVarInfo {
            name,
            bounds: Vec::new(),
            bound_at: None,
            equiv: Cell::new(None),
        }
    }
}

/// Payload of a trait.
///
/// `decl == None` marks the error trait. `methods`, `super_bounds` and
/// `impls` are append-only registries and may grow after canonicalization.
#[derive(Clone, Debug)]
pub struct TraitInfo {
    pub decl: Option<DeclId>,
    pub name: String,
    pub methods: FxHashMap<String, FnType>,
    pub super_bounds: Vec<Bound>,
    /// Implementations of this trait, keyed by the (dereferenced) implementing type.
    pub impls: FxHashMap<NodeId, Vec<Impl>>,
}

/// Payload of a bound: the trait it instantiates plus a cache of methods
/// already resolved through it. Only successful lookups are cached, each
/// tagged with the table's method epoch at the time of the lookup.
#[derive(Clone, Debug)]
pub struct BoundInfo {
    pub trait_: Trait,
    pub(crate) method_cache: FxHashMap<String, (u64, FnType)>,
}

impl BoundInfo {
    pub(crate) fn new(trait_: Trait) -> Self {
        BoundInfo {
            trait_,
            method_cache: FxHashMap::default(),
        }
    }
}

/// Payload of an impl. The implementing type is the impl's single operand.
#[derive(Clone, Debug)]
pub struct ImplInfo {
    pub decl: DeclId,
    pub bound: Bound,
}

/// Kind of a node together with its kind-specific payload.
#[derive(Clone, Debug)]
pub enum NodeKind {
    Prim(PrimKind),
    /// Operands are the parameters followed by the return type.
    Fn,
    Tuple,
    /// Operands are the struct's type arguments.
    Struct(StructInfo),
    OwnedPtr,
    BorrowedPtr,
    /// Fixed-length array carrying its dimension.
    DefiniteArray(u64),
    IndefiniteArray,
    Error,
    NoRet,
    Unknown(UnknownKey),
    TypeVar(TypeVarInfo),
    Trait(TraitInfo),
    /// Operands are the bound's type arguments.
    Bound(BoundInfo),
    Impl(ImplInfo),
}

impl NodeKind {
    pub fn tag(&self) -> Kind {
        match self {
            NodeKind::Prim(p) => Kind::Prim(*p),
            NodeKind::Fn => Kind::Fn,
            NodeKind::Tuple => Kind::Tuple,
            NodeKind::Struct(_) => Kind::Struct,
            NodeKind::OwnedPtr => Kind::OwnedPtr,
            NodeKind::BorrowedPtr => Kind::BorrowedPtr,
            NodeKind::DefiniteArray(_) => Kind::DefiniteArray,
            NodeKind::IndefiniteArray => Kind::IndefiniteArray,
            NodeKind::Error => Kind::Error,
            NodeKind::NoRet => Kind::NoRet,
            NodeKind::Unknown(_) => Kind::Unknown,
            NodeKind::TypeVar(_) => Kind::TypeVar,
            NodeKind::Trait(_) => Kind::Trait,
            NodeKind::Bound(_) => Kind::Bound,
            NodeKind::Impl(_) => Kind::Impl,
        }
    }

    /// Whether `self` and `other` agree on everything except operands and
    /// type variables: the tag plus primitive kind, declaration, array
    /// dimension or trait.
    ///
    /// Unknowns and type variables never agree here; they are compared by
    /// identity and by equivalence link respectively.
    pub(crate) fn same_head(&self, other: &NodeKind) -> bool {
        match (self, other) {
            (NodeKind::Prim(a), NodeKind::Prim(b)) => a == b,
            (NodeKind::Struct(a), NodeKind::Struct(b)) => a.decl == b.decl,
            (NodeKind::DefiniteArray(a), NodeKind::DefiniteArray(b)) => a == b,
            (NodeKind::Trait(a), NodeKind::Trait(b)) => a.decl == b.decl,
            (NodeKind::Impl(a), NodeKind::Impl(b)) => a.decl == b.decl,
            (NodeKind::Unknown(_), _) | (NodeKind::TypeVar(_), _) => false,
            // Bounds additionally compare their traits, done by the caller.
            (a, b) => a.tag() == b.tag(),
        }
    }

    /// A payload for a fresh copy of a node of this kind, with empty
    /// registries. Used by specialization.
    pub(crate) fn fresh_copy(&self) -> NodeKind {
        match self {
            NodeKind::Struct(info) => NodeKind::Struct(info.clone()),
            NodeKind::Bound(info) => NodeKind::Bound(BoundInfo::new(info.trait_)),
            NodeKind::Impl(info) => NodeKind::Impl(info.clone()),
            NodeKind::TypeVar(info) => NodeKind::TypeVar(TypeVarInfo::new(info.name.clone())),
            NodeKind::Trait(info) => NodeKind::Trait(TraitInfo {
                decl: info.decl,
                name: info.name.clone(),
                methods: FxHashMap::default(),
                super_bounds: Vec::new(),
                impls: FxHashMap::default(),
            }),
            NodeKind::Prim(p) => NodeKind::Prim(*p),
            NodeKind::Fn => NodeKind::Fn,
            NodeKind::Tuple => NodeKind::Tuple,
            NodeKind::OwnedPtr => NodeKind::OwnedPtr,
            NodeKind::BorrowedPtr => NodeKind::BorrowedPtr,
            NodeKind::DefiniteArray(dim) => NodeKind::DefiniteArray(*dim),
            NodeKind::IndefiniteArray => NodeKind::IndefiniteArray,
            NodeKind::Error => NodeKind::Error,
            NodeKind::NoRet => NodeKind::NoRet,
            NodeKind::Unknown(key) => NodeKind::Unknown(*key),
        }
    }
}

/// A unifiable node.
#[derive(Clone, Debug)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// The operands of this type constructor.
    pub elems: Vec<Type>,
    /// Type variables bound at this node, in declaration order.
    pub type_vars: Vec<TypeVar>,
    /// Canonical representative. Written once by canonicalization.
    pub representative: Option<NodeId>,
    /// Impls registered for this type. Append-only.
    pub impls: Vec<Impl>,
}

impl Node {
    pub(crate) fn new(id: NodeId, kind: NodeKind, elems: Vec<Type>) -> Self {
        Node {
            id,
            kind,
            elems,
            type_vars: Vec::new(),
            representative: None,
            impls: Vec::new(),
        }
    }

    pub fn is_canonical(&self) -> bool {
        self.representative.is_some()
    }

    /// Whether this node has type variables bound at it.
    pub fn is_generic(&self) -> bool {
        !self.type_vars.is_empty()
    }
}

// ── ena trait implementations ──────────────────────────────────────────

impl ena::unify::UnifyKey for UnknownKey {
    type Value = Option<NodeId>;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        UnknownKey(u)
    }

    fn tag() -> &'static str {
        "UnknownKey"
    }
}

impl ena::unify::EqUnifyValue for NodeId {}
