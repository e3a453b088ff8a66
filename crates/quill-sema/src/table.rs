//! The canonicalization table.
//!
//! One `TypeTable` exists per compilation. It owns every node as an index
//! arena, hash-conses closed nodes into canonical representatives, owns the
//! union-find of unknown placeholders, and accumulates the semantic errors
//! reported by the checked entry points.
//!
//! Construction of compound nodes never canonicalizes: callers build a node,
//! bind its type variables, then call [`TypeTable::canonicalize`] once the
//! node is closed.

use ena::unify::InPlaceUnificationTable;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::config::SemaConfig;
use crate::error::TypeError;
use crate::handle::{Bound, FnType, Handle, Impl, Trait, Type, TypeVar, Uni, UnknownType};
use crate::node::{
    BoundInfo, DeclId, ImplInfo, Kind, Node, NodeId, NodeKind, PrimKind, StructInfo, TraitInfo,
    TypeVarInfo, UnknownKey,
};

/// Outcome of [`TypeTable::canonicalize`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Canonical {
    /// The node already had a representative; nothing changed.
    AlreadyKnown,
    /// A structurally equal representative existed; the node now aliases it.
    FoundEqual,
    /// The node became its own representative.
    New,
}

pub struct TypeTable {
    pub(crate) nodes: Vec<Node>,
    /// Representatives bucketed by structural hash.
    interned: FxHashMap<u64, Vec<NodeId>>,
    pub(crate) unknowns: InPlaceUnificationTable<UnknownKey>,
    /// Node of each unknown key, indexed by key.
    pub(crate) unknown_nodes: Vec<UnknownType>,
    /// Semantic errors recorded by the checked entry points.
    pub errors: Vec<TypeError>,
    pub(crate) config: SemaConfig,
    /// Bumped whenever a trait gains a method or super-bound; cached method
    /// lookups from an older epoch are stale.
    pub(crate) method_epoch: u64,
    prims: Vec<Type>,
    type_error: Type,
    type_noret: Type,
    trait_error: Trait,
    bound_error: Bound,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    pub fn new() -> Self {
        Self::with_config(SemaConfig::default())
    }

    pub fn with_config(config: SemaConfig) -> Self {
        let placeholder = NodeId::from_index(0);
        let mut table = TypeTable {
            nodes: Vec::new(),
            interned: FxHashMap::default(),
            unknowns: InPlaceUnificationTable::new(),
            unknown_nodes: Vec::new(),
            errors: Vec::new(),
            config,
            method_epoch: 0,
            prims: Vec::with_capacity(PrimKind::ALL.len()),
            type_error: Type::from_id(placeholder),
            type_noret: Type::from_id(placeholder),
            trait_error: Trait::from_id(placeholder),
            bound_error: Bound::from_id(placeholder),
        };

        table.type_error = Type::from_id(table.alloc(NodeKind::Error, Vec::new()));
        table.trait_error = Trait::from_id(table.alloc(
            NodeKind::Trait(TraitInfo {
                decl: None,
                name: "<trait error>".to_string(),
                methods: FxHashMap::default(),
                super_bounds: Vec::new(),
                impls: FxHashMap::default(),
            }),
            Vec::new(),
        ));
        table.bound_error = Bound::from_id(table.alloc(
            NodeKind::Bound(BoundInfo::new(table.trait_error)),
            Vec::new(),
        ));
        table.type_noret = Type::from_id(table.alloc(NodeKind::NoRet, Vec::new()));
        for prim in PrimKind::ALL {
            let id = table.alloc(NodeKind::Prim(prim), Vec::new());
            table.prims.push(Type::from_id(id));
        }

        let singletons: Vec<Uni> = [
            Uni::from(table.type_error),
            table.trait_error.into(),
            table.bound_error.into(),
            table.type_noret.into(),
        ]
        .into_iter()
        .chain(table.prims.iter().map(|&p| Uni::from(p)))
        .collect();
        for singleton in singletons {
            table.canonicalize(singleton);
        }
        table
    }

    pub fn config(&self) -> &SemaConfig {
        &self.config
    }

    pub(crate) fn alloc(&mut self, kind: NodeKind, elems: Vec<Type>) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node::new(id, kind, elems));
        id
    }

    pub(crate) fn set_representative(&mut self, id: NodeId, rep: NodeId) {
        let node = &mut self.nodes[id.index()];
        assert!(
            node.representative.is_none(),
            "representative of {} assigned twice",
            id
        );
        node.representative = Some(rep);
    }

    // ── Singletons ─────────────────────────────────────────────────────

    pub fn prim(&self, kind: PrimKind) -> Type {
        self.prims[kind.slot()]
    }

    pub fn type_error(&self) -> Type {
        self.type_error
    }

    pub fn type_noret(&self) -> Type {
        self.type_noret
    }

    pub fn trait_error(&self) -> Trait {
        self.trait_error
    }

    pub fn bound_error(&self) -> Bound {
        self.bound_error
    }

    /// Whether `h` stands for an error: the error type, a trait without a
    /// declaration, or a bound over such a trait. Decided by kind, so copies
    /// made by specialization stay errors.
    pub fn is_error(&self, h: impl Into<Uni>) -> bool {
        match &self.nodes[self.deref(h).index()].kind {
            NodeKind::Error => true,
            NodeKind::Trait(info) => info.decl.is_none(),
            NodeKind::Bound(info) => self.is_error(info.trait_),
            _ => false,
        }
    }

    // ── Construction ───────────────────────────────────────────────────

    /// Function type over `params` returning `ret`.
    pub fn fn_type(&mut self, params: &[Type], ret: Type) -> FnType {
        let mut elems = params.to_vec();
        elems.push(ret);
        FnType::from_id(self.alloc(NodeKind::Fn, elems))
    }

    pub fn tuple_type(&mut self, elems: &[Type]) -> Type {
        Type::from_id(self.alloc(NodeKind::Tuple, elems.to_vec()))
    }

    /// The unit type, the empty tuple.
    pub fn unit(&mut self) -> Type {
        self.tuple_type(&[])
    }

    pub fn struct_type(&mut self, decl: DeclId, name: &str, args: &[Type]) -> Type {
        let info = StructInfo {
            decl,
            name: name.to_string(),
        };
        Type::from_id(self.alloc(NodeKind::Struct(info), args.to_vec()))
    }

    pub fn owned_ptr(&mut self, pointee: Type) -> Type {
        Type::from_id(self.alloc(NodeKind::OwnedPtr, vec![pointee]))
    }

    pub fn borrowed_ptr(&mut self, pointee: Type) -> Type {
        Type::from_id(self.alloc(NodeKind::BorrowedPtr, vec![pointee]))
    }

    pub fn definite_array(&mut self, elem: Type, dim: u64) -> Type {
        Type::from_id(self.alloc(NodeKind::DefiniteArray(dim), vec![elem]))
    }

    pub fn indefinite_array(&mut self, elem: Type) -> Type {
        Type::from_id(self.alloc(NodeKind::IndefiniteArray, vec![elem]))
    }

    /// A fresh, unresolved placeholder.
    pub fn unknown(&mut self) -> UnknownType {
        let key = self.unknowns.new_key(None);
        let id = self.alloc(NodeKind::Unknown(key), Vec::new());
        let unknown = UnknownType::from_id(id);
        debug_assert_eq!(key.index() as usize, self.unknown_nodes.len());
        self.unknown_nodes.push(unknown);
        unknown
    }

    /// A fresh, unbound type variable. Bind it with [`TypeTable::bind`].
    pub fn type_var(&mut self, name: &str) -> TypeVar {
        TypeVar::from_id(self.alloc(NodeKind::TypeVar(TypeVarInfo::new(name.to_string())), Vec::new()))
    }

    /// Restrict `var` to types implementing `bound`.
    pub fn add_bound(&mut self, var: TypeVar, bound: Bound) {
        let node = &self.nodes[var.id().index()];
        assert!(
            !node.is_canonical(),
            "cannot add bound {} to canonical type variable {}",
            self.display(bound),
            self.display(var)
        );
        self.type_var_info_mut(var).bounds.push(bound);
    }

    /// A trait declaration. Type variables, methods and super-bounds are
    /// attached afterwards.
    pub fn trait_(&mut self, decl: DeclId, name: &str) -> Trait {
        let info = TraitInfo {
            decl: Some(decl),
            name: name.to_string(),
            methods: FxHashMap::default(),
            super_bounds: Vec::new(),
            impls: FxHashMap::default(),
        };
        Trait::from_id(self.alloc(NodeKind::Trait(info), Vec::new()))
    }

    /// `trait` applied to `args`. The argument count must match the trait's
    /// type variables; see [`TypeTable::instantiate_trait`] for the checked form.
    pub fn bound(&mut self, trait_: Trait, args: &[Type]) -> Bound {
        let expected = self.type_vars(trait_).len();
        assert_eq!(
            expected,
            args.len(),
            "bound of {} needs {} argument(s)",
            self.display(trait_),
            expected
        );
        Bound::from_id(self.alloc(NodeKind::Bound(BoundInfo::new(trait_)), args.to_vec()))
    }

    /// An implementation of `bound` for `ty`. Register it with
    /// [`TypeTable::add_impl`].
    pub fn impl_(&mut self, decl: DeclId, bound: Bound, ty: Type) -> Impl {
        Impl::from_id(self.alloc(NodeKind::Impl(ImplInfo { decl, bound }), vec![ty]))
    }

    // ── Lookup ─────────────────────────────────────────────────────────

    /// The node's representative if it has one, else the node itself.
    pub fn deref(&self, h: impl Into<Uni>) -> NodeId {
        let id = h.into().id();
        self.nodes[id.index()].representative.unwrap_or(id)
    }

    /// Dereference `h` and follow resolved placeholders to their instance.
    /// An unresolved placeholder resolves to the node of its root key, so
    /// linked placeholders resolve to the same node.
    pub fn resolve(&mut self, h: impl Into<Uni>) -> NodeId {
        let mut id = self.deref(h);
        while self.nodes[id.index()].kind.tag() == Kind::Unknown {
            let key = self.unknown_key(id);
            match self.unknowns.probe_value(key) {
                Some(instance) => id = self.deref(Uni::from_id(instance)),
                None => {
                    let root = self.unknowns.find(key);
                    return self.unknown_nodes[root.index() as usize].id();
                }
            }
        }
        id
    }

    /// The raw node behind `h`, without dereferencing.
    pub fn node(&self, h: impl Into<Uni>) -> &Node {
        &self.nodes[h.into().id().index()]
    }

    /// Kind of the dereferenced node.
    pub fn kind(&self, h: impl Into<Uni>) -> Kind {
        self.nodes[self.deref(h).index()].kind.tag()
    }

    pub fn is_canonical(&self, h: impl Into<Uni>) -> bool {
        self.node(h).is_canonical()
    }

    /// Narrow `h` to handle type `H`, or `None` if the dereferenced node is
    /// of another kind.
    pub fn isa<H: Handle>(&self, h: impl Into<Uni>) -> Option<H> {
        let id = self.deref(h);
        if H::accepts(self.nodes[id.index()].kind.tag()) {
            Some(H::from_id(id))
        } else {
            None
        }
    }

    /// Narrow `h` to handle type `H`. Panics if the node is of another kind.
    pub fn as_<H: Handle>(&self, h: impl Into<Uni>) -> H {
        let uni = h.into();
        match self.isa::<H>(uni) {
            Some(narrowed) => narrowed,
            None => panic!("{} is not a {}", self.display(uni), H::WHAT),
        }
    }

    pub fn type_vars(&self, h: impl Into<Uni>) -> &[TypeVar] {
        &self.nodes[self.deref(h).index()].type_vars
    }

    pub fn elems(&self, h: impl Into<Uni>) -> &[Type] {
        &self.nodes[self.deref(h).index()].elems
    }

    /// Parameter types of a function type.
    pub fn params(&self, f: FnType) -> &[Type] {
        let elems = self.elems(f);
        &elems[..elems.len() - 1]
    }

    /// Return type of a function type.
    pub fn ret(&self, f: FnType) -> Type {
        let elems = self.elems(f);
        elems[elems.len() - 1]
    }

    pub(crate) fn unknown_key(&self, id: NodeId) -> UnknownKey {
        match self.nodes[id.index()].kind {
            NodeKind::Unknown(key) => key,
            _ => panic!("node {} is not a placeholder", id),
        }
    }

    pub(crate) fn type_var_info(&self, var: TypeVar) -> &TypeVarInfo {
        match &self.nodes[var.id().index()].kind {
            NodeKind::TypeVar(info) => info,
            _ => panic!("{} is not a type variable", self.display(var)),
        }
    }

    pub(crate) fn type_var_info_mut(&mut self, var: TypeVar) -> &mut TypeVarInfo {
        match &mut self.nodes[var.id().index()].kind {
            NodeKind::TypeVar(info) => info,
            _ => panic!("node {} is not a type variable", var.id()),
        }
    }

    /// Bounds restricting `var`.
    pub fn var_bounds(&self, var: TypeVar) -> &[Bound] {
        &self.type_var_info(var).bounds
    }

    pub(crate) fn trait_info(&self, trait_: Trait) -> &TraitInfo {
        match &self.nodes[self.deref(trait_).index()].kind {
            NodeKind::Trait(info) => info,
            _ => panic!("{} is not a trait", self.display(trait_)),
        }
    }

    pub(crate) fn trait_info_mut(&mut self, trait_: Trait) -> &mut TraitInfo {
        let id = self.deref(trait_);
        match &mut self.nodes[id.index()].kind {
            NodeKind::Trait(info) => info,
            _ => panic!("node {} is not a trait", id),
        }
    }

    pub(crate) fn bound_info(&self, bound: Bound) -> &BoundInfo {
        match &self.nodes[self.deref(bound).index()].kind {
            NodeKind::Bound(info) => info,
            _ => panic!("{} is not a bound", self.display(bound)),
        }
    }

    /// The trait a bound instantiates.
    pub fn bound_trait(&self, bound: Bound) -> Trait {
        self.bound_info(bound).trait_
    }

    /// The bound an impl implements.
    pub fn impl_bound(&self, impl_: Impl) -> Bound {
        match &self.nodes[self.deref(impl_).index()].kind {
            NodeKind::Impl(info) => info.bound,
            _ => panic!("{} is not an impl", self.display(impl_)),
        }
    }

    /// The type an impl is for.
    pub fn impl_type(&self, impl_: Impl) -> Type {
        self.elems(impl_)[0]
    }

    // ── Canonicalization ───────────────────────────────────────────────

    /// Assign `h` its canonical representative.
    ///
    /// Panics if the node is not closed, or is a placeholder that has not
    /// been resolved.
    pub fn canonicalize(&mut self, h: impl Into<Uni>) -> Canonical {
        let id = h.into().id();
        if self.nodes[id.index()].is_canonical() {
            return Canonical::AlreadyKnown;
        }
        assert!(
            self.is_closed(Uni::from_id(id)),
            "cannot canonicalize open node {}",
            self.display(Uni::from_id(id))
        );

        let result = match self.nodes[id.index()].kind.tag() {
            Kind::Unknown => self.canonicalize_unknown(id),
            Kind::TypeVar => {
                let bounds = self.var_bounds(TypeVar::from_id(id)).to_vec();
                self.set_representative(id, id);
                for bound in bounds {
                    self.canonicalize(bound);
                }
                Canonical::New
            }
            _ => {
                self.canonicalize_parts(id);
                self.intern(id)
            }
        };
        debug!(node = %self.display(Uni::from_id(id)), ?result, "canonicalize");
        result
    }

    fn canonicalize_unknown(&mut self, id: NodeId) -> Canonical {
        let key = self.unknown_key(id);
        let instance = match self.unknowns.probe_value(key) {
            Some(instance) => Uni::from_id(instance),
            None => panic!("cannot canonicalize unresolved placeholder ?{}", key.index()),
        };
        let inner = self.canonicalize(instance);
        let rep = self.deref(instance);
        self.set_representative(id, rep);
        match inner {
            Canonical::New => Canonical::New,
            _ => Canonical::FoundEqual,
        }
    }

    fn canonicalize_parts(&mut self, id: NodeId) {
        let node = &self.nodes[id.index()];
        let vars = node.type_vars.clone();
        let elems = node.elems.clone();
        let extra: Option<Uni> = match &node.kind {
            NodeKind::Bound(info) => Some(info.trait_.into()),
            NodeKind::Impl(info) => Some(info.bound.into()),
            _ => None,
        };
        for var in vars {
            self.canonicalize(var);
        }
        for elem in elems {
            self.canonicalize(elem);
        }
        if let Some(extra) = extra {
            self.canonicalize(extra);
        }
    }

    fn intern(&mut self, id: NodeId) -> Canonical {
        let hash = self.structural_hash(Uni::from_id(id));
        let existing = self.interned.get(&hash).and_then(|bucket| {
            bucket
                .iter()
                .copied()
                .find(|&rep| self.structural_eq(Uni::from_id(rep), Uni::from_id(id)))
        });
        match existing {
            Some(rep) => {
                self.set_representative(id, rep);
                Canonical::FoundEqual
            }
            None => {
                self.set_representative(id, id);
                self.interned.entry(hash).or_default().push(id);
                Canonical::New
            }
        }
    }

    /// Replace every type variable of `generic` with a fresh placeholder.
    ///
    /// The placeholders are appended to `out_args` in variable order, ready
    /// for a later [`TypeTable::check_bounds`] once inference resolved them.
    pub fn instantiate_unknown<H: Handle>(&mut self, generic: H, out_args: &mut Vec<Type>) -> H {
        let count = self.type_vars(generic).len();
        let start = out_args.len();
        for _ in 0..count {
            let unknown = self.unknown();
            out_args.push(unknown.into());
        }
        let mut map = self.build_map(generic, &out_args[start..]);
        self.instantiate(generic, &mut map)
    }
}
