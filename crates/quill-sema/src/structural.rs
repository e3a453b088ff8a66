//! Structural identity of nodes: generic-parameter binding, closedness,
//! and the alpha-equivalent hash and equality used by the intern set.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::handle::{Handle, TypeVar, Uni};
use crate::node::{Kind, NodeId, NodeKind};
use crate::table::TypeTable;

impl TypeTable {
    /// Attach the free variable `var` to `node` as its next generic parameter.
    ///
    /// Panics if `var` is already bound or `node` is already canonical.
    pub fn bind(&mut self, node: impl Into<Uni>, var: TypeVar) {
        let id = node.into().id();
        assert!(
            !self.nodes[id.index()].is_canonical(),
            "cannot bind {} onto canonical node {}",
            self.display(var),
            self.display(Uni::from_id(id))
        );
        if let Some(at) = self.type_var_info(var).bound_at {
            panic!(
                "type variable {} is already bound at {}",
                self.display(var),
                self.display(Uni::from_id(at))
            );
        }
        self.type_var_info_mut(var).bound_at = Some(id);
        self.nodes[id.index()].type_vars.push(var);
    }

    /// Whether every type variable reachable from `h` is bound at some
    /// generic. Placeholders count as closed; what they resolve to is
    /// checked when they are canonicalized.
    pub fn is_closed(&self, h: impl Into<Uni>) -> bool {
        let node = &self.nodes[self.deref(h).index()];
        if node.is_canonical() {
            return true;
        }
        match &node.kind {
            NodeKind::TypeVar(info) => return info.bound_at.is_some(),
            NodeKind::Unknown(_) => return true,
            NodeKind::Bound(info) if !self.is_closed(info.trait_) => return false,
            NodeKind::Impl(info) if !self.is_closed(info.bound) => return false,
            _ => {}
        }
        node.type_vars
            .iter()
            .all(|&var| self.var_bounds(var).iter().all(|&b| self.is_closed(b)))
            && node.elems.iter().all(|&elem| self.is_closed(elem))
    }

    /// Whether no placeholder reachable from `h` is still unresolved.
    pub fn is_known(&mut self, h: impl Into<Uni>) -> bool {
        let id = self.resolve(h);
        let node = &self.nodes[id.index()];
        let mut parts: Vec<Uni> = node.elems.iter().map(|&e| e.into()).collect();
        match &node.kind {
            NodeKind::Unknown(_) => return false,
            NodeKind::Impl(info) => parts.push(info.bound.into()),
            _ => {}
        }
        parts.into_iter().all(|part| self.is_known(part))
    }

    /// Hash of `h` consistent with [`TypeTable::structural_eq`]: two nodes
    /// that compare equal hash equal. Type variables contribute only their
    /// kind and bound count, so alpha-equivalent generics collide.
    pub fn structural_hash(&self, h: impl Into<Uni>) -> u64 {
        let mut state = FxHasher::default();
        self.hash_into(h.into().id(), &mut state);
        state.finish()
    }

    fn hash_into(&self, id: NodeId, state: &mut FxHasher) {
        let node = &self.nodes[self.deref(Uni::from_id(id)).index()];
        node.kind.tag().hash(state);
        match &node.kind {
            NodeKind::Struct(info) => info.decl.hash(state),
            NodeKind::DefiniteArray(dim) => dim.hash(state),
            NodeKind::Trait(info) => info.decl.hash(state),
            NodeKind::Impl(info) => {
                info.decl.hash(state);
                self.hash_into(info.bound.id(), state);
            }
            NodeKind::Bound(info) => self.hash_into(info.trait_.id(), state),
            NodeKind::Unknown(key) => key.hash(state),
            NodeKind::TypeVar(info) => {
                info.bounds.len().hash(state);
                return;
            }
            _ => {}
        }
        node.type_vars.len().hash(state);
        for &var in &node.type_vars {
            self.var_bounds(var).len().hash(state);
        }
        node.elems.len().hash(state);
        for elem in &node.elems {
            self.hash_into(elem.id(), state);
        }
    }

    /// Structural equality modulo renaming of bound type variables.
    ///
    /// Both sides are dereferenced through their representatives. While the
    /// type variables of two generics are compared, each variable of `a` is
    /// linked to its counterpart in `b`; the links are cleared afterwards.
    pub fn structural_eq(&self, a: impl Into<Uni>, b: impl Into<Uni>) -> bool {
        let a = self.deref(a);
        let b = self.deref(b);
        if a == b {
            return true;
        }
        let na = &self.nodes[a.index()];
        let nb = &self.nodes[b.index()];

        if let (NodeKind::TypeVar(info), Kind::TypeVar) = (&na.kind, nb.kind.tag()) {
            return info.equiv.get() == Some(b);
        }
        if !na.kind.same_head(&nb.kind)
            || na.elems.len() != nb.elems.len()
            || na.type_vars.len() != nb.type_vars.len()
        {
            return false;
        }

        self.link_vars(&na.type_vars, &nb.type_vars);
        let equal = self.vars_bounds_eq(&na.type_vars, &nb.type_vars)
            && na
                .elems
                .iter()
                .zip(&nb.elems)
                .all(|(&x, &y)| self.structural_eq(x, y))
            && match (&na.kind, &nb.kind) {
                (NodeKind::Bound(x), NodeKind::Bound(y)) => self.structural_eq(x.trait_, y.trait_),
                (NodeKind::Impl(x), NodeKind::Impl(y)) => self.structural_eq(x.bound, y.bound),
                _ => true,
            };
        self.unlink_vars(&na.type_vars);
        equal
    }

    fn vars_bounds_eq(&self, xs: &[TypeVar], ys: &[TypeVar]) -> bool {
        xs.iter().zip(ys).all(|(&x, &y)| {
            let bx = self.var_bounds(x);
            let by = self.var_bounds(y);
            bx.len() == by.len() && bx.iter().zip(by).all(|(&p, &q)| self.structural_eq(p, q))
        })
    }

    pub(crate) fn link_vars(&self, xs: &[TypeVar], ys: &[TypeVar]) {
        for (&x, &y) in xs.iter().zip(ys) {
            self.type_var_info(x).equiv.set(Some(y.id()));
        }
    }

    pub(crate) fn unlink_vars(&self, xs: &[TypeVar]) {
        for &x in xs {
            self.type_var_info(x).equiv.set(None);
        }
    }
}
