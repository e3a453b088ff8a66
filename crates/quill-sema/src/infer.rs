//! Bidirectional inference between partially known nodes.
//!
//! Placeholders live in the table's `ena` union-find. Inference walks both
//! sides in lockstep: where one side is an unresolved placeholder it is
//! solved to the other side, where both have structure the heads must agree.
//! A call either succeeds as a whole or leaves every placeholder as it was.

use quill_common::Span;
use tracing::trace;

use crate::error::TypeError;
use crate::handle::{Handle, Type, TypeVar, Uni};
use crate::node::{Kind, NodeId, NodeKind, UnknownKey};
use crate::table::TypeTable;

impl TypeTable {
    /// Reconcile `a` with `b`, solving placeholders on either side.
    ///
    /// Returns `false` on the first disagreement, in which case no
    /// placeholder resolution made during the call survives.
    pub fn infer(&mut self, a: impl Into<Uni>, b: impl Into<Uni>) -> bool {
        let a = a.into();
        let b = b.into();
        let snapshot = self.unknowns.snapshot();
        let ok = self.infer_rec(a.id(), b.id());
        if ok {
            self.unknowns.commit(snapshot);
        } else {
            self.unknowns.rollback_to(snapshot);
        }
        trace!(a = %self.display(a), b = %self.display(b), ok, "infer");
        ok
    }

    /// Semantic equality of handles: same representative, either side an
    /// error sentinel, or successful inference.
    pub fn handle_eq(&mut self, a: impl Into<Uni>, b: impl Into<Uni>) -> bool {
        let a = a.into();
        let b = b.into();
        self.deref(a) == self.deref(b) || self.is_error(a) || self.is_error(b) || self.infer(a, b)
    }

    /// [`TypeTable::handle_eq`] that records a [`TypeError::Contradiction`]
    /// when the types disagree.
    pub fn unify_or_report(&mut self, expected: Type, found: Type, span: Option<Span>) -> bool {
        if self.handle_eq(expected, found) {
            return true;
        }
        let err = TypeError::Contradiction {
            expected: self.render(expected),
            found: self.render(found),
            span,
        };
        self.errors.push(err);
        false
    }

    fn placeholder(&self, id: NodeId) -> Option<UnknownKey> {
        match self.nodes[id.index()].kind {
            NodeKind::Unknown(key) => Some(key),
            _ => None,
        }
    }

    fn infer_rec(&mut self, a: NodeId, b: NodeId) -> bool {
        let a = self.resolve(Uni::from_id(a));
        let b = self.resolve(Uni::from_id(b));
        if a == b {
            return true;
        }
        match (self.placeholder(a), self.placeholder(b)) {
            (Some(ka), Some(kb)) => self.unknowns.unify_var_var(ka, kb).is_ok(),
            (Some(key), None) => self.solve(key, b),
            (None, Some(key)) => self.solve(key, a),
            (None, None) => self.infer_structure(a, b),
        }
    }

    fn solve(&mut self, key: UnknownKey, value: NodeId) -> bool {
        if self.occurs(key, value) {
            trace!(placeholder = key.index(), "occurs check failed");
            return false;
        }
        self.unknowns.unify_var_value(key, Some(value)).is_ok()
    }

    /// Whether placeholder `key` appears anywhere inside `id`.
    fn occurs(&mut self, key: UnknownKey, id: NodeId) -> bool {
        let id = self.resolve(Uni::from_id(id));
        if let Some(other) = self.placeholder(id) {
            return self.unknowns.unioned(key, other);
        }
        let node = &self.nodes[id.index()];
        let mut parts: Vec<NodeId> = node.elems.iter().map(|e| e.id()).collect();
        if let NodeKind::Impl(info) = &node.kind {
            parts.push(info.bound.id());
        }
        parts.into_iter().any(|part| self.occurs(key, part))
    }

    fn infer_structure(&mut self, a: NodeId, b: NodeId) -> bool {
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

        let vars_a = na.type_vars.clone();
        let vars_b = nb.type_vars.clone();
        let mut pairs: Vec<(NodeId, NodeId)> = na
            .elems
            .iter()
            .zip(&nb.elems)
            .map(|(x, y)| (x.id(), y.id()))
            .collect();
        match (&na.kind, &nb.kind) {
            (NodeKind::Bound(x), NodeKind::Bound(y)) => {
                if !self.structural_eq(x.trait_, y.trait_) {
                    return false;
                }
            }
            (NodeKind::Impl(x), NodeKind::Impl(y)) => pairs.push((x.bound.id(), y.bound.id())),
            _ => {}
        }

        self.link_vars(&vars_a, &vars_b);
        let ok = self.infer_var_bounds(&vars_a, &vars_b)
            && pairs.into_iter().all(|(x, y)| self.infer_rec(x, y));
        self.unlink_vars(&vars_a);
        ok
    }

    fn infer_var_bounds(&mut self, xs: &[TypeVar], ys: &[TypeVar]) -> bool {
        xs.iter().zip(ys).all(|(&x, &y)| {
            let bx = self.var_bounds(x).to_vec();
            let by = self.var_bounds(y).to_vec();
            bx.len() == by.len()
                && bx
                    .into_iter()
                    .zip(by)
                    .all(|(p, q)| self.infer_rec(p.id(), q.id()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::PrimKind;

    #[test]
    fn repeated_placeholder_must_agree() {
        let mut table = TypeTable::new();
        let i32_ = table.prim(PrimKind::I32);
        let bool_ = table.prim(PrimKind::Bool);
        let u = table.unknown();
        let generic = table.fn_type(&[u.into(), u.into()], i32_);
        let concrete = table.fn_type(&[i32_, bool_], i32_);

        assert!(!table.infer(generic, concrete));
        // The partial solution `?0 = i32` was rolled back.
        assert_eq!(table.resolve(u), u.id());
    }

    #[test]
    fn distinct_placeholders_resolve() {
        let mut table = TypeTable::new();
        let i32_ = table.prim(PrimKind::I32);
        let bool_ = table.prim(PrimKind::Bool);
        let u0 = table.unknown();
        let u1 = table.unknown();
        let generic = table.fn_type(&[u0.into(), u1.into()], i32_);
        let concrete = table.fn_type(&[i32_, bool_], i32_);

        assert!(table.infer(generic, concrete));
        assert_eq!(table.resolve(u0), i32_.id());
        assert_eq!(table.resolve(u1), bool_.id());
    }

    #[test]
    fn linked_placeholders_share_a_solution() {
        let mut table = TypeTable::new();
        let u0 = table.unknown();
        let u1 = table.unknown();
        assert!(table.infer(u0, u1));
        assert_eq!(table.resolve(u0), table.resolve(u1));
        let f64_ = table.prim(PrimKind::F64);
        assert!(table.infer(f64_, u1));
        assert_eq!(table.resolve(u0), f64_.id());
    }

    #[test]
    fn occurs_check() {
        let mut table = TypeTable::new();
        let u = table.unknown();
        let f = table.fn_type(&[], u.into());
        assert!(!table.infer(u, f));
        assert!(!table.is_known(u));
    }

    #[test]
    fn mismatched_heads_fail() {
        let mut table = TypeTable::new();
        let u8_ = table.prim(PrimKind::U8);
        let owned = table.owned_ptr(u8_);
        let borrowed = table.borrowed_ptr(u8_);
        assert!(!table.infer(owned, borrowed));
        let a = table.definite_array(u8_, 2);
        let b = table.definite_array(u8_, 3);
        assert!(!table.infer(a, b));
    }

    #[test]
    fn generics_infer_modulo_renaming() {
        let mut table = TypeTable::new();
        let t = table.type_var("T");
        let f = table.fn_type(&[t.into()], t.into());
        table.bind(f, t);
        let u = table.type_var("U");
        let p = table.unknown();
        let g = table.fn_type(&[u.into()], p.into());
        table.bind(g, u);

        assert!(table.infer(g, f));
        assert_eq!(table.resolve(p), t.id());
    }

    #[test]
    fn error_absorbs_in_handle_eq() {
        let mut table = TypeTable::new();
        let err = table.type_error();
        let bool_ = table.prim(PrimKind::Bool);
        assert!(table.handle_eq(err, bool_));
        assert!(!table.infer(err, bool_));
    }

    #[test]
    fn unify_or_report_records_contradiction() {
        let mut table = TypeTable::new();
        let i8_ = table.prim(PrimKind::I8);
        let u8_ = table.prim(PrimKind::U8);
        assert!(!table.unify_or_report(i8_, u8_, Some(Span::new(4, 9))));
        assert_eq!(
            table.errors,
            vec![TypeError::Contradiction {
                expected: "i8".into(),
                found: "u8".into(),
                span: Some(Span::new(4, 9)),
            }]
        );
    }
}
