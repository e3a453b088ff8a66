//! Capture-avoiding substitution of type variables.
//!
//! [`TypeTable::specialize`] rewrites a node through a [`SpecializeMap`],
//! cloning the node's own generic parameters so the result is again a
//! generic of the same shape. [`TypeTable::instantiate`] discharges the
//! node's own parameters instead. Neither mutates its input; every rewritten
//! node is fresh and needs its own canonicalization.

use quill_common::Span;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::error::TypeError;
use crate::handle::{Bound, Handle, Type, TypeVar, Uni};
use crate::node::{Kind, NodeId, NodeKind};
use crate::table::TypeTable;

/// Substitution from (dereferenced) nodes to their replacements. Besides the
/// type-variable entries, specialization memoizes every node it rewrote.
pub type SpecializeMap = FxHashMap<NodeId, NodeId>;

impl TypeTable {
    /// Pair the type variables of `generic` positionally with `args`.
    ///
    /// Panics if the counts differ.
    pub fn build_map(&self, generic: impl Into<Uni>, args: &[Type]) -> SpecializeMap {
        let generic = generic.into();
        let vars = self.type_vars(generic);
        assert_eq!(
            vars.len(),
            args.len(),
            "{} takes {} type argument(s)",
            self.display(generic),
            vars.len()
        );
        vars.iter()
            .zip(args)
            .map(|(&var, &arg)| (self.deref(var), self.deref(arg)))
            .collect()
    }

    /// A map substituting `arg` for the single variable `var`.
    pub fn single_map(&self, var: TypeVar, arg: Type) -> SpecializeMap {
        let mut map = SpecializeMap::default();
        map.insert(self.deref(var), self.deref(arg));
        map
    }

    /// Rewrite `h` through `map`. The node's own generic parameters are
    /// cloned into fresh variables (with specialized bounds) that are bound
    /// at the result.
    pub fn specialize<H: Handle>(&mut self, h: H, map: &mut SpecializeMap) -> H {
        H::from_id(self.specialize_id(h.id(), map))
    }

    /// Rewrite `h` through `map`, which must cover every generic parameter
    /// of `h`. The result has no type variables of its own.
    pub fn instantiate<H: Handle>(&mut self, h: H, map: &mut SpecializeMap) -> H {
        let id = self.deref(h);
        if let Some(missing) = self.nodes[id.index()]
            .type_vars
            .iter()
            .find(|&&var| !map.contains_key(&self.deref(var)))
        {
            panic!(
                "cannot instantiate {}: no argument for {}",
                self.display(h),
                self.display(*missing)
            );
        }
        let result = self.rewrite(id, map);
        trace!(from = %self.display(h), to = %self.display(Uni::from_id(result)), "instantiate");
        H::from_id(result)
    }

    /// [`TypeTable::instantiate`] with a map built from `args`.
    pub fn instantiate_args<H: Handle>(&mut self, generic: H, args: &[Type]) -> H {
        let mut map = self.build_map(generic, args);
        self.instantiate(generic, &mut map)
    }

    /// Apply type arguments to a generic type written by the user.
    ///
    /// A wrong argument count is reported as [`TypeError::GenericArity`]
    /// and answered with the error type.
    pub fn apply_type_args(&mut self, generic: Type, args: &[Type], span: Option<Span>) -> Type {
        let expected = self.type_vars(generic).len();
        if expected != args.len() {
            let err = TypeError::GenericArity {
                generic: self.render(generic),
                expected,
                found: args.len(),
                span,
            };
            self.errors.push(err);
            return self.type_error();
        }
        self.instantiate_args(generic, args)
    }

    pub(crate) fn specialize_id(&mut self, id: NodeId, map: &mut SpecializeMap) -> NodeId {
        let id = self.deref(Uni::from_id(id));
        if let Some(&done) = map.get(&id) {
            return done;
        }
        match self.nodes[id.index()].kind.tag() {
            Kind::Prim(_) | Kind::Error | Kind::NoRet | Kind::Trait | Kind::TypeVar => return id,
            Kind::Bound if self.is_error(Uni::from_id(id)) => return id,
            Kind::Unknown => {
                let key = self.unknown_key(id);
                return match self.unknowns.probe_value(key) {
                    Some(instance) => self.specialize_id(instance, map),
                    None => id,
                };
            }
            _ => {}
        }

        let vars = self.nodes[id.index()].type_vars.clone();
        let mut clones = Vec::with_capacity(vars.len());
        for &var in &vars {
            let name = self.type_var_info(var).name.clone();
            let clone = self.type_var(&name);
            map.insert(self.deref(var), clone.id());
            clones.push(clone);
        }
        for (&var, &clone) in vars.iter().zip(&clones) {
            let bounds = self.var_bounds(var).to_vec();
            for bound in bounds {
                let specialized = self.specialize(bound, map);
                self.add_bound(clone, specialized);
            }
        }

        let result = self.rewrite(id, map);
        map.insert(id, result);
        for clone in clones {
            self.bind(Uni::from_id(result), clone);
        }
        trace!(from = %self.display(Uni::from_id(id)), to = %self.display(Uni::from_id(result)), "specialize");
        result
    }

    /// Fresh copy of `id` with every operand specialized. Own type variables
    /// are not carried over.
    fn rewrite(&mut self, id: NodeId, map: &mut SpecializeMap) -> NodeId {
        let node = &self.nodes[id.index()];
        let mut kind = node.kind.fresh_copy();
        let elems = node.elems.clone();

        let mut rewritten = Vec::with_capacity(elems.len());
        for elem in elems {
            rewritten.push(self.specialize(elem, map));
        }
        if let NodeKind::Impl(info) = &mut kind {
            info.bound = Bound::from_id(self.specialize_id(info.bound.id(), map));
        }
        self.alloc(kind, rewritten)
    }
}
