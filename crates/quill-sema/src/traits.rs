//! Trait, bound and impl resolution.
//!
//! Traits carry their declared methods and super-bounds; bounds are traits
//! applied to type arguments; impls register a bound for a type. Method
//! lookup walks the super-trait chain, specializing inherited signatures
//! through each bound's arguments so that `Ord[T]: Eq[T]` hands out `eq`
//! already instantiated at `T`.
//!
//! All registries here are append-only and may grow after the owning node
//! has been canonicalized.

use quill_common::Span;
use tracing::debug;

use crate::config::DuplicatePolicy;
use crate::error::TypeError;
use crate::handle::{Bound, FnType, Handle, Impl, Trait, Type, TypeVar, Uni};
use crate::node::{Kind, NodeKind};
use crate::table::TypeTable;

impl TypeTable {
    // ── Registration ───────────────────────────────────────────────────

    /// Declare method `name` on `trait_`. The signature may mention the
    /// trait's type variables. Returns `false` if the trait already
    /// declares a method of that name; the first declaration stays.
    pub fn add_method(&mut self, trait_: Trait, name: &str, signature: FnType) -> bool {
        let info = self.trait_info_mut(trait_);
        if info.methods.contains_key(name) {
            return false;
        }
        info.methods.insert(name.to_string(), signature);
        self.method_epoch += 1;
        debug!(trait_ = %self.display(trait_), method = name, "add method");
        true
    }

    /// Declare `bound` as a super-bound of `trait_`.
    ///
    /// Under [`DuplicatePolicy::Deduplicate`] a bound structurally equal to
    /// an existing one is ignored and `false` is returned.
    pub fn add_super_bound(&mut self, trait_: Trait, bound: Bound) -> bool {
        if self.config.duplicates == DuplicatePolicy::Deduplicate
            && self
                .super_bounds(trait_)
                .iter()
                .any(|&existing| self.structural_eq(existing, bound))
        {
            return false;
        }
        self.trait_info_mut(trait_).super_bounds.push(bound);
        self.method_epoch += 1;
        debug!(trait_ = %self.display(trait_), bound = %self.display(bound), "add super bound");
        true
    }

    /// Register `impl_` with its implementing type and with its trait.
    ///
    /// The implementing type should already be canonical, so that lookups
    /// through any structurally equal type find the impl.
    pub fn add_impl(&mut self, impl_: Impl) -> bool {
        let ty = self.deref(self.impl_type(impl_));
        let bound = self.impl_bound(impl_);
        if self.config.duplicates == DuplicatePolicy::Deduplicate
            && self.nodes[ty.index()]
                .impls
                .iter()
                .any(|&existing| self.structural_eq(existing, impl_))
        {
            return false;
        }
        let trait_ = self.bound_trait(bound);
        self.nodes[ty.index()].impls.push(impl_);
        self.trait_info_mut(trait_)
            .impls
            .entry(ty)
            .or_default()
            .push(impl_);
        debug!(impl_ = %self.display(impl_), "add impl");
        true
    }

    // ── Registry queries ───────────────────────────────────────────────

    /// The method `name` as declared directly on `trait_`.
    pub fn declared_method(&self, trait_: Trait, name: &str) -> Option<FnType> {
        self.trait_info(trait_).methods.get(name).copied()
    }

    pub fn super_bounds(&self, trait_: Trait) -> &[Bound] {
        &self.trait_info(trait_).super_bounds
    }

    /// The super-bound of `trait_` that instantiates `super_trait`, if any.
    pub fn super_bound(&self, trait_: Trait, super_trait: Trait) -> Option<Bound> {
        let target = self.deref(super_trait);
        self.super_bounds(trait_)
            .iter()
            .copied()
            .find(|&b| self.deref(self.bound_trait(b)) == target)
    }

    /// Impls of `trait_` registered for `ty`.
    pub fn impls_for(&self, trait_: Trait, ty: Type) -> &[Impl] {
        self.trait_info(trait_)
            .impls
            .get(&self.deref(ty))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every impl registered for `ty`, in registration order.
    pub fn impls(&self, ty: Type) -> &[Impl] {
        &self.nodes[self.deref(ty).index()].impls
    }

    // ── Method lookup ──────────────────────────────────────────────────

    /// Find method `name` on a trait, a bound, a type variable (through its
    /// bounds), an impl (through its bound) or a concrete type (through its
    /// impls). Absence is a valid answer and is never cached.
    ///
    /// Panics on an unresolved placeholder.
    pub fn find_method(&mut self, h: impl Into<Uni>, name: &str) -> Option<FnType> {
        let id = self.resolve(h);
        match self.nodes[id.index()].kind.tag() {
            Kind::Trait => self.trait_find_method(Trait::from_id(id), name),
            Kind::Bound => self.bound_find_method(Bound::from_id(id), name),
            Kind::TypeVar => {
                let bounds = self.var_bounds(TypeVar::from_id(id)).to_vec();
                bounds
                    .into_iter()
                    .find_map(|b| self.bound_find_method(b, name))
            }
            Kind::Impl => {
                let bound = self.impl_bound(Impl::from_id(id));
                self.bound_find_method(bound, name)
            }
            Kind::Unknown => panic!(
                "cannot look up method `{}` on unresolved placeholder {}",
                name,
                self.display(Uni::from_id(id))
            ),
            _ => {
                let impls = self.nodes[id.index()].impls.clone();
                impls.into_iter().find_map(|i| {
                    let bound = self.impl_bound(i);
                    self.bound_find_method(bound, name)
                })
            }
        }
    }

    pub fn has_method(&mut self, h: impl Into<Uni>, name: &str) -> bool {
        self.find_method(h, name).is_some()
    }

    fn trait_find_method(&mut self, trait_: Trait, name: &str) -> Option<FnType> {
        if let Some(method) = self.declared_method(trait_, name) {
            return Some(method);
        }
        let supers = self.super_bounds(trait_).to_vec();
        supers
            .into_iter()
            .find_map(|b| self.bound_find_method(b, name))
    }

    fn bound_find_method(&mut self, bound: Bound, name: &str) -> Option<FnType> {
        let id = self.deref(bound);
        let cache = self.config.cache_methods;
        if cache {
            if let Some(&(epoch, hit)) = self.bound_info(bound).method_cache.get(name) {
                if epoch == self.method_epoch {
                    return Some(hit);
                }
            }
        }

        let trait_ = self.bound_trait(bound);
        let args = self.elems(bound).to_vec();
        let mut map = self.build_map(trait_, &args);
        let found = match self.declared_method(trait_, name) {
            Some(method) => Some(self.specialize(method, &mut map)),
            None => {
                let mut found = None;
                for sup in self.super_bounds(trait_).to_vec() {
                    let sup = self.specialize(sup, &mut map);
                    if let Some(method) = self.bound_find_method(sup, name) {
                        found = Some(method);
                        break;
                    }
                }
                found
            }
        };

        if let (true, Some(method)) = (cache, found) {
            if let NodeKind::Bound(info) = &mut self.nodes[id.index()].kind {
                info.method_cache
                    .insert(name.to_string(), (self.method_epoch, method));
            }
        }
        found
    }

    /// [`TypeTable::find_method`] for user-facing lookups: a missing method
    /// is reported as [`TypeError::MissingMethod`] and answered with the
    /// error type.
    pub fn lookup_method(&mut self, ty: Type, name: &str, span: Option<Span>) -> Type {
        if self.is_error(ty) || self.only_error_bounds(ty) {
            return self.type_error();
        }
        match self.find_method(ty, name) {
            Some(method) => method.into(),
            None => {
                let err = TypeError::MissingMethod {
                    ty: self.render(ty),
                    method: name.to_string(),
                    span,
                };
                self.errors.push(err);
                self.type_error()
            }
        }
    }

    /// Whether `ty` is a type variable constrained only by error bounds.
    /// Such a variable stands in for an error already reported.
    fn only_error_bounds(&mut self, ty: Type) -> bool {
        let id = self.resolve(ty);
        match self.isa::<TypeVar>(Uni::from_id(id)) {
            Some(var) => {
                let bounds = self.var_bounds(var);
                !bounds.is_empty() && bounds.iter().all(|&b| self.is_error(b))
            }
            None => false,
        }
    }

    // ── Impls and bound checking ───────────────────────────────────────

    /// The impl registered for `ty` whose bound equals `bound`.
    pub fn find_impl(&mut self, ty: Type, bound: Bound) -> Option<Impl> {
        let impls = self.impls(ty).to_vec();
        impls.into_iter().find(|&i| {
            let have = self.impl_bound(i);
            self.handle_eq(have, bound)
        })
    }

    /// Whether `ty` satisfies `bound`: a type variable through its own
    /// bounds and their super-bounds, any other type through a registered
    /// impl. The error sentinels satisfy everything.
    pub fn implements(&mut self, ty: Type, bound: Bound) -> bool {
        let id = self.resolve(ty);
        if self.is_error(Uni::from_id(id)) || self.is_error(bound) {
            return true;
        }
        match self.nodes[id.index()].kind.tag() {
            Kind::TypeVar => {
                let have = self.var_bounds(TypeVar::from_id(id)).to_vec();
                have.into_iter().any(|h| self.entails(h, bound))
            }
            _ => self.find_impl(Type::from_id(id), bound).is_some(),
        }
    }

    /// Whether `have` is `want` or reaches it through super-bounds.
    fn entails(&mut self, have: Bound, want: Bound) -> bool {
        if self.handle_eq(have, want) {
            return true;
        }
        let trait_ = self.bound_trait(have);
        let args = self.elems(have).to_vec();
        let mut map = self.build_map(trait_, &args);
        for sup in self.super_bounds(trait_).to_vec() {
            let sup = self.specialize(sup, &mut map);
            if self.entails(sup, want) {
                return true;
            }
        }
        false
    }

    /// Check that `args` satisfy the bounds of `generic`'s type variables.
    ///
    /// Bounds are specialized through the argument map first, since a bound
    /// may mention any of the variables. Run this once inference has
    /// resolved the arguments. Every unsatisfied bound is reported as
    /// [`TypeError::TraitNotSatisfied`].
    pub fn check_bounds(&mut self, generic: impl Into<Uni>, args: &[Type], span: Option<Span>) -> bool {
        let generic = generic.into();
        let vars = self.type_vars(generic).to_vec();
        if vars.len() != args.len() {
            let err = TypeError::GenericArity {
                generic: self.render(generic),
                expected: vars.len(),
                found: args.len(),
                span,
            };
            self.errors.push(err);
            return false;
        }

        let mut map = self.build_map(generic, args);
        let mut ok = true;
        for (&var, &arg) in vars.iter().zip(args) {
            for bound in self.var_bounds(var).to_vec() {
                let bound = self.specialize(bound, &mut map);
                if !self.implements(arg, bound) {
                    let err = TypeError::TraitNotSatisfied {
                        ty: self.render(arg),
                        bound: self.render(bound),
                        span,
                    };
                    self.errors.push(err);
                    ok = false;
                }
            }
        }
        ok
    }

    /// Apply `trait_` to `args` as written by the user. A wrong argument
    /// count is reported as [`TypeError::GenericArity`] and answered with
    /// the error bound.
    pub fn instantiate_trait(&mut self, trait_: Trait, args: &[Type], span: Option<Span>) -> Bound {
        let expected = self.type_vars(trait_).len();
        if expected != args.len() {
            let err = TypeError::GenericArity {
                generic: self.render(trait_),
                expected,
                found: args.len(),
                span,
            };
            self.errors.push(err);
            return self.bound_error();
        }
        self.bound(trait_, args)
    }
}
