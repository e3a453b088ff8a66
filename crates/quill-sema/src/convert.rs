//! Hand-off of finalized types to a backend.
//!
//! Code generation implements [`TypeConverter`] for its own type
//! representation; [`TypeTable::convert`] walks a canonical type and calls
//! one hook per kind, memoizing the result per representative.

use rustc_hash::FxHashMap;

use crate::handle::{Handle, Type, Uni};
use crate::node::{DeclId, NodeId, NodeKind, PrimKind};
use crate::table::TypeTable;

/// Converted types keyed by representative.
pub type ConvertCache<T> = FxHashMap<NodeId, T>;

/// Per-kind construction hooks of a backend type representation.
pub trait TypeConverter {
    type Output: Clone;

    fn prim(&mut self, kind: PrimKind) -> Self::Output;
    fn no_ret(&mut self) -> Self::Output;
    fn fn_type(&mut self, params: Vec<Self::Output>, ret: Self::Output) -> Self::Output;
    fn tuple(&mut self, elems: Vec<Self::Output>) -> Self::Output;
    fn struct_type(&mut self, decl: DeclId, name: &str, args: Vec<Self::Output>) -> Self::Output;
    fn owned_ptr(&mut self, pointee: Self::Output) -> Self::Output;
    fn borrowed_ptr(&mut self, pointee: Self::Output) -> Self::Output;
    fn definite_array(&mut self, elem: Self::Output, dim: u64) -> Self::Output;
    fn indefinite_array(&mut self, elem: Self::Output) -> Self::Output;
    /// A generic parameter, reached when converting a generic function.
    fn type_var(&mut self, name: &str) -> Self::Output;
}

impl TypeTable {
    /// Convert `ty` with `conv`.
    ///
    /// Panics unless `ty` is canonical and closed, and on the error type
    /// or placeholders, none of which may reach code generation.
    pub fn convert<C: TypeConverter>(
        &self,
        ty: Type,
        conv: &mut C,
        cache: &mut ConvertCache<C::Output>,
    ) -> C::Output {
        assert!(
            self.is_canonical(ty) && self.is_closed(ty),
            "cannot convert non-final type {}",
            self.display(ty)
        );
        self.convert_id(ty.id(), conv, cache)
    }

    fn convert_id<C: TypeConverter>(
        &self,
        id: NodeId,
        conv: &mut C,
        cache: &mut ConvertCache<C::Output>,
    ) -> C::Output {
        let id = self.deref(Uni::from_id(id));
        if let Some(done) = cache.get(&id) {
            return done.clone();
        }
        let node = &self.nodes[id.index()];
        let mut elems: Vec<C::Output> = node
            .elems
            .iter()
            .map(|e| self.convert_id(e.id(), conv, cache))
            .collect();
        let out = match &node.kind {
            NodeKind::Prim(p) => conv.prim(*p),
            NodeKind::NoRet => conv.no_ret(),
            NodeKind::Fn => {
                let ret = elems.pop();
                match ret {
                    Some(ret) => conv.fn_type(elems, ret),
                    None => panic!("function type {} has no return type", self.display(Uni::from_id(id))),
                }
            }
            NodeKind::Tuple => conv.tuple(elems),
            NodeKind::Struct(info) => conv.struct_type(info.decl, &info.name, elems),
            NodeKind::OwnedPtr => conv.owned_ptr(single(elems)),
            NodeKind::BorrowedPtr => conv.borrowed_ptr(single(elems)),
            NodeKind::DefiniteArray(dim) => conv.definite_array(single(elems), *dim),
            NodeKind::IndefiniteArray => conv.indefinite_array(single(elems)),
            NodeKind::TypeVar(info) => conv.type_var(&info.name),
            NodeKind::Error
            | NodeKind::Unknown(_)
            | NodeKind::Trait(_)
            | NodeKind::Bound(_)
            | NodeKind::Impl(_) => {
                panic!("cannot convert {}", self.display(Uni::from_id(id)))
            }
        };
        cache.insert(id, out.clone());
        out
    }
}

fn single<T>(mut elems: Vec<T>) -> T {
    match elems.pop() {
        Some(elem) if elems.is_empty() => elem,
        _ => panic!("expected exactly one operand"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Renders backend types as strings and counts hook calls.
    #[derive(Default)]
    struct Names {
        calls: usize,
    }

    impl TypeConverter for Names {
        type Output = String;

        fn prim(&mut self, kind: PrimKind) -> String {
            self.calls += 1;
            kind.name().to_string()
        }
        fn no_ret(&mut self) -> String {
            self.calls += 1;
            "void".into()
        }
        fn fn_type(&mut self, params: Vec<String>, ret: String) -> String {
            self.calls += 1;
            format!("{}({})", ret, params.join(","))
        }
        fn tuple(&mut self, elems: Vec<String>) -> String {
            self.calls += 1;
            format!("{{{}}}", elems.join(","))
        }
        fn struct_type(&mut self, _decl: DeclId, name: &str, args: Vec<String>) -> String {
            self.calls += 1;
            format!("%{}<{}>", name, args.join(","))
        }
        fn owned_ptr(&mut self, pointee: String) -> String {
            self.calls += 1;
            format!("{}*", pointee)
        }
        fn borrowed_ptr(&mut self, pointee: String) -> String {
            self.calls += 1;
            format!("{}*", pointee)
        }
        fn definite_array(&mut self, elem: String, dim: u64) -> String {
            self.calls += 1;
            format!("[{} x {}]", dim, elem)
        }
        fn indefinite_array(&mut self, elem: String) -> String {
            self.calls += 1;
            format!("[0 x {}]", elem)
        }
        fn type_var(&mut self, name: &str) -> String {
            self.calls += 1;
            name.to_string()
        }
    }

    #[test]
    fn converts_per_kind() {
        let mut table = TypeTable::new();
        let i32_ = table.prim(PrimKind::I32);
        let arr = table.definite_array(i32_, 3);
        let ptr = table.owned_ptr(arr);
        let noret = table.type_noret();
        let f = table.fn_type(&[ptr, i32_], noret);
        table.canonicalize(f);

        let mut conv = Names::default();
        let mut cache = ConvertCache::default();
        let out = table.convert(f.into(), &mut conv, &mut cache);
        assert_eq!(out, "void([3 x i32]*,i32)");
    }

    #[test]
    fn conversion_is_memoized_per_representative() {
        let mut table = TypeTable::new();
        let u8_ = table.prim(PrimKind::U8);
        let a = table.tuple_type(&[u8_, u8_]);
        let b = table.tuple_type(&[u8_, u8_]);
        table.canonicalize(a);
        table.canonicalize(b);

        let mut conv = Names::default();
        let mut cache = ConvertCache::default();
        let first = table.convert(a, &mut conv, &mut cache);
        let calls = conv.calls;
        let second = table.convert(b, &mut conv, &mut cache);
        assert_eq!(first, second);
        assert_eq!(conv.calls, calls);
    }

    #[test]
    #[should_panic(expected = "cannot convert non-final type")]
    fn rejects_non_canonical() {
        let mut table = TypeTable::new();
        let u8_ = table.prim(PrimKind::U8);
        let ptr = table.borrowed_ptr(u8_);
        let mut conv = Names::default();
        table.convert(ptr, &mut conv, &mut ConvertCache::default());
    }

    #[test]
    #[should_panic(expected = "cannot convert <type error>")]
    fn rejects_error_type() {
        let table = TypeTable::new();
        let mut conv = Names::default();
        table.convert(table.type_error(), &mut conv, &mut ConvertCache::default());
    }
}
