//! Trait inheritance, impl registries and bound checking.

use quill_common::Span;
use quill_sema::{Bound, DeclId, PrimKind, SemaConfig, Trait, Type, TypeError, TypeTable};

// ── Helpers ────────────────────────────────────────────────────────────

/// `trait A { fn foo() -> i32 }` and `trait B: A { fn bar(bool) -> i32 }`.
fn a_and_b(table: &mut TypeTable) -> (Trait, Trait) {
    let i32_ = table.prim(PrimKind::I32);
    let bool_ = table.prim(PrimKind::Bool);

    let a = table.trait_(DeclId(1), "A");
    let foo = table.fn_type(&[], i32_);
    table.add_method(a, "foo", foo);
    table.canonicalize(a);

    let b = table.trait_(DeclId(2), "B");
    let a_bound = table.bound(a, &[]);
    table.add_super_bound(b, a_bound);
    let bar = table.fn_type(&[bool_], i32_);
    table.add_method(b, "bar", bar);
    table.canonicalize(b);
    (a, b)
}

/// `trait Eq[T] { fn eq(T, T) -> bool }` and
/// `trait Ord[U]: Eq[U] { fn cmp(U, U) -> i32 }`.
fn eq_and_ord(table: &mut TypeTable) -> (Trait, Trait) {
    let bool_ = table.prim(PrimKind::Bool);
    let i32_ = table.prim(PrimKind::I32);

    let eq = table.trait_(DeclId(10), "Eq");
    let t = table.type_var("T");
    table.bind(eq, t);
    let eq_sig = table.fn_type(&[t.into(), t.into()], bool_);
    table.add_method(eq, "eq", eq_sig);
    table.canonicalize(eq);

    let ord = table.trait_(DeclId(11), "Ord");
    let u = table.type_var("U");
    table.bind(ord, u);
    let eq_u = table.bound(eq, &[u.into()]);
    table.add_super_bound(ord, eq_u);
    let cmp_sig = table.fn_type(&[u.into(), u.into()], i32_);
    table.add_method(ord, "cmp", cmp_sig);
    table.canonicalize(ord);
    (eq, ord)
}

fn register_impl(table: &mut TypeTable, decl: u32, bound: Bound, ty: Type) {
    table.canonicalize(bound);
    let imp = table.impl_(DeclId(decl), bound, ty);
    table.canonicalize(imp);
    assert!(table.add_impl(imp));
}

// ── Method lookup ──────────────────────────────────────────────────────

#[test]
fn subtrait_bound_sees_inherited_methods() {
    let mut table = TypeTable::new();
    let (a, b) = a_and_b(&mut table);
    let b_bound = table.bound(b, &[]);
    let a_bound = table.bound(a, &[]);

    assert!(table.has_method(b_bound, "foo"));
    assert!(table.has_method(b_bound, "bar"));
    assert!(table.has_method(a_bound, "foo"));
    assert!(!table.has_method(a_bound, "bar"));
    assert!(!table.has_method(b_bound, "baz"));

    // Traits answer the same way as their bounds.
    assert!(table.has_method(b, "foo"));
    assert!(!table.has_method(a, "bar"));
}

#[test]
fn inherited_generic_methods_are_specialized() {
    let mut table = TypeTable::new();
    let (_eq, ord) = eq_and_ord(&mut table);
    let i64_ = table.prim(PrimKind::I64);
    let ord_i64 = table.bound(ord, &[i64_]);

    let eq = table.find_method(ord_i64, "eq").unwrap();
    insta::assert_snapshot!(table.display(eq).to_string(), @"fn(i64, i64) -> bool");
    let cmp = table.find_method(ord_i64, "cmp").unwrap();
    insta::assert_snapshot!(table.display(cmp).to_string(), @"fn(i64, i64) -> i32");
}

#[test]
fn super_bound_lookup() {
    let mut table = TypeTable::new();
    let (eq, ord) = eq_and_ord(&mut table);
    let sup = table.super_bound(ord, eq).unwrap();
    insta::assert_snapshot!(table.display(sup).to_string(), @"Eq[U]");
    assert_eq!(table.super_bound(eq, ord), None);
}

#[test]
fn type_variable_finds_methods_through_its_bounds() {
    let mut table = TypeTable::new();
    let (_eq, ord) = eq_and_ord(&mut table);
    let t = table.type_var("T");
    let ord_t = table.bound(ord, &[t.into()]);
    table.add_bound(t, ord_t);
    let f = table.fn_type(&[t.into()], t.into());
    table.bind(f, t);

    let eq = table.find_method(t, "eq").unwrap();
    insta::assert_snapshot!(table.display(eq).to_string(), @"fn(T, T) -> bool");
    assert!(!table.has_method(t, "hash"));
}

#[test]
fn concrete_type_finds_methods_through_impls() {
    let mut table = TypeTable::new();
    let (_a, b) = a_and_b(&mut table);
    let s = table.struct_type(DeclId(20), "Point", &[]);
    table.canonicalize(s);
    assert!(!table.has_method(s, "foo"));

    let b_bound = table.bound(b, &[]);
    register_impl(&mut table, 21, b_bound, s);
    assert!(table.has_method(s, "foo"));
    assert!(table.has_method(s, "bar"));

    // An equal type built later finds the impl through its representative.
    let same = table.struct_type(DeclId(20), "Point", &[]);
    table.canonicalize(same);
    assert!(table.has_method(same, "bar"));
}

#[test]
fn lookup_method_reports_and_recovers() {
    let mut table = TypeTable::new();
    let (_a, b) = a_and_b(&mut table);
    let s = table.struct_type(DeclId(20), "Point", &[]);
    table.canonicalize(s);
    let b_bound = table.bound(b, &[]);
    register_impl(&mut table, 21, b_bound, s);

    let bar = table.lookup_method(s, "bar", None);
    assert_ne!(bar, table.type_error());
    let missing = table.lookup_method(s, "baz", Some(Span::new(0, 3)));
    assert_eq!(missing, table.type_error());
    // Lookups on the error type do not cascade.
    let err = table.type_error();
    assert_eq!(table.lookup_method(err, "baz", None), err);
    assert_eq!(
        table.errors,
        vec![TypeError::MissingMethod {
            ty: "Point".into(),
            method: "baz".into(),
            span: Some(Span::new(0, 3)),
        }]
    );
}

// ── Registries ─────────────────────────────────────────────────────────

#[test]
fn impl_registry_grows_monotonically() {
    let mut table = TypeTable::new();
    let (eq, ord) = eq_and_ord(&mut table);
    let i32_ = table.prim(PrimKind::I32);
    let eq_i32 = table.bound(eq, &[i32_]);
    let ord_i32 = table.bound(ord, &[i32_]);

    assert!(table.find_impl(i32_, eq_i32).is_none());
    register_impl(&mut table, 30, eq_i32, i32_);
    assert_eq!(table.impls(i32_).len(), 1);
    register_impl(&mut table, 31, ord_i32, i32_);
    assert_eq!(table.impls(i32_).len(), 2);

    assert!(table.find_impl(i32_, eq_i32).is_some());
    assert_eq!(table.impls_for(eq, i32_).len(), 1);
    assert_eq!(table.impls_for(ord, i32_).len(), 1);
    let bool_ = table.prim(PrimKind::Bool);
    assert!(table.impls_for(eq, bool_).is_empty());
}

#[test]
fn duplicate_super_bounds_follow_config() {
    let mut table = TypeTable::new();
    let (a, _b) = a_and_b(&mut table);
    let c = table.trait_(DeclId(3), "C");
    let first = table.bound(a, &[]);
    let second = table.bound(a, &[]);
    assert!(table.add_super_bound(c, first));
    assert!(!table.add_super_bound(c, second));
    assert_eq!(table.super_bounds(c).len(), 1);

    let config = SemaConfig::from_toml_str(r#"duplicates = "permit""#).unwrap();
    let mut table = TypeTable::with_config(config);
    let (a, _b) = a_and_b(&mut table);
    let c = table.trait_(DeclId(3), "C");
    let first = table.bound(a, &[]);
    let second = table.bound(a, &[]);
    assert!(table.add_super_bound(c, first));
    assert!(table.add_super_bound(c, second));
    assert_eq!(table.super_bounds(c).len(), 2);
}

// ── Bound checking ─────────────────────────────────────────────────────

#[test]
fn type_variable_implements_super_bounds_transitively() {
    let mut table = TypeTable::new();
    let (eq, ord) = eq_and_ord(&mut table);
    let t = table.type_var("T");
    let ord_t = table.bound(ord, &[t.into()]);
    table.add_bound(t, ord_t);

    let eq_t = table.bound(eq, &[t.into()]);
    assert!(table.implements(t.into(), eq_t));
    let i32_ = table.prim(PrimKind::I32);
    let eq_i32 = table.bound(eq, &[i32_]);
    assert!(!table.implements(t.into(), eq_i32));
}

#[test]
fn error_type_implements_everything() {
    let mut table = TypeTable::new();
    let (eq, _ord) = eq_and_ord(&mut table);
    let i32_ = table.prim(PrimKind::I32);
    let eq_i32 = table.bound(eq, &[i32_]);
    let err = table.type_error();
    assert!(table.implements(err, eq_i32));
    let bound_err = table.bound_error();
    assert!(table.implements(i32_, bound_err));
}

#[test]
fn check_bounds_after_inference() {
    let mut table = TypeTable::new();
    let (eq, _ord) = eq_and_ord(&mut table);
    let i32_ = table.prim(PrimKind::I32);
    let eq_i32 = table.bound(eq, &[i32_]);
    register_impl(&mut table, 40, eq_i32, i32_);

    // fn[T: Eq[T]](T, T) -> bool
    let t = table.type_var("T");
    let eq_t = table.bound(eq, &[t.into()]);
    table.add_bound(t, eq_t);
    let bool_ = table.prim(PrimKind::Bool);
    let f = table.fn_type(&[t.into(), t.into()], bool_);
    table.bind(f, t);
    table.canonicalize(f);

    // Called with i32: satisfied.
    let mut args = Vec::new();
    let inst = table.instantiate_unknown(f, &mut args);
    let call = table.fn_type(&[i32_, i32_], bool_);
    assert!(table.infer(inst, call));
    assert!(table.check_bounds(f, &args, None));
    assert!(table.errors.is_empty());

    // Called with f32: no impl.
    let f32_ = table.prim(PrimKind::F32);
    let mut args = Vec::new();
    let inst = table.instantiate_unknown(f, &mut args);
    let call = table.fn_type(&[f32_, f32_], bool_);
    assert!(table.infer(inst, call));
    assert!(!table.check_bounds(f, &args, Some(Span::new(8, 12))));
    assert_eq!(
        table.errors,
        vec![TypeError::TraitNotSatisfied {
            ty: "f32".into(),
            bound: "Eq[f32]".into(),
            span: Some(Span::new(8, 12)),
        }]
    );
}

#[test]
fn error_bound_does_not_cascade() {
    let mut table = TypeTable::new();
    let (eq, _ord) = eq_and_ord(&mut table);
    // `fn[T: Eq](T)`, with the argument of `Eq` left out.
    let bad = table.instantiate_trait(eq, &[], Some(Span::new(6, 8)));
    let t = table.type_var("T");
    table.add_bound(t, bad);
    let unit = table.unit();
    let f = table.fn_type(&[t.into()], unit);
    table.bind(f, t);
    table.canonicalize(f);

    let i32_ = table.prim(PrimKind::I32);
    assert!(table.check_bounds(f, &[i32_], None));
    let err = table.type_error();
    assert_eq!(table.lookup_method(t.into(), "eq", None), err);
    assert!(matches!(
        table.errors.as_slice(),
        [TypeError::GenericArity { expected: 1, found: 0, .. }]
    ));
}

#[test]
fn instantiate_trait_is_checked() {
    let mut table = TypeTable::new();
    let (eq, _ord) = eq_and_ord(&mut table);
    let u8_ = table.prim(PrimKind::U8);
    let ok = table.instantiate_trait(eq, &[u8_], None);
    insta::assert_snapshot!(table.display(ok).to_string(), @"Eq[u8]");

    let bad = table.instantiate_trait(eq, &[], None);
    assert_eq!(bad, table.bound_error());
    assert!(matches!(
        table.errors.as_slice(),
        [TypeError::GenericArity { expected: 1, found: 0, .. }]
    ));
}
