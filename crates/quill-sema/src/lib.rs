//! Quill semantic core: unification-based type and trait resolution.
//!
//! This crate owns every type-level entity of a compilation in a single
//! [`TypeTable`]: types, type variables, traits, bounds and impls. It
//! supports:
//!
//! - Hash-consing of closed nodes into canonical representatives
//! - Alpha-equivalent structural identity of generics
//! - Capture-avoiding specialization and instantiation
//! - Bidirectional inference of placeholders, atomic per call
//! - Method lookup through bounds, impls and super-traits
//!
//! # Architecture
//!
//! - [`node`]: node kinds and payloads
//! - [`handle`]: typed `Copy` handles onto nodes
//! - [`table`]: the arena, singletons and canonicalization
//! - [`structural`]: binding, closedness, structural hash and equality
//! - [`specialize`]: substitution of type variables
//! - [`infer`]: placeholder inference and handle equality
//! - [`traits`]: trait registries, method lookup, bound checking
//! - [`convert`]: per-kind hand-off of final types to a backend
//! - [`display`]: rendering for diagnostics
//! - [`error`] and [`diagnostics`]: semantic errors and their rendering
//! - [`config`]: registry policy

pub mod config;
pub mod convert;
pub mod diagnostics;
pub mod display;
pub mod error;
pub mod handle;
pub mod infer;
pub mod node;
pub mod specialize;
pub mod structural;
pub mod table;
pub mod traits;

pub use config::{DuplicatePolicy, SemaConfig};
pub use convert::{ConvertCache, TypeConverter};
pub use error::TypeError;
pub use handle::{Bound, FnType, Handle, Impl, Trait, Type, TypeVar, Uni, UnknownType};
pub use node::{DeclId, Kind, NodeId, PrimKind};
pub use specialize::SpecializeMap;
pub use table::{Canonical, TypeTable};
