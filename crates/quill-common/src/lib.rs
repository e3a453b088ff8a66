//! Shared types for the Quill compiler.
//!
//! The semantic core only needs source locations: every user-facing type
//! error carries an optional [`Span`] so the diagnostics renderer can point
//! at the offending declaration or expression.

pub mod span;

pub use span::Span;
