//! Primer: a catalog of documented scripting-language behaviors, each paired
//! with runnable snippets and their documented output, plus a verifier that
//! executes every snippet in an isolated machine and reports whether observed
//! behavior still matches the documentation.
//!
//! The crate splits into five parts:
//!
//! - [`models`]: the catalog data model ([`models::FeatureEntry`],
//!   [`models::Snippet`], the closed [`models::Category`] and
//!   [`models::ErrorKind`] enums).
//! - [`catalog`]: the in-memory registry, the fail-fast definition loader,
//!   and the built-in seed content.
//! - [`interp`]: the snippet language engine — a small JavaScript-flavored
//!   language evaluated by a tree-walking interpreter with a deterministic
//!   microtask/timer loop.
//! - [`verify`]: per-snippet verification and the whole-catalog
//!   `verify_all` run, with a wall-clock guard per snippet.
//! - [`report`]: pure rendering of verification outcomes.

pub mod catalog;
pub mod interp;
pub mod models;
pub mod report;
pub mod verify;
