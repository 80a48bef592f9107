//! Leakcheck - HTTP response body leak analyzer.
//!
//! Leakcheck classifies allocation sites that produce an HTTP-response-like
//! resource and reports the ones whose readable stream is never provably
//! closed (and, in strict mode, never both closed and drained). It works
//! on a def-use graph: for every allocation it walks the referrer edges
//! of the produced value through struct fields, globals, closures,
//! helper calls, and control-flow merges, looking for a closing
//! operation.
//!
//! # Architecture
//!
//! - `ir`: the minimal typed IR the host frontend lowers programs to -
//!   basic blocks of typed instructions with complete referrer edges
//! - `config`: the immutable per-run configuration (resource shape,
//!   consuming operations, suppressed accessors)
//! - `check`: type resolution, allocation scanning, and the leak
//!   classifier itself
//!
//! The host analysis framework owns parsing, IR construction, and
//! diagnostic rendering. It hands a [`ir::Program`] to a
//! [`check::Runner`] and receives a [`check::CheckResult`] back; tests
//! build programs directly with [`ir::ProgramBuilder`].

pub mod check;
pub mod config;
pub mod ir;

pub use check::{CheckResult, Classifier, Diagnostic, LeakKind, Resolved, ResolveError, Runner};
pub use config::{Config, ConsumingOp, NoopAccessor};
pub use ir::{FuncBuilder, Position, Program, ProgramBuilder, TypeKey, TypeRepr};
