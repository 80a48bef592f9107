//! Leak detection over the typed IR.

mod classify;
mod closure;
mod consumption;
mod resolve;
mod runner;
mod scan;
mod types;

pub use classify::Classifier;
pub use closure::{closure_invoked, ImportCache};
pub use consumption::{consumed_in_function, is_consuming_call};
pub use resolve::{resolve, Resolved, ResolveError};
pub use runner::Runner;
pub use scan::{is_noop_accessor, is_resource_call, returns_resource};
pub use types::{CheckResult, Diagnostic, LeakKind};
