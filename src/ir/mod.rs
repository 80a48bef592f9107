//! Minimal typed IR with explicit def-use edges.
//!
//! The host analysis framework lowers each analyzed unit to this shape:
//! functions as basic blocks of typed instructions, every value exposing
//! its complete referrer set. The classifier consumes the graph
//! read-only; builders exist for hosts and tests that construct programs
//! directly.

mod builder;
mod func;
mod types;

pub use builder::{FuncBuilder, ProgramBuilder};
pub use func::{
    Block, CallCommon, Callee, FileId, FuncId, Function, Instr, InstrId, InstrKind, Position,
    Program, SourceFile,
};
pub use types::{FieldDef, MethodSig, TypeDef, TypeKey, TypeRepr, TypeUniverse};
