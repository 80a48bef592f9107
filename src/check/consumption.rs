//! Consumption classification.
//!
//! Deliberately coarse: a recognized draining call anywhere in the
//! enclosing function satisfies the requirement, regardless of its
//! ordering relative to the close. Flow-sensitive consumption tracking
//! is a known precision limit of this check.

use crate::config::Config;
use crate::ir::{CallCommon, Callee, Function, InstrKind, Program};

/// True when the call's static callee is in the consuming-operations
/// table.
pub fn is_consuming_call(program: &Program, call: &CallCommon, config: &Config) -> bool {
    let callee = match call.callee {
        Callee::Static(fid) => program.function(fid),
        _ => return false,
    };
    config
        .consuming_operations
        .iter()
        .any(|op| op.module == callee.module && op.function == callee.name)
}

/// True when any call in the function matches the consuming-operations
/// table.
pub fn consumed_in_function(program: &Program, func: &Function, config: &Config) -> bool {
    for block in &func.blocks {
        for &id in &block.instrs {
            if let InstrKind::Call(call) = &func.instr(id).kind {
                if is_consuming_call(program, call, config) {
                    return true;
                }
            }
        }
    }
    false
}
