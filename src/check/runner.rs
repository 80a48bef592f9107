//! Check runner that drives one analysis end to end.

use tracing::debug;

use crate::config::Config;
use crate::ir::{FuncId, Program};

use super::classify::Classifier;
use super::resolve::{self, ResolveError};
use super::scan;
use super::types::{CheckResult, Diagnostic, LeakKind};

/// Executes the leak check against one analyzed unit.
pub struct Runner {
    config: Config,
}

impl Runner {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the check.
    ///
    /// A unit that never imports the resource module produces an empty
    /// result. Each leaking allocation site yields exactly one
    /// diagnostic at the allocation's position.
    pub fn run(&self, program: &Program) -> Result<CheckResult, ResolveError> {
        let mut result = CheckResult::new();

        let resolved = match resolve::resolve(program, &self.config)? {
            Some(resolved) => resolved,
            None => {
                debug!(
                    module = %self.config.resource_module,
                    "resource module not imported; skipping unit"
                );
                return Ok(result);
            }
        };

        let kind = if self.config.check_consumption {
            LeakKind::UnconsumedBody
        } else {
            LeakKind::UnclosedBody
        };

        let mut classifier = Classifier::new(program, &self.config, &resolved);
        for (idx, func) in program.functions.iter().enumerate() {
            if func.is_external() {
                continue;
            }
            if scan::returns_resource(func, &resolved) {
                // The caller owns the close obligation.
                continue;
            }
            result.scanned += 1;

            let func_id = FuncId(idx as u32);
            for block in &func.blocks {
                for &id in &block.instrs {
                    if !scan::is_resource_call(func, id, &resolved) {
                        continue;
                    }
                    if scan::is_noop_accessor(program, func, id, &self.config) {
                        continue;
                    }
                    if classifier.is_open(func_id, id) {
                        let file = match func.file {
                            Some(f) => program.file(f).name.clone(),
                            None => func.module.clone(),
                        };
                        result.add(Diagnostic {
                            file,
                            position: func.instr(id).pos,
                            kind,
                        });
                    }
                }
            }
        }

        debug!(
            scanned = result.scanned,
            leaks = result.leak_count(),
            "leak check finished"
        );
        Ok(result)
    }
}
