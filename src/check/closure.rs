//! Closure and indirect-call resolution.

use std::collections::HashMap;

use crate::ir::{FileId, Function, InstrId, InstrKind, Program};

/// Run-scoped memo of files proven to never import the resource module.
///
/// A closure or helper defined in a file that never imports the module
/// cannot manipulate the resource meaningfully; the walk bails out to
/// "closed" there instead of chasing pass-through helpers. Each file is
/// decided at most once per run.
#[derive(Debug, Default)]
pub struct ImportCache {
    skip: HashMap<FileId, bool>,
}

impl ImportCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the function's defining file never imports `module`.
    /// Functions without a known file are assumed to import it.
    pub fn never_imports(&mut self, program: &Program, func: &Function, module: &str) -> bool {
        let file = match func.file {
            Some(file) => file,
            None => return false,
        };
        if let Some(&skip) = self.skip.get(&file) {
            return skip;
        }
        let skip = !program.file(file).imports.iter().any(|i| i == module);
        self.skip.insert(file, skip);
        skip
    }
}

/// True when the closure value ever reaches a call or deferred-call
/// site. A captured resource is only at risk if something can invoke
/// the closure holding its close obligation.
pub fn closure_invoked(func: &Function, closure: InstrId) -> bool {
    func.referrers(closure).iter().any(|&r| {
        matches!(
            func.instr(r).kind,
            InstrKind::Call(_) | InstrKind::Defer(_)
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Callee, FuncBuilder, Position, ProgramBuilder, TypeRepr};

    fn at(line: u32) -> Position {
        Position::new(line, 1)
    }

    #[test]
    fn test_never_imports_consults_file_imports() {
        let mut pb = ProgramBuilder::new();
        let with_http = pb.add_file("client.go", &["net/http", "io"]);
        let without = pb.add_file("util.go", &["strings"]);

        let f1 = pb.add_function(
            FuncBuilder::new("fetch", "example.com/app")
                .file(with_http)
                .finish(),
        );
        let f2 = pb.add_function(
            FuncBuilder::new("pad", "example.com/app")
                .file(without)
                .finish(),
        );
        let external = pb.add_function(FuncBuilder::new("Get", "net/http").finish());
        let program = pb.finish();

        let mut cache = ImportCache::new();
        assert!(!cache.never_imports(&program, program.function(f1), "net/http"));
        assert!(cache.never_imports(&program, program.function(f2), "net/http"));
        // Unknown defining file: assume the module is imported.
        assert!(!cache.never_imports(&program, program.function(external), "net/http"));
        // Memoized answer is stable.
        assert!(cache.never_imports(&program, program.function(f2), "net/http"));
    }

    #[test]
    fn test_closure_invoked_by_call_or_defer() {
        let mut pb = ProgramBuilder::new();
        let body = pb.add_function(FuncBuilder::new("fetch$1", "example.com/app").finish());

        let mut fb = FuncBuilder::new("deferred", "example.com/app");
        let invoked = fb.make_closure(body, Vec::new(), at(1));
        fb.defer_call(Callee::Value(invoked), Vec::new(), at(2));
        let deferred = fb.finish();
        assert!(closure_invoked(&deferred, invoked));

        let mut fb = FuncBuilder::new("stored", "example.com/app");
        let shelved = fb.make_closure(body, Vec::new(), at(1));
        let slot = fb.alloc(TypeRepr::Func, at(2));
        fb.store(slot, shelved, at(2));
        let stored = fb.finish();
        assert!(!closure_invoked(&stored, shelved));
    }
}
