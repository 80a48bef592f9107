//! Allocation site scanning.

use crate::config::Config;
use crate::ir::{Callee, Function, InstrId, InstrKind, Program};

use super::resolve::Resolved;

/// True when the function hands the close obligation to its caller by
/// declaring the resource pointer among its results. Such functions are
/// skipped whole; reporting inside them would duplicate the caller's
/// report.
pub fn returns_resource(func: &Function, resolved: &Resolved) -> bool {
    func.results.iter().any(|t| *t == resolved.res_ptr)
}

/// True when the instruction is a call producing the tracked resource:
/// its result type is, or is a tuple containing, the resource pointer.
pub fn is_resource_call(func: &Function, id: InstrId, resolved: &Resolved) -> bool {
    let instr = func.instr(id);
    match instr.kind {
        InstrKind::Call(_) => match &instr.ty {
            Some(ty) => ty.contains(&resolved.res_ptr),
            None => false,
        },
        _ => false,
    }
}

/// True when the call's static callee is a configured no-op accessor.
pub fn is_noop_accessor(program: &Program, func: &Function, id: InstrId, config: &Config) -> bool {
    let call = match &func.instr(id).kind {
        InstrKind::Call(call) => call,
        _ => return false,
    };
    let callee = match call.callee {
        Callee::Static(fid) => program.function(fid),
        _ => return false,
    };
    let recv = match &callee.receiver {
        Some(recv) => recv,
        None => return false,
    };
    config.noop_accessors.iter().any(|a| {
        callee.name == a.method
            && callee.module == a.module
            && recv
                .named_key()
                .map_or(false, |k| k.module == a.module && k.name == a.receiver)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FuncBuilder, Position, TypeRepr};

    fn resolved() -> Resolved {
        Resolved {
            res_ptr: TypeRepr::pointer_to("net/http", "Response"),
            field: "Body".to_string(),
            field_ty: TypeRepr::named("io", "ReadCloser"),
            close_method: "Close".to_string(),
            closer_iface: Some(TypeRepr::named("io", "Closer")),
        }
    }

    #[test]
    fn test_returns_resource_matches_exact_result_type() {
        let res = resolved();
        let func = FuncBuilder::new("fetch", "example.com/app")
            .results(vec![res.res_ptr.clone(), TypeRepr::basic("error")])
            .finish();
        assert!(returns_resource(&func, &res));

        let func = FuncBuilder::new("fetch", "example.com/app")
            .results(vec![TypeRepr::basic("error")])
            .finish();
        assert!(!returns_resource(&func, &res));
    }

    #[test]
    fn test_resource_call_matches_tuple_results() {
        let res = resolved();
        let mut fb = FuncBuilder::new("fetch", "example.com/app");
        let direct = fb.call(
            Callee::Method("Get".to_string()),
            Vec::new(),
            Some(res.res_ptr.clone()),
            Position::new(1, 1),
        );
        let tuple = fb.call(
            Callee::Method("Get".to_string()),
            Vec::new(),
            Some(TypeRepr::Tuple(vec![
                res.res_ptr.clone(),
                TypeRepr::basic("error"),
            ])),
            Position::new(2, 1),
        );
        let unrelated = fb.call(
            Callee::Method("Now".to_string()),
            Vec::new(),
            Some(TypeRepr::named("time", "Time")),
            Position::new(3, 1),
        );
        let func = fb.finish();

        assert!(is_resource_call(&func, direct, &res));
        assert!(is_resource_call(&func, tuple, &res));
        assert!(!is_resource_call(&func, unrelated, &res));
    }
}
