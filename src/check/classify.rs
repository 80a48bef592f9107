//! Leak classification: the core walk over the referrer graph.
//!
//! Starting from an allocation site, the walk follows referrer edges
//! through stores, closures, helper calls, field accesses, and merges,
//! looking for proof that the tracked stream is closed (and, in strict
//! mode, consumed). Exhausting the recognized shapes without proof
//! classifies the site as open: the check prefers a false report over a
//! silently missed leak. The explicitly enumerated bail-outs (globals,
//! out-of-scope closures and helpers, no-op test doubles) lean the other
//! way, because reports there would be unverifiable noise.

use std::collections::HashSet;

use tracing::trace;

use crate::config::Config;
use crate::ir::{Callee, FuncId, Function, InstrId, InstrKind, Program};

use super::closure::{closure_invoked, ImportCache};
use super::consumption::consumed_in_function;
use super::resolve::Resolved;
use super::scan;

/// Outcome a walk step can prove. `None` from a helper means the step
/// proved nothing and scanning continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Closed,
    Open,
}

/// Classifies allocation sites for one run.
///
/// Holds the run-scoped state the walk threads through: the per-file
/// import memo and the visited set that keeps cyclic referrer chains
/// (loop back-edges, self-capturing closures) from recursing forever.
pub struct Classifier<'a> {
    program: &'a Program,
    config: &'a Config,
    resolved: &'a Resolved,
    imports: ImportCache,
    visited: HashSet<(FuncId, InstrId)>,
}

impl<'a> Classifier<'a> {
    pub fn new(program: &'a Program, config: &'a Config, resolved: &'a Resolved) -> Self {
        Self {
            program,
            config,
            resolved,
            imports: ImportCache::new(),
            visited: HashSet::new(),
        }
    }

    /// Classify one allocation site. True means no use of the resource
    /// provably reaches a closing operation: the site leaks.
    pub fn is_open(&mut self, func_id: FuncId, site: InstrId) -> bool {
        self.visited.clear();
        self.open_at(func_id, site)
    }

    fn open_at(&mut self, func_id: FuncId, site: InstrId) -> bool {
        if !self.visited.insert((func_id, site)) {
            // Cyclic referrer chain; this edge proves nothing new.
            return false;
        }
        let func = self.program.function(func_id);
        if !scan::is_resource_call(func, site, self.resolved) {
            return false;
        }

        let site_refs = func.referrers(site);
        if site_refs.is_empty() {
            // Produced and immediately discarded.
            return true;
        }

        if scan::is_noop_accessor(self.program, func, site, self.config) {
            return false;
        }

        for &site_ref in site_refs {
            let val = match self.resource_value(func, site_ref) {
                Some(val) => val,
                None => continue,
            };
            if func.referrers(val).is_empty() {
                return true;
            }
            for &val_ref in func.referrers(val) {
                let verdict = match &func.instr(val_ref).kind {
                    InstrKind::Store { addr, .. } => self.store_verdict(func, *addr),
                    InstrKind::Call(call) | InstrKind::Defer(call) => {
                        // Resource routed into another function's body.
                        match call.callee {
                            Callee::Static(callee) => self.function_closes(callee),
                            _ => None,
                        }
                    }
                    InstrKind::FieldAddr { .. } => self.field_access(func, val_ref),
                    InstrKind::Phi { .. } => self.merge_verdict(func, val_ref),
                    // Unrecognized referrer kinds prove nothing either way.
                    _ => None,
                };
                match verdict {
                    Some(Verdict::Closed) => {
                        trace!(func = %func.name, "allocation proven closed");
                        return false;
                    }
                    Some(Verdict::Open) => return true,
                    None => {}
                }
            }
        }

        // No referrer produced proof of closing.
        true
    }

    /// Map a referrer of the allocation call to the resource value it
    /// routes: a field access on the resource, a store of it, or the
    /// resource-typed value itself (e.g. a tuple projection).
    fn resource_value(&self, func: &'a Function, id: InstrId) -> Option<InstrId> {
        let instr = func.instr(id);
        match &instr.kind {
            InstrKind::FieldAddr { object, .. }
                if func.ty(*object) == Some(&self.resolved.res_ptr) =>
            {
                Some(*object)
            }
            InstrKind::Store { value, .. } if func.ty(*value) == Some(&self.resolved.res_ptr) => {
                Some(*value)
            }
            _ if instr.ty.as_ref() == Some(&self.resolved.res_ptr) => Some(id),
            _ => None,
        }
    }

    /// A store of the resource. The verdict depends on where it lands:
    /// globals are assumed handled elsewhere, struct fields are checked
    /// in place, and locals may be captured by a closure that inherits
    /// the close obligation.
    fn store_verdict(&mut self, func: &'a Function, addr: InstrId) -> Option<Verdict> {
        match &func.instr(addr).kind {
            // Referrers of module state are invisible to the walk;
            // assume the other owner closes it rather than report noise.
            InstrKind::Global { .. } => Some(Verdict::Closed),
            InstrKind::FieldAddr { .. } => self.struct_field_verdict(func, addr),
            _ => {
                let addr_refs = func.referrers(addr);
                if addr_refs.is_empty() {
                    return Some(Verdict::Open);
                }
                for &addr_ref in addr_refs {
                    match &func.instr(addr_ref).kind {
                        InstrKind::MakeClosure {
                            func: closure_fn, ..
                        } => {
                            return Some(self.closure_verdict(func, addr_ref, *closure_fn));
                        }
                        InstrKind::Store { addr: inner, .. } => {
                            if let InstrKind::FieldAddr { .. } = func.instr(*inner).kind {
                                if let Some(v) = self.struct_field_verdict(func, *inner) {
                                    return Some(v);
                                }
                            }
                        }
                        _ => {}
                    }
                }
                None
            }
        }
    }

    /// The resource landed in a struct field: look in the same block for
    /// loads recovering the tracked stream and a closing consumer.
    fn struct_field_verdict(&self, func: &'a Function, field_addr: InstrId) -> Option<Verdict> {
        let block = func.block_of(field_addr)?;
        for &id in &block.instrs {
            if !self.is_tracked_load(func, id) {
                continue;
            }
            for &consumer in func.referrers(id) {
                if self.is_close_call(func, consumer) {
                    return Some(Verdict::Closed);
                }
            }
        }
        None
    }

    /// Ownership passed to a closure capturing the stored address.
    fn closure_verdict(
        &mut self,
        func: &'a Function,
        closure: InstrId,
        closure_fn: FuncId,
    ) -> Verdict {
        let target = self.program.function(closure_fn);
        if self
            .imports
            .never_imports(self.program, target, &self.config.resource_module)
        {
            // Defining file never touches the resource module; out of
            // scope for the walk.
            return Verdict::Closed;
        }
        if !closure_invoked(func, closure) {
            // Nothing executes the close obligation, but nothing
            // executes the leak either.
            trace!(closure = %target.name, "capturing closure is never invoked");
            return Verdict::Closed;
        }
        match self.function_closes(closure_fn) {
            Some(v) => v,
            None => Verdict::Open,
        }
    }

    /// Scan a callee or invoked-closure body: a closing instruction
    /// anywhere proves closed; an allocation-shaped call that itself
    /// classifies open proves open; otherwise no verdict.
    fn function_closes(&mut self, func_id: FuncId) -> Option<Verdict> {
        let func = self.program.function(func_id);
        for block in &func.blocks {
            for &id in &block.instrs {
                if self.is_close_call(func, id) {
                    return Some(Verdict::Closed);
                }
                if scan::is_resource_call(func, id, self.resolved) && self.open_at(func_id, id) {
                    return Some(Verdict::Open);
                }
            }
        }
        None
    }

    /// Direct access to a field of the resource. Closed only when some
    /// load of the tracked stream has a closing consumer and, in strict
    /// mode, the enclosing function also drains the stream.
    fn field_access(&self, func: &'a Function, field_addr: InstrId) -> Option<Verdict> {
        let refs = func.referrers(field_addr);
        if refs.is_empty() {
            return Some(Verdict::Open);
        }
        for &r in refs {
            if !self.is_tracked_load(func, r) {
                continue;
            }
            let consumers = func.referrers(r);
            if consumers.is_empty() {
                return Some(Verdict::Open);
            }
            let has_close = consumers.iter().any(|&c| self.is_close_call(func, c));
            let has_consumption = !self.config.check_consumption
                || consumed_in_function(self.program, func, self.config);
            if has_close && has_consumption {
                return Some(Verdict::Closed);
            }
        }
        None
    }

    /// A merge of values from different branches: apply the field-access
    /// test to each branch that reaches a field access.
    fn merge_verdict(&self, func: &'a Function, phi: InstrId) -> Option<Verdict> {
        let refs = func.referrers(phi);
        if refs.is_empty() {
            return Some(Verdict::Open);
        }
        for &r in refs {
            if let InstrKind::FieldAddr { .. } = func.instr(r).kind {
                if let Some(v) = self.field_access(func, r) {
                    return Some(v);
                }
            }
        }
        None
    }

    /// A load recovering the tracked stream out of the resource.
    fn is_tracked_load(&self, func: &Function, id: InstrId) -> bool {
        matches!(func.instr(id).kind, InstrKind::Load { .. })
            && func.ty(id) == Some(&self.resolved.field_ty)
    }

    /// Whether the instruction discharges the close obligation: a call
    /// or deferred call dispatching the close method, a conversion to
    /// the closer capability whose referrers reach one, or a return
    /// handing the stream (or the capability) to the caller.
    fn is_close_call(&self, func: &'a Function, id: InstrId) -> bool {
        match &func.instr(id).kind {
            InstrKind::Call(call) | InstrKind::Defer(call) => match &call.callee {
                Callee::Method(name) => *name == self.resolved.close_method,
                _ => false,
            },
            InstrKind::ChangeInterface { .. } => {
                let closer = match &self.resolved.closer_iface {
                    Some(closer) => closer,
                    None => return false,
                };
                if func.ty(id) != Some(closer) {
                    return false;
                }
                for &r in func.referrers(id) {
                    match &func.instr(r).kind {
                        InstrKind::Defer(call) => {
                            if let Callee::Static(fid) = call.callee {
                                if self.calls_close_method(fid) {
                                    return true;
                                }
                            }
                        }
                        InstrKind::Return { results } => {
                            if results.iter().any(|&res| func.ty(res) == Some(closer)) {
                                return true;
                            }
                        }
                        _ => {}
                    }
                }
                false
            }
            InstrKind::Return { results } => results
                .iter()
                .any(|&res| func.ty(res) == Some(&self.resolved.field_ty)),
            _ => false,
        }
    }

    /// True when the function body dispatches the close method.
    fn calls_close_method(&self, func_id: FuncId) -> bool {
        let func = self.program.function(func_id);
        for block in &func.blocks {
            for &id in &block.instrs {
                if let InstrKind::Call(call) = &func.instr(id).kind {
                    if let Callee::Method(name) = &call.callee {
                        if *name == self.resolved.close_method {
                            return true;
                        }
                    }
                }
            }
        }
        false
    }
}
