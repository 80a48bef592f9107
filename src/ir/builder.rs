//! Builders that assemble programs and wire def-use edges.
//!
//! Referrer edges are recorded as instructions are appended: pushing an
//! instruction adds it to the referrer list of every operand. The
//! finished IR is immutable; the classifier only reads it.

use super::func::{
    Block, CallCommon, Callee, FileId, FuncId, Function, Instr, InstrId, InstrKind, Position,
    Program, SourceFile,
};
use super::types::{FieldDef, MethodSig, TypeDef, TypeKey, TypeRepr};

/// Builds a `Program` from files, type definitions, and functions.
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    program: Program,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, name: impl Into<String>, imports: &[&str]) -> FileId {
        let id = FileId(self.program.files.len() as u32);
        self.program.files.push(SourceFile {
            name: name.into(),
            imports: imports.iter().map(|s| s.to_string()).collect(),
        });
        id
    }

    pub fn define_struct(
        &mut self,
        module: impl Into<String>,
        name: impl Into<String>,
        fields: Vec<FieldDef>,
    ) {
        self.program
            .universe
            .define(TypeKey::new(module, name), TypeDef::Struct { fields });
    }

    pub fn define_interface(
        &mut self,
        module: impl Into<String>,
        name: impl Into<String>,
        methods: Vec<MethodSig>,
    ) {
        self.program
            .universe
            .define(TypeKey::new(module, name), TypeDef::Interface { methods });
    }

    pub fn add_function(&mut self, func: Function) -> FuncId {
        let id = FuncId(self.program.functions.len() as u32);
        self.program.functions.push(func);
        id
    }

    /// Id the next `add_function` call will assign. Useful for wiring
    /// forward references (a closure added after its enclosing function).
    pub fn next_function_id(&self) -> FuncId {
        FuncId(self.program.functions.len() as u32)
    }

    pub fn finish(self) -> Program {
        self.program
    }
}

/// Builds one function's blocks and instructions.
pub struct FuncBuilder {
    func: Function,
    current: usize,
}

impl FuncBuilder {
    pub fn new(name: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            func: Function {
                name: name.into(),
                module: module.into(),
                file: None,
                receiver: None,
                results: Vec::new(),
                blocks: Vec::new(),
                instrs: Vec::new(),
            },
            current: 0,
        }
    }

    pub fn file(mut self, file: FileId) -> Self {
        self.func.file = Some(file);
        self
    }

    pub fn receiver(mut self, ty: TypeRepr) -> Self {
        self.func.receiver = Some(ty);
        self
    }

    pub fn results(mut self, tys: Vec<TypeRepr>) -> Self {
        self.func.results = tys;
        self
    }

    /// Start a new block and make it current. Returns the block index.
    pub fn block(&mut self) -> usize {
        self.func.blocks.push(Block::default());
        self.current = self.func.blocks.len() - 1;
        self.current
    }

    fn push(&mut self, kind: InstrKind, ty: Option<TypeRepr>, pos: Position) -> InstrId {
        if self.func.blocks.is_empty() {
            self.block();
        }
        let id = InstrId(self.func.instrs.len() as u32);
        for op in operands(&kind) {
            self.func.instrs[op.0 as usize].referrers.push(id);
        }
        self.func.instrs.push(Instr {
            kind,
            ty,
            pos,
            referrers: Vec::new(),
        });
        self.func.blocks[self.current].instrs.push(id);
        id
    }

    pub fn call(
        &mut self,
        callee: Callee,
        args: Vec<InstrId>,
        ty: Option<TypeRepr>,
        pos: Position,
    ) -> InstrId {
        self.push(InstrKind::Call(CallCommon { callee, args }), ty, pos)
    }

    pub fn defer_call(&mut self, callee: Callee, args: Vec<InstrId>, pos: Position) -> InstrId {
        self.push(InstrKind::Defer(CallCommon { callee, args }), None, pos)
    }

    pub fn extract(&mut self, tuple: InstrId, index: usize, ty: TypeRepr, pos: Position) -> InstrId {
        self.push(InstrKind::Extract { tuple, index }, Some(ty), pos)
    }

    pub fn field_addr(
        &mut self,
        object: InstrId,
        field: impl Into<String>,
        ty: TypeRepr,
        pos: Position,
    ) -> InstrId {
        self.push(
            InstrKind::FieldAddr {
                object,
                field: field.into(),
            },
            Some(ty),
            pos,
        )
    }

    pub fn load(&mut self, addr: InstrId, ty: TypeRepr, pos: Position) -> InstrId {
        self.push(InstrKind::Load { addr }, Some(ty), pos)
    }

    pub fn store(&mut self, addr: InstrId, value: InstrId, pos: Position) -> InstrId {
        self.push(InstrKind::Store { addr, value }, None, pos)
    }

    pub fn alloc(&mut self, ty: TypeRepr, pos: Position) -> InstrId {
        self.push(InstrKind::Alloc, Some(ty), pos)
    }

    pub fn global(
        &mut self,
        module: impl Into<String>,
        name: impl Into<String>,
        ty: TypeRepr,
        pos: Position,
    ) -> InstrId {
        self.push(
            InstrKind::Global {
                module: module.into(),
                name: name.into(),
            },
            Some(ty),
            pos,
        )
    }

    pub fn param(&mut self, index: usize, ty: TypeRepr, pos: Position) -> InstrId {
        self.push(InstrKind::Param { index }, Some(ty), pos)
    }

    pub fn free_var(&mut self, index: usize, ty: TypeRepr, pos: Position) -> InstrId {
        self.push(InstrKind::FreeVar { index }, Some(ty), pos)
    }

    pub fn make_closure(&mut self, func: FuncId, bindings: Vec<InstrId>, pos: Position) -> InstrId {
        self.push(
            InstrKind::MakeClosure { func, bindings },
            Some(TypeRepr::Func),
            pos,
        )
    }

    pub fn change_interface(&mut self, value: InstrId, ty: TypeRepr, pos: Position) -> InstrId {
        self.push(InstrKind::ChangeInterface { value }, Some(ty), pos)
    }

    pub fn phi(&mut self, edges: Vec<InstrId>, ty: TypeRepr, pos: Position) -> InstrId {
        self.push(InstrKind::Phi { edges }, Some(ty), pos)
    }

    pub fn ret(&mut self, results: Vec<InstrId>, pos: Position) -> InstrId {
        self.push(InstrKind::Return { results }, None, pos)
    }

    pub fn finish(self) -> Function {
        self.func
    }
}

/// The values an instruction reads, for referrer wiring.
fn operands(kind: &InstrKind) -> Vec<InstrId> {
    match kind {
        InstrKind::Call(call) | InstrKind::Defer(call) => {
            let mut ops = call.args.clone();
            if let Callee::Value(v) = call.callee {
                ops.push(v);
            }
            ops
        }
        InstrKind::Extract { tuple, .. } => vec![*tuple],
        InstrKind::FieldAddr { object, .. } => vec![*object],
        InstrKind::Load { addr } => vec![*addr],
        InstrKind::Store { addr, value } => vec![*addr, *value],
        InstrKind::MakeClosure { bindings, .. } => bindings.clone(),
        InstrKind::ChangeInterface { value } => vec![*value],
        InstrKind::Phi { edges } => edges.clone(),
        InstrKind::Return { results } => results.clone(),
        InstrKind::Alloc
        | InstrKind::Global { .. }
        | InstrKind::Param { .. }
        | InstrKind::FreeVar { .. } => Vec::new(),
    }
}
