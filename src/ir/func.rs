//! Programs, functions, blocks, and typed instructions.
//!
//! The instruction set is the minimum the classifier needs: calls and
//! deferred calls, tuple projections, field addresses, loads, stores,
//! closures, interface conversions, merges, and returns. Every value
//! carries its complete referrer set as a first-class relation; the
//! builder wires these edges, and nothing mutates them afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::{TypeRepr, TypeUniverse};

/// Index of a function within its `Program`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FuncId(pub u32);

/// Index of a source file within its `Program`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(pub u32);

/// Index of an instruction within its function's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstrId(pub u32);

/// Source position, 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A source file and the module paths it imports.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub imports: Vec<String>,
}

/// How a call names its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callee {
    /// A statically known function in the program (including external
    /// declarations with no body).
    Static(FuncId),
    /// Dynamic dispatch through an interface method name.
    Method(String),
    /// Indirect call through a function value, e.g. a closure.
    Value(InstrId),
}

/// Target and arguments shared by calls and deferred calls.
#[derive(Debug, Clone)]
pub struct CallCommon {
    pub callee: Callee,
    pub args: Vec<InstrId>,
}

/// One typed instruction.
///
/// Matched exhaustively by the classifier; adding a variant forces every
/// referrer-dispatch site to handle it deliberately.
#[derive(Debug, Clone)]
pub enum InstrKind {
    /// Function or method call.
    Call(CallCommon),
    /// Call scheduled to run when the enclosing function exits.
    Defer(CallCommon),
    /// Projection of one element out of a tuple-typed value.
    Extract { tuple: InstrId, index: usize },
    /// Address of a named field of a struct value.
    FieldAddr { object: InstrId, field: String },
    /// Read through an address.
    Load { addr: InstrId },
    /// Write a value through an address.
    Store { addr: InstrId, value: InstrId },
    /// Local stack slot.
    Alloc,
    /// A module-level variable. Writes to these leave the function's
    /// def-use graph.
    Global { module: String, name: String },
    /// A declared parameter of the enclosing function.
    Param { index: usize },
    /// A variable captured by reference from the enclosing scope.
    FreeVar { index: usize },
    /// Function value binding captured variables to `func`.
    MakeClosure { func: FuncId, bindings: Vec<InstrId> },
    /// Conversion of a value to another interface type.
    ChangeInterface { value: InstrId },
    /// Merge of values flowing in from different predecessor blocks.
    Phi { edges: Vec<InstrId> },
    /// Function return.
    Return { results: Vec<InstrId> },
}

/// An instruction plus its static type, position, and referrers.
#[derive(Debug, Clone)]
pub struct Instr {
    pub kind: InstrKind,
    /// Static result type; `None` for pure effects (stores, defers,
    /// returns).
    pub ty: Option<TypeRepr>,
    pub pos: Position,
    /// Instructions that consume this value. Complete by construction.
    pub referrers: Vec<InstrId>,
}

impl Instr {
    pub fn is_value(&self) -> bool {
        self.ty.is_some()
    }
}

/// A straight-line sequence of instructions.
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub instrs: Vec<InstrId>,
}

/// A function: declared signature plus blocks over an instruction arena.
///
/// A function with no blocks is an external declaration; the classifier
/// can name it as a callee but finds nothing to scan inside it.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    /// Module path of the defining package.
    pub module: String,
    /// Defining source file; `None` for external declarations.
    pub file: Option<FileId>,
    /// Receiver type for methods.
    pub receiver: Option<TypeRepr>,
    /// Declared result types.
    pub results: Vec<TypeRepr>,
    pub blocks: Vec<Block>,
    pub(crate) instrs: Vec<Instr>,
}

impl Function {
    pub fn instr(&self, id: InstrId) -> &Instr {
        &self.instrs[id.0 as usize]
    }

    pub fn referrers(&self, id: InstrId) -> &[InstrId] {
        &self.instrs[id.0 as usize].referrers
    }

    pub fn ty(&self, id: InstrId) -> Option<&TypeRepr> {
        self.instrs[id.0 as usize].ty.as_ref()
    }

    /// The block containing the given instruction.
    pub fn block_of(&self, id: InstrId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.instrs.contains(&id))
    }

    pub fn is_external(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// A whole analyzed unit: files, functions, and the type universe.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub files: Vec<SourceFile>,
    pub functions: Vec<Function>,
    pub universe: TypeUniverse,
}

impl Program {
    pub fn function(&self, id: FuncId) -> &Function {
        &self.functions[id.0 as usize]
    }

    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_display() {
        assert_eq!(Position::new(12, 3).to_string(), "12:3");
    }

    #[test]
    fn test_external_function_has_no_blocks() {
        let f = Function {
            name: "Copy".to_string(),
            module: "io".to_string(),
            file: None,
            receiver: None,
            results: Vec::new(),
            blocks: Vec::new(),
            instrs: Vec::new(),
        };
        assert!(f.is_external());
    }
}
