//! Type representations for the analyzed program.
//!
//! The classifier never sees source text; it matches types by structure.
//! `TypeRepr` mirrors the notation a Go-like frontend prints (the host
//! frontend compares type strings), but keeps the shape explicit so that
//! containment checks cannot accidentally match a substring of an
//! unrelated type name.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A (module, name) pair identifying a named type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeKey {
    pub module: String,
    pub name: String,
}

impl TypeKey {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.name)
    }
}

/// Structural type of a value in the IR.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRepr {
    /// A built-in type ("error", "string", "int64").
    Basic(String),
    /// A named type defined in a specific module.
    Named(TypeKey),
    /// Pointer to another type.
    Pointer(Box<TypeRepr>),
    /// Multi-result value, as produced by calls with several results.
    Tuple(Vec<TypeRepr>),
    /// A function value; signatures are not tracked.
    Func,
}

impl TypeRepr {
    pub fn basic(name: impl Into<String>) -> Self {
        TypeRepr::Basic(name.into())
    }

    pub fn named(module: impl Into<String>, name: impl Into<String>) -> Self {
        TypeRepr::Named(TypeKey::new(module, name))
    }

    /// Pointer to a named type, e.g. `*net/http.Response`.
    pub fn pointer_to(module: impl Into<String>, name: impl Into<String>) -> Self {
        TypeRepr::Pointer(Box::new(TypeRepr::named(module, name)))
    }

    pub fn pointer(elem: TypeRepr) -> Self {
        TypeRepr::Pointer(Box::new(elem))
    }

    /// Whether this type is, or a tuple element of this type is, `target`.
    ///
    /// This is the structural version of the frontend's textual
    /// containment test on result-type strings: a call returning
    /// `(*net/http.Response, error)` produces the resource.
    pub fn contains(&self, target: &TypeRepr) -> bool {
        if self == target {
            return true;
        }
        match self {
            TypeRepr::Tuple(elems) => elems.iter().any(|e| e.contains(target)),
            _ => false,
        }
    }

    /// The named type at the core of this type, peeling pointers.
    pub fn named_key(&self) -> Option<&TypeKey> {
        match self {
            TypeRepr::Named(key) => Some(key),
            TypeRepr::Pointer(elem) => elem.named_key(),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRepr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRepr::Basic(name) => write!(f, "{}", name),
            TypeRepr::Named(key) => write!(f, "{}", key),
            TypeRepr::Pointer(elem) => write!(f, "*{}", elem),
            TypeRepr::Tuple(elems) => {
                write!(f, "(")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, ")")
            }
            TypeRepr::Func => write!(f, "func"),
        }
    }
}

/// A method declared on an interface type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSig {
    pub name: String,
    #[serde(default)]
    pub params: Vec<TypeRepr>,
    #[serde(default)]
    pub results: Vec<TypeRepr>,
}

impl MethodSig {
    /// A method taking no arguments and returning nothing.
    pub fn nullary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            results: Vec::new(),
        }
    }
}

/// A field of a struct type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeRepr,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: TypeRepr) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Definition backing a named type.
#[derive(Debug, Clone)]
pub enum TypeDef {
    Struct { fields: Vec<FieldDef> },
    Interface { methods: Vec<MethodSig> },
    /// Defined elsewhere; shape unknown to this unit.
    Opaque,
}

/// All named types the host frontend resolved for the analyzed unit.
///
/// Only types reachable from the unit's import graph appear here, so a
/// failed lookup of the resource type means the unit never imports the
/// tracked module.
#[derive(Debug, Clone, Default)]
pub struct TypeUniverse {
    types: HashMap<TypeKey, TypeDef>,
}

impl TypeUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, key: TypeKey, def: TypeDef) {
        self.types.insert(key, def);
    }

    pub fn lookup(&self, key: &TypeKey) -> Option<&TypeDef> {
        self.types.get(key)
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.types.contains_key(key)
    }
}
