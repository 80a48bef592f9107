//! Resource type resolution.
//!
//! Resolution runs once per analysis. A unit that never imports the
//! resource's defining module resolves to `None` and the run produces no
//! diagnostics. A unit where the type exists but does not have the
//! configured shape aborts with a [`ResolveError`]: that signals a
//! broken assumption about the resource, not an inapplicable unit.

use thiserror::Error;

use crate::config::Config;
use crate::ir::{Program, TypeDef, TypeKey, TypeRepr};

/// Structural failures while resolving the tracked resource type.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{0} is not a struct type")]
    NotAStruct(TypeKey),
    #[error("cannot find field {field} on {key}")]
    MissingField { key: TypeKey, field: String },
    #[error("field {field} of {key} is not an interface type")]
    FieldNotInterface { key: TypeKey, field: String },
    #[error("cannot find method {method} on {field_ty}")]
    MissingCloseMethod { field_ty: TypeRepr, method: String },
    #[error("method {method} on {field_ty} must take no arguments and return nothing")]
    CloseMethodShape { field_ty: TypeRepr, method: String },
}

/// The resolved resource shape, computed once per run.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// Pointer type of the resource, e.g. `*net/http.Response`.
    pub res_ptr: TypeRepr,
    /// Name of the tracked field.
    pub field: String,
    /// Declared type of the tracked field, e.g. `io.ReadCloser`.
    pub field_ty: TypeRepr,
    /// Name of the close method.
    pub close_method: String,
    /// The generic closer capability, when the unit defines one.
    /// Absent means interface-conversion closings are never recognized.
    pub closer_iface: Option<TypeRepr>,
}

/// Resolve the tracked resource type against the analyzed unit.
///
/// `Ok(None)` means the unit never imports the resource module and the
/// whole check is skipped.
pub fn resolve(program: &Program, config: &Config) -> Result<Option<Resolved>, ResolveError> {
    let key = TypeKey::new(&config.resource_module, &config.resource_type);
    let def = match program.universe.lookup(&key) {
        Some(def) => def,
        None => return Ok(None),
    };

    let fields = match def {
        TypeDef::Struct { fields } => fields,
        _ => return Err(ResolveError::NotAStruct(key)),
    };

    let field = match fields.iter().find(|f| f.name == config.tracked_field) {
        Some(field) => field,
        None => {
            return Err(ResolveError::MissingField {
                key,
                field: config.tracked_field.clone(),
            })
        }
    };
    let field_ty = field.ty.clone();

    // The field's type must be a named interface exposing the close
    // method with no arguments and no results.
    let methods = match field_ty.named_key().and_then(|k| program.universe.lookup(k)) {
        Some(TypeDef::Interface { methods }) => methods,
        _ => {
            return Err(ResolveError::FieldNotInterface {
                key,
                field: config.tracked_field.clone(),
            })
        }
    };
    let close = match methods.iter().find(|m| m.name == config.close_method) {
        Some(close) => close,
        None => {
            return Err(ResolveError::MissingCloseMethod {
                field_ty,
                method: config.close_method.clone(),
            })
        }
    };
    if !close.params.is_empty() || !close.results.is_empty() {
        return Err(ResolveError::CloseMethodShape {
            field_ty,
            method: config.close_method.clone(),
        });
    }

    // Lenient: a unit that never mentions the closer capability simply
    // never matches the interface-conversion closing rule.
    let closer_iface = if program.universe.contains(&config.closer_interface) {
        Some(TypeRepr::Named(config.closer_interface.clone()))
    } else {
        None
    };

    Ok(Some(Resolved {
        res_ptr: TypeRepr::pointer(TypeRepr::Named(key)),
        field: config.tracked_field.clone(),
        field_ty,
        close_method: config.close_method.clone(),
        closer_iface,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FieldDef, MethodSig, ProgramBuilder};

    fn universe_with_response(close: MethodSig) -> ProgramBuilder {
        let mut pb = ProgramBuilder::new();
        pb.define_struct(
            "net/http",
            "Response",
            vec![FieldDef::new("Body", TypeRepr::named("io", "ReadCloser"))],
        );
        pb.define_interface("io", "ReadCloser", vec![close]);
        pb
    }

    #[test]
    fn test_missing_resource_type_skips() {
        let program = ProgramBuilder::new().finish();
        let resolved = resolve(&program, &Config::default()).unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn test_resolves_response_shape() {
        let mut pb = universe_with_response(MethodSig::nullary("Close"));
        pb.define_interface("io", "Closer", vec![MethodSig::nullary("Close")]);
        let program = pb.finish();

        let resolved = resolve(&program, &Config::default()).unwrap().unwrap();
        assert_eq!(resolved.res_ptr, TypeRepr::pointer_to("net/http", "Response"));
        assert_eq!(resolved.field, "Body");
        assert_eq!(resolved.field_ty, TypeRepr::named("io", "ReadCloser"));
        assert_eq!(resolved.closer_iface, Some(TypeRepr::named("io", "Closer")));
    }

    #[test]
    fn test_missing_field_is_structural_error() {
        let mut pb = ProgramBuilder::new();
        pb.define_struct(
            "net/http",
            "Response",
            vec![FieldDef::new("Status", TypeRepr::basic("string"))],
        );
        let program = pb.finish();

        let err = resolve(&program, &Config::default()).unwrap_err();
        assert!(matches!(err, ResolveError::MissingField { .. }));
    }

    #[test]
    fn test_close_with_results_is_structural_error() {
        let close = MethodSig {
            name: "Close".to_string(),
            params: Vec::new(),
            results: vec![TypeRepr::basic("error")],
        };
        let program = universe_with_response(close).finish();

        let err = resolve(&program, &Config::default()).unwrap_err();
        assert!(matches!(err, ResolveError::CloseMethodShape { .. }));
    }

    #[test]
    fn test_missing_closer_interface_is_not_an_error() {
        let program = universe_with_response(MethodSig::nullary("Close")).finish();
        let resolved = resolve(&program, &Config::default()).unwrap().unwrap();
        assert!(resolved.closer_iface.is_none());
    }
}
