//! Run configuration for the leak check.
//!
//! A config names the resource shape being tracked: the struct type, the
//! stream field on it, the method that closes the stream, and the calls
//! recognized as draining it. One immutable config is constructed per
//! run and passed into every component.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::ir::TypeKey;

/// A call recognized as fully draining the tracked stream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConsumingOp {
    pub module: String,
    pub function: String,
}

impl ConsumingOp {
    pub fn new(module: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            function: function.into(),
        }
    }
}

/// A method whose result never needs closing.
///
/// Closing the stream of a non-functional test recorder has no effect,
/// so its accessor's results are excluded before classification.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NoopAccessor {
    pub module: String,
    pub receiver: String,
    pub method: String,
}

static DEFAULT_CONSUMING_OPERATIONS: Lazy<Vec<ConsumingOp>> = Lazy::new(|| {
    vec![
        ConsumingOp::new("io", "Copy"),
        ConsumingOp::new("io", "ReadAll"),
        ConsumingOp::new("io/ioutil", "ReadAll"),
        ConsumingOp::new("encoding/json", "NewDecoder"),
        ConsumingOp::new("bufio", "NewScanner"),
        ConsumingOp::new("bufio", "NewReader"),
    ]
});

static DEFAULT_NOOP_ACCESSORS: Lazy<Vec<NoopAccessor>> = Lazy::new(|| {
    vec![NoopAccessor {
        module: "net/http/httptest".to_string(),
        receiver: "ResponseRecorder".to_string(),
        method: "Result".to_string(),
    }]
});

/// Immutable configuration for one analysis run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Also require that the tracked stream is drained somewhere in the
    /// function, not only closed.
    #[serde(default)]
    pub check_consumption: bool,
    /// Module defining the resource type.
    #[serde(default = "default_resource_module")]
    pub resource_module: String,
    /// Name of the resource struct type.
    #[serde(default = "default_resource_type")]
    pub resource_type: String,
    /// Field holding the stream that must be closed.
    #[serde(default = "default_tracked_field")]
    pub tracked_field: String,
    /// Method on the field's interface that closes the stream.
    #[serde(default = "default_close_method")]
    pub close_method: String,
    /// Interface whose presence in a conversion or return hands the
    /// close obligation to another owner.
    #[serde(default = "default_closer_interface")]
    pub closer_interface: TypeKey,
    #[serde(default = "default_consuming_operations")]
    pub consuming_operations: Vec<ConsumingOp>,
    #[serde(default = "default_noop_accessors")]
    pub noop_accessors: Vec<NoopAccessor>,
}

fn default_resource_module() -> String {
    "net/http".to_string()
}

fn default_resource_type() -> String {
    "Response".to_string()
}

fn default_tracked_field() -> String {
    "Body".to_string()
}

fn default_close_method() -> String {
    "Close".to_string()
}

fn default_closer_interface() -> TypeKey {
    TypeKey::new("io", "Closer")
}

fn default_consuming_operations() -> Vec<ConsumingOp> {
    DEFAULT_CONSUMING_OPERATIONS.clone()
}

fn default_noop_accessors() -> Vec<NoopAccessor> {
    DEFAULT_NOOP_ACCESSORS.clone()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            check_consumption: false,
            resource_module: default_resource_module(),
            resource_type: default_resource_type(),
            tracked_field: default_tracked_field(),
            close_method: default_close_method(),
            closer_interface: default_closer_interface(),
            consuming_operations: default_consuming_operations(),
            noop_accessors: default_noop_accessors(),
        }
    }
}

impl Config {
    /// Default config with consumption checking enabled.
    pub fn with_consumption() -> Self {
        Self {
            check_consumption: true,
            ..Self::default()
        }
    }

    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

/// Validate a config for correctness.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    if config.resource_module.is_empty() {
        anyhow::bail!("resource_module must not be empty");
    }
    if config.resource_type.is_empty() {
        anyhow::bail!("resource_type must not be empty");
    }
    if config.tracked_field.is_empty() {
        anyhow::bail!("tracked_field must not be empty");
    }
    if config.close_method.is_empty() {
        anyhow::bail!("close_method must not be empty");
    }
    for op in &config.consuming_operations {
        if op.module.is_empty() || op.function.is_empty() {
            anyhow::bail!("consuming operation with empty module or function name");
        }
    }
    Ok(())
}
