//! Schema definitions for declarative flow files.
//!
//! These structs map to the YAML (or JSON) flow definition format.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::task::{Param, ParamKind, Signature, Task};

/// Root of a flow definition file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Flow name (defaults to "Flow")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Opaque schedule, passed through unchanged
    #[serde(skip_serializing_if = "Value::is_null")]
    pub schedule: Value,

    /// Opaque environment, passed through unchanged
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Value>,

    /// Task definitions, in flow order
    pub tasks: Vec<TaskConfig>,
}

/// A single task definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    /// Declared parameters
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamConfig>,

    /// Marks the task as a flow parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<ParameterConfig>,

    /// Identity attributes
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,

    /// Names of tasks that must run before this one
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub upstream: Vec<String>,

    /// Names of tasks that must run after this one
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub downstream: Vec<String>,

    /// Keyword argument -> name of the task providing it
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub keywords: BTreeMap<String, String>,
}

impl TaskConfig {
    /// Build the task this entry defines.
    pub fn to_task(&self) -> Task {
        let signature = self
            .params
            .iter()
            .cloned()
            .fold(Signature::new(), |mut sig, param| {
                sig.push(param.into());
                sig
            });

        let mut builder = Task::builder(&self.name).signature(signature);
        if let Some(slug) = &self.slug {
            builder = builder.slug(slug);
        }
        if let Some(parameter) = &self.parameter {
            builder = builder.parameter(parameter.required, parameter.default.clone());
        }
        for (key, value) in &self.attributes {
            builder = builder.attribute(key, value.clone());
        }
        builder.build()
    }
}

/// A declared parameter: a bare name or a name with a kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamConfig {
    /// Positional-or-keyword parameter
    Name(String),
    /// Parameter with an explicit kind
    Full(Param),
}

impl From<ParamConfig> for Param {
    fn from(config: ParamConfig) -> Self {
        match config {
            ParamConfig::Name(name) => Param::new(name, ParamKind::PositionalOrKeyword),
            ParamConfig::Full(param) => param,
        }
    }
}

/// Flow parameter settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterConfig {
    pub required: bool,
    pub default: Value,
}
