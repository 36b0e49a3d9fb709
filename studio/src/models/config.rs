//! Typed node configuration
//!
//! A node's property bag is stored untyped on the wire. [`NodeConfig`] reads
//! it into a record keyed by the node type so callers never poke at raw JSON.
//! Keys a record doesn't know are kept in its `extra` map, and keys it does
//! know are written back whenever the input carried them, even as `null` or
//! `[]`. That makes `NodeConfig::from_node(..).into_properties()` lossless.

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::StudioError;
use crate::models::design::{DesignerNode, NodeType, PropertyBag};

/// Typed view over a node's property bag
#[derive(Debug, Clone, PartialEq)]
pub enum NodeConfig {
    Start(EventConfig),
    End(EventConfig),
    UserTask(UserTaskConfig),
    ServiceTask(ServiceTaskConfig),
    ScriptTask(ScriptTaskConfig),
    Gateway(GatewayConfig),
    SubProcess(SubProcessConfig),
    /// Unrecognised node types keep their raw bag
    Generic(PropertyBag),
}

/// Start and end events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventConfig {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: PropertyBag,
    #[serde(skip)]
    present: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTaskConfig {
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub candidate_groups: Vec<String>,
    #[serde(default)]
    pub form_key: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(flatten)]
    pub extra: PropertyBag,
    #[serde(skip)]
    present: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTaskConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(flatten)]
    pub extra: PropertyBag,
    #[serde(skip)]
    present: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptTaskConfig {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub script: Option<String>,
    #[serde(flatten)]
    pub extra: PropertyBag,
    #[serde(skip)]
    present: BTreeSet<String>,
}

/// Shared by the exclusive, parallel and inclusive gateways
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Edge taken when no condition matches
    #[serde(default)]
    pub default_flow: Option<String>,
    #[serde(flatten)]
    pub extra: PropertyBag,
    #[serde(skip)]
    present: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubProcessConfig {
    #[serde(default)]
    pub called_element: Option<String>,
    #[serde(default)]
    pub wait_for_completion: Option<bool>,
    #[serde(flatten)]
    pub extra: PropertyBag,
    #[serde(skip)]
    present: BTreeSet<String>,
}

/// Records that remember which of their keys the source bag carried
trait KnownKeys {
    fn present_mut(&mut self) -> &mut BTreeSet<String>;
    fn present(&self) -> &BTreeSet<String>;
    fn extra(&self) -> &PropertyBag;
}

macro_rules! known_keys {
    ($($config:ty),*) => {
        $(impl KnownKeys for $config {
            fn present_mut(&mut self) -> &mut BTreeSet<String> {
                &mut self.present
            }

            fn present(&self) -> &BTreeSet<String> {
                &self.present
            }

            fn extra(&self) -> &PropertyBag {
                &self.extra
            }
        })*
    };
}

known_keys!(
    EventConfig,
    UserTaskConfig,
    ServiceTaskConfig,
    ScriptTaskConfig,
    GatewayConfig,
    SubProcessConfig
);

impl NodeConfig {
    /// Read the typed configuration of `node`
    pub fn from_node(node: &DesignerNode) -> Result<Self, StudioError> {
        Self::from_properties(&node.node_type, &node.properties)
    }

    pub fn from_properties(node_type: &NodeType, properties: &PropertyBag) -> Result<Self, StudioError> {
        let config = match node_type {
            NodeType::Start => NodeConfig::Start(parse(properties)?),
            NodeType::End => NodeConfig::End(parse(properties)?),
            NodeType::UserTask => NodeConfig::UserTask(parse(properties)?),
            NodeType::ServiceTask => NodeConfig::ServiceTask(parse(properties)?),
            NodeType::ScriptTask => NodeConfig::ScriptTask(parse(properties)?),
            NodeType::ExclusiveGateway | NodeType::ParallelGateway | NodeType::InclusiveGateway => {
                NodeConfig::Gateway(parse(properties)?)
            }
            NodeType::SubProcess => NodeConfig::SubProcess(parse(properties)?),
            NodeType::Custom(_) => NodeConfig::Generic(properties.clone()),
        };
        Ok(config)
    }

    /// Serialize back into a property bag
    pub fn into_properties(self) -> Result<PropertyBag, StudioError> {
        match self {
            NodeConfig::Start(c) | NodeConfig::End(c) => to_bag(&c),
            NodeConfig::UserTask(c) => to_bag(&c),
            NodeConfig::ServiceTask(c) => to_bag(&c),
            NodeConfig::ScriptTask(c) => to_bag(&c),
            NodeConfig::Gateway(c) => to_bag(&c),
            NodeConfig::SubProcess(c) => to_bag(&c),
            NodeConfig::Generic(bag) => Ok(bag),
        }
    }
}

fn parse<T: DeserializeOwned + KnownKeys>(properties: &PropertyBag) -> Result<T, StudioError> {
    let mut config: T = serde_json::from_value(serde_json::Value::Object(properties.clone()))?;
    *config.present_mut() = properties.keys().cloned().collect();
    Ok(config)
}

/// Serialize `config`, dropping known fields that are unset and were not in
/// the source bag
fn to_bag<T: Serialize + KnownKeys>(config: &T) -> Result<PropertyBag, StudioError> {
    let mut map = match serde_json::to_value(config)? {
        serde_json::Value::Object(map) => map,
        other => {
            return Err(StudioError::Internal(format!(
                "node config serialized to non-object: {}",
                other
            )))
        }
    };
    map.retain(|key, value| {
        config.present().contains(key) || config.extra().contains_key(key) || !is_unset(value)
    });
    Ok(map)
}

fn is_unset(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
