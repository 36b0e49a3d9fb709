//! Node template catalog

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::models::design::{NodeType, Port, PortConfig, PortSide, PropertyBag};

/// A read-only catalog entry describing how to instantiate a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTemplate {
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    pub category: TemplateCategory,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default_properties: PropertyBag,
    #[serde(default)]
    pub ports: Option<PortConfig>,
    #[serde(default)]
    pub config_fields: Vec<TemplateField>,
}

/// Palette grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateCategory {
    Control,
    Task,
    Gateway,
}

/// A configurable field shown in the property panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateField {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default_value: Option<serde_json::Value>,
    #[serde(default)]
    pub options: Vec<FieldOption>,
}

/// Input widget kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Textarea,
    Number,
    Select,
    Checkbox,
    Code,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

fn port(id: &str, side: PortSide) -> Port {
    Port {
        id: id.to_string(),
        label: None,
        position: side,
    }
}

fn field(key: &str, label: &str, kind: FieldKind, required: bool) -> TemplateField {
    TemplateField {
        key: key.to_string(),
        label: label.to_string(),
        kind,
        required,
        default_value: None,
        options: Vec::new(),
    }
}

fn props(value: serde_json::Value) -> PropertyBag {
    match value {
        serde_json::Value::Object(map) => map,
        _ => PropertyBag::new(),
    }
}

/// Catalog installed when the backend template endpoint is unavailable
pub fn builtin_templates() -> Vec<NodeTemplate> {
    let in_out = || PortConfig {
        inputs: vec![port("in", PortSide::Top)],
        outputs: vec![port("out", PortSide::Bottom)],
    };
    let gateway_ports = || PortConfig {
        inputs: vec![port("in", PortSide::Top)],
        outputs: vec![
            port("out-1", PortSide::Bottom),
            port("out-2", PortSide::Right),
            port("out-3", PortSide::Left),
        ],
    };

    vec![
        NodeTemplate {
            node_type: NodeType::Start,
            name: "Start".to_string(),
            icon: "play-circle".to_string(),
            category: TemplateCategory::Control,
            description: "Entry point of the workflow".to_string(),
            default_properties: PropertyBag::new(),
            ports: Some(PortConfig {
                inputs: Vec::new(),
                outputs: vec![port("out", PortSide::Bottom)],
            }),
            config_fields: Vec::new(),
        },
        NodeTemplate {
            node_type: NodeType::End,
            name: "End".to_string(),
            icon: "stop-circle".to_string(),
            category: TemplateCategory::Control,
            description: "Terminates the workflow".to_string(),
            default_properties: PropertyBag::new(),
            ports: Some(PortConfig {
                inputs: vec![port("in", PortSide::Top)],
                outputs: Vec::new(),
            }),
            config_fields: Vec::new(),
        },
        NodeTemplate {
            node_type: NodeType::UserTask,
            name: "User Task".to_string(),
            icon: "user".to_string(),
            category: TemplateCategory::Task,
            description: "Work performed by a person".to_string(),
            default_properties: props(json!({"assignee": ""})),
            ports: Some(in_out()),
            config_fields: vec![
                field("assignee", "Assignee", FieldKind::Text, true),
                field("formKey", "Form", FieldKind::Text, false),
            ],
        },
        NodeTemplate {
            node_type: NodeType::ServiceTask,
            name: "Service Task".to_string(),
            icon: "api".to_string(),
            category: TemplateCategory::Task,
            description: "Calls an external service".to_string(),
            default_properties: props(json!({"method": "POST", "timeout": 30})),
            ports: Some(in_out()),
            config_fields: vec![
                field("url", "URL", FieldKind::Text, true),
                TemplateField {
                    default_value: Some(json!("POST")),
                    options: ["GET", "POST", "PUT", "DELETE"]
                        .iter()
                        .map(|m| FieldOption {
                            label: m.to_string(),
                            value: m.to_string(),
                        })
                        .collect(),
                    ..field("method", "Method", FieldKind::Select, true)
                },
                field("timeout", "Timeout (s)", FieldKind::Number, false),
            ],
        },
        NodeTemplate {
            node_type: NodeType::ScriptTask,
            name: "Script Task".to_string(),
            icon: "code".to_string(),
            category: TemplateCategory::Task,
            description: "Runs an inline script".to_string(),
            default_properties: props(json!({"language": "javascript", "script": ""})),
            ports: Some(in_out()),
            config_fields: vec![
                field("language", "Language", FieldKind::Text, true),
                field("script", "Script", FieldKind::Code, true),
            ],
        },
        NodeTemplate {
            node_type: NodeType::ExclusiveGateway,
            name: "Exclusive Gateway".to_string(),
            icon: "fork".to_string(),
            category: TemplateCategory::Gateway,
            description: "Takes exactly one outgoing branch".to_string(),
            default_properties: PropertyBag::new(),
            ports: Some(gateway_ports()),
            config_fields: Vec::new(),
        },
        NodeTemplate {
            node_type: NodeType::ParallelGateway,
            name: "Parallel Gateway".to_string(),
            icon: "branches".to_string(),
            category: TemplateCategory::Gateway,
            description: "Takes every outgoing branch".to_string(),
            default_properties: PropertyBag::new(),
            ports: Some(gateway_ports()),
            config_fields: Vec::new(),
        },
        NodeTemplate {
            node_type: NodeType::InclusiveGateway,
            name: "Inclusive Gateway".to_string(),
            icon: "partition".to_string(),
            category: TemplateCategory::Gateway,
            description: "Takes every branch whose condition holds".to_string(),
            default_properties: PropertyBag::new(),
            ports: Some(gateway_ports()),
            config_fields: Vec::new(),
        },
        NodeTemplate {
            node_type: NodeType::SubProcess,
            name: "Sub Process".to_string(),
            icon: "apartment".to_string(),
            category: TemplateCategory::Task,
            description: "Runs another published workflow".to_string(),
            default_properties: PropertyBag::new(),
            ports: Some(in_out()),
            config_fields: vec![field("calledElement", "Workflow", FieldKind::Text, true)],
        },
    ]
}
