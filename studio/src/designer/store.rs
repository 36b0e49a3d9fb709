//! Designer state store
//!
//! Owns the render graph being edited. Graph mutations are local and
//! synchronous; the backend is only contacted by the explicit load, save,
//! validate, publish, import and export operations. After a save the
//! server's copy of the document replaces the local one.

use std::sync::Arc;

use openapi_client::models::CreateDraftRequest;
use tracing::{debug, error, info, warn};

use crate::errors::StudioError;
use crate::graph::changes::{
    apply_edge_changes, apply_node_changes, removed_node_ids, Connection, EdgeChange, NodeChange,
};
use crate::graph::projection::{
    apply_render_graph, from_render_edge, from_render_node, to_render_graph, to_render_node,
    RenderEdge, RenderEdgeData, RenderNode, LABEL_KEY,
};
use crate::http::designer::DesignerApi;
use crate::models::config::NodeConfig;
use crate::models::design::{
    DesignerNode, EdgeCondition, EdgeStyle, NodeType, Position, PropertyBag, WorkflowDesign,
};
use crate::models::template::{builtin_templates, NodeTemplate};
use crate::models::validation::ValidationResult;
use crate::utils::{generate_id, sha256_hash};

/// Partial update of a node. `properties` keys are merged into the bag.
#[derive(Debug, Clone, Default)]
pub struct NodeUpdate {
    pub name: Option<String>,
    pub position: Option<Position>,
    pub properties: Option<PropertyBag>,
}

/// Partial update of an edge
#[derive(Debug, Clone, Default)]
pub struct EdgeUpdate {
    pub label: Option<String>,
    pub condition: Option<EdgeCondition>,
    pub priority: Option<i32>,
    pub style: Option<EdgeStyle>,
}

/// Designer store
pub struct DesignerStore {
    api: Arc<dyn DesignerApi>,
    design: Option<WorkflowDesign>,
    nodes: Vec<RenderNode>,
    edges: Vec<RenderEdge>,
    selected_node_id: Option<String>,
    selected_edge_id: Option<String>,
    templates: Vec<NodeTemplate>,
    using_builtin_templates: bool,
    last_validation: Option<ValidationResult>,
    saved_digest: Option<String>,
    loading: bool,
    saving: bool,
    error: Option<String>,
}

impl DesignerStore {
    pub fn new(api: Arc<dyn DesignerApi>) -> Self {
        Self {
            api,
            design: None,
            nodes: Vec::new(),
            edges: Vec::new(),
            selected_node_id: None,
            selected_edge_id: None,
            templates: Vec::new(),
            using_builtin_templates: false,
            last_validation: None,
            saved_digest: None,
            loading: false,
            saving: false,
            error: None,
        }
    }

    pub fn design(&self) -> Option<&WorkflowDesign> {
        self.design.as_ref()
    }

    pub fn nodes(&self) -> &[RenderNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[RenderEdge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&RenderNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&RenderEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn templates(&self) -> &[NodeTemplate] {
        &self.templates
    }

    /// True when the backend catalog could not be loaded
    pub fn using_builtin_templates(&self) -> bool {
        self.using_builtin_templates
    }

    pub fn selected_node_id(&self) -> Option<&str> {
        self.selected_node_id.as_deref()
    }

    pub fn selected_edge_id(&self) -> Option<&str> {
        self.selected_edge_id.as_deref()
    }

    pub fn selected_node(&self) -> Option<&RenderNode> {
        self.selected_node_id.as_deref().and_then(|id| self.node(id))
    }

    pub fn selected_edge(&self) -> Option<&RenderEdge> {
        self.selected_edge_id.as_deref().and_then(|id| self.edge(id))
    }

    pub fn last_validation(&self) -> Option<&ValidationResult> {
        self.last_validation.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn record<T>(&mut self, op: &str, result: Result<T, StudioError>) -> Result<T, StudioError> {
        match result {
            Ok(value) => {
                self.error = None;
                Ok(value)
            }
            Err(e) => {
                error!("Designer {} failed: {}", op, e);
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn active_id(&self) -> Result<String, StudioError> {
        self.design
            .as_ref()
            .map(|d| d.id.clone())
            .ok_or(StudioError::NoActiveDocument)
    }

    // ------------------------------------------------------------------
    // Backend orchestration
    // ------------------------------------------------------------------

    /// Load the node catalog. Falls back to the built-in catalog on failure.
    pub async fn load_templates(&mut self) {
        match self.api.get_templates().await {
            Ok(templates) => {
                debug!("Loaded {} node templates", templates.len());
                self.templates = templates;
                self.using_builtin_templates = false;
            }
            Err(e) => {
                warn!("Template load failed, using built-in catalog: {}", e);
                self.templates = builtin_templates();
                self.using_builtin_templates = true;
            }
        }
    }

    /// Create a new draft seeded with default start and end nodes
    pub async fn create_draft(
        &mut self,
        name: &str,
        description: Option<&str>,
    ) -> Result<String, StudioError> {
        let request = CreateDraftRequest {
            name: name.to_string(),
            description: description.map(str::to_string),
            with_default_nodes: true,
        };

        self.loading = true;
        let result = self.api.create_draft(&request).await;
        self.loading = false;

        let design = self.record("create", result)?;
        let id = design.id.clone();
        info!("Created draft {} ({})", design.name, id);
        self.install_design(design);
        Ok(id)
    }

    pub async fn load_draft(&mut self, id: &str) -> Result<(), StudioError> {
        self.loading = true;
        let result = self.api.get_draft(id).await;
        self.loading = false;

        let design = self.record("load", result)?;
        info!(
            "Loaded draft {} with {} nodes and {} edges",
            id,
            design.nodes.len(),
            design.edges.len()
        );
        self.install_design(design);
        Ok(())
    }

    /// Push the current graph and adopt the server's response
    pub async fn save_draft(&mut self) -> Result<(), StudioError> {
        let payload = self.current_document().ok_or(StudioError::NoActiveDocument)?;

        self.saving = true;
        let result = self.api.update_draft(&payload.id, &payload).await;
        self.saving = false;

        let saved = self.record("save", result)?;
        info!("Saved draft {}", saved.id);
        self.install_design(saved);
        Ok(())
    }

    /// Delete a draft on the backend. Clears the editor if it was open.
    pub async fn delete_draft(&mut self, id: &str) -> Result<(), StudioError> {
        let result = self.api.delete_draft(id).await;
        self.record("delete", result)?;

        if self.design.as_ref().is_some_and(|d| d.id == id) {
            self.reset();
        }
        Ok(())
    }

    /// Server-side validation of the active draft
    pub async fn validate(&mut self) -> Result<ValidationResult, StudioError> {
        let id = self.active_id()?;

        self.loading = true;
        let result = self.api.validate_draft(&id).await;
        self.loading = false;

        let validation = self.record("validate", result)?;
        debug!(
            "Validation of {}: {} errors, {} warnings",
            id,
            validation.errors.len(),
            validation.warnings.len()
        );
        self.last_validation = Some(validation.clone());
        Ok(validation)
    }

    /// Publish the active draft, returning the published definition id
    pub async fn publish(&mut self) -> Result<String, StudioError> {
        let id = self.active_id()?;

        self.loading = true;
        let result = self.api.publish_draft(&id).await;
        self.loading = false;

        let published = self.record("publish", result)?;
        info!("Published draft {} as {}", id, published.id);
        Ok(published.id)
    }

    /// Download the active draft in the backend's export format
    pub async fn export_draft(&mut self) -> Result<Vec<u8>, StudioError> {
        let id = self.active_id()?;
        let result = self.api.export_draft(&id).await;
        self.record("export", result)
    }

    /// Import a raw JSON document and open the resulting draft
    pub async fn import_draft(&mut self, raw: String) -> Result<String, StudioError> {
        self.loading = true;
        let result = self.api.import_draft(raw).await;
        self.loading = false;

        let design = self.record("import", result)?;
        let id = design.id.clone();
        self.install_design(design);
        Ok(id)
    }

    fn install_design(&mut self, design: WorkflowDesign) {
        let (nodes, edges) = to_render_graph(&design);
        self.nodes = nodes;
        self.edges = edges;
        self.saved_digest = Some(graph_digest(&self.nodes, &self.edges));
        self.design = Some(design);
        self.last_validation = None;

        if self.selected_node_id.as_deref().is_some_and(|id| self.node(id).is_none()) {
            self.selected_node_id = None;
        }
        if self.selected_edge_id.as_deref().is_some_and(|id| self.edge(id).is_none()) {
            self.selected_edge_id = None;
        }
    }

    /// The active document with the live graph projected back into it
    pub fn current_document(&self) -> Option<WorkflowDesign> {
        self.design
            .as_ref()
            .map(|d| apply_render_graph(d, &self.nodes, &self.edges))
    }

    /// True when the graph differs from what was last loaded or saved
    pub fn has_unsaved_changes(&self) -> bool {
        match &self.saved_digest {
            Some(saved) => *saved != graph_digest(&self.nodes, &self.edges),
            None => !self.nodes.is_empty() || !self.edges.is_empty(),
        }
    }

    /// Drop the active document and all editor state except templates
    pub fn reset(&mut self) {
        self.design = None;
        self.nodes.clear();
        self.edges.clear();
        self.selected_node_id = None;
        self.selected_edge_id = None;
        self.last_validation = None;
        self.saved_digest = None;
        self.error = None;
    }

    // ------------------------------------------------------------------
    // Local graph mutation
    // ------------------------------------------------------------------

    pub fn set_nodes(&mut self, nodes: Vec<RenderNode>) {
        self.nodes = nodes;
    }

    pub fn set_edges(&mut self, edges: Vec<RenderEdge>) {
        self.edges = edges;
    }

    /// Apply a renderer change set. Removed nodes take their edges along.
    pub fn on_nodes_change(&mut self, changes: &[NodeChange]) {
        let nodes = std::mem::take(&mut self.nodes);
        self.nodes = apply_node_changes(changes, nodes);

        for id in removed_node_ids(changes) {
            self.drop_incident_edges(id);
            if self.selected_node_id.as_deref() == Some(id) {
                self.selected_node_id = None;
            }
        }
    }

    pub fn on_edges_change(&mut self, changes: &[EdgeChange]) {
        let edges = std::mem::take(&mut self.edges);
        self.edges = apply_edge_changes(changes, edges);

        if self.selected_edge_id.as_deref().is_some_and(|id| self.edge(id).is_none()) {
            self.selected_edge_id = None;
        }
    }

    /// Turn a finished drag-to-connect gesture into an edge.
    ///
    /// No legality checks happen here; `validate` reports bad connections.
    pub fn on_connect(&mut self, connection: Connection) -> String {
        let id = generate_id("edge");
        debug!(
            "Connecting {} -> {} as {}",
            connection.source, connection.target, id
        );
        self.edges.push(RenderEdge {
            id: id.clone(),
            source: connection.source,
            target: connection.target,
            source_handle: connection.source_handle,
            target_handle: connection.target_handle,
            ..Default::default()
        });
        id
    }

    pub fn add_node(&mut self, node: RenderNode) {
        self.nodes.push(node);
    }

    /// Instantiate a node from the catalog at `position`, returning its id
    pub fn add_node_from_template(&mut self, node_type: NodeType, position: Position) -> String {
        let template = self
            .templates
            .iter()
            .find(|t| t.node_type == node_type)
            .cloned()
            .or_else(|| builtin_templates().into_iter().find(|t| t.node_type == node_type));

        let id = generate_id(node_type.as_str());
        let node = match template {
            Some(t) => DesignerNode {
                id: id.clone(),
                node_type,
                name: t.name,
                position,
                properties: t.default_properties,
                ports: t.ports,
            },
            None => DesignerNode {
                id: id.clone(),
                name: node_type.to_string(),
                node_type,
                position,
                properties: PropertyBag::new(),
                ports: None,
            },
        };

        self.nodes.push(to_render_node(&node));
        id
    }

    /// Apply a partial update. Returns false when the node doesn't exist.
    pub fn update_node(&mut self, id: &str, update: NodeUpdate) -> bool {
        let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) else {
            return false;
        };

        if let Some(properties) = update.properties {
            for (key, value) in properties {
                if key != LABEL_KEY {
                    node.data.insert(key, value);
                }
            }
        }
        if let Some(name) = update.name {
            node.data
                .insert(LABEL_KEY.to_string(), serde_json::Value::String(name));
        }
        if let Some(position) = update.position {
            node.position = position;
        }
        true
    }

    /// Typed configuration of a node
    pub fn node_config(&self, id: &str) -> Option<Result<NodeConfig, StudioError>> {
        self.node(id)
            .map(|n| NodeConfig::from_node(&from_render_node(n)))
    }

    /// Replace a node's property bag with a typed configuration
    pub fn set_node_config(&mut self, id: &str, config: NodeConfig) -> Result<(), StudioError> {
        let properties = config.into_properties()?;
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| StudioError::NotFound(format!("node {}", id)))?;

        let label = node.data.remove(LABEL_KEY);
        node.data = properties;
        if let Some(label) = label {
            node.data.insert(LABEL_KEY.to_string(), label);
        }
        Ok(())
    }

    /// Remove a node and every edge touching it
    pub fn delete_node(&mut self, id: &str) {
        self.nodes.retain(|n| n.id != id);
        self.drop_incident_edges(id);

        if self.selected_node_id.as_deref() == Some(id) {
            self.selected_node_id = None;
        }
    }

    fn drop_incident_edges(&mut self, node_id: &str) {
        let before = self.edges.len();
        self.edges
            .retain(|e| e.source != node_id && e.target != node_id);
        let removed = before - self.edges.len();
        if removed > 0 {
            debug!("Removed {} edges incident to {}", removed, node_id);
        }

        if self.selected_edge_id.as_deref().is_some_and(|id| self.edges.iter().all(|e| e.id != id)) {
            self.selected_edge_id = None;
        }
    }

    pub fn add_edge(&mut self, edge: RenderEdge) {
        self.edges.push(edge);
    }

    /// Apply a partial update. Returns false when the edge doesn't exist.
    pub fn update_edge(&mut self, id: &str, update: EdgeUpdate) -> bool {
        let Some(edge) = self.edges.iter_mut().find(|e| e.id == id) else {
            return false;
        };

        if let Some(label) = update.label {
            edge.label = Some(label);
        }
        if let Some(style) = update.style {
            edge.style = Some(style);
        }
        if update.condition.is_some() || update.priority.is_some() {
            let data = edge.data.get_or_insert_with(RenderEdgeData::default);
            if let Some(condition) = update.condition {
                data.condition = Some(condition);
            }
            if let Some(priority) = update.priority {
                data.priority = Some(priority);
            }
        }
        true
    }

    pub fn delete_edge(&mut self, id: &str) {
        self.edges.retain(|e| e.id != id);
        if self.selected_edge_id.as_deref() == Some(id) {
            self.selected_edge_id = None;
        }
    }

    /// Select a node (or clear with `None`). Always clears the edge selection.
    pub fn select_node(&mut self, id: Option<&str>) {
        self.selected_node_id = id.map(str::to_string);
        self.selected_edge_id = None;
    }

    /// Select an edge (or clear with `None`). Always clears the node selection.
    pub fn select_edge(&mut self, id: Option<&str>) {
        self.selected_edge_id = id.map(str::to_string);
        self.selected_node_id = None;
    }
}

fn graph_digest(nodes: &[RenderNode], edges: &[RenderEdge]) -> String {
    let graph = (
        nodes.iter().map(from_render_node).collect::<Vec<_>>(),
        edges.iter().map(from_render_edge).collect::<Vec<_>>(),
    );
    match serde_json::to_vec(&graph) {
        Ok(bytes) => sha256_hash(&bytes),
        Err(_) => String::new(),
    }
}
