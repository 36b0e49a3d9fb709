//! Designer API client

use async_trait::async_trait;
use openapi_client::models::{CreateDraftRequest, PublishResponse};

use crate::errors::StudioError;
use crate::http::client::{api_path, HttpClient};
use crate::models::design::WorkflowDesign;
use crate::models::template::NodeTemplate;
use crate::models::validation::ValidationResult;

/// Backend operations used by the designer store
#[async_trait]
pub trait DesignerApi: Send + Sync {
    async fn get_templates(&self) -> Result<Vec<NodeTemplate>, StudioError>;

    async fn create_draft(&self, request: &CreateDraftRequest) -> Result<WorkflowDesign, StudioError>;

    async fn get_draft(&self, id: &str) -> Result<WorkflowDesign, StudioError>;

    async fn update_draft(&self, id: &str, design: &WorkflowDesign) -> Result<WorkflowDesign, StudioError>;

    async fn delete_draft(&self, id: &str) -> Result<(), StudioError>;

    async fn validate_draft(&self, id: &str) -> Result<ValidationResult, StudioError>;

    async fn publish_draft(&self, id: &str) -> Result<PublishResponse, StudioError>;

    async fn export_draft(&self, id: &str) -> Result<Vec<u8>, StudioError>;

    async fn import_draft(&self, raw: String) -> Result<WorkflowDesign, StudioError>;
}

#[async_trait]
impl DesignerApi for HttpClient {
    async fn get_templates(&self) -> Result<Vec<NodeTemplate>, StudioError> {
        self.get("/designer/templates").await
    }

    async fn create_draft(&self, request: &CreateDraftRequest) -> Result<WorkflowDesign, StudioError> {
        self.post("/designer/drafts", request).await
    }

    async fn get_draft(&self, id: &str) -> Result<WorkflowDesign, StudioError> {
        let path = api_path(&["designer", "drafts", id])?;
        self.get(&path).await
    }

    async fn update_draft(&self, id: &str, design: &WorkflowDesign) -> Result<WorkflowDesign, StudioError> {
        let path = api_path(&["designer", "drafts", id])?;
        self.put(&path, design).await
    }

    async fn delete_draft(&self, id: &str) -> Result<(), StudioError> {
        let path = api_path(&["designer", "drafts", id])?;
        self.delete(&path).await
    }

    async fn validate_draft(&self, id: &str) -> Result<ValidationResult, StudioError> {
        let path = api_path(&["designer", "drafts", id, "validate"])?;
        self.post_command(&path)
            .await?
            .ok_or_else(|| StudioError::EmptyResponse(path.clone()))
    }

    async fn publish_draft(&self, id: &str) -> Result<PublishResponse, StudioError> {
        let path = api_path(&["designer", "drafts", id, "publish"])?;
        self.post_command(&path)
            .await?
            .ok_or_else(|| StudioError::EmptyResponse(path.clone()))
    }

    async fn export_draft(&self, id: &str) -> Result<Vec<u8>, StudioError> {
        let path = api_path(&["designer", "drafts", id, "export"])?;
        self.get_bytes(&path).await
    }

    async fn import_draft(&self, raw: String) -> Result<WorkflowDesign, StudioError> {
        self.post_raw("/designer/import", raw).await
    }
}
