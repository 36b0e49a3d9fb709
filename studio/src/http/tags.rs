//! Tag API client

use async_trait::async_trait;
use openapi_client::models::{AssignTagRequest, TagQueryRequest};

use crate::errors::StudioError;
use crate::http::client::{api_path, HttpClient};
use crate::models::tag::{TagDefinition, TagQueryResult, UserTag};
use crate::tags::condition::TagCondition;

/// Backend operations used by the tag store
#[async_trait]
pub trait TagApi: Send + Sync {
    async fn list_definitions(&self) -> Result<Vec<TagDefinition>, StudioError>;

    async fn create_definition(&self, definition: &TagDefinition) -> Result<TagDefinition, StudioError>;

    async fn update_definition(&self, id: &str, definition: &TagDefinition) -> Result<TagDefinition, StudioError>;

    async fn delete_definition(&self, id: &str) -> Result<(), StudioError>;

    async fn existing_values(&self, tag_name: &str) -> Result<Vec<String>, StudioError>;

    async fn get_user_tags(&self, user_id: &str) -> Result<Vec<UserTag>, StudioError>;

    async fn assign_tag(&self, user_id: &str, tag_name: &str, value: serde_json::Value) -> Result<(), StudioError>;

    async fn remove_tag(&self, user_id: &str, tag_name: &str) -> Result<(), StudioError>;

    async fn query_by_tags(
        &self,
        condition: &TagCondition,
        page: u32,
        limit: u32,
    ) -> Result<TagQueryResult, StudioError>;
}

#[async_trait]
impl TagApi for HttpClient {
    async fn list_definitions(&self) -> Result<Vec<TagDefinition>, StudioError> {
        self.get("/tags/definitions").await
    }

    async fn create_definition(&self, definition: &TagDefinition) -> Result<TagDefinition, StudioError> {
        self.post("/tags/definitions", definition).await
    }

    async fn update_definition(&self, id: &str, definition: &TagDefinition) -> Result<TagDefinition, StudioError> {
        let path = api_path(&["tags", "definitions", id])?;
        self.put(&path, definition).await
    }

    async fn delete_definition(&self, id: &str) -> Result<(), StudioError> {
        let path = api_path(&["tags", "definitions", id])?;
        self.delete(&path).await
    }

    async fn existing_values(&self, tag_name: &str) -> Result<Vec<String>, StudioError> {
        let path = api_path(&["tags", "definitions", tag_name, "values"])?;
        self.get(&path).await
    }

    async fn get_user_tags(&self, user_id: &str) -> Result<Vec<UserTag>, StudioError> {
        let path = api_path(&["users", user_id, "tags"])?;
        self.get(&path).await
    }

    async fn assign_tag(&self, user_id: &str, tag_name: &str, value: serde_json::Value) -> Result<(), StudioError> {
        let path = api_path(&["users", user_id, "tags"])?;
        let request = AssignTagRequest {
            tag_name: tag_name.to_string(),
            value,
        };
        let _: serde_json::Value = self.post(&path, &request).await.or_else(|e| match e {
            StudioError::EmptyResponse(_) => Ok(serde_json::Value::Null),
            other => Err(other),
        })?;
        Ok(())
    }

    async fn remove_tag(&self, user_id: &str, tag_name: &str) -> Result<(), StudioError> {
        let path = api_path(&["users", user_id, "tags", tag_name])?;
        self.delete(&path).await
    }

    async fn query_by_tags(
        &self,
        condition: &TagCondition,
        page: u32,
        limit: u32,
    ) -> Result<TagQueryResult, StudioError> {
        let request = TagQueryRequest {
            condition: serde_json::to_value(condition)?,
            page,
            limit,
        };
        self.post("/tags/query", &request).await
    }
}
