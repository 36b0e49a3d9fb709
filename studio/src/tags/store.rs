//! Tag state: definition catalog, per-user tags and tag query results

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::errors::StudioError;
use crate::http::tags::TagApi;
use crate::models::tag::{TagDefinition, TagQueryResult, UserTag};
use crate::tags::condition::TagCondition;

/// Default page size for tag queries
pub const DEFAULT_QUERY_LIMIT: u32 = 20;

/// The query slice, kept apart from the catalog and the user caches
#[derive(Debug, Clone)]
pub struct TagQueryState {
    /// Last submitted condition, reused when paging
    pub condition: Option<TagCondition>,
    pub result: TagQueryResult,
    pub page: u32,
    pub limit: u32,
    pub loading: bool,
}

impl TagQueryState {
    /// Pages for the last result at the requested page size
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.result.total.div_ceil(self.limit as u64)
    }

    pub fn has_next_page(&self) -> bool {
        (self.page as u64) < self.total_pages()
    }
}

impl Default for TagQueryState {
    fn default() -> Self {
        Self {
            condition: None,
            result: TagQueryResult::default(),
            page: 1,
            limit: DEFAULT_QUERY_LIMIT,
            loading: false,
        }
    }
}

/// Tag store
pub struct TagStore {
    api: Arc<dyn TagApi>,
    definitions: Vec<TagDefinition>,
    user_tags: HashMap<String, Vec<UserTag>>,
    existing_values: HashMap<String, Vec<String>>,
    query: TagQueryState,
    loading: bool,
    error: Option<String>,
}

impl TagStore {
    pub fn new(api: Arc<dyn TagApi>) -> Self {
        Self {
            api,
            definitions: Vec::new(),
            user_tags: HashMap::new(),
            existing_values: HashMap::new(),
            query: TagQueryState::default(),
            loading: false,
            error: None,
        }
    }

    pub fn definitions(&self) -> &[TagDefinition] {
        &self.definitions
    }

    pub fn definition(&self, name: &str) -> Option<&TagDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// Cached tags of `user_id`, if loaded
    pub fn user_tags(&self, user_id: &str) -> Option<&[UserTag]> {
        self.user_tags.get(user_id).map(Vec::as_slice)
    }

    pub fn query(&self) -> &TagQueryState {
        &self.query
    }

    pub fn is_loading(&self) -> bool {
        self.loading
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
                error!("Tag {} failed: {}", op, e);
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Fetch the definition catalog
    pub async fn load_definitions(&mut self) -> Result<(), StudioError> {
        self.loading = true;
        let result = self.api.list_definitions().await;
        self.loading = false;

        let definitions = self.record("definition load", result)?;
        debug!("Loaded {} tag definitions", definitions.len());
        self.definitions = definitions;
        Ok(())
    }

    pub async fn create_definition(&mut self, definition: TagDefinition) -> Result<TagDefinition, StudioError> {
        self.loading = true;
        let result = self.api.create_definition(&definition).await;
        self.loading = false;

        let created = self.record("definition create", result)?;
        info!("Created tag definition {}", created.name);
        self.load_definitions().await?;
        Ok(created)
    }

    pub async fn update_definition(
        &mut self,
        id: &str,
        definition: TagDefinition,
    ) -> Result<TagDefinition, StudioError> {
        self.loading = true;
        let result = self.api.update_definition(id, &definition).await;
        self.loading = false;

        let updated = self.record("definition update", result)?;
        self.load_definitions().await?;
        Ok(updated)
    }

    pub async fn delete_definition(&mut self, id: &str) -> Result<(), StudioError> {
        self.loading = true;
        let result = self.api.delete_definition(id).await;
        self.loading = false;

        self.record("definition delete", result)?;
        info!("Deleted tag definition {}", id);
        self.load_definitions().await
    }

    /// Distinct values already assigned for `tag_name`
    pub async fn existing_values(&mut self, tag_name: &str) -> Result<Vec<String>, StudioError> {
        let result = self.api.existing_values(tag_name).await;
        let values = self.record("value lookup", result)?;
        self.existing_values
            .insert(tag_name.to_string(), values.clone());
        Ok(values)
    }

    pub fn cached_values(&self, tag_name: &str) -> Option<&[String]> {
        self.existing_values.get(tag_name).map(Vec::as_slice)
    }

    pub async fn load_user_tags(&mut self, user_id: &str) -> Result<(), StudioError> {
        self.loading = true;
        let result = self.api.get_user_tags(user_id).await;
        self.loading = false;

        let tags = self.record("user tag load", result)?;
        self.user_tags.insert(user_id.to_string(), tags);
        Ok(())
    }

    /// Assign a tag, then reload the user's tags from the backend
    pub async fn assign_tag(
        &mut self,
        user_id: &str,
        tag_name: &str,
        value: serde_json::Value,
    ) -> Result<(), StudioError> {
        let result = self.api.assign_tag(user_id, tag_name, value).await;
        self.record("assign", result)?;
        self.load_user_tags(user_id).await
    }

    /// Remove a tag, then reload the user's tags from the backend
    pub async fn remove_tag(&mut self, user_id: &str, tag_name: &str) -> Result<(), StudioError> {
        let result = self.api.remove_tag(user_id, tag_name).await;
        self.record("remove", result)?;
        self.load_user_tags(user_id).await
    }

    /// Run a tag query. The tree is checked locally before anything is sent.
    pub async fn query_by_tags(
        &mut self,
        condition: TagCondition,
        page: u32,
        limit: u32,
    ) -> Result<&TagQueryResult, StudioError> {
        condition.validate()?;
        let page = page.max(1);
        let limit = if limit == 0 { DEFAULT_QUERY_LIMIT } else { limit };

        self.query.loading = true;
        let result = self.api.query_by_tags(&condition, page, limit).await;
        self.query.loading = false;

        let result = self.record("query", result)?;
        self.query.condition = Some(condition);
        self.query.page = page;
        self.query.limit = limit;
        self.query.result = result;
        debug!(
            "Tag query matched {} users (page {}/{})",
            self.query.result.total,
            page,
            self.query.total_pages()
        );
        Ok(&self.query.result)
    }

    /// Re-run the last query on the next page. No-op without a previous query.
    pub async fn next_page(&mut self) -> Result<(), StudioError> {
        let Some(condition) = self.query.condition.clone() else {
            return Ok(());
        };
        if !self.query.has_next_page() {
            return Ok(());
        }
        let (page, limit) = (self.query.page + 1, self.query.limit);
        self.query_by_tags(condition, page, limit).await.map(|_| ())
    }

    /// Re-run the last query on the previous page
    pub async fn prev_page(&mut self) -> Result<(), StudioError> {
        let Some(condition) = self.query.condition.clone() else {
            return Ok(());
        };
        if self.query.page <= 1 {
            return Ok(());
        }
        let (page, limit) = (self.query.page - 1, self.query.limit);
        self.query_by_tags(condition, page, limit).await.map(|_| ())
    }

    pub fn clear_query(&mut self) {
        self.query = TagQueryState::default();
    }
}
