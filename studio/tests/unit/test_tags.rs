//! Tag store tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use flowstudio::errors::StudioError;
use flowstudio::http::TagApi;
use flowstudio::models::tag::{TagDefinition, TagQueryResult, TaggedUser, UserTag};
use flowstudio::tags::{TagCondition, TagOperator, TagStore};

#[derive(Default)]
struct MockTags {
    definitions: Mutex<Vec<TagDefinition>>,
    user_tags: Mutex<HashMap<String, Vec<UserTag>>>,
    queries: Mutex<Vec<(serde_json::Value, u32, u32)>>,
    omit_paging: bool,
}

#[async_trait]
impl TagApi for MockTags {
    async fn list_definitions(&self) -> Result<Vec<TagDefinition>, StudioError> {
        Ok(self.definitions.lock().unwrap().clone())
    }

    async fn create_definition(&self, definition: &TagDefinition) -> Result<TagDefinition, StudioError> {
        let mut definitions = self.definitions.lock().unwrap();
        if definitions.iter().any(|d| d.name == definition.name) {
            return Err(StudioError::ApiError {
                code: 409,
                message: format!("tag {} exists", definition.name),
            });
        }
        let mut created = definition.clone();
        created.id = format!("tag-{}", definitions.len() + 1);
        definitions.push(created.clone());
        Ok(created)
    }

    async fn update_definition(&self, id: &str, definition: &TagDefinition) -> Result<TagDefinition, StudioError> {
        let mut definitions = self.definitions.lock().unwrap();
        let existing = definitions
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| StudioError::NotFound(id.to_string()))?;
        *existing = TagDefinition {
            id: id.to_string(),
            ..definition.clone()
        };
        Ok(existing.clone())
    }

    async fn delete_definition(&self, id: &str) -> Result<(), StudioError> {
        self.definitions.lock().unwrap().retain(|d| d.id != id);
        Ok(())
    }

    async fn existing_values(&self, tag_name: &str) -> Result<Vec<String>, StudioError> {
        let values = self
            .user_tags
            .lock()
            .unwrap()
            .values()
            .flatten()
            .filter(|t| t.tag_name == tag_name)
            .filter_map(|t| t.value.as_str().map(str::to_string))
            .collect();
        Ok(values)
    }

    async fn get_user_tags(&self, user_id: &str) -> Result<Vec<UserTag>, StudioError> {
        Ok(self
            .user_tags
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn assign_tag(&self, user_id: &str, tag_name: &str, value: serde_json::Value) -> Result<(), StudioError> {
        let mut user_tags = self.user_tags.lock().unwrap();
        let tags = user_tags.entry(user_id.to_string()).or_default();
        tags.retain(|t| t.tag_name != tag_name);
        tags.push(UserTag {
            tag_name: tag_name.to_string(),
            value,
            assigned_at: None,
        });
        Ok(())
    }

    async fn remove_tag(&self, user_id: &str, tag_name: &str) -> Result<(), StudioError> {
        if let Some(tags) = self.user_tags.lock().unwrap().get_mut(user_id) {
            tags.retain(|t| t.tag_name != tag_name);
        }
        Ok(())
    }

    async fn query_by_tags(
        &self,
        condition: &TagCondition,
        page: u32,
        limit: u32,
    ) -> Result<TagQueryResult, StudioError> {
        self.queries
            .lock()
            .unwrap()
            .push((serde_json::to_value(condition)?, page, limit));
        let results = (0..limit.min(3))
            .map(|i| TaggedUser {
                user_id: format!("u-{}-{}", page, i),
                username: None,
                tags: HashMap::new(),
            })
            .collect();
        if self.omit_paging {
            return Ok(serde_json::from_value(json!({"results": results, "total": 7}))?);
        }
        Ok(TagQueryResult {
            results,
            total: 7,
            page,
            limit,
        })
    }
}

fn definition(name: &str) -> TagDefinition {
    serde_json::from_value(json!({"name": name, "type": "enum", "options": ["a", "b"]})).unwrap()
}

#[tokio::test]
async fn test_definition_crud_refreshes_catalog() {
    let mut store = TagStore::new(Arc::new(MockTags::default()));

    let created = store.create_definition(definition("department")).await.unwrap();
    assert_eq!(created.id, "tag-1");
    assert_eq!(store.definitions().len(), 1);

    let duplicate = store.create_definition(definition("department")).await;
    assert!(duplicate.is_err());
    assert!(store.error().unwrap().contains("exists"));

    let mut renamed = definition("department");
    renamed.display_name = Some("Department".to_string());
    store.update_definition("tag-1", renamed).await.unwrap();
    assert_eq!(
        store.definition("department").unwrap().display_name.as_deref(),
        Some("Department")
    );
    assert!(store.error().is_none());

    store.delete_definition("tag-1").await.unwrap();
    assert!(store.definitions().is_empty());
}

#[tokio::test]
async fn test_assign_and_remove_reload_user_tags() {
    let mut store = TagStore::new(Arc::new(MockTags::default()));

    store.assign_tag("u1", "region", json!("emea")).await.unwrap();
    store.assign_tag("u1", "tier", json!("gold")).await.unwrap();
    assert_eq!(store.user_tags("u1").unwrap().len(), 2);

    let values = store.existing_values("region").await.unwrap();
    assert_eq!(values, vec!["emea".to_string()]);
    assert_eq!(store.cached_values("region"), Some(&["emea".to_string()][..]));

    store.remove_tag("u1", "tier").await.unwrap();
    let tags = store.user_tags("u1").unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].tag_name, "region");
}

#[tokio::test]
async fn test_invalid_condition_never_reaches_backend() {
    let api = Arc::new(MockTags::default());
    let mut store = TagStore::new(api.clone());

    let bad = TagCondition::compare("tier", TagOperator::In, "gold");
    let result = store.query_by_tags(bad, 1, 20).await;

    assert!(matches!(result, Err(StudioError::InvalidCondition(_))));
    assert!(api.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_query_paging() {
    let api = Arc::new(MockTags::default());
    let mut store = TagStore::new(api.clone());

    let condition = TagCondition::equals("region", "emea")
        & !TagCondition::one_of("tier", vec!["free".to_string()]);
    let result = store.query_by_tags(condition, 1, 3).await.unwrap();
    assert_eq!(result.total_pages(), 3);
    assert_eq!(result.results.len(), 3);

    store.next_page().await.unwrap();
    assert_eq!(store.query().page, 2);
    store.next_page().await.unwrap();
    assert_eq!(store.query().page, 3);

    // Last page, nothing more to fetch
    store.next_page().await.unwrap();
    assert_eq!(store.query().page, 3);

    store.prev_page().await.unwrap();
    assert_eq!(store.query().page, 2);

    let queries = api.queries.lock().unwrap().clone();
    assert_eq!(queries.len(), 4);
    assert_eq!(
        queries[0].0,
        json!({
            "logic": "AND",
            "conditions": [
                {"tag": "region", "operator": "eq", "value": "emea"},
                {"logic": "NOT", "conditions": [
                    {"tag": "tier", "operator": "in", "value": ["free"]}
                ]}
            ]
        })
    );
    assert!(queries.iter().all(|(_, _, limit)| *limit == 3));

    store.clear_query();
    assert!(store.query().condition.is_none());
    assert_eq!(store.query().page, 1);
}

#[tokio::test]
async fn test_paging_without_echoed_page_and_limit() {
    let api = Arc::new(MockTags {
        omit_paging: true,
        ..Default::default()
    });
    let mut store = TagStore::new(api.clone());

    let result = store
        .query_by_tags(TagCondition::exists("region"), 1, 3)
        .await
        .unwrap();
    assert_eq!(result.limit, 0);
    assert_eq!(store.query().total_pages(), 3);
    assert!(store.query().has_next_page());

    store.next_page().await.unwrap();
    store.next_page().await.unwrap();
    store.next_page().await.unwrap();
    assert_eq!(store.query().page, 3);

    let pages: Vec<u32> = api.queries.lock().unwrap().iter().map(|q| q.1).collect();
    assert_eq!(pages, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_zero_limit_uses_default() {
    let api = Arc::new(MockTags::default());
    let mut store = TagStore::new(api.clone());

    store
        .query_by_tags(TagCondition::exists("region"), 0, 0)
        .await
        .unwrap();
    let (_, page, limit) = api.queries.lock().unwrap()[0].clone();
    assert_eq!(page, 1);
    assert_eq!(limit, flowstudio::tags::store::DEFAULT_QUERY_LIMIT);
}
