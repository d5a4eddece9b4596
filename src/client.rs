//! # External Collaborators
//!
//! Narrow async interfaces to the template backend and the batch data API.
//! The engine only ever talks to these traits; transport, authentication and
//! retries belong to the implementations.
//!
//! | Implementation | Use |
//! |----------------|-----|
//! | [`MemoryTemplateStore`] | Tests, CLI scratch sessions |
//! | [`HttpBackend`] | JSON over HTTP (reqwest) |
//!
//! Failures surface as [`LabelError::Fetch`]; callers leave their state
//! untouched when one occurs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::batch::{FlatRecord, flatten_records};
use crate::error::{LabelError, LabelResult};
use crate::template::Template;

/// Summary row for template listings.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub product_key: String,
    #[serde(default)]
    pub customer_key: String,
    #[serde(default)]
    pub version: Option<u32>,
}

impl From<&Template> for TemplateSummary {
    fn from(t: &Template) -> Self {
        Self {
            id: t.id.clone().unwrap_or_default(),
            name: t.name.clone(),
            product_key: t.product_key.clone(),
            customer_key: t.customer_key.clone(),
            version: t.version,
        }
    }
}

/// Template persistence.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn load_template(&self, id: &str) -> LabelResult<Template>;

    /// Persist a template, returning it with id, version and timestamp set.
    async fn save_template(&self, template: &Template) -> LabelResult<Template>;

    async fn list_templates(&self) -> LabelResult<Vec<TemplateSummary>>;
}

/// Batch data lookup.
#[async_trait]
pub trait BatchSource: Send + Sync {
    /// All rows recorded under a batch number, flattened.
    async fn fetch_batch_record(&self, batch_no: &str) -> LabelResult<Vec<FlatRecord>>;
}

// ============================================================================
// IN-MEMORY
// ============================================================================

/// Template store backed by a shared map.
#[derive(Debug, Clone, Default)]
pub struct MemoryTemplateStore {
    templates: Arc<RwLock<HashMap<String, Template>>>,
    next_id: Arc<std::sync::atomic::AtomicU64>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    async fn load_template(&self, id: &str) -> LabelResult<Template> {
        self.templates
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| LabelError::Fetch(format!("template {} not found", id)))
    }

    async fn save_template(&self, template: &Template) -> LabelResult<Template> {
        let mut saved = template.clone();
        let mut templates = self.templates.write().await;
        let id = match &saved.id {
            Some(id) => id.clone(),
            None => {
                let n = self.next_id.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
                format!("tpl-{}", n)
            }
        };
        saved.id = Some(id.clone());
        // The stored version wins over whatever the caller had.
        saved.version = templates.get(&id).and_then(|t| t.version);
        saved.touch();
        templates.insert(id.clone(), saved.clone());
        tracing::info!("saved template {} v{}", id, saved.version.unwrap_or(1));
        Ok(saved)
    }

    async fn list_templates(&self) -> LabelResult<Vec<TemplateSummary>> {
        let templates = self.templates.read().await;
        let mut list: Vec<TemplateSummary> = templates.values().map(TemplateSummary::from).collect();
        list.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(list)
    }
}

/// Batch source serving fixed records, keyed by batch number.
#[derive(Debug, Clone, Default)]
pub struct MemoryBatchSource {
    batches: HashMap<String, Vec<FlatRecord>>,
}

impl MemoryBatchSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch(mut self, batch_no: impl Into<String>, rows: Vec<FlatRecord>) -> Self {
        self.batches.insert(batch_no.into(), rows);
        self
    }
}

#[async_trait]
impl BatchSource for MemoryBatchSource {
    async fn fetch_batch_record(&self, batch_no: &str) -> LabelResult<Vec<FlatRecord>> {
        self.batches
            .get(batch_no.trim())
            .cloned()
            .ok_or_else(|| LabelError::Fetch(format!("batch {} not found", batch_no)))
    }
}

// ============================================================================
// HTTP
// ============================================================================

/// JSON-over-HTTP backend.
///
/// | Call | Request |
/// |------|---------|
/// | load | `GET {base}/templates/{id}` |
/// | save | `PUT {base}/templates/{id}` or `POST {base}/templates` (content as a string) |
/// | list | `GET {base}/templates` |
/// | batch | `GET {base}/batches/{batchNo}` |
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> LabelResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("labelsmith/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json(&self, path: &str) -> LabelResult<serde_json::Value> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LabelError::Fetch(format!("Failed to fetch {}: {}", url, e)))?;
        if !response.status().is_success() {
            return Err(LabelError::Fetch(format!(
                "Failed to fetch {}: HTTP {}",
                url,
                response.status()
            )));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl TemplateStore for HttpBackend {
    async fn load_template(&self, id: &str) -> LabelResult<Template> {
        let value = self.get_json(&format!("templates/{}", id)).await?;
        let template = Template::from_value(value);
        tracing::info!("loaded template {} ({} elements)", id, template.elements.len());
        Ok(template)
    }

    async fn save_template(&self, template: &Template) -> LabelResult<Template> {
        let request = match &template.id {
            Some(id) => self.client.put(self.url(&format!("templates/{}", id))),
            None => self.client.post(self.url("templates")),
        };
        let response = request.json(&template.to_stored_value()?).send().await?;
        if !response.status().is_success() {
            return Err(LabelError::Fetch(format!(
                "Failed to save template: HTTP {}",
                response.status()
            )));
        }
        let value: serde_json::Value = response.json().await?;
        let saved = Template::from_value(value);
        tracing::info!(
            "saved template {} v{}",
            saved.id.as_deref().unwrap_or("?"),
            saved.version.unwrap_or(0)
        );
        Ok(saved)
    }

    async fn list_templates(&self) -> LabelResult<Vec<TemplateSummary>> {
        let value = self.get_json("templates").await?;
        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait]
impl BatchSource for HttpBackend {
    async fn fetch_batch_record(&self, batch_no: &str) -> LabelResult<Vec<FlatRecord>> {
        let value = self.get_json(&format!("batches/{}", batch_no.trim())).await?;
        let rows = flatten_records(&value);
        tracing::info!("batch {}: {} rows", batch_no, rows.len());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryTemplateStore::new();
        let mut t = Template::default();
        t.name = "Chilled".into();
        t.elements.push(Element::text("x").with_id("e1"));

        let saved = store.save_template(&t).await.unwrap();
        let id = saved.id.clone().unwrap();
        assert_eq!(saved.version, Some(1));

        let loaded = store.load_template(&id).await.unwrap();
        assert_eq!(loaded, saved);

        let again = store.save_template(&loaded).await.unwrap();
        assert_eq!(again.id.as_deref(), Some(id.as_str()));
        assert_eq!(again.version, Some(2));

        let list = store.list_templates().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "Chilled");
    }

    #[tokio::test]
    async fn test_memory_store_missing() {
        let store = MemoryTemplateStore::new();
        assert!(matches!(store.load_template("nope").await, Err(LabelError::Fetch(_))));
    }

    #[tokio::test]
    async fn test_memory_batch_source() {
        let row: FlatRecord = [("batchNo".to_string(), "B1".to_string())].into_iter().collect();
        let source = MemoryBatchSource::new().with_batch("B1", vec![row]);
        assert_eq!(source.fetch_batch_record(" B1 ").await.unwrap().len(), 1);
        assert!(source.fetch_batch_record("B2").await.is_err());
    }

    #[test]
    fn test_http_url_joining() {
        let backend = HttpBackend::with_client(reqwest::Client::new(), "http://labels.local/api/");
        assert_eq!(backend.base_url(), "http://labels.local/api");
        assert_eq!(backend.url("/templates/7"), "http://labels.local/api/templates/7");
    }
}
