//! Template persistence.
//!
//! [`TemplateRepository`] is the asynchronous collaborator an editor saves to
//! and loads from. [`MemoryTemplateStore`] keeps templates in memory, can
//! simulate backend latency, and optionally mirrors every template to a JSON
//! file in a data directory. There are no transactions: concurrent updates
//! to one template resolve last-write-wins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::template::{current_timestamp_ms, Template, TemplateFilter};

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested template does not exist.
    #[error("Template not found: {0}")]
    NotFound(String),
    /// A template with this id already exists.
    #[error("Template already exists: {0}")]
    AlreadyExists(String),
    /// No data directory is configured.
    #[error("No data directory configured")]
    NoDataDir,
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Asynchronous template storage.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Templates matching `filter`, most recently updated first.
    async fn list(&self, filter: &TemplateFilter) -> Result<Vec<Template>, StoreError>;

    /// A template by id, or `None`.
    async fn get(&self, id: &str) -> Result<Option<Template>, StoreError>;

    /// Store a new template. An empty id is replaced by a fresh one.
    async fn create(&self, template: Template) -> Result<Template, StoreError>;

    /// Replace an existing template, stamping `updated_at`.
    async fn update(&self, template: Template) -> Result<Template, StoreError>;

    /// Remove a template.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Copy a template under a fresh id, named `"<name> (Copy)"`.
    async fn duplicate(&self, id: &str) -> Result<Template, StoreError>;
}

/// In-memory template storage with optional file persistence.
#[derive(Debug, Clone, Default)]
pub struct MemoryTemplateStore {
    templates: Arc<RwLock<HashMap<String, Template>>>,
    /// Optional data directory for filesystem persistence.
    data_dir: Option<PathBuf>,
    latency: Duration,
}

impl MemoryTemplateStore {
    /// Create an empty store (no persistence, no latency).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store persisted to `data_dir`, loading every template
    /// already saved there.
    ///
    /// The directory is created if it doesn't exist. Files that fail to
    /// parse are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created or read.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        let templates = load_all(&data_dir)?;
        tracing::info!(
            "Loaded {} template(s) from {}",
            templates.len(),
            data_dir.display()
        );
        Ok(Self {
            templates: Arc::new(RwLock::new(templates)),
            data_dir: Some(data_dir),
            latency: Duration::ZERO,
        })
    }

    /// Delay every operation by `latency`, like a remote backend would.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// The data directory, if persistence is enabled.
    #[must_use]
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Number of stored templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Re-read a single template from disk into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if no data directory is configured, or if the file
    /// doesn't exist or can't be parsed.
    pub fn reload_from_disk(&self, id: &str) -> Result<Template, StoreError> {
        let data_dir = self.data_dir.as_ref().ok_or(StoreError::NoDataDir)?;
        let template = read_template(&template_path(data_dir, id))?;
        self.templates
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(template.id.clone(), template.clone());
        Ok(template)
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn insert(&self, template: Template) {
        self.templates
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(template.id.clone(), template.clone());
        self.persist(&template);
    }

    fn persist(&self, template: &Template) {
        let Some(ref data_dir) = self.data_dir else {
            return;
        };
        let json = match serde_json::to_string_pretty(template) {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!("Failed to serialize template {}: {e}", template.id);
                return;
            }
        };
        let path = template_path(data_dir, &template.id);
        if let Err(e) = std::fs::write(&path, json) {
            tracing::warn!(
                "Failed to persist template {} to {}: {e}",
                template.id,
                path.display()
            );
        }
    }

    fn remove_file(&self, id: &str) {
        let Some(ref data_dir) = self.data_dir else {
            return;
        };
        let path = template_path(data_dir, id);
        if path.exists() {
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::warn!("Failed to delete template file {}: {e}", path.display());
            }
        }
    }
}

#[async_trait]
impl TemplateRepository for MemoryTemplateStore {
    async fn list(&self, filter: &TemplateFilter) -> Result<Vec<Template>, StoreError> {
        self.simulate_latency().await;
        let mut matching: Vec<Template> = self
            .templates
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.name.cmp(&b.name)));
        Ok(matching)
    }

    async fn get(&self, id: &str) -> Result<Option<Template>, StoreError> {
        self.simulate_latency().await;
        Ok(self
            .templates
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(id)
            .cloned())
    }

    async fn create(&self, mut template: Template) -> Result<Template, StoreError> {
        self.simulate_latency().await;
        if template.id.is_empty() {
            template.id = Uuid::new_v4().to_string();
        }
        let now = current_timestamp_ms();
        template.created_at = now;
        template.updated_at = now;
        {
            let mut templates = self
                .templates
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if templates.contains_key(&template.id) {
                return Err(StoreError::AlreadyExists(template.id));
            }
            templates.insert(template.id.clone(), template.clone());
        }
        tracing::info!("Created template {} ({})", template.id, template.name);
        self.persist(&template);
        Ok(template)
    }

    async fn update(&self, mut template: Template) -> Result<Template, StoreError> {
        self.simulate_latency().await;
        {
            let templates = self
                .templates
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let existing = templates
                .get(&template.id)
                .ok_or_else(|| StoreError::NotFound(template.id.clone()))?;
            template.created_at = existing.created_at;
        }
        template.touch();
        tracing::info!("Updated template {}", template.id);
        self.insert(template.clone());
        Ok(template)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.simulate_latency().await;
        let removed = self
            .templates
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(id);
        if removed.is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.remove_file(id);
        tracing::info!("Deleted template {id}");
        Ok(())
    }

    async fn duplicate(&self, id: &str) -> Result<Template, StoreError> {
        self.simulate_latency().await;
        let original = self
            .templates
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let now = current_timestamp_ms();
        let copy = Template {
            id: Uuid::new_v4().to_string(),
            name: format!("{} (Copy)", original.name),
            created_at: now,
            updated_at: now,
            ..original
        };
        tracing::info!("Duplicated template {id} as {}", copy.id);
        self.insert(copy.clone());
        Ok(copy)
    }
}

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Encode a template id as a filename.
///
/// ASCII alphanumerics, hyphen and underscore are kept; every other byte is
/// written as `%XX`. The mapping is injective, so distinct ids never share a
/// file, and no id can escape the data directory.
fn sanitize_filename(id: &str) -> String {
    let mut name = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            name.push(char::from(byte));
        } else {
            name.push('%');
            name.push(char::from(HEX_DIGITS[usize::from(byte >> 4)]));
            name.push(char::from(HEX_DIGITS[usize::from(byte & 0x0f)]));
        }
    }
    name
}

fn template_path(data_dir: &Path, id: &str) -> PathBuf {
    data_dir.join(format!("{}.json", sanitize_filename(id)))
}

fn read_template(path: &Path) -> Result<Template, StoreError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn load_all(data_dir: &Path) -> Result<HashMap<String, Template>, StoreError> {
    let mut templates = HashMap::new();
    for entry in std::fs::read_dir(data_dir)? {
        let path = entry?.path();
        if !path.extension().is_some_and(|ext| ext == "json") {
            continue;
        }
        match read_template(&path) {
            Ok(template) => {
                templates.insert(template.id.clone(), template);
            }
            Err(e) => tracing::warn!("Skipping {}: {e}", path.display()),
        }
    }
    Ok(templates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateType;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("abc-123_x"), "abc-123_x");
        assert_eq!(sanitize_filename("../etc/passwd"), "%2E%2E%2Fetc%2Fpasswd");
        assert_eq!(sanitize_filename("inv.1"), "inv%2E1");
        assert_eq!(sanitize_filename("inv_1"), "inv_1");
        assert_eq!(sanitize_filename("50%"), "50%25");
        assert_eq!(sanitize_filename("é"), "%C3%A9");
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryTemplateStore::new();
        let created = store
            .create(Template::new("Invoice", TemplateType::Pdf))
            .await
            .expect("create");
        let fetched = store.get(&created.id).await.expect("get").expect("present");
        assert_eq!(fetched, created);
        assert!(store.get("missing").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_id() {
        let store = MemoryTemplateStore::new();
        let template = Template::new("Invoice", TemplateType::Pdf);
        store.create(template.clone()).await.expect("create");
        assert!(matches!(
            store.create(template).await,
            Err(StoreError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = MemoryTemplateStore::new();
        let result = store.update(Template::new("Ghost", TemplateType::Pdf)).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_last_write_wins() {
        let store = MemoryTemplateStore::new();
        let created = store
            .create(Template::new("Draft", TemplateType::Email))
            .await
            .expect("create");
        let mut first = created.clone();
        first.name = "First".to_string();
        let mut second = created.clone();
        second.name = "Second".to_string();
        store.update(first).await.expect("update");
        store.update(second).await.expect("update");
        let stored = store.get(&created.id).await.expect("get").expect("present");
        assert_eq!(stored.name, "Second");
        assert_eq!(stored.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_duplicate_and_delete() {
        let store = MemoryTemplateStore::new();
        let created = store
            .create(Template::new("Receipt", TemplateType::Pdf))
            .await
            .expect("create");
        let copy = store.duplicate(&created.id).await.expect("duplicate");
        assert_eq!(copy.name, "Receipt (Copy)");
        assert_ne!(copy.id, created.id);
        assert_eq!(store.len(), 2);

        store.delete(&created.id).await.expect("delete");
        assert!(matches!(store.delete(&created.id).await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.duplicate("missing").await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let store = MemoryTemplateStore::new();
        store
            .create(Template::new("Invoice", TemplateType::Pdf))
            .await
            .expect("create");
        store
            .create(
                Template::new("Newsletter", TemplateType::Email).with_description("Monthly news"),
            )
            .await
            .expect("create");

        let all = store.list(&TemplateFilter::default()).await.expect("list");
        assert_eq!(all.len(), 2);

        let emails = store
            .list(&TemplateFilter {
                template_type: Some(TemplateType::Email),
                ..TemplateFilter::default()
            })
            .await
            .expect("list");
        assert_eq!(emails.len(), 1);

        let searched = store
            .list(&TemplateFilter {
                search: Some("NEWS".to_string()),
                ..TemplateFilter::default()
            })
            .await
            .expect("list");
        assert_eq!(searched[0].name, "Newsletter");
    }

    #[tokio::test]
    async fn test_latency_is_applied() {
        let store = MemoryTemplateStore::new().with_latency(Duration::from_millis(20));
        let start = std::time::Instant::now();
        store.list(&TemplateFilter::default()).await.expect("list");
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
