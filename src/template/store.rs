//! Template persistence.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::model::{ImageRefs, StoryTemplate, TemplateDraft};
use crate::error::StoryError;

/// CRUD over story templates, keyed by id.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// All templates, in no particular order.
    async fn list(&self) -> Result<Vec<StoryTemplate>, StoryError>;

    /// One template, or [`StoryError::NotFound`].
    async fn get(&self, id: Uuid) -> Result<StoryTemplate, StoryError>;

    /// Store a new template with a fresh id and creation time.
    async fn create(
        &self,
        draft: TemplateDraft,
        images: ImageRefs,
    ) -> Result<StoryTemplate, StoryError>;

    /// Replace the editable fields of an existing template.
    async fn update(
        &self,
        id: Uuid,
        draft: TemplateDraft,
        images: ImageRefs,
    ) -> Result<StoryTemplate, StoryError>;
}

/// Process-local store; contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryTemplateStore {
    templates: RwLock<HashMap<Uuid, StoryTemplate>>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    async fn list(&self) -> Result<Vec<StoryTemplate>, StoryError> {
        Ok(self.templates.read().await.values().cloned().collect())
    }

    async fn get(&self, id: Uuid) -> Result<StoryTemplate, StoryError> {
        self.templates
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoryError::NotFound(id))
    }

    async fn create(
        &self,
        draft: TemplateDraft,
        images: ImageRefs,
    ) -> Result<StoryTemplate, StoryError> {
        let template = StoryTemplate::create(draft, images);
        debug!(id = %template.id, name = %template.name, "template created");
        self.templates
            .write()
            .await
            .insert(template.id, template.clone());
        Ok(template)
    }

    async fn update(
        &self,
        id: Uuid,
        draft: TemplateDraft,
        images: ImageRefs,
    ) -> Result<StoryTemplate, StoryError> {
        let mut templates = self.templates.write().await;
        let template = templates.get_mut(&id).ok_or(StoryError::NotFound(id))?;
        template.apply(draft, images);
        debug!(%id, "template updated");
        Ok(template.clone())
    }
}
