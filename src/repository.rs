//! Recipe persistence.

use std::collections::HashMap;

use async_trait::async_trait;
use log::debug;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::PersistError;
use crate::model::Recipe;

/// Storage boundary of the import pipeline.
///
/// `save` must be atomic per recipe: it either stores the recipe and returns
/// its new identifier, or stores nothing.
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    async fn save(&self, recipe: &Recipe) -> Result<String, PersistError>;

    async fn get(&self, id: &str) -> Result<Option<Recipe>, PersistError>;

    /// Most recently saved recipe whose source URL matches `url`
    async fn find_by_source_url(&self, url: &str) -> Result<Option<(String, Recipe)>, PersistError>;
}

/// Process-local repository, used by the CLI and in tests
#[derive(Default)]
pub struct InMemoryRepository {
    recipes: RwLock<HashMap<String, Recipe>>,
    // ids in save order, so lookups by URL prefer the latest copy
    order: RwLock<Vec<String>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.recipes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.recipes.read().await.is_empty()
    }
}

#[async_trait]
impl RecipeRepository for InMemoryRepository {
    async fn save(&self, recipe: &Recipe) -> Result<String, PersistError> {
        let id = Uuid::new_v4().to_string();

        let mut recipes = self.recipes.write().await;
        let mut order = self.order.write().await;
        recipes.insert(id.clone(), recipe.clone());
        order.push(id.clone());

        debug!("Stored recipe '{}' as {}", recipe.title, id);
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<Recipe>, PersistError> {
        Ok(self.recipes.read().await.get(id).cloned())
    }

    async fn find_by_source_url(&self, url: &str) -> Result<Option<(String, Recipe)>, PersistError> {
        let recipes = self.recipes.read().await;
        let order = self.order.read().await;

        Ok(order.iter().rev().find_map(|id| {
            recipes
                .get(id)
                .filter(|recipe| recipe.source.url.as_deref() == Some(url))
                .map(|recipe| (id.clone(), recipe.clone()))
        }))
    }
}
