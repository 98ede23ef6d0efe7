//! In-memory binding store
//!
//! Keeps insertion order. Used by tests and the CLI preview path.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Binding, BindingFilter, BindingStore};
use crate::error::StoreError;

#[derive(Debug, Clone, Default)]
pub struct InMemoryBindingStore {
    bindings: Arc<RwLock<Vec<Binding>>>,
}

impl InMemoryBindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing records
    pub fn with_bindings(bindings: Vec<Binding>) -> Self {
        Self {
            bindings: Arc::new(RwLock::new(bindings)),
        }
    }

    pub async fn len(&self) -> usize {
        self.bindings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.bindings.read().await.is_empty()
    }
}

#[async_trait]
impl BindingStore for InMemoryBindingStore {
    async fn save(&self, binding: &Binding) -> Result<(), StoreError> {
        let mut bindings = self.bindings.write().await;
        if bindings
            .iter()
            .any(|b| b.same_key(&binding.channel_id, &binding.message_id, &binding.option_id))
        {
            return Err(StoreError::Backend(format!(
                "duplicate binding {}/{}/{}",
                binding.channel_id, binding.message_id, binding.option_id
            )));
        }
        bindings.push(binding.clone());
        Ok(())
    }

    async fn find_all(&self, filter: &BindingFilter) -> Result<Vec<Binding>, StoreError> {
        let bindings = self.bindings.read().await;
        Ok(bindings
            .iter()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect())
    }
}
