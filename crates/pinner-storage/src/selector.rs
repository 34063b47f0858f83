//! Provider selection strategy
//!
//! Picks the first healthy provider from a priority-ordered list. The name of the
//! last returned provider is remembered only to log provider changes once.

use std::sync::{Arc, Mutex, PoisonError};

use crate::traits::{PersistenceProvider, ProviderError, ProviderResult};

pub struct ProviderSelector {
    /// Highest priority first.
    providers: Vec<Arc<dyn PersistenceProvider>>,
    last_selected: Mutex<Option<String>>,
}

impl ProviderSelector {
    pub fn new(providers: Vec<Arc<dyn PersistenceProvider>>) -> Self {
        Self {
            providers,
            last_selected: Mutex::new(None),
        }
    }

    /// Return the first provider, in priority order, whose health check passes.
    pub async fn select(&self) -> ProviderResult<Arc<dyn PersistenceProvider>> {
        for provider in &self.providers {
            if provider.is_healthy().await {
                self.note_selected(provider.name());
                return Ok(Arc::clone(provider));
            }
            tracing::debug!(provider = %provider.name(), "Provider unhealthy, trying next");
        }

        self.last_selected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        tracing::error!(
            provider_count = self.providers.len(),
            "No healthy persistence provider available"
        );
        Err(ProviderError::NoProviderAvailable)
    }

    /// Name of the provider most recently returned by [`Self::select`], if any.
    pub fn last_selected(&self) -> Option<String> {
        self.last_selected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn note_selected(&self, name: &str) {
        let mut last = self
            .last_selected
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if last.as_deref() != Some(name) {
            tracing::info!(
                provider = %name,
                previous = ?last.as_deref(),
                "Persistence provider selected"
            );
            *last = Some(name.to_string());
        }
    }
}
