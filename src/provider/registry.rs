use std::sync::Arc;

use super::{Priority, SnapshotProvider};

/// A provider together with its rank.
pub struct Registration<P> {
    pub priority: Priority,
    pub provider: Arc<dyn SnapshotProvider<P>>,
}

impl<P> Clone for Registration<P> {
    fn clone(&self) -> Self {
        Self {
            priority: self.priority,
            provider: Arc::clone(&self.provider),
        }
    }
}

/// Ordered list of providers.
///
/// Iteration order is highest priority first; equal priorities keep their
/// registration order.
pub struct ProviderRegistry<P> {
    registrations: Vec<Registration<P>>,
}

impl<P> Default for ProviderRegistry<P> {
    fn default() -> Self {
        Self {
            registrations: Vec::new(),
        }
    }
}

impl<P> ProviderRegistry<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider with an explicit rank.
    ///
    /// Uses builder pattern, returns `self` for chaining.
    pub fn register(mut self, priority: Priority, provider: Arc<dyn SnapshotProvider<P>>) -> Self {
        self.registrations.push(Registration { priority, provider });
        // stable: ties stay in registration order
        self.registrations.sort_by(|a, b| b.priority.cmp(&a.priority));
        self
    }

    /// Register a provider at its category's default rank.
    pub fn register_default(self, provider: Arc<dyn SnapshotProvider<P>>) -> Self {
        let priority = provider.category().default_priority();
        self.register(priority, provider)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Registration<P>> {
        self.registrations.iter()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}
