//! Registry of resilient clients, one per upstream dependency.
//!
//! Built once at startup and passed by reference to whatever needs to call
//! out. Asking for the same dependency name twice yields the same client,
//! and therefore the same breaker.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::breaker::{BreakerConfig, BreakerSnapshot};
use super::client::{ResilientClient, RetryConfig};

/// Resilient clients keyed by dependency name.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    retry: RetryConfig,
    breaker: BreakerConfig,
    clients: Mutex<HashMap<String, Arc<ResilientClient>>>,
}

impl ClientRegistry {
    /// Create a registry whose clients use the given default tuning.
    pub fn new(retry: RetryConfig, breaker: BreakerConfig) -> Self {
        Self {
            retry,
            breaker,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Return the client for `dependency`, creating it with the defaults on first use.
    pub fn get_or_insert(&self, dependency: &str) -> Arc<ResilientClient> {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(clients.entry(dependency.to_string()).or_insert_with(|| {
            Arc::new(ResilientClient::new(
                dependency,
                self.retry.clone(),
                self.breaker.clone(),
            ))
        }))
    }

    /// Register a pre-built client, replacing any existing one of the same name.
    pub fn insert(&self, client: ResilientClient) -> Arc<ResilientClient> {
        let client = Arc::new(client);
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(client.name().to_string(), Arc::clone(&client));
        client
    }

    pub fn get(&self, dependency: &str) -> Option<Arc<ResilientClient>> {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(dependency)
            .cloned()
    }

    /// Breaker snapshots of every registered client, sorted by name.
    pub fn snapshots(&self) -> Vec<(String, BreakerSnapshot)> {
        let clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<_> = clients
            .iter()
            .map(|(name, client)| (name.clone(), client.breaker().snapshot()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Force every breaker closed.
    pub fn reset_all(&self) {
        let clients: Vec<_> = self
            .clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for client in clients {
            client.breaker().reset();
        }
    }
}
