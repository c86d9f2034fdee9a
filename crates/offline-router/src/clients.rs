//! Client contexts controlled by a router generation.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use offline_cache::GenerationId;
use offline_core::ClientId;

/// Registry of client contexts and the generation controlling each.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: RwLock<BTreeMap<ClientId, Option<GenerationId>>>,
}

impl ClientRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<ClientId, Option<GenerationId>>> {
        self.clients.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<ClientId, Option<GenerationId>>> {
        self.clients.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a client, optionally already controlled by a generation.
    pub fn register(&self, client: ClientId, controller: Option<GenerationId>) {
        self.write().insert(client, controller);
    }

    /// Remove a client (page closed). Returns whether it was registered.
    pub fn unregister(&self, client: &ClientId) -> bool {
        self.write().remove(client).is_some()
    }

    /// The generation controlling a client, if any.
    pub fn controller_of(&self, client: &ClientId) -> Option<GenerationId> {
        self.read().get(client).cloned().flatten()
    }

    /// Make `generation` the controller of every registered client.
    /// Returns how many clients changed controller.
    pub fn claim(&self, generation: &GenerationId) -> usize {
        let mut claimed = 0;
        for controller in self.write().values_mut() {
            if controller.as_ref() != Some(generation) {
                *controller = Some(generation.clone());
                claimed += 1;
            }
        }
        claimed
    }

    /// Number of registered clients.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether no clients are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
