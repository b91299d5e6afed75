use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{anyhow, Result};

use super::backend::{BackendCapability, InferenceBackend, Tile};
use super::candidate::RawCandidate;

/// Shared handle to a backend. `run_inference` takes `&mut self`, hence the `Mutex`.
pub type SharedBackend = Arc<Mutex<dyn InferenceBackend>>;

/// Lock a backend, recovering it if an earlier holder panicked.
///
/// A panic during inference must not disable the backend for later requests.
pub(crate) fn lock_backend<'a>(
    backend: &'a Mutex<dyn InferenceBackend + 'static>,
) -> MutexGuard<'a, dyn InferenceBackend + 'static> {
    backend.lock().unwrap_or_else(|poisoned| {
        log::warn!("recovering backend after a panic in a previous request");
        backend.clear_poison();
        PoisonError::into_inner(poisoned)
    })
}

/// Thread-safe registry of inference backends.
pub struct BackendRegistry {
    backends: HashMap<String, SharedBackend>,
    default_name: Option<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            default_name: None,
        }
    }

    /// Register a backend. The first registered backend becomes the default.
    pub fn register<B: InferenceBackend + 'static>(&mut self, backend: B) {
        let name = backend.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        log::debug!("registered inference backend '{}'", name);
        self.backends.insert(name, Arc::new(Mutex::new(backend)));
    }

    /// Set default backend by name.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.backends.contains_key(name) {
            return Err(anyhow!("backend '{}' not registered", name));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    /// Get backend by name.
    pub fn get(&self, name: &str) -> Option<SharedBackend> {
        self.backends.get(name).cloned()
    }

    /// Get default backend.
    pub fn default_backend(&self) -> Option<SharedBackend> {
        self.default_name.as_ref().and_then(|name| self.get(name))
    }

    /// List registered backends, sorted by name.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }

    /// Select a backend that supports the requested capability.
    ///
    /// Prefers the default backend when it supports the capability.
    pub fn backend_for_capability(&self, capability: BackendCapability) -> Result<SharedBackend> {
        if let Some(default_backend) = self.default_backend() {
            let supports = lock_backend(&default_backend).supports(capability);
            if supports {
                return Ok(default_backend);
            }
        }

        for name in self.list() {
            let backend = &self.backends[&name];
            let supports = lock_backend(backend).supports(capability);
            if supports {
                return Ok(backend.clone());
            }
        }

        Err(anyhow!(
            "no registered backend supports capability {:?}",
            capability
        ))
    }

    /// Run inference using a backend that supports the requested capability.
    pub fn infer_with_capability(
        &self,
        capability: BackendCapability,
        tile: &Tile,
    ) -> Result<Vec<RawCandidate>> {
        let backend = self.backend_for_capability(capability)?;
        let mut guard = lock_backend(&backend);
        guard.run_inference(tile)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
