// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::runtime::Handle;

use crate::config::consts::DEFAULT_EVENT_BUFFER;
use crate::config::BackendRegistry;
use crate::context::isolated::{ContextHandle, IsolatedContext};
use crate::errors::ConversionError;
use crate::observability::messages::context::{ContextReused, ContextsTornDown};
use crate::observability::messages::StructuredLog;

/// Lazily creates one isolated context per backend id and reuses it.
///
/// The active context table is the only shared mutable state. Lookup and
/// creation happen under one lock, so two first requests for the same backend
/// never build two contexts. Entries are only removed by [`teardown_all`].
///
/// [`teardown_all`]: ContextFactory::teardown_all
pub struct ContextFactory {
    registry: Arc<BackendRegistry>,
    contexts: Mutex<HashMap<String, Arc<ContextHandle>>>,
    event_buffer: usize,
}

impl ContextFactory {
    pub fn new(registry: Arc<BackendRegistry>) -> Self {
        Self::with_event_buffer(registry, DEFAULT_EVENT_BUFFER)
    }

    pub fn with_event_buffer(registry: Arc<BackendRegistry>, event_buffer: usize) -> Self {
        Self {
            registry,
            contexts: Mutex::new(HashMap::new()),
            event_buffer,
        }
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Context for the backend serving `source_format -> target_format`.
    ///
    /// `Ok(None)` means no backend declares the pair. A new context is spawned
    /// on the current tokio runtime; calling this outside a runtime when a
    /// context has to be created is a [`ConversionError::Runtime`].
    pub fn context_for(
        &self,
        source_format: &str,
        target_format: &str,
    ) -> Result<Option<Arc<ContextHandle>>, ConversionError> {
        let descriptor = match self.registry.resolve_descriptor(source_format, target_format) {
            Some(descriptor) => descriptor,
            None => return Ok(None),
        };

        let mut contexts = self.lock();
        if let Some(existing) = contexts.get(&descriptor.id) {
            ContextReused {
                backend_id: &descriptor.id,
                context_id: existing.id(),
            }
            .log();
            return Ok(Some(Arc::clone(existing)));
        }

        let runtime = Handle::try_current().map_err(|e| ConversionError::Runtime(e.to_string()))?;
        let handle = Arc::new(IsolatedContext::spawn(
            descriptor.id.clone(),
            descriptor.instantiate(),
            &runtime,
            self.event_buffer,
        ));
        contexts.insert(descriptor.id.clone(), Arc::clone(&handle));
        Ok(Some(handle))
    }

    /// Terminate every active context and clear the table. In-flight
    /// conversions on those contexts fail with
    /// [`ConversionError::ContextTerminated`].
    pub fn teardown_all(&self) {
        let drained: Vec<Arc<ContextHandle>> = self.lock().drain().map(|(_, h)| h).collect();
        if drained.is_empty() {
            return;
        }

        for handle in &drained {
            handle.terminate();
        }
        ContextsTornDown {
            count: drained.len(),
        }
        .log();
    }

    /// Backend ids with an active context, sorted.
    pub fn active_backends(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn active_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<ContextHandle>>> {
        // The table holds no invariant a panicking holder could break.
        self.contexts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for ContextFactory {
    fn drop(&mut self) {
        self.teardown_all();
    }
}
