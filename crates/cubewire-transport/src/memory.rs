//! In-process simulated cube.
//!
//! `MemoryTransport` records every write, serves canned read values, and lets
//! the caller push notifications as if the device had sent them. Write
//! responders turn it into a scripted device (e.g. answering a version query).

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::characteristic::CharacteristicId;
use crate::error::{Result, TransportError};
use crate::traits::{NotifyHandler, Transport};

/// Hook called after a write; a returned packet is delivered as a notification
/// on the same characteristic.
pub type WriteResponder = Arc<dyn Fn(&[u8]) -> Option<Vec<u8>> + Send + Sync>;

/// Simulated transport backed by in-memory state.
pub struct MemoryTransport {
    device_id: String,
    characteristics: Vec<CharacteristicId>,
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    connected: bool,
    fail_writes: bool,
    writes: HashMap<CharacteristicId, Vec<Bytes>>,
    reads: HashMap<CharacteristicId, Bytes>,
    handlers: HashMap<CharacteristicId, NotifyHandler>,
    responders: HashMap<CharacteristicId, WriteResponder>,
}

impl MemoryTransport {
    /// Simulated cube exposing every characteristic.
    pub fn new(device_id: impl Into<String>) -> Self {
        Self::with_characteristics(device_id, &CharacteristicId::ALL)
    }

    /// Simulated cube exposing only the given characteristics.
    pub fn with_characteristics(
        device_id: impl Into<String>,
        characteristics: &[CharacteristicId],
    ) -> Self {
        Self {
            device_id: device_id.into(),
            characteristics: characteristics.to_vec(),
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Value returned by subsequent reads of `id`.
    pub fn set_read_value(&self, id: CharacteristicId, value: impl Into<Bytes>) {
        self.state.lock().reads.insert(id, value.into());
    }

    /// Make subsequent reads of `id` yield no bytes.
    pub fn clear_read_value(&self, id: CharacteristicId) {
        self.state.lock().reads.remove(&id);
    }

    /// Install a write responder for `id`.
    pub fn set_write_responder<F>(&self, id: CharacteristicId, responder: F)
    where
        F: Fn(&[u8]) -> Option<Vec<u8>> + Send + Sync + 'static,
    {
        self.state.lock().responders.insert(id, Arc::new(responder));
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Every packet written to `id`, oldest first.
    pub fn writes(&self, id: CharacteristicId) -> Vec<Bytes> {
        self.state
            .lock()
            .writes
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    /// The most recent packet written to `id`.
    pub fn last_write(&self, id: CharacteristicId) -> Option<Bytes> {
        self.state
            .lock()
            .writes
            .get(&id)
            .and_then(|writes| writes.last().cloned())
    }

    /// Forget recorded writes on every characteristic.
    pub fn clear_writes(&self) {
        self.state.lock().writes.clear();
    }

    /// Whether a notification handler is installed for `id`.
    pub fn is_subscribed(&self, id: CharacteristicId) -> bool {
        self.state.lock().handlers.contains_key(&id)
    }

    /// Deliver `bytes` to the subscriber of `id`, as the device would.
    ///
    /// Returns false when nobody is subscribed.
    pub fn notify(&self, id: CharacteristicId, bytes: &[u8]) -> bool {
        let handler = self.state.lock().handlers.get(&id).cloned();
        match handler {
            Some(handler) => {
                trace!(characteristic = %id, len = bytes.len(), "memory notify");
                handler(bytes);
                true
            }
            None => false,
        }
    }

    fn ensure_available(&self, id: CharacteristicId) -> Result<()> {
        if !self.characteristics.contains(&id) {
            return Err(TransportError::UnknownCharacteristic(id));
        }
        Ok(())
    }
}

impl Transport for MemoryTransport {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn connect(&self) -> Result<()> {
        self.state.lock().connected = true;
        debug!(device = %self.device_id, "memory transport connected");
        Ok(())
    }

    fn disconnect(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.connected = false;
        state.handlers.clear();
        debug!(device = %self.device_id, "memory transport disconnected");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    fn characteristics(&self) -> Result<Vec<CharacteristicId>> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        Ok(self.characteristics.clone())
    }

    fn write(&self, id: CharacteristicId, bytes: &[u8]) -> Result<()> {
        self.ensure_available(id)?;
        let responder = {
            let mut state = self.state.lock();
            if !state.connected {
                return Err(TransportError::NotConnected);
            }
            if state.fail_writes {
                return Err(TransportError::WriteFailed {
                    id,
                    reason: "injected failure".to_string(),
                });
            }
            state
                .writes
                .entry(id)
                .or_default()
                .push(Bytes::copy_from_slice(bytes));
            state.responders.get(&id).cloned()
        };

        // The responder runs without the state lock held so that it may
        // notify (and re-enter) freely.
        if let Some(reply) = responder.and_then(|respond| respond(bytes)) {
            self.notify(id, &reply);
        }
        Ok(())
    }

    fn read(&self, id: CharacteristicId) -> Result<Option<Bytes>> {
        self.ensure_available(id)?;
        let state = self.state.lock();
        if !state.connected {
            return Err(TransportError::NotConnected);
        }
        Ok(state.reads.get(&id).cloned())
    }

    fn subscribe(&self, id: CharacteristicId, handler: NotifyHandler) -> Result<()> {
        self.ensure_available(id)?;
        self.state.lock().handlers.insert(id, handler);
        Ok(())
    }

    fn unsubscribe(&self, id: CharacteristicId) -> Result<()> {
        self.state.lock().handlers.remove(&id);
        Ok(())
    }
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("device_id", &self.device_id)
            .field("characteristics", &self.characteristics)
            .finish()
    }
}
