//! In-memory adapters for the outbound ports.
//!
//! Used by tests and by embedders that drive the engine without a real
//! transport.

use crate::domain::subsystem::HmiFunction;
use crate::ipc::requests::HmiRequest;
use crate::ipc::responses::MobileResponse;
use crate::ports::outbound::{
    ApplicationSink, DispatchError, FileStorage, StorageError, SubsystemDispatch,
};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};

/// Records every HMI call instead of sending it.
#[derive(Debug, Default)]
pub struct RecordingDispatch {
    sent: Mutex<Vec<HmiRequest>>,
    /// Calls to these functions fail with `SendFailed`
    failing: RwLock<HashSet<HmiFunction>>,
}

impl RecordingDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sends of `function` fail from now on.
    pub fn fail_function(&self, function: HmiFunction) {
        self.failing.write().insert(function);
    }

    /// Everything sent so far, in order
    pub fn sent(&self) -> Vec<HmiRequest> {
        self.sent.lock().clone()
    }

    /// Drain the recorded calls
    pub fn take(&self) -> Vec<HmiRequest> {
        std::mem::take(&mut *self.sent.lock())
    }

    pub fn count(&self) -> usize {
        self.sent.lock().len()
    }
}

impl SubsystemDispatch for RecordingDispatch {
    fn send(&self, request: HmiRequest) -> Result<(), DispatchError> {
        let function = request.function();
        if self.failing.read().contains(&function) {
            return Err(DispatchError::SendFailed(format!("{function} refused")));
        }
        self.sent.lock().push(request);
        Ok(())
    }
}

/// Collects application responses.
#[derive(Debug, Default)]
pub struct RecordingSink {
    responses: Mutex<Vec<MobileResponse>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn responses(&self) -> Vec<MobileResponse> {
        self.responses.lock().clone()
    }

    pub fn take(&self) -> Vec<MobileResponse> {
        std::mem::take(&mut *self.responses.lock())
    }

    pub fn count(&self) -> usize {
        self.responses.lock().len()
    }
}

impl ApplicationSink for RecordingSink {
    fn send_response(&self, response: MobileResponse) -> Result<(), DispatchError> {
        self.responses.lock().push(response);
        Ok(())
    }
}

/// File storage keyed by (owner, path).
#[derive(Debug, Default)]
pub struct InMemoryFileStorage {
    files: RwLock<HashMap<(String, String), Vec<u8>>>,
    /// Next saves fail with this error while set
    failure: RwLock<Option<StorageError>>,
}

impl InMemoryFileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every save with `error` until `clear_failure`.
    pub fn fail_with(&self, error: StorageError) {
        *self.failure.write() = Some(error);
    }

    pub fn clear_failure(&self) {
        *self.failure.write() = None;
    }

    pub fn contents(&self, owner: &str, path: &str) -> Option<Vec<u8>> {
        self.files
            .read()
            .get(&(owner.to_string(), path.to_string()))
            .cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

impl FileStorage for InMemoryFileStorage {
    fn save(&self, owner: &str, data: &[u8], path: &str, offset: u64) -> Result<(), StorageError> {
        if let Some(error) = self.failure.read().clone() {
            return Err(error);
        }
        let start = usize::try_from(offset).map_err(|_| StorageError::OutOfSpace)?;
        let end = start
            .checked_add(data.len())
            .ok_or(StorageError::OutOfSpace)?;

        let mut files = self.files.write();
        let file = files
            .entry((owner.to_string(), path.to_string()))
            .or_default();
        if offset == 0 {
            file.clear();
        }
        if file.len() < end {
            file.resize(end, 0);
        }
        file[start..end].copy_from_slice(data);
        Ok(())
    }
}
