//! Connected applications, keyed by session.

use crate::domain::application::{Application, ApplicationInfo};
use crate::domain::entities::ConnectionKey;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

/// Shared handle to one application's state
pub type SharedApplication = Arc<Mutex<Application>>;

/// Session registry.
///
/// Each application sits behind its own mutex so commands for different
/// applications never contend.
#[derive(Debug, Default)]
pub struct ApplicationRegistry {
    apps: DashMap<ConnectionKey, SharedApplication>,
}

impl ApplicationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an application, replacing any previous session state.
    pub fn register(&self, key: ConnectionKey, info: ApplicationInfo) -> SharedApplication {
        info!(connection_key = %key, app_id = %info.app_id, name = %info.name, "Application registered");
        let app = Arc::new(Mutex::new(Application::new(key, info)));
        if self.apps.insert(key, Arc::clone(&app)).is_some() {
            debug!(connection_key = %key, "Replaced previous application state");
        }
        app
    }

    pub fn get(&self, key: ConnectionKey) -> Option<SharedApplication> {
        self.apps.get(&key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn unregister(&self, key: ConnectionKey) -> Option<SharedApplication> {
        self.apps.remove(&key).map(|(_, app)| app)
    }

    pub fn contains(&self, key: ConnectionKey) -> bool {
        self.apps.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}
