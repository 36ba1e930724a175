//! Connectivity tracking.
//!
//! The monitor reflects environment-reported connectivity and makes no
//! network calls of its own; it never verifies reachability. Environment
//! glue (browser event bindings, a platform notifier, a test) reports
//! transitions through [`NetworkMonitor::set_online`]. Without such glue
//! the monitor is inert and reports whatever status was restored at
//! construction.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

const PERSIST_KEY_ONLINE: &str = "true";
const PERSIST_KEY_OFFLINE: &str = "false";

/// Session-scoped storage for the last-known connectivity state.
///
/// One key, storing `"true"` or `"false"`.
pub trait StatusStore: Send + Sync {
    /// Persists the serialized state.
    fn save(&self, state: &str);

    /// Restores the previously persisted state, if any.
    fn restore(&self) -> Option<String>;
}

/// A [`StatusStore`] whose state lives for the process session.
#[derive(Debug, Default)]
pub struct MemoryStatusStore {
    state: RwLock<Option<String>>,
}

impl MemoryStatusStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with a persisted state already present.
    pub fn seeded(state: &str) -> Self {
        Self {
            state: RwLock::new(Some(state.to_string())),
        }
    }
}

impl StatusStore for MemoryStatusStore {
    fn save(&self, state: &str) {
        *self.state.write() = Some(state.to_string());
    }

    fn restore(&self) -> Option<String> {
        self.state.read().clone()
    }
}

/// Listener invoked on connectivity transitions; receives the new status.
pub type StatusListener = Box<dyn Fn(bool) + Send + Sync>;

/// Handler invoked instead of the listeners when a transition to online
/// finds a queued refresh: the integrating application performs its hard
/// reload here.
pub type RefreshHandler = Box<dyn Fn() + Send + Sync>;

/// Tracks online/offline state reported by the runtime environment and
/// persists the last-known state across reloads.
pub struct NetworkMonitor {
    online: AtomicBool,
    refresh_queued: AtomicBool,
    store: Option<Box<dyn StatusStore>>,
    listeners: RwLock<Vec<StatusListener>>,
    refresh_handler: RwLock<Option<RefreshHandler>>,
}

impl NetworkMonitor {
    /// A monitor without session storage (non-browser execution): restores
    /// `online = true`.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A monitor backed by session storage; an absent key restores
    /// `online = false`.
    pub fn with_store(store: impl StatusStore + 'static) -> Self {
        Self::build(Some(Box::new(store)))
    }

    fn build(store: Option<Box<dyn StatusStore>>) -> Self {
        let online = match &store {
            Some(store) => store
                .restore()
                .map(|state| state == PERSIST_KEY_ONLINE)
                .unwrap_or(false),
            None => true,
        };
        Self {
            online: AtomicBool::new(online),
            refresh_queued: AtomicBool::new(false),
            store,
            listeners: RwLock::new(Vec::new()),
            refresh_handler: RwLock::new(None),
        }
    }

    /// Current connectivity status.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Marks that the next transition to online should trigger a full
    /// reload instead of a soft resync. One-shot: consumed on the next
    /// online transition.
    pub fn queue_refresh(&self) {
        self.refresh_queued.store(true, Ordering::SeqCst);
    }

    /// Whether a refresh is currently queued.
    pub fn refresh_queued(&self) -> bool {
        self.refresh_queued.load(Ordering::SeqCst)
    }

    /// Registers a listener invoked on every connectivity transition.
    pub fn on_status_change(&self, listener: impl Fn(bool) + Send + Sync + 'static) {
        self.listeners.write().push(Box::new(listener));
    }

    /// Installs the hard-reload collaborator.
    pub fn set_refresh_handler(&self, handler: impl Fn() + Send + Sync + 'static) {
        *self.refresh_handler.write() = Some(Box::new(handler));
    }

    /// Reports a connectivity transition from the environment.
    ///
    /// Persists the new state; on a transition to online with a queued
    /// refresh the refresh handler runs and the listeners do not.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
        if let Some(store) = &self.store {
            store.save(if online {
                PERSIST_KEY_ONLINE
            } else {
                PERSIST_KEY_OFFLINE
            });
        }
        if online && self.refresh_queued.swap(false, Ordering::SeqCst) {
            if let Some(handler) = &*self.refresh_handler.read() {
                handler();
            }
            return;
        }
        for listener in self.listeners.read().iter() {
            listener(online);
        }
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}
