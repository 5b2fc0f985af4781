//! Emergency kill switch: a process-wide latch that, once tripped, blocks
//! all new trading until manually reset.

use std::sync::Mutex;

use tracing::{error, info, warn};

type Callback = Box<dyn Fn() + Send + Sync>;

struct Inner {
    active: bool,
    callbacks: Vec<Callback>,
}

/// Thread-safe, idempotent kill switch with registered teardown callbacks.
/// Activation fires every callback under the lock; a panicking callback is
/// caught so it can never block the others.
pub struct KillSwitch {
    inner: Mutex<Inner>,
}

impl Default for KillSwitch {
    fn default() -> Self {
        Self::new()
    }
}

impl KillSwitch {
    pub fn new() -> Self {
        info!("kill switch initialized (inactive)");
        Self { inner: Mutex::new(Inner { active: false, callbacks: Vec::new() }) }
    }

    /// Activate the switch and run all registered callbacks. A no-op if
    /// already active.
    pub fn activate(&self, reason: &str) {
        let mut inner = self.inner.lock().unwrap();
        if inner.active {
            warn!("kill switch already active");
            return;
        }
        inner.active = true;
        tracing::error!(reason, "KILL SWITCH ACTIVATED");

        for callback in &inner.callbacks {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback()));
            if result.is_err() {
                error!("kill switch callback panicked");
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.inner.lock().unwrap().active
    }

    /// Register a callback to run (under the lock) when the switch trips.
    pub fn register_callback(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.inner.lock().unwrap().callbacks.push(Box::new(callback));
    }

    /// Reset the switch. Intended for manual recovery only.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.active {
            warn!("kill switch already inactive");
            return;
        }
        inner.active = false;
        warn!("kill switch reset - trading may resume");
    }
}
