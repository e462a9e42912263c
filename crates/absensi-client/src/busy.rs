//! Blocking busy indicator.
//!
//! A single shared flag that the UI renders as a full-view overlay; every
//! interactive control is disabled while it is active.  A safety timer
//! auto-clears the flag so an unresolved async step can never leave the
//! form permanently stuck.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::warn;

#[derive(Debug, Default)]
struct BusyState {
    active: bool,
    label: String,
    /// Bumped on every `start`; a safety timer only clears the flag if its
    /// epoch is still current, so restarting resets the timeout.
    epoch: u64,
}

/// Process-wide busy flag with a caller-supplied label.
///
/// Multiple callers share the one flag: the last `start` wins the label,
/// and each caller pairs its own `start`/`stop`.
#[derive(Debug, Clone, Default)]
pub struct BusyIndicator {
    inner: Arc<Mutex<BusyState>>,
}

impl BusyIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag and arm the safety timer.
    ///
    /// Must be called from within a tokio runtime (the timer is a spawned
    /// task).
    pub fn start(&self, label: &str, timeout: Duration) {
        let epoch = {
            let Ok(mut s) = self.inner.lock() else {
                return;
            };
            s.active = true;
            s.label = label.to_string();
            s.epoch += 1;
            s.epoch
        };

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Ok(mut s) = inner.lock() {
                if s.active && s.epoch == epoch {
                    warn!(label = %s.label, "busy indicator auto-cleared after timeout");
                    s.active = false;
                    s.label.clear();
                }
            }
        });
    }

    /// Clear the flag.
    pub fn stop(&self) {
        if let Ok(mut s) = self.inner.lock() {
            s.active = false;
            s.label.clear();
        }
    }

    pub fn is_active(&self) -> bool {
        self.inner.lock().map(|s| s.active).unwrap_or(false)
    }

    /// Current label, if the indicator is active.
    pub fn label(&self) -> Option<String> {
        self.inner
            .lock()
            .ok()
            .filter(|s| s.active)
            .map(|s| s.label.clone())
    }
}
