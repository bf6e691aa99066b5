// Shutdown signal handling
//
// SIGINT/SIGTERM set a flag that the poll loop checks between cycles. A cycle
// already in progress runs to completion; anything it did not delete becomes
// visible on the queue again once its visibility timeout lapses.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative stop flag shared between signal handlers and the poll loop.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    requested: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register SIGINT and SIGTERM handlers that set this flag.
    pub fn register_signal_handlers(&self) -> Result<(), String> {
        use signal_hook::consts::{SIGINT, SIGTERM};
        use signal_hook::flag;

        for signal in [SIGINT, SIGTERM] {
            flag::register(signal, Arc::clone(&self.requested))
                .map_err(|e| format!("Failed to register handler for signal {}: {}", signal, e))?;
        }

        Ok(())
    }

    /// Ask the loop to stop after the current cycle.
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}
