//! Process-wide shutdown state.
//!
//! The first Ctrl+C stops the pool cooperatively: no new dequeues, but
//! conversions already running finish. A second Ctrl+C exits at once.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::log;
use crate::pool::StopHandle;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Pool to stop when shutdown is requested
static POOL: OnceLock<StopHandle> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        if SHUTDOWN.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }

        if let Some(pool) = POOL.get() {
            log!("pool"; "shutting down, waiting for running conversions (Ctrl+C again to abort)...");
            pool.stop();
        } else {
            // Nothing to wind down yet
            std::process::exit(130);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the pool for cooperative shutdown
pub fn register_pool(handle: StopHandle) {
    let _ = POOL.set(handle);
}

/// Check if shutdown has been requested
///
/// Uses Relaxed ordering for performance - worst case is reading one
/// more input line before stopping
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
