//! Process-level state shared across modules.

mod state;

pub use state::{is_shutdown, register_pool, setup_shutdown_handler};
