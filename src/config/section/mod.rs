//! Configuration section definitions.
//!
//! Each module corresponds to a section in `svgbatch.toml`:
//!
//! | Module    | TOML Section | Purpose                              |
//! |-----------|--------------|--------------------------------------|
//! | `pool`    | `[pool]`     | Worker count and idle poll interval  |
//! | `ledger`  | `[ledger]`   | Dedup ledger location                |
//! | `convert` | `[convert]`  | Rasterization and memory cache       |

mod convert;
mod ledger;
mod pool;

pub use convert::ConvertConfig;
pub use ledger::LedgerConfig;
pub use pool::PoolConfig;
