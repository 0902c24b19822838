//! svgbatch - batch SVG to PNG conversion with a worker pool and a
//! persistent dedup ledger.

mod cli;
mod config;
mod convert;
mod core;
mod driver;
mod ledger;
mod logger;
mod pool;
mod queue;
mod request;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use config::BatchConfig;
use convert::{Converter, SvgConverter};
use driver::InputSource;
use pool::{PoolSettings, WorkerPool};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();
    logger::set_color_choice(cli.color);
    logger::set_verbose(cli.verbose);

    let config = BatchConfig::load(&cli)?;

    if !cli.immediate && !config.ledger.scope_dir.is_dir() {
        log!(
            "warning";
            "scope directory {} does not exist, every request will be converted",
            config.ledger.scope_dir.display()
        );
    }

    let mut converter = SvgConverter::new(config.convert.reference_width);
    if config.convert.memory_cache {
        converter = converter.with_memory_cache();
    }
    let converter: Arc<dyn Converter> = Arc::new(converter);

    let input = InputSource::open(cli.input.as_deref());
    if cli.immediate {
        let converted = input.run_each(converter.as_ref());
        info!("convert"; "{} converted", converted);
        return Ok(());
    }

    let pool = WorkerPool::new(PoolSettings::from(&config), converter)?;
    core::register_pool(pool.stop_handle());

    input.feed(&pool);

    // Join every worker before exiting so no conversion is cut short
    let summary = pool.flush();
    info!("pool"; "{}", summary);

    Ok(())
}
