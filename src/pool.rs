//! Worker pool.
//!
//! Each worker loops until the running flag is cleared or the queue is
//! closed and drained:
//!
//! ```text
//! WAITING ──► CHECK_QUEUE ──► DEQUEUE ──► DEDUP_CHECK ──► CONVERT
//!    ▲             │                          │              │
//!    │           empty                       seen            │
//!    └─────────────┴──────────────────────────┴──────────────┘
//! ```
//!
//! Waiting, checking and dequeuing are one bounded `pop_timeout` call,
//! so an idle worker looks at the running flag at least once per poll
//! interval. Conversions already started are never interrupted.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::cli::DEFAULT_WORKERS;
use crate::config::BatchConfig;
use crate::convert::{Conversion, Converter};
use crate::ledger::DedupLedger;
use crate::queue::{Popped, TaskQueue};
use crate::request::{self, ConversionRequest};
use crate::{debug, info, log};

/// Pool construction parameters.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub workers: usize,
    /// Directory whose ledger decides what to skip.
    pub scope_dir: PathBuf,
    pub ledger_file: String,
    pub poll_interval: Duration,
}

impl From<&BatchConfig> for PoolSettings {
    fn from(config: &BatchConfig) -> Self {
        Self {
            workers: config.pool.workers,
            scope_dir: config.ledger.scope_dir.clone(),
            ledger_file: config.ledger.file_name.clone(),
            poll_interval: config.poll_interval(),
        }
    }
}

// =============================================================================
// Statistics
// =============================================================================

#[derive(Default)]
struct PoolStats {
    queued: AtomicUsize,
    rejected: AtomicUsize,
    converted: AtomicUsize,
    cached: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
    abandoned: AtomicUsize,
}

impl PoolStats {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> Summary {
        Summary {
            queued: self.queued.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            converted: self.converted.load(Ordering::Relaxed),
            cached: self.cached.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
        }
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Lines accepted into the queue.
    pub queued: usize,
    /// Lines that failed to parse.
    pub rejected: usize,
    /// Requests rendered and written (including memory-cache reuse).
    pub converted: usize,
    /// Of `converted`, how many reused memory-cached bytes.
    pub cached: usize,
    /// Requests dropped because the ledger had already seen them.
    pub skipped: usize,
    /// Requests whose conversion failed.
    pub failed: usize,
    /// Requests still queued when the pool was stopped.
    pub abandoned: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} queued, {} converted, {} skipped, {} failed, {} rejected",
            self.queued, self.converted, self.skipped, self.failed, self.rejected
        )?;
        if self.cached > 0 {
            write!(f, " ({} from memory cache)", self.cached)?;
        }
        if self.abandoned > 0 {
            write!(f, ", {} abandoned", self.abandoned)?;
        }
        Ok(())
    }
}

// =============================================================================
// Pool
// =============================================================================

/// State shared by the pool owner and every worker.
struct Shared {
    queue: TaskQueue,
    running: AtomicBool,
    ledger: DedupLedger,
    scope_dir: PathBuf,
    converter: Arc<dyn Converter>,
    poll_interval: Duration,
    stats: PoolStats,
}

/// Fixed set of worker threads consuming the task queue.
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

/// Clears a pool's running flag from another thread (e.g. Ctrl+C).
#[derive(Clone)]
pub struct StopHandle(Arc<Shared>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.stop();
    }
}

impl WorkerPool {
    /// Start the workers immediately.
    ///
    /// A worker count of zero is corrected to [`DEFAULT_WORKERS`].
    pub fn new(settings: PoolSettings, converter: Arc<dyn Converter>) -> Result<Self> {
        let mut count = settings.workers;
        if count == 0 {
            log!("warning"; "incorrect number of threads ({}), setting to {}", count, DEFAULT_WORKERS);
            count = DEFAULT_WORKERS;
        }

        let shared = Arc::new(Shared {
            queue: TaskQueue::new(),
            running: AtomicBool::new(true),
            ledger: DedupLedger::new(settings.ledger_file),
            scope_dir: settings.scope_dir,
            converter,
            poll_interval: settings.poll_interval,
            stats: PoolStats::default(),
        });

        info!("pool"; "number of active threads: {}", count);

        let mut pool = Self {
            shared,
            workers: Vec::with_capacity(count),
        };
        for i in 0..count {
            let shared = Arc::clone(&pool.shared);
            let handle = thread::Builder::new()
                .name(format!("svgbatch-worker-{i}"))
                .spawn(move || shared.run_worker())
                .with_context(|| format!("failed to spawn worker {i}"))?;
            pool.workers.push(handle);
        }
        Ok(pool)
    }

    /// Parse a line and queue it. Returns false if it was rejected.
    pub fn enqueue_line(&self, line: &str) -> bool {
        match request::parse(line) {
            Ok(req) => {
                debug!("input"; "queueing task '{}'", line);
                self.enqueue(req)
            }
            Err(_) => {
                PoolStats::bump(&self.shared.stats.rejected);
                false
            }
        }
    }

    /// Queue a parsed request. Returns false once the pool is flushing.
    pub fn enqueue(&self, request: ConversionRequest) -> bool {
        if self.shared.queue.push(request) {
            PoolStats::bump(&self.shared.stats.queued);
            true
        } else {
            false
        }
    }

    /// Requests waiting for a worker. Snapshot only.
    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.shared.queue.len()
    }

    #[cfg(test)]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.shared))
    }

    pub fn summary(&self) -> Summary {
        self.shared.stats.snapshot()
    }

    /// No more input: let workers drain the queue, then join them all.
    ///
    /// Returns once every in-flight conversion has finished.
    pub fn flush(mut self) -> Summary {
        self.shared.queue.close();
        self.join_all();
        self.summary()
    }

    fn join_all(&mut self) {
        for handle in self.workers.drain(..) {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                log!("error"; "{} exited abnormally", name);
            }
        }
        self.shared.drain_abandoned();
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shared.stop();
        self.shared.queue.close();
        self.join_all();
    }
}

// =============================================================================
// Worker
// =============================================================================

impl Shared {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.queue.wake_all();
    }

    /// Account for requests left behind by a stopped pool.
    fn drain_abandoned(&self) {
        if self.queue.is_empty() {
            return;
        }
        while let Some(request) = self.queue.try_pop() {
            debug!("pool"; "abandoned {}", request);
            PoolStats::bump(&self.stats.abandoned);
        }
    }

    fn run_worker(&self) {
        while self.is_running() {
            match self.queue.pop_timeout(self.poll_interval) {
                Popped::Item(request) => self.process(request),
                Popped::Empty => {}
                Popped::Closed => break,
            }
        }
    }

    fn process(&self, request: ConversionRequest) {
        let identity = request.identity();
        if self.ledger.seen_or_record(&identity, &self.scope_dir) {
            debug!("pool"; "skipping {}: \"{}\" already in ledger", request.source_path.display(), identity);
            PoolStats::bump(&self.stats.skipped);
            return;
        }

        log!("convert"; "running for {}...", request.source_path.display());

        let result = catch_unwind(AssertUnwindSafe(|| self.converter.convert(&request)));
        match result {
            Ok(Ok(conversion)) => {
                PoolStats::bump(&self.stats.converted);
                let bytes = match conversion {
                    Conversion::Rendered { bytes } => bytes,
                    Conversion::Cached { bytes } => {
                        PoolStats::bump(&self.stats.cached);
                        bytes
                    }
                };
                log!("convert"; "done for {} ({} bytes)", request.source_path.display(), bytes);
            }
            Ok(Err(e)) => {
                PoolStats::bump(&self.stats.failed);
                log!(
                    "error";
                    "failed processing {}: {:#}",
                    request.source_path.display(),
                    anyhow::Error::new(e)
                );
            }
            Err(_) => {
                PoolStats::bump(&self.stats.failed);
                log!("error"; "conversion panicked for {}", request.source_path.display());
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
