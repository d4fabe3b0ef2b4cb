//! Fixed-period loop driver.
//!
//! Runs registered [`Loop`]s on a dedicated thread at a configured period:
//! `on_start` once, `on_loop` every period, `on_stop` when stopped.
//! Timestamps are monotonic seconds since the driver started. Per-tick
//! timing is tracked in [`LoopStats`]; a tick that outruns the period is
//! counted as an overrun but the loop keeps running.
//!
//! With the `rt` feature the loop thread locks its pages, pins to a CPU
//! core, and requests SCHED_FIFO before the first tick; without it the
//! setup calls are no-ops and plain `thread::sleep` pacing applies.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{info, warn};

// ─── Loop Contract ──────────────────────────────────────────────────

/// A periodic routine driven by the [`Looper`].
///
/// All three callbacks run on the loop thread and must complete in a small
/// bounded time with no blocking, sleeping, or I/O.
pub trait Loop: Send + Sync {
    /// Called once when the driver starts, before the first tick.
    fn on_start(&self, timestamp: f64);
    /// Called every period.
    fn on_loop(&self, timestamp: f64);
    /// Called once when the driver stops.
    fn on_stop(&self, timestamp: f64);
}

// ─── Tick Statistics ────────────────────────────────────────────────

/// O(1) per-tick timing statistics.
///
/// Updated every tick with no allocation.
#[derive(Debug, Clone, Copy)]
pub struct LoopStats {
    /// Total ticks executed.
    pub tick_count: u64,
    /// Last tick duration [ns].
    pub last_tick_ns: u64,
    /// Minimum tick duration [ns].
    pub min_tick_ns: u64,
    /// Maximum tick duration [ns].
    pub max_tick_ns: u64,
    /// Running sum for average computation.
    pub sum_tick_ns: u64,
    /// Ticks that exceeded the period.
    pub overruns: u64,
}

impl LoopStats {
    pub const fn new() -> Self {
        Self {
            tick_count: 0,
            last_tick_ns: 0,
            min_tick_ns: u64::MAX,
            max_tick_ns: 0,
            sum_tick_ns: 0,
            overruns: 0,
        }
    }

    /// Record a tick duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: u64, period_ns: u64) {
        self.tick_count += 1;
        self.last_tick_ns = duration_ns;
        if duration_ns < self.min_tick_ns {
            self.min_tick_ns = duration_ns;
        }
        if duration_ns > self.max_tick_ns {
            self.max_tick_ns = duration_ns;
        }
        self.sum_tick_ns += duration_ns;
        if duration_ns > period_ns {
            self.overruns += 1;
        }
    }

    /// Average tick time [ns] (0 if no ticks).
    #[inline]
    pub fn avg_tick_ns(&self) -> u64 {
        if self.tick_count == 0 {
            0
        } else {
            self.sum_tick_ns / self.tick_count
        }
    }
}

impl Default for LoopStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

/// Loop driver error.
#[derive(Debug, thiserror::Error)]
pub enum LooperError {
    /// `start` called while the loop thread is running, or `register`
    /// after start.
    #[error("loop driver already running")]
    AlreadyRunning,
    /// `stop` called with no running loop thread.
    #[error("loop driver not running")]
    NotRunning,
    /// Thread spawn or join failure.
    #[error("loop thread error: {0}")]
    Thread(String),
}

// ─── RT Setup ───────────────────────────────────────────────────────

/// Lock all current and future memory pages.
#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), String> {
    use nix::sys::mman::{MlockAllFlags, mlockall};
    mlockall(MlockAllFlags::MCL_CURRENT | MlockAllFlags::MCL_FUTURE)
        .map_err(|e| format!("mlockall failed: {e}"))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), String> {
    Ok(()) // No-op in simulation mode
}

/// Pin the current thread to a specific CPU core.
#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), String> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| format!("CpuSet::set({cpu}) failed: {e}"))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| format!("sched_setaffinity failed: {e}"))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), String> {
    Ok(())
}

/// Set SCHED_FIFO with the given RT priority.
#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), String> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        ));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), String> {
    Ok(())
}

/// Full RT setup for the loop thread: page lock, CPU pin, SCHED_FIFO.
/// Failures are reported to the caller, who decides whether to continue.
fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), String> {
    rt_mlockall()?;
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    Ok(())
}

// ─── Driver ─────────────────────────────────────────────────────────

/// Fixed-period loop driver owning one background thread.
pub struct Looper {
    period: Duration,
    cpu_core: usize,
    rt_priority: i32,
    loops: Vec<Arc<dyn Loop>>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<LoopStats>>,
}

impl Looper {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            cpu_core: 1,
            rt_priority: 80,
            loops: Vec::new(),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Configure RT thread placement (`rt` builds only).
    pub fn with_rt_options(mut self, cpu_core: usize, rt_priority: i32) -> Self {
        self.cpu_core = cpu_core;
        self.rt_priority = rt_priority;
        self
    }

    /// Register a loop. Only valid before `start`.
    pub fn register(&mut self, l: Arc<dyn Loop>) -> Result<(), LooperError> {
        if self.handle.is_some() {
            return Err(LooperError::AlreadyRunning);
        }
        self.loops.push(l);
        Ok(())
    }

    /// True while the loop thread is running.
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Spawn the loop thread and begin ticking.
    pub fn start(&mut self) -> Result<(), LooperError> {
        if self.handle.is_some() {
            return Err(LooperError::AlreadyRunning);
        }

        let period = self.period;
        let cpu_core = self.cpu_core;
        let rt_priority = self.rt_priority;
        let loops = self.loops.clone();
        let running = self.running.clone();
        running.store(true, Ordering::SeqCst);

        let handle = thread::Builder::new()
            .name("superstructure-loop".into())
            .spawn(move || run_loop(period, cpu_core, rt_priority, loops, running))
            .map_err(|e| LooperError::Thread(e.to_string()))?;

        self.handle = Some(handle);
        info!(period_ms = period.as_millis() as u64, "loop driver started");
        Ok(())
    }

    /// Stop the loop thread: the final tick completes, `on_stop` runs, and
    /// the accumulated statistics are returned.
    pub fn stop(&mut self) -> Result<LoopStats, LooperError> {
        let handle = self.handle.take().ok_or(LooperError::NotRunning)?;
        self.running.store(false, Ordering::SeqCst);
        let stats = handle
            .join()
            .map_err(|_| LooperError::Thread("loop thread panicked".into()))?;
        info!(
            ticks = stats.tick_count,
            overruns = stats.overruns,
            avg_tick_ns = stats.avg_tick_ns(),
            max_tick_ns = stats.max_tick_ns,
            "loop driver stopped"
        );
        Ok(stats)
    }
}

fn run_loop(
    period: Duration,
    cpu_core: usize,
    rt_priority: i32,
    loops: Vec<Arc<dyn Loop>>,
    running: Arc<AtomicBool>,
) -> LoopStats {
    if let Err(e) = rt_setup(cpu_core, rt_priority) {
        warn!("RT setup failed, continuing without RT scheduling: {e}");
    }

    let epoch = Instant::now();
    let period_ns = period.as_nanos() as u64;
    let mut stats = LoopStats::new();

    let timestamp = epoch.elapsed().as_secs_f64();
    for l in &loops {
        l.on_start(timestamp);
    }

    let mut deadline = Instant::now() + period;
    while running.load(Ordering::SeqCst) {
        let tick_start = Instant::now();
        let timestamp = epoch.elapsed().as_secs_f64();
        for l in &loops {
            l.on_loop(timestamp);
        }
        stats.record(tick_start.elapsed().as_nanos() as u64, period_ns);

        let remaining = deadline.saturating_duration_since(Instant::now());
        if !remaining.is_zero() {
            thread::sleep(remaining);
        }
        deadline += period;
    }

    let timestamp = epoch.elapsed().as_secs_f64();
    for l in &loops {
        l.on_stop(timestamp);
    }

    stats
}

// ─── Tests ──────────────────────────────────────────────────────────
