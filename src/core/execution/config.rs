/// Configuration for solver and batch execution
///
/// `SolverConfig` controls one simulation run. `BatchConfig` controls how
/// independent replicas of a run are spread over threads.
use crate::core::types::SimTime;
use std::time::Duration;

/// Enumeration of supported concurrency modes for replica batches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencyMode {
    /// Replicas run one after another on the calling thread
    Sequential,
    /// Replicas run on a Rayon thread pool, one replica per task
    Rayon,
}

impl Default for ConcurrencyMode {
    fn default() -> Self {
        ConcurrencyMode::Sequential
    }
}

/// Configuration for a batch of independent simulation runs
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// The concurrency mode to use for execution
    pub concurrency_mode: ConcurrencyMode,
    /// The size of the thread pool for parallel execution
    /// Only relevant when concurrency_mode is Rayon
    pub thread_pool_size: Option<usize>,
}

impl BatchConfig {
    /// Sequential mode with no thread pool
    pub fn new() -> Self {
        Self {
            concurrency_mode: ConcurrencyMode::default(),
            thread_pool_size: None,
        }
    }

    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }

    /// Set the number of worker threads. Ignored in Sequential mode.
    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = Some(size);
        self
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for one solver
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Allow a component to be scheduled more than once per timestamp
    pub allow_loops: bool,
    /// Pacing delay after every event or tick
    pub delay: Duration,
    /// Simulation time at which the run starts
    pub start_time: SimTime,
    /// Fixed increment per tick for the fixed-step solver
    pub step: SimTime,
    /// Upper bound used by the fixed-step solver's `calculate_finish`
    pub end_time: Option<SimTime>,
    /// Seed for the run's random number generator
    pub seed: Option<u64>,
    /// Keep an execution trace of every callback
    pub record_trace: bool,
}

impl SolverConfig {
    pub fn new() -> Self {
        Self {
            allow_loops: false,
            delay: Duration::ZERO,
            start_time: 0,
            step: 1,
            end_time: None,
            seed: None,
            record_trace: false,
        }
    }

    pub fn with_loops(mut self, allow: bool) -> Self {
        self.allow_loops = allow;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_start_time(mut self, time: SimTime) -> Self {
        self.start_time = time;
        self
    }

    /// Set the tick increment. Non-positive values fall back to 1.
    pub fn with_step(mut self, step: SimTime) -> Self {
        self.step = if step > 0 { step } else { 1 };
        self
    }

    pub fn with_end_time(mut self, time: SimTime) -> Self {
        self.end_time = Some(time);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_trace(mut self, record: bool) -> Self {
        self.record_trace = record;
        self
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::new()
    }
}
