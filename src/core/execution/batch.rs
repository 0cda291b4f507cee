use crate::core::error::{SimError, SimResult};
use crate::core::execution::config::{BatchConfig, ConcurrencyMode};
use crate::core::execution::simulation::Simulation;
use crate::core::execution::solver::{FinishReason, TraceEntry};
use crate::core::types::SimTime;
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How far every replica runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLength {
    /// `calculate_to` with this bound
    Until(SimTime),
    /// `calculate_finish`
    Finish,
}

/// Outcome of one replica
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub replica: usize,
    pub final_time: SimTime,
    pub finish_reason: Option<FinishReason>,
    pub results: BTreeMap<String, String>,
    pub trace: Vec<TraceEntry>,
}

/// Run `replicas` independent copies of `base`.
///
/// Each copy is a [`Simulation::duplicate`]; when the base has a seed,
/// replica `i` is reseeded with `seed + i`. With [`ConcurrencyMode::Rayon`]
/// the copies run on a dedicated thread pool. Each copy is still
/// evaluated by a single thread. Summaries are returned in replica order.
pub fn run_replicas(
    base: &Simulation,
    replicas: usize,
    length: RunLength,
    config: &BatchConfig,
) -> SimResult<Vec<RunSummary>> {
    let base_seed = base.solver().state().config().seed;
    let mut runs = Vec::with_capacity(replicas);
    for replica in 0..replicas {
        let mut sim = base.duplicate()?;
        if let Some(seed) = base_seed {
            sim.reseed(seed.wrapping_add(replica as u64));
        }
        runs.push((replica, sim));
    }

    info!(
        "Running {} replicas ({:?}, pool size {:?})",
        replicas, config.concurrency_mode, config.thread_pool_size
    );

    let execute = move |(replica, mut sim): (usize, Simulation)| -> RunSummary {
        match length {
            RunLength::Until(max_time) => sim.calculate_to(max_time),
            RunLength::Finish => sim.calculate_finish(),
        }
        RunSummary {
            replica,
            final_time: sim.time(),
            finish_reason: sim.finish_reason(),
            results: sim.results().clone(),
            trace: sim.trace().to_vec(),
        }
    };

    let summaries: Vec<RunSummary> = match config.concurrency_mode {
        ConcurrencyMode::Sequential => runs.into_iter().map(execute).collect(),
        ConcurrencyMode::Rayon => {
            let mut builder = rayon::ThreadPoolBuilder::new();
            if let Some(size) = config.thread_pool_size {
                builder = builder.num_threads(size);
            }
            let pool = builder
                .build()
                .map_err(|err| SimError::Batch(format!("Failed to build thread pool: {}", err)))?;
            pool.install(|| runs.into_par_iter().map(execute).collect())
        }
    };
    Ok(summaries)
}
