use crate::core::components::ScheduleRequest;
use crate::core::environment::Environment;
use crate::core::execution::config::SolverConfig;
use crate::core::execution::solver::{run_callback, EventPhase, FinishReason, SolverState};
use crate::core::types::SimTime;
use crate::core::visualization::Visualizer;
use log::{debug, trace};

/// Fixed-step solver.
///
/// Every tick evaluates all components in creation-index order, pushing
/// each component's changes to its connected inputs before the next one
/// runs, then advances time by the configured step. There is no queue and
/// no after-time phase; feedback connections still copy their values.
#[derive(Debug, Clone)]
pub struct FixedStepSolver {
    state: SolverState,
}

impl FixedStepSolver {
    /// Create a solver bound to `env`
    pub fn new(env: &Environment, config: SolverConfig) -> Self {
        Self {
            state: SolverState::new(env.id(), config),
        }
    }

    pub fn state(&self) -> &SolverState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut SolverState {
        &mut self.state
    }

    pub fn step(&self) -> SimTime {
        self.state.config.step.max(1)
    }

    pub(crate) fn apply_requests(&mut self, requests: Vec<ScheduleRequest>) {
        if !requests.is_empty() {
            trace!(
                "Fixed-step solver ignores {} scheduling requests at {}",
                requests.len(),
                self.state.time
            );
        }
    }

    /// Run ticks while the time is within `bound`, or within the configured
    /// end time when there is no bound. Without either, ticks continue until
    /// a component finishes the simulation.
    pub(crate) fn run(&mut self, env: &mut Environment, visualizer: &mut dyn Visualizer, bound: Option<SimTime>) {
        self.state.resume();
        let limit = bound.or(self.state.config.end_time);

        loop {
            if self.state.is_finished() {
                break;
            }
            if let Some(limit) = limit {
                if self.state.time > limit {
                    self.state.finished = Some(FinishReason::TimeBound);
                    break;
                }
            }
            if env.is_empty() {
                debug!("No components to step at time {}", self.state.time);
                self.state.finished = Some(FinishReason::Exhausted);
                break;
            }

            self.tick(env, visualizer);
            self.state.time += self.step();
            self.state.pace();
        }
    }

    fn tick(&mut self, env: &mut Environment, visualizer: &mut dyn Visualizer) {
        trace!("Tick at {}", self.state.time);
        for position in 0..env.len() {
            let requests = run_callback(env, position, EventPhase::Step, &mut self.state, visualizer);
            self.apply_requests(requests);
            // reached components run on the following positions or the next tick
            env.propagate();
        }
    }
}
