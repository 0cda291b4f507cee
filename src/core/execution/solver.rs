use crate::core::components::{ComponentContext, ScheduleRequest};
use crate::core::environment::Environment;
use crate::core::execution::config::SolverConfig;
use crate::core::execution::discrete::DiscreteSolver;
use crate::core::execution::fixed_step::FixedStepSolver;
use crate::core::registry::SolverKind;
use crate::core::types::{EnvironmentId, SimTime, SolverId};
use crate::core::visualization::{flush, FlushKind, Visualizer};
use log::error;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishReason {
    /// A component asked for the run to end; this is sticky
    Requested,
    /// The next unit of work lies beyond the requested bound
    TimeBound,
    /// No work is left
    Exhausted,
}

/// Lifecycle callback a trace entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventPhase {
    Initialize,
    Start,
    Discrete,
    PostEvent,
    Step,
    Finish,
}

/// One executed callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub time: SimTime,
    pub component: String,
    pub phase: EventPhase,
}

/// State shared by both solver strategies
#[derive(Debug, Clone)]
pub struct SolverState {
    pub(crate) id: SolverId,
    pub(crate) environment: EnvironmentId,
    pub(crate) config: SolverConfig,
    pub(crate) time: SimTime,
    pub(crate) finished: Option<FinishReason>,
    pub(crate) results: BTreeMap<String, String>,
    pub(crate) rng: StdRng,
    pub(crate) trace: Vec<TraceEntry>,
    pub(crate) started: bool,
    pub(crate) finish_called: bool,
}

impl SolverState {
    pub(crate) fn new(environment: EnvironmentId, config: SolverConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            id: SolverId::new(),
            environment,
            time: config.start_time,
            config,
            finished: None,
            results: BTreeMap::new(),
            rng,
            trace: Vec::new(),
            started: false,
            finish_called: false,
        }
    }

    pub fn id(&self) -> SolverId {
        self.id
    }

    pub fn environment(&self) -> EnvironmentId {
        self.environment
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn finished(&self) -> Option<FinishReason> {
        self.finished
    }

    pub fn results(&self) -> &BTreeMap<String, String> {
        &self.results
    }

    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }

    /// Forget a bound- or exhaustion-based stop before a new calculate call
    pub(crate) fn resume(&mut self) {
        if matches!(
            self.finished,
            Some(FinishReason::TimeBound) | Some(FinishReason::Exhausted)
        ) {
            self.finished = None;
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    pub(crate) fn reseed(&mut self, seed: u64) {
        self.config.seed = Some(seed);
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub(crate) fn pace(&self) {
        if !self.config.delay.is_zero() {
            std::thread::sleep(self.config.delay);
        }
    }
}

/// Run one lifecycle callback of the component at `position`.
///
/// Errors from the callback are logged with the component's name and
/// identity. Evaluations then flush the component's visualized properties
/// and clear its changed flags. Returns the scheduling requests the
/// callback made.
pub(crate) fn run_callback(
    env: &mut Environment,
    position: usize,
    phase: EventPhase,
    state: &mut SolverState,
    visualizer: &mut dyn Visualizer,
) -> Vec<ScheduleRequest> {
    let time = state.time;
    let Some(slot) = env.slot_at_mut(position) else {
        return Vec::new();
    };

    let mut ctx = ComponentContext::new(
        &slot.name,
        slot.index,
        time,
        &mut slot.properties,
        &mut state.rng,
        &mut state.results,
    );
    let outcome = match phase {
        EventPhase::Initialize => slot.behaviour.initialize(&mut ctx),
        EventPhase::Start => slot.behaviour.start(&mut ctx),
        EventPhase::Discrete => slot.behaviour.on_discrete_event(&mut ctx),
        EventPhase::PostEvent => slot.behaviour.on_post_event(&mut ctx),
        EventPhase::Step => slot.behaviour.on_step(&mut ctx),
        EventPhase::Finish => slot.behaviour.finish(&mut ctx),
    };
    let (requests, finish_requested) = ctx.into_parts();

    if let Err(err) = outcome {
        error!(
            "[{}][{}] {:?} callback of component {} failed: {}",
            time, slot.name, phase, slot.id, err
        );
    }
    if finish_requested && state.finished != Some(FinishReason::Requested) {
        state.finished = Some(FinishReason::Requested);
    }
    if state.config.record_trace {
        state.trace.push(TraceEntry {
            time,
            component: slot.name.clone(),
            phase,
        });
    }

    match phase {
        EventPhase::Initialize => flush(slot, time, FlushKind::Initialize, visualizer),
        EventPhase::Discrete | EventPhase::PostEvent | EventPhase::Step => {
            flush(slot, time, FlushKind::Evaluation, visualizer);
            slot.properties.clear_changed();
        }
        EventPhase::Start | EventPhase::Finish => {}
    }

    requests
}

/// The active execution strategy of a simulation
#[derive(Debug, Clone)]
pub enum Solver {
    Discrete(DiscreteSolver),
    FixedStep(FixedStepSolver),
}

impl Solver {
    pub fn state(&self) -> &SolverState {
        match self {
            Solver::Discrete(solver) => solver.state(),
            Solver::FixedStep(solver) => solver.state(),
        }
    }

    pub(crate) fn state_mut(&mut self) -> &mut SolverState {
        match self {
            Solver::Discrete(solver) => solver.state_mut(),
            Solver::FixedStep(solver) => solver.state_mut(),
        }
    }

    pub fn id(&self) -> SolverId {
        self.state().id
    }

    pub fn environment(&self) -> EnvironmentId {
        self.state().environment
    }

    pub fn kind(&self) -> SolverKind {
        match self {
            Solver::Discrete(_) => SolverKind::Discrete,
            Solver::FixedStep(_) => SolverKind::FixedStep,
        }
    }

    pub fn time(&self) -> SimTime {
        self.state().time
    }

    pub fn as_discrete(&self) -> Option<&DiscreteSolver> {
        match self {
            Solver::Discrete(solver) => Some(solver),
            Solver::FixedStep(_) => None,
        }
    }

    pub(crate) fn apply_requests(&mut self, env: &Environment, requests: Vec<ScheduleRequest>) {
        match self {
            Solver::Discrete(solver) => solver.apply_requests(env, requests),
            Solver::FixedStep(solver) => solver.apply_requests(requests),
        }
    }

    pub(crate) fn run(&mut self, env: &mut Environment, visualizer: &mut dyn Visualizer, bound: Option<SimTime>) {
        match self {
            Solver::Discrete(solver) => solver.run(env, visualizer, bound),
            Solver::FixedStep(solver) => solver.run(env, visualizer, bound),
        }
    }

    /// Push pending property changes through the graph and schedule the
    /// components they reach
    pub(crate) fn settle(&mut self, env: &mut Environment) {
        let obligations = env.propagate();
        if let Solver::Discrete(solver) = self {
            solver.schedule_obligations(env, obligations);
        }
    }

    pub(crate) fn rename_component(&mut self, old: &str, new: &str) {
        if let Solver::Discrete(solver) = self {
            solver.rename_component(old, new);
        }
        for entry in &mut self.state_mut().trace {
            if entry.component == old {
                entry.component = new.to_string();
            }
        }
    }

    pub(crate) fn rebind(&mut self, id: SolverId, environment: EnvironmentId) {
        let state = self.state_mut();
        state.id = id;
        state.environment = environment;
    }

    /// Queued events must reference live components
    pub(crate) fn validate(&self, env: &Environment) -> Result<(), String> {
        if let Solver::Discrete(solver) = self {
            for event in solver.pending_events() {
                if !env.contains(&event.component) {
                    return Err(format!(
                        "event {} references unknown component {}",
                        event.id, event.component
                    ));
                }
            }
        }
        Ok(())
    }
}

impl From<DiscreteSolver> for Solver {
    fn from(solver: DiscreteSolver) -> Self {
        Solver::Discrete(solver)
    }
}

impl From<FixedStepSolver> for Solver {
    fn from(solver: FixedStepSolver) -> Self {
        Solver::FixedStep(solver)
    }
}
