use crate::core::components::{Component, ComponentSlot};
use crate::core::environment::Environment;
use crate::core::error::{SimError, SimResult};
use crate::core::execution::config::SolverConfig;
use crate::core::execution::discrete::DiscreteSolver;
use crate::core::execution::fixed_step::FixedStepSolver;
use crate::core::execution::solver::{run_callback, EventPhase, FinishReason, Solver, TraceEntry};
use crate::core::registry::{registry, EnvironmentRecord, SolverRecord};
use crate::core::types::{ComponentHandle, ConnectionId, EnvironmentId, PropertyRef, SimTime, SolverId};
use crate::core::values::{CellValue, PropertyTag};
use crate::core::visualization::{LogVisualizer, Visualizer};
use log::{debug, info};
use std::collections::BTreeMap;

/// Deep copy of one environment and its solver
#[derive(Debug, Clone)]
pub struct Snapshot {
    environment: Environment,
    solver: Solver,
}

impl Snapshot {
    pub fn environment_id(&self) -> EnvironmentId {
        self.environment.id()
    }

    pub fn solver_id(&self) -> SolverId {
        self.solver.id()
    }

    pub fn time(&self) -> SimTime {
        self.solver.time()
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }
}

/// One simulation run: an environment driven by a solver.
///
/// The environment and solver identities are registered in the process-wide
/// registry while the simulation is alive.
pub struct Simulation {
    environment: Environment,
    solver: Solver,
    visualizer: Box<dyn Visualizer>,
}

impl Simulation {
    /// Pair an environment with a solver created for it
    pub fn new(environment: Environment, solver: impl Into<Solver>) -> SimResult<Self> {
        let solver = solver.into();
        if solver.environment() != environment.id() {
            return Err(SimError::SolverMismatch(format!(
                "solver {} is bound to environment {}, not {}",
                solver.id(),
                solver.environment(),
                environment.id()
            )));
        }
        let mut environment = environment;
        environment.bind_solver(solver.id());
        Self::register(environment, solver, Box::new(LogVisualizer))
    }

    /// Empty simulation driven by a discrete solver
    pub fn discrete(config: SolverConfig) -> SimResult<Self> {
        let environment = Environment::new();
        let solver = DiscreteSolver::new(&environment, config);
        Self::new(environment, solver)
    }

    /// Empty simulation driven by a fixed-step solver
    pub fn fixed_step(config: SolverConfig) -> SimResult<Self> {
        let environment = Environment::new();
        let solver = FixedStepSolver::new(&environment, config);
        Self::new(environment, solver)
    }

    fn register(environment: Environment, solver: Solver, visualizer: Box<dyn Visualizer>) -> SimResult<Self> {
        let reg = registry();
        if !reg.register_environment(environment.id(), EnvironmentRecord { solver: solver.id() }) {
            return Err(SimError::SolverMismatch(format!(
                "environment {} already belongs to a live simulation",
                environment.id()
            )));
        }
        let record = SolverRecord {
            kind: solver.kind(),
            environment: environment.id(),
        };
        if !reg.register_solver(solver.id(), record) {
            reg.deregister_environment(environment.id());
            return Err(SimError::SolverMismatch(format!(
                "solver {} already belongs to a live simulation",
                solver.id()
            )));
        }
        debug!("Registered environment {} with solver {}", environment.id(), solver.id());
        Ok(Self {
            environment,
            solver,
            visualizer,
        })
    }

    /// Replace the visualization sink
    pub fn with_visualizer(mut self, visualizer: impl Visualizer + 'static) -> Self {
        self.visualizer = Box::new(visualizer);
        self
    }

    pub fn set_visualizer(&mut self, visualizer: impl Visualizer + 'static) {
        self.visualizer = Box::new(visualizer);
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn solver(&self) -> &Solver {
        &self.solver
    }

    pub fn time(&self) -> SimTime {
        self.solver.time()
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.solver.state().finished()
    }

    pub fn is_finished(&self) -> bool {
        self.finish_reason().is_some()
    }

    /// Stop the run before its next event or tick
    pub fn finish_simulation(&mut self) {
        self.solver.state_mut().finished = Some(FinishReason::Requested);
    }

    pub fn results(&self) -> &BTreeMap<String, String> {
        self.solver.state().results()
    }

    pub fn result(&self, key: &str) -> Option<&str> {
        self.results().get(key).map(|value| value.as_str())
    }

    /// Executed callbacks, recorded when tracing is enabled
    pub fn trace(&self) -> &[TraceEntry] {
        self.solver.state().trace()
    }

    pub fn component(&self, name: &str) -> Option<&ComponentSlot> {
        self.environment.component(name)
    }

    /// Register a component under its default name
    pub fn add_component<C: Component + 'static>(&mut self, component: C) -> SimResult<ComponentHandle> {
        self.environment
            .add_component(Box::new(component), None, self.solver.id())
    }

    pub fn add_named_component<C: Component + 'static>(
        &mut self,
        name: &str,
        component: C,
    ) -> SimResult<ComponentHandle> {
        self.environment
            .add_component(Box::new(component), Some(name), self.solver.id())
    }

    pub fn set_display_name(&mut self, component: &str, display_name: &str) -> SimResult<()> {
        self.environment.set_display_name(component, display_name)
    }

    /// Override a creation index. Queued events carry the index they were
    /// scheduled with, so this is refused after start or while events wait.
    pub fn set_index(&mut self, component: &str, index: usize) -> SimResult<()> {
        let queued = self.solver.as_discrete().map_or(false, DiscreteSolver::has_pending);
        if self.solver.state().started || queued {
            return Err(SimError::IndexLocked(component.to_string()));
        }
        self.environment.set_index(component, index)
    }

    pub fn connect(&mut self, source: PropertyRef, target: PropertyRef) -> SimResult<ConnectionId> {
        self.environment.connect(source, target)
    }

    pub fn connect_feedback(&mut self, source: PropertyRef, target: PropertyRef) -> SimResult<ConnectionId> {
        self.environment.connect_feedback(source, target)
    }

    pub fn auto_connect(&mut self, a: &str, b: &str) -> SimResult<Vec<ConnectionId>> {
        self.environment.auto_connect(a, b)
    }

    pub fn read<T: CellValue>(&self, component: &str, property: &str) -> SimResult<T> {
        self.environment.properties(component)?.read(property)
    }

    pub fn read_feedback<F: CellValue>(&self, component: &str, property: &str) -> SimResult<F> {
        self.environment.properties(component)?.read_feedback(property)
    }

    pub fn read_text(&self, component: &str, property: &str) -> SimResult<String> {
        self.environment
            .properties(component)?
            .get(property)
            .map(|cell| cell.read_as_text())
            .ok_or_else(|| SimError::UnknownProperty {
                component: component.to_string(),
                property: property.to_string(),
            })
    }

    /// Write a property from outside; the change propagates and reached
    /// components are scheduled at the current time
    pub fn write<T: CellValue>(&mut self, component: &str, property: &str, value: T) -> SimResult<()> {
        self.environment.properties_mut(component)?.write(property, value)?;
        self.solver.settle(&mut self.environment);
        Ok(())
    }

    pub fn write_feedback<F: CellValue>(&mut self, component: &str, property: &str, feedback: F) -> SimResult<()> {
        self.environment
            .properties_mut(component)?
            .write_feedback(property, feedback)?;
        self.solver.settle(&mut self.environment);
        Ok(())
    }

    /// Restore a value without triggering propagation
    pub fn write_no_notify<T: CellValue>(&mut self, component: &str, property: &str, value: T) -> SimResult<()> {
        self.environment
            .properties_mut(component)?
            .write_no_notify(property, value)
    }

    /// Set a property tagged `Parameter`
    pub fn set_parameter<T: CellValue>(&mut self, component: &str, property: &str, value: T) -> SimResult<()> {
        self.check_parameter(component, property)?;
        self.write_no_notify(component, property, value)
    }

    /// Set a property tagged `Parameter` from its text form
    pub fn set_parameter_text(&mut self, component: &str, property: &str, text: &str) -> SimResult<()> {
        self.check_parameter(component, property)?;
        self.environment.properties_mut(component)?.write_text(property, text)
    }

    fn check_parameter(&self, component: &str, property: &str) -> SimResult<()> {
        let cell = self
            .environment
            .properties(component)?
            .get(property)
            .ok_or_else(|| SimError::UnknownProperty {
                component: component.to_string(),
                property: property.to_string(),
            })?;
        if !cell.tags().contains(PropertyTag::Parameter) {
            return Err(SimError::NotAParameter {
                component: component.to_string(),
                property: property.to_string(),
            });
        }
        Ok(())
    }

    /// Rename a component together with its properties, connections and
    /// queued events
    pub fn rename_component(&mut self, old: &str, new: &str) -> SimResult<ComponentHandle> {
        let handle = self.environment.rename(old, new)?;
        self.solver.rename_component(old, new);
        Ok(handle)
    }

    /// Point every component at a new solver created for this environment
    pub fn replace_solver(&mut self, solver: impl Into<Solver>) -> SimResult<()> {
        let solver = solver.into();
        if solver.environment() != self.environment.id() {
            return Err(SimError::SolverMismatch(format!(
                "solver {} is bound to environment {}",
                solver.id(),
                solver.environment()
            )));
        }
        let record = SolverRecord {
            kind: solver.kind(),
            environment: self.environment.id(),
        };
        let reg = registry();
        if !reg.register_solver(solver.id(), record) {
            return Err(SimError::SolverMismatch(format!(
                "solver {} already belongs to a live simulation",
                solver.id()
            )));
        }
        reg.deregister_solver(self.solver.id());
        reg.rebind_environment(self.environment.id(), solver.id());

        self.environment.bind_solver(solver.id());
        info!("Environment {} now driven by {:?} solver {}", self.environment.id(), solver.kind(), solver.id());
        self.solver = solver;
        Ok(())
    }

    /// Queue a primary event. Returns false when it was suppressed as a duplicate.
    pub fn schedule(&mut self, component: &str, time: SimTime) -> SimResult<bool> {
        if !self.environment.contains(component) {
            return Err(SimError::UnknownComponent(component.to_string()));
        }
        Ok(match &mut self.solver {
            Solver::Discrete(solver) => solver.schedule_named(&self.environment, component, time),
            Solver::FixedStep(_) => false,
        })
    }

    /// Queue an after-time event for a component
    pub fn schedule_post_event(&mut self, component: &str, time: SimTime) -> SimResult<bool> {
        if !self.environment.contains(component) {
            return Err(SimError::UnknownComponent(component.to_string()));
        }
        Ok(match &mut self.solver {
            Solver::Discrete(solver) => solver.schedule_after_named(&self.environment, component, time),
            Solver::FixedStep(_) => false,
        })
    }

    /// Queue a primary event for every component
    pub fn schedule_all(&mut self, time: SimTime) {
        if let Solver::Discrete(solver) = &mut self.solver {
            solver.schedule_all(&self.environment, time);
        }
    }

    /// Run initialize and start once, in creation-index order
    fn ensure_started(&mut self) {
        if self.solver.state().started {
            return;
        }
        self.solver.state_mut().started = true;
        for phase in [EventPhase::Initialize, EventPhase::Start] {
            for position in 0..self.environment.len() {
                let requests = run_callback(
                    &mut self.environment,
                    position,
                    phase,
                    self.solver.state_mut(),
                    self.visualizer.as_mut(),
                );
                self.solver.apply_requests(&self.environment, requests);
                self.solver.settle(&mut self.environment);
            }
        }
    }

    /// Run until the next unit of work lies beyond `max_time`
    pub fn calculate_to(&mut self, max_time: SimTime) {
        self.ensure_started();
        self.solver
            .run(&mut self.environment, self.visualizer.as_mut(), Some(max_time));
    }

    /// Run to the end, then call `finish` on every component once
    pub fn calculate_finish(&mut self) {
        self.ensure_started();
        self.solver.run(&mut self.environment, self.visualizer.as_mut(), None);

        if self.solver.state().finish_called {
            return;
        }
        self.solver.state_mut().finish_called = true;
        for position in 0..self.environment.len() {
            run_callback(
                &mut self.environment,
                position,
                EventPhase::Finish,
                self.solver.state_mut(),
                self.visualizer.as_mut(),
            );
            self.environment.propagate();
        }
        info!(
            "Simulation finished at {} ({:?})",
            self.time(),
            self.finish_reason()
        );
    }

    /// Reseed the run's random number generator
    pub fn reseed(&mut self, seed: u64) {
        self.solver.state_mut().reseed(seed);
    }

    /// Deep copy of the environment and solver state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            environment: self.environment.clone(),
            solver: self.solver.clone(),
        }
    }

    fn validate_snapshot(snapshot: &Snapshot) -> SimResult<()> {
        if snapshot.solver.environment() != snapshot.environment.id() {
            return Err(SimError::InvalidSnapshot(format!(
                "solver {} is bound to environment {}, snapshot holds {}",
                snapshot.solver.id(),
                snapshot.solver.environment(),
                snapshot.environment.id()
            )));
        }
        snapshot.environment.validate(snapshot.solver.id())?;
        snapshot
            .solver
            .validate(&snapshot.environment)
            .map_err(SimError::InvalidSnapshot)
    }

    /// Build a live simulation from a snapshot whose identities are not in use
    pub fn restore(snapshot: Snapshot) -> SimResult<Self> {
        Self::validate_snapshot(&snapshot)?;
        Self::register(snapshot.environment, snapshot.solver, Box::new(LogVisualizer)).map_err(|err| {
            SimError::InvalidSnapshot(err.to_string())
        })
    }

    /// Return this simulation to a snapshot taken from it
    pub fn rollback(&mut self, snapshot: Snapshot) -> SimResult<()> {
        Self::validate_snapshot(&snapshot)?;
        if snapshot.environment.id() != self.environment.id() || snapshot.solver.id() != self.solver.id() {
            return Err(SimError::InvalidSnapshot(format!(
                "snapshot of environment {} cannot roll back environment {}",
                snapshot.environment.id(),
                self.environment.id()
            )));
        }
        self.environment = snapshot.environment;
        self.solver = snapshot.solver;
        Ok(())
    }

    /// Independent copy of this run with fresh identities.
    ///
    /// Components, connections, queued events, results and generator state
    /// are copied. The copy shares the visualization sink's clone.
    pub fn duplicate(&self) -> SimResult<Self> {
        let mut environment = self.environment.clone();
        let mut solver = self.solver.clone();
        let solver_id = SolverId::new();
        environment.assign_fresh_ids(solver_id);
        solver.rebind(solver_id, environment.id());

        let snapshot = Snapshot { environment, solver };
        Self::validate_snapshot(&snapshot)?;
        Self::register(snapshot.environment, snapshot.solver, self.visualizer.clone())
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        let reg = registry();
        reg.deregister_solver(self.solver.id());
        reg.deregister_environment(self.environment.id());
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("environment", &self.environment.id())
            .field("solver", &self.solver.id())
            .field("kind", &self.solver.kind())
            .field("time", &self.time())
            .field("components", &self.environment.len())
            .finish()
    }
}
