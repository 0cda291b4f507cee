use crate::core::components::ScheduleRequest;
use crate::core::connections::{Obligation, Phase};
use crate::core::environment::Environment;
use crate::core::execution::config::SolverConfig;
use crate::core::execution::event::{Event, EventQueue, TieBreak};
use crate::core::execution::solver::{run_callback, EventPhase, FinishReason, SolverState};
use crate::core::types::SimTime;
use crate::core::visualization::Visualizer;
use log::{debug, trace, warn};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Event-driven solver.
///
/// Primary events run in (timestamp, tie-break, insertion) order. Feedback
/// settles through a second after-time queue whose events at the current
/// timestamp run once no primary event is left at that timestamp, and
/// always before time advances.
///
/// Without loop mode a component is issued at most one primary event per
/// timestamp, counting events already executed at that timestamp.
#[derive(Debug, Clone)]
pub struct DiscreteSolver {
    state: SolverState,
    primary: EventQueue,
    after_time: EventQueue,
    /// Components issued a primary event, per timestamp not yet left behind
    issued: BTreeMap<SimTime, HashSet<String>>,
    pending_after: HashSet<(SimTime, String)>,
    /// Executions per component at `historic_time`, the loop-mode generation
    historic: HashMap<String, u32>,
    historic_time: SimTime,
}

impl DiscreteSolver {
    /// Create a solver bound to `env`
    pub fn new(env: &Environment, config: SolverConfig) -> Self {
        let state = SolverState::new(env.id(), config);
        let historic_time = state.time;
        Self {
            state,
            primary: EventQueue::new(),
            after_time: EventQueue::new(),
            issued: BTreeMap::new(),
            pending_after: HashSet::new(),
            historic: HashMap::new(),
            historic_time,
        }
    }

    pub fn state(&self) -> &SolverState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut SolverState {
        &mut self.state
    }

    /// Pending primary events in execution order
    pub fn pending_events(&self) -> Vec<Event> {
        self.primary.sorted()
    }

    /// Pending after-time events in execution order
    pub fn pending_after_time(&self) -> Vec<Event> {
        self.after_time.sorted()
    }

    pub fn has_pending(&self) -> bool {
        !self.primary.is_empty() || !self.after_time.is_empty()
    }

    /// Queue a primary event. Returns false when it was suppressed as a
    /// duplicate. Times in the past are moved to the current time.
    pub(crate) fn schedule(&mut self, component: &str, index: usize, time: SimTime) -> bool {
        let time = self.clamp(component, time);
        let tie_break = if self.state.config.allow_loops {
            let generation = if time == self.historic_time {
                self.historic.get(component).copied().unwrap_or(0)
            } else {
                0
            };
            TieBreak { generation, index }
        } else {
            if !self.issued.entry(time).or_default().insert(component.to_string()) {
                trace!("Suppressed duplicate event for {} at {}", component, time);
                return false;
            }
            TieBreak { generation: 0, index }
        };
        self.primary.push(component, time, tie_break);
        true
    }

    /// Queue an after-time event, suppressing one already pending
    pub(crate) fn schedule_after_time(&mut self, component: &str, index: usize, time: SimTime) -> bool {
        let time = self.clamp(component, time);
        if !self.pending_after.insert((time, component.to_string())) {
            trace!("Suppressed duplicate after-time event for {} at {}", component, time);
            return false;
        }
        self.after_time.push(component, time, TieBreak { generation: 0, index });
        true
    }

    fn clamp(&self, component: &str, time: SimTime) -> SimTime {
        if time < self.state.time {
            debug!(
                "Event for {} at {} lies in the past, moved to {}",
                component, time, self.state.time
            );
            self.state.time
        } else {
            time
        }
    }

    /// Resolve a component by name and queue a primary event for it
    pub(crate) fn schedule_named(&mut self, env: &Environment, component: &str, time: SimTime) -> bool {
        match env.component(component) {
            Some(slot) => self.schedule(component, slot.index(), time),
            None => {
                warn!("Cannot schedule unknown component '{}'", component);
                false
            }
        }
    }

    pub(crate) fn schedule_after_named(&mut self, env: &Environment, component: &str, time: SimTime) -> bool {
        match env.component(component) {
            Some(slot) => self.schedule_after_time(component, slot.index(), time),
            None => {
                warn!("Cannot schedule after-time event for unknown component '{}'", component);
                false
            }
        }
    }

    pub(crate) fn schedule_all(&mut self, env: &Environment, time: SimTime) {
        for slot in env.components() {
            self.schedule(slot.name(), slot.index(), time);
        }
    }

    pub(crate) fn apply_requests(&mut self, env: &Environment, requests: Vec<ScheduleRequest>) {
        for request in requests {
            match request {
                ScheduleRequest::Primary { component, time } => {
                    self.schedule_named(env, &component, time);
                }
                ScheduleRequest::AfterTime { component, time } => {
                    self.schedule_after_named(env, &component, time);
                }
                ScheduleRequest::Connected {
                    component,
                    property,
                    time,
                } => {
                    for other in env.connected_components(&component, &property) {
                        self.schedule_named(env, &other, time);
                    }
                }
                ScheduleRequest::All { time } => self.schedule_all(env, time),
            }
        }
    }

    /// Schedule the components reached by propagation at the current time
    pub(crate) fn schedule_obligations(&mut self, env: &Environment, obligations: Vec<Obligation>) {
        let now = self.state.time;
        for obligation in obligations {
            match obligation.phase {
                Phase::Primary => self.schedule_named(env, &obligation.component, now),
                Phase::AfterTime => self.schedule_after_named(env, &obligation.component, now),
            };
        }
    }

    /// Process events until finished, out of work, or past `bound`.
    ///
    /// An event beyond `bound` is left queued for a later call.
    pub(crate) fn run(&mut self, env: &mut Environment, visualizer: &mut dyn Visualizer, bound: Option<SimTime>) {
        self.state.resume();

        loop {
            if self.state.is_finished() {
                break;
            }
            if let Some(max_time) = bound.filter(|max_time| self.state.time > *max_time) {
                debug!("Current time {} already lies beyond {}", self.state.time, max_time);
                self.state.finished = Some(FinishReason::TimeBound);
                break;
            }

            // Feedback owed at the current time, once primary work there is done
            let primary_due = self
                .primary
                .peek_time()
                .map_or(false, |time| time <= self.state.time);
            if !primary_due {
                if let Some(event) = self.after_time.pop_due(self.state.time) {
                    self.pending_after.remove(&(event.timestamp, event.component.clone()));
                    self.execute(env, visualizer, event, EventPhase::PostEvent);
                    continue;
                }
            }

            let next_primary = self.primary.peek_time();
            let next = match (next_primary, self.after_time.peek_time()) {
                (None, None) => {
                    debug!("No events left at time {}", self.state.time);
                    self.state.finished = Some(FinishReason::Exhausted);
                    break;
                }
                (Some(primary), None) => primary,
                (None, Some(after)) => after,
                (Some(primary), Some(after)) => primary.min(after),
            };

            if let Some(max_time) = bound {
                if next > max_time {
                    debug!("Next event at {} lies beyond {}", next, max_time);
                    self.state.finished = Some(FinishReason::TimeBound);
                    break;
                }
            }

            if next_primary == Some(next) {
                if let Some(event) = self.primary.pop() {
                    self.advance_to(event.timestamp);
                    self.execute(env, visualizer, event, EventPhase::Discrete);
                }
            } else {
                self.advance_to(next);
            }
        }
    }

    fn advance_to(&mut self, time: SimTime) {
        if time > self.state.time {
            trace!("Advancing time {} -> {}", self.state.time, time);
            self.state.time = time;
            self.issued = self.issued.split_off(&time);
        }
        if time != self.historic_time {
            self.historic.clear();
            self.historic_time = time;
        }
    }

    fn execute(&mut self, env: &mut Environment, visualizer: &mut dyn Visualizer, event: Event, phase: EventPhase) {
        let Some(position) = env.position(&event.component) else {
            warn!(
                "Dropping event {} at {}: component '{}' not found",
                event.id, event.timestamp, event.component
            );
            return;
        };

        if phase == EventPhase::Discrete {
            *self.historic.entry(event.component.clone()).or_insert(0) += 1;
        }

        let requests = run_callback(env, position, phase, &mut self.state, visualizer);
        self.apply_requests(env, requests);
        let obligations = env.propagate();
        self.schedule_obligations(env, obligations);

        self.state.pace();
    }

    pub(crate) fn rename_component(&mut self, old: &str, new: &str) {
        self.primary.rename_component(old, new);
        self.after_time.rename_component(old, new);
        for names in self.issued.values_mut() {
            if names.remove(old) {
                names.insert(new.to_string());
            }
        }
        self.pending_after = self
            .pending_after
            .drain()
            .map(|(time, name)| if name == old { (time, new.to_string()) } else { (time, name) })
            .collect();
        if let Some(count) = self.historic.remove(old) {
            self.historic.insert(new.to_string(), count);
        }
    }
}
