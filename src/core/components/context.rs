use crate::core::error::SimResult;
use crate::core::logging::{log_component, LogLevel};
use crate::core::types::SimTime;
use crate::core::values::{CellValue, PropertySet};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::Distribution;
use std::collections::BTreeMap;

/// Scheduling work a component asks for during a callback.
///
/// Requests are collected by the context and applied by the solver once the
/// callback has returned. The fixed-step solver evaluates every component on
/// every tick and ignores them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleRequest {
    /// Primary event for a component at a time
    Primary { component: String, time: SimTime },
    /// After-time event for a component at a time
    AfterTime { component: String, time: SimTime },
    /// Primary events for every component connected through a property
    Connected {
        component: String,
        property: String,
        time: SimTime,
    },
    /// Primary events for every component of the environment
    All { time: SimTime },
}

/// View of the simulation handed to a component callback
pub struct ComponentContext<'a> {
    name: &'a str,
    index: usize,
    time: SimTime,
    properties: &'a mut PropertySet,
    rng: &'a mut StdRng,
    results: &'a mut BTreeMap<String, String>,
    requests: Vec<ScheduleRequest>,
    finish_requested: bool,
}

impl<'a> ComponentContext<'a> {
    pub(crate) fn new(
        name: &'a str,
        index: usize,
        time: SimTime,
        properties: &'a mut PropertySet,
        rng: &'a mut StdRng,
        results: &'a mut BTreeMap<String, String>,
    ) -> Self {
        Self {
            name,
            index,
            time,
            properties,
            rng,
            results,
            requests: Vec::new(),
            finish_requested: false,
        }
    }

    pub(crate) fn into_parts(self) -> (Vec<ScheduleRequest>, bool) {
        (self.requests, self.finish_requested)
    }

    /// Current simulation time
    pub fn time(&self) -> SimTime {
        self.time
    }

    /// Name of the component being evaluated
    pub fn name(&self) -> &str {
        self.name
    }

    /// Creation index of the component being evaluated
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn properties(&self) -> &PropertySet {
        self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertySet {
        self.properties
    }

    pub fn read<T: CellValue>(&self, property: &str) -> SimResult<T> {
        self.properties.read(property)
    }

    pub fn read_feedback<F: CellValue>(&self, property: &str) -> SimResult<F> {
        self.properties.read_feedback(property)
    }

    /// Write a property; connected components see the value at the current time
    pub fn write<T: CellValue>(&mut self, property: &str, value: T) -> SimResult<()> {
        self.properties.write(property, value)
    }

    pub fn write_no_notify<T: CellValue>(&mut self, property: &str, value: T) -> SimResult<()> {
        self.properties.write_no_notify(property, value)
    }

    /// Write the feedback slot; the upstream component settles it after time
    pub fn write_feedback<F: CellValue>(&mut self, property: &str, feedback: F) -> SimResult<()> {
        self.properties.write_feedback(property, feedback)
    }

    pub fn is_changed(&self, property: &str) -> bool {
        self.properties.is_changed(property)
    }

    pub fn is_feedback_changed(&self, property: &str) -> bool {
        self.properties.is_feedback_changed(property)
    }

    pub fn schedule_self_now(&mut self) {
        self.schedule_self_at(self.time);
    }

    pub fn schedule_self_at(&mut self, time: SimTime) {
        self.requests.push(ScheduleRequest::Primary {
            component: self.name.to_string(),
            time,
        });
    }

    pub fn schedule_self_in(&mut self, delay: SimTime) {
        self.schedule_self_at(self.time + delay);
    }

    /// Schedule this component for the next time unit
    pub fn schedule_next_step(&mut self) {
        self.schedule_self_in(1);
    }

    pub fn schedule_at(&mut self, component: &str, time: SimTime) {
        self.requests.push(ScheduleRequest::Primary {
            component: component.to_string(),
            time,
        });
    }

    /// Schedule every component connected to one of this component's properties.
    /// `None` means the current time.
    pub fn schedule_connected(&mut self, property: &str, time: Option<SimTime>) {
        self.requests.push(ScheduleRequest::Connected {
            component: self.name.to_string(),
            property: property.to_string(),
            time: time.unwrap_or(self.time),
        });
    }

    /// Schedule an after-time event directly
    pub fn schedule_post_event(&mut self, component: &str, time: SimTime) {
        self.requests.push(ScheduleRequest::AfterTime {
            component: component.to_string(),
            time,
        });
    }

    pub fn schedule_all(&mut self, time: SimTime) {
        self.requests.push(ScheduleRequest::All { time });
    }

    /// Ask the solver to stop before its next event or tick
    pub fn finish_simulation(&mut self) {
        self.finish_requested = true;
    }

    /// Store a named result on the solver
    pub fn set_result(&mut self, key: &str, value: impl ToString) {
        self.results.insert(key.to_string(), value.to_string());
    }

    pub fn result(&self, key: &str) -> Option<&str> {
        self.results.get(key).map(|value| value.as_str())
    }

    /// Random number generator of the run
    pub fn rng(&mut self) -> &mut StdRng {
        self.rng
    }

    /// Draw one sample from a distribution using the run's generator
    pub fn sample<T, D: Distribution<T>>(&mut self, distribution: D) -> T {
        self.rng.sample(distribution)
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        log_component(level, self.time, self.name, message);
    }

    pub fn log_verbose(&self, message: &str) {
        self.log(LogLevel::Verbose, message);
    }

    pub fn log_debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn log_info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn log_warn(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    pub fn log_error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    pub fn log_fatal(&self, message: &str) {
        self.log(LogLevel::Fatal, message);
    }
}
