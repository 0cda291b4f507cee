// Tests for the fixed-step solver
use super::components::{executions, Stepper};
use crate::core::execution::{EventPhase, FinishReason, Simulation, SolverConfig};
use crate::core::types::PropertyRef;

fn two_steppers(config: SolverConfig) -> Simulation {
    let mut sim = Simulation::fixed_step(config.with_trace(true)).unwrap();
    sim.add_component(Stepper).unwrap();
    sim.add_component(Stepper).unwrap();
    sim.connect(
        PropertyRef::new("Stepper0", "Steps"),
        PropertyRef::new("Stepper1", "Seen"),
    )
    .unwrap();
    sim
}

#[test]
fn test_every_component_stepped_each_tick() {
    let mut sim = two_steppers(SolverConfig::new().with_step(2));
    sim.calculate_to(6);

    assert_eq!(sim.read::<i64>("Stepper0", "Steps").unwrap(), 4);
    assert_eq!(sim.read::<i64>("Stepper1", "Steps").unwrap(), 4);
    assert_eq!(sim.time(), 8);
    assert_eq!(sim.finish_reason(), Some(FinishReason::TimeBound));

    let ticks: Vec<i64> = executions(&sim, EventPhase::Step)
        .into_iter()
        .filter(|(_, name)| name == "Stepper0")
        .map(|(time, _)| time)
        .collect();
    assert_eq!(ticks, vec![0, 2, 4, 6]);
}

#[test]
fn test_steps_follow_creation_order_and_propagate_immediately() {
    let mut sim = two_steppers(SolverConfig::new());
    sim.calculate_to(0);

    let order: Vec<String> = executions(&sim, EventPhase::Step)
        .into_iter()
        .map(|(_, name)| name)
        .collect();
    assert_eq!(order, vec!["Stepper0".to_string(), "Stepper1".to_string()]);
    // Stepper0's output reached Stepper1 within the same tick
    assert_eq!(sim.read::<i64>("Stepper1", "Seen").unwrap(), 1);
}

#[test]
fn test_calculate_continues_from_previous_bound() {
    let mut sim = two_steppers(SolverConfig::new());
    sim.calculate_to(2);
    sim.calculate_to(4);
    assert_eq!(sim.read::<i64>("Stepper0", "Steps").unwrap(), 5);
}

#[test]
fn test_calculate_finish_stops_at_end_time_and_finishes_once() {
    let mut sim = two_steppers(SolverConfig::new().with_end_time(3));
    sim.calculate_finish();

    assert_eq!(sim.read::<i64>("Stepper0", "Steps").unwrap(), 4);
    assert_eq!(sim.result("finish_calls"), Some("2"));

    sim.calculate_finish();
    assert_eq!(sim.result("finish_calls"), Some("2"));
    assert_eq!(executions(&sim, EventPhase::Finish).len(), 2);
}

#[test]
fn test_scheduling_is_ignored() {
    let mut sim = two_steppers(SolverConfig::new());
    assert_eq!(sim.schedule("Stepper0", 0), Ok(false));
    assert!(sim.solver().as_discrete().is_none());
}
