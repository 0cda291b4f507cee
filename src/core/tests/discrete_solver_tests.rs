// Tests for the discrete solver: ordering, deduplication, loop mode and feedback settlement
use super::components::{executions, source_sink, Faulty, Looper, Sink, Source, Stopper};
use crate::core::execution::{EventPhase, FinishReason, Simulation, SolverConfig};
use crate::core::types::{PropertyRef, SimTime};
use crate::core::visualization::MemoryVisualizer;

fn entries(list: &[(SimTime, &str)]) -> Vec<(SimTime, String)> {
    list.iter().map(|(time, name)| (*time, name.to_string())).collect()
}

#[test]
fn test_forward_change_reaches_target_in_same_step() {
    let mut sim = source_sink(SolverConfig::new());
    sim.write("Src", "Val", 5i64).unwrap();
    sim.calculate_to(0);

    assert_eq!(sim.read::<i64>("Dst", "Val").unwrap(), 5);
    assert_eq!(executions(&sim, EventPhase::Discrete), entries(&[(0, "Dst")]));
    assert_eq!(sim.result("sink_val"), Some("5"));
}

#[test]
fn test_duplicate_events_run_once_without_loops() {
    let mut sim = source_sink(SolverConfig::new());
    assert!(sim.schedule("Dst", 0).unwrap());
    assert!(!sim.schedule("Dst", 0).unwrap());
    sim.calculate_to(0);

    assert_eq!(executions(&sim, EventPhase::Discrete), entries(&[(0, "Dst")]));
}

#[test]
fn test_feedback_settles_after_forward_work() {
    let mut sim = Simulation::discrete(SolverConfig::new().with_trace(true)).unwrap();
    sim.add_named_component("Src", Source).unwrap();
    sim.add_named_component("Dst", Sink).unwrap();
    sim.connect_feedback(PropertyRef::new("Src", "Link"), PropertyRef::new("Dst", "Link"))
        .unwrap();
    sim.schedule("Src", 3).unwrap();
    sim.calculate_finish();

    let order: Vec<(SimTime, String, EventPhase)> = sim
        .trace()
        .iter()
        .filter(|entry| matches!(entry.phase, EventPhase::Discrete | EventPhase::PostEvent))
        .map(|entry| (entry.time, entry.component.clone(), entry.phase))
        .collect();
    assert_eq!(
        order,
        vec![
            (3, "Src".to_string(), EventPhase::Discrete),
            (3, "Dst".to_string(), EventPhase::Discrete),
            (3, "Src".to_string(), EventPhase::PostEvent),
        ]
    );
    assert_eq!(sim.read::<i64>("Dst", "Link").unwrap(), 3);
    assert_eq!(sim.read_feedback::<i64>("Src", "Link").unwrap(), 30);
    assert_eq!(sim.result("settled"), Some("30"));
}

#[test]
fn test_loop_mode_reentry_runs_in_schedule_order() {
    let mut sim = Simulation::discrete(SolverConfig::new().with_loops(true).with_trace(true)).unwrap();
    sim.add_named_component("Loop", Looper).unwrap();
    sim.add_named_component("Other", Looper).unwrap();
    sim.set_parameter("Loop", "Repeats", 3i64).unwrap();
    sim.schedule("Loop", 0).unwrap();
    sim.schedule("Other", 0).unwrap();
    sim.calculate_to(0);

    assert_eq!(
        executions(&sim, EventPhase::Discrete),
        entries(&[(0, "Loop"), (0, "Other"), (0, "Loop"), (0, "Loop")])
    );
    assert_eq!(sim.read::<i64>("Loop", "Count").unwrap(), 3);
}

#[test]
fn test_self_reschedule_suppressed_without_loops() {
    let mut sim = Simulation::discrete(SolverConfig::new().with_trace(true)).unwrap();
    sim.add_named_component("Loop", Looper).unwrap();
    sim.set_parameter("Loop", "Repeats", 3i64).unwrap();
    sim.schedule("Loop", 0).unwrap();
    sim.calculate_finish();

    assert_eq!(executions(&sim, EventPhase::Discrete), entries(&[(0, "Loop")]));
    assert_eq!(sim.read::<i64>("Loop", "Count").unwrap(), 1);
}

#[test]
fn test_ordering_is_deterministic() {
    let build = || {
        let mut sim = Simulation::discrete(SolverConfig::new().with_trace(true)).unwrap();
        for name in ["A", "B", "C"] {
            sim.add_named_component(name, Looper).unwrap();
        }
        sim.schedule("C", 1).unwrap();
        sim.schedule("A", 1).unwrap();
        sim.schedule("B", 0).unwrap();
        sim.schedule("C", 0).unwrap();
        sim.calculate_finish();
        executions(&sim, EventPhase::Discrete)
    };

    let first = build();
    assert_eq!(first, entries(&[(0, "B"), (0, "C"), (1, "A"), (1, "C")]));
    assert_eq!(first, build());
}

#[test]
fn test_calculate_to_respects_bound() {
    let mut sim = source_sink(SolverConfig::new());
    sim.schedule("Dst", 7).unwrap();
    sim.schedule("Dst", 2).unwrap();

    sim.calculate_to(5);
    assert_eq!(executions(&sim, EventPhase::Discrete), entries(&[(2, "Dst")]));
    assert_eq!(sim.finish_reason(), Some(FinishReason::TimeBound));
    assert_eq!(sim.time(), 2);
    let pending = sim.solver().as_discrete().unwrap().pending_events();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].timestamp, 7);

    sim.calculate_to(10);
    assert_eq!(executions(&sim, EventPhase::Discrete), entries(&[(2, "Dst"), (7, "Dst")]));
    assert_eq!(sim.finish_reason(), Some(FinishReason::Exhausted));

    let times: Vec<SimTime> = sim.trace().iter().map(|entry| entry.time).collect();
    assert!(times.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn test_calculate_to_holds_after_time_events_behind_earlier_bound() {
    let mut sim = source_sink(SolverConfig::new());
    sim.schedule("Dst", 7).unwrap();
    sim.calculate_to(10);
    assert_eq!(sim.time(), 7);

    assert!(sim.schedule_post_event("Src", 7).unwrap());
    sim.calculate_to(3);
    assert!(executions(&sim, EventPhase::PostEvent).is_empty());
    assert_eq!(sim.finish_reason(), Some(FinishReason::TimeBound));
    assert_eq!(sim.time(), 7);

    sim.calculate_to(7);
    assert_eq!(executions(&sim, EventPhase::PostEvent), entries(&[(7, "Src")]));
}

#[test]
fn test_changed_flags_cleared_after_evaluation() {
    let mut sim = source_sink(SolverConfig::new());
    sim.write("Src", "Val", 5i64).unwrap();
    assert!(sim.component("Dst").unwrap().properties().is_changed("Val"));

    sim.calculate_to(0);
    let dst = sim.component("Dst").unwrap().properties();
    assert!(!dst.is_changed("Val"));
    assert!(!dst.is_feedback_changed("Link"));
}

#[test]
fn test_failing_callback_does_not_stop_run() {
    let mut sim = Simulation::discrete(SolverConfig::new().with_trace(true)).unwrap();
    sim.add_named_component("Bad", Faulty).unwrap();
    sim.schedule("Bad", 0).unwrap();
    sim.calculate_finish();

    assert_eq!(
        executions(&sim, EventPhase::Discrete),
        entries(&[(0, "Bad"), (1, "Bad"), (2, "Bad"), (3, "Bad")])
    );
    assert_eq!(sim.finish_reason(), Some(FinishReason::Exhausted));
}

#[test]
fn test_requested_finish_is_sticky() {
    let mut sim = Simulation::discrete(SolverConfig::new().with_trace(true)).unwrap();
    sim.add_named_component("Stop", Stopper).unwrap();
    sim.calculate_to(10);

    assert_eq!(
        executions(&sim, EventPhase::Discrete),
        entries(&[(0, "Stop"), (1, "Stop"), (2, "Stop")])
    );
    assert_eq!(sim.finish_reason(), Some(FinishReason::Requested));

    sim.calculate_to(10);
    assert_eq!(executions(&sim, EventPhase::Discrete).len(), 3);
}

#[test]
fn test_text_target_receives_text_form() {
    let mut sim = source_sink(SolverConfig::new());
    sim.connect(PropertyRef::new("Src", "Rate"), PropertyRef::new("Dst", "Text"))
        .unwrap();
    sim.write("Src", "Rate", 2.5f64).unwrap();
    assert_eq!(sim.read::<String>("Dst", "Text").unwrap(), "2.5");
}

#[test]
fn test_trailing_after_time_event_advances_time() {
    let mut sim = source_sink(SolverConfig::new());
    sim.schedule_post_event("Src", 4).unwrap();
    sim.calculate_finish();

    assert_eq!(executions(&sim, EventPhase::PostEvent), entries(&[(4, "Src")]));
    assert_eq!(sim.time(), 4);
}

#[test]
fn test_visualization_records() {
    let memory = MemoryVisualizer::new();
    let mut sim = source_sink(SolverConfig::new()).with_visualizer(memory.clone());
    sim.set_display_name("Dst", "Drain").unwrap();

    sim.schedule("Src", 1).unwrap();
    sim.calculate_to(1);
    let lines: Vec<String> = memory.records().iter().map(|record| record.to_line()).collect();
    assert_eq!(lines, vec!["1;Source;0;Val;0".to_string()]);

    memory.clear();
    sim.write("Src", "Val", 5i64).unwrap();
    sim.calculate_to(1);
    let lines: Vec<String> = memory.records().iter().map(|record| record.to_line()).collect();
    assert_eq!(lines, vec!["1;Sink;1;Val;5;Drain".to_string()]);
}
