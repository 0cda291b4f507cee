use flowsim::{
    run_replicas, BatchConfig, Component, ComponentContext, ConcurrencyMode, EventPhase, FinishReason,
    MemoryVisualizer, PropertyRef, PropertySet, PropertyTag, RunLength, SimError, SimResult, Simulation,
    SolverConfig,
};
use rand_distr::Normal;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Counts up every `Interval` time units until `Limit`
#[derive(Clone)]
struct Generator;

impl Component for Generator {
    fn properties(&self, props: &mut PropertySet) {
        props
            .value("Count", 0i64, &[PropertyTag::Output, PropertyTag::Visualization])
            .value("Interval", 2i64, &[PropertyTag::Parameter])
            .value("Limit", 6i64, &[PropertyTag::Parameter]);
    }

    fn start(&mut self, ctx: &mut ComponentContext) -> SimResult<()> {
        ctx.schedule_self_now();
        Ok(())
    }

    fn on_discrete_event(&mut self, ctx: &mut ComponentContext) -> SimResult<()> {
        let count = ctx.read::<i64>("Count")? + 1;
        ctx.write("Count", count)?;

        let interval: i64 = ctx.read("Interval")?;
        if ctx.time() + interval <= ctx.read::<i64>("Limit")? {
            ctx.schedule_self_in(interval);
        }
        Ok(())
    }
}

/// Sums every value arriving on `In`
#[derive(Clone)]
struct Counter;

impl Component for Counter {
    fn properties(&self, props: &mut PropertySet) {
        props
            .value("In", 0i64, &[PropertyTag::Input, PropertyTag::VisualizationOnChange])
            .value("Ratio", 0.0f64, &[PropertyTag::Input])
            .value("Total", 0i64, &[PropertyTag::Output]);
    }

    fn on_discrete_event(&mut self, ctx: &mut ComponentContext) -> SimResult<()> {
        let mut total: i64 = ctx.read("Total")?;
        if ctx.is_changed("In") {
            total += ctx.read::<i64>("In")?;
            ctx.write_no_notify("Total", total)?;
        }
        ctx.set_result("total", total);
        Ok(())
    }
}

/// Fills by `Inflow` every tick
#[derive(Clone)]
struct Tank;

impl Component for Tank {
    fn properties(&self, props: &mut PropertySet) {
        props
            .value("Level", 0.0f64, &[PropertyTag::Output, PropertyTag::Visualization])
            .value("Inflow", 1.0f64, &[PropertyTag::Parameter]);
    }

    fn on_step(&mut self, ctx: &mut ComponentContext) -> SimResult<()> {
        let level = ctx.read::<f64>("Level")? + ctx.read::<f64>("Inflow")?;
        ctx.write("Level", level)
    }

    fn finish(&mut self, ctx: &mut ComponentContext) -> SimResult<()> {
        let level: f64 = ctx.read("Level")?;
        ctx.set_result("level", level);
        Ok(())
    }
}

/// Draws one normally distributed sample per time unit
#[derive(Clone)]
struct Noise;

impl Component for Noise {
    fn properties(&self, props: &mut PropertySet) {
        props.value("Sum", 0.0f64, &[PropertyTag::Output]);
    }

    fn start(&mut self, ctx: &mut ComponentContext) -> SimResult<()> {
        ctx.schedule_self_now();
        Ok(())
    }

    fn on_discrete_event(&mut self, ctx: &mut ComponentContext) -> SimResult<()> {
        let normal = Normal::new(0.0, 1.0).map_err(|err| SimError::Callback(err.to_string()))?;
        let sum = ctx.read::<f64>("Sum")? + ctx.sample(normal);
        ctx.write("Sum", sum)?;
        ctx.set_result("sum", format!("{:.6}", sum));
        if ctx.time() < 9 {
            ctx.schedule_next_step();
        }
        Ok(())
    }
}

fn pipeline() -> Simulation {
    let mut sim = Simulation::discrete(SolverConfig::new().with_trace(true)).unwrap();
    sim.add_named_component("Gen", Generator).unwrap();
    sim.add_named_component("Count", Counter).unwrap();
    sim.connect(PropertyRef::new("Gen", "Count"), PropertyRef::new("Count", "In"))
        .unwrap();
    sim
}

#[test]
fn test_discrete_pipeline() {
    init_logging();
    let memory = MemoryVisualizer::new();
    let mut sim = pipeline().with_visualizer(memory.clone());
    sim.calculate_finish();

    assert_eq!(sim.time(), 6);
    assert_eq!(sim.finish_reason(), Some(FinishReason::Exhausted));
    assert_eq!(sim.read::<i64>("Count", "Total").unwrap(), 10);
    assert_eq!(sim.result("total"), Some("10"));

    let generator_lines: Vec<String> = memory
        .records()
        .iter()
        .filter(|record| record.type_name == "Generator")
        .map(|record| record.to_line())
        .collect();
    assert_eq!(
        generator_lines,
        vec![
            "0;Generator;0;Count;1",
            "2;Generator;0;Count;2",
            "4;Generator;0;Count;3",
            "6;Generator;0;Count;4",
        ]
    );

    let counted: Vec<i64> = sim
        .trace()
        .iter()
        .filter(|entry| entry.phase == EventPhase::Discrete && entry.component == "Count")
        .map(|entry| entry.time)
        .collect();
    assert_eq!(counted, vec![0, 2, 4, 6]);
}

#[test]
fn test_parameters_and_incremental_runs() {
    init_logging();
    let mut sim = pipeline();
    sim.set_parameter_text("Gen", "Interval", "3").unwrap();

    sim.calculate_to(4);
    assert_eq!(sim.time(), 3);
    assert_eq!(sim.finish_reason(), Some(FinishReason::TimeBound));
    assert_eq!(sim.read_text("Count", "Total").unwrap(), "3");

    sim.calculate_finish();
    assert_eq!(sim.time(), 6);
    assert_eq!(sim.read::<i64>("Count", "Total").unwrap(), 6);
}

#[test]
fn test_what_if_with_rollback() {
    init_logging();
    let mut sim = pipeline();
    sim.calculate_to(2);
    assert_eq!(sim.read::<i64>("Count", "Total").unwrap(), 3);
    let checkpoint = sim.snapshot();
    assert_eq!(checkpoint.time(), 2);

    sim.set_parameter("Gen", "Interval", 1i64).unwrap();
    sim.calculate_finish();
    assert_eq!(sim.read::<i64>("Count", "Total").unwrap(), 15);

    sim.rollback(checkpoint).unwrap();
    sim.calculate_finish();
    assert_eq!(sim.read::<i64>("Count", "Total").unwrap(), 10);
}

#[test]
fn test_configuration_errors() {
    init_logging();
    let mut sim = pipeline();

    assert_eq!(
        sim.add_named_component("Gen", Generator).unwrap_err(),
        SimError::DuplicateComponent("Gen".to_string())
    );
    // Count.In already has a driver
    assert!(matches!(
        sim.connect(PropertyRef::new("Gen", "Count"), PropertyRef::new("Count", "In")),
        Err(SimError::InvalidConnection(_))
    ));
    assert!(matches!(
        sim.connect(PropertyRef::new("Gen", "Count"), PropertyRef::new("Count", "Ratio")),
        Err(SimError::TypeMismatch { .. })
    ));
    assert!(matches!(
        sim.connect(PropertyRef::new("Count", "Total"), PropertyRef::new("Gen", "Interval")),
        Err(SimError::InvalidConnection(_))
    ));
    assert!(matches!(
        sim.connect_feedback(PropertyRef::new("Count", "Total"), PropertyRef::new("Count", "Ratio")),
        Err(SimError::InvalidConnection(_))
    ));

    let err = sim.set_parameter("Count", "Total", 1i64).unwrap_err();
    assert_eq!(err.to_string(), "Property 'Total' of 'Count' is not a parameter");
}

#[test]
fn test_fixed_step_tank() {
    init_logging();
    let mut sim = Simulation::fixed_step(SolverConfig::new().with_end_time(4)).unwrap();
    let tank = sim.add_component(Tank).unwrap();
    assert_eq!(tank.name(), "Tank0");
    sim.set_parameter("Tank0", "Inflow", 0.5f64).unwrap();

    sim.calculate_finish();
    assert_eq!(sim.read::<f64>("Tank0", "Level").unwrap(), 2.5);
    assert_eq!(sim.result("level"), Some("2.5"));
    assert_eq!(sim.finish_reason(), Some(FinishReason::TimeBound));
}

#[test]
fn test_seeded_replicas() {
    init_logging();
    let mut base = Simulation::discrete(SolverConfig::new().with_seed(2024)).unwrap();
    base.add_named_component("Noise", Noise).unwrap();

    let config = BatchConfig::new().with_concurrency(ConcurrencyMode::Rayon);
    let first = run_replicas(&base, 3, RunLength::Finish, &config).unwrap();
    let second = run_replicas(&base, 3, RunLength::Finish, &config).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    assert!(first.iter().all(|summary| summary.final_time == 9));
    assert_ne!(first[0].results.get("sum"), first[2].results.get("sum"));
}

#[test]
fn test_duplicate_runs_independently() {
    init_logging();
    let mut sim = pipeline();
    let mut copy = sim.duplicate().unwrap();
    copy.set_parameter("Gen", "Limit", 2i64).unwrap();

    copy.calculate_finish();
    sim.calculate_finish();
    assert_eq!(copy.read::<i64>("Count", "Total").unwrap(), 3);
    assert_eq!(sim.read::<i64>("Count", "Total").unwrap(), 10);
    assert_ne!(copy.environment().id(), sim.environment().id());
}
