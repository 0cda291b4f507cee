/// Single-server queue on the discrete solver.
///
/// Customers arrive with exponential gaps and are served one at a time with
/// exponential service times. The run is repeated over several seeds on a
/// rayon pool at the end.
use flowsim::{
    run_replicas, BatchConfig, Component, ComponentContext, ConcurrencyMode, PropertyRef, PropertySet,
    PropertyTag, RunLength, SimError, SimResult, SimTime, Simulation, SolverConfig,
};
use rand_distr::Exp;

/// Whole time units drawn from an exponential distribution with the given mean
fn exp_delay(ctx: &mut ComponentContext, mean: f64) -> SimResult<SimTime> {
    let exp = Exp::new(1.0 / mean).map_err(|err| SimError::Callback(err.to_string()))?;
    let draw: f64 = ctx.sample(exp);
    Ok((draw.ceil() as SimTime).max(1))
}

#[derive(Clone)]
struct Arrivals;

impl Component for Arrivals {
    fn properties(&self, props: &mut PropertySet) {
        props
            .value("Arrived", 0i64, &[PropertyTag::Output, PropertyTag::Visualization])
            .value("MeanGap", 3.0f64, &[PropertyTag::Parameter])
            .value("Horizon", 200i64, &[PropertyTag::Parameter]);
    }

    fn start(&mut self, ctx: &mut ComponentContext) -> SimResult<()> {
        ctx.schedule_self_now();
        Ok(())
    }

    fn on_discrete_event(&mut self, ctx: &mut ComponentContext) -> SimResult<()> {
        let arrived = ctx.read::<i64>("Arrived")? + 1;
        ctx.write("Arrived", arrived)?;

        let mean: f64 = ctx.read("MeanGap")?;
        let next = ctx.time() + exp_delay(ctx, mean)?;
        if next <= ctx.read::<i64>("Horizon")? {
            ctx.schedule_self_at(next);
        }
        Ok(())
    }
}

#[derive(Clone)]
struct Server;

impl Component for Server {
    fn properties(&self, props: &mut PropertySet) {
        props
            .value("Arrived", 0i64, &[PropertyTag::Input])
            .value("Seen", 0i64, &[])
            .value("Queue", 0i64, &[PropertyTag::VisualizationOnChange])
            .value("Busy", false, &[])
            .value("FreeAt", 0i64, &[])
            .value("Served", 0i64, &[PropertyTag::Output])
            .value("MaxQueue", 0i64, &[])
            .value("MeanService", 2.5f64, &[PropertyTag::Parameter]);
    }

    fn on_discrete_event(&mut self, ctx: &mut ComponentContext) -> SimResult<()> {
        let time = ctx.time();
        let arrived: i64 = ctx.read("Arrived")?;
        let seen: i64 = ctx.read("Seen")?;
        let mut queue = ctx.read::<i64>("Queue")? + (arrived - seen);
        ctx.write_no_notify("Seen", arrived)?;

        let mut busy: bool = ctx.read("Busy")?;
        if busy && ctx.read::<i64>("FreeAt")? <= time {
            busy = false;
            let served = ctx.read::<i64>("Served")? + 1;
            ctx.write("Served", served)?;
        }

        if !busy && queue > 0 {
            queue -= 1;
            busy = true;
            let mean: f64 = ctx.read("MeanService")?;
            let free_at = time + exp_delay(ctx, mean)?;
            ctx.write_no_notify("FreeAt", free_at)?;
            ctx.schedule_self_at(free_at);
            ctx.log_debug(&format!("serving until {}, {} waiting", free_at, queue));
        }

        ctx.write_no_notify("Busy", busy)?;
        if queue != ctx.read::<i64>("Queue")? {
            ctx.write("Queue", queue)?;
        }
        let longest = ctx.read::<i64>("MaxQueue")?.max(queue);
        ctx.write_no_notify("MaxQueue", longest)?;
        Ok(())
    }

    fn finish(&mut self, ctx: &mut ComponentContext) -> SimResult<()> {
        let served: i64 = ctx.read("Served")?;
        let longest: i64 = ctx.read("MaxQueue")?;
        ctx.set_result("served", served);
        ctx.set_result("max_queue", longest);
        ctx.log_info(&format!("served {} customers, longest queue {}", served, longest));
        Ok(())
    }
}

fn build(seed: u64) -> SimResult<Simulation> {
    let mut sim = Simulation::discrete(SolverConfig::new().with_seed(seed))?;
    sim.add_named_component("Arrivals", Arrivals)?;
    sim.add_named_component("Server", Server)?;
    sim.set_display_name("Server", "Front desk")?;
    sim.connect(
        PropertyRef::new("Arrivals", "Arrived"),
        PropertyRef::new("Server", "Arrived"),
    )?;
    Ok(sim)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .init();

    let mut sim = build(7)?;
    sim.calculate_finish();
    println!("Single run finished at t={} ({:?})", sim.time(), sim.finish_reason());
    println!("  arrived:   {}", sim.read::<i64>("Arrivals", "Arrived")?);
    println!("  served:    {}", sim.result("served").unwrap_or("-"));
    println!("  max queue: {}", sim.result("max_queue").unwrap_or("-"));

    let base = build(100)?;
    let batch = BatchConfig::new()
        .with_concurrency(ConcurrencyMode::Rayon)
        .with_thread_pool_size(4);
    let summaries = run_replicas(&base, 16, RunLength::Finish, &batch)?;

    let served: Vec<f64> = summaries
        .iter()
        .filter_map(|summary| summary.results.get("served"))
        .filter_map(|value| value.parse::<f64>().ok())
        .collect();
    let mean = served.iter().sum::<f64>() / served.len().max(1) as f64;
    println!();
    println!("{} replicas, mean served {:.1}", summaries.len(), mean);
    for summary in &summaries {
        println!(
            "  replica {:>2}: t={:>3} served={:>3} max_queue={:>2}",
            summary.replica,
            summary.final_time,
            summary.results.get("served").map(String::as_str).unwrap_or("-"),
            summary.results.get("max_queue").map(String::as_str).unwrap_or("-"),
        );
    }
    Ok(())
}
