/// Room heated by a thermostat, evaluated on the fixed-step solver
use flowsim::{
    Component, ComponentContext, MemoryVisualizer, PropertyRef, PropertySet, PropertyTag, SimResult,
    Simulation, SolverConfig,
};

#[derive(Clone)]
struct Room;

impl Component for Room {
    fn properties(&self, props: &mut PropertySet) {
        props
            .value("Power", 0.0f64, &[PropertyTag::Input])
            .value("Temperature", 12.0f64, &[PropertyTag::Output, PropertyTag::Visualization])
            .value("Outside", 5.0f64, &[PropertyTag::Parameter])
            .value("Loss", 0.05f64, &[PropertyTag::Parameter]);
    }

    fn on_step(&mut self, ctx: &mut ComponentContext) -> SimResult<()> {
        let temperature: f64 = ctx.read("Temperature")?;
        let outside: f64 = ctx.read("Outside")?;
        let loss: f64 = ctx.read("Loss")?;
        let power: f64 = ctx.read("Power")?;
        let next = temperature + power - loss * (temperature - outside);
        ctx.write("Temperature", next)
    }

    fn finish(&mut self, ctx: &mut ComponentContext) -> SimResult<()> {
        let temperature: f64 = ctx.read("Temperature")?;
        ctx.set_result("temperature", format!("{:.2}", temperature));
        Ok(())
    }
}

/// Proportional controller with a power limit
#[derive(Clone)]
struct Thermostat;

impl Component for Thermostat {
    fn properties(&self, props: &mut PropertySet) {
        props
            .value("Measured", 0.0f64, &[PropertyTag::Input])
            .value("Power", 0.0f64, &[PropertyTag::Output, PropertyTag::VisualizationOnChange])
            .value("Target", 21.0f64, &[PropertyTag::Parameter])
            .value("Gain", 0.4f64, &[PropertyTag::Parameter])
            .value("MaxPower", 2.0f64, &[PropertyTag::Parameter]);
    }

    fn on_step(&mut self, ctx: &mut ComponentContext) -> SimResult<()> {
        let error = ctx.read::<f64>("Target")? - ctx.read::<f64>("Measured")?;
        let power = (error * ctx.read::<f64>("Gain")?).clamp(0.0, ctx.read::<f64>("MaxPower")?);
        if (power - ctx.read::<f64>("Power")?).abs() > f64::EPSILON {
            ctx.write("Power", power)?;
        }
        if ctx.time() % 10 == 0 {
            ctx.log_debug(&format!("error {:.2}, power {:.2}", error, power));
        }
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .init();

    let memory = MemoryVisualizer::new();
    let mut sim = Simulation::fixed_step(SolverConfig::new().with_end_time(60))?.with_visualizer(memory.clone());
    sim.add_named_component("Room", Room)?;
    sim.add_named_component("Thermostat", Thermostat)?;
    sim.connect(
        PropertyRef::new("Room", "Temperature"),
        PropertyRef::new("Thermostat", "Measured"),
    )?;
    sim.connect(
        PropertyRef::new("Thermostat", "Power"),
        PropertyRef::new("Room", "Power"),
    )?;
    sim.set_parameter_text("Thermostat", "Target", "20.5")?;

    sim.calculate_to(30);
    println!("t={} temperature {:.2}", sim.time(), sim.read::<f64>("Room", "Temperature")?);

    sim.calculate_finish();
    println!(
        "t={} temperature {} ({:?})",
        sim.time(),
        sim.result("temperature").unwrap_or("-"),
        sim.finish_reason()
    );

    for record in memory.records().iter().filter(|record| record.timestamp % 10 == 0) {
        println!("  {}", record.to_line());
    }
    Ok(())
}
