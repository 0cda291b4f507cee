use crate::core::components::context::ComponentContext;
use crate::core::error::SimResult;
use crate::core::values::PropertySet;

/// User-defined unit of simulated behavior.
///
/// A component declares its connectable state once through [`Component::properties`]
/// and reacts to the solver through lifecycle callbacks. Every callback
/// defaults to a no-op, so an implementation overrides only what it needs.
///
/// Callbacks are invoked by the active solver only:
/// - `initialize` and `start` run once, before the first event or tick
/// - `on_discrete_event` runs once per primary event (discrete solver)
/// - `on_post_event` runs once per after-time event (discrete solver)
/// - `on_step` runs once per tick, in creation-index order (fixed-step solver)
/// - `finish` runs once when the run ends
///
/// A returned `Err` is logged with the component's name and identity and the
/// run continues with the next unit of work.
pub trait Component: ComponentClone + Send {
    /// Declare the tagged properties of this component
    fn properties(&self, props: &mut PropertySet);

    /// Type name used for default naming and visualization records
    fn type_name(&self) -> String {
        short_type_name(std::any::type_name::<Self>())
    }

    fn initialize(&mut self, _ctx: &mut ComponentContext) -> SimResult<()> {
        Ok(())
    }

    fn start(&mut self, _ctx: &mut ComponentContext) -> SimResult<()> {
        Ok(())
    }

    fn on_discrete_event(&mut self, _ctx: &mut ComponentContext) -> SimResult<()> {
        Ok(())
    }

    fn on_step(&mut self, _ctx: &mut ComponentContext) -> SimResult<()> {
        Ok(())
    }

    fn on_post_event(&mut self, _ctx: &mut ComponentContext) -> SimResult<()> {
        Ok(())
    }

    fn finish(&mut self, _ctx: &mut ComponentContext) -> SimResult<()> {
        Ok(())
    }
}

/// Helper trait for cloning boxed components
pub trait ComponentClone {
    fn clone_component(&self) -> Box<dyn Component>;
}

impl<T> ComponentClone for T
where
    T: Component + Clone + 'static,
{
    fn clone_component(&self) -> Box<dyn Component> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn Component> {
    fn clone(&self) -> Self {
        self.clone_component()
    }
}

impl std::fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Component({})", self.type_name())
    }
}

/// Strip the module path (and generic arguments) from a type name
pub(crate) fn short_type_name(full: &str) -> String {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Probe;

    impl Component for Probe {
        fn properties(&self, _props: &mut PropertySet) {}
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("flowsim::core::Queue"), "Queue");
        assert_eq!(short_type_name("my::Buffer<alloc::string::String>"), "Buffer");
        assert_eq!(short_type_name("Plain"), "Plain");
    }

    #[test]
    fn test_default_type_name_and_clone() {
        let boxed: Box<dyn Component> = Box::new(Probe);
        assert_eq!(boxed.type_name(), "Probe");
        let copy = boxed.clone();
        assert_eq!(copy.type_name(), "Probe");
        assert_eq!(format!("{:?}", copy), "Component(Probe)");
    }
}
