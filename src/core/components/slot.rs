use crate::core::components::traits::Component;
use crate::core::types::{ComponentHandle, ComponentId, EnvironmentId, SolverId};
use crate::core::values::PropertySet;

/// A registered component together with its identity and its properties.
///
/// The environment owns slots in creation-index order. Environment and
/// solver are referenced by identity only.
#[derive(Debug, Clone)]
pub struct ComponentSlot {
    pub(crate) id: ComponentId,
    pub(crate) name: String,
    pub(crate) index: usize,
    pub(crate) type_name: String,
    pub(crate) display_name: Option<String>,
    pub(crate) environment: EnvironmentId,
    pub(crate) solver: SolverId,
    pub(crate) behaviour: Box<dyn Component>,
    pub(crate) properties: PropertySet,
}

impl ComponentSlot {
    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creation index, the default tie-break of simultaneous events
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Name appended to visualization records, if set
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn environment(&self) -> EnvironmentId {
        self.environment
    }

    pub fn solver(&self) -> SolverId {
        self.solver
    }

    pub fn properties(&self) -> &PropertySet {
        &self.properties
    }

    pub fn behaviour(&self) -> &dyn Component {
        self.behaviour.as_ref()
    }

    pub fn handle(&self) -> ComponentHandle {
        ComponentHandle::new(self.id, self.name.clone(), self.index)
    }

    pub(crate) fn rename(&mut self, name: &str) {
        self.name = name.to_string();
        self.properties.set_parent(name);
    }
}
