use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Logical simulation time
pub type SimTime = i64;

macro_rules! identity_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a fresh, process-unique identity
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Get the underlying uuid
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

identity_type!(
    /// Identity of one environment
    EnvironmentId
);
identity_type!(
    /// Identity of one solver instance
    SolverId
);
identity_type!(
    /// Identity of one component
    ComponentId
);
identity_type!(
    /// Identity of one connection
    ConnectionId
);
identity_type!(
    /// Identity of one scheduled event
    EventId
);

/// Handle returned when a component is added to an environment.
///
/// The handle captures the name at registration time. After a rename,
/// build new handles through [`ComponentHandle::renamed`] or look the
/// component up again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentHandle {
    pub(crate) id: ComponentId,
    pub(crate) name: String,
    pub(crate) index: usize,
}

impl ComponentHandle {
    pub(crate) fn new(id: ComponentId, name: String, index: usize) -> Self {
        Self { id, name, index }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creation index of the component
    pub fn index(&self) -> usize {
        self.index
    }

    /// Reference to one of the component's properties
    pub fn property(&self, property: &str) -> PropertyRef {
        PropertyRef::new(&self.name, property)
    }

    /// Same component under a new name
    pub fn renamed(&self, name: &str) -> Self {
        Self {
            id: self.id,
            name: name.to_string(),
            index: self.index,
        }
    }
}

impl std::fmt::Display for ComponentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Name-based reference to a property of a component
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyRef {
    pub component: String,
    pub property: String,
}

impl PropertyRef {
    pub fn new(component: &str, property: &str) -> Self {
        Self {
            component: component.to_string(),
            property: property.to_string(),
        }
    }
}

impl std::fmt::Display for PropertyRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\\{}", self.component, self.property)
    }
}
