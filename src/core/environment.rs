use crate::core::components::{Component, ComponentSlot};
use crate::core::connections::auto_connect::candidates;
use crate::core::connections::{propagate, Connection, ConnectionValidator, Obligation};
use crate::core::error::{SimError, SimResult};
use crate::core::types::{ComponentHandle, ComponentId, ConnectionId, EnvironmentId, PropertyRef, SolverId};
use crate::core::values::PropertySet;
use log::{debug, warn};
use std::collections::HashSet;

/// Owner of the components and connections of one simulation run.
///
/// Components are kept ordered by creation index. Lookups are linear scans,
/// component counts being small next to event counts.
#[derive(Debug, Clone)]
pub struct Environment {
    id: EnvironmentId,
    pub(crate) slots: Vec<ComponentSlot>,
    pub(crate) connections: Vec<Connection>,
    next_index: usize,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            id: EnvironmentId::new(),
            slots: Vec::new(),
            connections: Vec::new(),
            next_index: 0,
        }
    }

    pub fn id(&self) -> EnvironmentId {
        self.id
    }

    /// Register a component. Without an explicit name it is called
    /// `<TypeName><creation index>`.
    pub(crate) fn add_component(
        &mut self,
        behaviour: Box<dyn Component>,
        name: Option<&str>,
        solver: SolverId,
    ) -> SimResult<ComponentHandle> {
        let index = self.next_index;
        let type_name = behaviour.type_name();
        let name = match name {
            Some(name) => name.to_string(),
            None => format!("{}{}", type_name, index),
        };
        if self.contains(&name) {
            return Err(SimError::DuplicateComponent(name));
        }

        let mut properties = PropertySet::new();
        behaviour.properties(&mut properties);
        if let Some(err) = properties.take_declaration_errors().into_iter().next() {
            return Err(err);
        }
        properties.set_parent(&name);

        let slot = ComponentSlot {
            id: ComponentId::new(),
            name,
            index,
            type_name,
            display_name: None,
            environment: self.id,
            solver,
            behaviour,
            properties,
        };
        let handle = slot.handle();
        debug!("Added component {} (index {}, {} properties)", handle.name(), index, slot.properties.len());

        self.slots.push(slot);
        self.next_index += 1;
        Ok(handle)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.iter().any(|slot| slot.name == name)
    }

    pub fn component(&self, name: &str) -> Option<&ComponentSlot> {
        self.slots.iter().find(|slot| slot.name == name)
    }

    pub fn component_by_id(&self, id: ComponentId) -> Option<&ComponentSlot> {
        self.slots.iter().find(|slot| slot.id == id)
    }

    /// Components whose name contains `fragment`
    pub fn components_containing(&self, fragment: &str) -> Vec<&ComponentSlot> {
        self.slots.iter().filter(|slot| slot.name.contains(fragment)).collect()
    }

    /// All components in creation-index order
    pub fn components(&self) -> &[ComponentSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.name == name)
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|conn| conn.id() == id)
    }

    /// Components feeding values into `name`
    pub fn upstream(&self, name: &str) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.connections
            .iter()
            .filter(|conn| conn.target().component == name)
            .map(|conn| conn.source().component.as_str())
            .filter(|source| seen.insert(*source))
            .collect()
    }

    /// Components receiving values from `name`
    pub fn downstream(&self, name: &str) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.connections
            .iter()
            .filter(|conn| conn.source().component == name)
            .map(|conn| conn.target().component.as_str())
            .filter(|target| seen.insert(*target))
            .collect()
    }

    /// Components on the other end of every connection attached to one property
    pub fn connected_components(&self, component: &str, property: &str) -> Vec<String> {
        let here = PropertyRef::new(component, property);
        let mut found: Vec<String> = Vec::new();
        for conn in &self.connections {
            let other = if conn.source() == &here {
                &conn.target().component
            } else if conn.target() == &here {
                &conn.source().component
            } else {
                continue;
            };
            if !found.contains(other) {
                found.push(other.clone());
            }
        }
        found
    }

    pub fn properties(&self, component: &str) -> SimResult<&PropertySet> {
        self.component(component)
            .map(|slot| &slot.properties)
            .ok_or_else(|| SimError::UnknownComponent(component.to_string()))
    }

    pub(crate) fn properties_mut(&mut self, component: &str) -> SimResult<&mut PropertySet> {
        self.slots
            .iter_mut()
            .find(|slot| slot.name == component)
            .map(|slot| &mut slot.properties)
            .ok_or_else(|| SimError::UnknownComponent(component.to_string()))
    }

    fn slot_mut(&mut self, name: &str) -> SimResult<&mut ComponentSlot> {
        self.slots
            .iter_mut()
            .find(|slot| slot.name == name)
            .ok_or_else(|| SimError::UnknownComponent(name.to_string()))
    }

    pub(crate) fn slot_at_mut(&mut self, position: usize) -> Option<&mut ComponentSlot> {
        self.slots.get_mut(position)
    }

    pub fn set_display_name(&mut self, name: &str, display_name: &str) -> SimResult<()> {
        self.slot_mut(name)?.display_name = Some(display_name.to_string());
        Ok(())
    }

    /// Override a creation index, keeping the collection ordered
    pub fn set_index(&mut self, name: &str, index: usize) -> SimResult<()> {
        if let Some(other) = self.slots.iter().find(|slot| slot.index == index && slot.name != name) {
            return Err(SimError::DuplicateIndex {
                index,
                component: other.name.clone(),
            });
        }
        self.slot_mut(name)?.index = index;
        self.slots.sort_by_key(|slot| slot.index);
        self.next_index = self.next_index.max(index + 1);
        Ok(())
    }

    /// Rename a component and every connection endpoint that refers to it
    pub(crate) fn rename(&mut self, old: &str, new: &str) -> SimResult<ComponentHandle> {
        if old != new && self.contains(new) {
            return Err(SimError::DuplicateComponent(new.to_string()));
        }
        let slot = self.slot_mut(old)?;
        slot.rename(new);
        let handle = slot.handle();
        for conn in &mut self.connections {
            conn.rename_component(old, new);
        }
        debug!("Renamed component {} to {}", old, new);
        Ok(handle)
    }

    pub fn connect(&mut self, source: PropertyRef, target: PropertyRef) -> SimResult<ConnectionId> {
        let kind = ConnectionValidator::validate_forward(&self.slots, &self.connections, &source, &target)?;
        Ok(self.push_connection(Connection::new(self.id, source, target, kind, false)))
    }

    pub fn connect_feedback(&mut self, source: PropertyRef, target: PropertyRef) -> SimResult<ConnectionId> {
        let kind = ConnectionValidator::validate_feedback(&self.slots, &self.connections, &source, &target)?;
        Ok(self.push_connection(Connection::new(self.id, source, target, kind, false)))
    }

    /// Wire two components by matching property names in both directions.
    /// Pairs that fail validation are skipped.
    pub fn auto_connect(&mut self, a: &str, b: &str) -> SimResult<Vec<ConnectionId>> {
        let slot_a = self.component(a).ok_or_else(|| SimError::UnknownComponent(a.to_string()))?;
        let slot_b = self.component(b).ok_or_else(|| SimError::UnknownComponent(b.to_string()))?;
        let found = candidates(slot_a, slot_b);

        let mut created = Vec::new();
        for candidate in found {
            let validated = if candidate.feedback {
                ConnectionValidator::validate_feedback(
                    &self.slots,
                    &self.connections,
                    &candidate.source,
                    &candidate.target,
                )
            } else {
                ConnectionValidator::validate_forward(
                    &self.slots,
                    &self.connections,
                    &candidate.source,
                    &candidate.target,
                )
            };
            match validated {
                Ok(kind) => {
                    let conn = Connection::new(self.id, candidate.source, candidate.target, kind, true);
                    created.push(self.push_connection(conn));
                }
                Err(err) => warn!(
                    "Skipping {} -> {} while connecting {} and {}: {}",
                    candidate.source, candidate.target, a, b, err
                ),
            }
        }
        Ok(created)
    }

    fn push_connection(&mut self, conn: Connection) -> ConnectionId {
        debug!("Connected {}", conn);
        let id = conn.id();
        self.connections.push(conn);
        id
    }

    /// Drain pending notifications through the connection graph
    pub(crate) fn propagate(&mut self) -> Vec<Obligation> {
        propagate(&mut self.slots, &self.connections)
    }

    /// Point every component at a new solver
    pub(crate) fn bind_solver(&mut self, solver: SolverId) {
        for slot in &mut self.slots {
            slot.solver = solver;
        }
    }

    /// Give this environment and everything it owns fresh identities
    pub(crate) fn assign_fresh_ids(&mut self, solver: SolverId) {
        self.id = EnvironmentId::new();
        for slot in &mut self.slots {
            slot.id = ComponentId::new();
            slot.environment = self.id;
            slot.solver = solver;
        }
        for conn in &mut self.connections {
            conn.id = ConnectionId::new();
            conn.environment = self.id;
        }
    }

    /// Check that every identity reference and every connection endpoint
    /// is consistent with this environment and `solver`
    pub(crate) fn validate(&self, solver: SolverId) -> SimResult<()> {
        let mut names = HashSet::new();
        let mut indices = HashSet::new();
        for slot in &self.slots {
            if !names.insert(slot.name.as_str()) {
                return Err(SimError::InvalidSnapshot(format!("duplicate component name {}", slot.name)));
            }
            if !indices.insert(slot.index) {
                return Err(SimError::InvalidSnapshot(format!("duplicate creation index {}", slot.index)));
            }
            if slot.environment != self.id {
                return Err(SimError::InvalidSnapshot(format!(
                    "component {} belongs to environment {}",
                    slot.name, slot.environment
                )));
            }
            if slot.solver != solver {
                return Err(SimError::InvalidSnapshot(format!(
                    "component {} is bound to solver {}",
                    slot.name, slot.solver
                )));
            }
        }
        for conn in &self.connections {
            if conn.environment() != self.id {
                return Err(SimError::InvalidSnapshot(format!(
                    "connection {} belongs to environment {}",
                    conn,
                    conn.environment()
                )));
            }
            for end in [conn.source(), conn.target()] {
                ConnectionValidator::resolve(&self.slots, end)
                    .map_err(|err| SimError::InvalidSnapshot(format!("connection {}: {}", conn, err)))?;
            }
        }
        Ok(())
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
