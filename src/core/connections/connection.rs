use crate::core::types::{ConnectionId, EnvironmentId, PropertyRef};
use serde::{Deserialize, Serialize};

/// How a connection moves values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionKind {
    /// Source value copied into the target. With `coerce` the target is a
    /// text cell and receives the source's text form.
    Forward { coerce: bool },
    /// Forward copy plus a backward edge from the target's feedback slot to
    /// the source's feedback slot
    Feedback,
}

/// Directed edge between two named properties.
///
/// Endpoints are resolved by name through the environment every time the
/// connection is evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub(crate) id: ConnectionId,
    pub(crate) environment: EnvironmentId,
    pub(crate) source: PropertyRef,
    pub(crate) target: PropertyRef,
    pub(crate) kind: ConnectionKind,
    /// Created by a component-to-component name match
    pub(crate) component_connection: bool,
}

impl Connection {
    pub(crate) fn new(
        environment: EnvironmentId,
        source: PropertyRef,
        target: PropertyRef,
        kind: ConnectionKind,
        component_connection: bool,
    ) -> Self {
        Self {
            id: ConnectionId::new(),
            environment,
            source,
            target,
            kind,
            component_connection,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn environment(&self) -> EnvironmentId {
        self.environment
    }

    pub fn source(&self) -> &PropertyRef {
        &self.source
    }

    pub fn target(&self) -> &PropertyRef {
        &self.target
    }

    pub fn kind(&self) -> ConnectionKind {
        self.kind
    }

    pub fn is_feedback(&self) -> bool {
        self.kind == ConnectionKind::Feedback
    }

    pub fn is_component_connection(&self) -> bool {
        self.component_connection
    }

    /// Whether either endpoint belongs to `component`
    pub fn touches(&self, component: &str) -> bool {
        self.source.component == component || self.target.component == component
    }

    pub(crate) fn rename_component(&mut self, old: &str, new: &str) {
        if self.source.component == old {
            self.source.component = new.to_string();
        }
        if self.target.component == old {
            self.target.component = new.to_string();
        }
    }
}

impl std::fmt::Display for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let arrow = match self.kind {
            ConnectionKind::Feedback => "<=>",
            ConnectionKind::Forward { .. } => "->",
        };
        write!(f, "{} {} {}", self.source, arrow, self.target)
    }
}
