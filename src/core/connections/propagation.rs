use crate::core::components::ComponentSlot;
use crate::core::connections::connection::{Connection, ConnectionKind};
use crate::core::error::{SimError, SimResult};
use crate::core::types::ConnectionId;
use crate::core::values::{Channel, Notification};
use log::{trace, warn};
use std::any::Any;
use std::collections::{HashSet, VecDeque};

/// Evaluation phase a propagated change asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Evaluate the component as a primary event at the current time
    Primary,
    /// Evaluate the component after the primary work at the current time
    AfterTime,
}

/// Component that must be evaluated because a connection delivered a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Obligation {
    pub component: String,
    pub phase: Phase,
}

/// Drain every pending notification through the connection graph.
///
/// Notifications are processed first in, first out. A delivered value is
/// a notifying write on the receiving cell, so its notification joins the
/// queue and the change ripples downstream within the same drain. Each
/// connection fires at most once per channel and drain.
pub fn propagate(slots: &mut [ComponentSlot], connections: &[Connection]) -> Vec<Obligation> {
    let mut queue: VecDeque<(String, Notification)> = VecDeque::new();
    for position in 0..slots.len() {
        enqueue(slots, position, &mut queue);
    }

    let mut fired: HashSet<(ConnectionId, Channel)> = HashSet::new();
    let mut obligations = Vec::new();

    while let Some((component, note)) = queue.pop_front() {
        for conn in connections {
            let applies = match note.channel {
                Channel::Forward => {
                    conn.source().component == component && conn.source().property == note.property
                }
                Channel::Feedback => {
                    conn.is_feedback()
                        && conn.target().component == component
                        && conn.target().property == note.property
                }
            };
            if !applies || !fired.insert((conn.id(), note.channel)) {
                continue;
            }

            let delivered = match note.channel {
                Channel::Forward => deliver_forward(slots, conn),
                Channel::Feedback => deliver_feedback(slots, conn),
            };
            match delivered {
                Ok(Some((position, obligation))) => {
                    trace!("Propagated {} ({:?})", conn, note.channel);
                    obligations.push(obligation);
                    enqueue(slots, position, &mut queue);
                }
                Ok(None) => {}
                Err(err) => warn!("Connection {} could not deliver: {}", conn, err),
            }
        }
    }

    obligations
}

fn enqueue(slots: &mut [ComponentSlot], position: usize, queue: &mut VecDeque<(String, Notification)>) {
    let slot = &mut slots[position];
    for note in slot.properties.take_notifications() {
        queue.push_back((slot.name.clone(), note));
    }
}

fn position_of(slots: &[ComponentSlot], name: &str) -> Option<usize> {
    slots.iter().position(|slot| slot.name == name)
}

/// Copy the source value into the target and schedule the target
fn deliver_forward(slots: &mut [ComponentSlot], conn: &Connection) -> SimResult<Option<(usize, Obligation)>> {
    let (Some(source), Some(target)) = (
        position_of(slots, &conn.source().component),
        position_of(slots, &conn.target().component),
    ) else {
        warn!("Skipping connection {}: endpoint component not found", conn);
        return Ok(None);
    };

    let cell = slots[source]
        .properties
        .get(&conn.source().property)
        .ok_or_else(|| SimError::UnknownProperty {
            component: conn.source().component.clone(),
            property: conn.source().property.clone(),
        })?;
    let value: Box<dyn Any + Send> = match conn.kind() {
        ConnectionKind::Forward { coerce: true } => Box::new(cell.read_as_text()),
        _ => cell.clone_value(),
    };

    slots[target].properties.deliver(&conn.target().property, value)?;
    Ok(Some((
        target,
        Obligation {
            component: slots[target].name.clone(),
            phase: Phase::Primary,
        },
    )))
}

/// Copy the target's feedback value back into the source and schedule the
/// source after time
fn deliver_feedback(slots: &mut [ComponentSlot], conn: &Connection) -> SimResult<Option<(usize, Obligation)>> {
    let (Some(source), Some(target)) = (
        position_of(slots, &conn.source().component),
        position_of(slots, &conn.target().component),
    ) else {
        warn!("Skipping feedback of {}: endpoint component not found", conn);
        return Ok(None);
    };

    let feedback = slots[target]
        .properties
        .get(&conn.target().property)
        .and_then(|cell| cell.clone_feedback())
        .ok_or_else(|| SimError::InvalidConnection(format!("{} has no feedback value", conn.target())))?;

    slots[source]
        .properties
        .deliver_feedback(&conn.source().property, feedback)?;
    Ok(Some((
        source,
        Obligation {
            component: slots[source].name.clone(),
            phase: Phase::AfterTime,
        },
    )))
}
