use crate::core::components::ComponentSlot;
use crate::core::connections::connection::{Connection, ConnectionKind};
use crate::core::error::{SimError, SimResult};
use crate::core::types::PropertyRef;
use crate::core::values::{PropertyCell, PropertyTag};
use std::any::TypeId;

/// Build-time checks for connections.
///
/// Every configuration error is reported here, before a connection exists,
/// so propagation never has to deal with mismatched endpoints.
pub struct ConnectionValidator;

impl ConnectionValidator {
    /// Validate a forward connection and decide whether it coerces to text
    pub fn validate_forward(
        slots: &[ComponentSlot],
        connections: &[Connection],
        source: &PropertyRef,
        target: &PropertyRef,
    ) -> SimResult<ConnectionKind> {
        let (source_cell, target_cell) = Self::validate_endpoints(slots, source, target)?;
        Self::check_driver_collision(connections, target)?;

        if source_cell.value_type_id() == target_cell.value_type_id() {
            Ok(ConnectionKind::Forward { coerce: false })
        } else if target_cell.value_type_id() == TypeId::of::<String>() {
            Ok(ConnectionKind::Forward { coerce: true })
        } else {
            Err(SimError::TypeMismatch {
                expected: target_cell.value_type().to_string(),
                found: source_cell.value_type().to_string(),
            })
        }
    }

    /// Validate a feedback connection: both ends carry a feedback slot and
    /// both channels agree on their types
    pub fn validate_feedback(
        slots: &[ComponentSlot],
        connections: &[Connection],
        source: &PropertyRef,
        target: &PropertyRef,
    ) -> SimResult<ConnectionKind> {
        let (source_cell, target_cell) = Self::validate_endpoints(slots, source, target)?;
        Self::check_driver_collision(connections, target)?;

        if !source_cell.is_feedback() || !target_cell.is_feedback() {
            return Err(SimError::InvalidConnection(format!(
                "Feedback connection {} -> {} needs feedback properties on both ends",
                source, target
            )));
        }
        if source_cell.value_type_id() != target_cell.value_type_id() {
            return Err(SimError::TypeMismatch {
                expected: target_cell.value_type().to_string(),
                found: source_cell.value_type().to_string(),
            });
        }
        if source_cell.feedback_type_id() != target_cell.feedback_type_id() {
            return Err(SimError::TypeMismatch {
                expected: source_cell.feedback_type().unwrap_or("unknown").to_string(),
                found: target_cell.feedback_type().unwrap_or("unknown").to_string(),
            });
        }
        Ok(ConnectionKind::Feedback)
    }

    fn validate_endpoints<'a>(
        slots: &'a [ComponentSlot],
        source: &PropertyRef,
        target: &PropertyRef,
    ) -> SimResult<(&'a dyn PropertyCell, &'a dyn PropertyCell)> {
        let source_cell = Self::resolve(slots, source)?;
        let target_cell = Self::resolve(slots, target)?;

        if !source_cell.tags().contains(PropertyTag::Output) {
            return Err(SimError::InvalidConnection(format!(
                "Source property {} is not tagged Output",
                source
            )));
        }
        if !target_cell.tags().contains(PropertyTag::Input) {
            return Err(SimError::InvalidConnection(format!(
                "Target property {} is not tagged Input",
                target
            )));
        }
        Ok((source_cell, target_cell))
    }

    /// Find the cell a property reference points at
    pub fn resolve<'a>(slots: &'a [ComponentSlot], property: &PropertyRef) -> SimResult<&'a dyn PropertyCell> {
        let slot = slots
            .iter()
            .find(|slot| slot.name() == property.component)
            .ok_or_else(|| SimError::UnknownComponent(property.component.clone()))?;
        slot.properties()
            .get(&property.property)
            .ok_or_else(|| SimError::UnknownProperty {
                component: property.component.clone(),
                property: property.property.clone(),
            })
    }

    /// Check if a target property is already driven (multiple drivers not allowed)
    pub fn check_driver_collision(connections: &[Connection], target: &PropertyRef) -> SimResult<()> {
        if let Some(existing) = connections.iter().find(|conn| conn.target() == target) {
            return Err(SimError::InvalidConnection(format!(
                "Input property {} is already driven by {}. Multiple drivers not allowed.",
                target,
                existing.source()
            )));
        }
        Ok(())
    }
}
