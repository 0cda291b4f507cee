use crate::core::error::{SimError, SimResult};
use crate::core::values::cell_value::CellValue;
use crate::core::values::tags::{PropertyTag, TagSet};
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};

/// Kind of evaluation a change notification asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Forward value change, evaluated as a primary event
    DiscreteCalculation,
    /// Feedback value change, evaluated after the primary work of a timestamp
    PostCalculation,
}

/// Type-erased view of a value cell.
///
/// Connections and the solvers work through this trait. Typed access goes
/// through `value_any`/`store` with a `TypeId` check on every write.
pub trait PropertyCell: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// Name of the owning component
    fn parent(&self) -> &str;

    fn set_parent(&mut self, parent: &str);

    fn tags(&self) -> &TagSet;

    fn value_type(&self) -> &'static str;

    fn value_type_id(&self) -> TypeId;

    fn feedback_type(&self) -> Option<&'static str> {
        None
    }

    fn feedback_type_id(&self) -> Option<TypeId> {
        None
    }

    fn is_feedback(&self) -> bool {
        self.feedback_type_id().is_some()
    }

    fn is_changed(&self) -> bool;

    fn is_feedback_changed(&self) -> bool {
        false
    }

    /// Clear both changed flags
    fn clear_changed(&mut self);

    fn value_any(&self) -> &dyn Any;

    fn feedback_any(&self) -> Option<&dyn Any> {
        None
    }

    /// Clone the current value into a box
    fn clone_value(&self) -> Box<dyn Any + Send>;

    fn clone_feedback(&self) -> Option<Box<dyn Any + Send>> {
        None
    }

    /// Replace the value and set the changed flag
    fn store(&mut self, value: Box<dyn Any + Send>) -> SimResult<()>;

    /// Replace the feedback value and set the feedback changed flag
    fn store_feedback(&mut self, _value: Box<dyn Any + Send>) -> SimResult<()> {
        Err(SimError::InvalidConnection(format!(
            "Property '{}' of '{}' has no feedback slot",
            self.name(),
            self.parent()
        )))
    }

    fn read_as_text(&self) -> String;

    fn read_feedback_as_text(&self) -> Option<String> {
        None
    }

    /// Parse `text` and store it as the new value
    fn write_from_text(&mut self, text: &str) -> SimResult<()>;

    fn clone_cell(&self) -> Box<dyn PropertyCell>;
}

fn downcast_value<T: CellValue>(value: Box<dyn Any + Send>) -> SimResult<T> {
    value
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| SimError::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
            found: "a value of another type".to_string(),
        })
}

/// Observable container for one piece of component state
#[derive(Debug, Clone)]
pub struct ValueCell<T: CellValue> {
    name: String,
    parent: String,
    tags: TagSet,
    value: T,
    changed: bool,
}

impl<T: CellValue> ValueCell<T> {
    pub fn new(name: &str, value: T, tags: &[PropertyTag]) -> Self {
        Self {
            name: name.to_string(),
            parent: String::new(),
            tags: TagSet::new(tags),
            value,
            changed: false,
        }
    }

    pub fn read(&self) -> T {
        self.value.clone()
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Set the value and mark the cell changed. Notifying connections is
    /// left to the owning `PropertySet`.
    pub fn set(&mut self, value: T) {
        self.value = value;
        self.changed = true;
    }
}

impl<T: CellValue> PropertyCell for ValueCell<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn parent(&self) -> &str {
        &self.parent
    }

    fn set_parent(&mut self, parent: &str) {
        self.parent = parent.to_string();
    }

    fn tags(&self) -> &TagSet {
        &self.tags
    }

    fn value_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn value_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn is_changed(&self) -> bool {
        self.changed
    }

    fn clear_changed(&mut self) {
        self.changed = false;
    }

    fn value_any(&self) -> &dyn Any {
        &self.value
    }

    fn clone_value(&self) -> Box<dyn Any + Send> {
        Box::new(self.value.clone())
    }

    fn store(&mut self, value: Box<dyn Any + Send>) -> SimResult<()> {
        let value = downcast_value::<T>(value)?;
        self.set(value);
        Ok(())
    }

    fn read_as_text(&self) -> String {
        self.value.to_text()
    }

    fn write_from_text(&mut self, text: &str) -> SimResult<()> {
        let value = T::from_text(text).ok_or_else(|| SimError::TextConversion {
            property: self.name.clone(),
            text: text.to_string(),
        })?;
        self.set(value);
        Ok(())
    }

    fn clone_cell(&self) -> Box<dyn PropertyCell> {
        Box::new(self.clone())
    }
}

/// Value cell with a second, independently typed backward slot.
///
/// The forward value flows source to target, the feedback value flows
/// target to source.
#[derive(Debug, Clone)]
pub struct FeedbackCell<T: CellValue, F: CellValue> {
    name: String,
    parent: String,
    tags: TagSet,
    value: T,
    changed: bool,
    feedback: F,
    feedback_changed: bool,
}

impl<T: CellValue, F: CellValue> FeedbackCell<T, F> {
    pub fn new(name: &str, value: T, feedback: F, tags: &[PropertyTag]) -> Self {
        Self {
            name: name.to_string(),
            parent: String::new(),
            tags: TagSet::new(tags),
            value,
            changed: false,
            feedback,
            feedback_changed: false,
        }
    }

    pub fn read(&self) -> T {
        self.value.clone()
    }

    pub fn read_feedback(&self) -> F {
        self.feedback.clone()
    }

    pub fn set(&mut self, value: T) {
        self.value = value;
        self.changed = true;
    }

    /// Set the backward value; only the feedback flag is raised
    pub fn set_feedback(&mut self, feedback: F) {
        self.feedback = feedback;
        self.feedback_changed = true;
    }
}

impl<T: CellValue, F: CellValue> PropertyCell for FeedbackCell<T, F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn parent(&self) -> &str {
        &self.parent
    }

    fn set_parent(&mut self, parent: &str) {
        self.parent = parent.to_string();
    }

    fn tags(&self) -> &TagSet {
        &self.tags
    }

    fn value_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn value_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn feedback_type(&self) -> Option<&'static str> {
        Some(std::any::type_name::<F>())
    }

    fn feedback_type_id(&self) -> Option<TypeId> {
        Some(TypeId::of::<F>())
    }

    fn is_changed(&self) -> bool {
        self.changed
    }

    fn is_feedback_changed(&self) -> bool {
        self.feedback_changed
    }

    fn clear_changed(&mut self) {
        self.changed = false;
        self.feedback_changed = false;
    }

    fn value_any(&self) -> &dyn Any {
        &self.value
    }

    fn feedback_any(&self) -> Option<&dyn Any> {
        Some(&self.feedback)
    }

    fn clone_value(&self) -> Box<dyn Any + Send> {
        Box::new(self.value.clone())
    }

    fn clone_feedback(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.feedback.clone()))
    }

    fn store(&mut self, value: Box<dyn Any + Send>) -> SimResult<()> {
        let value = downcast_value::<T>(value)?;
        self.set(value);
        Ok(())
    }

    fn store_feedback(&mut self, value: Box<dyn Any + Send>) -> SimResult<()> {
        let feedback = downcast_value::<F>(value)?;
        self.set_feedback(feedback);
        Ok(())
    }

    fn read_as_text(&self) -> String {
        self.value.to_text()
    }

    fn read_feedback_as_text(&self) -> Option<String> {
        Some(self.feedback.to_text())
    }

    fn write_from_text(&mut self, text: &str) -> SimResult<()> {
        let value = T::from_text(text).ok_or_else(|| SimError::TextConversion {
            property: self.name.clone(),
            text: text.to_string(),
        })?;
        self.set(value);
        Ok(())
    }

    fn clone_cell(&self) -> Box<dyn PropertyCell> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_sets_value_and_changed() {
        let mut cell = ValueCell::new("Val", 1i64, &[PropertyTag::Output]);
        assert!(!cell.is_changed());

        cell.store(Box::new(5i64)).unwrap();
        assert!(cell.is_changed());
        assert_eq!(cell.read(), 5);
        assert_eq!(cell.read_as_text(), "5");
    }

    #[test]
    fn test_set_marks_changed_until_cleared() {
        let mut cell = ValueCell::new("Val", 0u32, &[]);
        cell.set(9);
        assert!(cell.is_changed());
        cell.clear_changed();
        assert!(!cell.is_changed());
        assert_eq!(cell.read(), 9);
    }

    #[test]
    fn test_store_rejects_wrong_type() {
        let mut cell = ValueCell::new("Val", 0i64, &[]);
        let result = cell.store(Box::new("text".to_string()));
        assert!(matches!(result, Err(SimError::TypeMismatch { .. })));
        assert_eq!(cell.read(), 0);
        assert!(!cell.is_changed());
    }

    #[test]
    fn test_text_access() {
        let mut cell = ValueCell::new("Rate", 1.5f64, &[PropertyTag::Parameter]);
        assert_eq!(cell.read_as_text(), "1.5");
        cell.write_from_text("2.25").unwrap();
        assert_eq!(cell.read(), 2.25);
        assert!(cell.write_from_text("fast").is_err());
    }

    #[test]
    fn test_feedback_slot_is_independent() {
        let mut cell = FeedbackCell::new("Link", 0i32, false, &[PropertyTag::Output]);
        cell.store_feedback(Box::new(true)).unwrap();
        assert!(cell.is_feedback_changed());
        assert!(!cell.is_changed());
        assert!(cell.read_feedback());
        assert_eq!(cell.read_feedback_as_text(), Some("true".to_string()));

        cell.clear_changed();
        assert!(!cell.is_feedback_changed());
    }

    #[test]
    fn test_cloned_cell_keeps_value() {
        let mut cell = ValueCell::new("Val", 3i64, &[PropertyTag::Output]);
        cell.set_parent("Src0");
        let copy = cell.clone_cell();
        assert_eq!(copy.parent(), "Src0");
        assert_eq!(copy.value_any().downcast_ref::<i64>(), Some(&3));
    }
}
