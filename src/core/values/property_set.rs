use crate::core::error::{SimError, SimResult};
use crate::core::values::cell::{EventKind, FeedbackCell, PropertyCell, ValueCell};
use crate::core::values::cell_value::CellValue;
use crate::core::values::tags::PropertyTag;
use std::any::TypeId;

/// Channel of a property a change travels on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Forward,
    Feedback,
}

/// Pending change of one property, drained by the active solver.
///
/// `old` and `new` hold the text form of the written slot before and after
/// the write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub property: String,
    pub channel: Channel,
    pub kind: EventKind,
    pub old: String,
    pub new: String,
}

/// All properties of one component, declared explicitly at registration.
///
/// Notifying writes append a [`Notification`] to the outbox instead of
/// calling handlers; the solver drains the outbox after each callback.
#[derive(Debug, Default)]
pub struct PropertySet {
    cells: Vec<Box<dyn PropertyCell>>,
    outbox: Vec<Notification>,
    declaration_errors: Vec<SimError>,
}

impl Clone for PropertySet {
    fn clone(&self) -> Self {
        Self {
            cells: self.cells.iter().map(|cell| cell.clone_cell()).collect(),
            outbox: self.outbox.clone(),
            declaration_errors: self.declaration_errors.clone(),
        }
    }
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a plain value cell
    pub fn value<T: CellValue>(&mut self, name: &str, initial: T, tags: &[PropertyTag]) -> &mut Self {
        self.declare(Box::new(ValueCell::new(name, initial, tags)))
    }

    /// Declare a cell with a forward value and a feedback value
    pub fn feedback<T: CellValue, F: CellValue>(
        &mut self,
        name: &str,
        initial: T,
        initial_feedback: F,
        tags: &[PropertyTag],
    ) -> &mut Self {
        self.declare(Box::new(FeedbackCell::new(name, initial, initial_feedback, tags)))
    }

    /// Declare an already constructed cell
    pub fn declare(&mut self, cell: Box<dyn PropertyCell>) -> &mut Self {
        if self.contains(cell.name()) {
            self.declaration_errors
                .push(SimError::DuplicateProperty(cell.name().to_string()));
        } else {
            self.cells.push(cell);
        }
        self
    }

    pub(crate) fn take_declaration_errors(&mut self) -> Vec<SimError> {
        std::mem::take(&mut self.declaration_errors)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cells.iter().any(|cell| cell.name() == name)
    }

    pub fn get(&self, name: &str) -> Option<&dyn PropertyCell> {
        self.cells
            .iter()
            .find(|cell| cell.name() == name)
            .map(|cell| cell.as_ref())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Box<dyn PropertyCell>> {
        self.cells.iter_mut().find(|cell| cell.name() == name)
    }

    fn cell(&self, name: &str) -> SimResult<&dyn PropertyCell> {
        self.get(name).ok_or_else(|| self.unknown(name))
    }

    fn cell_mut(&mut self, name: &str) -> SimResult<&mut Box<dyn PropertyCell>> {
        let parent = self.parent_name();
        self.get_mut(name).ok_or(SimError::UnknownProperty {
            component: parent,
            property: name.to_string(),
        })
    }

    fn unknown(&self, name: &str) -> SimError {
        SimError::UnknownProperty {
            component: self.parent_name(),
            property: name.to_string(),
        }
    }

    fn parent_name(&self) -> String {
        self.cells
            .first()
            .map(|cell| cell.parent().to_string())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn PropertyCell> + '_ {
        self.cells.iter().map(|cell| cell.as_ref())
    }

    /// Properties carrying `tag`
    pub fn with_tag(&self, tag: PropertyTag) -> impl Iterator<Item = &dyn PropertyCell> + '_ {
        self.iter().filter(move |cell| cell.tags().contains(tag))
    }

    pub fn names(&self) -> Vec<&str> {
        self.cells.iter().map(|cell| cell.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Read the forward value of a property
    pub fn read<T: CellValue>(&self, name: &str) -> SimResult<T> {
        let cell = self.cell(name)?;
        cell.value_any()
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| SimError::TypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
                found: cell.value_type().to_string(),
            })
    }

    /// Read the feedback value of a feedback property
    pub fn read_feedback<F: CellValue>(&self, name: &str) -> SimResult<F> {
        let cell = self.cell(name)?;
        let feedback = cell.feedback_any().ok_or_else(|| {
            SimError::InvalidConnection(format!("Property '{}' has no feedback slot", name))
        })?;
        feedback
            .downcast_ref::<F>()
            .cloned()
            .ok_or_else(|| SimError::TypeMismatch {
                expected: std::any::type_name::<F>().to_string(),
                found: cell.feedback_type().unwrap_or("unknown").to_string(),
            })
    }

    /// Write a value and queue a forward notification
    pub fn write<T: CellValue>(&mut self, name: &str, value: T) -> SimResult<()> {
        let old = self.slot_text(name, Channel::Forward)?;
        self.write_typed(name, value)?;
        self.notify(name, Channel::Forward, old)
    }

    /// Write a value without queueing a notification
    pub fn write_no_notify<T: CellValue>(&mut self, name: &str, value: T) -> SimResult<()> {
        self.write_typed(name, value)
    }

    /// Write the feedback slot and queue a feedback notification
    pub fn write_feedback<F: CellValue>(&mut self, name: &str, feedback: F) -> SimResult<()> {
        let cell = self.cell_mut(name)?;
        match cell.feedback_type_id() {
            Some(id) if id == TypeId::of::<F>() => {}
            Some(_) => {
                return Err(SimError::TypeMismatch {
                    expected: cell.feedback_type().unwrap_or("unknown").to_string(),
                    found: std::any::type_name::<F>().to_string(),
                })
            }
            None => {
                return Err(SimError::InvalidConnection(format!(
                    "Property '{}' has no feedback slot",
                    name
                )))
            }
        }
        let old = cell.read_feedback_as_text().unwrap_or_default();
        cell.store_feedback(Box::new(feedback))?;
        self.notify(name, Channel::Feedback, old)
    }

    /// Parse text into the property without queueing a notification
    pub fn write_text(&mut self, name: &str, text: &str) -> SimResult<()> {
        self.cell_mut(name)?.write_from_text(text)
    }

    fn write_typed<T: CellValue>(&mut self, name: &str, value: T) -> SimResult<()> {
        let cell = self.cell_mut(name)?;
        if cell.value_type_id() != TypeId::of::<T>() {
            return Err(SimError::TypeMismatch {
                expected: cell.value_type().to_string(),
                found: std::any::type_name::<T>().to_string(),
            });
        }
        cell.store(Box::new(value))
    }

    /// Store a value delivered by a connection; this is a notifying write
    pub(crate) fn deliver(&mut self, name: &str, value: Box<dyn std::any::Any + Send>) -> SimResult<()> {
        let old = self.slot_text(name, Channel::Forward)?;
        self.cell_mut(name)?.store(value)?;
        self.notify(name, Channel::Forward, old)
    }

    /// Store a feedback value delivered by a feedback connection
    pub(crate) fn deliver_feedback(
        &mut self,
        name: &str,
        feedback: Box<dyn std::any::Any + Send>,
    ) -> SimResult<()> {
        let old = self.slot_text(name, Channel::Feedback)?;
        self.cell_mut(name)?.store_feedback(feedback)?;
        self.notify(name, Channel::Feedback, old)
    }

    fn slot_text(&self, name: &str, channel: Channel) -> SimResult<String> {
        let cell = self.cell(name)?;
        Ok(match channel {
            Channel::Forward => cell.read_as_text(),
            Channel::Feedback => cell.read_feedback_as_text().unwrap_or_default(),
        })
    }

    fn notify(&mut self, name: &str, channel: Channel, old: String) -> SimResult<()> {
        let kind = match channel {
            Channel::Forward => EventKind::DiscreteCalculation,
            Channel::Feedback => EventKind::PostCalculation,
        };
        let new = self.slot_text(name, channel)?;
        self.outbox.push(Notification {
            property: name.to_string(),
            channel,
            kind,
            old,
            new,
        });
        Ok(())
    }

    pub fn is_changed(&self, name: &str) -> bool {
        self.get(name).map(|cell| cell.is_changed()).unwrap_or(false)
    }

    pub fn is_feedback_changed(&self, name: &str) -> bool {
        self.get(name)
            .map(|cell| cell.is_feedback_changed())
            .unwrap_or(false)
    }

    /// Clear the changed flags of every property
    pub fn clear_changed(&mut self) {
        for cell in &mut self.cells {
            cell.clear_changed();
        }
    }

    /// Pending notifications, oldest first
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.outbox)
    }

    pub fn has_notifications(&self) -> bool {
        !self.outbox.is_empty()
    }

    /// Point every cell at a new owner name
    pub(crate) fn set_parent(&mut self, parent: &str) {
        for cell in &mut self.cells {
            cell.set_parent(parent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> PropertySet {
        let mut props = PropertySet::new();
        props
            .value("Val", 0i64, &[PropertyTag::Output, PropertyTag::Visualization])
            .value("Label", String::new(), &[PropertyTag::Input])
            .feedback("Link", 0.0f64, 0i32, &[PropertyTag::Output]);
        props.set_parent("Comp0");
        props
    }

    #[test]
    fn test_declare_and_read() {
        let props = sample_set();
        assert_eq!(props.len(), 3);
        assert_eq!(props.read::<i64>("Val").unwrap(), 0);
        assert_eq!(props.read_feedback::<i32>("Link").unwrap(), 0);
        assert_eq!(props.with_tag(PropertyTag::Output).count(), 2);
    }

    #[test]
    fn test_duplicate_declaration_recorded() {
        let mut props = sample_set();
        props.value("Val", 1i64, &[]);
        assert_eq!(props.len(), 3);
        assert_eq!(
            props.take_declaration_errors(),
            vec![SimError::DuplicateProperty("Val".to_string())]
        );
    }

    #[test]
    fn test_write_queues_notification() {
        let mut props = sample_set();
        props.write("Val", 5i64).unwrap();
        props.write_no_notify("Label", "quiet".to_string()).unwrap();
        props.write_feedback("Link", 3i32).unwrap();

        let notes = props.take_notifications();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].property, "Val");
        assert_eq!(notes[0].channel, Channel::Forward);
        assert_eq!(notes[0].kind, EventKind::DiscreteCalculation);
        assert_eq!((notes[0].old.as_str(), notes[0].new.as_str()), ("0", "5"));
        assert_eq!(notes[1].property, "Link");
        assert_eq!(notes[1].channel, Channel::Feedback);
        assert_eq!(notes[1].kind, EventKind::PostCalculation);
        assert_eq!((notes[1].old.as_str(), notes[1].new.as_str()), ("0", "3"));
        assert!(props.is_changed("Label"));
        assert!(!props.has_notifications());
    }

    #[test]
    fn test_typed_errors() {
        let mut props = sample_set();
        assert!(matches!(
            props.write("Val", 1.0f64),
            Err(SimError::TypeMismatch { .. })
        ));
        assert!(matches!(
            props.read::<String>("Val"),
            Err(SimError::TypeMismatch { .. })
        ));
        assert!(matches!(
            props.write_feedback("Val", 1i32),
            Err(SimError::InvalidConnection(_))
        ));
        assert_eq!(
            props.read::<i64>("Missing"),
            Err(SimError::UnknownProperty {
                component: "Comp0".to_string(),
                property: "Missing".to_string()
            })
        );
    }

    #[test]
    fn test_clear_changed() {
        let mut props = sample_set();
        props.write("Val", 2i64).unwrap();
        props.write_feedback("Link", 1i32).unwrap();
        props.clear_changed();
        assert!(!props.is_changed("Val"));
        assert!(!props.is_feedback_changed("Link"));
    }
}
