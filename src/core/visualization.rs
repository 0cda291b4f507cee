use crate::core::components::ComponentSlot;
use crate::core::types::SimTime;
use crate::core::values::PropertyTag;
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

/// One visualized property value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualizationRecord {
    pub timestamp: SimTime,
    pub type_name: String,
    pub creation_index: usize,
    pub property: String,
    pub value: String,
    pub display_name: Option<String>,
}

impl VisualizationRecord {
    /// Semicolon separated line, display name last when present
    pub fn to_line(&self) -> String {
        let mut line = format!(
            "{};{};{};{};{}",
            self.timestamp, self.type_name, self.creation_index, self.property, self.value
        );
        if let Some(display_name) = &self.display_name {
            line.push(';');
            line.push_str(display_name);
        }
        line
    }
}

/// Receiver of visualization records
pub trait Visualizer: Send {
    fn record(&mut self, record: VisualizationRecord);

    fn clone_visualizer(&self) -> Box<dyn Visualizer>;
}

impl Clone for Box<dyn Visualizer> {
    fn clone(&self) -> Self {
        self.clone_visualizer()
    }
}

/// Writes every record as an info line on the `visualization` log target
#[derive(Debug, Clone, Copy, Default)]
pub struct LogVisualizer;

impl Visualizer for LogVisualizer {
    fn record(&mut self, record: VisualizationRecord) {
        info!(target: "visualization", "{}", record.to_line());
    }

    fn clone_visualizer(&self) -> Box<dyn Visualizer> {
        Box::new(*self)
    }
}

/// Keeps records in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryVisualizer {
    records: Arc<Mutex<Vec<VisualizationRecord>>>,
}

impl MemoryVisualizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<VisualizationRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Visualizer for MemoryVisualizer {
    fn record(&mut self, record: VisualizationRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    fn clone_visualizer(&self) -> Box<dyn Visualizer> {
        Box::new(self.clone())
    }
}

/// Point in the run at which a component's properties are flushed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FlushKind {
    Initialize,
    Evaluation,
}

/// Emit the tagged properties of one component
pub(crate) fn flush(slot: &ComponentSlot, time: SimTime, kind: FlushKind, visualizer: &mut dyn Visualizer) {
    for cell in slot.properties().iter() {
        let tags = cell.tags();
        let due = match kind {
            FlushKind::Initialize => tags.contains(PropertyTag::VisualizationInitialize),
            FlushKind::Evaluation => {
                tags.contains(PropertyTag::Visualization)
                    || (tags.contains(PropertyTag::VisualizationOnChange) && cell.is_changed())
            }
        };
        if due {
            visualizer.record(VisualizationRecord {
                timestamp: time,
                type_name: slot.type_name().to_string(),
                creation_index: slot.index(),
                property: cell.name().to_string(),
                value: cell.read_as_text(),
                display_name: slot.display_name().map(str::to_string),
            });
        }
    }
}
