use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Semantic tag attached to a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PropertyTag {
    /// Receives values from other components
    Input,
    /// Sends values to other components
    Output,
    /// Can be set from outside the simulation
    Parameter,
    /// Recorded after every evaluation of the owner
    Visualization,
    /// Recorded after an evaluation that changed the value
    VisualizationOnChange,
    /// Recorded once during initialization
    VisualizationInitialize,
}

impl PropertyTag {
    /// Tags that drive the visualization collaborator
    pub fn is_visualization(&self) -> bool {
        matches!(
            self,
            PropertyTag::Visualization
                | PropertyTag::VisualizationOnChange
                | PropertyTag::VisualizationInitialize
        )
    }
}

/// Set of tags carried by one property. A property may carry several tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet(BTreeSet<PropertyTag>);

impl TagSet {
    pub fn new(tags: &[PropertyTag]) -> Self {
        Self(tags.iter().copied().collect())
    }

    pub fn contains(&self, tag: PropertyTag) -> bool {
        self.0.contains(&tag)
    }

    pub fn insert(&mut self, tag: PropertyTag) {
        self.0.insert(tag);
    }

    pub fn iter(&self) -> impl Iterator<Item = PropertyTag> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
