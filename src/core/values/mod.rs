pub mod cell;
pub mod cell_value;
pub mod property_set;
pub mod tags;

pub use cell::{EventKind, FeedbackCell, PropertyCell, ValueCell};
pub use cell_value::CellValue;
pub use property_set::{Channel, Notification, PropertySet};
pub use tags::{PropertyTag, TagSet};
