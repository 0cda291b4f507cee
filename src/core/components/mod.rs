pub mod context;
pub mod slot;
pub mod traits;

pub use context::{ComponentContext, ScheduleRequest};
pub use slot::ComponentSlot;
pub use traits::{Component, ComponentClone};
