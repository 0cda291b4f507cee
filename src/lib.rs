pub mod core;

// Re-export commonly used types
pub use crate::core::components::{Component, ComponentContext, ComponentSlot, ScheduleRequest};
pub use crate::core::connections::{Connection, ConnectionKind};
pub use crate::core::environment::Environment;
pub use crate::core::error::{SimError, SimResult};
pub use crate::core::execution::{
    run_replicas, BatchConfig, ConcurrencyMode, DiscreteSolver, Event, EventPhase, FinishReason,
    FixedStepSolver, RunLength, RunSummary, Simulation, Snapshot, Solver, SolverConfig, TieBreak,
    TraceEntry,
};
pub use crate::core::logging::LogLevel;
pub use crate::core::registry::{registry, SolverKind};
pub use crate::core::types::{
    ComponentHandle, ComponentId, ConnectionId, EnvironmentId, EventId, PropertyRef, SimTime, SolverId,
};
pub use crate::core::values::{CellValue, PropertySet, PropertyTag};
pub use crate::core::visualization::{LogVisualizer, MemoryVisualizer, VisualizationRecord, Visualizer};
