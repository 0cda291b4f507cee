pub mod batch;
pub mod config;
pub mod discrete;
pub mod event;
pub mod fixed_step;
pub mod simulation;
pub mod solver;

// Re-export commonly used types
pub use batch::{run_replicas, RunLength, RunSummary};
pub use config::{BatchConfig, ConcurrencyMode, SolverConfig};
pub use discrete::DiscreteSolver;
pub use event::{Event, EventQueue, TieBreak};
pub use fixed_step::FixedStepSolver;
pub use simulation::{Simulation, Snapshot};
pub use solver::{EventPhase, FinishReason, Solver, SolverState, TraceEntry};
