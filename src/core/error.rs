/// Error types for simulation operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// No component with this name exists in the environment
    UnknownComponent(String),
    /// A component with this name already exists
    DuplicateComponent(String),
    /// Another component already holds this creation index
    DuplicateIndex { index: usize, component: String },
    /// Creation indices are fixed once the run started or events are queued
    IndexLocked(String),
    /// The component has no property with this name
    UnknownProperty { component: String, property: String },
    /// The property name is declared twice on one component
    DuplicateProperty(String),
    /// A read or write used a different type than the cell holds
    TypeMismatch { expected: String, found: String },
    /// The connection cannot be built between these endpoints
    InvalidConnection(String),
    /// The property is not tagged as a parameter
    NotAParameter { component: String, property: String },
    /// Text could not be parsed into the cell's value type
    TextConversion { property: String, text: String },
    /// Failure reported by a component callback
    Callback(String),
    /// The solver is bound to a different environment
    SolverMismatch(String),
    /// A snapshot could not be restored
    InvalidSnapshot(String),
    /// A batch of replicas could not be executed
    Batch(String),
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::UnknownComponent(name) => write!(f, "Unknown component: {}", name),
            SimError::DuplicateComponent(name) => write!(f, "Duplicate component name: {}", name),
            SimError::DuplicateIndex { index, component } => {
                write!(f, "Creation index {} is already used by '{}'", index, component)
            }
            SimError::IndexLocked(name) => {
                write!(f, "Creation index of '{}' can no longer change", name)
            }
            SimError::UnknownProperty { component, property } => {
                write!(f, "Component '{}' has no property '{}'", component, property)
            }
            SimError::DuplicateProperty(name) => write!(f, "Duplicate property: {}", name),
            SimError::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {}, found {}", expected, found)
            }
            SimError::InvalidConnection(msg) => write!(f, "Invalid connection: {}", msg),
            SimError::NotAParameter { component, property } => {
                write!(f, "Property '{}' of '{}' is not a parameter", property, component)
            }
            SimError::TextConversion { property, text } => {
                write!(f, "Cannot convert '{}' for property '{}'", text, property)
            }
            SimError::Callback(msg) => write!(f, "Callback failed: {}", msg),
            SimError::SolverMismatch(msg) => write!(f, "Solver mismatch: {}", msg),
            SimError::InvalidSnapshot(msg) => write!(f, "Invalid snapshot: {}", msg),
            SimError::Batch(msg) => write!(f, "Batch error: {}", msg),
        }
    }
}

impl std::error::Error for SimError {}

/// Convert string errors to SimError
impl From<String> for SimError {
    fn from(msg: String) -> Self {
        SimError::Callback(msg)
    }
}

/// Convert &str errors to SimError
impl From<&str> for SimError {
    fn from(msg: &str) -> Self {
        SimError::Callback(msg.to_string())
    }
}

pub type SimResult<T> = Result<T, SimError>;
