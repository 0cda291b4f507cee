pub mod auto_connect;
pub mod connection;
pub mod connection_validator;
pub mod propagation;

pub use auto_connect::{names_match, AutoConnectCandidate};
pub use connection::{Connection, ConnectionKind};
pub use connection_validator::ConnectionValidator;
pub use propagation::{propagate, Obligation, Phase};
