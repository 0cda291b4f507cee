pub mod components;
pub mod connections;
pub mod environment;
pub mod error;
pub mod execution;
pub mod logging;
pub mod registry;
pub mod types;
pub mod values;
pub mod visualization;

#[cfg(test)]
mod tests;
