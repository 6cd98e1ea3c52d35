/// Built-in plugins
///
/// - `ConsolePlugin`: tracing summary of each game, optional JSON file
/// - `EventBusPlugin`: publishes context snapshots for other threads

pub mod console;
pub mod event_bus;

// Re-export commonly used types
pub use console::{ConsolePlugin, ResultSummary};
pub use event_bus::EventBusPlugin;
