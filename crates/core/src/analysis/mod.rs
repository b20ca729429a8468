pub mod deterministic;
pub mod interpreter;
pub mod metrics;
pub mod orchestrator;
pub mod prompt;

pub use orchestrator::{offline, Analyzer};
