pub mod gateways;
pub mod metrics;
pub mod orchestrator;
pub mod responder;

pub use orchestrator::{ChatOutcome, Orchestrator};
