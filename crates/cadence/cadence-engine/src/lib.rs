mod engine;
mod error;
mod worker;

pub use engine::{CadenceEngine, EngineReport};
pub use error::EngineError;
pub use worker::WorkerReport;
