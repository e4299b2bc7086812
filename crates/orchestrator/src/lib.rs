pub mod cache;
pub mod deploy;
pub mod error;
pub mod handler;
pub mod link;
pub mod reaper;
pub mod resolve;
pub mod sequencer;
pub mod validate;

pub use error::{OrchestratorError, Result};
pub use handler::handle;
pub use resolve::Results;
pub use sequencer::Sequencer;
