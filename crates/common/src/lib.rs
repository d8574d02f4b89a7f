//! Types shared by every threadsage crate: the pipeline error taxonomy and
//! the transport-neutral message shapes.

pub mod error;
pub mod http;
pub mod types;

pub use error::{FailureKind, PipelineError, PipelineResult};
