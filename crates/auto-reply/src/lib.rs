//! Message handling: scope filter, control command, retrieval-augmented
//! answers and the session bookkeeping around them.

pub mod compose;
pub mod dispatcher;
pub mod scope;
pub mod show_context;
pub mod worker;

pub use {
    dispatcher::{Dispatcher, DispatcherSettings, FAILURE_REPLY, Outcome},
    scope::Filtered,
    worker::{DEFAULT_QUEUE_CAPACITY, DispatchHandle, DispatchWorker, WorkerStopped},
};
