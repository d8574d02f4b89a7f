//! Text generation backends.

pub mod generator;
pub mod providers;

pub use generator::{GenerationOptions, Generator};
