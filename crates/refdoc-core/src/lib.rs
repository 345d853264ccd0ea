//! Reference generation pipeline: provider, closure filter, renderer, output.

pub mod diff;
pub mod error;
mod generator;

pub use error::{ExitCode, GeneratorError, GeneratorResult};
pub use generator::{CheckOutcome, Generator, GeneratorOptions};
