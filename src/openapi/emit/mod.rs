//! Source-text emitters.
//!
//! - `types`: schema nodes and named types -> declaration text
//! - `functions`: operations -> request-function text with sentinel markers
//!
//! Emitters are pure functions from the model to text; they retain no state
//! between runs.

pub mod functions;
pub mod types;
