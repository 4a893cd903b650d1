//! Intermediate representation for API descriptions.
//!
//! - `model`: the unified, dialect-agnostic API model
//! - `names`: naming rules shared across the pipeline
//! - `normalize`: raw document -> model, reference closure included

pub mod model;
pub mod names;
pub mod normalize;
