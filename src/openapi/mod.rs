//! API description to TypeScript source generator.
//!
//! This module hosts the three cooperating engines of the generator:
//! - `document` + `ir`: parse either spec dialect (Swagger 2.0 / OpenAPI 3.0)
//!   into one version-agnostic model, resolving the reference closure
//! - `emit`: turn the model into type-declaration and request-function text
//! - `diff`: reverse-parse previously generated files to merge regenerated
//!   regions into hand-edited files and to report drift

pub mod diff;
pub mod document;
pub mod emit;
pub mod ir;
