//! Change detection and merge for previously generated artifacts.
//!
//! - `extract`: reverse-parse interfaces, aliases and call names from text
//! - `merge`: splice the regenerated region into a preserved file
//! - `report`: field/name-level deltas and the rendered change report
//!
//! This is the only part of the system that reads back persisted artifacts,
//! and it must tolerate them being hand-edited, malformed, or absent.

pub mod extract;
pub mod merge;
pub mod report;
