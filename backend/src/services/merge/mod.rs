//! Per-row merge of spreadsheet data into certificate templates.
//!
//! - `context`: placeholder values derived from one record.
//! - `start`: the batch driver tying spreadsheet, templates, output tree and conversion together.

pub mod context;
pub mod start;

pub use start::{run_batch, Upload};
