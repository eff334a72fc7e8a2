pub mod certificates;
pub mod convert;
pub mod data_sources;
pub mod merge;
pub mod output;
pub mod templates;
