//! Reporting utilities: terminal summaries for single fits and maps.

pub mod format;

pub use format::*;
