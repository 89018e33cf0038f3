//! Input/output helpers.
//!
//! - spectrum / map ingest + validation (`ingest`)
//! - reference table JSON (`reference`)
//! - fit result JSON (`result`)
//! - map result CSV export (`export`)

pub mod export;
pub mod ingest;
pub mod reference;
pub mod result;

pub use export::*;
pub use ingest::*;
pub use reference::*;
pub use result::*;
