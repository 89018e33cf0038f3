//! Layer-count classification.
//!
//! - `reference`: the reference G / G′ table (built-in default, replaceable)
//! - `classifier`: deviation scoring and nearest-reference selection

pub mod classifier;
pub mod reference;

pub use classifier::*;
pub use reference::*;
