//! Peak lineshape models.
//!
//! Models are implemented as small, pure functions so that fitting code can
//! stay generic.

pub mod lorentzian;

pub use lorentzian::*;
