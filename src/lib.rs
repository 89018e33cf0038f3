//! `raman-layers` library crate.
//!
//! The binary (`raman`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the analysis pipeline can be embedded elsewhere (batch jobs, notebooks)

pub mod app;
pub mod classify;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
