#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Markov-chain model of how first-round support migrates into a runoff.
//!
//! The crate is split into three layers. [`probability`] turns raw masses into
//! probability vectors, [`matrix`] holds an immutable row-stochastic
//! [`TransitionMatrix`], and [`calibration`] blends per-origin loyalty rows
//! with the historical runoff outcome to build that matrix.

pub mod calibration;
pub mod matrix;
pub mod probability;

pub use calibration::calibrate_runoff_transition;
pub use matrix::TransitionMatrix;
pub use probability::{ensure_support, normalize, Distribution};

/// Target used for every tracing event emitted by this crate.
pub const LOG_TARGET: &str = "runoff-sim::markov";
