//! Minimal RISC-V decoding for commit-event capture.
//!
//! This crate does not decode instructions fully. It extracts the handful of
//! fields needed to classify an encoding as a load or store, to decode the
//! `vtype` CSR, and to work out the shape of a vector destination register
//! group (effective element width, group multiplier, body extent).

mod classify;
mod encode;
mod shape;
mod vtype;

pub use classify::*;
pub use encode::*;
pub use shape::*;
pub use vtype::*;
