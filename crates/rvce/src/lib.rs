//! Commit-event capture and trace reconciliation for lockstep RISC-V
//! differential testing.
//!
//! For every instruction the harness retires, a [`CommitEvent`] records what
//! the reference model did: identity, vector configuration snapshot, and the
//! reconciled list of [`Effect`]s the comparator checks against the hardware.
//!
//! The per-instruction loop:
//!
//! 1. [`CommitEvent::assign_instruction`] + [`CommitEvent::capture_mask`] +
//!    [`CommitEvent::issue`] before the reference model steps.
//! 2. The reference model executes the instruction and fills its trace.
//! 3. [`LogReconciler::reconcile`] turns the trace into effects, then
//!    [`CommitEvent::commit`] checks they are complete.
//! 4. [`log_reset`] clears the trace; the event is reset for reuse.
//!
//! [`EventPool`] bundles the loop over a fixed set of pipeline slots, and
//! [`ReplayModel`] is a [`ReferenceModel`](rvce_state::ReferenceModel) fed from
//! a recorded Spike commit log.

mod config;
mod effect;
mod error;
mod event;
mod pool;
mod reconcile;
pub mod replay;
mod vector;

pub use config::{MaskSource, ReadWidthConvention, ReconcileConfig};
pub use effect::{ByteState, Effect, EffectKind, MemoryAccess, VectorRegisterWrite};
pub use error::{Error, Result};
pub use event::{CommitEvent, VectorConfig};
pub use pool::EventPool;
pub use reconcile::{LogReconciler, log_reset};
pub use replay::{CommitRecord, ReplayModel};
pub use vector::reconstruct;
