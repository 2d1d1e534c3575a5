//! The reference model as seen by the commit-event core.
//!
//! The reference simulator owns its architectural state; this crate describes
//! the narrow, read-mostly surface the event core consumes:
//!
//! - [`TraceBuffer`]: the per-step register-write / memory-read / memory-write
//!   logs, decoded into typed entries once, when they are collected.
//! - [`MemoryPort`]: typed byte/half/word loads used to re-read memory after a
//!   step, plus [`SparseMemory`] as an in-process backing store.
//! - [`VectorRegisterFile`]: byte accessor into the vector register file.
//! - [`ReferenceModel`]: the bundle of all of the above plus pc, vector CSRs
//!   and disassembly.
//!
//! ```ignore
//! use rvce_state::{MemoryPort, SizeClass, SparseMemory};
//!
//! let mut mem = SparseMemory::new();
//! mem.store(0x1000, 0xBEEF, 2);
//! assert_eq!(mem.read(0x1000, SizeClass::Half)?, 0xBEEF);
//! ```

mod memory;
mod model;
mod trace;
mod vector;

pub use memory::{MemoryError, MemoryPort, PAGE_SIZE, SizeClass, SparseMemory};
pub use model::ReferenceModel;
pub use trace::{MemoryTraceEntry, RegisterClass, RegisterWrite, TraceBuffer, TraceError};
pub use vector::{NUM_VECTOR_REGS, VectorCsrs, VectorRegisterFile, VectorRegisters};
