//! The reference model seen from the commit-event core.

use crate::memory::MemoryPort;
use crate::trace::TraceBuffer;
use crate::vector::{VectorCsrs, VectorRegisterFile};

/// Read-only view of a stepping reference simulator, plus its clearable trace.
///
/// Stepping the simulator is the harness's business; this trait only exposes
/// what is needed to capture and reconcile one instruction's effects.
pub trait ReferenceModel {
    type Memory: MemoryPort;
    type Vectors: VectorRegisterFile;

    /// Program counter of the instruction about to execute.
    fn pc(&self) -> u64;

    /// Register width, used to locate `vill` in `vtype`.
    fn xlen(&self) -> u8 {
        64
    }

    fn vector_csrs(&self) -> VectorCsrs;

    fn vector_registers(&self) -> &Self::Vectors;

    fn memory(&self) -> &Self::Memory;

    fn trace(&self) -> &TraceBuffer;

    fn trace_mut(&mut self) -> &mut TraceBuffer;

    /// Human-readable text for an encoding. Diagnostic only.
    fn disassemble(&self, instr: u32) -> String;
}
