//! The commit event: one instruction's identity, vector configuration,
//! lifecycle flags and reconciled effects.
//!
//! Events are pooled and reused across pipeline slots. The lifecycle is
//! `idle -> issued -> committed -> idle`, with `reset_issue` also allowed
//! straight from `issued` when the instruction is flushed.

use rvce_isa::{InstrClass, VectorAddressing, VectorType, decode_vm, is_vector, vector_memory_op};
use rvce_state::{ReferenceModel, VectorCsrs, VectorRegisterFile};
use tracing::{error, trace};

use crate::config::MaskSource;
use crate::effect::{Effect, MemoryAccess};
use crate::error::{Error, Result};

/// Snapshot of the vector unit configuration, taken as one unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VectorConfig {
    /// Element width selector (SEW).
    pub vsew: u8,
    /// Group multiplier selector (LMUL).
    pub vlmul: u8,
    pub vl: u32,
    pub vstart: u16,
    pub vma: bool,
    pub vta: bool,
    pub vill: bool,
    /// Fixed-point rounding mode.
    pub vxrm: u8,
    /// Fixed-point saturation flag.
    pub vxsat: bool,
}

impl VectorConfig {
    #[must_use]
    pub const fn from_csrs(csrs: &VectorCsrs, xlen: u8) -> Self {
        let vtype = csrs.vector_type(xlen);
        Self {
            vsew: vtype.vsew,
            vlmul: vtype.vlmul,
            vl: csrs.vl,
            vstart: csrs.vstart,
            vma: vtype.vma,
            vta: vtype.vta,
            vill: vtype.vill,
            vxrm: csrs.vxrm,
            vxsat: csrs.vxsat,
        }
    }

    #[must_use]
    pub const fn vector_type(&self) -> VectorType {
        VectorType {
            vsew: self.vsew,
            vlmul: self.vlmul,
            vta: self.vta,
            vma: self.vma,
            vill: self.vill,
        }
    }
}

/// One retired (or about to retire) instruction.
#[derive(Clone, Debug, Default)]
pub struct CommitEvent {
    pc: u64,
    instr: u32,
    class: InstrClass,
    src1: u32,
    src2: u32,
    vector: VectorConfig,
    is_vector: bool,
    mask: Vec<u8>,
    issued: bool,
    committed: bool,
    reconciled: bool,
    needs_memory_slot_index: bool,
    memory_slot_index: u8,
    effects: Vec<Effect>,
}

impl CommitEvent {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture identity, classification and the vector configuration from
    /// the reference model in one snapshot, before it executes `instr`.
    pub fn assign_instruction<R: ReferenceModel>(&mut self, model: &R, instr: u32) {
        let vector = VectorConfig::from_csrs(&model.vector_csrs(), model.xlen());
        self.assign(model.pc(), instr, vector);
    }

    /// Load a new instruction into the event.
    ///
    /// Any effects, mask and slot index left from a previous instruction are dropped.
    pub fn assign(&mut self, pc: u64, instr: u32, vector: VectorConfig) {
        self.pc = pc;
        self.instr = instr;
        self.class = InstrClass::of(instr);
        self.vector = vector;
        self.is_vector = is_vector(instr);
        self.mask.clear();
        self.needs_memory_slot_index = false;
        self.memory_slot_index = 0;
        self.clear_effects();
        trace!(
            pc = format!("{pc:#x}"),
            instr = format!("{instr:#010x}"),
            class = ?self.class,
            "instruction assigned"
        );
    }

    /// Read the element mask from `v0`. Must run before the model steps,
    /// since a mask-producing instruction may overwrite `v0`.
    pub fn capture_mask<V: VectorRegisterFile + ?Sized>(&mut self, vrf: &V, source: MaskSource) {
        let len = match source {
            MaskSource::FirstByte => 1,
            MaskSource::VectorLength => (self.vector.vl as usize).div_ceil(8).max(1),
        };
        let len = len.min(vrf.vlenb());
        self.mask = (0..len).map(|i| vrf.element_u8(0, i).unwrap_or(0)).collect();
    }

    #[must_use]
    pub const fn pc(&self) -> u64 {
        self.pc
    }

    #[must_use]
    pub const fn instruction(&self) -> u32 {
        self.instr
    }

    #[must_use]
    pub const fn class(&self) -> InstrClass {
        self.class
    }

    #[must_use]
    pub const fn is_load(&self) -> bool {
        self.class.is_load()
    }

    #[must_use]
    pub const fn is_store(&self) -> bool {
        self.class.is_store()
    }

    /// True for OP-V and vector memory encodings, or once the trace marked
    /// the step as a vector instruction.
    #[must_use]
    pub const fn is_vector(&self) -> bool {
        self.is_vector
    }

    #[must_use]
    pub const fn src1(&self) -> u32 {
        self.src1
    }

    #[must_use]
    pub const fn src2(&self) -> u32 {
        self.src2
    }

    pub const fn set_src1(&mut self, src1: u32) {
        self.src1 = src1;
    }

    pub const fn set_src2(&mut self, src2: u32) {
        self.src2 = src2;
    }

    #[must_use]
    pub const fn vector_config(&self) -> &VectorConfig {
        &self.vector
    }

    /// Replace the whole vector configuration snapshot.
    pub const fn set_vector_config(&mut self, config: VectorConfig) {
        self.vector = config;
    }

    #[must_use]
    pub const fn vsew(&self) -> u8 {
        self.vector.vsew
    }

    #[must_use]
    pub const fn vlmul(&self) -> u8 {
        self.vector.vlmul
    }

    #[must_use]
    pub const fn vl(&self) -> u32 {
        self.vector.vl
    }

    #[must_use]
    pub const fn vstart(&self) -> u16 {
        self.vector.vstart
    }

    #[must_use]
    pub const fn vma(&self) -> bool {
        self.vector.vma
    }

    #[must_use]
    pub const fn vta(&self) -> bool {
        self.vector.vta
    }

    #[must_use]
    pub const fn vill(&self) -> bool {
        self.vector.vill
    }

    #[must_use]
    pub const fn vxrm(&self) -> u8 {
        self.vector.vxrm
    }

    #[must_use]
    pub const fn vxsat(&self) -> bool {
        self.vector.vxsat
    }

    /// Byte 0 of the captured `v0` mask.
    #[must_use]
    pub fn active_element_mask(&self) -> u8 {
        self.mask.first().copied().unwrap_or(0)
    }

    /// Captured mask bytes, element 0 in bit 0 of byte 0.
    #[must_use]
    pub fn mask_bits(&self) -> &[u8] {
        &self.mask
    }

    /// Mask bit of element `index`. Elements beyond the captured mask are inactive.
    #[must_use]
    pub fn mask_bit(&self, index: usize) -> bool {
        self.mask
            .get(index / 8)
            .is_some_and(|byte| (byte >> (index % 8)) & 1 == 1)
    }

    #[must_use]
    pub const fn issued(&self) -> bool {
        self.issued
    }

    #[must_use]
    pub const fn committed(&self) -> bool {
        self.committed
    }

    #[must_use]
    pub const fn is_reconciled(&self) -> bool {
        self.reconciled
    }

    // ---- lifecycle ----

    /// Mark the event in flight.
    ///
    /// # Errors
    ///
    /// Issuing an event that is already issued is a contract violation.
    pub fn issue(&mut self) -> Result<()> {
        if self.issued {
            error!(pc = format!("{:#x}", self.pc), "double issue");
            return Err(Error::AlreadyIssued { pc: self.pc });
        }
        self.issued = true;
        Ok(())
    }

    /// Clear the issued flag. Effects of an event that never committed are
    /// discarded, which covers flushed and mispredicted instructions.
    pub fn reset_issue(&mut self) {
        self.issued = false;
        if !self.committed {
            self.clear_effects();
        }
    }

    /// Checkpoint before comparison: the event must be issued, reconciled,
    /// and a load or store expected to touch memory must have done so.
    ///
    /// # Errors
    ///
    /// [`Error::NotIssued`] and [`Error::AlreadyCommitted`] are contract
    /// violations; [`Error::Incomplete`] reports missing effects.
    pub fn commit(&mut self) -> Result<()> {
        let pc = self.pc;
        if !self.issued {
            error!(pc = format!("{pc:#x}"), "commit before issue");
            return Err(Error::NotIssued { pc });
        }
        if self.committed {
            error!(pc = format!("{pc:#x}"), "double commit");
            return Err(Error::AlreadyCommitted { pc });
        }
        if !self.reconciled {
            return Err(Error::Incomplete {
                pc,
                reason: "trace was not reconciled",
            });
        }
        if self.expects_memory_access() {
            if self.is_store() && self.memory_writes().next().is_none() {
                return Err(Error::Incomplete {
                    pc,
                    reason: "store logged no memory writes",
                });
            }
            if self.is_load() && self.reconciled_memory_reads().next().is_none() {
                return Err(Error::Incomplete {
                    pc,
                    reason: "load logged no memory reads",
                });
            }
        }
        self.committed = true;
        Ok(())
    }

    /// Clear the committed flag and everything reconciled for the instruction.
    pub fn reset_commit(&mut self) {
        self.committed = false;
        self.needs_memory_slot_index = false;
        self.memory_slot_index = 0;
        self.clear_effects();
    }

    /// Drop all reconciled effects.
    pub fn clear_effects(&mut self) {
        self.effects.clear();
        self.reconciled = false;
    }

    /// Whether the instruction should have touched memory given its
    /// configuration and mask. Vector ops with no active element do not.
    #[must_use]
    pub fn expects_memory_access(&self) -> bool {
        if !self.class.is_memory() {
            return false;
        }
        let Some(op) = vector_memory_op(self.instr) else {
            return true;
        };
        if matches!(op.addressing, VectorAddressing::WholeRegister { .. }) {
            return true;
        }
        if self.vector.vill {
            return false;
        }
        let vstart = usize::from(self.vector.vstart);
        let vl = self.vector.vl as usize;
        match op.addressing {
            VectorAddressing::Mask => vl.div_ceil(8) > vstart,
            _ if decode_vm(self.instr) => vl > vstart,
            _ => (vstart..vl).any(|i| self.mask_bit(i)),
        }
    }

    // ---- effects ----

    #[must_use]
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Memory reads in trace order, with their read-back values.
    pub fn reconciled_memory_reads(&self) -> impl Iterator<Item = &MemoryAccess> {
        self.effects.iter().filter_map(|e| match e {
            Effect::MemoryRead(access) => Some(access),
            _ => None,
        })
    }

    /// Memory writes in trace order.
    pub fn memory_writes(&self) -> impl Iterator<Item = &MemoryAccess> {
        self.effects.iter().filter_map(|e| match e {
            Effect::MemoryWrite(access) => Some(access),
            _ => None,
        })
    }

    pub(crate) fn push_effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub(crate) const fn mark_reconciled(&mut self) {
        self.reconciled = true;
    }

    pub(crate) const fn mark_vector(&mut self) {
        self.is_vector = true;
    }

    // ---- memory slot correlation ----

    #[must_use]
    pub const fn needs_memory_slot_index(&self) -> bool {
        self.needs_memory_slot_index
    }

    #[must_use]
    pub const fn memory_slot_index(&self) -> u8 {
        self.memory_slot_index
    }

    pub const fn set_memory_slot_index(&mut self, index: u8) {
        self.memory_slot_index = index;
    }

    pub const fn set_needs_memory_slot_index(&mut self) {
        self.needs_memory_slot_index = true;
    }

    pub const fn clear_needs_memory_slot_index(&mut self) {
        self.needs_memory_slot_index = false;
    }

    /// The reference access matched to the current hardware slot index:
    /// the n-th read of a load or the n-th write of a store, in program order.
    #[must_use]
    pub fn memory_access_for_slot(&self) -> Option<&MemoryAccess> {
        let index = usize::from(self.memory_slot_index);
        match self.class {
            InstrClass::Load => self.reconciled_memory_reads().nth(index),
            InstrClass::Store => self.memory_writes().nth(index),
            InstrClass::Other => None,
        }
    }

    /// Move to the next hardware slot. Returns `false` once every access of
    /// the instruction has been matched, or when the index would pass 255.
    pub fn advance_memory_slot(&mut self) -> bool {
        let total = match self.class {
            InstrClass::Load => self.reconciled_memory_reads().count(),
            InstrClass::Store => self.memory_writes().count(),
            InstrClass::Other => 0,
        };
        let next = usize::from(self.memory_slot_index) + 1;
        if next >= total {
            return false;
        }
        // accesses past the 256th have no slot index
        let Ok(next) = u8::try_from(next) else {
            return false;
        };
        self.memory_slot_index = next;
        true
    }

    // ---- diagnostics ----

    /// `PC: <pc>, ASM: <encoding>, DISASM: <text>` for failure reports.
    #[must_use]
    pub fn describe<R: ReferenceModel>(&self, model: &R) -> String {
        format!(
            "PC: {:X}, ASM: {:08X}, DISASM: {}",
            self.pc,
            self.instr,
            model.disassemble(self.instr)
        )
    }
}
