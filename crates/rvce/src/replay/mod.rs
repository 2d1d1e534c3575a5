//! A reference model replayed from a recorded Spike commit log.
//!
//! Each `--log-commits` line becomes a [`CommitRecord`]. [`ReplayModel`]
//! steps through them, filling its [`TraceBuffer`] the way a live reference
//! model would: register writes, the vector marker, vector register contents
//! and memory accesses. Stores update a sparse memory, so a later load re-reads
//! the value that was stored.

mod parse;

pub use parse::parse_commit_log;

use rvce_isa::{ElementWidth, GroupMultiplier, memory_access_bytes};
use rvce_state::{
    ReferenceModel, RegisterClass, RegisterWrite, SparseMemory, TraceBuffer, VectorCsrs, VectorRegisters,
};
use tracing::trace;

use crate::error::{Error, Result};

const CSR_VSTART: u32 = 0x008;
const CSR_VXSAT: u32 = 0x009;
const CSR_VXRM: u32 = 0x00A;
const CSR_VL: u32 = 0xC20;
const CSR_VTYPE: u32 = 0xC21;

/// The `e<SEW> m<LMUL> l<VL>` marker Spike prints for vector instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorMarker {
    pub sew: ElementWidth,
    pub lmul: GroupMultiplier,
    pub vl: u32,
}

impl VectorMarker {
    /// Raw `vtype` for this marker under the given policy.
    #[must_use]
    pub const fn vtype(&self, vta: bool, vma: bool) -> u64 {
        ((vma as u64) << 7) | ((vta as u64) << 6) | ((self.sew.selector() as u64) << 3) | self.lmul.selector() as u64
    }
}

/// Full contents of one vector register after the instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorRegisterRecord {
    pub reg: u8,
    /// Little-endian register bytes.
    pub bytes: Vec<u8>,
}

/// One `mem` entry. Stores carry `(value, size in bytes)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRecord {
    pub addr: u64,
    pub store: Option<(u64, u8)>,
}

/// One committed instruction from the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// 1-based line in the log.
    pub line: usize,
    pub pc: u64,
    pub instr: u32,
    /// Integer, float and CSR writes in log order.
    pub registers: Vec<RegisterWrite>,
    pub vector: Option<VectorMarker>,
    pub vector_registers: Vec<VectorRegisterRecord>,
    pub memory: Vec<MemoryRecord>,
}

/// [`ReferenceModel`] that replays a commit log.
///
/// [`pc`](ReferenceModel::pc) and [`vector_csrs`](ReferenceModel::vector_csrs)
/// describe the next record, so an event can be assigned from the model before
/// [`step`](Self::step) applies it.
pub struct ReplayModel {
    records: Vec<CommitRecord>,
    cursor: usize,
    memory: SparseMemory,
    vectors: VectorRegisters,
    trace: TraceBuffer,
    csrs: VectorCsrs,
    vta: bool,
    vma: bool,
    xlen: u8,
    disassembler: Option<Box<dyn Fn(u32) -> String>>,
}

impl ReplayModel {
    #[must_use]
    pub fn new(records: Vec<CommitRecord>, vlen_bits: u32) -> Self {
        Self {
            records,
            cursor: 0,
            memory: SparseMemory::new(),
            vectors: VectorRegisters::new(vlen_bits),
            trace: TraceBuffer::new(),
            csrs: VectorCsrs::default(),
            vta: false,
            vma: false,
            xlen: 64,
            disassembler: None,
        }
    }

    /// # Errors
    ///
    /// [`Error::Parse`] for a malformed commit line.
    pub fn from_log(text: &str, vlen_bits: u32) -> Result<Self> {
        Ok(Self::new(parse_commit_log(text)?, vlen_bits))
    }

    #[must_use]
    pub const fn with_xlen(mut self, xlen: u8) -> Self {
        self.xlen = xlen;
        self
    }

    #[must_use]
    pub fn with_disassembler(mut self, disassemble: impl Fn(u32) -> String + 'static) -> Self {
        self.disassembler = Some(Box::new(disassemble));
        self
    }

    /// Tail and mask policy. The commit log does not print them.
    pub const fn set_vector_policy(&mut self, vta: bool, vma: bool) {
        self.vta = vta;
        self.vma = vma;
        self.csrs.vtype = (self.csrs.vtype & !0xC0) | ((vma as u64) << 7) | ((vta as u64) << 6);
    }

    pub fn push(&mut self, record: CommitRecord) {
        self.records.push(record);
    }

    pub const fn memory_mut(&mut self) -> &mut SparseMemory {
        &mut self.memory
    }

    pub const fn vector_registers_mut(&mut self) -> &mut VectorRegisters {
        &mut self.vectors
    }

    /// The record the next [`step`](Self::step) applies.
    #[must_use]
    pub fn peek(&self) -> Option<&CommitRecord> {
        self.records.get(self.cursor)
    }

    #[must_use]
    pub fn next_instruction(&self) -> Option<u32> {
        self.peek().map(|r| r.instr)
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.records.len() - self.cursor
    }

    /// Apply the next record and append its entries to the trace.
    ///
    /// The trace is not cleared here; that is the caller's `log_reset`.
    /// Returns `Ok(false)` once the log is exhausted.
    ///
    /// # Errors
    ///
    /// [`Error::Parse`] if the record cannot be applied: a load by an
    /// encoding with no known access width, or a vector register wider than VLEN.
    pub fn step(&mut self) -> Result<bool> {
        let Some(record) = self.records.get(self.cursor) else {
            return Ok(false);
        };
        let fail = |reason: &str| Error::Parse {
            line: record.line,
            reason: reason.to_string(),
        };

        for write in &record.registers {
            if write.class == RegisterClass::Csr {
                let value = write.value as u64;
                match write.index {
                    CSR_VSTART => self.csrs.vstart = value as u16,
                    CSR_VXSAT => self.csrs.vxsat = value & 1 == 1,
                    CSR_VXRM => self.csrs.vxrm = (value & 0x3) as u8,
                    CSR_VL => self.csrs.vl = value as u32,
                    CSR_VTYPE => self.csrs.vtype = value,
                    _ => {}
                }
            }
            self.trace.record_register_write(*write);
        }

        if let Some(marker) = record.vector {
            self.csrs.vtype = marker.vtype(self.vta, self.vma);
            self.csrs.vl = marker.vl;
            self.trace
                .record_register_write(RegisterWrite::new(RegisterClass::VectorConfig, 0, 0));
        }

        for vreg in &record.vector_registers {
            if !self.vectors.write_register(vreg.reg, &vreg.bytes) {
                return Err(fail("vector register value wider than VLEN"));
            }
            self.trace
                .record_register_write(RegisterWrite::new(RegisterClass::Vector, u32::from(vreg.reg), 0));
        }

        let sew_bytes = self.csrs.vector_type(self.xlen).sew().map_or(1, ElementWidth::bytes);
        for access in &record.memory {
            match access.store {
                Some((value, size)) => {
                    self.memory.store(access.addr, value, size);
                    self.trace.record_memory_write(access.addr, value, size);
                }
                None => {
                    let size = memory_access_bytes(record.instr, sew_bytes)
                        .ok_or_else(|| fail("memory read by an encoding with no access width"))?;
                    self.trace.record_memory_read(access.addr, size);
                }
            }
        }

        trace!(line = record.line, pc = format!("{:#x}", record.pc), "replayed");
        self.cursor += 1;
        Ok(true)
    }
}

impl ReferenceModel for ReplayModel {
    type Memory = SparseMemory;
    type Vectors = VectorRegisters;

    fn pc(&self) -> u64 {
        self.peek().map_or(0, |r| r.pc)
    }

    fn xlen(&self) -> u8 {
        self.xlen
    }

    fn vector_csrs(&self) -> VectorCsrs {
        let mut csrs = self.csrs;
        if let Some(marker) = self.peek().and_then(|r| r.vector) {
            csrs.vtype = marker.vtype(self.vta, self.vma);
            csrs.vl = marker.vl;
        }
        csrs
    }

    fn vector_registers(&self) -> &VectorRegisters {
        &self.vectors
    }

    fn memory(&self) -> &SparseMemory {
        &self.memory
    }

    fn trace(&self) -> &TraceBuffer {
        &self.trace
    }

    fn trace_mut(&mut self) -> &mut TraceBuffer {
        &mut self.trace
    }

    fn disassemble(&self, instr: u32) -> String {
        self.disassembler
            .as_ref()
            .map_or_else(|| "unknown".to_string(), |disassemble| disassemble(instr))
    }
}

#[cfg(test)]
mod tests;
