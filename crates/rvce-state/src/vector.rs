//! Vector unit state: CSRs and register file access.

use rvce_isa::VectorType;

/// Number of architectural vector registers.
pub const NUM_VECTOR_REGS: usize = 32;

/// Raw vector CSR values read from the reference model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VectorCsrs {
    pub vtype: u64,
    pub vl: u32,
    pub vstart: u16,
    pub vxrm: u8,
    pub vxsat: bool,
}

impl VectorCsrs {
    #[must_use]
    pub const fn vector_type(&self, xlen: u8) -> VectorType {
        VectorType::decode(self.vtype, xlen)
    }
}

/// Byte-level accessor into a vector register file.
pub trait VectorRegisterFile {
    /// Bytes per vector register (`VLEN / 8`).
    fn vlenb(&self) -> usize;

    /// Byte `index` of register `reg`, or `None` if out of range.
    fn element_u8(&self, reg: u8, index: usize) -> Option<u8>;
}

/// Flat, owned vector register file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VectorRegisters {
    vlenb: usize,
    bytes: Vec<u8>,
}

impl VectorRegisters {
    /// Zeroed register file for a `VLEN` of `vlen_bits`.
    #[must_use]
    pub fn new(vlen_bits: u32) -> Self {
        let vlenb = vlen_bits as usize / 8;
        Self {
            vlenb,
            bytes: vec![0; vlenb * NUM_VECTOR_REGS],
        }
    }

    /// Contents of register `reg`, or `None` if `reg` is not a register.
    #[must_use]
    pub fn register(&self, reg: u8) -> Option<&[u8]> {
        let start = usize::from(reg) * self.vlenb;
        self.bytes.get(start..start + self.vlenb)
    }

    /// Overwrite the leading bytes of register `reg`.
    ///
    /// Returns `false` (and writes nothing) if `reg` is out of range or
    /// `data` is longer than a register.
    pub fn write_register(&mut self, reg: u8, data: &[u8]) -> bool {
        if usize::from(reg) >= NUM_VECTOR_REGS || data.len() > self.vlenb {
            return false;
        }
        let start = usize::from(reg) * self.vlenb;
        self.bytes[start..start + data.len()].copy_from_slice(data);
        true
    }
}

impl VectorRegisterFile for VectorRegisters {
    fn vlenb(&self) -> usize {
        self.vlenb
    }

    fn element_u8(&self, reg: u8, index: usize) -> Option<u8> {
        if index >= self.vlenb {
            return None;
        }
        self.register(reg).map(|r| r[index])
    }
}
