//! Typed per-step trace logs of the reference model.
//!
//! The reference simulator keys its register-write log by
//! `(register index << 4) | class tag`. Keys are decoded into
//! [`RegisterWrite`] when they are recorded, so consumers never inspect the
//! tag bits themselves.

use thiserror::Error;

/// Trace collection error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TraceError {
    #[error("register write key {key:#x} has unknown class tag {tag}")]
    UnknownRegisterClass { key: u64, tag: u8 },
}

/// Register class encoded in the low nibble of a register-write key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegisterClass {
    Integer,
    Float,
    Vector,
    /// Marks the step as a vector instruction; carries no register value.
    VectorConfig,
    Csr,
}

impl RegisterClass {
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Integer),
            1 => Some(Self::Float),
            2 => Some(Self::Vector),
            3 => Some(Self::VectorConfig),
            4 => Some(Self::Csr),
            _ => None,
        }
    }

    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Integer => 0,
            Self::Float => 1,
            Self::Vector => 2,
            Self::VectorConfig => 3,
            Self::Csr => 4,
        }
    }
}

/// One entry of the register-write log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegisterWrite {
    pub class: RegisterClass,
    /// Register number (CSR address for [`RegisterClass::Csr`]).
    pub index: u32,
    /// Written value; floating-point writes may use the full 128 bits.
    pub value: u128,
}

impl RegisterWrite {
    #[must_use]
    pub const fn new(class: RegisterClass, index: u32, value: u128) -> Self {
        Self { class, index, value }
    }

    /// Decode a raw `(index << 4) | tag` key.
    ///
    /// # Errors
    ///
    /// Fails if the tag does not name a register class.
    pub const fn from_key(key: u64, value: u128) -> Result<Self, TraceError> {
        let tag = (key & 0xF) as u8;
        match RegisterClass::from_tag(tag) {
            Some(class) => Ok(Self::new(class, (key >> 4) as u32, value)),
            None => Err(TraceError::UnknownRegisterClass { key, tag }),
        }
    }

    #[must_use]
    pub const fn key(&self) -> u64 {
        ((self.index as u64) << 4) | self.class.tag() as u64
    }
}

/// One entry of the memory-read or memory-write log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MemoryTraceEntry {
    pub addr: u64,
    /// Value moved; reads are logged without one and carry `0`.
    pub value: u64,
    /// Size as logged by the reference model.
    pub size: u8,
}

/// The three trace logs produced by one reference-model step.
///
/// The register-write log behaves like a map: a second write with the same
/// key replaces the first in place. Memory logs keep every access in program
/// order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraceBuffer {
    register_writes: Vec<RegisterWrite>,
    memory_reads: Vec<MemoryTraceEntry>,
    memory_writes: Vec<MemoryTraceEntry>,
}

impl TraceBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_register_write(&mut self, write: RegisterWrite) {
        let key = write.key();
        match self.register_writes.iter_mut().find(|w| w.key() == key) {
            Some(existing) => *existing = write,
            None => self.register_writes.push(write),
        }
    }

    /// Record a register write from its raw log key.
    ///
    /// # Errors
    ///
    /// Fails if the key's class tag is unknown; nothing is recorded.
    pub fn record_raw_register_write(&mut self, key: u64, value: u128) -> Result<(), TraceError> {
        self.record_register_write(RegisterWrite::from_key(key, value)?);
        Ok(())
    }

    pub fn record_memory_read(&mut self, addr: u64, size: u8) {
        self.memory_reads.push(MemoryTraceEntry { addr, value: 0, size });
    }

    pub fn record_memory_write(&mut self, addr: u64, value: u64, size: u8) {
        self.memory_writes.push(MemoryTraceEntry { addr, value, size });
    }

    #[must_use]
    pub fn register_writes(&self) -> &[RegisterWrite] {
        &self.register_writes
    }

    #[must_use]
    pub fn memory_reads(&self) -> &[MemoryTraceEntry] {
        &self.memory_reads
    }

    #[must_use]
    pub fn memory_writes(&self) -> &[MemoryTraceEntry] {
        &self.memory_writes
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.register_writes.is_empty() && self.memory_reads.is_empty() && self.memory_writes.is_empty()
    }

    /// Clear all three logs. Must run before the next step.
    pub fn clear(&mut self) {
        self.register_writes.clear();
        self.memory_reads.clear();
        self.memory_writes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_register_keys() {
        let w = RegisterWrite::from_key(5 << 4, 7).unwrap();
        assert_eq!(w.class, RegisterClass::Integer);
        assert_eq!(w.index, 5);
        let w = RegisterWrite::from_key((8 << 4) | 2, 0).unwrap();
        assert_eq!(w.class, RegisterClass::Vector);
        assert_eq!(w.key(), (8 << 4) | 2);
        let w = RegisterWrite::from_key((0x300 << 4) | 4, 0x1800).unwrap();
        assert_eq!(w.class, RegisterClass::Csr);
        assert_eq!(w.index, 0x300);

        assert_eq!(
            RegisterWrite::from_key(0x15, 0),
            Err(TraceError::UnknownRegisterClass { key: 0x15, tag: 5 })
        );
    }

    #[test]
    fn test_register_log_is_keyed() {
        let mut trace = TraceBuffer::new();
        trace.record_raw_register_write(0x10, 1).unwrap();
        trace.record_raw_register_write(0x21, 2).unwrap();
        trace.record_raw_register_write(0x10, 3).unwrap();
        assert_eq!(trace.register_writes().len(), 2);
        assert_eq!(trace.register_writes()[0].value, 3);
        assert!(trace.record_raw_register_write(0x1F, 0).is_err());
        assert_eq!(trace.register_writes().len(), 2);
    }

    #[test]
    fn test_clear_empties_all_logs() {
        let mut trace = TraceBuffer::new();
        trace.record_raw_register_write(0x10, 1).unwrap();
        trace.record_memory_read(0x1000, 4);
        trace.record_memory_write(0x2000, 5, 4);
        assert!(!trace.is_empty());
        trace.clear();
        assert!(trace.is_empty());
        assert!(trace.memory_reads().is_empty());
    }
}
