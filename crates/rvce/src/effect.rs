//! Architectural effects of one instruction, as reconciled from the trace.

use std::fmt;

use rvce_isa::DestinationShape;

use crate::event::VectorConfig;

/// One memory access: address, value, and size as logged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MemoryAccess {
    pub addr: u64,
    pub value: u64,
    pub size: u8,
}

/// What an instruction did to one byte of a vector destination group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ByteState {
    /// Holds a result; must match exactly.
    Written,
    /// Must keep its value from before the instruction.
    Undisturbed,
    /// Masked-off or tail under an agnostic policy; any value is legal.
    Agnostic,
    /// Mask destinations only: the set bits hold results, the rest are not written.
    Partial { written: u8 },
}

impl ByteState {
    /// Whether the hardware byte-enable for this byte should be asserted.
    #[must_use]
    pub const fn is_written(self) -> bool {
        matches!(self, Self::Written | Self::Partial { .. })
    }
}

/// A reconstructed vector register group write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VectorRegisterWrite {
    /// First register of the destination group.
    pub base: u8,
    /// Vector configuration the instruction executed under.
    pub config: VectorConfig,
    pub shape: DestinationShape,
    /// Group contents after the instruction, register by register.
    pub data: Vec<u8>,
    /// Per-byte write status, parallel to `data`.
    pub bytes: Vec<ByteState>,
}

impl VectorRegisterWrite {
    #[must_use]
    pub const fn registers(&self) -> u32 {
        self.shape.registers()
    }

    /// Byte enables in the shape of a hardware partial-write signal.
    #[must_use]
    pub fn byte_enables(&self) -> Vec<bool> {
        self.bytes.iter().map(|b| b.is_written()).collect()
    }

    /// `(offset, value)` of every byte holding a result.
    pub fn written_bytes(&self) -> impl Iterator<Item = (usize, u8)> + '_ {
        self.data
            .iter()
            .zip(&self.bytes)
            .enumerate()
            .filter(|(_, (_, state))| state.is_written())
            .map(|(offset, (value, _))| (offset, *value))
    }

    /// Compare against a hardware write of the same group.
    ///
    /// `written` bytes (and the written bits of partial bytes) must match;
    /// undisturbed bytes must match `prior` when given; agnostic bytes are ignored.
    #[must_use]
    pub fn matches(&self, actual: &[u8], prior: Option<&[u8]>) -> bool {
        if actual.len() != self.data.len() {
            return false;
        }
        self.bytes.iter().enumerate().all(|(i, state)| match *state {
            ByteState::Written => actual[i] == self.data[i],
            ByteState::Partial { written } => actual[i] & written == self.data[i] & written,
            ByteState::Undisturbed => prior.is_none_or(|p| p.get(i) == Some(&actual[i])),
            ByteState::Agnostic => true,
        })
    }
}

/// One reconciled architectural effect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    IntegerRegister { index: u8, value: u64 },
    FloatRegister { index: u8, value: u128 },
    VectorRegister(VectorRegisterWrite),
    ControlStatusRegister { addr: u16, value: u64 },
    MemoryRead(MemoryAccess),
    MemoryWrite(MemoryAccess),
}

impl Effect {
    #[must_use]
    pub const fn kind(&self) -> EffectKind {
        match self {
            Self::IntegerRegister { .. } => EffectKind::IntegerRegister,
            Self::FloatRegister { .. } => EffectKind::FloatRegister,
            Self::VectorRegister(_) => EffectKind::VectorRegister,
            Self::ControlStatusRegister { .. } => EffectKind::ControlStatusRegister,
            Self::MemoryRead(_) => EffectKind::MemoryRead,
            Self::MemoryWrite(_) => EffectKind::MemoryWrite,
        }
    }
}

/// Discriminant of [`Effect`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    IntegerRegister,
    FloatRegister,
    VectorRegister,
    ControlStatusRegister,
    MemoryRead,
    MemoryWrite,
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IntegerRegister => write!(f, "integer register"),
            Self::FloatRegister => write!(f, "float register"),
            Self::VectorRegister => write!(f, "vector register"),
            Self::ControlStatusRegister => write!(f, "CSR"),
            Self::MemoryRead => write!(f, "memory read"),
            Self::MemoryWrite => write!(f, "memory write"),
        }
    }
}
