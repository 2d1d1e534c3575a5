//! Load/store classification from the raw encoding.
//!
//! Only the LOAD-FP and STORE-FP major opcodes are tracked; these carry every
//! vector memory operation as well as the scalar floating-point loads and
//! stores that share the vector unit's memory path.

use crate::encode::{decode_funct3, decode_mop, decode_nf, decode_opcode, decode_rs2};

/// LOAD-FP major opcode (`0000111`).
pub const OPCODE_LOAD_FP: u8 = 0b000_0111;
/// STORE-FP major opcode (`0100111`).
pub const OPCODE_STORE_FP: u8 = 0b010_0111;
/// OP-V major opcode (`1010111`).
pub const OPCODE_OP_V: u8 = 0b101_0111;

/// `lumop`/`sumop` selecting a whole-register load/store.
const LUMOP_WHOLE_REGISTER: u8 = 0b01000;
/// `lumop`/`sumop` selecting a mask load/store (`vlm.v` / `vsm.v`).
const LUMOP_MASK: u8 = 0b01011;

/// Memory class of an instruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InstrClass {
    Load,
    Store,
    /// Anything else, including illegal encodings.
    #[default]
    Other,
}

impl InstrClass {
    /// Classify a raw 32-bit encoding by its opcode field.
    #[must_use]
    pub const fn of(instr: u32) -> Self {
        match decode_opcode(instr) {
            OPCODE_LOAD_FP => Self::Load,
            OPCODE_STORE_FP => Self::Store,
            _ => Self::Other,
        }
    }

    #[must_use]
    pub const fn is_load(self) -> bool {
        matches!(self, Self::Load)
    }

    #[must_use]
    pub const fn is_store(self) -> bool {
        matches!(self, Self::Store)
    }

    #[must_use]
    pub const fn is_memory(self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// Addressing mode of a vector memory instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VectorAddressing {
    UnitStride,
    /// Whole-register transfer of `registers` registers (`vl<n>r` / `vs<n>r`).
    WholeRegister { registers: u8 },
    /// `vlm.v` / `vsm.v`: `ceil(vl / 8)` bytes, never masked.
    Mask,
    Strided,
    Indexed { ordered: bool },
}

/// Decoded layout of a vector load or store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VectorMemoryOp {
    /// Element width encoded in the width field, in bits.
    pub eew_bits: u16,
    /// Number of segment fields (`nf + 1`).
    pub fields: u8,
    pub addressing: VectorAddressing,
}

/// Element width in bits encoded by a vector memory width field.
#[must_use]
pub const fn vector_memory_eew(width: u8) -> Option<u16> {
    match width {
        0b000 => Some(8),
        0b101 => Some(16),
        0b110 => Some(32),
        0b111 => Some(64),
        _ => None,
    }
}

/// Decode the vector memory layout of a LOAD-FP/STORE-FP encoding.
///
/// Returns `None` for scalar floating-point loads/stores and for any other opcode.
#[must_use]
pub const fn vector_memory_op(instr: u32) -> Option<VectorMemoryOp> {
    if !InstrClass::of(instr).is_memory() {
        return None;
    }
    let Some(eew_bits) = vector_memory_eew(decode_funct3(instr)) else {
        return None;
    };
    let fields = decode_nf(instr) + 1;
    let addressing = match decode_mop(instr) {
        0b00 => match decode_rs2(instr) {
            LUMOP_WHOLE_REGISTER => VectorAddressing::WholeRegister { registers: fields },
            LUMOP_MASK => VectorAddressing::Mask,
            _ => VectorAddressing::UnitStride,
        },
        0b01 => VectorAddressing::Indexed { ordered: false },
        0b10 => VectorAddressing::Strided,
        _ => VectorAddressing::Indexed { ordered: true },
    };
    Some(VectorMemoryOp {
        eew_bits,
        fields,
        addressing,
    })
}

/// Access width in bytes of a scalar floating-point load/store (`flh`..`fsq`).
#[must_use]
pub const fn scalar_fp_access_bytes(instr: u32) -> Option<u8> {
    if !InstrClass::of(instr).is_memory() {
        return None;
    }
    match decode_funct3(instr) {
        0b001 => Some(2),
        0b010 => Some(4),
        0b011 => Some(8),
        0b100 => Some(16),
        _ => None,
    }
}

/// Width in bytes of each individual memory access a load/store performs.
///
/// Indexed accesses move data elements of SEW, which is not known from the
/// encoding alone; pass the current SEW in bytes as `sew_bytes`.
#[must_use]
pub const fn memory_access_bytes(instr: u32, sew_bytes: u8) -> Option<u8> {
    if let Some(bytes) = scalar_fp_access_bytes(instr) {
        return Some(bytes);
    }
    match vector_memory_op(instr) {
        Some(VectorMemoryOp {
            addressing: VectorAddressing::Indexed { .. },
            ..
        }) => Some(sew_bytes),
        Some(VectorMemoryOp {
            addressing: VectorAddressing::Mask,
            ..
        }) => Some(1),
        Some(op) => Some((op.eew_bits / 8) as u8),
        None => None,
    }
}

/// True for any vector instruction: OP-V or a vector load/store.
#[must_use]
pub const fn is_vector(instr: u32) -> bool {
    decode_opcode(instr) == OPCODE_OP_V || vector_memory_op(instr).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_load_store_other() {
        assert_eq!(InstrClass::of(0x0005_6407), InstrClass::Load);
        assert_eq!(InstrClass::of(0x0005_6427), InstrClass::Store);
        // addi x0, x0, 0
        assert_eq!(InstrClass::of(0x0000_0013), InstrClass::Other);
        // integer lw is not tracked
        assert_eq!(InstrClass::of(0x0005_2283), InstrClass::Other);
    }

    #[test]
    fn test_classify_tolerates_any_encoding() {
        for instr in [0, u32::MAX, 0xDEAD_BEEF, 0x0000_0007, 0xFFFF_FF87, 0xFFFF_FFA7] {
            let class = InstrClass::of(instr);
            assert!(!(class.is_load() && class.is_store()));
        }
        assert!(InstrClass::of(0xFFFF_FF87).is_load());
        assert!(InstrClass::of(0xFFFF_FFA7).is_store());
        assert_eq!(InstrClass::of(u32::MAX), InstrClass::Other);
    }

    #[test]
    fn test_vector_memory_op() {
        // vle32.v v8, (a0), v0.t
        let op = vector_memory_op(0x0005_6407).unwrap();
        assert_eq!(op.eew_bits, 32);
        assert_eq!(op.fields, 1);
        assert_eq!(op.addressing, VectorAddressing::UnitStride);

        // vl2re8.v v4, (a0): nf=1, lumop=01000, width=000
        let instr = (1 << 29) | (0b01000 << 20) | (10 << 15) | (4 << 7) | 0x07 | (1 << 25);
        let op = vector_memory_op(instr).unwrap();
        assert_eq!(op.addressing, VectorAddressing::WholeRegister { registers: 2 });

        // vlm.v v1, (a0)
        let instr = (0b01011 << 20) | (10 << 15) | (1 << 7) | 0x07 | (1 << 25);
        assert_eq!(vector_memory_op(instr).unwrap().addressing, VectorAddressing::Mask);

        // flw f1, 0(a0)
        assert!(vector_memory_op(0x0005_2087).is_none());
        assert_eq!(scalar_fp_access_bytes(0x0005_2087), Some(4));
    }

    #[test]
    fn test_memory_access_bytes() {
        assert_eq!(memory_access_bytes(0x0005_6407, 8), Some(4));
        // vluxei8.v v8, (a0), v4 moves SEW-sized data
        let instr = (1 << 26) | (4 << 20) | (10 << 15) | (8 << 7) | 0x07 | (1 << 25);
        assert_eq!(memory_access_bytes(instr, 8), Some(8));
        assert_eq!(memory_access_bytes(0x0000_0013, 8), None);
    }
}
