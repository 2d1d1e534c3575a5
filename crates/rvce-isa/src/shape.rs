//! Shape of the vector register group an instruction writes.
//!
//! The reconciler needs to know, for a vector-register write, which bytes of
//! the destination group belong to which element. That depends on the
//! effective element width and group multiplier of the destination, which
//! differ from `vtype` for widening ops, vector loads with an encoded EEW,
//! mask-producing ops and whole-register moves.

use crate::classify::{InstrClass, OPCODE_OP_V, VectorAddressing, vector_memory_op};
use crate::encode::{decode_funct3, decode_funct6, decode_opcode, decode_rs1, decode_simm5, decode_vm};
use crate::vtype::{ElementWidth, GroupMultiplier, VectorType};

const OPIVV: u8 = 0b000;
const OPFVV: u8 = 0b001;
const OPMVV: u8 = 0b010;
const OPIVI: u8 = 0b011;
const OPIVX: u8 = 0b100;
const OPFVF: u8 = 0b101;
const OPMVX: u8 = 0b110;
const OPCFG: u8 = 0b111;

/// Which elements of the destination group an instruction defines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BodyExtent {
    /// Elements `vstart..vl`.
    VectorLength,
    /// `ceil(vl / 8)` bytes (`vlm.v`).
    MaskBytes,
    /// Element 0 only (reductions, `vmv.s.x`, `vfmv.s.f`); the rest is tail.
    ScalarElement,
    /// Every element of this many whole registers, regardless of `vl`.
    WholeRegisters(u8),
    /// `vcompress.vm`: the active elements of `vs1` are packed from element 0,
    /// everything past them is tail. The packed count is not known from `v0`.
    Compressed,
}

/// Layout of a vector destination register group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DestinationShape {
    /// Effective element width of the destination.
    pub eew: ElementWidth,
    /// Effective group multiplier of the destination (per segment field).
    pub emul: GroupMultiplier,
    /// Segment fields written; each field occupies its own `emul` group.
    pub fields: u8,
    pub body: BodyExtent,
    /// Destination holds one mask bit per element.
    pub mask_destination: bool,
    /// Body elements are predicated by `v0`.
    pub masked: bool,
}

impl DestinationShape {
    const fn regular(eew: ElementWidth, emul: GroupMultiplier, masked: bool) -> Self {
        Self {
            eew,
            emul,
            fields: 1,
            body: BodyExtent::VectorLength,
            mask_destination: false,
            masked,
        }
    }

    const fn mask(masked: bool) -> Self {
        Self {
            eew: ElementWidth::E8,
            emul: GroupMultiplier::ONE,
            fields: 1,
            body: BodyExtent::VectorLength,
            mask_destination: true,
            masked,
        }
    }

    const fn scalar(eew: ElementWidth) -> Self {
        Self {
            eew,
            emul: GroupMultiplier::ONE,
            fields: 1,
            body: BodyExtent::ScalarElement,
            mask_destination: false,
            masked: false,
        }
    }

    /// Total architectural registers covered by the destination.
    #[must_use]
    pub const fn registers(&self) -> u32 {
        match self.body {
            BodyExtent::WholeRegisters(n) => n as u32,
            _ => self.emul.registers() * self.fields as u32,
        }
    }
}

/// Work out the destination shape of a vector instruction under `vtype`.
///
/// Returns `None` when the instruction writes no vector register (stores,
/// `vset*`, moves to scalar registers) or when `vtype` holds a reserved
/// encoding that gives no valid destination layout. Whole-register loads and
/// moves get a shape under any `vtype`, `vill` included.
#[must_use]
pub fn destination_shape(instr: u32, vtype: &VectorType) -> Option<DestinationShape> {
    if let Some(shape) = whole_register_shape(instr, vtype) {
        return Some(shape);
    }
    let sew = vtype.sew()?;
    let lmul = vtype.lmul()?;
    let masked = !decode_vm(instr);

    if let Some(op) = vector_memory_op(instr) {
        if !InstrClass::of(instr).is_load() {
            return None;
        }
        let shape = match op.addressing {
            VectorAddressing::WholeRegister { .. } => return None,
            VectorAddressing::Mask => DestinationShape {
                body: BodyExtent::MaskBytes,
                ..DestinationShape::regular(ElementWidth::E8, GroupMultiplier::ONE, false)
            },
            VectorAddressing::Indexed { .. } => DestinationShape {
                fields: op.fields,
                ..DestinationShape::regular(sew, lmul, masked)
            },
            VectorAddressing::UnitStride | VectorAddressing::Strided => {
                let eew = ElementWidth::from_bits(op.eew_bits)?;
                DestinationShape {
                    fields: op.fields,
                    ..DestinationShape::regular(eew, lmul.scaled(eew, sew)?, masked)
                }
            }
        };
        return Some(shape);
    }

    if decode_opcode(instr) != OPCODE_OP_V {
        return None;
    }

    let funct6 = decode_funct6(instr);
    let widened = || {
        let eew = ElementWidth::from_bits(sew.bits() * 2)?;
        Some((eew, lmul.scaled(eew, sew)?))
    };

    let shape = match decode_funct3(instr) {
        OPCFG => return None,
        OPIVV | OPIVX | OPIVI => match funct6 {
            // vadc / vsbc / vmerge use v0 as an operand, not as a predicate
            0x10 | 0x12 | 0x17 => DestinationShape::regular(sew, lmul, false),
            // vmadc / vmsbc
            0x11 | 0x13 => DestinationShape::mask(false),
            0x18..=0x1F => DestinationShape::mask(masked),
            // vwredsumu / vwredsum
            0x30 | 0x31 if decode_funct3(instr) == OPIVV => DestinationShape::scalar(widened()?.0),
            _ => DestinationShape::regular(sew, lmul, masked),
        },
        OPMVV => match funct6 {
            0x00..=0x07 => DestinationShape::scalar(sew),
            // vmv.x.s / vcpop.m / vfirst.m write a scalar register
            0x10 => return None,
            // vmsbf / vmsof / vmsif
            0x14 if matches!(decode_rs1(instr), 1..=3) => DestinationShape::mask(masked),
            // vcompress is never masked
            0x17 => DestinationShape {
                body: BodyExtent::Compressed,
                ..DestinationShape::regular(sew, lmul, false)
            },
            // mask-register logical ops
            0x18..=0x1F => DestinationShape::mask(false),
            0x30..=0x3F => {
                let (eew, emul) = widened()?;
                DestinationShape::regular(eew, emul, masked)
            }
            _ => DestinationShape::regular(sew, lmul, masked),
        },
        OPMVX => match funct6 {
            // vmv.s.x
            0x10 => DestinationShape::scalar(sew),
            0x30..=0x3F => {
                let (eew, emul) = widened()?;
                DestinationShape::regular(eew, emul, masked)
            }
            _ => DestinationShape::regular(sew, lmul, masked),
        },
        OPFVV | OPFVF => match funct6 {
            0x01 | 0x03 | 0x05 | 0x07 if decode_funct3(instr) == OPFVV => DestinationShape::scalar(sew),
            0x31 | 0x33 if decode_funct3(instr) == OPFVV => DestinationShape::scalar(widened()?.0),
            // vfmv.f.s writes a scalar register
            0x10 if decode_funct3(instr) == OPFVV => return None,
            // vfmv.s.f
            0x10 => DestinationShape::scalar(sew),
            // vfwcvt.*
            0x12 if matches!(decode_rs1(instr), 0x08..=0x0F) => {
                let (eew, emul) = widened()?;
                DestinationShape::regular(eew, emul, masked)
            }
            // vfmerge / vfmv.v.f
            0x17 => DestinationShape::regular(sew, lmul, false),
            0x18..=0x1F => DestinationShape::mask(masked),
            0x30..=0x3F => {
                let (eew, emul) = widened()?;
                DestinationShape::regular(eew, emul, masked)
            }
            _ => DestinationShape::regular(sew, lmul, masked),
        },
        _ => unreachable!("funct3 is a 3-bit field"),
    };
    Some(shape)
}

/// `vl<n>r.v` and `vmv<n>r.v`. Neither depends on `vtype`; a move counts
/// its elements in SEW when that is valid, bytes otherwise.
fn whole_register_shape(instr: u32, vtype: &VectorType) -> Option<DestinationShape> {
    let (eew, registers) = match vector_memory_op(instr) {
        Some(op) => match op.addressing {
            VectorAddressing::WholeRegister { registers } if InstrClass::of(instr).is_load() => {
                (ElementWidth::from_bits(op.eew_bits)?, registers)
            }
            _ => return None,
        },
        None if decode_opcode(instr) == OPCODE_OP_V
            && decode_funct3(instr) == OPIVI
            && decode_funct6(instr) == 0x27 =>
        {
            (vtype.sew().unwrap_or(ElementWidth::E8), decode_simm5(instr) + 1)
        }
        None => return None,
    };
    Some(DestinationShape {
        eew,
        emul: GroupMultiplier::ONE,
        fields: 1,
        body: BodyExtent::WholeRegisters(registers),
        mask_destination: false,
        masked: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vtype(vsew: u8, vlmul: u8) -> VectorType {
        VectorType {
            vsew,
            vlmul,
            ..Default::default()
        }
    }

    fn op_v(funct6: u32, funct3: u32, vm: bool) -> u32 {
        (funct6 << 26) | (u32::from(vm) << 25) | (2 << 20) | (3 << 15) | (funct3 << 12) | (1 << 7) | 0x57
    }

    #[test]
    fn test_shape_plain_arith() {
        let shape = destination_shape(op_v(0x00, 0, true), &vtype(2, 1)).unwrap();
        assert_eq!(shape.eew, ElementWidth::E32);
        assert_eq!(shape.registers(), 2);
        assert!(!shape.masked);
        assert!(!shape.mask_destination);
        assert_eq!(shape.body, BodyExtent::VectorLength);

        let shape = destination_shape(op_v(0x00, 0, false), &vtype(2, 1)).unwrap();
        assert!(shape.masked);
    }

    #[test]
    fn test_shape_widening() {
        // vwaddu.vv at e16/m1 writes e32/m2
        let shape = destination_shape(op_v(0x30, 2, true), &vtype(1, 0)).unwrap();
        assert_eq!(shape.eew, ElementWidth::E32);
        assert_eq!(shape.registers(), 2);
        // no valid layout at e64
        assert!(destination_shape(op_v(0x30, 2, true), &vtype(3, 0)).is_none());
    }

    #[test]
    fn test_shape_compare_and_merge() {
        let shape = destination_shape(op_v(0x18, 0, false), &vtype(2, 3)).unwrap();
        assert!(shape.mask_destination);
        assert!(shape.masked);
        assert_eq!(shape.registers(), 1);

        let shape = destination_shape(op_v(0x17, 0, false), &vtype(2, 0)).unwrap();
        assert!(!shape.masked);
    }

    #[test]
    fn test_shape_compress() {
        let shape = destination_shape(op_v(0x17, 2, true), &vtype(2, 1)).unwrap();
        assert_eq!(shape.body, BodyExtent::Compressed);
        assert_eq!(shape.registers(), 2);
        assert!(!shape.masked);
    }

    #[test]
    fn test_shape_reduction_and_scalar_move() {
        let shape = destination_shape(op_v(0x00, 2, false), &vtype(2, 2)).unwrap();
        assert_eq!(shape.body, BodyExtent::ScalarElement);
        assert_eq!(shape.registers(), 1);
        assert!(destination_shape(op_v(0x10, 2, true), &vtype(2, 0)).is_none());
        let shape = destination_shape(op_v(0x10, 6, true), &vtype(2, 0)).unwrap();
        assert_eq!(shape.body, BodyExtent::ScalarElement);
    }

    #[test]
    fn test_shape_vector_loads() {
        // vle8.v v8, (a0) under e32/m4 -> EMUL = 1
        let instr = (1 << 25) | (10 << 15) | (8 << 7) | 0x07;
        let shape = destination_shape(instr, &vtype(2, 2)).unwrap();
        assert_eq!(shape.eew, ElementWidth::E8);
        assert_eq!(shape.emul, GroupMultiplier::ONE);

        // vlseg3e32.v v8, (a0): three fields of one register each at e32/m1
        let instr = (2 << 29) | (1 << 25) | (10 << 15) | (0b110 << 12) | (8 << 7) | 0x07;
        let shape = destination_shape(instr, &vtype(2, 0)).unwrap();
        assert_eq!(shape.fields, 3);
        assert_eq!(shape.registers(), 3);

        // stores have no register destination
        assert!(destination_shape(0x0005_6427, &vtype(2, 0)).is_none());
    }

    #[test]
    fn test_shape_whole_register_move() {
        // vmv2r.v v2, v4
        let instr = (0x27 << 26) | (1 << 25) | (4 << 20) | (1 << 15) | (u32::from(OPIVI) << 12) | (2 << 7) | 0x57;
        let shape = destination_shape(instr, &vtype(0, 0)).unwrap();
        assert_eq!(shape.body, BodyExtent::WholeRegisters(2));
        assert_eq!(shape.registers(), 2);
    }

    #[test]
    fn test_shape_whole_register_ignores_vtype() {
        let illegal = VectorType {
            vsew: 5,
            vlmul: 4,
            vill: true,
            ..Default::default()
        };
        // vl2re8.v v4, (a0)
        let instr = (1 << 29) | (1 << 25) | (0b01000 << 20) | (10 << 15) | (4 << 7) | 0x07;
        let shape = destination_shape(instr, &illegal).unwrap();
        assert_eq!(shape.body, BodyExtent::WholeRegisters(2));
        assert_eq!(shape.eew, ElementWidth::E8);

        // vmv4r.v v4, v8
        let instr = (0x27 << 26) | (1 << 25) | (8 << 20) | (3 << 15) | (u32::from(OPIVI) << 12) | (4 << 7) | 0x57;
        let shape = destination_shape(instr, &illegal).unwrap();
        assert_eq!(shape.registers(), 4);

        assert!(destination_shape(op_v(0x00, 0, true), &illegal).is_none());
    }

    #[test]
    fn test_shape_reserved_vtype() {
        assert!(destination_shape(op_v(0x00, 0, true), &vtype(2, 4)).is_none());
        assert!(destination_shape(op_v(0x00, 0, true), &vtype(5, 0)).is_none());
    }
}
