//! Reconstruction of vector register group writes.
//!
//! The reference model logs only that a vector register was written. To be
//! comparable with the hardware's partial-write signals, the whole
//! destination group is read back and every byte is classified by what the
//! instruction was allowed to do to it under its vector configuration.

use rvce_isa::{BodyExtent, DestinationShape, destination_shape};
use rvce_state::{NUM_VECTOR_REGS, VectorRegisterFile};
use tracing::trace;

use crate::effect::{ByteState, EffectKind, VectorRegisterWrite};
use crate::error::{Error, Result};
use crate::event::CommitEvent;

/// What the instruction did to one element (or one mask bit).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ElementState {
    Written,
    Undisturbed,
    Agnostic,
}

impl ElementState {
    const fn byte(self) -> ByteState {
        match self {
            Self::Written => ByteState::Written,
            Self::Undisturbed => ByteState::Undisturbed,
            Self::Agnostic => ByteState::Agnostic,
        }
    }
}

/// Rebuild the write of the group starting at `base` from the post-step
/// register file, using the configuration and mask captured on `event`.
///
/// # Errors
///
/// [`Error::InvalidVectorConfig`] if `vill` was set and the instruction
/// depends on `vtype`. [`Error::UnsupportedEffect`]
/// if the instruction has no destination layout under its `vtype`, is a
/// `vcompress` under `vta`, or the group does not fit the register file.
pub fn reconstruct<V: VectorRegisterFile + ?Sized>(
    event: &CommitEvent,
    base: u8,
    vrf: &V,
) -> Result<VectorRegisterWrite> {
    let pc = event.pc();
    let config = *event.vector_config();
    let unsupported = |reason| Error::UnsupportedEffect {
        pc,
        kind: EffectKind::VectorRegister,
        reason,
    };

    let shape = destination_shape(event.instruction(), &config.vector_type());
    let whole_registers = matches!(shape, Some(DestinationShape { body: BodyExtent::WholeRegisters(_), .. }));
    if config.vill && !whole_registers {
        return Err(Error::InvalidVectorConfig { pc });
    }
    let shape = shape.ok_or_else(|| unsupported("no destination layout under the current vtype"))?;
    if shape.body == BodyExtent::Compressed && config.vta {
        return Err(unsupported("vcompress tail start is unknown under vta"));
    }
    let registers = shape.registers() as usize;
    if usize::from(base) + registers > NUM_VECTOR_REGS {
        return Err(unsupported("destination group runs past v31"));
    }

    let vlenb = vrf.vlenb();
    let mut data = Vec::with_capacity(registers * vlenb);
    for reg in base..base + registers as u8 {
        for index in 0..vlenb {
            let byte = vrf
                .element_u8(reg, index)
                .ok_or_else(|| unsupported("register file is narrower than the destination group"))?;
            data.push(byte);
        }
    }

    let bytes = if shape.mask_destination {
        mask_destination_bytes(event, &shape, vlenb)
    } else {
        element_bytes(event, &shape, registers * vlenb)
    };

    trace!(
        pc = format!("{pc:#x}"),
        base,
        registers,
        written = bytes.iter().filter(|b| b.is_written()).count(),
        "vector write reconstructed"
    );

    Ok(VectorRegisterWrite {
        base,
        config,
        shape,
        data,
        bytes,
    })
}

fn tail_state(event: &CommitEvent) -> ElementState {
    if event.vta() {
        ElementState::Agnostic
    } else {
        ElementState::Undisturbed
    }
}

/// State of body element `index` (below `vl`).
fn body_state(event: &CommitEvent, shape: &DestinationShape, index: usize) -> ElementState {
    if index < usize::from(event.vstart()) {
        ElementState::Undisturbed
    } else if shape.masked && !event.mask_bit(index) {
        if event.vma() {
            ElementState::Agnostic
        } else {
            ElementState::Undisturbed
        }
    } else {
        ElementState::Written
    }
}

/// Byte states for destinations holding whole elements, field by field.
fn element_bytes(event: &CommitEvent, shape: &DestinationShape, group_bytes: usize) -> Vec<ByteState> {
    let vl = event.vl() as usize;
    let prestart = usize::from(event.vstart());
    let eew_bytes = match shape.body {
        BodyExtent::MaskBytes => 1,
        _ => usize::from(shape.eew.bytes()),
    };
    let field_bytes = group_bytes / usize::from(shape.fields.max(1));

    let element = |index: usize| match shape.body {
        // fault-only-first loads may trim vl during the step; this is the vl at issue
        BodyExtent::VectorLength if index < vl => body_state(event, shape, index),
        BodyExtent::VectorLength => tail_state(event),
        // elements past the packed count are undisturbed under tu
        BodyExtent::Compressed if index < vl => body_state(event, shape, index),
        BodyExtent::Compressed => tail_state(event),
        BodyExtent::ScalarElement if index == 0 && prestart < vl => ElementState::Written,
        BodyExtent::ScalarElement if index == 0 => ElementState::Undisturbed,
        BodyExtent::ScalarElement => tail_state(event),
        BodyExtent::MaskBytes if index < prestart => ElementState::Undisturbed,
        BodyExtent::MaskBytes if index < vl.div_ceil(8) => ElementState::Written,
        // vlm.v always updates its tail agnostically
        BodyExtent::MaskBytes => ElementState::Agnostic,
        BodyExtent::WholeRegisters(_) if index < prestart => ElementState::Undisturbed,
        BodyExtent::WholeRegisters(_) => ElementState::Written,
    };

    (0..group_bytes)
        .map(|offset| element((offset % field_bytes) / eew_bytes).byte())
        .collect()
}

/// Byte states for mask destinations: one bit per element in the first
/// register, tail bits always agnostic.
fn mask_destination_bytes(event: &CommitEvent, shape: &DestinationShape, vlenb: usize) -> Vec<ByteState> {
    let vl = event.vl() as usize;
    let bit = |index: usize| {
        if index < vl {
            body_state(event, shape, index)
        } else {
            ElementState::Agnostic
        }
    };

    (0..vlenb)
        .map(|byte| {
            let states: Vec<ElementState> = (0..8).map(|b| bit(byte * 8 + b)).collect();
            let written = states
                .iter()
                .enumerate()
                .filter(|(_, s)| **s == ElementState::Written)
                .fold(0u8, |acc, (b, _)| acc | (1 << b));
            match written {
                0xFF => ByteState::Written,
                0 if states.iter().all(|s| *s == ElementState::Undisturbed) => ByteState::Undisturbed,
                0 => ByteState::Agnostic,
                written => ByteState::Partial { written },
            }
        })
        .collect()
}
