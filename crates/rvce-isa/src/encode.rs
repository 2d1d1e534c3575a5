//! Field extraction helpers for 32-bit RISC-V encodings.

/// Extract opcode field (bits [6:0]).
#[inline]
#[must_use]
pub const fn decode_opcode(instr: u32) -> u8 {
    (instr & 0x7F) as u8
}

/// Extract rd / vd field (bits [11:7]).
#[inline]
#[must_use]
pub const fn decode_rd(instr: u32) -> u8 {
    ((instr >> 7) & 0x1F) as u8
}

/// Extract funct3 field (bits [14:12]). For vector memory ops this is the width field.
#[inline]
#[must_use]
pub const fn decode_funct3(instr: u32) -> u8 {
    ((instr >> 12) & 0x7) as u8
}

/// Extract rs1 field (bits [19:15]).
#[inline]
#[must_use]
pub const fn decode_rs1(instr: u32) -> u8 {
    ((instr >> 15) & 0x1F) as u8
}

/// Extract rs2 / vs2 field (bits [24:20]). Also `lumop`/`sumop` for unit-stride memory ops.
#[inline]
#[must_use]
pub const fn decode_rs2(instr: u32) -> u8 {
    ((instr >> 20) & 0x1F) as u8
}

/// Extract the vector mask bit (bit 25). `0` means the op is masked by `v0`.
#[inline]
#[must_use]
pub const fn decode_vm(instr: u32) -> bool {
    (instr >> 25) & 0x1 == 1
}

/// Extract funct6 field (bits [31:26]) of an OP-V encoding.
#[inline]
#[must_use]
pub const fn decode_funct6(instr: u32) -> u8 {
    ((instr >> 26) & 0x3F) as u8
}

/// Extract the memory addressing mode (`mop`, bits [27:26]).
#[inline]
#[must_use]
pub const fn decode_mop(instr: u32) -> u8 {
    ((instr >> 26) & 0x3) as u8
}

/// Extract the segment field count minus one (`nf`, bits [31:29]).
#[inline]
#[must_use]
pub const fn decode_nf(instr: u32) -> u8 {
    ((instr >> 29) & 0x7) as u8
}

/// Extract the 5-bit immediate of an OPIVI encoding (bits [19:15]).
#[inline]
#[must_use]
pub const fn decode_simm5(instr: u32) -> u8 {
    decode_rs1(instr)
}
