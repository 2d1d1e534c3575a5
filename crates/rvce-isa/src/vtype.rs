//! `vtype` decoding: element width and register group multiplier.

/// Selected element width (`vsew`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementWidth {
    E8,
    E16,
    E32,
    E64,
}

impl ElementWidth {
    /// Decode a `vsew` selector. Selectors above 3 are reserved.
    #[must_use]
    pub const fn from_selector(vsew: u8) -> Option<Self> {
        match vsew {
            0 => Some(Self::E8),
            1 => Some(Self::E16),
            2 => Some(Self::E32),
            3 => Some(Self::E64),
            _ => None,
        }
    }

    /// Element width for a width in bits (8/16/32/64).
    #[must_use]
    pub const fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            8 => Some(Self::E8),
            16 => Some(Self::E16),
            32 => Some(Self::E32),
            64 => Some(Self::E64),
            _ => None,
        }
    }

    #[must_use]
    pub const fn selector(self) -> u8 {
        match self {
            Self::E8 => 0,
            Self::E16 => 1,
            Self::E32 => 2,
            Self::E64 => 3,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u16 {
        8u16 << self.selector()
    }

    #[must_use]
    pub const fn bytes(self) -> u8 {
        1u8 << self.selector()
    }
}

/// Register group multiplier (`vlmul`), stored as `log2(LMUL)` in `-3..=3`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GroupMultiplier {
    log2: i8,
}

impl GroupMultiplier {
    pub const ONE: Self = Self { log2: 0 };

    /// Decode a `vlmul` selector. Selector `0b100` is reserved.
    #[must_use]
    pub const fn from_selector(vlmul: u8) -> Option<Self> {
        let log2 = match vlmul {
            0..=3 => vlmul as i8,
            5 => -3,
            6 => -2,
            7 => -1,
            _ => return None,
        };
        Some(Self { log2 })
    }

    #[must_use]
    pub const fn from_log2(log2: i8) -> Option<Self> {
        if log2 < -3 || log2 > 3 {
            return None;
        }
        Some(Self { log2 })
    }

    #[must_use]
    pub const fn log2(self) -> i8 {
        self.log2
    }

    #[must_use]
    pub const fn selector(self) -> u8 {
        (self.log2 as u8) & 0x7
    }

    #[must_use]
    pub const fn is_fractional(self) -> bool {
        self.log2 < 0
    }

    /// Number of architectural registers the group occupies (at least one).
    #[must_use]
    pub const fn registers(self) -> u32 {
        if self.log2 <= 0 { 1 } else { 1 << self.log2 as u32 }
    }

    /// Bits of the group holding body elements: `VLEN * LMUL`.
    #[must_use]
    pub const fn group_bits(self, vlen_bits: u32) -> u32 {
        if self.log2 >= 0 {
            vlen_bits << self.log2 as u32
        } else {
            vlen_bits >> (-self.log2) as u32
        }
    }

    /// Effective multiplier for an operand of width `eew` under `sew`:
    /// `EMUL = (EEW / SEW) * LMUL`. `None` if the result leaves `1/8..=8`.
    #[must_use]
    pub const fn scaled(self, eew: ElementWidth, sew: ElementWidth) -> Option<Self> {
        Self::from_log2(self.log2 + eew.selector() as i8 - sew.selector() as i8)
    }

    /// Maximum element count of a group: `VLEN * LMUL / eew`.
    #[must_use]
    pub const fn vlmax(self, vlen_bits: u32, eew: ElementWidth) -> u32 {
        self.group_bits(vlen_bits) / eew.bits() as u32
    }
}

/// Decoded `vtype` CSR.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VectorType {
    /// Raw `vsew` selector (bits [5:3]).
    pub vsew: u8,
    /// Raw `vlmul` selector (bits [2:0]).
    pub vlmul: u8,
    pub vta: bool,
    pub vma: bool,
    pub vill: bool,
}

impl VectorType {
    /// Decode a raw `vtype` value; `vill` sits in bit `xlen - 1`.
    #[must_use]
    pub const fn decode(vtype: u64, xlen: u8) -> Self {
        Self {
            vsew: ((vtype >> 3) & 0x7) as u8,
            vlmul: (vtype & 0x7) as u8,
            vta: (vtype >> 6) & 1 == 1,
            vma: (vtype >> 7) & 1 == 1,
            vill: (vtype >> (xlen.saturating_sub(1) as u32)) & 1 == 1,
        }
    }

    #[must_use]
    pub const fn sew(&self) -> Option<ElementWidth> {
        ElementWidth::from_selector(self.vsew)
    }

    #[must_use]
    pub const fn lmul(&self) -> Option<GroupMultiplier> {
        GroupMultiplier::from_selector(self.vlmul)
    }
}
