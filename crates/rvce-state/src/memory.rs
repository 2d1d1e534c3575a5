//! Memory read-back: size classes, the typed load port, and a sparse store.

use rustc_hash::FxHashMap;
use thiserror::Error;

/// Page granularity of [`SparseMemory`] (4KB).
pub const PAGE_SIZE: usize = 1 << 12;

const PAGE_MASK: u64 = PAGE_SIZE as u64 - 1;

/// Memory read-back error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("unknown load size {0}")]
    UnsupportedSize(u8),

    #[error("unsupported access width of {0} bytes")]
    UnsupportedWidth(u8),

    #[error("read of unmapped address {0:#x}")]
    Unmapped(u64),
}

/// Width of a re-issued load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SizeClass {
    Byte,
    Half,
    Word,
}

impl SizeClass {
    /// Decode a size-class code (`0` byte, `1` half, `2` word).
    ///
    /// # Errors
    ///
    /// Any other code is [`MemoryError::UnsupportedSize`].
    pub const fn from_code(code: u8) -> Result<Self, MemoryError> {
        match code {
            0 => Ok(Self::Byte),
            1 => Ok(Self::Half),
            2 => Ok(Self::Word),
            _ => Err(MemoryError::UnsupportedSize(code)),
        }
    }

    /// Size class for an access width in bytes (1/2/4).
    ///
    /// # Errors
    ///
    /// Any other width is [`MemoryError::UnsupportedWidth`].
    pub const fn from_bytes(bytes: u8) -> Result<Self, MemoryError> {
        match bytes {
            1 => Ok(Self::Byte),
            2 => Ok(Self::Half),
            4 => Ok(Self::Word),
            _ => Err(MemoryError::UnsupportedWidth(bytes)),
        }
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Byte => 0,
            Self::Half => 1,
            Self::Word => 2,
        }
    }

    #[must_use]
    pub const fn bytes(self) -> u8 {
        1 << self.code()
    }
}

/// Typed load primitives of the reference model's memory subsystem.
///
/// Loads must only be issued after the instruction that produced the logged
/// access has executed, so the port reflects that instruction's own effects.
pub trait MemoryPort {
    /// Load one byte.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be served.
    fn load_u8(&self, addr: u64) -> Result<u8, MemoryError>;

    /// Load a little-endian half-word.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be served.
    fn load_u16(&self, addr: u64) -> Result<u16, MemoryError>;

    /// Load a little-endian word.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be served.
    fn load_u32(&self, addr: u64) -> Result<u32, MemoryError>;

    /// Re-issue a load of `size` at `addr`, zero-extended to 64 bits.
    ///
    /// # Errors
    ///
    /// Propagates the error of the underlying typed load.
    fn read(&self, addr: u64, size: SizeClass) -> Result<u64, MemoryError> {
        match size {
            SizeClass::Byte => self.load_u8(addr).map(u64::from),
            SizeClass::Half => self.load_u16(addr).map(u64::from),
            SizeClass::Word => self.load_u32(addr).map(u64::from),
        }
    }
}

/// Page-granular sparse memory.
///
/// Bytes never written read as zero. In strict mode a read touching a page
/// that was never written fails with [`MemoryError::Unmapped`] instead.
#[derive(Clone, Debug, Default)]
pub struct SparseMemory {
    pages: FxHashMap<u64, Box<[u8; PAGE_SIZE]>>,
    strict: bool,
}

impl SparseMemory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Memory that refuses reads from pages it has never seen written.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    /// Copy a segment of bytes into memory starting at `addr`.
    pub fn load_segment(&mut self, addr: u64, bytes: &[u8]) {
        for (offset, byte) in (0u64..).zip(bytes) {
            self.set_byte(addr.wrapping_add(offset), *byte);
        }
    }

    /// Store the low `size` bytes of `value` little-endian at `addr`.
    pub fn store(&mut self, addr: u64, value: u64, size: u8) {
        let bytes = value.to_le_bytes();
        let len = usize::from(size).min(bytes.len());
        self.load_segment(addr, &bytes[..len]);
    }

    /// Read one byte, honouring strict mode.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::Unmapped`] in strict mode for unseen pages.
    pub fn byte(&self, addr: u64) -> Result<u8, MemoryError> {
        match self.pages.get(&(addr & !PAGE_MASK)) {
            Some(page) => Ok(page[(addr & PAGE_MASK) as usize]),
            None if self.strict => Err(MemoryError::Unmapped(addr)),
            None => Ok(0),
        }
    }

    /// Number of pages currently backed.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn set_byte(&mut self, addr: u64, byte: u8) {
        let page = self
            .pages
            .entry(addr & !PAGE_MASK)
            .or_insert_with(|| Box::new([0; PAGE_SIZE]));
        page[(addr & PAGE_MASK) as usize] = byte;
    }

    fn load_le<const N: usize>(&self, addr: u64) -> Result<[u8; N], MemoryError> {
        let mut out = [0u8; N];
        for (offset, slot) in (0u64..).zip(out.iter_mut()) {
            *slot = self.byte(addr.wrapping_add(offset))?;
        }
        Ok(out)
    }
}

impl MemoryPort for SparseMemory {
    fn load_u8(&self, addr: u64) -> Result<u8, MemoryError> {
        self.byte(addr)
    }

    fn load_u16(&self, addr: u64) -> Result<u16, MemoryError> {
        self.load_le::<2>(addr).map(u16::from_le_bytes)
    }

    fn load_u32(&self, addr: u64) -> Result<u32, MemoryError> {
        self.load_le::<4>(addr).map(u32::from_le_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_class_codes() {
        assert_eq!(SizeClass::from_code(0), Ok(SizeClass::Byte));
        assert_eq!(SizeClass::from_code(1), Ok(SizeClass::Half));
        assert_eq!(SizeClass::from_code(2), Ok(SizeClass::Word));
        for code in [3u8, 7, 255] {
            assert_eq!(SizeClass::from_code(code), Err(MemoryError::UnsupportedSize(code)));
        }
        assert_eq!(SizeClass::Word.bytes(), 4);
        assert_eq!(SizeClass::from_bytes(4), Ok(SizeClass::Word));
        assert_eq!(SizeClass::from_bytes(8), Err(MemoryError::UnsupportedWidth(8)));
    }

    #[test]
    fn test_sparse_read_widths() {
        let mut mem = SparseMemory::new();
        mem.store(0x1000, 0x1122_3344_5566_7788, 8);
        assert_eq!(mem.read(0x1000, SizeClass::Byte).unwrap(), 0x88);
        assert_eq!(mem.read(0x1000, SizeClass::Half).unwrap(), 0x7788);
        assert_eq!(mem.read(0x1000, SizeClass::Word).unwrap(), 0x5566_7788);
        assert_eq!(mem.read(0x1004, SizeClass::Word).unwrap(), 0x1122_3344);
    }

    #[test]
    fn test_sparse_cross_page() {
        let mut mem = SparseMemory::new();
        let addr = PAGE_SIZE as u64 - 2;
        mem.store(addr, 0xAABB_CCDD, 4);
        assert_eq!(mem.page_count(), 2);
        assert_eq!(mem.load_u32(addr).unwrap(), 0xAABB_CCDD);
    }

    #[test]
    fn test_sparse_unwritten_reads() {
        let mem = SparseMemory::new();
        assert_eq!(mem.load_u32(0x8000_0000).unwrap(), 0);

        let mut strict = SparseMemory::strict();
        assert_eq!(strict.load_u8(0x10), Err(MemoryError::Unmapped(0x10)));
        strict.load_segment(0x10, &[1, 2, 3]);
        assert_eq!(strict.load_u16(0x11).unwrap(), 0x0302);
        // same page, never written: zero
        assert_eq!(strict.load_u8(0x20).unwrap(), 0);
    }
}
