//! Reconciler configuration.

use std::str::FromStr;

use rvce_state::{MemoryError, SizeClass};

/// How a logged memory-read size maps onto a re-issued load width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReadWidthConvention {
    /// The logged size minus one is used as the size-class code, so a logged
    /// `1` re-reads a byte and a logged `2` a half-word.
    #[default]
    Observed,
    /// The logged size is a byte count (1/2/4).
    ByteCount,
}

impl ReadWidthConvention {
    /// Size class to re-read for an entry logged with `logged` size.
    ///
    /// # Errors
    ///
    /// Fails if the resulting width is not byte, half or word.
    pub const fn size_class(self, logged: u8) -> Result<SizeClass, MemoryError> {
        match self {
            Self::Observed => match logged.checked_sub(1) {
                Some(code) => SizeClass::from_code(code),
                None => Err(MemoryError::UnsupportedWidth(logged)),
            },
            Self::ByteCount => SizeClass::from_bytes(logged),
        }
    }
}

impl FromStr for ReadWidthConvention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "observed" | "legacy" => Ok(Self::Observed),
            "bytes" | "byte-count" | "bytecount" => Ok(Self::ByteCount),
            _ => Err(format!("unknown read width convention: {s}")),
        }
    }
}

/// How much of `v0` is captured as the element mask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MaskSource {
    /// Byte 0 of `v0` only: elements 8 and up read as inactive.
    FirstByte,
    /// One bit per element up to `vl`.
    #[default]
    VectorLength,
}

impl FromStr for MaskSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first-byte" | "byte" => Ok(Self::FirstByte),
            "vl" | "vector-length" => Ok(Self::VectorLength),
            _ => Err(format!("unknown mask source: {s}")),
        }
    }
}

/// Configuration for trace reconciliation.
#[derive(Clone, Debug, Default)]
pub struct ReconcileConfig {
    pub read_width: ReadWidthConvention,
    pub mask_source: MaskSource,
    /// Log and skip vector writes with no representable layout instead of failing.
    pub skip_unsupported: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observed_width_is_one_class_narrower() {
        let conv = ReadWidthConvention::Observed;
        assert_eq!(conv.size_class(1), Ok(SizeClass::Byte));
        assert_eq!(conv.size_class(2), Ok(SizeClass::Half));
        assert_eq!(conv.size_class(3), Ok(SizeClass::Word));
        assert_eq!(conv.size_class(4), Err(MemoryError::UnsupportedSize(3)));
        assert_eq!(conv.size_class(0), Err(MemoryError::UnsupportedWidth(0)));
    }

    #[test]
    fn test_byte_count_width() {
        let conv = ReadWidthConvention::ByteCount;
        assert_eq!(conv.size_class(1), Ok(SizeClass::Byte));
        assert_eq!(conv.size_class(4), Ok(SizeClass::Word));
        assert_eq!(conv.size_class(8), Err(MemoryError::UnsupportedWidth(8)));
    }

    #[test]
    fn test_parse_options() {
        assert_eq!("Observed".parse(), Ok(ReadWidthConvention::Observed));
        assert_eq!("byte-count".parse(), Ok(ReadWidthConvention::ByteCount));
        assert!("words".parse::<ReadWidthConvention>().is_err());
        assert_eq!("vl".parse(), Ok(MaskSource::VectorLength));
        assert_eq!("first-byte".parse(), Ok(MaskSource::FirstByte));
    }

    #[test]
    fn test_default_config() {
        let config = ReconcileConfig::default();
        assert_eq!(config.read_width, ReadWidthConvention::Observed);
        assert_eq!(config.mask_source, MaskSource::VectorLength);
        assert!(!config.skip_unsupported);
    }
}
