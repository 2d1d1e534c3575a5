use rvce_state::{MemoryError, TraceError};
use thiserror::Error;

use crate::effect::EffectKind;

/// Commit-event errors.
///
/// Nothing here is transient. Contract violations mean the harness is wired
/// wrong or the reference model produced a trace shape this crate cannot
/// interpret; the harness should stop on them.
#[derive(Error, Debug)]
pub enum Error {
    #[error("instruction at {pc:#x} issued twice without reset")]
    AlreadyIssued { pc: u64 },
    #[error("instruction at {pc:#x} is not issued")]
    NotIssued { pc: u64 },
    #[error("instruction at {pc:#x} committed twice without reset")]
    AlreadyCommitted { pc: u64 },
    #[error("instruction at {pc:#x} is incomplete at commit: {reason}")]
    Incomplete { pc: u64, reason: &'static str },
    #[error("memory read-back failed: {0}")]
    Memory(#[from] MemoryError),
    #[error("unrecognized trace entry: {0}")]
    Trace(#[from] TraceError),
    #[error("instruction at {pc:#x} produced an unsupported {kind} effect: {reason}")]
    UnsupportedEffect {
        pc: u64,
        kind: EffectKind,
        reason: &'static str,
    },
    #[error("vector register write at {pc:#x} under an illegal vector configuration")]
    InvalidVectorConfig { pc: u64 },
    #[error("commit log line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error("no free event slot")]
    PoolExhausted,
    #[error("event slot {0} is not in use")]
    InvalidSlot(usize),
}

impl Error {
    /// True for wiring bugs and uninterpretable traces, false when an effect
    /// was merely left unchecked.
    #[must_use]
    pub const fn is_contract_violation(&self) -> bool {
        !matches!(self, Self::UnsupportedEffect { .. } | Self::Incomplete { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
