//! Log reconciliation: reference-model trace to commit-event effects.

use rvce_state::{MemoryPort, ReferenceModel, RegisterClass, TraceBuffer, VectorRegisterFile};
use tracing::{debug, debug_span, error, warn};

use crate::config::ReconcileConfig;
use crate::effect::{Effect, MemoryAccess};
use crate::error::{Error, Result};
use crate::event::CommitEvent;
use crate::vector::reconstruct;

/// Turns one step's trace into the effect list of a [`CommitEvent`].
///
/// Reconciliation only reads the reference model: memory is re-read to
/// materialize load values, and vector register groups are read back to
/// rebuild partial writes. Nothing is written.
#[derive(Clone, Debug, Default)]
pub struct LogReconciler {
    config: ReconcileConfig,
}

impl LogReconciler {
    #[must_use]
    pub const fn new(config: ReconcileConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Reconcile `trace` into `event`, replacing any earlier effects.
    ///
    /// Effects are appended as memory reads, then register writes, then
    /// memory writes, each in trace order. On error the event is left with
    /// no effects and unreconciled.
    ///
    /// # Errors
    ///
    /// [`Error::NotIssued`] if the event is not in flight, [`Error::Memory`]
    /// if a read cannot be re-issued (including unsupported widths),
    /// [`Error::InvalidVectorConfig`] or [`Error::UnsupportedEffect`] for vector
    /// writes that cannot be rebuilt.
    pub fn reconcile<M, V>(&self, event: &mut CommitEvent, trace: &TraceBuffer, memory: &M, vrf: &V) -> Result<()>
    where
        M: MemoryPort + ?Sized,
        V: VectorRegisterFile + ?Sized,
    {
        let pc = event.pc();
        if !event.issued() {
            error!(pc = format!("{pc:#x}"), "reconcile before issue");
            return Err(Error::NotIssued { pc });
        }

        let span = debug_span!("reconcile", pc = format!("{pc:#x}"));
        let _enter = span.enter();

        event.clear_effects();
        if let Err(err) = self.collect(event, trace, memory, vrf) {
            if err.is_contract_violation() {
                error!(error = %err, "reconciliation failed");
            }
            event.clear_effects();
            return Err(err);
        }
        event.mark_reconciled();
        debug!(effects = event.effects().len(), "reconciled");
        Ok(())
    }

    /// [`reconcile`](Self::reconcile) against the model's own trace, memory and vector unit.
    ///
    /// # Errors
    ///
    /// As for [`reconcile`](Self::reconcile).
    pub fn reconcile_model<R: ReferenceModel>(&self, event: &mut CommitEvent, model: &R) -> Result<()> {
        self.reconcile(event, model.trace(), model.memory(), model.vector_registers())
    }

    fn collect<M, V>(&self, event: &mut CommitEvent, trace: &TraceBuffer, memory: &M, vrf: &V) -> Result<()>
    where
        M: MemoryPort + ?Sized,
        V: VectorRegisterFile + ?Sized,
    {
        for entry in trace.memory_reads() {
            let size = self.config.read_width.size_class(entry.size)?;
            let value = memory.read(entry.addr, size)?;
            debug!(
                addr = format!("{:#x}", entry.addr),
                value = format!("{value:#x}"),
                size = entry.size,
                "memory read reconciled"
            );
            event.push_effect(Effect::MemoryRead(MemoryAccess {
                addr: entry.addr,
                value,
                size: entry.size,
            }));
        }

        // Vector group members may be logged individually; only the lowest
        // register of each group is reconstructed.
        let mut vector_bases: Vec<u32> = trace
            .register_writes()
            .iter()
            .filter(|w| w.class == RegisterClass::Vector)
            .map(|w| w.index)
            .collect();
        vector_bases.sort_unstable();
        let mut covered_until = 0u32;

        for write in trace.register_writes() {
            match write.class {
                RegisterClass::Integer if write.index == 0 => {}
                RegisterClass::Integer => {
                    debug!(reg = write.index, value = format!("{:#x}", write.value), "x write");
                    event.push_effect(Effect::IntegerRegister {
                        index: write.index as u8,
                        value: write.value as u64,
                    });
                }
                RegisterClass::Float => {
                    debug!(reg = write.index, value = format!("{:#x}", write.value), "f write");
                    event.push_effect(Effect::FloatRegister {
                        index: write.index as u8,
                        value: write.value,
                    });
                }
                RegisterClass::Csr => {
                    debug!(csr = format!("{:#x}", write.index), value = format!("{:#x}", write.value), "csr write");
                    event.push_effect(Effect::ControlStatusRegister {
                        addr: write.index as u16,
                        value: write.value as u64,
                    });
                }
                RegisterClass::VectorConfig => event.mark_vector(),
                RegisterClass::Vector => {}
            }
        }

        for index in vector_bases {
            if index < covered_until {
                continue;
            }
            event.mark_vector();
            let base = u8::try_from(index).unwrap_or(u8::MAX);
            match reconstruct(event, base, vrf) {
                Ok(write) => {
                    covered_until = index + write.registers();
                    event.push_effect(Effect::VectorRegister(write));
                }
                Err(err @ Error::UnsupportedEffect { .. }) if self.config.skip_unsupported => {
                    warn!(reg = index, error = %err, "vector write left unchecked");
                }
                Err(err) => return Err(err),
            }
        }

        for entry in trace.memory_writes() {
            debug!(
                addr = format!("{:#x}", entry.addr),
                value = format!("{:#x}", entry.value),
                size = entry.size,
                "memory write reconciled"
            );
            event.push_effect(Effect::MemoryWrite(MemoryAccess {
                addr: entry.addr,
                value: entry.value,
                size: entry.size,
            }));
        }
        Ok(())
    }
}

/// Clear the three trace logs. Must run before the reference model steps
/// again, or the next reconciliation sees this step's entries.
pub fn log_reset(trace: &mut TraceBuffer) {
    trace.clear();
}
