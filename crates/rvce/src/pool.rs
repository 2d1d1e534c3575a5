//! Fixed pool of reusable commit events, one per pipeline tracking slot.

use rvce_state::ReferenceModel;
use tracing::debug;

use crate::config::ReconcileConfig;
use crate::error::{Error, Result};
use crate::event::CommitEvent;
use crate::reconcile::{LogReconciler, log_reset};

/// Commit events indexed by slot id.
///
/// A slot is acquired when the pipeline starts tracking an instruction and
/// released once the comparator is done with it. Release resets the event,
/// so nothing from one instruction survives into the next user of the slot.
#[derive(Debug)]
pub struct EventPool {
    events: Vec<CommitEvent>,
    in_use: Vec<bool>,
    reconciler: LogReconciler,
}

impl EventPool {
    #[must_use]
    pub fn new(capacity: usize, config: ReconcileConfig) -> Self {
        Self {
            events: vec![CommitEvent::new(); capacity],
            in_use: vec![false; capacity],
            reconciler: LogReconciler::new(config),
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.events.len()
    }

    /// Number of acquired slots.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_use.iter().filter(|used| **used).count()
    }

    #[must_use]
    pub const fn reconciler(&self) -> &LogReconciler {
        &self.reconciler
    }

    /// Take the lowest free slot.
    ///
    /// # Errors
    ///
    /// [`Error::PoolExhausted`] if every slot is in use.
    pub fn acquire(&mut self) -> Result<usize> {
        let slot = self.in_use.iter().position(|used| !used).ok_or(Error::PoolExhausted)?;
        self.in_use[slot] = true;
        Ok(slot)
    }

    /// # Errors
    ///
    /// [`Error::InvalidSlot`] if `slot` is not acquired.
    pub fn get(&self, slot: usize) -> Result<&CommitEvent> {
        self.check(slot)?;
        Ok(&self.events[slot])
    }

    /// # Errors
    ///
    /// [`Error::InvalidSlot`] if `slot` is not acquired.
    pub fn get_mut(&mut self, slot: usize) -> Result<&mut CommitEvent> {
        self.check(slot)?;
        Ok(&mut self.events[slot])
    }

    /// Acquire a slot for `instr`, snapshot the model state, capture the
    /// mask and issue. Call before the reference model executes `instr`.
    ///
    /// # Errors
    ///
    /// [`Error::PoolExhausted`] if no slot is free.
    pub fn dispatch<R: ReferenceModel>(&mut self, model: &R, instr: u32) -> Result<usize> {
        let slot = self.acquire()?;
        let mask_source = self.reconciler.config().mask_source;
        let event = &mut self.events[slot];
        event.assign_instruction(model, instr);
        event.capture_mask(model.vector_registers(), mask_source);
        if let Err(err) = event.issue() {
            self.in_use[slot] = false;
            return Err(err);
        }
        debug!(slot, pc = format!("{:#x}", event.pc()), "dispatched");
        Ok(slot)
    }

    /// Reconcile the model's trace into `slot` and commit it. Call after the
    /// reference model executed the instruction.
    ///
    /// The model's trace is cleared whether or not reconciliation succeeds.
    ///
    /// # Errors
    ///
    /// Anything [`LogReconciler::reconcile`] or [`CommitEvent::commit`] reports.
    pub fn retire<R: ReferenceModel>(&mut self, slot: usize, model: &mut R) -> Result<&CommitEvent> {
        self.check(slot)?;
        let event = &mut self.events[slot];
        let result = self
            .reconciler
            .reconcile_model(event, model)
            .and_then(|()| event.commit());
        log_reset(model.trace_mut());
        result?;
        debug!(slot, effects = event.effects().len(), "retired");
        Ok(&self.events[slot])
    }

    /// Drop a flushed instruction: its effects are discarded and the slot freed.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSlot`] if `slot` is not acquired.
    pub fn flush(&mut self, slot: usize) -> Result<()> {
        self.check(slot)?;
        debug!(slot, pc = format!("{:#x}", self.events[slot].pc()), "flushed");
        self.release(slot)
    }

    /// Reset the event in `slot` and return the slot to the pool.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSlot`] if `slot` is not acquired.
    pub fn release(&mut self, slot: usize) -> Result<()> {
        self.check(slot)?;
        let event = &mut self.events[slot];
        event.reset_issue();
        event.reset_commit();
        self.in_use[slot] = false;
        Ok(())
    }

    fn check(&self, slot: usize) -> Result<()> {
        if self.in_use.get(slot).copied().unwrap_or(false) {
            Ok(())
        } else {
            Err(Error::InvalidSlot(slot))
        }
    }
}
