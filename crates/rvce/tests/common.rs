#![allow(dead_code)]

use rvce::{CommitEvent, EventPool, ReconcileConfig, ReplayModel};
use tracing_subscriber::EnvFilter;

pub const VLEN: u32 = 128;

/// Install a test-writer subscriber once; `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rvce=warn")))
        .with_test_writer()
        .try_init();
}

/// Drive every record of `model` through a one-slot pool: dispatch, step,
/// retire, release. Returns the retired events in program order.
pub fn replay(model: &mut ReplayModel, config: ReconcileConfig) -> rvce::Result<Vec<CommitEvent>> {
    let mut pool = EventPool::new(1, config);
    let mut retired = Vec::new();
    while let Some(instr) = model.next_instruction() {
        let slot = pool.dispatch(&*model, instr)?;
        model.step()?;
        retired.push(pool.retire(slot, model)?.clone());
        pool.release(slot)?;
    }
    assert_eq!(pool.in_flight(), 0);
    Ok(retired)
}
