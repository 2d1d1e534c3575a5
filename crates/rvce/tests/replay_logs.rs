//! Replays every recorded commit log under `tests/data` through the event
//! pipeline and checks each retired event against its log record.

use std::fs;
use std::path::{Path, PathBuf};

use libtest_mimic::{Arguments, Failed, Trial};
use rvce::{Effect, ReadWidthConvention, ReconcileConfig, ReplayModel, replay::parse_commit_log};

mod common;

fn main() {
    let args = Arguments::from_args();
    common::init_tracing();

    let trials = log_files()
        .into_iter()
        .map(|path| {
            let name = path
                .file_stem()
                .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
            Trial::test(name, move || run_log(&path))
        })
        .collect();

    libtest_mimic::run(&args, trials).exit();
}

fn log_files() -> Vec<PathBuf> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data");
    let mut files: Vec<PathBuf> = fs::read_dir(&dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.extension().is_some_and(|ext| ext == "log"))
                .collect()
        })
        .unwrap_or_default();
    files.sort();
    files
}

/// Logs may start with `# read-width = <convention>`.
fn config_for(text: &str) -> Result<ReconcileConfig, Failed> {
    let mut config = ReconcileConfig::default();
    for line in text.lines().filter_map(|l| l.strip_prefix('#')) {
        if let Some((key, value)) = line.split_once('=') {
            if key.trim() == "read-width" {
                config.read_width = value.trim().parse::<ReadWidthConvention>()?;
            }
        }
    }
    Ok(config)
}

fn run_log(path: &Path) -> Result<(), Failed> {
    let text = fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let config = config_for(&text)?;
    let records = parse_commit_log(&text).map_err(|e| e.to_string())?;
    let mut model = ReplayModel::new(records.clone(), common::VLEN);

    let events = common::replay(&mut model, config).map_err(|e| e.to_string())?;
    if events.len() != records.len() {
        return Err(format!("retired {} of {} records", events.len(), records.len()).into());
    }

    for (event, record) in events.iter().zip(&records) {
        let at = format!("line {}", record.line);
        if event.pc() != record.pc || event.instruction() != record.instr {
            return Err(format!("{at}: identity mismatch").into());
        }

        let loads = record.memory.iter().filter(|m| m.store.is_none()).count();
        if event.is_load() && event.reconciled_memory_reads().count() != loads {
            return Err(format!("{at}: expected {loads} reads").into());
        }

        let stores: Vec<(u64, u64, u8)> = record
            .memory
            .iter()
            .filter_map(|m| m.store.map(|(value, size)| (m.addr, value, size)))
            .collect();
        let writes: Vec<(u64, u64, u8)> = event.memory_writes().map(|w| (w.addr, w.value, w.size)).collect();
        if writes != stores {
            return Err(format!("{at}: memory writes {writes:x?} != {stores:x?}").into());
        }

        for vreg in &record.vector_registers {
            let found = event.effects().iter().any(|e| match e {
                Effect::VectorRegister(write) => {
                    let offset = usize::from(vreg.reg.wrapping_sub(write.base)) * (common::VLEN as usize / 8);
                    write
                        .data
                        .get(offset..offset + vreg.bytes.len())
                        .is_some_and(|data| data == vreg.bytes.as_slice())
                }
                _ => false,
            });
            if !found {
                return Err(format!("{at}: v{} not reconstructed", vreg.reg).into());
            }
        }
    }
    Ok(())
}
