use std::sync::OnceLock;

use regex::Regex;
use rvce_isa::{ElementWidth, GroupMultiplier};
use rvce_state::{RegisterClass, RegisterWrite};

use super::{CommitRecord, MemoryRecord, VectorMarker, VectorRegisterRecord};
use crate::error::{Error, Result};

impl CommitRecord {
    /// Parse one Spike `--log-commits` line.
    ///
    /// Handles:
    /// - `core   0: 3 0x<PC> (0x<INSN>) [x<N> 0x<V>] [f<N> 0x<V>] [c<N>_name 0x<V>]`
    /// - `... e<SEW> m[f]<LMUL> l<VL> [v<N> 0x<VLEN bits>]`
    /// - `... [mem 0x<ADDR> [0x<VALUE>]]...`, a value marking a store
    ///
    /// Returns `Ok(None)` for lines that are not commit records.
    ///
    /// # Errors
    ///
    /// [`Error::Parse`] for a commit line with an out-of-range field.
    pub fn parse(line_no: usize, line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if !line.starts_with("core") {
            return Ok(None);
        }

        let pc_pattern = PC_PATTERN
            .get_or_init(|| Regex::new(r"0x([0-9a-fA-F]+)\s+\(0x([0-9a-fA-F]+)\)").unwrap());
        let Some(caps) = pc_pattern.captures(line) else {
            return Ok(None);
        };
        let fail = |reason: &str| Error::Parse {
            line: line_no,
            reason: reason.to_string(),
        };

        let pc = u64::from_str_radix(&caps[1], 16).map_err(|_| fail("pc does not fit 64 bits"))?;
        let instr = u32::from_str_radix(&caps[2], 16).map_err(|_| fail("encoding does not fit 32 bits"))?;
        // Effects follow the encoding; don't let the pc field match anything below.
        let rest = &line[caps.get(0).map_or(0, |m| m.end())..];

        let mut registers = Vec::new();
        for (class, pattern) in [
            (RegisterClass::Integer, &X_PATTERN, r"\bx(\d+)\s+0x([0-9a-fA-F]+)"),
            (RegisterClass::Float, &F_PATTERN, r"\bf(\d+)\s+0x([0-9a-fA-F]+)"),
            (RegisterClass::Csr, &CSR_PATTERN, r"\bc(\d+)_[A-Za-z0-9_]+\s+0x([0-9a-fA-F]+)"),
        ]
        .map(|(class, cell, src)| (class, cell.get_or_init(|| Regex::new(src).unwrap())))
        {
            for caps in pattern.captures_iter(rest) {
                let index = caps[1].parse::<u32>().map_err(|_| fail("bad register number"))?;
                let value = u128::from_str_radix(&caps[2], 16).map_err(|_| fail("register value too wide"))?;
                registers.push(RegisterWrite::new(class, index, value));
            }
        }

        let marker_pattern = MARKER_PATTERN
            .get_or_init(|| Regex::new(r"\be(\d+)\s+m(f?)(\d+)\s+l(\d+)").unwrap());
        let vector = match marker_pattern.captures(rest) {
            Some(caps) => {
                let sew = caps[1]
                    .parse::<u16>()
                    .ok()
                    .and_then(ElementWidth::from_bits)
                    .ok_or_else(|| fail("unknown element width"))?;
                let factor = caps[3].parse::<u8>().map_err(|_| fail("bad group multiplier"))?;
                let log2 = match factor {
                    1 => 0,
                    2 => 1,
                    4 => 2,
                    8 => 3,
                    _ => return Err(fail("bad group multiplier")),
                };
                let log2 = if &caps[2] == "f" { -log2 } else { log2 };
                let lmul = GroupMultiplier::from_log2(log2).ok_or_else(|| fail("bad group multiplier"))?;
                let vl = caps[4].parse::<u32>().map_err(|_| fail("bad vector length"))?;
                Some(VectorMarker { sew, lmul, vl })
            }
            None => None,
        };

        let vreg_pattern =
            VREG_PATTERN.get_or_init(|| Regex::new(r"\bv(\d+)\s+0x([0-9a-fA-F]+)").unwrap());
        let mut vector_registers = Vec::new();
        for caps in vreg_pattern.captures_iter(rest) {
            let reg = caps[1].parse::<u8>().map_err(|_| fail("bad vector register number"))?;
            vector_registers.push(VectorRegisterRecord {
                reg,
                bytes: hex_to_le_bytes(&caps[2]),
            });
        }

        let mem_pattern = MEM_PATTERN
            .get_or_init(|| Regex::new(r"\bmem\s+0x([0-9a-fA-F]+)(?:\s+0x([0-9a-fA-F]+))?").unwrap());
        let mut memory = Vec::new();
        for caps in mem_pattern.captures_iter(rest) {
            let addr = u64::from_str_radix(&caps[1], 16).map_err(|_| fail("address does not fit 64 bits"))?;
            let store = match caps.get(2) {
                Some(value) => {
                    let digits = value.as_str();
                    let value = u64::from_str_radix(digits, 16).map_err(|_| fail("store value too wide"))?;
                    let size = u8::try_from(digits.len().div_ceil(2)).map_err(|_| fail("store value too wide"))?;
                    Some((value, size))
                }
                None => None,
            };
            memory.push(MemoryRecord { addr, store });
        }

        Ok(Some(Self {
            line: line_no,
            pc,
            instr,
            registers,
            vector,
            vector_registers,
            memory,
        }))
    }
}

/// Parse a whole commit log, skipping lines that are not commit records.
/// Line numbers are 1-based.
///
/// # Errors
///
/// The first [`Error::Parse`] hit.
pub fn parse_commit_log(text: &str) -> Result<Vec<CommitRecord>> {
    let mut records = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if let Some(record) = CommitRecord::parse(i + 1, line)? {
            records.push(record);
        }
    }
    Ok(records)
}

/// Spike prints vector registers most significant byte first.
fn hex_to_le_bytes(digits: &str) -> Vec<u8> {
    let digits = digits.as_bytes();
    digits
        .rchunks(2)
        .map(|pair| {
            pair.iter()
                .fold(0u8, |acc, d| (acc << 4) | (*d as char).to_digit(16).unwrap_or(0) as u8)
        })
        .collect()
}

static PC_PATTERN: OnceLock<Regex> = OnceLock::new();
static X_PATTERN: OnceLock<Regex> = OnceLock::new();
static F_PATTERN: OnceLock<Regex> = OnceLock::new();
static CSR_PATTERN: OnceLock<Regex> = OnceLock::new();
static MARKER_PATTERN: OnceLock<Regex> = OnceLock::new();
static VREG_PATTERN: OnceLock<Regex> = OnceLock::new();
static MEM_PATTERN: OnceLock<Regex> = OnceLock::new();
