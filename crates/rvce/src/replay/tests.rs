use super::*;
use rvce_state::MemoryPort;

#[test]
fn test_parse_integer_write() {
    let line = "core   0: 3 0x0000000080000050 (0x00000093) x1  0x0000000000000000";
    let record = CommitRecord::parse(7, line).unwrap().unwrap();

    assert_eq!(record.line, 7);
    assert_eq!(record.pc, 0x8000_0050);
    assert_eq!(record.instr, 0x0000_0093);
    assert_eq!(record.registers, vec![RegisterWrite::new(RegisterClass::Integer, 1, 0)]);
    assert!(record.memory.is_empty());
    assert_eq!(record.vector, None);
}

#[test]
fn test_parse_float_load() {
    let line = "core   0: 3 0x0000000080000104 (0x00052087) f1  0xffffffff3f800000 mem 0x0000000080002000";
    let record = CommitRecord::parse(1, line).unwrap().unwrap();

    assert_eq!(
        record.registers,
        vec![RegisterWrite::new(RegisterClass::Float, 1, 0xffff_ffff_3f80_0000)]
    );
    assert_eq!(
        record.memory,
        vec![MemoryRecord {
            addr: 0x8000_2000,
            store: None
        }]
    );
}

#[test]
fn test_parse_store_size_from_digits() {
    let line = "core   0: 3 0x80000040 (0x00152027) mem 0x80001000 0x3f800000";
    let record = CommitRecord::parse(1, line).unwrap().unwrap();
    assert_eq!(
        record.memory,
        vec![MemoryRecord {
            addr: 0x8000_1000,
            store: Some((0x3f80_0000, 4))
        }]
    );
}

#[test]
fn test_parse_csr_write() {
    let line = "core   0: 3 0x800000dc (0x30529073) c773_mtvec 0x00000000800000e4";
    let record = CommitRecord::parse(1, line).unwrap().unwrap();
    assert_eq!(
        record.registers,
        vec![RegisterWrite::new(RegisterClass::Csr, 773, 0x8000_00e4)]
    );
}

#[test]
fn test_parse_vector_load() {
    let line = "core   0: 3 0x0000000080000200 (0x02050407) e8 m1 l2 v8  0x000000000000000000000000000022ff \
                mem 0x0000000080003000 mem 0x0000000080003001";
    let record = CommitRecord::parse(1, line).unwrap().unwrap();

    assert_eq!(
        record.vector,
        Some(VectorMarker {
            sew: ElementWidth::E8,
            lmul: GroupMultiplier::ONE,
            vl: 2
        })
    );
    assert_eq!(record.vector_registers.len(), 1);
    assert_eq!(record.vector_registers[0].reg, 8);
    assert_eq!(record.vector_registers[0].bytes.len(), 16);
    assert_eq!(&record.vector_registers[0].bytes[..3], &[0xff, 0x22, 0x00]);
    assert_eq!(record.memory.len(), 2);
    assert!(record.registers.is_empty());
}

#[test]
fn test_parse_fractional_marker() {
    let line = "core   0: 3 0x80000300 (0x022180d7) e16 mf2 l3 v1  0x00000000000000000000000000000000";
    let record = CommitRecord::parse(1, line).unwrap().unwrap();
    let marker = record.vector.unwrap();
    assert_eq!(marker.sew, ElementWidth::E16);
    assert_eq!(marker.lmul.log2(), -1);
    assert_eq!(marker.vtype(true, false), 0b0100_1111);
}

#[test]
fn test_parse_rejects_bad_marker() {
    let line = "core   0: 3 0x80000300 (0x022180d7) e24 m1 l3";
    let err = CommitRecord::parse(12, line).unwrap_err();
    assert!(matches!(err, Error::Parse { line: 12, .. }));
}

#[test]
fn test_non_commit_lines_are_skipped() {
    let log = "bbl loader\n\
               core   0: 3 0x80000000 (0x00000297) x5  0x0000000080000000\n\
               \n\
               core   0: 3 0x80000004 (0x02028593) x11 0x0000000080000020\n";
    let records = parse_commit_log(log).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].line, 2);
    assert_eq!(records[1].line, 4);
}

#[test]
fn test_step_applies_store_then_load_sees_it() {
    let log = "core   0: 3 0x80000000 (0x00152027) mem 0x80001000 0xbeef\n\
               core   0: 3 0x80000004 (0x00051087) f1  0xffffffffffffbeef mem 0x80001000\n";
    let mut model = ReplayModel::from_log(log, 128).unwrap();
    assert_eq!(model.pc(), 0x8000_0000);

    assert!(model.step().unwrap());
    assert_eq!(model.trace().memory_writes().len(), 1);
    assert_eq!(model.memory().read(0x8000_1000, rvce_state::SizeClass::Half).unwrap(), 0xbeef);
    model.trace_mut().clear();

    assert_eq!(model.pc(), 0x8000_0004);
    assert!(model.step().unwrap());
    // flh: two bytes per access
    assert_eq!(model.trace().memory_reads()[0].size, 2);
    assert!(!model.step().unwrap());
    assert_eq!(model.remaining(), 0);
}

#[test]
fn test_vector_csrs_follow_next_marker() {
    let log = "core   0: 3 0x80000000 (0x02050407) e32 m2 l5 v8  0x0\n";
    let mut model = ReplayModel::from_log(log, 128).unwrap();
    model.set_vector_policy(true, true);

    let csrs = model.vector_csrs();
    assert_eq!(csrs.vl, 5);
    let vtype = csrs.vector_type(64);
    assert_eq!(vtype.vsew, 2);
    assert_eq!(vtype.vlmul, 1);
    assert!(vtype.vta && vtype.vma);

    model.step().unwrap();
    let kinds: Vec<_> = model.trace().register_writes().iter().map(|w| w.class).collect();
    assert_eq!(kinds, vec![RegisterClass::VectorConfig, RegisterClass::Vector]);
}

#[test]
fn test_disassembler_defaults_to_unknown() {
    let model = ReplayModel::new(Vec::new(), 128);
    assert_eq!(model.disassemble(0x13), "unknown");
    let model = model.with_disassembler(|instr| format!("insn {instr:#x}"));
    assert_eq!(model.disassemble(0x13), "insn 0x13");
}
