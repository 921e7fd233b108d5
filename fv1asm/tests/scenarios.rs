//! End-to-end assembler scenarios, one per concrete case worked through by
//! hand while the bit layouts were verified.

use fv1asm::{assemble, AssemblerOptions};

#[test]
fn pad_only_program_is_all_nop() {
    let result = assemble("; nothing but a comment\n", &AssemblerOptions::default());
    assert!(result.problems.iter().all(|d| !d.fatal));
    assert_eq!(result.program.len(), 128);
    assert!(result.program.iter().all(|&w| w == fv1::constants::NOP_WORD));
}

#[test]
fn simple_passthrough_round_trips_through_the_simulator() {
    let source = "\
        rdax ADCL, 1.0\n\
        wrax DACL, 0.0\n\
        rdax ADCR, 1.0\n\
        wrax DACR, 0.0\n\
    ";
    let result = assemble(source, &AssemblerOptions::default());
    assert!(result.problems.iter().all(|d| !d.fatal), "{:?}", result.problems);

    let program = fv1::ProgramImage::from_words(&result.program);
    let mut sim = fv1::Simulator::new(program);
    let (left, right) = sim.process_sample(0.5, -0.25, 0.0, 0.0, 0.0);
    assert!((left - 0.5).abs() < 1e-3);
    assert!((right - (-0.25)).abs() < 1e-3);
}

#[test]
fn sof_saturation_clamps_to_the_accumulator_ceiling() {
    // spec.md's canonical scenario: rdax ADCL,1.0 loads ACC=0.8, then
    // sof 2.0,0 would overshoot to 1.6 and instead saturates at MAX_ACC.
    let source = "rdax ADCL, 1.0\nsof 2.0, 0\nwrax DACL, 0\n";
    let result = assemble(source, &AssemblerOptions::default());
    assert!(result.problems.iter().all(|d| !d.fatal), "{:?}", result.problems);

    let program = fv1::ProgramImage::from_words(&result.program);
    let mut sim = fv1::Simulator::new(program);
    let (left, _right) = sim.process_sample(0.8, 0.0, 0.0, 0.0, 0.0);
    assert!(left <= fv1::constants::MAX_ACC as f32 + 1e-6);
    assert!(left > 0.9);
}

#[test]
fn mem_allocation_matches_the_documented_bug_scenario() {
    let source = "BUF1 MEM 100\nBUF2 MEM 200\n";

    let with_bug = assemble(source, &AssemblerOptions { fv1_asm_mem_bug: true, ..AssemblerOptions::default() });
    let buf1 = with_bug.memories.iter().find(|m| m.name == "BUF1").unwrap();
    let buf2 = with_bug.memories.iter().find(|m| m.name == "BUF2").unwrap();
    assert_eq!(buf1.start, 0);
    assert_eq!(buf2.start, 101);

    let without_bug = assemble(source, &AssemblerOptions { fv1_asm_mem_bug: false, ..AssemblerOptions::default() });
    let buf2_tight = without_bug.memories.iter().find(|m| m.name == "BUF2").unwrap();
    assert_eq!(buf2_tight.start, 100);
}

#[test]
fn delay_echo_writes_and_reads_back_a_one_sample_delay() {
    let source = "\
        DELAY MEM 1\n\
        rdax ADCL, 1.0\n\
        wra DELAY, 0.0\n\
        rda DELAY#, 1.0\n\
        wrax DACL, 0.0\n\
    ";
    let result = assemble(source, &AssemblerOptions::default());
    assert!(result.problems.iter().all(|d| !d.fatal), "{:?}", result.problems);

    let program = fv1::ProgramImage::from_words(&result.program);
    let mut sim = fv1::Simulator::new(program);

    let (first, _) = sim.process_sample(0.25, 0.0, 0.0, 0.0, 0.0);
    assert!(first.abs() < 1e-3);

    let (second, _) = sim.process_sample(0.0, 0.0, 0.0, 0.0, 0.0);
    assert!((second - 0.25).abs() < 1e-2);
}

#[test]
fn skp_to_label_lands_on_the_skipped_program() {
    let source = "\
        sof 0, 0\n\
        skp ZRO, skip_target\n\
        sof 0, 0.5\n\
        skip_target: wrax DACL, 0\n\
    ";
    let result = assemble(source, &AssemblerOptions::default());
    assert!(result.problems.iter().all(|d| !d.fatal), "{:?}", result.problems);

    let program = fv1::ProgramImage::from_words(&result.program);
    let mut sim = fv1::Simulator::new(program);
    let (left, _right) = sim.process_sample(0.0, 0.0, 0.0, 0.0, 0.0);
    assert!(left.abs() < 1e-3, "expected the SOF at index 2 to be skipped, got {}", left);
}

#[test]
fn undefined_symbol_is_reported_and_nothing_is_emitted() {
    let result = assemble("rdax MISSING, 1.0\n", &AssemblerOptions::default());
    assert!(result.problems.iter().any(|d| d.fatal));
    assert!(result.program.is_empty());
}
