//! Tests for register-file lookup and the forwarding network.

use pipesim::config::Config;
use pipesim::core::forwarding::{do_posted_forwarding, forwarding_search, register_file_lookup};
use pipesim::core::instruction::{Instruction, Opcode, Operand, OPERAND_SLOTS};
use pipesim::core::latch::Latch;
use pipesim::core::regfile::RegisterFile;
use pipesim::core::{Core, PipeRegId};
use pipesim::sim::{self, loader};

/// Builds the scalar pipeline with no program, as a bench for driving the
/// forwarding network by hand.
fn bench_core() -> Core {
    sim::build_scalar_pipeline(Vec::new(), &Config::default()).unwrap()
}

fn reg_id(core: &Core, name: &str) -> PipeRegId {
    core.state.pipe_reg_id(name).unwrap()
}

/// Creates a latch carrying an instruction with a computed result.
fn result_latch(rd: usize, value: i64) -> Latch {
    let mut ins = Instruction::new(
        Opcode::Movc,
        0,
        Operand::register(rd),
        Operand::immediate(value),
        Operand::none(),
    );
    ins.set_result_register(rd);
    ins.set_result_value(value);
    Latch::from_instruction(ins)
}

/// Creates an unresolved three-register ALU latch.
fn alu_latch(rd: usize, rs1: usize, rs2: usize) -> Latch {
    Latch::from_instruction(Instruction::new(
        Opcode::Add,
        0,
        Operand::register(rd),
        Operand::register(rs1),
        Operand::register(rs2),
    ))
}

/// Tests that lookup copies committed values and leaves pending registers
/// unresolved.
#[test]
fn test_lookup_resolves_committed_registers_only() {
    let mut regs = RegisterFile::new(8);
    regs.commit(1, 40);
    regs.commit(2, 2);
    regs.mark_invalid(2);

    let mut latch = alu_latch(3, 1, 2);
    register_file_lookup(&regs, &mut latch);

    assert_eq!(latch.instruction().src1().value(), Some(40));
    assert_eq!(
        latch.instruction().src2().value(),
        None,
        "A register with a write in flight must stay unresolved"
    );
    assert!(latch.has_unresolved_sources());
}

/// Tests that operand 0 is resolved as a source only for opcodes that read
/// it.
#[test]
fn test_lookup_honors_oper0_role() {
    let mut regs = RegisterFile::new(8);
    regs.commit(3, 7);

    let mut store = Latch::from_instruction(Instruction::new(
        Opcode::Store,
        0,
        Operand::register(3),
        Operand::register(3),
        Operand::immediate(0),
    ));
    register_file_lookup(&regs, &mut store);
    assert_eq!(
        store.instruction().oper0().value(),
        Some(7),
        "Stores read operand 0"
    );

    let mut add = alu_latch(3, 1, 2);
    register_file_lookup(&regs, &mut add);
    assert_eq!(
        add.instruction().oper0().value(),
        None,
        "ALU destinations must never be resolved as sources"
    );
}

/// Tests immediate forwarding from a source whose result is readable now.
#[test]
fn test_search_resolves_valid_now() {
    let mut core = bench_core();
    let ex_mem = reg_id(&core, "ExecuteToMemory");
    core.state.pipe_reg_mut(ex_mem).write(result_latch(1, 40));
    core.state.pipe_reg_mut(ex_mem).advance_clock();

    let input = alu_latch(3, 1, 1);
    let resolved = forwarding_search(&mut core.state, &input);

    assert_eq!(resolved.instruction().src1().value(), Some(40));
    assert_eq!(resolved.instruction().src2().value(), Some(40));
    assert!(!resolved.has_unresolved_sources());
    assert_eq!(core.state.stats.forwards_immediate, 2);
    assert_eq!(
        input.instruction().src1().value(),
        None,
        "The search must never mutate its input latch"
    );
}

/// Tests that the first source in registration order wins when several
/// hold a result for the same register.
#[test]
fn test_search_first_match_wins() {
    let mut core = bench_core();
    let ex_mem = reg_id(&core, "ExecuteToMemory");
    let mem_wb = reg_id(&core, "MemoryToWriteback");

    core.state.pipe_reg_mut(ex_mem).write(result_latch(1, 111));
    core.state.pipe_reg_mut(ex_mem).advance_clock();
    core.state.pipe_reg_mut(mem_wb).write(result_latch(1, 222));
    core.state.pipe_reg_mut(mem_wb).advance_clock();

    let resolved = forwarding_search(&mut core.state, &alu_latch(3, 1, 1));

    assert_eq!(
        resolved.instruction().src1().value(),
        Some(111),
        "ExecuteToMemory is registered first and must win"
    );
}

/// Tests that a result sitting in a source's master slot is answered with
/// a posted record, resolved by posted forwarding after the clock edge.
#[test]
fn test_posted_forwarding_resolves_next_cycle() {
    let mut core = bench_core();
    let ex_mem = reg_id(&core, "ExecuteToMemory");
    core.state.pipe_reg_mut(ex_mem).write(result_latch(1, 40));

    let mut resolved = forwarding_search(&mut core.state, &alu_latch(3, 1, 2));

    assert_eq!(
        resolved.instruction().src1().value(),
        None,
        "A next-cycle result must not be read early"
    );
    assert_eq!(resolved.pending_forward(1), Some(ex_mem));
    assert!(
        resolved.has_unresolved_sources(),
        "src2 has no producer anywhere and must still require a stall"
    );

    core.state.pipe_reg_mut(ex_mem).advance_clock();
    do_posted_forwarding(&mut core.state, &mut resolved, "Execute");

    assert_eq!(resolved.instruction().src1().value(), Some(40));
    assert_eq!(resolved.pending_forward(1), None);
    assert_eq!(core.state.stats.forwards_posted, 1);
}

/// Tests that a posted record whose source is not readable yet is kept for
/// retry instead of being dropped.
#[test]
fn test_posted_forwarding_retries_unready_source() {
    let mut core = bench_core();
    let ex_mem = reg_id(&core, "ExecuteToMemory");

    let mut latch = alu_latch(3, 1, 2);
    latch.set_pending_forward(1, ex_mem);
    do_posted_forwarding(&mut core.state, &mut latch, "Execute");

    assert_eq!(latch.instruction().src1().value(), None);
    assert_eq!(
        latch.pending_forward(1),
        Some(ex_mem),
        "An unsatisfied record must survive for the next attempt"
    );
    assert_eq!(core.state.stats.forwards_posted, 0);
}

/// Tests that void latches stay inert: a full run never leaves one
/// carrying an instruction, a result, or a pending record.
#[test]
fn test_void_latch_stays_inert_across_a_run() {
    let held = Latch::void();

    let program = loader::parse_program("MOVC R1, 1\nADD R2, R1, R1\nHALT\n").unwrap();
    let mut core = sim::build_scalar_pipeline(program, &Config::default()).unwrap();
    core.run(50);
    assert!(core.state.halted());

    for latch in [&held, &Latch::void()] {
        assert!(!latch.instruction().is_valid());
        assert_eq!(latch.instruction().result_value(), None);
        for slot in 0..OPERAND_SLOTS {
            assert_eq!(latch.pending_forward(slot), None);
        }
    }
}

/// Tests that the search reports nothing when no source holds the
/// register.
#[test]
fn test_search_reports_null_on_miss() {
    let mut core = bench_core();
    let resolved = forwarding_search(&mut core.state, &alu_latch(3, 1, 2));

    assert!(resolved.has_unresolved_sources());
    assert_eq!(resolved.pending_forward(1), None);
    assert_eq!(core.state.stats.forwards_immediate, 0);
}
