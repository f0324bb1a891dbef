//! Data-hazard resolution: register-file lookup and the forwarding network.
//!
//! Operand resolution proceeds in two steps. `register_file_lookup` copies
//! committed register values into unresolved operands. `forwarding_search`
//! then queries the core's forwarding sources, in fixed priority order, for
//! each operand that is still unresolved; the first source reporting a
//! match wins, so the registry order encodes priority and must be built
//! freshest-result-first. A source whose result arrives next cycle is
//! recorded on the latch and satisfied by `do_posted_forwarding` at the
//! start of the following stage's cycle.

use crate::core::instruction::OPERAND_SLOTS;
use crate::core::latch::Latch;
use crate::core::regfile::RegisterFile;
use crate::core::{CoreState, PipeRegId};

/// Answer to a forwarding query against one pipe register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardingStatus {
    /// No result for the requested register here.
    Null,
    /// The result is readable from this source now.
    ValidNow,
    /// The result will be readable from this source starting next cycle.
    ValidNextCycle,
}

/// Copies committed register-file values into each unresolved
/// register-source operand of the latched instruction.
///
/// Registers still marked invalid are left unresolved, to be satisfied by
/// forwarding or a stall. Operand 0 is consulted only when its opcode
/// classifies it as a source.
pub fn register_file_lookup(regs: &RegisterFile, latch: &mut Latch) {
    for slot in 0..OPERAND_SLOTS {
        let Some(reg) = latch.source_register(slot) else {
            continue;
        };
        if latch.instruction().operand(slot).has_value() {
            continue;
        }
        if !regs.is_invalid(reg) {
            let value = regs.read(reg);
            latch.instruction_mut().operand_mut(slot).set_value(value);
        }
    }
}

/// Searches the forwarding sources for each unresolved operand of `input`.
///
/// Operates on a duplicate of the input latch and never mutates the
/// original. Previously posted forwarding records are cleared from the
/// duplicate first. For each operand, the first source (in registry order)
/// reporting a match ends the search: a result valid now is resolved
/// immediately, a result valid next cycle is recorded on the latch for
/// [`do_posted_forwarding`] to pick up.
pub fn forwarding_search(state: &mut CoreState, input: &Latch) -> Latch {
    let mut latch = input.clone();
    latch.clear_pending_forwards();

    for slot in 0..OPERAND_SLOTS {
        let Some(reg) = latch.source_register(slot) else {
            continue;
        };
        if latch.instruction().operand(slot).has_value() {
            continue;
        }

        let mut found: Option<(PipeRegId, bool)> = None;
        for &source in state.forwarding_sources() {
            match state.pipe_reg(source).forwarding_status(reg) {
                ForwardingStatus::Null => {}
                ForwardingStatus::ValidNow => {
                    found = Some((source, false));
                    break;
                }
                ForwardingStatus::ValidNextCycle => {
                    found = Some((source, true));
                    break;
                }
            }
        }

        match found {
            Some((source, false)) => {
                if let Some(value) = state.pipe_reg(source).result_value() {
                    if state.trace_enabled() {
                        eprintln!(
                            "[Forward] R{reg}={value} from {} to operand {slot}",
                            state.pipe_reg(source).name()
                        );
                    }
                    latch.instruction_mut().operand_mut(slot).set_value(value);
                    state.stats.forwards_immediate += 1;
                }
            }
            Some((source, true)) => {
                latch.set_pending_forward(slot, source);
            }
            None => {}
        }
    }

    latch
}

/// Resolves every operand slot with a posted forwarding record from its
/// recorded source's now-readable result.
///
/// Must run at the start of the cycle immediately following the one where
/// the record was posted, before the stage's own compute logic needs the
/// value. A record whose source has no readable value yet is kept so the
/// resolution is retried next cycle.
pub fn do_posted_forwarding(state: &mut CoreState, latch: &mut Latch, stage: &str) {
    for slot in 0..OPERAND_SLOTS {
        let Some(source) = latch.pending_forward(slot) else {
            continue;
        };
        let Some(reg) = latch.instruction().operand(slot).register_number() else {
            continue;
        };
        // The source may hold its result in the master for an extra cycle
        // when its consumer is blocked; only a slave-side match for the
        // right register is safe to read.
        if state.pipe_reg(source).forwarding_status(reg) != ForwardingStatus::ValidNow {
            continue;
        }
        if let Some(value) = state.pipe_reg(source).result_value() {
            if state.trace_enabled() {
                eprintln!(
                    "[Forward] R{reg}={value} from {} to operand {slot} of {stage}",
                    state.pipe_reg(source).name()
                );
            }
            latch.instruction_mut().operand_mut(slot).set_value(value);
            latch.clear_pending_forward(slot);
            state.stats.forwards_posted += 1;
        }
    }
}
