//! Decode stage: operand resolution and dispatch.
//!
//! Resolves source operands from the register file, then from the
//! forwarding network. An operand that is neither resolved nor covered by
//! a posted forwarding record forces a resource stall: the instruction is
//! held and retried next cycle. On dispatch the destination register is
//! marked invalid so younger readers know a write is in flight.

use crate::core::latch::Latch;
use crate::core::stage::{SimpleStage, StageContext};

pub struct Decode;

impl SimpleStage for Decode {
    fn compute(&mut self, ctx: &mut StageContext<'_>, input: &Latch, output: &mut Latch) {
        if !input.instruction().is_valid() {
            return;
        }

        let mut work = input.clone();
        ctx.register_file_lookup(&mut work);
        let mut work = ctx.forwarding_search(&work);

        if work.has_unresolved_sources() {
            ctx.set_resource_stall(true);
            ctx.add_status_word("RegWait");
            return;
        }
        if !ctx.output_can_accept(0) {
            return;
        }

        let ins = work.instruction();
        if ins.opcode().writes_register() {
            if let Some(dest) = ins.oper0().register_number() {
                ctx.regs_mut().mark_invalid(dest);
                work.instruction_mut().set_result_register(dest);
            }
        }
        *output = work;
    }
}
