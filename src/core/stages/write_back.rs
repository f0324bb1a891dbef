//! Writeback stage: result commit and retirement.

use crate::core::instruction::Opcode;
use crate::core::latch::Latch;
use crate::core::stage::{SimpleStage, StageContext};

pub struct WriteBack;

impl SimpleStage for WriteBack {
    fn compute(&mut self, ctx: &mut StageContext<'_>, input: &Latch, _output: &mut Latch) {
        let ins = input.instruction();
        if !ins.is_valid() {
            return;
        }

        if let (Some(reg), Some(value)) = (ins.result_register(), ins.result_value()) {
            ctx.regs_mut().commit(reg, value);
        }

        match ins.opcode() {
            Opcode::Out => {
                let value = ins.oper0().value().unwrap_or(0);
                ctx.emit(value);
            }
            Opcode::Halt => ctx.request_halt(),
            _ => {}
        }
        ctx.stats_mut().instructions_retired += 1;
    }
}
