//! Execute stage: posted-forwarding pickup and ALU evaluation.

use crate::core::instruction::Opcode;
use crate::core::latch::Latch;
use crate::core::stage::{SimpleStage, StageContext};

pub struct Execute;

impl SimpleStage for Execute {
    fn compute(&mut self, ctx: &mut StageContext<'_>, input: &Latch, output: &mut Latch) {
        if !input.instruction().is_valid() {
            return;
        }

        let mut work = input.clone();
        ctx.do_posted_forwarding(&mut work);

        if work.has_unready_sources() {
            ctx.set_resource_stall(true);
            ctx.add_status_word("OperandWait");
            return;
        }

        let mut ins = *work.instruction();
        match ins.opcode() {
            Opcode::Movc => {
                let value = ins.src1().value().unwrap_or(0);
                ins.set_result_value(value);
            }
            Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::And
            | Opcode::Or
            | Opcode::Xor => {
                let a = ins.src1().value().unwrap_or(0);
                let b = ins.src2().value().unwrap_or(0);
                ins.set_result_value(alu(ins.opcode(), a, b));
            }
            // Loads produce their value in the memory stage; stores, OUT,
            // HALT, and NOP carry their operand values through unchanged.
            Opcode::Load | Opcode::Store | Opcode::Out | Opcode::Halt | Opcode::Nop => {}
        }
        output.set_instruction(ins);
    }
}

fn alu(op: Opcode, a: i64, b: i64) -> i64 {
    match op {
        Opcode::Add => a.wrapping_add(b),
        Opcode::Sub => a.wrapping_sub(b),
        Opcode::Mul => a.wrapping_mul(b),
        Opcode::And => a & b,
        Opcode::Or => a | b,
        Opcode::Xor => a ^ b,
        _ => a,
    }
}
