//! Memory stage: data memory reads and writes.
//!
//! Addresses are computed from the operand values carried on the latch
//! (base register plus offset). An out-of-range address raises an
//! `AddrFault` status word; the instruction retires as a no-op, with loads
//! committing zero so the destination register does not stay pending.

use crate::core::instruction::Opcode;
use crate::core::latch::Latch;
use crate::core::stage::{SimpleStage, StageContext};

pub struct MemoryAccess {
    memory: Vec<i64>,
}

impl MemoryAccess {
    /// Creates a data memory of `words` zeroed words.
    pub fn new(words: usize) -> Self {
        Self {
            memory: vec![0; words],
        }
    }
}

impl SimpleStage for MemoryAccess {
    fn compute(&mut self, ctx: &mut StageContext<'_>, input: &Latch, output: &mut Latch) {
        if !input.instruction().is_valid() {
            return;
        }

        let mut ins = *input.instruction();
        match ins.opcode() {
            Opcode::Load => {
                let addr = effective_address(&ins);
                match self.memory.get(addr) {
                    Some(&value) => ins.set_result_value(value),
                    None => {
                        ctx.add_status_word("AddrFault");
                        ins.set_result_value(0);
                    }
                }
            }
            Opcode::Store => {
                let addr = effective_address(&ins);
                let data = ins.oper0().value().unwrap_or(0);
                match self.memory.get_mut(addr) {
                    Some(slot) => *slot = data,
                    None => ctx.add_status_word("AddrFault"),
                }
            }
            _ => {}
        }
        output.set_instruction(ins);
    }
}

fn effective_address(ins: &crate::core::instruction::Instruction) -> usize {
    let base = ins.src1().value().unwrap_or(0);
    let offset = ins.src2().value().unwrap_or(0);
    // Negative effective addresses wrap far out of range and fault.
    base.wrapping_add(offset) as usize
}
