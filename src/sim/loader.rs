//! Program loader.
//!
//! Parses the text program format: one instruction per line, operands
//! separated by commas, `;` starts a comment. Register operands are
//! written `R<n>`, literals as plain integers.
//!
//! ```text
//! MOVC R1, 40       ; R1 = 40
//! MOVC R2, 2
//! ADD  R3, R1, R2   ; R3 = R1 + R2
//! STORE R3, R1, 0   ; mem[R1 + 0] = R3
//! OUT  R3
//! HALT
//! ```

use crate::common::ParseError;
use crate::core::instruction::{Instruction, Opcode, Operand, OPERAND_SLOTS};

/// Parses a program source into instructions, addressed by position.
pub fn parse_program(source: &str) -> Result<Vec<Instruction>, ParseError> {
    let mut program = Vec::new();
    for (idx, raw_line) in source.lines().enumerate() {
        let line = idx + 1;
        let text = raw_line.split(';').next().unwrap_or("").trim();
        if text.is_empty() {
            continue;
        }
        let addr = program.len() as u64;
        program.push(parse_line(text, line, addr)?);
    }
    Ok(program)
}

/// The highest register number referenced by a program, if any register is
/// referenced at all. Used to validate programs against the register file
/// size before construction.
pub fn max_register(program: &[Instruction]) -> Option<usize> {
    program
        .iter()
        .flat_map(|ins| (0..OPERAND_SLOTS).filter_map(|n| ins.operand(n).register_number()))
        .max()
}

fn parse_line(text: &str, line: usize, addr: u64) -> Result<Instruction, ParseError> {
    let (mnemonic, rest) = match text.split_once(char::is_whitespace) {
        Some((m, r)) => (m, r.trim()),
        None => (text, ""),
    };
    let operands: Vec<&str> = if rest.is_empty() {
        Vec::new()
    } else {
        rest.split(',').map(str::trim).collect()
    };

    let opcode = match mnemonic.to_ascii_uppercase().as_str() {
        "NOP" => Opcode::Nop,
        "MOVC" => Opcode::Movc,
        "ADD" => Opcode::Add,
        "SUB" => Opcode::Sub,
        "MUL" => Opcode::Mul,
        "AND" => Opcode::And,
        "OR" => Opcode::Or,
        "XOR" => Opcode::Xor,
        "LOAD" => Opcode::Load,
        "STORE" => Opcode::Store,
        "OUT" => Opcode::Out,
        "HALT" => Opcode::Halt,
        other => {
            return Err(ParseError::UnknownMnemonic {
                line,
                found: other.to_string(),
            })
        }
    };

    let arity = |expected: usize| -> Result<(), ParseError> {
        if operands.len() == expected {
            Ok(())
        } else {
            Err(ParseError::WrongArity {
                line,
                mnemonic: mnemonic.to_ascii_uppercase(),
                expected,
            })
        }
    };

    let ins = match opcode {
        Opcode::Nop | Opcode::Halt => {
            arity(0)?;
            Instruction::new(opcode, addr, Operand::none(), Operand::none(), Operand::none())
        }
        Opcode::Movc => {
            arity(2)?;
            Instruction::new(
                opcode,
                addr,
                register(operands[0], line)?,
                immediate(operands[1], line)?,
                Operand::none(),
            )
        }
        Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::And | Opcode::Or | Opcode::Xor => {
            arity(3)?;
            Instruction::new(
                opcode,
                addr,
                register(operands[0], line)?,
                register(operands[1], line)?,
                register(operands[2], line)?,
            )
        }
        Opcode::Load | Opcode::Store => {
            arity(3)?;
            Instruction::new(
                opcode,
                addr,
                register(operands[0], line)?,
                register(operands[1], line)?,
                immediate(operands[2], line)?,
            )
        }
        Opcode::Out => {
            arity(1)?;
            Instruction::new(
                opcode,
                addr,
                register(operands[0], line)?,
                Operand::none(),
                Operand::none(),
            )
        }
    };
    Ok(ins)
}

fn register(token: &str, line: usize) -> Result<Operand, ParseError> {
    token
        .strip_prefix(['R', 'r'])
        .and_then(|digits| digits.parse::<usize>().ok())
        .map(Operand::register)
        .ok_or_else(|| ParseError::BadOperand {
            line,
            expected: "a register like R3",
            found: token.to_string(),
        })
}

fn immediate(token: &str, line: usize) -> Result<Operand, ParseError> {
    token
        .parse::<i64>()
        .map(Operand::immediate)
        .map_err(|_| ParseError::BadOperand {
            line,
            expected: "an integer literal",
            found: token.to_string(),
        })
}
