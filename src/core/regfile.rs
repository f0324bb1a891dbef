//! Architectural register file with pending-write tracking.
//!
//! Alongside each register value sits an "invalid" flag marking a write
//! that is still in flight. A register must not be read as committed while
//! its flag is set; operand resolution leaves such registers to the
//! forwarding network or a stall. Writeback stores the value and clears
//! the flag in one step.

/// Register values indexed by register number, with parallel invalid flags.
#[derive(Debug)]
pub struct RegisterFile {
    values: Vec<i64>,
    invalid: Vec<bool>,
}

impl RegisterFile {
    /// Creates a register file of `count` registers, all zero and valid.
    pub fn new(count: usize) -> Self {
        Self {
            values: vec![0; count],
            invalid: vec![false; count],
        }
    }

    /// Number of registers.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Reads the committed value of register `reg`.
    pub fn read(&self, reg: usize) -> i64 {
        self.values[reg]
    }

    /// Whether a write to register `reg` is still in flight.
    pub fn is_invalid(&self, reg: usize) -> bool {
        self.invalid[reg]
    }

    /// Marks register `reg` as having a write in flight. Called when the
    /// producing instruction is dispatched.
    pub fn mark_invalid(&mut self, reg: usize) {
        self.invalid[reg] = true;
    }

    /// Writeback: stores `value` into register `reg` and clears its
    /// invalid flag.
    pub fn commit(&mut self, reg: usize, value: i64) {
        self.values[reg] = value;
        self.invalid[reg] = false;
    }

    /// Dumps the register file contents to stdout, two registers per line.
    pub fn dump(&self) {
        for pair in (0..self.values.len()).step_by(2) {
            let mut line = format!("R{:<2}={:<12}", pair, self.render(pair));
            if pair + 1 < self.values.len() {
                line.push_str(&format!(" R{:<2}={:<12}", pair + 1, self.render(pair + 1)));
            }
            println!("{line}");
        }
    }

    fn render(&self, reg: usize) -> String {
        if self.invalid[reg] {
            format!("{}?", self.values[reg])
        } else {
            self.values[reg].to_string()
        }
    }
}
