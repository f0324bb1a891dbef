//! Pipe registers: the buffered handoff points between adjacent stages.
//!
//! A pipe register owns two latch slots. Producers write into the master
//! slot during a cycle; consumers read the slave slot. At the end of the
//! cycle the core clocks every register, latching the master into the slave
//! once the slave's previous contents have been consumed. This two-phase
//! discipline is what makes stage evaluation order irrelevant for data
//! movement and gives forwarding its "valid next cycle" answer: a result
//! sitting in the master now is readable from the slave next cycle.

use crate::core::forwarding::ForwardingStatus;
use crate::core::latch::Latch;

/// Buffered connection between one producing and one consuming stage.
///
/// Holds at most one in-flight latch per side. Protocol per cycle: at most
/// one `write` (gated on `can_accept_work`), at most one `read`/`consume`
/// pair, then one `advance_clock` issued by the core.
#[derive(Debug)]
pub struct PipeRegister {
    name: String,
    master: Latch,
    slave: Latch,
    slave_consumed: bool,
    master_written: bool,
}

impl PipeRegister {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            master: Latch::void(),
            slave: Latch::void(),
            slave_consumed: false,
            master_written: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a fresh writable latch, pre-populated with the void
    /// instruction, for the producing stage to fill in.
    pub fn new_latch(&self) -> Latch {
        Latch::void()
    }

    /// Returns an explicitly invalid latch used for bubbles.
    pub fn bubble_latch(&self) -> Latch {
        Latch::bubble()
    }

    /// Whether this register can take new work this cycle.
    ///
    /// False only while the slave still holds a valid instruction that the
    /// consumer has not yet consumed; the next clock edge could not latch a
    /// newly written master without losing that work.
    pub fn can_accept_work(&self) -> bool {
        !self.slave.instruction().is_valid() || self.slave_consumed
    }

    /// Commits a produced latch into the master slot.
    ///
    /// Callers must gate on [`can_accept_work`](Self::can_accept_work); a
    /// write without that check is a protocol violation.
    pub fn write(&mut self, latch: Latch) {
        debug_assert!(
            self.can_accept_work(),
            "write to {} while prior work is unconsumed",
            self.name
        );
        debug_assert!(
            !self.master_written,
            "second write to {} in one cycle",
            self.name
        );
        self.master = latch;
        self.master_written = true;
    }

    /// Forcibly overwrites the master with a bubble, regardless of prior
    /// content. Used when a stall is detected after output was tentatively
    /// produced, so a stalled stage never leaks a committed result.
    pub fn write_bubble(&mut self) {
        self.master = Latch::bubble();
        self.master_written = true;
    }

    /// The latch currently visible to the consumer.
    pub fn read(&self) -> &Latch {
        &self.slave
    }

    /// Marks the slave contents as taken so the register becomes
    /// acceptable again at the next clock edge.
    pub fn consume(&mut self) {
        self.slave_consumed = true;
    }

    /// End-of-cycle clock edge: latches the master into the slave if the
    /// slave is free, otherwise holds both sides for retry.
    pub fn advance_clock(&mut self) {
        if self.can_accept_work() {
            self.slave = std::mem::replace(&mut self.master, Latch::void());
            self.slave_consumed = false;
        }
        self.master_written = false;
    }

    /// Clears both slots and the per-cycle bookkeeping.
    pub fn reset(&mut self) {
        self.master = Latch::void();
        self.slave = Latch::void();
        self.slave_consumed = false;
        self.master_written = false;
    }

    /// Answers a forwarding query for `reg`.
    ///
    /// A matching result in the slave is readable now; a matching result in
    /// the master will be readable from the slave starting next cycle.
    pub fn forwarding_status(&self, reg: usize) -> ForwardingStatus {
        let slave = self.slave.instruction();
        if slave.is_valid() && slave.result_register() == Some(reg) && slave.result_value().is_some()
        {
            return ForwardingStatus::ValidNow;
        }
        let master = self.master.instruction();
        if master.is_valid()
            && master.result_register() == Some(reg)
            && master.result_value().is_some()
        {
            return ForwardingStatus::ValidNextCycle;
        }
        ForwardingStatus::Null
    }

    /// The result value currently readable from this register, if any.
    pub fn result_value(&self) -> Option<i64> {
        self.slave.instruction().result_value()
    }
}
