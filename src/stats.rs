//! Simulation statistics collection and reporting.
//!
//! Tracks cycle and retirement counts plus the hazard-handling events the
//! pipeline records as it runs.

use serde::Serialize;
use std::time::Instant;

/// Counters accumulated over one simulation run.
#[derive(Debug, Serialize)]
pub struct SimStats {
    #[serde(skip)]
    start_time: Instant,

    pub cycles: u64,
    pub instructions_retired: u64,

    pub stalls_data: u64,
    pub bubbles_injected: u64,

    pub forwards_immediate: u64,
    pub forwards_posted: u64,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            instructions_retired: 0,
            stalls_data: 0,
            bubbles_injected: 0,
            forwards_immediate: 0,
            forwards_posted: 0,
        }
    }
}

impl SimStats {
    /// Prints a formatted summary of the run.
    pub fn print(&self) {
        let seconds = self.start_time.elapsed().as_secs_f64();

        let cyc = if self.cycles == 0 { 1 } else { self.cycles };
        let instr = if self.instructions_retired == 0 {
            1
        } else {
            self.instructions_retired
        };
        let ipc = self.instructions_retired as f64 / cyc as f64;
        let cpi = cyc as f64 / instr as f64;

        println!("\n==========================================================");
        println!("PIPELINE SIMULATION STATISTICS");
        println!("==========================================================");
        println!("host_seconds             {:.4} s", seconds);
        println!("sim_cycles               {}", self.cycles);
        println!("sim_insts                {}", self.instructions_retired);
        println!("sim_ipc                  {:.4}", ipc);
        println!("sim_cpi                  {:.4}", cpi);
        println!("----------------------------------------------------------");
        println!("HAZARD HANDLING");
        println!(
            "  stalls.data            {} ({:.2}%)",
            self.stalls_data,
            (self.stalls_data as f64 / cyc as f64) * 100.0
        );
        println!("  bubbles.injected       {}", self.bubbles_injected);
        println!("  forwards.immediate     {}", self.forwards_immediate);
        println!("  forwards.posted        {}", self.forwards_posted);
        println!("==========================================================");
    }
}
