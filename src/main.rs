//! Pipeline simulator CLI.
//!
//! Loads a text program, wires the five-stage scalar pipeline from the TOML
//! configuration, and runs it to completion. With `--per-cycle` it prints a
//! stage activity table after every cycle, which is the easiest way to watch
//! stalls, bubbles, and forwards happen.

use clap::Parser;
use std::{fs, process};

extern crate pipesim;

use pipesim::config::Config;
use pipesim::sim::{self, loader};

/// Command-line arguments for the pipeline simulator.
#[derive(Parser, Debug)]
#[command(author, version, about = "Cycle-Accurate Pipelined Core Simulator")]
struct Args {
    /// Text program to simulate.
    program: String,

    #[arg(short, long, default_value = "configs/default.toml")]
    config: String,

    /// Override the configured cycle budget.
    #[arg(long)]
    cycles: Option<u64>,

    /// Print forwarding events as they happen.
    #[arg(long)]
    trace_forwarding: bool,

    /// Print the stage activity table after every cycle.
    #[arg(long)]
    per_cycle: bool,

    /// Print final statistics as JSON instead of the text summary.
    #[arg(long)]
    json_stats: bool,
}

fn main() {
    let args = Args::parse();

    let config_content = fs::read_to_string(&args.config).expect("Failed to read config");
    let mut config: Config = toml::from_str(&config_content).expect("Failed to parse config");
    config.general.trace_forwarding |= args.trace_forwarding;

    let source = match fs::read_to_string(&args.program) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("[!] Could not read '{}': {}", args.program, e);
            process::exit(1);
        }
    };
    let program = match loader::parse_program(&source) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("[!] {}: {}", args.program, e);
            process::exit(1);
        }
    };
    if program.is_empty() {
        eprintln!("[!] {}: program is empty", args.program);
        process::exit(1);
    }

    let mut core = match sim::build_scalar_pipeline(program, &config) {
        Ok(core) => core,
        Err(e) => {
            eprintln!("[!] Pipeline construction failed: {}", e);
            process::exit(1);
        }
    };

    let max_cycles = args.cycles.unwrap_or(config.general.max_cycles);

    if args.per_cycle {
        while !core.state.halted() && core.state.cycle() < max_cycles {
            core.cycle();
            println!("Cycle {}", core.state.cycle());
            for report in core.reports() {
                println!("  {:<10} {:<32} {}", report.name, report.activity, report.status);
            }
            println!();
        }
    } else {
        core.run(max_cycles);
    }

    if !core.state.halted() {
        println!("[!] Cycle budget ({}) exhausted before HALT", max_cycles);
    }

    if !core.state.retired_output.is_empty() {
        println!("Output:");
        for value in &core.state.retired_output {
            println!("  {}", value);
        }
    }

    println!("\nRegister file:");
    core.state.regs.dump();

    if args.json_stats {
        match serde_json::to_string_pretty(&core.state.stats) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("[!] Could not serialize statistics: {}", e);
                process::exit(1);
            }
        }
    } else {
        core.state.stats.print();
    }
}
