// Copyright (c) 2024 Mudit Bhargava
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//

// main.rs
//
// Command-line entry point for the out-of-order pipeline simulator: loads
// an assembly program, runs it to completion (or for a fixed number of
// cycles), then prints the final architectural state.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use vmips_rust::config::EngineConfig;
use vmips_rust::diagnostics;
use vmips_rust::isa::UnitType;
use vmips_rust::utils::logger::{LogLevel, Logger};
use vmips_rust::{Assembler, PipelineEngine};

/// Assemble and run a program on the out-of-order pipeline engine.
#[derive(Parser)]
#[command(name = "tomasulo-rs")]
#[command(about = "An out-of-order Tomasulo pipeline simulator")]
#[command(version)]
struct Cli {
    /// Assembly source file to run
    #[arg(short, long)]
    program: PathBuf,

    /// Maximum cycles to simulate; 0 runs until the program drains
    #[arg(short, long, default_value = "0")]
    cycles: u64,

    /// Data memory size in bytes
    #[arg(short, long, default_value = "8192")]
    memory_size: usize,

    /// Log level for the `log`-crate event trace (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Optional file to additionally capture a line-oriented execution log
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    let Cli {
        program,
        cycles,
        memory_size,
        log_level,
        log_file,
    } = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&log_level))
        .init();

    let mut file_logger = log_file
        .as_ref()
        .map(|path| Logger::new(path.to_str(), LogLevel::Info));

    match run(&program, cycles, memory_size, &mut file_logger) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        },
    }
}

fn run(
    program_path: &PathBuf,
    cycles: u64,
    memory_size: usize,
    file_logger: &mut Option<Logger>,
) -> Result<(), vmips_rust::SimulatorError> {
    let source = std::fs::read_to_string(program_path)?;
    let instructions = Assembler::new().assemble(&source)?;

    let config = EngineConfig::new(memory_size)
        .init_exec_unit(UnitType::Integer, 1, 2)
        .init_exec_unit(UnitType::Memory, 2, 2)
        .init_exec_unit(UnitType::Adder, 2, 2)
        .init_exec_unit(UnitType::Multiplier, 4, 1)
        .init_exec_unit(UnitType::Divider, 8, 1);
    let mut engine = PipelineEngine::new(config)?;
    engine.load_program(instructions, 0);

    if let Some(logger) = file_logger {
        logger.info(&format!("loaded program from {}", program_path.display()));
    }

    engine.run(cycles);

    if let Some(logger) = file_logger {
        logger.info(&format!("run finished: {}", engine.stats()));
    }

    println!("{}", diagnostics::dump_summary(&engine));
    Ok(())
}
