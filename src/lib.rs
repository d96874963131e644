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

// lib.rs
//
// This file is the main library file for the tomasulo-rs project. It
// re-exports the modules that make up the out-of-order pipeline engine: the
// ISA, register renaming, functional units, reservation stations, the
// reorder buffer, the instruction window, memory, configuration, the
// assembler, and diagnostics.

pub mod assembler;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod errors;
pub mod functional_unit;
pub mod isa;
pub mod memory;
pub mod registers;
pub mod reorder_buffer;
pub mod reservation_station;
pub mod utils;
pub mod window;

// Re-export the types most callers need for easier access.
pub use assembler::Assembler;
pub use config::EngineConfig;
pub use engine::{PipelineEngine, Stats};
pub use errors::SimulatorError;
