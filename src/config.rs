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

// config.rs
//
// Builder-style engine configuration, grounded in the teacher's
// `timing_simulator::config::{TomasuloConfig, SimulatorConfig}` `with_*`
// chains. Validation happens once, at `PipelineEngine::new`, so a broken
// configuration fails fast instead of surfacing as a mysterious stall later.

use crate::errors::ConfigError;
use crate::isa::UnitType;

#[derive(Debug, Clone, Copy)]
pub struct UnitSpec {
    pub kind: UnitType,
    pub latency: u32,
    pub instances: u32,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub memory_size: usize,
    pub rob_size: usize,
    pub int_stations: usize,
    pub add_stations: usize,
    pub mult_stations: usize,
    pub load_stations: usize,
    pub issue_width: usize,
    pub units: Vec<UnitSpec>,
}

impl EngineConfig {
    pub fn new(memory_size: usize) -> Self {
        EngineConfig {
            memory_size,
            rob_size: 16,
            int_stations: 4,
            add_stations: 4,
            mult_stations: 2,
            load_stations: 4,
            issue_width: 1,
            units: Vec::new(),
        }
    }

    pub fn with_rob_size(mut self, size: usize) -> Self {
        self.rob_size = size;
        self
    }

    pub fn with_int_stations(mut self, n: usize) -> Self {
        self.int_stations = n;
        self
    }

    pub fn with_add_stations(mut self, n: usize) -> Self {
        self.add_stations = n;
        self
    }

    pub fn with_mult_stations(mut self, n: usize) -> Self {
        self.mult_stations = n;
        self
    }

    pub fn with_load_stations(mut self, n: usize) -> Self {
        self.load_stations = n;
        self
    }

    pub fn with_issue_width(mut self, width: usize) -> Self {
        self.issue_width = width;
        self
    }

    pub fn init_exec_unit(mut self, kind: UnitType, latency: u32, instances: u32) -> Self {
        self.units.push(UnitSpec {
            kind,
            latency,
            instances,
        });
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.units.is_empty() || self.units.iter().all(|u| u.instances == 0) {
            return Err(ConfigError::NoFunctionalUnits);
        }
        if self.rob_size == 0 {
            return Err(ConfigError::ZeroSizedRob);
        }
        if self.issue_width == 0 {
            return Err(ConfigError::ZeroIssueWidth);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_rob_size() {
        let config = EngineConfig::new(1024)
            .with_rob_size(0)
            .init_exec_unit(UnitType::Integer, 1, 1);
        assert!(matches!(config.validate(), Err(ConfigError::ZeroSizedRob)));
    }

    #[test]
    fn rejects_no_functional_units() {
        let config = EngineConfig::new(1024);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NoFunctionalUnits)
        ));
    }

    #[test]
    fn accepts_well_formed_config() {
        let config = EngineConfig::new(1024).init_exec_unit(UnitType::Integer, 1, 2);
        assert!(config.validate().is_ok());
    }
}
