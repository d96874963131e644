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

// functional_unit.rs
//
// The execution-unit pool. Grounded in the teacher's
// `timing_simulator::tomasulo::FunctionalUnit`/`init_exec_unit`/`get_free_unit`
// trio, but units here are not pipelined: each holds at most one in-flight
// op, matching `original_source/sim_ooo.cc`'s single-issue-per-unit model.

use crate::isa::UnitType;

#[derive(Debug, Clone)]
pub struct FunctionalUnit {
    pub kind: UnitType,
    pub latency: u32,
    busy: u32,
    pub pc: Option<u32>,
    pub result: i64,
}

impl FunctionalUnit {
    fn new(kind: UnitType, latency: u32) -> Self {
        FunctionalUnit {
            kind,
            latency,
            busy: 0,
            pc: None,
            result: 0,
        }
    }

    pub fn is_free(&self) -> bool {
        self.busy == 0 && self.pc.is_none()
    }

    pub fn dispatch(&mut self, pc: u32, result: i64) {
        self.busy = self.latency;
        self.pc = Some(pc);
        self.result = result;
    }

    pub fn is_done(&self) -> bool {
        self.busy == 0 && self.pc.is_some()
    }

    pub fn release(&mut self) {
        self.busy = 0;
        self.pc = None;
        self.result = 0;
    }

    /// Called once per cycle, after WRITE-RESULT has drained any unit whose
    /// countdown already reached zero this cycle.
    pub fn tick(&mut self) {
        if self.busy > 0 {
            self.busy -= 1;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FunctionalUnitPool {
    units: Vec<FunctionalUnit>,
}

impl FunctionalUnitPool {
    pub fn new() -> Self {
        FunctionalUnitPool { units: Vec::new() }
    }

    pub fn init_exec_unit(&mut self, kind: UnitType, latency: u32, instances: u32) {
        for _ in 0..instances {
            self.units.push(FunctionalUnit::new(kind, latency));
        }
    }

    pub fn has_units(&self) -> bool {
        !self.units.is_empty()
    }

    pub fn get_free_unit(&self, kind: UnitType) -> Option<usize> {
        self.units
            .iter()
            .position(|u| u.kind == kind && u.is_free())
    }

    pub fn unit(&self, index: usize) -> &FunctionalUnit {
        &self.units[index]
    }

    pub fn unit_mut(&mut self, index: usize) -> &mut FunctionalUnit {
        &mut self.units[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionalUnit> {
        self.units.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut FunctionalUnit> {
        self.units.iter_mut()
    }

    pub fn tick_all(&mut self) {
        for unit in &mut self.units {
            unit.tick();
        }
    }

    pub fn reset(&mut self) {
        for unit in &mut self.units {
            unit.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_unit_lookup_respects_type_and_busy() {
        let mut pool = FunctionalUnitPool::new();
        pool.init_exec_unit(UnitType::Integer, 1, 1);
        pool.init_exec_unit(UnitType::Multiplier, 4, 1);

        let idx = pool.get_free_unit(UnitType::Integer).unwrap();
        pool.unit_mut(idx).dispatch(0, 42);
        assert!(pool.get_free_unit(UnitType::Integer).is_none());
        assert!(pool.get_free_unit(UnitType::Multiplier).is_some());
    }

    #[test]
    fn unit_becomes_done_after_latency_cycles() {
        let mut unit = FunctionalUnit::new(UnitType::Multiplier, 3);
        unit.dispatch(100, 7);
        assert!(!unit.is_done());
        unit.tick();
        unit.tick();
        assert!(!unit.is_done());
        unit.tick();
        assert!(unit.is_done());
    }
}
