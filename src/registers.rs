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

// registers.rs
//
// Two banks of architectural registers (integer, floating-point), each slot
// holding either a committed value or a rename tag pointing at the reorder
// buffer entry that will produce it. Grounded in the teacher's
// `functional_simulator::registers::Registers` bank layout, but the
// `original_source/sim_ooo.cc` sentinel for "this register is renamed"
// (`UNDEFINED`) is modeled as `Option<usize>` rather than a magic constant.

pub const NUM_REGISTERS: usize = 32;

#[derive(Debug, Clone)]
pub struct RegisterBank {
    values: [i64; NUM_REGISTERS],
    tags: [Option<usize>; NUM_REGISTERS],
}

impl RegisterBank {
    pub fn new() -> Self {
        RegisterBank {
            values: [0; NUM_REGISTERS],
            tags: [None; NUM_REGISTERS],
        }
    }

    pub fn value(&self, index: usize) -> i64 {
        self.values[index]
    }

    pub fn tag(&self, index: usize) -> Option<usize> {
        self.tags[index]
    }

    pub fn is_renamed(&self, index: usize) -> bool {
        self.tags[index].is_some()
    }

    /// Used at ISSUE: the destination register now depends on `rob_index`.
    pub fn set_tag(&mut self, index: usize, rob_index: usize) {
        self.tags[index] = Some(rob_index);
    }

    /// Used at COMMIT: write the committed value and clear the rename tag,
    /// but only if no later instruction has already claimed this register
    /// (its tag still points at the committing entry).
    pub fn commit(&mut self, index: usize, value: i64, rob_index: usize) {
        self.values[index] = value;
        if self.tags[index] == Some(rob_index) {
            self.tags[index] = None;
        }
    }

    /// Used on squash: discard all outstanding rename tags, keeping last
    /// committed values.
    pub fn clear_tags(&mut self) {
        self.tags = [None; NUM_REGISTERS];
    }
}

impl Default for RegisterBank {
    fn default() -> Self {
        Self::new()
    }
}

/// The full register file: one integer bank, one floating-point bank.
#[derive(Debug, Clone)]
pub struct RegisterFile {
    pub integer: RegisterBank,
    pub float: RegisterBank,
}

impl RegisterFile {
    pub fn new() -> Self {
        RegisterFile {
            integer: RegisterBank::new(),
            float: RegisterBank::new(),
        }
    }

    pub fn clear_tags(&mut self) {
        self.integer.clear_tags();
        self.float.clear_tags();
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_bank_has_no_tags() {
        let bank = RegisterBank::new();
        for i in 0..NUM_REGISTERS {
            assert!(!bank.is_renamed(i));
            assert_eq!(bank.value(i), 0);
        }
    }

    #[test]
    fn commit_only_clears_matching_tag() {
        let mut bank = RegisterBank::new();
        bank.set_tag(4, 10);
        bank.set_tag(4, 11); // a younger instruction re-renames register 4
        bank.commit(4, 99, 10); // the stale, older producer commits
        assert_eq!(bank.value(4), 99);
        assert_eq!(bank.tag(4), Some(11)); // tag must survive, still owned by 11
    }

    #[test]
    fn clear_tags_preserves_values() {
        let mut bank = RegisterBank::new();
        bank.commit(2, 7, 0);
        bank.set_tag(3, 5);
        bank.clear_tags();
        assert_eq!(bank.value(2), 7);
        assert!(!bank.is_renamed(3));
    }
}
