// window.rs
//
// The instruction window is a diagnostic shadow of the ROB: one entry per
// in-flight instruction, recording the cycle it entered each stage. On a
// branch squash the surviving entries are flushed to the log sorted by PC,
// mirroring `original_source/sim_ooo.cc`'s end-of-run log dump.

#[derive(Debug, Clone, Copy, Default)]
pub struct WindowEntry {
    pub pc: u32,
    pub issue: Option<u64>,
    pub exe: Option<u64>,
    pub write_result: Option<u64>,
    pub commit: Option<u64>,
}

impl WindowEntry {
    pub fn new(pc: u32, issue_cycle: u64) -> Self {
        WindowEntry {
            pc,
            issue: Some(issue_cycle),
            exe: None,
            write_result: None,
            commit: None,
        }
    }

    /// The window's own readiness signal: true once `write_result` has been
    /// stamped, matching the ROB's lazily-computed `ready` flag.
    pub fn is_ready(&self) -> bool {
        self.write_result.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct InstructionWindow {
    entries: Vec<Option<WindowEntry>>,
    log: Vec<WindowEntry>,
}

impl InstructionWindow {
    pub fn new(size: usize) -> Self {
        InstructionWindow {
            entries: vec![None; size],
            log: Vec::new(),
        }
    }

    pub fn set(&mut self, rob_index: usize, entry: WindowEntry) {
        self.entries[rob_index] = Some(entry);
    }

    pub fn get_mut(&mut self, rob_index: usize) -> Option<&mut WindowEntry> {
        self.entries[rob_index].as_mut()
    }

    pub fn get(&self, rob_index: usize) -> Option<&WindowEntry> {
        self.entries[rob_index].as_ref()
    }

    /// Retires a window slot into the permanent log, in commit order.
    pub fn retire(&mut self, rob_index: usize) {
        if let Some(entry) = self.entries[rob_index].take() {
            self.log.push(entry);
        }
    }

    /// Flushes every still-live window slot into the log, sorted by PC, then
    /// clears the window. Used on branch squash.
    pub fn flush_on_squash(&mut self) {
        let mut remaining: Vec<WindowEntry> = self.entries.iter_mut().filter_map(Option::take).collect();
        remaining.sort_by_key(|e| e.pc);
        self.log.extend(remaining);
    }

    pub fn log(&self) -> &[WindowEntry] {
        &self.log
    }

    pub fn reset(&mut self) {
        for entry in &mut self.entries {
            *entry = None;
        }
        self.log.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squash_sorts_remaining_entries_by_pc() {
        let mut window = InstructionWindow::new(3);
        window.set(0, WindowEntry::new(8, 0));
        window.set(1, WindowEntry::new(4, 0));
        window.set(2, WindowEntry::new(12, 0));
        window.flush_on_squash();
        let pcs: Vec<u32> = window.log().iter().map(|e| e.pc).collect();
        assert_eq!(pcs, vec![4, 8, 12]);
    }

    #[test]
    fn retire_appends_to_log_in_call_order() {
        let mut window = InstructionWindow::new(2);
        window.set(0, WindowEntry::new(0, 0));
        window.set(1, WindowEntry::new(4, 1));
        window.retire(1);
        window.retire(0);
        let pcs: Vec<u32> = window.log().iter().map(|e| e.pc).collect();
        assert_eq!(pcs, vec![4, 0]);
    }
}
