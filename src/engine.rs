// engine.rs
//
// The pipeline engine: the per-cycle ISSUE -> EXECUTE -> WRITE-RESULT ->
// COMMIT state machine that drives the ROB, reservation stations, functional
// units, register renaming, and memory disambiguation. Grounded in the
// teacher's `timing_simulator::tomasulo::TomasuloProcessor::tick` (ordered
// sub-phases inside one cycle method, flat struct of hardware resources) and
// in `original_source/sim_ooo.cc`'s `run_cycle` (issue/execute/write-result/
// commit as four free functions called in sequence from one driver loop).

use log::{debug, info, trace};

use crate::config::EngineConfig;
use crate::errors::SimulatorError;
use crate::functional_unit::FunctionalUnitPool;
use crate::isa::{alu, Instruction, Opcode};
use crate::memory::Memory;
use crate::registers::{RegisterFile, NUM_REGISTERS};
use crate::reorder_buffer::{Destination, ReorderBuffer, RobState};
use crate::reservation_station::{Operand, StationClass, StationFile};
use crate::window::{InstructionWindow, WindowEntry};

/// Program storage: a flat instruction memory starting at `base_pc`. Slots
/// beyond the assembled program are implicitly EOP, matching the teacher's
/// fixed-size instruction-memory convention.
#[derive(Debug, Clone)]
struct ProgramMemory {
    base_pc: u32,
    instructions: Vec<Instruction>,
}

impl ProgramMemory {
    fn fetch(&self, pc: u32) -> Instruction {
        let offset = pc.wrapping_sub(self.base_pc) / 4;
        match self.instructions.get(offset as usize) {
            Some(instr) => *instr,
            None => Instruction::eop(),
        }
    }
}

/// Run statistics, reset along with everything else by `reset()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stats {
    pub cycles: u64,
    pub retired: u64,
}

impl Stats {
    /// Instructions per cycle; `0.0` before the first cycle has elapsed.
    pub fn ipc(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.retired as f64 / self.cycles as f64
        }
    }
}

impl std::fmt::Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cycles={} retired={} ipc={:.3}",
            self.cycles,
            self.retired,
            self.ipc()
        )
    }
}

/// The out-of-order core. Owns every piece of speculative and architectural
/// state; two engines never share anything, unlike the teacher's source,
/// which the base spec's Design Notes call out as process-wide global state.
pub struct PipelineEngine {
    config: EngineConfig,
    program: ProgramMemory,
    pc: u32,
    cycle: u64,
    retired: u64,
    halted: bool,

    pub registers: RegisterFile,
    pub memory: Memory,
    rob: ReorderBuffer,
    stations: StationFile,
    units: FunctionalUnitPool,
    window: InstructionWindow,

    /// Unit index a load vacated this very cycle; a store's commit-time
    /// memory write may not reuse it in the same cycle (see SPEC_FULL.md
    /// DESIGN.md's Open Questions: the one-cycle load/store unit conflict
    /// kept from `original_source/sim_ooo.cc`).
    just_vacated_by_load: Option<usize>,
}

impl PipelineEngine {
    pub fn new(config: EngineConfig) -> Result<Self, SimulatorError> {
        config.validate()?;

        let mut units = FunctionalUnitPool::new();
        for spec in &config.units {
            units.init_exec_unit(spec.kind, spec.latency, spec.instances);
        }

        let stations = StationFile::new(
            config.int_stations,
            config.add_stations,
            config.mult_stations,
            config.load_stations,
        );
        let rob = ReorderBuffer::new(config.rob_size);
        let window = InstructionWindow::new(config.rob_size);
        let memory = Memory::new(config.memory_size);

        info!(
            "engine configured: rob_size={} issue_width={} stations(int={}, add={}, mult={}, load={})",
            config.rob_size,
            config.issue_width,
            config.int_stations,
            config.add_stations,
            config.mult_stations,
            config.load_stations,
        );

        Ok(PipelineEngine {
            config,
            program: ProgramMemory {
                base_pc: 0,
                instructions: Vec::new(),
            },
            pc: 0,
            cycle: 0,
            retired: 0,
            halted: false,
            registers: RegisterFile::new(),
            memory,
            rob,
            stations,
            units,
            window,
            just_vacated_by_load: None,
        })
    }

    /// Loads a decoded program at `base_pc`, replacing any previously loaded
    /// program. Does not touch register or memory contents.
    pub fn load_program(&mut self, instructions: Vec<Instruction>, base_pc: u32) {
        self.program = ProgramMemory {
            base_pc,
            instructions,
        };
        self.pc = base_pc;
        self.halted = false;
    }

    /// Returns the simulator to its initial state, except for the loaded
    /// program, matching the base spec's `reset()` contract.
    pub fn reset(&mut self) {
        self.pc = self.program.base_pc;
        self.cycle = 0;
        self.retired = 0;
        self.halted = false;
        self.registers = RegisterFile::new();
        self.memory = Memory::new(self.config.memory_size);
        self.rob = ReorderBuffer::new(self.config.rob_size);
        self.stations = StationFile::new(
            self.config.int_stations,
            self.config.add_stations,
            self.config.mult_stations,
            self.config.load_stations,
        );
        self.units.reset();
        self.window = InstructionWindow::new(self.config.rob_size);
        self.just_vacated_by_load = None;
    }

    pub fn stats(&self) -> Stats {
        Stats {
            cycles: self.cycle,
            retired: self.retired,
        }
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn get_int_register(&self, index: usize) -> i64 {
        self.registers.integer.value(index)
    }

    pub fn set_int_register(&mut self, index: usize, value: i64) {
        self.registers.integer.commit(index, value, usize::MAX);
    }

    pub fn get_fp_register(&self, index: usize) -> i64 {
        self.registers.float.value(index)
    }

    pub fn set_fp_register(&mut self, index: usize, value: i64) {
        self.registers.float.commit(index, value, usize::MAX);
    }

    pub fn int_register_tag(&self, index: usize) -> Option<usize> {
        self.registers.integer.tag(index)
    }

    pub fn fp_register_tag(&self, index: usize) -> Option<usize> {
        self.registers.float.tag(index)
    }

    pub fn rob(&self) -> &ReorderBuffer {
        &self.rob
    }

    pub fn stations(&self) -> &StationFile {
        &self.stations
    }

    pub fn units(&self) -> &FunctionalUnitPool {
        &self.units
    }

    pub fn window(&self) -> &InstructionWindow {
        &self.window
    }

    /// True once the program has stopped fetching new instructions (EOP
    /// reached) and every in-flight instruction has drained from the ROB.
    pub fn is_drained(&self) -> bool {
        self.halted && self.rob.is_empty_buffer()
    }

    /// Advances `n` cycles, or until the program drains if `n` is zero.
    pub fn run(&mut self, n: u64) {
        if n == 0 {
            while !self.is_drained() {
                self.step();
            }
        } else {
            for _ in 0..n {
                if self.is_drained() {
                    break;
                }
                self.step();
            }
        }
    }

    /// One full cycle: ISSUE, EXECUTE, WRITE-RESULT, COMMIT, then unit
    /// countdown and PC/cycle advance, in that order (see SPEC_FULL.md
    /// 4.1 for why this ordering is load-bearing: a unit's countdown
    /// reaching zero in cycle C is drained by this same cycle's
    /// WRITE-RESULT, but a station issued in cycle C cannot dispatch until
    /// cycle C+1).
    pub fn step(&mut self) {
        self.cycle += 1;
        self.just_vacated_by_load = None;

        self.issue_stage();
        self.execute_stage();
        self.write_result_stage();
        self.commit_stage();
        self.units.tick_all();

        trace!("cycle {} complete: {}", self.cycle, self.stats());
    }

    // ---- ISSUE --------------------------------------------------------

    fn issue_stage(&mut self) {
        if self.halted {
            return;
        }
        for _ in 0..self.config.issue_width {
            if !self.try_issue_one() {
                break;
            }
        }
    }

    /// Returns `false` when issuing should stop for the remainder of this
    /// cycle (EOP reached, or a structural hazard stalled the PC).
    fn try_issue_one(&mut self) -> bool {
        let instr = self.program.fetch(self.pc);
        if instr.opcode == Opcode::Eop {
            self.halted = true;
            debug!("EOP reached at pc={}, issue stopped permanently", self.pc);
            return false;
        }

        let class = instr.opcode.station_class();
        let station_index = match self.stations.free_slot(class) {
            Some(i) => i,
            None => {
                trace!("issue stall: no free {:?} station at pc={}", class, self.pc);
                return false;
            },
        };
        if self.rob.is_full() {
            trace!("issue stall: ROB full at pc={}", self.pc);
            return false;
        }

        let destination = self.issue_destination(&instr);
        let rob_index = self.rob.allocate(self.pc, destination);

        let (vj, vk) = self.resolve_operands(&instr);
        let station = self.stations.get_mut(station_index);
        station.busy = true;
        station.instruction = Some(instr);
        station.pc = self.pc;
        station.vj = vj;
        station.vk = vk;
        station.address = None;
        station.dest_rob = rob_index;
        station.seq = self.rob.get(rob_index).seq;

        if !instr.opcode.is_store() && !instr.opcode.is_branch() {
            if let Some(dest) = instr.dest {
                self.bank_mut(instr.opcode.writes_fp_bank()).set_tag(dest as usize, rob_index);
            }
        }

        self.window.set(rob_index, WindowEntry::new(self.pc, self.cycle));
        debug!(
            "issue: pc={} opcode={:?} rob={} station={:?}/{}",
            self.pc, instr.opcode, rob_index, class, station_index
        );

        self.pc = self.pc.wrapping_add(4);
        true
    }

    fn issue_destination(&self, instr: &Instruction) -> Destination {
        if instr.opcode.is_store() || instr.opcode.is_branch() {
            Destination::None
        } else {
            let dest = instr.dest.expect("non-branch, non-store op has a destination");
            let dest = if instr.opcode.writes_fp_bank() {
                dest + NUM_REGISTERS as u32
            } else {
                dest
            };
            Destination::Register(dest)
        }
    }

    /// Reads each source operand's bank according to the opcode's register
    /// conventions (see `Opcode::src1_is_fp`/`src2_is_fp`), consulting the
    /// producing ROB entry's value if the tag is already resolved.
    fn resolve_operands(&self, instr: &Instruction) -> (Operand, Operand) {
        let vj = match instr.src1 {
            Some(reg) => self.read_operand(self.bank(instr.opcode.src1_is_fp()), reg as usize),
            None => Operand::Value(0),
        };
        let vk = match instr.src2 {
            Some(reg) => self.read_operand(self.bank(instr.opcode.src2_is_fp()), reg as usize),
            None => Operand::Value(0),
        };
        (vj, vk)
    }

    fn read_operand(&self, bank: &crate::registers::RegisterBank, index: usize) -> Operand {
        match bank.tag(index) {
            None => Operand::Value(bank.value(index)),
            Some(tag) => {
                let producer = self.rob.get(tag);
                if producer.busy && matches!(producer.state, RobState::WriteResult | RobState::Commit) {
                    Operand::Value(producer.value)
                } else {
                    Operand::Tag(tag)
                }
            },
        }
    }

    fn bank(&self, fp: bool) -> &crate::registers::RegisterBank {
        if fp {
            &self.registers.float
        } else {
            &self.registers.integer
        }
    }

    fn bank_mut(&mut self, fp: bool) -> &mut crate::registers::RegisterBank {
        if fp {
            &mut self.registers.float
        } else {
            &mut self.registers.integer
        }
    }

    // ---- EXECUTE --------------------------------------------------------

    fn execute_stage(&mut self) {
        self.execute_stores_pass();
        self.execute_dispatch_pass();
    }

    /// Pass A: stores compute their effective address as soon as both
    /// operands resolve, without occupying a functional unit (stores write
    /// memory at COMMIT, not EXECUTE).
    fn execute_stores_pass(&mut self) {
        let indices: Vec<usize> = self
            .stations
            .indices_of_class(StationClass::Load)
            .collect();
        for index in indices {
            let station = self.stations.get(index);
            if !station.busy {
                continue;
            }
            let instr = match station.instruction {
                Some(i) if i.opcode.is_store() => i,
                _ => continue,
            };
            if station.address.is_some() {
                continue;
            }
            if !self.issued_before_this_cycle(station.dest_rob) {
                continue;
            }
            let vj_ready = station.vj.is_ready();
            let vk = match station.vk.value() {
                Some(v) if vj_ready => v,
                _ => continue,
            };
            let address = (instr.immediate as i64).wrapping_add(vk) as u32;

            let dest_rob = station.dest_rob;
            self.stations.get_mut(index).address = Some(address);
            let entry = self.rob.get_mut(dest_rob);
            entry.destination = Destination::Address(address);
            entry.state = RobState::Execute;
            if let Some(w) = self.window.get_mut(dest_rob) {
                w.exe = Some(self.cycle);
            }
            debug!("execute(store addr): rob={} address=0x{:08x}", dest_rob, address);
        }
    }

    /// Pass B: every non-store station whose operands are resolved and whose
    /// class has a free matching unit dispatches, in station-index order
    /// (deterministic, age-agnostic tie-break per SPEC_FULL.md 4.1).
    fn execute_dispatch_pass(&mut self) {
        let indices: Vec<usize> = (0..)
            .zip(self.stations.iter())
            .filter(|(_, s)| s.busy && s.is_ready())
            .map(|(i, _)| i)
            .collect();

        for index in indices {
            let station = self.stations.get(index);
            let instr = match station.instruction {
                Some(i) => i,
                None => continue,
            };
            if instr.opcode.is_store() {
                continue; // handled by the stores pass
            }
            let dest_rob = station.dest_rob;
            if self.rob.get(dest_rob).state != RobState::Issue {
                continue; // already dispatched in an earlier cycle
            }
            // newly-issued stations cannot dispatch the same cycle
            if !self.issued_before_this_cycle(dest_rob) {
                continue;
            }

            let unit_type = instr.opcode.unit_type();
            let unit_index = match self.units.get_free_unit(unit_type) {
                Some(i) => i,
                None => {
                    trace!("execute stall: no free {:?} unit for rob={}", unit_type, dest_rob);
                    continue;
                },
            };

            let v1 = station.vj.value().expect("is_ready guarantees vj resolved");
            let v2 = station.vk.value().expect("is_ready guarantees vk resolved");

            let result = if instr.opcode.is_load() {
                // loads carry their base register in src1/vj; src2/vk is
                // unused (always `Value(0)`), unlike stores where vk is the
                // base and vj is the data to write.
                match self.dispatch_load(index, dest_rob, instr, v1) {
                    LoadDispatch::Stalled => continue,
                    LoadDispatch::Bypassed => continue, // handled fully inside dispatch_load
                    LoadDispatch::Value(v) => v,
                }
            } else {
                alu(instr.opcode, v1, v2, instr.immediate, station.pc)
            };

            self.units.unit_mut(unit_index).dispatch(station.pc, result);
            let entry = self.rob.get_mut(dest_rob);
            entry.state = RobState::Execute;
            if let Some(w) = self.window.get_mut(dest_rob) {
                w.exe = Some(self.cycle);
            }
            debug!(
                "execute(dispatch): rob={} unit={:?}/{} pc={}",
                dest_rob, unit_type, unit_index, station.pc
            );
        }
    }

    fn issued_before_this_cycle(&self, rob_index: usize) -> bool {
        match self.window.get(rob_index) {
            Some(w) => w.issue.map_or(true, |c| c < self.cycle),
            None => true,
        }
    }

    /// Memory disambiguation for a load reaching EXECUTE (SPEC_FULL.md 4.5).
    /// Stalls on an unresolved or aliasing older store; bypasses the value
    /// of the latest older store whose address is known to match and whose
    /// ROB entry has already reached WRITE-RESULT or COMMIT.
    fn dispatch_load(
        &mut self,
        station_index: usize,
        dest_rob: usize,
        instr: Instruction,
        base_value: i64,
    ) -> LoadDispatch {
        let load_seq = self.stations.get(station_index).seq;
        let load_address = (instr.immediate as i64).wrapping_add(base_value) as u32;

        // Older stores still in ISSUE/EXECUTE are tracked by their station
        // (EXECUTE sets `address`; ISSUE leaves it `None`). Either an unknown
        // address or a known-matching one blocks the load: in the first case
        // we cannot prove non-aliasing, in the second the store hasn't
        // produced a value to bypass yet.
        for store_index in self.stations.indices_of_class(StationClass::Load).collect::<Vec<_>>() {
            let store = self.stations.get(store_index);
            if !store.busy || store.seq >= load_seq {
                continue;
            }
            if !matches!(store.instruction, Some(i) if i.opcode.is_store()) {
                continue;
            }
            match store.address {
                None => return LoadDispatch::Stalled,
                Some(addr) if addr == load_address => return LoadDispatch::Stalled,
                Some(_) => {},
            }
        }

        // Older stores already past EXECUTE have released their station; look
        // them up by scanning the ROB directly for the latest (highest-seq)
        // older store targeting this address.
        let mut bypass: Option<(u64, i64)> = None;
        for (_, entry) in self.rob.iter() {
            if !entry.busy || entry.seq >= load_seq {
                continue;
            }
            if !matches!(entry.state, RobState::WriteResult | RobState::Commit) {
                continue;
            }
            if let Destination::Address(addr) = entry.destination {
                if addr == load_address && bypass.map_or(true, |(seq, _)| entry.seq > seq) {
                    bypass = Some((entry.seq, entry.value));
                }
            }
        }

        if let Some((_, value)) = bypass {
            let entry = self.rob.get_mut(dest_rob);
            entry.value = value;
            entry.store_bypassed = true;
            entry.state = RobState::Execute;
            if let Some(w) = self.window.get_mut(dest_rob) {
                w.exe = Some(self.cycle);
            }
            debug!("execute(load bypass): rob={} address=0x{:08x} value={}", dest_rob, load_address, value);
            return LoadDispatch::Bypassed;
        }

        match self.memory.read_word(load_address) {
            Ok(word) => {
                let value = if instr.opcode == Opcode::Lws {
                    word as i64
                } else {
                    word as i32 as i64
                };
                LoadDispatch::Value(value)
            },
            Err(err) => {
                debug!("load at rob={} address=0x{:08x} failed: {}", dest_rob, load_address, err);
                LoadDispatch::Stalled
            },
        }
    }

    // ---- WRITE-RESULT ---------------------------------------------------

    fn write_result_stage(&mut self) {
        self.write_result_units();
        self.write_result_stores_and_bypassed_loads();
    }

    fn write_result_units(&mut self) {
        let done_units: Vec<(usize, u32, i64)> = self
            .units
            .iter()
            .enumerate()
            .filter(|(_, u)| u.is_done())
            .map(|(i, u)| (i, u.pc.expect("is_done implies a live pc"), u.result))
            .collect();

        for (unit_index, pc, result) in done_units {
            let rob_index = match self.find_executing_entry(pc) {
                Some(i) => i,
                None => continue,
            };
            {
                let entry = self.rob.get_mut(rob_index);
                entry.value = result;
                entry.state = RobState::WriteResult;
            }
            if let Some(w) = self.window.get_mut(rob_index) {
                w.write_result = Some(self.cycle);
            }
            self.stations.broadcast(rob_index, result);
            self.release_station_for_rob(rob_index);

            if self.units.unit(unit_index).kind == crate::isa::UnitType::Memory {
                self.just_vacated_by_load = Some(unit_index);
            }
            self.units.unit_mut(unit_index).release();
            debug!("write-result: rob={} unit={} value={}", rob_index, unit_index, result);
        }
    }

    /// Stores and bypassed loads never occupy a functional unit, so they
    /// need their own write-result rule: a store advances once its exe-cycle
    /// strictly predates the current cycle, value = Vj (the data operand);
    /// a bypassed load's ROB entry was already stamped in EXECUTE and only
    /// needs its station released here.
    fn write_result_stores_and_bypassed_loads(&mut self) {
        let indices: Vec<usize> = self
            .stations
            .indices_of_class(StationClass::Load)
            .collect();
        for index in indices {
            let station = self.stations.get(index);
            if !station.busy {
                continue;
            }
            let instr = match station.instruction {
                Some(i) => i,
                None => continue,
            };
            let dest_rob = station.dest_rob;
            let entry = self.rob.get(dest_rob);

            if instr.opcode.is_store() {
                if entry.state != RobState::Execute {
                    continue;
                }
                let exe_cycle = self.window.get(dest_rob).and_then(|w| w.exe);
                if !matches!(exe_cycle, Some(c) if c < self.cycle) {
                    continue;
                }
                let value = station.vj.value().expect("store data resolved before execute");
                {
                    let entry = self.rob.get_mut(dest_rob);
                    entry.value = value;
                    entry.state = RobState::WriteResult;
                }
                if let Some(w) = self.window.get_mut(dest_rob) {
                    w.write_result = Some(self.cycle);
                }
                self.stations.get_mut(index).release();
                debug!("write-result(store): rob={} value={}", dest_rob, value);
            } else if entry.store_bypassed && entry.state == RobState::Execute {
                let exe_cycle = self.window.get(dest_rob).and_then(|w| w.exe);
                if !matches!(exe_cycle, Some(c) if c < self.cycle) {
                    continue;
                }
                self.rob.get_mut(dest_rob).state = RobState::WriteResult;
                if let Some(w) = self.window.get_mut(dest_rob) {
                    w.write_result = Some(self.cycle);
                }
                self.stations.get_mut(index).release();
                debug!("write-result(bypassed load): rob={}", dest_rob);
            }
        }
    }

    fn find_executing_entry(&self, pc: u32) -> Option<usize> {
        self.rob
            .iter()
            .filter(|(_, e)| e.busy && e.pc == pc && e.state == RobState::Execute)
            .map(|(i, _)| i)
            .next()
    }

    fn release_station_for_rob(&mut self, rob_index: usize) {
        for station in self.stations.iter_mut() {
            if station.busy && station.dest_rob == rob_index {
                station.release();
                return;
            }
        }
    }

    // ---- COMMIT ----------------------------------------------------------

    fn commit_stage(&mut self) {
        self.compute_ready_flags();

        let rob_index = match self.rob.oldest_ready() {
            Some(i) => i,
            None => return,
        };

        let (pc, state, destination, value) = {
            let entry = self.rob.get(rob_index);
            (entry.pc, entry.state, entry.destination, entry.value)
        };
        debug_assert_eq!(state, RobState::WriteResult, "committing entry not in write-result: rob={rob_index}");

        match destination {
            Destination::Register(reg) => {
                let fp = reg as usize >= NUM_REGISTERS;
                let index = if fp { reg as usize - NUM_REGISTERS } else { reg as usize };
                self.bank_mut(fp).commit(index, value, rob_index);
                self.finish_commit(rob_index, pc);
            },
            Destination::Address(addr) => {
                let unit_index = match self.units.get_free_unit(crate::isa::UnitType::Memory) {
                    Some(i) => i,
                    None => return,
                };
                if self.just_vacated_by_load == Some(unit_index) {
                    trace!("commit stall: memory unit {} just vacated by a load this cycle", unit_index);
                    return;
                }
                let word = value as u32;
                if let Err(err) = self.memory.write_word(addr, word) {
                    debug!("commit(store) failed at rob={}: {}", rob_index, err);
                    return;
                }
                debug!("commit(store): rob={} addr=0x{:08x} value=0x{:08x}", rob_index, addr, word);
                self.finish_commit(rob_index, pc);
            },
            Destination::None => self.commit_branch(rob_index, pc, value),
        }
    }

    /// A `Destination::None` entry is always a branch (stores always carry
    /// `Destination::Address` by the time they are ready to commit).
    fn commit_branch(&mut self, rob_index: usize, pc: u32, value: i64) {
        let not_taken_target = pc.wrapping_add(4) as i64;
        if value == not_taken_target {
            self.finish_commit(rob_index, pc);
            return;
        }

        // Mispredict: redirect PC, retire the branch, then squash everything
        // younger (which, since commit is in-order, is everything else).
        info!("branch mispredict at pc={}: redirecting to {}", pc, value);
        self.window.retire(rob_index);
        self.rob.release(rob_index);
        self.retired += 1;
        self.squash(value as u32);
    }

    fn finish_commit(&mut self, rob_index: usize, pc: u32) {
        self.window.retire(rob_index);
        self.rob.release(rob_index);
        self.retired += 1;
        debug!("commit: rob={} pc={}", rob_index, pc);
    }

    /// Discards all speculative state after a mispredicted branch retires:
    /// every ROB entry, every reservation station, every functional unit,
    /// and every register tag. The ROB's allocation cursor resets to zero
    /// and the PC is redirected to the branch's resolved target.
    fn squash(&mut self, target_pc: u32) {
        self.window.flush_on_squash();
        self.rob.reset();
        self.stations.reset();
        self.units.reset();
        self.registers.clear_tags();
        self.pc = target_pc;
        self.just_vacated_by_load = None;
        info!("squash complete: pc redirected to {}", target_pc);
    }

    /// The `ready` flag is computed lazily at the end of each cycle: any ROB
    /// entry whose window slot has a `write_result` cycle stamped is ready.
    fn compute_ready_flags(&mut self) {
        for (index, entry) in self.rob.iter_mut() {
            if entry.busy && !entry.ready {
                if let Some(w) = self.window.get(index) {
                    if w.is_ready() {
                        entry.ready = true;
                    }
                }
            }
        }
    }
}

enum LoadDispatch {
    Stalled,
    Bypassed,
    Value(i64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::Assembler;
    use crate::isa::UnitType;

    fn engine(config: EngineConfig) -> PipelineEngine {
        PipelineEngine::new(config).expect("valid config")
    }

    fn assemble(source: &str) -> Vec<Instruction> {
        Assembler::new().assemble(source).expect("valid program")
    }

    #[test]
    fn straight_line_integer_program() {
        let config = EngineConfig::new(4096)
            .with_rob_size(4)
            .with_int_stations(1)
            .with_add_stations(1)
            .with_mult_stations(1)
            .with_load_stations(1)
            .with_issue_width(1)
            .init_exec_unit(UnitType::Integer, 1, 1)
            .init_exec_unit(UnitType::Memory, 1, 1)
            .init_exec_unit(UnitType::Adder, 2, 1)
            .init_exec_unit(UnitType::Multiplier, 4, 1)
            .init_exec_unit(UnitType::Divider, 8, 1);
        let mut eng = engine(config);
        eng.load_program(
            assemble("ADDI R1, R0, 5\nADDI R2, R0, 7\nADD R3, R1, R2\nEOP"),
            0,
        );
        eng.run(0);
        assert_eq!(eng.get_int_register(1), 5);
        assert_eq!(eng.get_int_register(2), 7);
        assert_eq!(eng.get_int_register(3), 12);
        assert_eq!(eng.stats().retired, 3);
    }

    #[test]
    fn raw_hazard_resolves_through_rob_broadcast() {
        let config = EngineConfig::new(4096)
            .with_rob_size(4)
            .with_int_stations(1)
            .init_exec_unit(UnitType::Integer, 2, 1)
            .init_exec_unit(UnitType::Memory, 1, 1)
            .init_exec_unit(UnitType::Adder, 1, 1)
            .init_exec_unit(UnitType::Multiplier, 1, 1)
            .init_exec_unit(UnitType::Divider, 1, 1);
        let mut eng = engine(config);
        eng.load_program(assemble("ADDI R1, R0, 10\nADDI R2, R1, 1\nEOP"), 0);
        eng.run(0);
        assert_eq!(eng.get_int_register(2), 11);
    }

    #[test]
    fn store_to_load_bypass_on_matching_address() {
        let config = EngineConfig::new(4096)
            .with_rob_size(8)
            .with_load_stations(2)
            .with_int_stations(2)
            .init_exec_unit(UnitType::Integer, 1, 1)
            .init_exec_unit(UnitType::Memory, 1, 1)
            .init_exec_unit(UnitType::Adder, 1, 1)
            .init_exec_unit(UnitType::Multiplier, 1, 1)
            .init_exec_unit(UnitType::Divider, 1, 1);
        let mut eng = engine(config);
        eng.set_fp_register(1, f32_bits(3.5));
        eng.load_program(
            assemble("ADDI R1, R0, 0\nSWS F1, 0(R1)\nLWS F2, 0(R1)\nEOP"),
            0,
        );
        eng.run(0);
        assert_eq!(eng.get_fp_register(2), f32_bits(3.5));
    }

    #[test]
    fn load_stalls_behind_a_store_whose_data_is_still_in_flight() {
        let config = EngineConfig::new(4096)
            .with_rob_size(8)
            .with_load_stations(2)
            .with_int_stations(2)
            .with_mult_stations(1)
            .init_exec_unit(UnitType::Integer, 1, 1)
            .init_exec_unit(UnitType::Memory, 1, 1)
            .init_exec_unit(UnitType::Adder, 1, 1)
            .init_exec_unit(UnitType::Multiplier, 4, 1)
            .init_exec_unit(UnitType::Divider, 1, 1);
        let mut eng = engine(config);
        eng.set_fp_register(1, f32_bits(2.0));
        eng.set_fp_register(2, f32_bits(3.0));
        eng.load_program(
            assemble(
                "ADDI R1, R0, 0\nMULTS F3, F1, F2\nSWS F3, 0(R1)\nLWS F4, 0(R1)\nEOP",
            ),
            0,
        );
        // The store's address computation requires both Vj (data, still
        // waiting on the multiplier) and Vk (base register) resolved, so it
        // cannot publish an address for several cycles; the load must not
        // read stale memory or bypass a wrong value in the meantime.
        eng.run(0);
        assert_eq!(eng.get_fp_register(4), f32_bits(6.0));
    }

    #[test]
    fn taken_branch_squashes_shadow_instruction() {
        let config = EngineConfig::new(4096)
            .with_rob_size(8)
            .with_int_stations(4)
            .init_exec_unit(UnitType::Integer, 1, 1)
            .init_exec_unit(UnitType::Memory, 1, 1)
            .init_exec_unit(UnitType::Adder, 1, 1)
            .init_exec_unit(UnitType::Multiplier, 1, 1)
            .init_exec_unit(UnitType::Divider, 1, 1);
        let mut eng = engine(config);
        eng.load_program(
            assemble(
                "ADDI R1, R0, 1\nBNEZ R1, target\nADDI R2, R0, 99\ntarget: ADDI R3, R0, 7\nEOP",
            ),
            0,
        );
        eng.run(0);
        assert_eq!(eng.get_int_register(2), 0);
        assert_eq!(eng.get_int_register(3), 7);
        assert_eq!(eng.stats().retired, 3);
    }

    #[test]
    fn structural_stall_on_full_rob_preserves_single_occupancy() {
        let config = EngineConfig::new(4096)
            .with_rob_size(2)
            .with_int_stations(8)
            .with_issue_width(4)
            .init_exec_unit(UnitType::Integer, 1, 1)
            .init_exec_unit(UnitType::Memory, 1, 1)
            .init_exec_unit(UnitType::Adder, 1, 1)
            .init_exec_unit(UnitType::Multiplier, 1, 1)
            .init_exec_unit(UnitType::Divider, 1, 1);
        let mut eng = engine(config);
        eng.load_program(
            assemble(
                "ADDI R1, R0, 1\nADDI R2, R0, 2\nADDI R3, R0, 3\nADDI R4, R0, 4\nADDI R5, R0, 5\nADDI R6, R0, 6\nEOP",
            ),
            0,
        );
        eng.run(0);
        assert_eq!(eng.stats().retired, 6);
        for (want, reg) in [(1, 1), (2, 2), (3, 3), (4, 4), (5, 5), (6, 6)] {
            assert_eq!(eng.get_int_register(reg), want);
        }
    }

    #[test]
    fn ipc_never_exceeds_cycles_times_issue_width() {
        let config = EngineConfig::new(4096)
            .with_rob_size(16)
            .with_int_stations(8)
            .with_issue_width(2)
            .init_exec_unit(UnitType::Integer, 1, 2)
            .init_exec_unit(UnitType::Memory, 1, 1)
            .init_exec_unit(UnitType::Adder, 1, 1)
            .init_exec_unit(UnitType::Multiplier, 1, 1)
            .init_exec_unit(UnitType::Divider, 1, 1);
        let mut eng = engine(config);
        let mut source = String::new();
        for i in 1..=10 {
            source.push_str(&format!("ADDI R{i}, R0, {i}\n"));
        }
        source.push_str("EOP\n");
        eng.load_program(assemble(&source), 0);
        eng.run(0);
        let stats = eng.stats();
        assert!(stats.retired <= stats.cycles * 2);
    }

    fn f32_bits(v: f32) -> i64 {
        v.to_bits() as i64
    }
}
