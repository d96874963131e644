// reservation_station.rs
//
// Reservation stations hold an operation's operands until both are resolved,
// then dispatch to a functional unit. Grounded in the teacher's
// `timing_simulator::tomasulo::ReservationStation`, trimmed to the four
// station classes this ISA actually needs.

use crate::isa::Instruction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StationClass {
    Int,
    Add,
    Mult,
    Load,
}

/// An operand slot: either a resolved value (`Value`) or a live rename tag
/// pointing at the producing ROB entry (`Tag`). Exactly one of the pair is
/// ever live, matching the Vj/Qj and Vk/Qk convention of the algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Value(i64),
    Tag(usize),
}

impl Operand {
    pub fn is_ready(self) -> bool {
        matches!(self, Operand::Value(_))
    }

    pub fn value(self) -> Option<i64> {
        match self {
            Operand::Value(v) => Some(v),
            Operand::Tag(_) => None,
        }
    }

    pub fn tag(self) -> Option<usize> {
        match self {
            Operand::Tag(t) => Some(t),
            Operand::Value(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Station {
    pub busy: bool,
    pub class: StationClass,
    pub instruction: Option<Instruction>,
    pub pc: u32,
    pub vj: Operand,
    pub vk: Operand,
    /// Effective address, computed for loads/stores once operands resolve.
    pub address: Option<u32>,
    /// Index of the ROB entry this station's result is destined for.
    pub dest_rob: usize,
    /// Allocation order, used by memory disambiguation to determine
    /// "older"/"younger" among live stores.
    pub seq: u64,
}

impl Station {
    fn empty(class: StationClass) -> Self {
        Station {
            busy: false,
            class,
            instruction: None,
            pc: 0,
            vj: Operand::Value(0),
            vk: Operand::Value(0),
            address: None,
            dest_rob: 0,
            seq: 0,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.busy && self.vj.is_ready() && self.vk.is_ready()
    }

    pub fn release(&mut self) {
        *self = Station::empty(self.class);
    }

    /// Broadcast a CDB-style result: any operand slot tagged with
    /// `producing_rob` is replaced by the resolved value.
    pub fn receive_broadcast(&mut self, producing_rob: usize, value: i64) {
        if self.vj.tag() == Some(producing_rob) {
            self.vj = Operand::Value(value);
        }
        if self.vk.tag() == Some(producing_rob) {
            self.vk = Operand::Value(value);
        }
    }
}

#[derive(Debug, Clone)]
pub struct StationFile {
    stations: Vec<Station>,
}

impl StationFile {
    pub fn new(int_n: usize, add_n: usize, mult_n: usize, load_n: usize) -> Self {
        let mut stations = Vec::with_capacity(int_n + add_n + mult_n + load_n);
        stations.extend((0..int_n).map(|_| Station::empty(StationClass::Int)));
        stations.extend((0..add_n).map(|_| Station::empty(StationClass::Add)));
        stations.extend((0..mult_n).map(|_| Station::empty(StationClass::Mult)));
        stations.extend((0..load_n).map(|_| Station::empty(StationClass::Load)));
        StationFile { stations }
    }

    pub fn free_slot(&self, class: StationClass) -> Option<usize> {
        self.stations
            .iter()
            .position(|s| s.class == class && !s.busy)
    }

    pub fn get(&self, index: usize) -> &Station {
        &self.stations[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut Station {
        &mut self.stations[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Station> {
        self.stations.iter_mut()
    }

    pub fn indices_of_class(&self, class: StationClass) -> impl Iterator<Item = usize> + '_ {
        self.stations
            .iter()
            .enumerate()
            .filter(move |(_, s)| s.class == class)
            .map(|(i, _)| i)
    }

    pub fn broadcast(&mut self, producing_rob: usize, value: i64) {
        for station in &mut self.stations {
            station.receive_broadcast(producing_rob, value);
        }
    }

    pub fn reset(&mut self) {
        for station in &mut self.stations {
            station.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_slot_only_matches_class_and_idle() {
        let mut file = StationFile::new(1, 0, 0, 0);
        let idx = file.free_slot(StationClass::Int).unwrap();
        file.get_mut(idx).busy = true;
        assert!(file.free_slot(StationClass::Int).is_none());
    }

    #[test]
    fn broadcast_clears_only_matching_tags() {
        let mut file = StationFile::new(2, 0, 0, 0);
        file.get_mut(0).busy = true;
        file.get_mut(0).vj = Operand::Tag(5);
        file.get_mut(1).busy = true;
        file.get_mut(1).vj = Operand::Tag(6);

        file.broadcast(5, 99);
        assert_eq!(file.get(0).vj, Operand::Value(99));
        assert_eq!(file.get(1).vj, Operand::Tag(6));
    }
}
