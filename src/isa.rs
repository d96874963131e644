// isa.rs
//
// Instruction and opcode model for the out-of-order core. An `Instruction` is
// an immutable decoded record; `Opcode` classifies it for reservation-station
// routing and functional-unit selection, mirroring the `is_branch`/`is_memory`/
// `is_int_r`/`is_int_imm`/`is_fp_alu` family of helpers in
// `original_source/sim_ooo.cc`.

use crate::reservation_station::StationClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // integer register-register ALU
    Add,
    Sub,
    Xor,
    And,
    Mult,
    Div,
    // integer-immediate ALU
    Addi,
    Subi,
    // floating-point ALU
    Adds,
    Subs,
    Mults,
    Divs,
    // memory
    Lw,
    Sw,
    Lws,
    Sws,
    // branches
    Beqz,
    Bnez,
    Bltz,
    Bgtz,
    Blez,
    Bgez,
    Jump,
    // terminator
    Eop,
}

impl Opcode {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Xor => "XOR",
            Opcode::And => "AND",
            Opcode::Mult => "MULT",
            Opcode::Div => "DIV",
            Opcode::Addi => "ADDI",
            Opcode::Subi => "SUBI",
            Opcode::Adds => "ADDS",
            Opcode::Subs => "SUBS",
            Opcode::Mults => "MULTS",
            Opcode::Divs => "DIVS",
            Opcode::Lw => "LW",
            Opcode::Sw => "SW",
            Opcode::Lws => "LWS",
            Opcode::Sws => "SWS",
            Opcode::Beqz => "BEQZ",
            Opcode::Bnez => "BNEZ",
            Opcode::Bltz => "BLTZ",
            Opcode::Bgtz => "BGTZ",
            Opcode::Blez => "BLEZ",
            Opcode::Bgez => "BGEZ",
            Opcode::Jump => "JUMP",
            Opcode::Eop => "EOP",
        }
    }

    pub fn from_mnemonic(token: &str) -> Option<Self> {
        Some(match token {
            "ADD" => Opcode::Add,
            "SUB" => Opcode::Sub,
            "XOR" => Opcode::Xor,
            "AND" => Opcode::And,
            "MULT" => Opcode::Mult,
            "DIV" => Opcode::Div,
            "ADDI" => Opcode::Addi,
            "SUBI" => Opcode::Subi,
            "ADDS" => Opcode::Adds,
            "SUBS" => Opcode::Subs,
            "MULTS" => Opcode::Mults,
            "DIVS" => Opcode::Divs,
            "LW" => Opcode::Lw,
            "SW" => Opcode::Sw,
            "LWS" => Opcode::Lws,
            "SWS" => Opcode::Sws,
            "BEQZ" => Opcode::Beqz,
            "BNEZ" => Opcode::Bnez,
            "BLTZ" => Opcode::Bltz,
            "BGTZ" => Opcode::Bgtz,
            "BLEZ" => Opcode::Blez,
            "BGEZ" => Opcode::Bgez,
            "JUMP" => Opcode::Jump,
            "EOP" => Opcode::Eop,
            _ => return None,
        })
    }

    pub fn is_branch(self) -> bool {
        matches!(
            self,
            Opcode::Beqz
                | Opcode::Bnez
                | Opcode::Bltz
                | Opcode::Bgtz
                | Opcode::Blez
                | Opcode::Bgez
                | Opcode::Jump
        )
    }

    pub fn is_memory(self) -> bool {
        matches!(self, Opcode::Lw | Opcode::Sw | Opcode::Lws | Opcode::Sws)
    }

    pub fn is_store(self) -> bool {
        matches!(self, Opcode::Sw | Opcode::Sws)
    }

    pub fn is_load(self) -> bool {
        matches!(self, Opcode::Lw | Opcode::Lws)
    }

    pub fn is_int_register(self) -> bool {
        matches!(self, Opcode::Add | Opcode::Sub | Opcode::Xor | Opcode::And)
    }

    pub fn is_int_immediate(self) -> bool {
        matches!(self, Opcode::Addi | Opcode::Subi)
    }

    pub fn is_int(self) -> bool {
        self.is_int_register() || self.is_int_immediate()
    }

    pub fn is_fp_alu(self) -> bool {
        matches!(
            self,
            Opcode::Adds | Opcode::Subs | Opcode::Mults | Opcode::Divs
        )
    }

    /// Destination bank: floating-point ALU results and LWS land in the FP
    /// register bank; everything else with a destination lands in the
    /// integer bank.
    pub fn writes_fp_bank(self) -> bool {
        self.is_fp_alu() || self == Opcode::Lws
    }

    /// Bank that `src1` is read from. Memory base registers and branch
    /// conditions are always integer, even for LWS/SWS.
    pub fn src1_is_fp(self) -> bool {
        self.is_fp_alu() || self == Opcode::Sws
    }

    /// Bank that `src2` is read from. Only the register-register integer and
    /// floating ALU forms use a second source register.
    pub fn src2_is_fp(self) -> bool {
        self.is_fp_alu()
    }

    /// Reservation-station class this opcode must be issued into. Stores and
    /// loads share the LOAD class (the `res_station_names`/`LOAD_B` grouping
    /// in `original_source/sim_ooo.cc`); branches issue into INT, same as the
    /// teacher's `get_functional_unit_type` routes them to an integer-flavored
    /// unit.
    pub fn station_class(self) -> StationClass {
        match self {
            _ if self.is_int() => StationClass::Int,
            _ if self.is_branch() => StationClass::Int,
            _ if self.is_memory() => StationClass::Load,
            Opcode::Adds | Opcode::Subs => StationClass::Add,
            Opcode::Mults | Opcode::Divs => StationClass::Mult,
            Opcode::Eop => unreachable!("EOP never issues into a reservation station"),
            _ => unreachable!("opcode {:?} has no station class", self),
        }
    }
}

/// Which functional-unit type executes a given opcode. Kept distinct from
/// `StationClass` because ADD/SUB/MULT/DIV integer ops and ADDS/SUBS/MULTS/DIVS
/// floating ops share reservation-station classes but need separate latencies
/// (MULT and MULTS both dispatch through a MULTIPLIER unit, DIV/DIVS through a
/// DIVIDER unit) — matching `get_free_unit`'s switch in
/// `original_source/sim_ooo.cc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitType {
    Integer,
    Memory,
    Adder,
    Multiplier,
    Divider,
}

impl Opcode {
    pub fn unit_type(self) -> UnitType {
        match self {
            Opcode::Add | Opcode::Sub | Opcode::Xor | Opcode::And | Opcode::Addi
            | Opcode::Subi => UnitType::Integer,
            _ if self.is_branch() => UnitType::Integer,
            _ if self.is_memory() => UnitType::Memory,
            Opcode::Adds | Opcode::Subs => UnitType::Adder,
            Opcode::Mult | Opcode::Mults => UnitType::Multiplier,
            Opcode::Div | Opcode::Divs => UnitType::Divider,
            Opcode::Eop => unreachable!("EOP never dispatches to a functional unit"),
        }
    }
}

/// A decoded, immutable instruction record. `src1`/`src2` are architectural
/// register indices (meaning depends on opcode: integer or floating bank);
/// `dest` is the destination register index before any floating-bank offset
/// is applied. `immediate` holds an ADDI/SUBI constant, a load/store byte
/// offset, or (for branches/JUMP) a signed PC-relative displacement in bytes,
/// already resolved by the assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub src1: Option<u32>,
    pub src2: Option<u32>,
    pub dest: Option<u32>,
    pub immediate: i32,
}

impl Instruction {
    pub fn eop() -> Self {
        Instruction {
            opcode: Opcode::Eop,
            src1: None,
            src2: None,
            dest: None,
            immediate: 0,
        }
    }
}

/// Computes an opcode's result given its resolved operands. Grounded
/// directly in `original_source/sim_ooo.cc`'s `alu()`: integer ops wrap on
/// overflow like the host's native arithmetic, floating ops reinterpret the
/// low 32 bits of each operand as an `f32` (the original packs/unpacks a
/// plain 32-bit float), and branches/JUMP compute a PC rather than a
/// register value.
pub fn alu(opcode: Opcode, v1: i64, v2: i64, immediate: i32, pc: u32) -> i64 {
    match opcode {
        Opcode::Add => v1.wrapping_add(v2),
        Opcode::Sub => v1.wrapping_sub(v2),
        Opcode::Xor => v1 ^ v2,
        Opcode::And => v1 & v2,
        Opcode::Mult => v1.wrapping_mul(v2),
        Opcode::Div => v1 / v2,
        Opcode::Addi => v1.wrapping_add(immediate as i64),
        Opcode::Subi => v1.wrapping_sub(immediate as i64),
        Opcode::Adds => fp_binop(v1, v2, |a, b| a + b),
        Opcode::Subs => fp_binop(v1, v2, |a, b| a - b),
        Opcode::Mults => fp_binop(v1, v2, |a, b| a * b),
        Opcode::Divs => fp_binop(v1, v2, |a, b| a / b),
        Opcode::Jump => pc.wrapping_add(4).wrapping_add(immediate as u32) as i64,
        _ if opcode.is_branch() => {
            let target = pc.wrapping_add(4).wrapping_add(immediate as u32);
            if branch_taken(opcode, v1) {
                target as i64
            } else {
                pc.wrapping_add(4) as i64
            }
        },
        _ => unreachable!("opcode {:?} has no ALU computation", opcode),
    }
}

fn fp_binop(v1: i64, v2: i64, op: impl Fn(f32, f32) -> f32) -> i64 {
    let a = f32::from_bits(v1 as u32);
    let b = f32::from_bits(v2 as u32);
    op(a, b).to_bits() as i64
}

fn branch_taken(opcode: Opcode, v1: i64) -> bool {
    match opcode {
        Opcode::Beqz => v1 == 0,
        Opcode::Bnez => v1 != 0,
        Opcode::Bgez => v1 >= 0,
        Opcode::Blez => v1 <= 0,
        Opcode::Bgtz => v1 > 0,
        Opcode::Bltz => v1 < 0,
        _ => unreachable!("not a conditional branch opcode"),
    }
}

#[cfg(test)]
mod alu_tests {
    use super::*;

    #[test]
    fn integer_add_wraps() {
        assert_eq!(alu(Opcode::Add, i64::MAX, 1, 0, 0), i64::MIN);
    }

    #[test]
    fn float_multiply_reinterprets_bit_patterns() {
        let a = 2.0f32.to_bits() as i64;
        let b = 3.0f32.to_bits() as i64;
        let result = alu(Opcode::Mults, a, b, 0, 0);
        assert_eq!(f32::from_bits(result as u32), 6.0);
    }

    #[test]
    fn untaken_branch_targets_pc_plus_four() {
        assert_eq!(alu(Opcode::Beqz, 1, 0, 100, 40), 44);
    }

    #[test]
    fn taken_branch_targets_pc_plus_four_plus_displacement() {
        assert_eq!(alu(Opcode::Bnez, 1, 0, -8, 40), 36);
    }

    #[test]
    fn jump_always_targets_pc_plus_four_plus_displacement() {
        assert_eq!(alu(Opcode::Jump, 0, 0, 16, 100), 120);
    }
}
