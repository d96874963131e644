use std::error::Error;
use std::fmt;

/// Bad engine configuration, caught at construction time rather than as a
/// silent stall once the engine starts running.
#[derive(Debug)]
pub enum ConfigError {
    NoFunctionalUnits,
    ZeroSizedRob,
    ZeroIssueWidth,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoFunctionalUnits => write!(f, "no functional units configured"),
            ConfigError::ZeroSizedRob => write!(f, "reorder buffer size must be positive"),
            ConfigError::ZeroIssueWidth => write!(f, "issue width must be positive"),
        }
    }
}

/// A malformed assembly program, caught while assembling rather than while
/// running it.
#[derive(Debug)]
pub enum ProgramLoadError {
    UnknownOpcode { line: usize, token: String },
    MalformedOperand { line: usize, detail: String },
    UnresolvedLabel { line: usize, label: String },
}

impl fmt::Display for ProgramLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramLoadError::UnknownOpcode { line, token } => {
                write!(f, "line {line}: unknown opcode '{token}'")
            },
            ProgramLoadError::MalformedOperand { line, detail } => {
                write!(f, "line {line}: malformed operand ({detail})")
            },
            ProgramLoadError::UnresolvedLabel { line, label } => {
                write!(f, "line {line}: unresolved label '{label}'")
            },
        }
    }
}

/// An out-of-range or misaligned data memory access.
#[derive(Debug)]
pub enum MemoryError {
    OutOfBounds(u32),
    Misaligned(u32),
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::OutOfBounds(addr) => {
                write!(f, "memory access out of bounds: 0x{addr:08x}")
            },
            MemoryError::Misaligned(addr) => write!(f, "misaligned memory access: 0x{addr:08x}"),
        }
    }
}

/// Recoverable failures: bad configuration, a malformed program, or an
/// out-of-range memory access. Structural hazards (full ROB, full station)
/// and branch mispredicts are NOT errors — they are normal control flow
/// handled by stalling or squashing inside the engine.
#[derive(Debug)]
pub enum SimulatorError {
    Config(ConfigError),
    ProgramLoad(ProgramLoadError),
    Memory(MemoryError),
    Io(std::io::Error),
}

impl fmt::Display for SimulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulatorError::Config(e) => write!(f, "configuration error: {e}"),
            SimulatorError::ProgramLoad(e) => write!(f, "program load error: {e}"),
            SimulatorError::Memory(e) => write!(f, "memory error: {e}"),
            SimulatorError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl Error for SimulatorError {}

impl From<std::io::Error> for SimulatorError {
    fn from(error: std::io::Error) -> Self {
        SimulatorError::Io(error)
    }
}

impl From<ConfigError> for SimulatorError {
    fn from(error: ConfigError) -> Self {
        SimulatorError::Config(error)
    }
}

impl From<ProgramLoadError> for SimulatorError {
    fn from(error: ProgramLoadError) -> Self {
        SimulatorError::ProgramLoad(error)
    }
}

impl From<MemoryError> for SimulatorError {
    fn from(error: MemoryError) -> Self {
        SimulatorError::Memory(error)
    }
}
