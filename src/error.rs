use thiserror::Error;

/// Failure taxonomy for the interpreter core.
///
/// Every variant except `ProgramTerminated` signals a malformed program or
/// image. All of them are fatal: a machine that raised one is poisoned and
/// must be rebuilt from the original program image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    /// A read or write named a negative address.
    #[error("invalid address {0}: addresses must be non-negative")]
    InvalidAddress(i64),

    /// The low two digits of an instruction word name no known opcode.
    #[error("unknown opcode {opcode} in instruction word {word}")]
    UnknownOpcode { word: i64, opcode: i64 },

    /// An operand's mode digit is not position (0), immediate (1), or
    /// relative (2).
    #[error("unknown addressing mode {mode} in instruction word {word}")]
    InvalidMode { word: i64, mode: i64 },

    /// A write-target operand was encoded in immediate mode.
    #[error("immediate-mode write target in instruction word {0}")]
    InvalidWriteMode(i64),

    /// The control surface was used after the machine halted.
    #[error("program has terminated")]
    ProgramTerminated,

    /// A token in the textual program image failed to parse as an integer.
    #[error("invalid program image token {0:?}")]
    InvalidImage(String),
}
