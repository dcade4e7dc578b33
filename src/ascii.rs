use crate::error::VmError;
use crate::machine::{Machine, Status};

/// The newline code terminating each outgoing line.
const NEWLINE: i64 = 10;

/// How the wrapper renders drained output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// The raw numeric output values, untranslated.
    Raw,
    /// Output values decoded as text via direct code-point mapping.
    #[default]
    Text,
    /// Both the raw values and the decoded text.
    Both,
}

/// Output of one [`AsciiMachine::run`] or [`AsciiMachine::send`] call,
/// rendered per the wrapper's output mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsciiOutput {
    Raw(Vec<i64>),
    Text(String),
    Both { raw: Vec<i64>, text: String },
}

impl AsciiOutput {
    /// The raw codes, when the mode preserved them.
    pub fn raw(&self) -> Option<&[i64]> {
        match self {
            AsciiOutput::Raw(raw) | AsciiOutput::Both { raw, .. } => Some(raw),
            AsciiOutput::Text(_) => None,
        }
    }

    /// The decoded text, when the mode produced it.
    pub fn text(&self) -> Option<&str> {
        match self {
            AsciiOutput::Text(text) | AsciiOutput::Both { text, .. } => Some(text),
            AsciiOutput::Raw(_) => None,
        }
    }
}

/// A machine wrapped for text I/O.
///
/// Outgoing text is encoded as one input value per character code followed
/// by a trailing newline code (10); drained output is translated per
/// [`OutputMode`]. The translation carries no machine-level semantics:
/// whatever the codes mean to a particular program is the caller's business,
/// and out-of-range codes always survive untouched in raw form.
#[derive(Debug, Clone)]
pub struct AsciiMachine {
    machine: Machine,
    mode: OutputMode,
}

impl AsciiMachine {
    pub fn new(machine: Machine, mode: OutputMode) -> Self {
        Self { machine, mode }
    }

    /// Parse a textual program image and wrap it for text I/O.
    pub fn from_image(image: &str, mode: OutputMode) -> Result<Self, VmError> {
        Ok(Self::new(Machine::from_image(image)?, mode))
    }

    /// Run without supplying input; translate whatever the program printed.
    pub fn run(&mut self) -> Result<AsciiOutput, VmError> {
        let raw = self.machine.run()?;
        Ok(self.translate(raw))
    }

    /// Supply one line of text (a code per character plus the trailing
    /// newline code), then run.
    pub fn send(&mut self, line: &str) -> Result<AsciiOutput, VmError> {
        for ch in line.chars() {
            self.machine.supply_input(ch as i64)?;
        }
        self.machine.supply_input(NEWLINE)?;
        self.run()
    }

    pub fn status(&self) -> Status {
        self.machine.status()
    }

    /// The wrapped machine, for snapshots and diagnostics.
    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    /// Mutable access to the wrapped machine, for callers that mix raw and
    /// text I/O on one instance.
    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    fn translate(&self, raw: Vec<i64>) -> AsciiOutput {
        match self.mode {
            OutputMode::Raw => AsciiOutput::Raw(raw),
            OutputMode::Text => AsciiOutput::Text(decode_text(&raw)),
            OutputMode::Both => {
                let text = decode_text(&raw);
                AsciiOutput::Both { raw, text }
            }
        }
    }
}

/// Map output codes to characters by direct code-point mapping. Codes that
/// are not valid scalar values (negative, surrogate, past U+10FFFF) decode
/// as U+FFFD.
fn decode_text(codes: &[i64]) -> String {
    codes
        .iter()
        .map(|&code| {
            u32::try_from(code)
                .ok()
                .and_then(char::from_u32)
                .unwrap_or(char::REPLACEMENT_CHARACTER)
        })
        .collect()
}
