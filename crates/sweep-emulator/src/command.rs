//! Commands understood by the emulator executable

use std::fmt;

/// A single emulator sub-command, passed as the only process argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmulatorCommand {
    Start,
    Stop,
    Status,
}

impl EmulatorCommand {
    /// Lowercase argument token for the command line
    pub fn as_arg(&self) -> &'static str {
        match self {
            EmulatorCommand::Start => "start",
            EmulatorCommand::Stop => "stop",
            EmulatorCommand::Status => "status",
        }
    }
}

impl fmt::Display for EmulatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_arg())
    }
}
