use crate::address::MAX_REGISTERS;
use crate::error::RuntimeError;
use crate::memory::Value;

/// Ten million words, enough for any program the assembler is expected to see.
pub const DEFAULT_MEMORY_SIZE: usize = 10_000_000;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MachineConfig {
  /// Total words of memory, register file included. The stack starts at the top.
  pub memory_size: usize,
  /// Emit the DEBUG trace for every dispatched instruction.
  pub trace: bool,
}

impl Default for MachineConfig {
  fn default() -> MachineConfig {
    MachineConfig {
      memory_size: DEFAULT_MEMORY_SIZE,
      trace: cfg!(feature = "trace_computation"),
    }
  }
}

impl MachineConfig {
  /// Memory must hold more than the register file, and `sp` must fit in a word.
  pub fn validate(&self) -> Result<(), RuntimeError> {
    match self.memory_size > MAX_REGISTERS && self.memory_size <= Value::max_value() as usize {
      true  => Ok(()),
      false => Err(RuntimeError::InvalidMemorySize(self.memory_size))
    }
  }
}
