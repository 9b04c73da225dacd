//! Register references. The register file is memory mapped onto the lowest `MAX_REGISTERS`
//! words of memory, so a register index is also the address of the register's cell.
//!
//! A reference carries an access level, the number of times the register's value is
//! dereferenced before it is used. `r1` is the value in `r1`, `*r1` is the word whose
//! address is in `r1`, and so on.

use std::fmt::{Display, Formatter};

pub type RegisterIndex = u8;
pub type AccessLevel = u8;

/// The size of the register file, which is also the address of the first instruction.
pub const MAX_REGISTERS: usize = 16;
/// The access level occupies 3 bits of an instruction.
pub const MAX_ACCESS_LEVEL: AccessLevel = 7;

pub const IP_INDEX: RegisterIndex = 0;
pub const SP_INDEX: RegisterIndex = 1;
pub const RV_INDEX: RegisterIndex = 2;

/// Names of the special registers, ordered by index.
pub const SPECIAL_REGISTERS: [&str; 3] = ["ip", "sp", "rv"];

#[derive(Copy, Clone, Default, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct Register {
  pub access_level: AccessLevel,
  pub index: RegisterIndex,
}

impl Register {
  pub fn new(access_level: AccessLevel, index: RegisterIndex) -> Register {
    debug_assert!(access_level <= MAX_ACCESS_LEVEL);
    debug_assert!((index as usize) < MAX_REGISTERS);
    Register { access_level, index }
  }

  /// A reference to the register itself, without indirection.
  pub fn direct(index: RegisterIndex) -> Register {
    Register::new(0, index)
  }

  pub fn name(&self) -> String {
    register_name(self.index)
  }
}

/// Maps `ip`, `sp`, `rv` and `r<k>` to a register index. General register `r<k>` lives at
/// index `2 + k`, so `k` runs from 1 to 13.
pub fn register_index(name: &str) -> Option<RegisterIndex> {
  if let Some(index) = SPECIAL_REGISTERS.iter().position(|special| *special == name) {
    return Some(index as RegisterIndex);
  }

  let digits = name.strip_prefix('r')?;
  if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  let k: usize = digits.parse().ok()?;
  let index = k.checked_add(SPECIAL_REGISTERS.len() - 1)?;
  match k >= 1 && index < MAX_REGISTERS {
    true  => Some(index as RegisterIndex),
    false => None
  }
}

pub fn register_name(index: RegisterIndex) -> String {
  match SPECIAL_REGISTERS.get(index as usize) {
    Some(name) => name.to_string(),
    None       => format!("r{}", index as usize - SPECIAL_REGISTERS.len() + 1)
  }
}

impl Display for Register {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    for _ in 0..self.access_level {
      write!(f, "*")?;
    }
    write!(f, "{}", self.name())
  }
}
