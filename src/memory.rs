//! The machine's single flat store. Registers, code, static data and the stack all live in
//! one array of words, so every address is just an index into it.

use crate::address::{AccessLevel, MAX_REGISTERS};
use crate::bytecode::Word;
use crate::error::RuntimeError;

/// Memory cells hold signed words. Arithmetic on them wraps at 32 bits.
pub type Value = i32;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Memory {
  cells: Vec<Value>,
}

impl Memory {
  /// Zero-initialized memory of `size` words.
  pub fn new(size: usize) -> Memory {
    Memory { cells: vec![0; size] }
  }

  pub fn len(&self) -> usize {
    self.cells.len()
  }

  pub fn is_empty(&self) -> bool {
    self.cells.is_empty()
  }

  fn index(&self, address: Value) -> Result<usize, RuntimeError> {
    match address >= 0 && (address as usize) < self.cells.len() {
      true  => Ok(address as usize),
      false => Err(RuntimeError::AddressOutOfBounds(address))
    }
  }

  pub fn read(&self, address: Value) -> Result<Value, RuntimeError> {
    Ok(self.cells[self.index(address)?])
  }

  pub fn write(&mut self, address: Value, value: Value) -> Result<(), RuntimeError> {
    let index = self.index(address)?;
    self.cells[index] = value;
    Ok(())
  }

  /**
    Follows `access_level` links starting from `value`. With an access level of zero the
    value is returned as is; otherwise it is taken as an address, the word there is read,
    and the process repeats with one level fewer.
  */
  pub fn resolve(&self, value: Value, access_level: AccessLevel) -> Result<Value, RuntimeError> {
    let mut value = value;
    for _ in 0..access_level {
      value = self.read(value)?;
    }
    Ok(value)
  }

  /// Copies `words` into memory starting at `start`.
  pub fn copy_from(&mut self, start: usize, words: &[Word]) -> Result<(), RuntimeError> {
    let end = start + words.len();
    if end > self.cells.len() {
      return Err(RuntimeError::ImageTooLarge { image: words.len(), memory: self.cells.len() });
    }
    for (cell, word) in self.cells[start..end].iter_mut().zip(words) {
      *cell = *word as Value;
    }
    Ok(())
  }

  /// The memory mapped register file.
  pub fn registers(&self) -> &[Value] {
    &self.cells[..MAX_REGISTERS.min(self.cells.len())]
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn resolve_without_indirection(){
    let memory = Memory::new(32);
    assert_eq!(memory.resolve(7, 0).unwrap(), 7);
    // Level zero never touches memory, even for addresses outside of it.
    assert_eq!(memory.resolve(-5, 0).unwrap(), -5);
    assert_eq!(memory.resolve(1000, 0).unwrap(), 1000);
  }

  #[test]
  fn resolve_follows_chain(){
    let mut memory = Memory::new(32);
    memory.write(3, 20).unwrap();
    memory.write(20, 25).unwrap();
    memory.write(25, -9).unwrap();

    assert_eq!(memory.resolve(3, 1).unwrap(), 20);
    assert_eq!(memory.resolve(3, 2).unwrap(), 25);
    assert_eq!(memory.resolve(3, 3).unwrap(), -9);
    assert!(matches!(memory.resolve(3, 4), Err(RuntimeError::AddressOutOfBounds(-9))));
  }

  #[test]
  fn bounds_are_checked(){
    let mut memory = Memory::new(16);
    assert!(matches!(memory.read(16), Err(RuntimeError::AddressOutOfBounds(16))));
    assert!(matches!(memory.write(-1, 0), Err(RuntimeError::AddressOutOfBounds(-1))));
    assert!(memory.read(15).is_ok());
  }

  #[test]
  fn copy_reinterprets_words(){
    let mut memory = Memory::new(20);
    memory.copy_from(16, &[1, 0xFFFF_FFFF]).unwrap();
    assert_eq!(memory.read(16).unwrap(), 1);
    assert_eq!(memory.read(17).unwrap(), -1);
    assert!(matches!(
      memory.copy_from(16, &[0; 5]),
      Err(RuntimeError::ImageTooLarge { image: 5, memory: 20 })
    ));
  }
}
