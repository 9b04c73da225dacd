use std::collections::HashMap;

use crate::memory::Value;

pub type FunctionNumber = Value;

/**
  The function table maps a function number to the address of the first instruction of its
  body. It is filled in while the machine runs, each time an `FBEGIN` is passed, so a
  function can only be called once its definition has been passed. Code lives in writable
  memory, so two function numbers may share one entry address.
*/
#[derive(Clone, Debug, Default)]
pub struct FunctionTable {
  table: HashMap<FunctionNumber, Value>,
}

impl FunctionTable {
  pub fn new() -> FunctionTable {
    FunctionTable::default()
  }

  /// Records the entry address of `function`, replacing an earlier definition.
  pub fn define(&mut self, function: FunctionNumber, entry: Value) {
    self.table.insert(function, entry);
  }

  pub fn entry(&self, function: FunctionNumber) -> Option<Value> {
    self.table.get(&function).copied()
  }

  pub fn len(&self) -> usize {
    self.table.len()
  }

  pub fn is_empty(&self) -> bool {
    self.table.is_empty()
  }

  pub fn clear(&mut self) {
    self.table.clear();
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn define_and_look_up(){
    let mut functions = FunctionTable::new();
    assert!(functions.is_empty());
    assert_eq!(functions.entry(0), None);

    functions.define(0, 17);
    functions.define(4, 30);
    assert_eq!(functions.entry(0), Some(17));
    assert_eq!(functions.entry(4), Some(30));
    assert_eq!(functions.len(), 2);
  }

  #[test]
  fn redefinition_replaces_entry(){
    let mut functions = FunctionTable::new();
    functions.define(1, 20);
    functions.define(1, 40);
    assert_eq!(functions.entry(1), Some(40));
    assert_eq!(functions.len(), 1);
  }

  #[test]
  fn functions_may_share_an_entry(){
    let mut functions = FunctionTable::new();
    functions.define(0, 17);
    functions.define(1, 17);
    assert_eq!(functions.entry(0), Some(17));
    assert_eq!(functions.entry(1), Some(17));
    assert_eq!(functions.len(), 2);

    functions.clear();
    assert!(functions.is_empty());
  }
}
