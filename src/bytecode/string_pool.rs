/*!
  The string pool is the static data of a program image. It starts with one offset word per
  literal, followed by the literals themselves, each stored as its length followed by one
  code point per word. Offsets are relative to the start of the pool:

  ```text
  "abc", "qwerty"  ->  [2, 6, 3, 'a', 'b', 'c', 6, 'q', 'w', 'e', 'r', 't', 'y']
  ```
*/

use crate::bytecode::Word;
use crate::error::DecodeError;
use crate::memory::Value;

/// Collects string literals in the order the assembler meets them.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StringPool {
  literals: Vec<String>,
}

impl StringPool {
  pub fn new() -> StringPool {
    StringPool::default()
  }

  /// Appends a literal and returns its index. Equal literals are not merged.
  pub fn push(&mut self, literal: &str) -> Word {
    self.literals.push(literal.to_string());
    (self.literals.len() - 1) as Word
  }

  pub fn len(&self) -> usize {
    self.literals.len()
  }

  pub fn is_empty(&self) -> bool {
    self.literals.is_empty()
  }

  /// Packs the literals into the offset table plus length-prefixed code points.
  pub fn pack(&self) -> Vec<Word> {
    let mut data: Vec<Word> = vec![0; self.literals.len()];

    for (i, literal) in self.literals.iter().enumerate() {
      data[i] = data.len() as Word;
      data.push(literal.chars().count() as Word);
      data.extend(literal.chars().map(|c| c as Word));
    }

    data
  }
}

pub fn code_point_to_char(code_point: Value) -> Result<char, DecodeError> {
  std::char::from_u32(code_point as u32).ok_or(DecodeError::InvalidCodePoint(code_point))
}

/// Reads literal `index` back out of a packed pool.
pub fn lookup(pool: &[Word], index: Word) -> Result<String, DecodeError> {
  let out_of_range = || DecodeError::StringIndexOutOfRange { index: index as usize };

  // The first offset points just past the offset table, so it is also the literal count.
  let count = *pool.first().ok_or_else(out_of_range)? as usize;
  if index as usize >= count {
    return Err(out_of_range());
  }

  let offset = *pool.get(index as usize).ok_or_else(out_of_range)? as usize;
  if offset < count {
    return Err(out_of_range());
  }
  let length = *pool.get(offset).ok_or_else(out_of_range)? as usize;
  let start = offset + 1;
  let code_points = pool.get(start..start.saturating_add(length)).ok_or_else(out_of_range)?;

  code_points
    .iter()
    .map(|code_point| code_point_to_char(*code_point as Value))
    .collect()
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pool_layout(){
    let mut pool = StringPool::new();
    assert_eq!(pool.push("abc"), 0);
    assert_eq!(pool.push("qwerty"), 1);
    assert_eq!(
      pool.pack(),
      vec![2, 6, 3, 97, 98, 99, 6, 113, 119, 101, 114, 116, 121]
    );
  }

  #[test]
  fn empty_pool(){
    assert!(StringPool::new().pack().is_empty());
  }

  #[test]
  fn lookup_literals(){
    let mut pool = StringPool::new();
    pool.push("abc");
    pool.push("");
    pool.push("héllo wörld");
    let data = pool.pack();

    assert_eq!(lookup(&data, 0), Ok("abc".to_string()));
    assert_eq!(lookup(&data, 1), Ok("".to_string()));
    assert_eq!(lookup(&data, 2), Ok("héllo wörld".to_string()));
    assert_eq!(lookup(&data, 3), Err(DecodeError::StringIndexOutOfRange { index: 3 }));
  }

  #[test]
  fn lookup_truncated_pool(){
    // Claims a length of 5 with only two code points behind it.
    let data = vec![1, 5, 97, 98];
    assert_eq!(lookup(&data, 0), Err(DecodeError::StringIndexOutOfRange { index: 0 }));
  }

  #[test]
  fn index_past_offset_table(){
    let data = vec![2, 6, 3, 97, 98, 99, 6, 113, 119, 101, 114, 116, 121];
    // Word 2 is the length of "abc", not an offset.
    assert_eq!(lookup(&data, 2), Err(DecodeError::StringIndexOutOfRange { index: 2 }));
    assert_eq!(lookup(&[], 0), Err(DecodeError::StringIndexOutOfRange { index: 0 }));
    // An offset pointing back into the offset table.
    assert_eq!(lookup(&[2, 1, 0], 1), Err(DecodeError::StringIndexOutOfRange { index: 1 }));
  }

  #[test]
  fn invalid_code_point(){
    let data = vec![1, 1, 0xD800];
    assert_eq!(lookup(&data, 0), Err(DecodeError::InvalidCodePoint(0xD800)));
  }
}
