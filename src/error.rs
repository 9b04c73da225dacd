//! Error types for every stage of the toolchain. Each stage is a batch job, so every error
//! here is fatal to the run that produced it.

use std::io;

use thiserror::Error;

use crate::bytecode::{Opcode, Word};
use crate::memory::Value;

/// The reasons a single line of assembly can be rejected.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum AssemblyErrorKind {
  #[error("unknown instruction `{0}`")]
  UnknownInstruction(String),

  #[error("`{0}` is not a register")]
  InvalidRegister(String),

  #[error("`{0}` has more than 7 levels of indirection")]
  TooManyIndirections(String),

  #[error("immediate {literal} does not fit in {width} bits")]
  ImmediateOutOfRange { literal: String, width: u32 },

  #[error("`{0}` is not a non-negative integer")]
  InvalidImmediate(String),

  #[error("{opcode} requires {expected} operands but was given {given}")]
  WrongArity { opcode: Opcode, expected: usize, given: usize },
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("Error on line {line}: {kind}")]
pub struct AssemblyError {
  pub line: usize,
  pub kind: AssemblyErrorKind,
}

/// Raised when a word or an image does not follow the binary layout.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum DecodeError {
  #[error("unknown instruction: {0:032b}")]
  UnknownOpcode(Word),

  #[error("{opcode} instruction has non-zero padding bits: {word:032b}")]
  NonZeroPadding { opcode: Opcode, word: Word },

  #[error("string {index} is outside of the string pool")]
  StringIndexOutOfRange { index: usize },

  #[error("{0} is not a valid code point")]
  InvalidCodePoint(Value),

  #[error("image declares {declared} instructions but only holds {available} words")]
  TruncatedImage { declared: usize, available: usize },
}

#[derive(Debug, Error)]
pub enum ImageError {
  #[error("image file is empty")]
  Empty,

  #[error("image length of {0} bytes is not a multiple of the word size")]
  Misaligned(usize),

  #[error(transparent)]
  Decode(#[from] DecodeError),

  #[error(transparent)]
  Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum RuntimeError {
  #[error(transparent)]
  Decode(#[from] DecodeError),

  #[error("nested functions are not supported (FBEGIN {function} at {address})")]
  NestedFunction { function: Word, address: Value },

  #[error("function {0} has not been defined")]
  UnknownFunction(Value),

  #[error("address {0} is outside of memory")]
  AddressOutOfBounds(Value),

  #[error("immediate {0} does not fit in 16 bits")]
  ImmediateOutOfRange(Word),

  #[error("memory of {0} words cannot hold the register file and be addressed")]
  InvalidMemorySize(usize),

  #[error("image of {image} words does not fit in {memory} words of memory")]
  ImageTooLarge { image: usize, memory: usize },

  #[error("unexpected end of input")]
  UnexpectedEndOfInput,

  #[error("`{0}` is not an integer")]
  InvalidInput(String),

  #[error(transparent)]
  Io(#[from] io::Error),
}
