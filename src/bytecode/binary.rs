/*!
  This module is responsible for the encoding and decoding of binary instructions.

  Field offsets are counted in bits from the most significant bit of the word, so the
  opcode is at offset 0 and the first access level at offset 5.
*/
use std::convert::TryFrom;

use super::{Category, Instruction, Opcode};
use crate::address::{AccessLevel, Register, RegisterIndex};
use crate::error::DecodeError;

// If you change this you must also change `encode_instruction` and `decode_instruction`.
pub type Word = u32;

pub const WORD_BITS: u32 = 32;
pub const OPCODE_BITS: u32 = 5;
pub const ACCESS_LEVEL_BITS: u32 = 3;
pub const REGISTER_BITS: u32 = 4;
/// Width of a register reference: access level followed by register index.
pub const REGISTER_REFERENCE_BITS: u32 = ACCESS_LEVEL_BITS + REGISTER_BITS;

const FIRST_REGISTER_OFFSET: u32 = OPCODE_BITS;
const SECOND_REGISTER_OFFSET: u32 = OPCODE_BITS + REGISTER_REFERENCE_BITS;

fn mask(width: u32) -> Word {
  match width >= WORD_BITS {
    true  => Word::max_value(),
    false => (1 << width) - 1
  }
}

/// Reads the `width` bit field starting `offset` bits below the most significant bit.
fn field(word: Word, offset: u32, width: u32) -> Word {
  (word >> (WORD_BITS - offset - width)) & mask(width)
}

/// Places `value` into the `width` bit field starting `offset` bits below the MSB.
fn place(value: Word, offset: u32, width: u32) -> Word {
  (value & mask(width)) << (WORD_BITS - offset - width)
}

fn place_register(register: Register, offset: u32) -> Word {
  place(register.access_level as Word, offset, ACCESS_LEVEL_BITS)
    | place(register.index as Word, offset + ACCESS_LEVEL_BITS, REGISTER_BITS)
}

fn extract_register(word: Word, offset: u32) -> Register {
  Register::new(
    field(word, offset, ACCESS_LEVEL_BITS) as AccessLevel,
    field(word, offset + ACCESS_LEVEL_BITS, REGISTER_BITS) as RegisterIndex
  )
}

/// The number of low bits of the category's layout that are reserved and must be zero.
fn padding_bits(category: Category) -> u32 {
  let used = match category {
    Category::RegisterRegister  => OPCODE_BITS + 2 * REGISTER_REFERENCE_BITS,
    Category::Register          => OPCODE_BITS + REGISTER_REFERENCE_BITS,
    Category::OpcodeOnly        => OPCODE_BITS,
    Category::RegisterImmediate
    | Category::Immediate       => WORD_BITS
  };
  WORD_BITS - used
}

/// Reads the opcode out of the top bits of a word.
pub fn decode_opcode(word: Word) -> Result<Opcode, DecodeError> {
  Opcode::try_from(field(word, 0, OPCODE_BITS) as u8)
    .map_err(|_| DecodeError::UnknownOpcode(word))
}

pub fn decode_instruction(word: Word) -> Result<Instruction, DecodeError> {
  let opcode = decode_opcode(word)?;
  let category = opcode.category();

  if word & mask(padding_bits(category)) != 0 {
    return Err(DecodeError::NonZeroPadding { opcode, word });
  }

  let instruction =
    match category {

      Category::RegisterRegister => {
        // [OpCode:5][Access:3][Register:4][Access:3][Register:4][Reserved:13]
        Instruction::RegisterRegister {
          opcode,
          first: extract_register(word, FIRST_REGISTER_OFFSET),
          second: extract_register(word, SECOND_REGISTER_OFFSET),
        }
      }

      Category::RegisterImmediate => {
        // [OpCode:5][Access:3][Register:4][Immediate:20]
        let width = WORD_BITS - SECOND_REGISTER_OFFSET;
        Instruction::RegisterImmediate {
          opcode,
          register: extract_register(word, FIRST_REGISTER_OFFSET),
          immediate: field(word, SECOND_REGISTER_OFFSET, width),
        }
      }

      Category::Register => {
        // [OpCode:5][Access:3][Register:4][Reserved:20]
        Instruction::Register {
          opcode,
          register: extract_register(word, FIRST_REGISTER_OFFSET),
        }
      }

      Category::Immediate => {
        // [OpCode:5][Immediate:27]
        Instruction::Immediate {
          opcode,
          immediate: field(word, OPCODE_BITS, WORD_BITS - OPCODE_BITS),
        }
      }

      Category::OpcodeOnly => Instruction::OpcodeOnly(opcode),

    };

  Ok(instruction)
}

/**
  Encodes the instruction into bytecode. It is the caller's responsibility to use the
  `Instruction` variant matching the opcode's category and to keep immediates within the
  category's width; bits beyond the width are dropped.
*/
pub fn encode_instruction(instruction: Instruction) -> Word {
  let opcode = instruction.opcode();
  debug_assert!(
    arguments_match_category(&instruction),
    "{} encoded with the wrong argument shape", opcode
  );
  let opcode_bits = place(opcode.code() as Word, 0, OPCODE_BITS);

  match instruction {

    Instruction::RegisterRegister { first, second, .. } => {
      opcode_bits
        | place_register(first, FIRST_REGISTER_OFFSET)
        | place_register(second, SECOND_REGISTER_OFFSET)
    }

    Instruction::RegisterImmediate { register, immediate, .. } => {
      opcode_bits
        | place_register(register, FIRST_REGISTER_OFFSET)
        | place(immediate, SECOND_REGISTER_OFFSET, WORD_BITS - SECOND_REGISTER_OFFSET)
    }

    Instruction::Register { register, .. } => {
      opcode_bits | place_register(register, FIRST_REGISTER_OFFSET)
    }

    Instruction::Immediate { immediate, .. } => {
      opcode_bits | place(immediate, OPCODE_BITS, WORD_BITS - OPCODE_BITS)
    }

    Instruction::OpcodeOnly(_) => opcode_bits,

  }
}

fn arguments_match_category(instruction: &Instruction) -> bool {
  let category = instruction.opcode().category();
  match instruction {
    Instruction::RegisterRegister { .. }  => category == Category::RegisterRegister,
    Instruction::RegisterImmediate { .. } => category == Category::RegisterImmediate,
    Instruction::Register { .. }          => category == Category::Register,
    Instruction::Immediate { .. }         => category == Category::Immediate,
    Instruction::OpcodeOnly(_)            => category == Category::OpcodeOnly,
  }
}
