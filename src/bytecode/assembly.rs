/*!
  The human readable textual form of bytecode is called assembly. Each non-blank line holds
  one instruction: a mnemonic followed by whitespace separated operands.

  ```text
  # comment lines start with a hash
  LOADL r1 10
  MOV *r2 r1
  JUMP_IF_GZ r1 3
  PRINTSTR everything after the mnemonic is the literal
  ```

  A register operand is an optional run of `*`, one per level of indirection, followed by
  `ip`, `sp`, `rv` or `r1`..`r13`. An immediate is a non-negative decimal integer that must
  fit the bit width of its instruction's category.
*/

use std::str::FromStr;

use nom::{
  IResult,
  bytes::complete::take_till1,
  character::complete::{alphanumeric1, char as one_char, digit1},
  combinator::all_consuming,
  error::ErrorKind,
  multi::many0_count,
  sequence::pair,
};
use tracing::debug;

use crate::address::{register_index, AccessLevel, Register, MAX_ACCESS_LEVEL};
use crate::bytecode::{encode_instruction, Category, Image, Instruction, Opcode, StringPool, Word};
use crate::error::{AssemblyError, AssemblyErrorKind};

pub const COMMENT_CHAR: char = '#';

type ParseResult<'a, O> = IResult<&'a str, O, (&'a str, ErrorKind)>;

fn mnemonic(input: &str) -> ParseResult<&str> {
  take_till1(char::is_whitespace)(input)
}

/// `**r3` parses to `(2, "r3")`.
fn register_reference(input: &str) -> ParseResult<(usize, &str)> {
  all_consuming(pair(many0_count(one_char('*')), alphanumeric1))(input)
}

fn immediate_literal(input: &str) -> ParseResult<&str> {
  all_consuming(digit1)(input)
}

pub fn parse_register(token: &str) -> Result<Register, AssemblyErrorKind> {
  let (_, (access_level, name)) =
    register_reference(token)
      .map_err(|_| AssemblyErrorKind::InvalidRegister(token.to_string()))?;

  if access_level > MAX_ACCESS_LEVEL as usize {
    return Err(AssemblyErrorKind::TooManyIndirections(token.to_string()));
  }

  match register_index(name) {
    Some(index) => Ok(Register::new(access_level as AccessLevel, index)),
    None        => Err(AssemblyErrorKind::InvalidRegister(token.to_string()))
  }
}

pub fn parse_immediate(token: &str, width: u32) -> Result<Word, AssemblyErrorKind> {
  let (_, digits) =
    immediate_literal(token)
      .map_err(|_| AssemblyErrorKind::InvalidImmediate(token.to_string()))?;
  check_width(digits, width)
}

fn check_width(literal: &str, width: u32) -> Result<Word, AssemblyErrorKind> {
  let out_of_range = || AssemblyErrorKind::ImmediateOutOfRange {
    literal: literal.to_string(),
    width
  };
  // Too many digits for a `u64` is certainly too wide.
  let value: u64 = literal.parse().map_err(|_| out_of_range())?;
  match value < (1u64 << width) {
    true  => Ok(value as Word),
    false => Err(out_of_range())
  }
}

/// Assembles one line. Blank lines and comments produce no instruction.
pub fn assemble_line(line: &str, strings: &mut StringPool)
  -> Result<Option<Word>, AssemblyErrorKind>
{
  let line = line.trim();
  if line.is_empty() || line.starts_with(COMMENT_CHAR) {
    return Ok(None);
  }

  let (remainder, name) =
    mnemonic(line).map_err(|_| AssemblyErrorKind::UnknownInstruction(line.to_string()))?;
  let opcode =
    Opcode::from_str(name).map_err(|_| AssemblyErrorKind::UnknownInstruction(name.to_string()))?;
  let category = opcode.category();

  if opcode == Opcode::PrintStr {
    // The literal is everything after the separator, verbatim.
    let mut chars = remainder.chars();
    chars.next();
    let index = strings.push(chars.as_str());
    let width = category.immediate_width().unwrap_or(0);
    let immediate = check_width(&index.to_string(), width)?;
    return Ok(Some(encode_instruction(Instruction::Immediate { opcode, immediate })));
  }

  let operands: Vec<&str> = remainder.split_whitespace().collect();
  if operands.len() != opcode.arity() {
    return Err(AssemblyErrorKind::WrongArity {
      opcode,
      expected: opcode.arity(),
      given: operands.len()
    });
  }

  let instruction =
    match category {

      Category::RegisterRegister => Instruction::RegisterRegister {
        opcode,
        first: parse_register(operands[0])?,
        second: parse_register(operands[1])?,
      },

      Category::RegisterImmediate => Instruction::RegisterImmediate {
        opcode,
        register: parse_register(operands[0])?,
        immediate: parse_immediate(operands[1], category.immediate_width().unwrap_or(0))?,
      },

      Category::Register => Instruction::Register {
        opcode,
        register: parse_register(operands[0])?,
      },

      Category::Immediate => Instruction::Immediate {
        opcode,
        immediate: parse_immediate(operands[0], category.immediate_width().unwrap_or(0))?,
      },

      Category::OpcodeOnly => Instruction::OpcodeOnly(opcode),

    };

  Ok(Some(encode_instruction(instruction)))
}

/// Assembles a whole source text into an image. The first bad line aborts the assembly.
pub fn assemble(text: &str) -> Result<Image, AssemblyError> {
  let mut code: Vec<Word> = Vec::new();
  let mut strings = StringPool::new();

  for (i, line) in text.lines().enumerate() {
    let assembled =
      assemble_line(line, &mut strings).map_err(|kind| AssemblyError { line: i + 1, kind })?;
    if let Some(word) = assembled {
      code.push(word);
    }
  }

  debug!("assembled {} instructions and {} string literals", code.len(), strings.len());
  Ok(Image::new(code, strings.pack()))
}
