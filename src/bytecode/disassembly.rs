//! Renders bytecode back into assembly. Everything but `PRINTSTR` renders through
//! `Instruction`'s `Display`; a `PRINTSTR` is rendered with its literal from the string pool.

use tracing::debug;

use crate::bytecode::{decode_instruction, string_pool, Image, Instruction, Opcode, Word};
use crate::error::DecodeError;

pub fn render_instruction(instruction: &Instruction, pool: &[Word]) -> Result<String, DecodeError> {
  match instruction {
    Instruction::Immediate { opcode: Opcode::PrintStr, immediate } => {
      Ok(format!("{} {}", Opcode::PrintStr, string_pool::lookup(pool, *immediate)?))
    }
    _ => Ok(instruction.to_string())
  }
}

pub fn disassemble_word(word: Word, pool: &[Word]) -> Result<String, DecodeError> {
  render_instruction(&decode_instruction(word)?, pool)
}

/// Disassembles every instruction of the image, one per line.
pub fn disassemble(image: &Image) -> Result<String, DecodeError> {
  let mut text = String::new();

  for word in image.code.iter() {
    text.push_str(&disassemble_word(*word, &image.static_data)?);
    text.push('\n');
  }

  debug!("disassembled {} instructions", image.instruction_count());
  Ok(text)
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::bytecode::assemble;

  const PROGRAM: &str = "\
FBEGIN 0
MOV rv *sp
POP
JUMP rv
FEND
LOADL r1 65535
LOADH r1 1
ADD r1 **r2
SUB ***r13 ip
ADDI sp 7
SUBI *rv 1048575
PUSH r1
READ *r3
PRINT r1
INDIR_CALL r4
JUMP_IF_GZ r1 2
CALL 0
PRINTSTR hi there
TERM
";

  #[test]
  fn round_trip_text(){
    let image = assemble(PROGRAM).unwrap();
    assert_eq!(disassemble(&image).unwrap(), PROGRAM);
  }

  #[test]
  fn round_trip_image(){
    let image = assemble(PROGRAM).unwrap();
    let reassembled = assemble(&disassemble(&image).unwrap()).unwrap();
    assert_eq!(reassembled, image);
  }

  #[test]
  fn printstr_renders_literal(){
    let image = assemble("PRINTSTR abc\nPRINTSTR qwerty").unwrap();
    assert_eq!(disassemble_word(image.code[0], &image.static_data).unwrap(), "PRINTSTR abc");
    assert_eq!(disassemble_word(image.code[1], &image.static_data).unwrap(), "PRINTSTR qwerty");
  }

  #[test]
  fn printstr_outside_pool(){
    let image = assemble("PRINTSTR abc").unwrap();
    assert_eq!(
      disassemble_word(image.code[0], &[]),
      Err(DecodeError::StringIndexOutOfRange { index: 0 })
    );
  }

  #[test]
  fn unknown_opcode_is_fatal(){
    let image = Image::new(vec![0xFFFF_FFFF], vec![]);
    assert_eq!(disassemble(&image), Err(DecodeError::UnknownOpcode(0xFFFF_FFFF)));
  }
}
