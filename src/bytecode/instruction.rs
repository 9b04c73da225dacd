use std::fmt::{Display, Formatter};

use strum_macros::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};
use num_enum::{TryFromPrimitive, IntoPrimitive};

use crate::address::Register;
use crate::bytecode::Word;

/**
  Opcodes of the virtual machine.

  The numeric value of each variant is the 5 bit opcode stored in the top of an instruction
  word, so the order the opcodes are listed below is significant. Unlike the opcode value,
  the argument layout is not derived from the order: it is given by `Opcode::category()`.
*/
#[derive(
  StrumDisplay, IntoStaticStr, EnumString, EnumIter, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,         PartialEq, Debug,           Hash
)]
#[repr(u8)]
pub enum Opcode {
  #[strum(to_string = "MOV")]        Mov,        // MOV dst src
  #[strum(to_string = "ADD")]        Add,        // ADD dst term
  #[strum(to_string = "SUB")]        Sub,        // SUB dst term
  #[strum(to_string = "POP")]        Pop,        // POP
  #[strum(to_string = "PUSH")]       Push,       // PUSH src
  #[strum(to_string = "CALL")]       Call,       // CALL funcnum
  #[strum(to_string = "FBEGIN")]     FBegin,     // FBEGIN funcnum
  #[strum(to_string = "FEND")]       FEnd,       // FEND
  #[strum(to_string = "TERM")]       Term,       // TERM
  #[strum(to_string = "JUMP")]       Jump,       // JUMP dst
  #[strum(to_string = "JUMP_IF_GZ")] JumpIfGz,   // JUMP_IF_GZ val offset
  #[strum(to_string = "PRINT")]      Print,      // PRINT src
  #[strum(to_string = "READ")]       Read,       // READ dst
  #[strum(to_string = "PRINTSTR")]   PrintStr,   // PRINTSTR literal
  #[strum(to_string = "LOADL")]      LoadL,      // LOADL dst imm16
  #[strum(to_string = "LOADH")]      LoadH,      // LOADH dst imm16
  #[strum(to_string = "ADDI")]       AddI,       // ADDI dst imm
  #[strum(to_string = "SUBI")]       SubI,       // SUBI dst imm
  #[strum(to_string = "INDIR_CALL")] IndirCall,  // INDIR_CALL src
}

/// The argument shape of an instruction.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum Category {
  /// [OpCode:5][Access:3][Register:4][Access:3][Register:4][Reserved:13]
  RegisterRegister,
  /// [OpCode:5][Access:3][Register:4][Immediate:20]
  RegisterImmediate,
  /// [OpCode:5][Access:3][Register:4][Reserved:20]
  Register,
  /// [OpCode:5][Immediate:27]
  Immediate,
  /// [OpCode:5][Reserved:27]
  OpcodeOnly,
}

impl Category {
  /// The bit width of the category's immediate operand, if it has one.
  pub fn immediate_width(&self) -> Option<u32> {
    match self {
      Category::RegisterImmediate => Some(20),
      Category::Immediate         => Some(27),
      _                           => None
    }
  }

  pub fn arity(&self) -> usize {
    match self {
      Category::RegisterRegister | Category::RegisterImmediate => 2,
      Category::Register         | Category::Immediate         => 1,
      Category::OpcodeOnly                                     => 0
    }
  }
}

impl Opcode {
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  pub fn name(&self) -> &'static str {
    (*self).into()
  }

  pub fn category(&self) -> Category {
    match self {
      Opcode::Mov | Opcode::Add | Opcode::Sub => Category::RegisterRegister,

      | Opcode::AddI
      | Opcode::SubI
      | Opcode::LoadL
      | Opcode::LoadH
      | Opcode::JumpIfGz => Category::RegisterImmediate,

      | Opcode::Push
      | Opcode::Jump
      | Opcode::Print
      | Opcode::Read
      | Opcode::IndirCall => Category::Register,

      Opcode::Call | Opcode::FBegin | Opcode::PrintStr => Category::Immediate,

      Opcode::Pop | Opcode::Term | Opcode::FEnd => Category::OpcodeOnly,
    }
  }

  pub fn arity(&self) -> usize {
    self.category().arity()
  }
}

/// Holds the unencoded components of an instruction. As such, it enumerates the possible
/// instruction argument combinations, one variant per `Category`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Instruction {
  RegisterRegister {
    opcode: Opcode,
    first: Register,
    second: Register
  },
  RegisterImmediate {
    opcode: Opcode,
    register: Register,
    immediate: Word
  },
  Register {
    opcode: Opcode,
    register: Register
  },
  Immediate {
    opcode: Opcode,
    immediate: Word
  },
  OpcodeOnly(Opcode),
}

/// The raw fields of an instruction regardless of its shape. Fields the category does not
/// have are zero, exactly as their bits are in the encoded word.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Operands {
  pub first: Register,
  pub second: Register,
  pub immediate: Word,
}

impl Instruction {
  pub fn opcode(&self) -> Opcode {
    match self {
      | Instruction::RegisterRegister { opcode, .. }
      | Instruction::RegisterImmediate { opcode, .. }
      | Instruction::Register { opcode, .. }
      | Instruction::Immediate { opcode, .. }
      | Instruction::OpcodeOnly(opcode) => *opcode
    }
  }

  pub fn operands(&self) -> Operands {
    match *self {
      Instruction::RegisterRegister { first, second, .. } => {
        Operands { first, second, ..Operands::default() }
      }
      Instruction::RegisterImmediate { register, immediate, .. } => {
        Operands { first: register, immediate, ..Operands::default() }
      }
      Instruction::Register { register, .. } => {
        Operands { first: register, ..Operands::default() }
      }
      Instruction::Immediate { immediate, .. } => {
        Operands { immediate, ..Operands::default() }
      }
      Instruction::OpcodeOnly(_) => Operands::default()
    }
  }
}

/// Renders the instruction as assembly. A `PRINTSTR` renders its raw string index here;
/// rendering the literal itself needs the string pool, see `disassembly`.
impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {

      Instruction::RegisterRegister { opcode, first, second } => {
        write!(f, "{} {} {}", opcode, first, second)
      }

      Instruction::RegisterImmediate { opcode, register, immediate } => {
        write!(f, "{} {} {}", opcode, register, immediate)
      }

      Instruction::Register { opcode, register } => {
        write!(f, "{} {}", opcode, register)
      }

      Instruction::Immediate { opcode, immediate } => {
        write!(f, "{} {}", opcode, immediate)
      }

      Instruction::OpcodeOnly(opcode) => {
        write!(f, "{}", opcode)
      }

    }
  }
}


#[cfg(test)]
mod tests {
  use std::convert::TryFrom;
  use std::str::FromStr;

  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn opcode_values(){
    assert_eq!(Opcode::Mov.code(), 0);
    assert_eq!(Opcode::Term.code(), 8);
    assert_eq!(Opcode::PrintStr.code(), 13);
    assert_eq!(Opcode::IndirCall.code(), 18);
    assert_eq!(Opcode::iter().count(), 19);
  }

  #[test]
  fn names_round_trip(){
    for opcode in Opcode::iter() {
      assert_eq!(Opcode::from_str(opcode.name()), Ok(opcode));
      assert_eq!(opcode.to_string(), opcode.name());
    }
    assert_eq!(Opcode::JumpIfGz.name(), "JUMP_IF_GZ");
    assert!(Opcode::from_str("mov").is_err());
    assert!(Opcode::from_str("HALT").is_err());
  }

  #[test]
  fn invalid_opcode_values(){
    assert_eq!(Opcode::try_from(18u8).ok(), Some(Opcode::IndirCall));
    for value in 19u8..32 {
      assert!(Opcode::try_from(value).is_err());
    }
  }

  #[test]
  fn categories(){
    assert_eq!(Opcode::Add.category(), Category::RegisterRegister);
    assert_eq!(Opcode::JumpIfGz.category(), Category::RegisterImmediate);
    assert_eq!(Opcode::IndirCall.category(), Category::Register);
    assert_eq!(Opcode::PrintStr.category(), Category::Immediate);
    assert_eq!(Opcode::FEnd.category(), Category::OpcodeOnly);

    assert_eq!(Opcode::Pop.arity(), 0);
    assert_eq!(Opcode::Call.arity(), 1);
    assert_eq!(Opcode::LoadH.arity(), 2);
  }

  #[test]
  fn display(){
    let instruction = Instruction::RegisterRegister {
      opcode: Opcode::Mov,
      first: Register::new(1, 3),
      second: Register::direct(2)
    };
    assert_eq!(instruction.to_string(), "MOV *r1 rv");
    assert_eq!(Instruction::OpcodeOnly(Opcode::Term).to_string(), "TERM");
  }
}
