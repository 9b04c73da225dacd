//! Whole programs taken through the assembler, the image format and the interpreter.

use std::io::empty;

use vonneumann::bytecode::{decode_instruction, Instruction, Opcode};
use vonneumann::error::RuntimeError;
use vonneumann::{assemble, disassemble, Image, Machine, MachineConfig};

const CONFIG: MachineConfig = MachineConfig { memory_size: 4096, trace: false };

fn run_with_input(text: &str, input: &str) -> Result<String, RuntimeError> {
  let image = assemble(text).unwrap();
  let mut machine = Machine::with_image(&image, &CONFIG, input.as_bytes(), Vec::new())?;
  machine.run()?;
  Ok(String::from_utf8(machine.into_output()).unwrap())
}

fn run(text: &str) -> Result<String, RuntimeError> {
  run_with_input(text, "")
}

/// Prints the numbers from 5 down to 1 with a counting loop. `SUBI ip 6` moves `ip` back to
/// the `LOADL`, and the usual advance then lands on the `PRINT`.
const COUNTDOWN: &str = "\
LOADL r1 5
PRINT *r1
SUBI r1 1
JUMP_IF_GZ *r1 3
PRINTSTR liftoff
TERM
SUBI ip 6
";

#[test]
fn call_and_return(){
  let program = "\
FBEGIN 0
PRINTSTR in function
MOV r1 **sp
POP
JUMP *r1
FEND
CALL 0
PRINTSTR back
TERM
";
  assert_eq!(run(program).unwrap(), "in function\nback\n");
}

#[test]
fn countdown_loop(){
  assert_eq!(run(COUNTDOWN).unwrap(), "5\n4\n3\n2\n1\nliftoff\n");
}

#[test]
fn conditional_branch_not_taken_for_zero_and_negative(){
  let program = "\
JUMP_IF_GZ *r1 2
PRINTSTR not taken
TERM
";
  assert_eq!(run(program).unwrap(), "not taken\n");

  let negative = "\
SUBI r1 1
JUMP_IF_GZ *r1 2
PRINTSTR not taken
TERM
";
  assert_eq!(run(negative).unwrap(), "not taken\n");

  let positive = "\
ADDI r1 1
JUMP_IF_GZ *r1 2
PRINTSTR not taken
TERM
";
  assert_eq!(run(positive).unwrap(), "");
}

#[test]
fn backward_offsets_are_not_encodable(){
  assert!(assemble("JUMP_IF_GZ r1 -1").is_err());
  assert!(assemble("CALL -0").is_err());
}

#[test]
fn recursive_function_with_stack_frames(){
  // Function 1 prints r1 and recurses while r1 > 0, counting down. Each frame pops its
  // return address into r13 and pushes it back before recursing. `**sp` is the word on top
  // of the stack.
  let program = "\
FBEGIN 1
MOV r13 **sp
POP
PRINT *r1
SUBI r1 1
PUSH *r13
JUMP_IF_GZ *r1 2
JUMP_IF_GZ *r12 2
CALL 1
MOV r13 **sp
POP
JUMP *r13
FEND
LOADL r12 1
LOADL r1 3
CALL 1
PRINTSTR done
TERM
";
  assert_eq!(run(program).unwrap(), "3\n2\n1\ndone\n");
}

#[test]
fn indirect_calls_pick_function_at_run_time(){
  let program = "\
FBEGIN 10
PRINTSTR ten
MOV r3 **sp
POP
JUMP *r3
FEND
FBEGIN 20
PRINTSTR twenty
MOV r3 **sp
POP
JUMP *r3
FEND
READ r1
INDIR_CALL *r1
READ r1
INDIR_CALL *r1
TERM
";
  assert_eq!(run_with_input(program, "20\n10\n").unwrap(), "twenty\nten\n");
  assert!(matches!(
    run_with_input(program, "30\n"),
    Err(RuntimeError::UnknownFunction(30))
  ));
}

#[test]
fn memory_through_pointers(){
  // r1 points at address 1000; write 7 there and read it back through r1 and a copy of it.
  let program = "\
LOADL r1 1000
LOADL r2 7
MOV *r1 *r2
MOV r3 **r1
PRINT *r3
MOV r4 *r1
ADDI r4 0
PRINT **r4
TERM
";
  assert_eq!(run(program).unwrap(), "7\n7\n");
}

#[test]
fn string_pool_printing(){
  let program = "PRINTSTR abc\nPRINTSTR qwerty\nTERM\n";
  let image = assemble(program).unwrap();
  assert_eq!(
    image.static_data,
    vec![2, 6, 3, 97, 98, 99, 6, 113, 119, 101, 114, 116, 121]
  );
  assert_eq!(run(program).unwrap(), "abc\nqwerty\n");
}

#[test]
fn disassembly_round_trip(){
  let image = assemble(COUNTDOWN).unwrap();
  let text = disassemble(&image).unwrap();
  assert_eq!(text, COUNTDOWN);
  assert_eq!(assemble(&text).unwrap(), image);
}

#[test]
fn image_survives_the_file_system(){
  let image = assemble(COUNTDOWN).unwrap();
  let path = std::env::temp_dir().join(format!("vonneumann-{}.bin", std::process::id()));

  image.save(&path).unwrap();
  let loaded = Image::load(&path).unwrap();
  std::fs::remove_file(&path).unwrap();

  assert_eq!(loaded, image);
  assert_eq!(
    decode_instruction(loaded.code[0]),
    Ok(Instruction::RegisterImmediate {
      opcode: Opcode::LoadL,
      register: vonneumann::address::Register::direct(3),
      immediate: 5
    })
  );
}

#[test]
fn bare_register_operand_is_its_address(){
  let program = "\
LOADL r1 42
PRINT r1
PRINT *r1
PRINT sp
TERM
";
  assert_eq!(run(program).unwrap(), "3\n42\n1\n");
}

#[test]
fn falling_off_the_program_is_an_error(){
  // Without `TERM`, a zero word decodes as `MOV ip ip`, which sets `ip` to 0 and then
  // advances it into the register file. The value of `sp` does not decode.
  let image = assemble("LOADL r1 1").unwrap();
  let mut machine = Machine::with_image(&image, &CONFIG, empty(), Vec::new()).unwrap();
  assert!(matches!(machine.run(), Err(RuntimeError::Decode(_))));
}
