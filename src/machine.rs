//! The execution engine. A `Machine` owns the whole address space of one program run: the
//! memory mapped registers, the loaded code and static data, and the stack growing down from
//! the top of memory.

use std::fmt::{Display, Formatter};
use std::io::{BufRead, Write};

use tracing::{debug, info};

use crate::address::{Register, IP_INDEX, MAX_REGISTERS, SP_INDEX};
use crate::bytecode::{decode_instruction, Image, Instruction, Opcode, Word};
use crate::config::MachineConfig;
use crate::error::{DecodeError, RuntimeError};
use crate::function_table::{FunctionNumber, FunctionTable};
use crate::memory::{Memory, Value};
use crate::bytecode::string_pool::code_point_to_char;
use crate::trace;

/// `LOADL` and `LOADH` each replace one half of a word.
const HALF_WORD_BITS: u32 = 16;
const LOW_HALF: Word = 0x0000_FFFF;
const HIGH_HALF: Word = 0xFFFF_0000;

/// What the dispatch loop does after an instruction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Step {
  Continue,
  Halt,
}

pub struct Machine<R: BufRead, W: Write> {
  memory: Memory,
  functions: FunctionTable,
  /// Set between an `FBEGIN` and its `FEND` while the body is passed over.
  in_function_body: bool,
  /// Address of the first word of the string pool.
  static_base: Value,
  instruction_count: usize,
  trace: bool,
  input: R,
  output: W,
}

impl<R: BufRead, W: Write> Machine<R, W> {

  // region Construction and loading

  pub fn new(config: &MachineConfig, input: R, output: W) -> Result<Self, RuntimeError> {
    config.validate()?;
    Ok(Machine {
      memory: Memory::new(config.memory_size),
      functions: FunctionTable::new(),
      in_function_body: false,
      static_base: MAX_REGISTERS as Value,
      instruction_count: 0,
      trace: config.trace,
      input,
      output,
    })
  }

  /// Builds a machine and loads `image` into it.
  pub fn with_image(image: &Image, config: &MachineConfig, input: R, output: W)
    -> Result<Self, RuntimeError>
  {
    let mut machine = Machine::new(config, input, output)?;
    machine.load(image)?;
    Ok(machine)
  }

  /**
    Resets the machine and loads `image`. Memory is zeroed, `ip` points at the first
    instruction right after the register file, and `sp` points one past the top of memory so
    the first push lands in the last word. Code and string pool are copied back to back.
  */
  pub fn load(&mut self, image: &Image) -> Result<(), RuntimeError> {
    let memory_size = self.memory.len();
    self.memory = Memory::new(memory_size);
    self.functions.clear();
    self.in_function_body = false;

    self.memory.write(IP_INDEX as Value, MAX_REGISTERS as Value)?;
    self.memory.write(SP_INDEX as Value, memory_size as Value)?;
    self.memory.copy_from(MAX_REGISTERS, &image.code)?;
    self.memory.copy_from(MAX_REGISTERS + image.code.len(), &image.static_data)?;

    self.instruction_count = image.instruction_count();
    self.static_base = (MAX_REGISTERS + image.instruction_count()) as Value;

    info!(
      "loaded {} instructions and {} static words",
      image.instruction_count(),
      image.static_data.len()
    );
    if self.trace {
      writeln!(self.output, "{}", trace::loaded_line(image.instruction_count()))?;
    }
    Ok(())
  }

  // endregion

  // region Accessors

  pub fn memory(&self) -> &Memory {
    &self.memory
  }

  pub fn functions(&self) -> &FunctionTable {
    &self.functions
  }

  pub fn in_function_body(&self) -> bool {
    self.in_function_body
  }

  pub fn static_base(&self) -> Value {
    self.static_base
  }

  pub fn ip(&self) -> Result<Value, RuntimeError> {
    self.memory.read(IP_INDEX as Value)
  }

  pub fn sp(&self) -> Result<Value, RuntimeError> {
    self.memory.read(SP_INDEX as Value)
  }

  pub fn output(&self) -> &W {
    &self.output
  }

  pub fn into_output(self) -> W {
    self.output
  }

  // endregion

  // region Dispatch loop

  /// Runs until `TERM` or the first fatal error.
  pub fn run(&mut self) -> Result<(), RuntimeError> {
    let mut steps: u64 = 0;
    while self.step()? == Step::Continue {
      steps += 1;
    }
    debug!("halted after {} instructions", steps + 1);

    if self.trace {
      let state = self.to_string();
      writeln!(self.output, "{}", state)?;
    }
    self.output.flush()?;
    Ok(())
  }

  /**
    Fetches, decodes and dispatches one instruction.

    Function bodies sit inline in the instruction stream and are passed over until their
    `FEND`. Only an `FBEGIN` is still dispatched inside a body, which makes nesting an error.
  */
  pub fn step(&mut self) -> Result<Step, RuntimeError> {
    let ip = self.ip()?;
    let word = self.memory.resolve(ip, 1)? as Word;
    let instruction = decode_instruction(word)?;
    let opcode = instruction.opcode();

    if self.trace {
      writeln!(self.output, "{}", trace::instruction_line(ip, opcode, word))?;
    }

    if self.in_function_body && opcode != Opcode::FEnd && opcode != Opcode::FBegin {
      self.advance()?;
      return Ok(Step::Continue);
    }

    self.dispatch(instruction)
  }

  fn dispatch(&mut self, instruction: Instruction) -> Result<Step, RuntimeError> {
    let operands = instruction.operands();
    let (first, second, immediate) = (operands.first, operands.second, operands.immediate);

    match instruction.opcode() {
      Opcode::Mov       => self.mov(first, second),
      Opcode::Add       => self.add(first, second),
      Opcode::Sub       => self.sub(first, second),
      Opcode::Pop       => self.pop(),
      Opcode::Push      => self.push(first, true),
      Opcode::Call      => self.call(immediate as FunctionNumber),
      Opcode::FBegin    => self.fbegin(immediate),
      Opcode::FEnd      => self.fend(),
      Opcode::Term      => Ok(Step::Halt),
      Opcode::Jump      => self.jump(first),
      Opcode::JumpIfGz  => self.jump_if_gz(first, immediate),
      Opcode::Print     => self.print(first),
      Opcode::Read      => self.read(first),
      Opcode::PrintStr  => self.print_str(immediate),
      Opcode::LoadL     => self.load_half(Opcode::LoadL, first, immediate),
      Opcode::LoadH     => self.load_half(Opcode::LoadH, first, immediate),
      Opcode::AddI      => self.addi(first, immediate, true),
      Opcode::SubI      => self.subi(first, immediate, true),
      Opcode::IndirCall => self.indir_call(first),
    }
  }

  // endregion

  // region Low-level utility methods

  /// The final value (or address) a register reference denotes.
  pub fn resolve(&self, register: Register) -> Result<Value, RuntimeError> {
    self.memory.resolve(register.index as Value, register.access_level)
  }

  /// The word stored in the register's own cell, without indirection.
  fn raw(&self, register: Register) -> Result<Value, RuntimeError> {
    self.memory.read(register.index as Value)
  }

  fn advance(&mut self) -> Result<Step, RuntimeError> {
    let ip = self.ip()?;
    self.memory.write(IP_INDEX as Value, ip.wrapping_add(1))?;
    Ok(Step::Continue)
  }

  fn finish(&mut self, advance: bool) -> Result<Step, RuntimeError> {
    match advance {
      true  => self.advance(),
      false => Ok(Step::Continue)
    }
  }

  fn trace_effect(&mut self, name: &str, fields: &[(&str, i64)]) -> Result<(), RuntimeError> {
    if self.trace {
      writeln!(self.output, "{}", trace::effect_line(name, fields))?;
    }
    Ok(())
  }

  /// Moves `sp` down one word and returns the new top of stack.
  fn grow_stack(&mut self) -> Result<Value, RuntimeError> {
    let sp = self.sp()?.wrapping_sub(1);
    self.memory.write(SP_INDEX as Value, sp)?;
    Ok(sp)
  }

  // endregion

  // region Instruction handlers

  fn mov(&mut self, destination: Register, source: Register) -> Result<Step, RuntimeError> {
    let address = self.resolve(destination)?;
    let value = self.resolve(source)?;
    self.trace_effect("MOV", &[("res_addr", address as i64), ("value", value as i64)])?;
    self.memory.write(address, value)?;
    self.advance()
  }

  /*
    `ADD` and `SUB` take the left operand from the destination register's own cell, not from
    the end of its indirection chain, while the result is written to the end of the chain.
    With `ADD *r1 r2` the sum is `r1 + r2`, stored at the address in `r1`.
  */

  fn add(&mut self, destination: Register, term: Register) -> Result<Step, RuntimeError> {
    let address = self.resolve(destination)?;
    let term = self.resolve(term)?;
    let result = self.raw(destination)?.wrapping_add(term);
    self.trace_effect("ADD", &[("res_addr", address as i64), ("value", result as i64)])?;
    self.memory.write(address, result)?;
    self.advance()
  }

  fn sub(&mut self, destination: Register, term: Register) -> Result<Step, RuntimeError> {
    let address = self.resolve(destination)?;
    let term = self.resolve(term)?;
    let result = self.raw(destination)?.wrapping_sub(term);
    self.memory.write(address, result)?;
    self.trace_effect("SUB", &[("res_addr", address as i64), ("value", result as i64)])?;
    self.advance()
  }

  fn addi(&mut self, destination: Register, immediate: Word, advance: bool)
    -> Result<Step, RuntimeError>
  {
    let address = self.resolve(destination)?;
    let result = self.raw(destination)?.wrapping_add(immediate as Value);
    self.trace_effect("ADDI", &[("res_addr", address as i64), ("value", result as i64)])?;
    self.memory.write(address, result)?;
    self.finish(advance)
  }

  fn subi(&mut self, destination: Register, immediate: Word, advance: bool)
    -> Result<Step, RuntimeError>
  {
    let address = self.resolve(destination)?;
    let result = self.raw(destination)?.wrapping_sub(immediate as Value);
    self.trace_effect("SUBI", &[("res_addr", address as i64), ("sub_result", result as i64)])?;
    self.memory.write(address, result)?;
    self.finish(advance)
  }

  /// `LOADL` replaces the low 16 bits of the destination word, `LOADH` the high 16 bits.
  fn load_half(&mut self, opcode: Opcode, destination: Register, immediate: Word)
    -> Result<Step, RuntimeError>
  {
    if immediate > LOW_HALF {
      return Err(RuntimeError::ImmediateOutOfRange(immediate));
    }

    let address = self.resolve(destination)?;
    let previous = self.memory.read(address)? as Word;
    let result =
      match opcode {
        Opcode::LoadH => (previous & LOW_HALF) | (immediate << HALF_WORD_BITS),
        _             => (previous & HIGH_HALF) | immediate,
      };
    self.memory.write(address, result as Value)?;

    self.trace_effect(
      opcode.name(),
      &[("res_addr", address as i64), ("value", immediate as i64), ("result", result as i64)]
    )?;
    self.advance()
  }

  fn push(&mut self, source: Register, advance: bool) -> Result<Step, RuntimeError> {
    let sp = self.grow_stack()?;
    // Resolved after `sp` moves, so `PUSH *sp` pushes the new stack pointer.
    let value = self.resolve(source)?;
    self.memory.write(sp, value)?;
    self.trace_effect("PUSH", &[("res_addr", sp as i64), ("value", value as i64)])?;
    self.finish(advance)
  }

  fn pop(&mut self) -> Result<Step, RuntimeError> {
    self.addi(Register::direct(SP_INDEX), 1, false)?;
    self.advance()
  }

  fn jump(&mut self, destination: Register) -> Result<Step, RuntimeError> {
    let target = self.resolve(destination)?;
    self.trace_effect("JUMP", &[("value", target as i64)])?;
    self.memory.write(IP_INDEX as Value, target)?;
    Ok(Step::Continue)
  }

  /// The offset is relative to the `JUMP_IF_GZ` itself.
  fn jump_if_gz(&mut self, condition: Register, offset: Word) -> Result<Step, RuntimeError> {
    let value = self.resolve(condition)?;
    self.trace_effect("JUMP_IF_GZ", &[("offset", offset as i64), ("value", value as i64)])?;
    match value > 0 {
      true  => self.addi(Register::direct(IP_INDEX), offset, false),
      false => self.advance()
    }
  }

  /// Pushes the return address and transfers control to the function's entry.
  fn enter_function(&mut self, function: FunctionNumber) -> Result<Step, RuntimeError> {
    let entry =
      self.functions
          .entry(function)
          .ok_or(RuntimeError::UnknownFunction(function))?;

    let return_address = self.ip()?.wrapping_add(1);
    let sp = self.grow_stack()?;
    self.memory.write(sp, return_address)?;

    self.trace_effect(
      "CALL",
      &[("function", function as i64), ("entry", entry as i64), ("return", return_address as i64)]
    )?;
    self.memory.write(IP_INDEX as Value, entry)?;
    Ok(Step::Continue)
  }

  fn call(&mut self, function: FunctionNumber) -> Result<Step, RuntimeError> {
    self.enter_function(function)
  }

  fn indir_call(&mut self, source: Register) -> Result<Step, RuntimeError> {
    let function = self.resolve(source)?;
    self.enter_function(function)
  }

  fn fbegin(&mut self, function: Word) -> Result<Step, RuntimeError> {
    let ip = self.ip()?;
    if self.in_function_body {
      return Err(RuntimeError::NestedFunction { function, address: ip });
    }

    let entry = ip.wrapping_add(1);
    self.functions.define(function as FunctionNumber, entry);
    self.in_function_body = true;
    debug!("function {} defined at {}", function, entry);
    self.advance()
  }

  fn fend(&mut self) -> Result<Step, RuntimeError> {
    self.in_function_body = false;
    self.advance()
  }

  fn print(&mut self, source: Register) -> Result<Step, RuntimeError> {
    let value = self.resolve(source)?;
    self.trace_effect(
      "PRINT",
      &[
        ("value", value as i64),
        ("address", source.index as i64),
        ("val_access", source.access_level as i64)
      ]
    )?;
    writeln!(self.output, "{}", value)?;
    self.advance()
  }

  fn read(&mut self, destination: Register) -> Result<Step, RuntimeError> {
    let address = self.resolve(destination)?;

    // Anything written so far must be visible before blocking on input.
    self.output.flush()?;
    let mut line = String::new();
    if self.input.read_line(&mut line)? == 0 {
      return Err(RuntimeError::UnexpectedEndOfInput);
    }
    let text = line.trim();
    let value: Value = text.parse().map_err(|_| RuntimeError::InvalidInput(text.to_string()))?;

    self.memory.write(address, value)?;
    self.trace_effect("READ", &[("res_addr", address as i64), ("value", value as i64)])?;
    self.advance()
  }

  /// Prints string `index` of the pool: the offset table entry gives the position of the
  /// length word, which is followed by the code points.
  fn print_str(&mut self, index: Word) -> Result<Step, RuntimeError> {
    let out_of_range = || DecodeError::StringIndexOutOfRange { index: index as usize };
    let base = self.static_base;

    // The first offset points just past the offset table, so it is also the literal count.
    let count = self.memory.read(base)?;
    if index as i64 >= count as i64 {
      return Err(out_of_range().into());
    }
    let offset = self.memory.read(base.wrapping_add(index as Value))?;
    if offset < count {
      return Err(out_of_range().into());
    }
    let start = base.wrapping_add(offset);
    let length = self.memory.read(start)?;

    let mut text = String::new();
    for i in 0..length {
      let code_point = self.memory.read(start.wrapping_add(1).wrapping_add(i))?;
      text.push(code_point_to_char(code_point)?);
    }

    writeln!(self.output, "{}", text)?;
    self.advance()
  }

  // endregion

}

impl<R: BufRead, W: Write> Display for Machine<R, W> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let table = trace::register_table(self.memory.registers());
    write!(
      f,
      "Instructions: {}\tFunctions: {}\tStatic base: {}\n{}",
      self.instruction_count,
      self.functions.len(),
      self.static_base,
      table
    )
  }
}
