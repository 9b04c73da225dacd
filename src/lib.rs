/*!
  A minimal von Neumann machine: a fixed width 32 bit instruction set, an assembler that
  turns mnemonics into a program image, a disassembler that turns the image back into text,
  and an interpreter that runs the image in a flat, word addressed memory whose lowest words
  are the registers.

  The pipeline is this:
  ```text
  text -> [`bytecode::assemble`] -> `Image` -> [`machine::Machine::load`] -> execution
                                       └-> [`bytecode::disassemble`] -> text
  ```
*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod address;
pub mod bytecode;
pub mod config;
pub mod error;
pub mod function_table;
pub mod logging;
pub mod machine;
pub mod memory;
pub mod trace;

pub use bytecode::{assemble, disassemble, Image};
pub use config::MachineConfig;
pub use machine::{Machine, Step};
