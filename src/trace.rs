//! Formatting for the DEBUG trace. The trace is part of the program's output, so these
//! functions only build text and leave writing it to the machine.

use prettytable::{format as TableFormat, Table};

use crate::address::register_name;
use crate::bytecode::{Opcode, Word};
use crate::memory::Value;

pub const TRACE_PREFIX: &str = "[DEBUG]";

lazy_static! {
  static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

pub fn loaded_line(instruction_count: usize) -> String {
  format!("{} Loaded {} instructions", TRACE_PREFIX, instruction_count)
}

/// `[DEBUG] #<ip> <NAME>: <word in binary>`, emitted before every dispatch.
pub fn instruction_line(ip: Value, opcode: Opcode, word: Word) -> String {
  format!("{} #{} {}: {:032b}", TRACE_PREFIX, ip, opcode, word)
}

/// `[DEBUG] <NAME>: key=value, ...`, emitted by instructions with a visible effect.
pub fn effect_line(name: &str, fields: &[(&str, i64)]) -> String {
  let fields =
    fields
      .iter()
      .map(|(key, value)| format!("{}={}", key, value))
      .collect::<Vec<String>>()
      .join(", ");
  format!("{} {}: {}", TRACE_PREFIX, name, fields)
}

/// A table of the register file with the instruction pointer's row marked.
pub fn register_table(registers: &[Value]) -> Table {
  let mut table = Table::new();

  table.set_format(*TABLE_DISPLAY_FORMAT);
  table.set_titles(row![ubr->"Register", ubl->"Contents"]);

  for (i, value) in registers.iter().enumerate() {
    let name = register_name(i as u8);
    match i == 0 {

      true  => {
        table.add_row(row![r->format!("* --> {} =", name), value]);
      }

      false => {
        table.add_row(row![r->format!("{} =", name), value]);
      }

    }
  }
  table
}
