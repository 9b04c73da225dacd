/*!

  The VM uses a 32 bit word for both data and instructions. Every instruction is exactly one
  word. The top 5 bits hold the opcode, and the remaining 27 bits are laid out according to
  the opcode's category:

  ```text
  register-register   [OpCode:5][Access:3][Register:4][Access:3][Register:4][Reserved:13]
  register-immediate  [OpCode:5][Access:3][Register:4][Immediate:20]
  register            [OpCode:5][Access:3][Register:4][Reserved:20]
  immediate           [OpCode:5][Immediate:27]
  opcode only         [OpCode:5][Reserved:27]
  ```

  Reserved bits are always zero, and a word with a reserved bit set does not decode.

  An enum is only used for the opcode itself, not the entire instruction. Decoded
  instructions are `Instruction` values, one variant per category, which is what the
  interpreter dispatches on.

  String literals do not appear in the instruction stream. A `PRINTSTR` carries an index into
  the string pool, which is stored after the code in the program image.

*/

mod binary;
mod instruction;
mod image;
pub mod assembly;
pub mod disassembly;
pub mod string_pool;

pub use binary::{decode_instruction, decode_opcode, encode_instruction, Word};
pub use instruction::{Category, Instruction, Opcode, Operands};
pub use image::Image;
pub use assembly::assemble;
pub use disassembly::disassemble;
pub use string_pool::StringPool;
