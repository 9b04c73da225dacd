use std::fs;
use std::path::PathBuf;
use std::process;

use structopt::StructOpt;
use tracing::info;

use vonneumann::{disassemble, logging, Image};

#[derive(StructOpt)]
#[structopt(name = "vn-disasm", about = "Turns a program image back into assembly")]
struct Options {
  /// The program image to read.
  input: PathBuf,
  /// Where to write the assembly.
  output: PathBuf,
}

fn main() {
  logging::init();

  match run() {
    Err(e) => {
      eprintln!("Error: {}", e);
      process::exit(1);
    }
    Ok(()) => (),
  }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
  let options = Options::from_args();

  let image = Image::load(&options.input)?;
  let text = disassemble(&image)?;
  fs::write(&options.output, text)?;

  info!("disassembled {} instructions to {}", image.instruction_count(), options.output.display());
  Ok(())
}
