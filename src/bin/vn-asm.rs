use std::fs;
use std::path::PathBuf;
use std::process;

use structopt::StructOpt;
use tracing::info;

use vonneumann::{assemble, logging};

#[derive(StructOpt)]
#[structopt(name = "vn-asm", about = "Assembles a source file into a program image")]
struct Options {
  /// The assembly source to read.
  source: PathBuf,
  /// Where to write the program image.
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

  let source = fs::read_to_string(&options.source)?;
  // Nothing is written unless the whole source assembles.
  let image = assemble(&source)?;
  image.save(&options.output)?;

  info!(
    "wrote {} instructions and {} static words to {}",
    image.instruction_count(),
    image.static_data.len(),
    options.output.display()
  );
  Ok(())
}
