use std::io;
use std::path::PathBuf;
use std::process;

use structopt::StructOpt;
use tracing::info;

use vonneumann::config::DEFAULT_MEMORY_SIZE;
use vonneumann::{logging, Image, Machine, MachineConfig};

#[derive(StructOpt)]
#[structopt(name = "vn-run", about = "Runs a program image")]
struct Options {
  /// The program image to run.
  input: PathBuf,
  /// Pass `DEBUG` to trace every instruction.
  #[structopt(possible_values = &["DEBUG"])]
  mode: Option<String>,
  /// Words of memory, register file included.
  #[structopt(long, default_value = "10000000")]
  memory_size: usize,
}

impl Options {
  fn config(&self) -> MachineConfig {
    MachineConfig {
      memory_size: self.memory_size,
      trace: self.mode.is_some() || MachineConfig::default().trace,
    }
  }
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
  let config = options.config();
  if config.memory_size != DEFAULT_MEMORY_SIZE {
    info!("using {} words of memory", config.memory_size);
  }

  let image = Image::load(&options.input)?;

  let stdin = io::stdin();
  let stdout = io::stdout();
  let mut machine = Machine::with_image(&image, &config, stdin.lock(), stdout.lock())?;
  machine.run()?;
  Ok(())
}
