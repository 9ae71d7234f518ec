use glsl_blocks::logger;
use glsl_blocks::resource::{self, GlslSource, Load};
use glsl_blocks::shader::{Inspector, ProgramBlocks};
use log::{error, info};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::exit;
use structopt::StructOpt;

mod resources {
  include!(concat!(env!("OUT_DIR"), "/resources.rs"));
}

/// Compose and inspect GLSL shader blocks.
#[derive(StructOpt, Debug)]
#[structopt(name = "blocks")]
struct Opt {
  /// Verbosity; repeat for more (info, debug, trace).
  #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
  verbose: u64,

  #[structopt(subcommand)]
  command: Command
}

#[derive(StructOpt, Debug)]
enum Command {
  /// Compose a block description and print the GLSL source of a stage.
  #[structopt(name = "compose")]
  Compose {
    /// Block description (JSON).
    #[structopt(parse(from_os_str))]
    blocks: PathBuf,

    /// Stage to print.
    #[structopt(short = "s", long = "stage", default_value = "fragment", possible_values = &["vertex", "fragment"])]
    stage: String
  },

  /// Compose a block description and print its inspection as JSON.
  #[structopt(name = "inspect")]
  Inspect {
    /// Block description (JSON).
    #[structopt(parse(from_os_str))]
    blocks: PathBuf,

    /// Pretty-print the JSON output.
    #[structopt(short = "p", long = "pretty")]
    pretty: bool
  },

  /// Inspect a vertex and a fragment GLSL source and print the inspection as JSON.
  #[structopt(name = "inspect-glsl")]
  InspectGlsl {
    #[structopt(parse(from_os_str))]
    vertex: PathBuf,

    #[structopt(parse(from_os_str))]
    fragment: PathBuf,

    /// Pretty-print the JSON output.
    #[structopt(short = "p", long = "pretty")]
    pretty: bool
  },

  /// Write the sample block descriptions in a directory.
  #[structopt(name = "bootstrap")]
  Bootstrap {
    /// Directory to write to.
    #[structopt(short = "o", long = "out", default_value = ".", parse(from_os_str))]
    out: PathBuf
  }
}

fn main() {
  let opt = Opt::from_args();

  if let Err(e) = logger::init(logger::verbosity(opt.verbose)) {
    eprintln!("cannot initialize the logger: {}", e);
  }

  if let Err(e) = run(opt.command) {
    error!("{}", e);
    exit(1);
  }
}

fn run(command: Command) -> resource::Result<()> {
  match command {
    Command::Compose { blocks, stage } => {
      let program = ProgramBlocks::load(&blocks)?.compose();
      let source = if stage == "vertex" { program.vertex } else { program.fragment };

      print!("{}", source);
    }

    Command::Inspect { blocks, pretty } => {
      let inspection = ProgramBlocks::load(&blocks)?.inspect();
      print_json(&blocks, &inspection, pretty)?;
    }

    Command::InspectGlsl { vertex, fragment, pretty } => {
      let vs = GlslSource::load(&vertex)?;
      let fs = GlslSource::load(&fragment)?;
      let inspection = Inspector::shared().inspect_program(vs.as_ref(), fs.as_ref());

      print_json(&fragment, &inspection, pretty)?;
    }

    Command::Bootstrap { out } => {
      info!("bootstraping resources");

      for (path, bytes) in resources::get_resources() {
        let path = out.join(path);
        info!("--> {}", path.display());
        resource::write(&path, bytes)?;
      }
    }
  }

  Ok(())
}

fn print_json<T>(path: &Path, value: &T, pretty: bool) -> resource::Result<()> where T: Serialize {
  let json = if pretty {
    serde_json::to_string_pretty(value)
  } else {
    serde_json::to_string(value)
  };

  let json = json.map_err(|e| resource::Error::CannotWrite(path.to_owned(), e.to_string()))?;
  println!("{}", json);

  Ok(())
}
