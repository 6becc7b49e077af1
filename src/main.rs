//! CLI driver: compiles a single `.pas` source file to stack-machine
//! assembly.

use clap::Parser as ClapParser;
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(ClapParser)]
#[command(name = "pascalc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compiler from a Pascal dialect to stack-machine assembly", long_about = None)]
struct Cli {
    /// Input .pas source file
    input: PathBuf,

    /// Output path (defaults to the input path with its extension replaced by .vm)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let output = cli.output.unwrap_or_else(|| cli.input.with_extension("vm"));

    let source = match fs::read_to_string(&cli.input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}: {}", cli.input.display(), e);
            process::exit(1);
        }
    };

    match pascalc::compile(&source) {
        Ok(asm) => {
            if let Err(e) = fs::write(&output, asm) {
                eprintln!("Error writing {}: {}", output.display(), e);
                process::exit(1);
            }
            println!("Compiled {} -> {}", cli.input.display(), output.display());
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
