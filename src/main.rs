use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser as ClapParser};

use wirestate::compile::{CompileOptions, compile};

const EXIT_COMPILE_ERROR: u8 = 10;
const EXIT_USAGE: u8 = 20;

#[derive(ClapParser)]
#[command(name = "wirestate", version, about = "Compiles WireState statechart files")]
struct Args {
    /// Root statechart file to compile
    input: Option<String>,

    /// Search directory for `@include` resolution
    #[arg(long = "srcDir", value_name = "dir", default_value = ".")]
    src_dir: PathBuf,

    /// Directory used by the on-disk cache
    #[arg(long = "cacheDir", value_name = "dir", default_value = ".wirestate")]
    cache_dir: PathBuf,

    /// Generator backend name
    #[arg(long, value_name = "name", default_value = "json")]
    generator: String,

    /// Omit action/guard callback references from generated code
    #[arg(long = "disableCallbacks")]
    disable_callbacks: bool,
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(error) if matches!(error.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{error}");
            return ExitCode::SUCCESS;
        }
        Err(error) => {
            eprint!("{error}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let Some(input) = args.input else {
        let usage = Args::command().render_usage();
        eprintln!("{usage}");
        return ExitCode::from(EXIT_USAGE);
    };

    let opts = CompileOptions {
        src_dirs: vec![args.src_dir],
        cache_dir: args.cache_dir,
        generator: args.generator,
        disable_callbacks: args.disable_callbacks,
    };

    match compile(&input, &opts) {
        Ok(artifact) => {
            println!("{artifact}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{error}");
            ExitCode::from(EXIT_COMPILE_ERROR)
        }
    }
}
