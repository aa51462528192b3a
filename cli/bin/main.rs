use std::{path::PathBuf, process::ExitCode};

use clap::{error::ErrorKind, Parser};

use tcexport::cli;
use tcexport::config::RunConfig;
use tcexport::logger;
use tcexport_automation::UnavailableHost;
use tcexport_problems::Outcome;

/// Builds a TwinCAT PLC project, checks all of its objects and saves it as a
/// library.
#[derive(Parser, Debug)]
#[command(name = "tcexport", version, about)]
struct Args {
    /// The Visual Studio solution that contains the TwinCAT project.
    #[arg(short, long, value_name = "PATH")]
    solution: Option<PathBuf>,

    /// Use this TwinCAT version instead of the version of the project.
    #[arg(short = 'w', long, value_name = "VERSION")]
    tc_version: Option<String>,

    /// The PLC project below the PLC configuration, for example
    /// "Library^Library Project".
    #[arg(short = 'n', long, value_name = "NAME")]
    plc_project: String,

    /// Where to save the library (.library or .compiled-library).
    #[arg(short, long, value_name = "PATH")]
    library: PathBuf,

    /// Give up after this many minutes.
    #[arg(
        short = 'u',
        long,
        value_name = "MINUTES",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: Option<u64>,

    /// Enable this real-time task and disable all others before the build.
    #[arg(short, long, value_name = "NAME")]
    task: Option<String>,

    /// Add a compiler define to the PLC project. May be repeated.
    #[arg(short = 'D', long = "define", value_name = "DEFINE")]
    defines: Vec<String>,

    /// Turn on debug logging.
    #[arg(short, long)]
    debug: bool,

    /// Write the log to this file instead of the terminal.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

impl From<Args> for RunConfig {
    fn from(args: Args) -> Self {
        RunConfig {
            solution: args.solution,
            tc_version: args.tc_version,
            plc_project: args.plc_project,
            library: args.library,
            timeout: args.timeout.map(RunConfig::timeout_from_minutes),
            task: args.task,
            defines: args.defines,
        }
    }
}

pub fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            if let Err(io_err) = err.print() {
                // Help and version go to stdout, which may be closed.
                eprintln!("Unable to write the usage message. {io_err}");
            }
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => {
                    eprintln!("Run 'tcexport --help' for the list of arguments.");
                    Outcome::ArgumentError.into()
                }
            };
        }
    };

    if let Err(err) = logger::configure(args.debug, args.log_file.clone()) {
        eprintln!("{err}");
        return Outcome::ArgumentError.into();
    }

    let host = UnavailableHost::new("this build of tcexport has no COM automation backend");
    cli::export(&RunConfig::from(args), &host).into()
}
