use std::path::{Path, PathBuf};
use std::process;

use clap::{App, Arg, ArgMatches};
use slog::{o, Discard, Drain, Logger};
use slog_term::{FullFormat, TermDecorator};

use hvm::compiler::assemble_file;

fn parse_args() -> ArgMatches<'static> {
    App::new("hvmasm")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Assembles a source file into an object file")
        .arg(Arg::with_name("source")
             .help("File containing assembly source")
             .value_name("SOURCE")
             .required(true)
             .index(1))
        .arg(Arg::with_name("output")
             .help("Object file to write, defaults to SOURCE with the extension .obj")
             .value_name("OUTPUT")
             .long("output")
             .short("o")
             .takes_value(true))
        .arg(Arg::with_name("verbose")
             .help("Enables verbose logging")
             .long("verbose")
             .short("v"))
        .get_matches()
}

fn build_logger(verbose: bool) -> Logger {
    if !verbose {
        return Logger::root(Discard, o!());
    }

    let decorator = TermDecorator::new().build();
    let drain = FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    Logger::root(drain, o!())
}

fn main() {
    let args = parse_args();

    let source = Path::new(args.value_of("source").unwrap_or_default());

    let destination = match args.value_of("output") {
        Some(path) => PathBuf::from(path),
        None => source.with_extension("obj"),
    };

    let logger = build_logger(args.is_present("verbose"));

    match assemble_file(source, &destination, logger) {
        Ok(program) => {
            println!(
                "Assembled {} bytes at {:03X} into {}",
                program.payload.len(),
                program.start,
                destination.display(),
            );
        },
        Err(err) => {
            eprintln!("{}: {}", source.display(), err);
            process::exit(1);
        },
    }
}
