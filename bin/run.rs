use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::process;

use clap::{App, Arg, ArgMatches};
use slog::{o, Discard, Drain, Logger};
use slog_term::{FullFormat, TermDecorator};

use hvm::{
    bytecode::{ChecksumPolicy, ObjectFile},
    emulator::{Emulator, StreamIo},
    error::ArtifactError,
};

enum Error {
    Usage(String),
    Artifact(String, ArtifactError),
    Io(io::Error),
    Execution,
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::Io(e)
    }
}

fn parse_arguments() -> ArgMatches<'static> {
    App::new("hvmrun")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Loads object files into the machine and runs it")
        .arg(Arg::with_name("objects")
             .help("Object files to load, in order")
             .value_name("OBJECT")
             .required(true)
             .multiple(true)
             .index(1))
        .arg(Arg::with_name("start")
             .help("Hex address to start execution at, defaults to the start of the first object")
             .value_name("START")
             .long("start")
             .short("s")
             .takes_value(true))
        .arg(Arg::with_name("input")
             .help("Input device file, defaults to an empty device")
             .value_name("INPUT")
             .long("input")
             .short("i")
             .takes_value(true))
        .arg(Arg::with_name("output")
             .help("Output device file, defaults to the standard output")
             .value_name("OUTPUT")
             .long("output")
             .short("o")
             .takes_value(true))
        .arg(Arg::with_name("strict-checksum")
             .help("Refuses to load objects whose checksum does not match")
             .long("strict-checksum"))
        .arg(Arg::with_name("dump")
             .help("Prints the memory between two hex addresses after the run")
             .value_name("FIRST:LAST")
             .long("dump")
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

fn parse_address(text: &str) -> Result<u16, Error> {
    u16::from_str_radix(text, 16)
        .ok()
        .filter(|address| *address <= 0xFFF)
        .ok_or_else(|| Error::Usage(format!("invalid address '{}'", text)))
}

fn parse_range(text: &str) -> Result<(u16, u16), Error> {
    let mut parts = text.splitn(2, ':');

    match (parts.next(), parts.next()) {
        (Some(first), Some(last)) => Ok((parse_address(first)?, parse_address(last)?)),
        _ => Err(Error::Usage(format!("invalid range '{}', expected FIRST:LAST", text))),
    }
}

fn main() {
    let args = parse_arguments();

    match run(&args) {
        Ok(()) => (),
        Err(Error::Usage(message)) => {
            eprintln!("{}", message);
            process::exit(2);
        },
        Err(Error::Artifact(path, err)) => {
            eprintln!("{}: {}", path, err);
            process::exit(1);
        },
        Err(Error::Io(err)) => {
            eprintln!("IO error: {}", err);
            process::exit(1);
        },
        Err(Error::Execution) => process::exit(1),
    }
}

fn run(args: &ArgMatches) -> Result<(), Error> {
    let policy = if args.is_present("strict-checksum") {
        ChecksumPolicy::Strict
    } else {
        ChecksumPolicy::Advisory
    };

    let dump = args.value_of("dump").map(parse_range).transpose()?;

    let mut emulator = Emulator::with_logger(build_logger(args.is_present("verbose")));
    let mut first_start = None;

    for path in args.values_of("objects").into_iter().flatten() {
        let object = ObjectFile::read(path)
            .map_err(|err| Error::Artifact(path.to_string(), err))?;

        if !object.is_valid() && policy == ChecksumPolicy::Advisory {
            eprintln!("warning: {}: checksum mismatch, the program could be corrupt", path);
        }

        emulator.load(&object, policy)
            .map_err(|err| Error::Artifact(path.to_string(), err))?;

        first_start.get_or_insert(object.program.start);
    }

    let start = match args.value_of("start") {
        Some(text) => parse_address(text)?,
        None => first_start.unwrap_or(0),
    };

    let result = match (args.value_of("input"), args.value_of("output")) {
        (Some(input), Some(output)) => emulator.run(start, StreamIo::files(input, output)?),
        (input, output) => {
            let reader: Box<dyn BufRead> = match input {
                Some(path) => Box::new(BufReader::new(File::open(path)?)),
                None => Box::new(io::empty()),
            };

            let writer: Box<dyn Write> = match output {
                Some(path) => Box::new(BufWriter::new(File::create(path)?)),
                None => Box::new(io::stdout()),
            };

            emulator.run(start, StreamIo::new(reader, writer))
        },
    };

    if args.value_of("output").is_none() {
        println!();
    }

    if let Some((first, last)) = dump {
        print!("{}", emulator.memory.view(first, last));
    }

    match result {
        Ok(()) => Ok(()),
        Err(fault) => {
            eprintln!("error: {}", fault);
            Err(Error::Execution)
        },
    }
}
