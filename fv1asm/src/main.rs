#[macro_use]
extern crate clap;

use clap::Arg;
use std::path::{Path, PathBuf};

use fv1asm::{assemble, image_io, listing, AssemblerOptions};

#[derive(Debug)]
enum IOErrorContext {
    ReadInput,
    WriteOutput,
}

#[derive(Debug)]
enum Error {
    AssemblyFailed,
    Io(std::io::Error, IOErrorContext, PathBuf),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err, context, path) => writeln!(
                f,
                "{} file \"{}\" failed: {}",
                match context {
                    IOErrorContext::ReadInput => "Reading input",
                    IOErrorContext::WriteOutput => "Writing output",
                },
                path.display(),
                err
            ),
            Error::AssemblyFailed => writeln!(f, "assembly failed, see diagnostics above"),
        }
    }
}

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("INPUT")
                .help("Sets the SpinASM input file to assemble")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .value_name("OUTPUT")
                .help("Sets the program-image output file to write to"),
        )
        .arg(
            Arg::with_name("listing")
                .short("l")
                .long("listing")
                .takes_value(true)
                .value_name("LISTING")
                .help("Sets the file to write a human-readable listing to"),
        )
        .arg(
            Arg::with_name("no_mem_bug")
                .long("no-mem-bug")
                .help("Disables the SpinASM-compatible MEM allocator bug"),
        )
        .arg(
            Arg::with_name("clamp")
                .long("clamp")
                .help("Clamps out-of-range fixed-point literals instead of rejecting them"),
        )
        .get_matches();

    let input = matches.value_of("INPUT").unwrap();
    let output = matches.value_of("output");
    let listing_path = matches.value_of("listing");
    let options = AssemblerOptions {
        fv1_asm_mem_bug: !matches.is_present("no_mem_bug"),
        clamp_reals: matches.is_present("clamp"),
        ..AssemblerOptions::default()
    };

    if let Err(err) = run(input, output, listing_path, &options) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn run(
    input: &str,
    output: Option<&str>,
    listing_path: Option<&str>,
    options: &AssemblerOptions,
) -> Result<(), Error> {
    let input_path = Path::new(input);
    let source = std::fs::read_to_string(input_path)
        .map_err(|err| Error::Io(err, IOErrorContext::ReadInput, input_path.to_owned()))?;

    let result = assemble(&source, options);
    for diagnostic in &result.problems {
        eprintln!("{}", diagnostic);
    }
    if result.program.is_empty() {
        return Err(Error::AssemblyFailed);
    }

    let program = fv1::ProgramImage::from_words(&result.program);

    let output_path: PathBuf = output.map(PathBuf::from).unwrap_or_else(|| input_path.with_extension("bin"));
    image_io::write_file(&output_path, &program)
        .map_err(|err| Error::Io(err, IOErrorContext::WriteOutput, output_path))?;

    if let Some(listing_path) = listing_path {
        let listing_path = PathBuf::from(listing_path);
        std::fs::write(&listing_path, listing::format_listing(&program))
            .map_err(|err| Error::Io(err, IOErrorContext::WriteOutput, listing_path))?;
    }

    Ok(())
}
