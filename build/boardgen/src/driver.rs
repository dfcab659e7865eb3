// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Args, Command, FromArgMatches};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::csv_input::AfLayout;
use crate::pin::PortPin;
use crate::{PinGenerator, PinGeneratorError, Port};

const AF_CSV: &str = "af_csv";

/// Arguments shared by every port.
#[derive(Clone, Debug, Default, Args)]
pub struct GeneratorArgs {
    /// Board pin names (`board,cpu` rows)
    #[arg(long, value_name = "PATH")]
    pub board_csv: Option<PathBuf>,

    /// Alternate function table; only for ports that enable AF
    #[arg(skip)]
    pub af_csv: Option<PathBuf>,

    /// Text copied verbatim into the generated source
    #[arg(long, value_name = "PATH")]
    pub prefix: Option<PathBuf>,

    /// Generated C source
    #[arg(long, value_name = "PATH")]
    pub output_source: PathBuf,

    /// Generated C header
    #[arg(long, value_name = "PATH")]
    pub output_header: PathBuf,
}

/// Builds the command line for `port`.
pub fn command<T: Port + ?Sized>(port: &T, name: &'static str) -> Command {
    let mut cmd = GeneratorArgs::augment_args(
        Command::new(name).about("Generate board specific pin file"),
    );
    if port.generator().enable_af() {
        cmd = cmd.arg(
            Arg::new(AF_CSV)
                .long("af-csv")
                .value_name("PATH")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Alternate function table"),
        );
    }
    port.extra_args(cmd)
}

/// Extracts the common arguments from `matches` and lets the port pick up
/// its own.
pub fn configure<T: Port + ?Sized>(
    port: &mut T,
    matches: &ArgMatches,
) -> Result<GeneratorArgs> {
    let mut args = GeneratorArgs::from_arg_matches(matches)?;
    if port.generator().enable_af() {
        args.af_csv = matches.get_one::<PathBuf>(AF_CSV).cloned();
    }
    port.configure(matches)?;
    Ok(args)
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// The default input handling: the AF table (if enabled and given), the
/// board table (if given), and finally the prefix file, which is copied into
/// `out` as-is.
pub fn load_inputs<P: PortPin>(
    gen: &mut PinGenerator<P>,
    args: &GeneratorArgs,
    out: &mut dyn Write,
) -> Result<()> {
    if gen.enable_af() {
        if let Some(af_csv) = &args.af_csv {
            log::info!("loading alternate functions from {}", af_csv.display());
            writeln!(out, "// --af-csv {}", af_csv.display())?;
            gen.parse_af_csv(af_csv, AfLayout::default())?;
        }
    }

    if let Some(board_csv) = &args.board_csv {
        log::info!("loading board pins from {}", board_csv.display());
        writeln!(out, "// --board-csv {}", board_csv.display())?;
        gen.parse_board_csv(board_csv)?;
    }

    if let Some(prefix) = &args.prefix {
        writeln!(out, "// --prefix {}", prefix.display())?;
        writeln!(out)?;
        let text = std::fs::read_to_string(prefix)
            .with_context(|| format!("failed to read {}", prefix.display()))?;
        write!(out, "{text}")?;
    }
    Ok(())
}

/// Reads the inputs and writes the generated source and header.
///
/// Output written before a failure is left in place; a caller seeing `Err`
/// must treat both files as unusable.
pub fn run<T: Port + ?Sized>(port: &mut T, args: &GeneratorArgs) -> Result<()> {
    {
        let mut out = create(&args.output_source)?;
        writeln!(out, "// This file was automatically generated by make-pins")?;
        writeln!(out, "//")?;

        port.load_inputs(args, &mut out)?;

        // Arbitrary per-pin content comes first.
        for pin in port.generator().available_pins(false) {
            pin.port().print_source(&mut out)?;
        }

        port.print_source(&mut out)?;
        out.flush()?;
    }
    log::info!("wrote {}", args.output_source.display());

    {
        let mut out = create(&args.output_header)?;
        port.print_header(&mut out)?;
        out.flush()?;
    }
    log::info!("wrote {}", args.output_header.display());

    port.generate_extra_files()
}

/// Maps the outcome of [`run`] to a process exit status.
///
/// A [`PinGeneratorError`] is reported on stdout and becomes exit status 1;
/// any other error is handed back to the caller.
pub fn exit_status(result: Result<()>) -> Result<u8> {
    match result {
        Ok(()) => Ok(0),
        Err(e) => match e.downcast_ref::<PinGeneratorError>() {
            Some(err) => {
                println!("{err}");
                Ok(1)
            }
            None => Err(e),
        },
    }
}
