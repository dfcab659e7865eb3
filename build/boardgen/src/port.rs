// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::Result;
use std::io::Write;

use crate::driver::{self, GeneratorArgs};
use crate::emit::named_pin_pointer;
use crate::pin::{Pin, PortPin};
use crate::{PinGenerator, PinGeneratorError};

/// The generator-level half of a port.
///
/// A port owns a [`PinGenerator`] for its [`PortPin`] type and decides what
/// the generated source looks like. Everything except `print_source` has a
/// reasonable default; ports addressing pins by number should implement
/// [`crate::NumericPort`] and delegate to the helpers in [`crate::numeric`].
pub trait Port {
    type Pin: PortPin;

    fn generator(&self) -> &PinGenerator<Self::Pin>;
    fn generator_mut(&mut self) -> &mut PinGenerator<Self::Pin>;

    /// Adds port-specific arguments to the command line.
    fn extra_args(&self, cmd: clap::Command) -> clap::Command {
        cmd
    }

    /// Picks up the values of the arguments added by `extra_args`. Called
    /// once, before any input is read.
    fn configure(&mut self, _matches: &clap::ArgMatches) -> Result<()> {
        Ok(())
    }

    /// C expression for `pin_CPUNAME`.
    fn cpu_pin_pointer(&self, pin: &Pin<Self::Pin>) -> Result<String> {
        Ok(named_pin_pointer(pin))
    }

    /// Prints the pin objects and the `Pin.cpu`/`Pin.board` dicts.
    fn print_source(&self, _out: &mut dyn Write) -> Result<()> {
        Err(PinGeneratorError::unimplemented("print_source").into())
    }

    fn print_header(&self, out: &mut dyn Write) -> Result<()> {
        self.generator()
            .print_defines(out, |pin| self.cpu_pin_pointer(pin))
    }

    /// Reads the input files. Override to load extra inputs; the default
    /// handles `--af-csv`, `--board-csv` and `--prefix`.
    fn load_inputs(
        &mut self,
        args: &GeneratorArgs,
        out: &mut dyn Write,
    ) -> Result<()> {
        driver::load_inputs(self.generator_mut(), args, out)
    }

    /// Runs after the source and header are written, e.g. to produce
    /// additional headers.
    fn generate_extra_files(&self) -> Result<()> {
        Ok(())
    }
}
