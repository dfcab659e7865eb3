// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Numbered GPIOs (`GPIOn`) in a single table, plus optional pins on an
//! external expander (`EXT_GPIOn`), which are not in the table and are
//! mutable so the driver can track their state.
//!
//! Alternate functions come from `af.csv`; each cell is
//! `FUNCTION[UNIT][_SIGNAL]`, e.g. `UART0_TX`, `PIO1` or `USB_OVCUR_DET`.

use anyhow::{Context, Result};
use build_boardgen::{
    numeric, pin_bail, pin_error, AlternateFunction, NumericPort, Pin, PinGenerator,
    Port, PortPin,
};
use clap::{value_parser, Arg, ArgMatches, Command};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Kind {
    Bank(usize),
    Ext(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Af {
    // 1-based AF selector, as programmed into the function select register.
    select: usize,
    function: String,
    unit: Option<u32>,
    value: String,
}

impl Af {
    fn parse(af: &AlternateFunction) -> Result<Self> {
        let head = af.value.split('_').next().unwrap_or_default();
        let function = head.trim_end_matches(|c: char| c.is_ascii_digit());
        if !function.starts_with(|c: char| c.is_ascii_uppercase())
            || !function.chars().all(|c| c.is_ascii_alphanumeric())
        {
            pin_bail!("Invalid alternate function '{}'", af.value);
        }
        let unit = match &head[function.len()..] {
            "" => None,
            unit => Some(unit.parse().map_err(|_| {
                pin_error!("Invalid alternate function '{}'", af.value)
            })?),
        };
        Ok(Self {
            select: af.index + 1,
            function: function.to_string(),
            unit,
            value: af.value.clone(),
        })
    }
}

#[derive(Debug)]
pub struct GpioPin {
    kind: Kind,
    afs: Vec<Af>,
}

fn parse_cpu_pin_name(cpu_pin_name: &str) -> Option<Kind> {
    let number = |n: &str| {
        if !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) {
            n.parse().ok()
        } else {
            None
        }
    };
    if let Some(n) = cpu_pin_name.strip_prefix("EXT_GPIO") {
        number(n).map(Kind::Ext)
    } else {
        number(cpu_pin_name.strip_prefix("GPIO")?).map(Kind::Bank)
    }
}

impl PortPin for GpioPin {
    fn new(cpu_pin_name: &str) -> Result<Self> {
        let Some(kind) = parse_cpu_pin_name(cpu_pin_name) else {
            pin_bail!("Invalid cpu pin name '{cpu_pin_name}'");
        };
        Ok(Self {
            kind,
            afs: Vec::new(),
        })
    }

    fn validate_cpu_pin_name(cpu_pin_name: &str) -> Result<()> {
        if cpu_pin_name.trim().is_empty() {
            pin_bail!("Missing cpu pin name");
        }
        if parse_cpu_pin_name(cpu_pin_name).is_none() {
            pin_bail!("Invalid cpu pin name '{cpu_pin_name}'");
        }
        Ok(())
    }

    fn add_af(&mut self, af: AlternateFunction) -> Result<()> {
        if let Kind::Ext(n) = self.kind {
            pin_bail!("Cannot add AF {} to EXT_GPIO{n}", af.value);
        }
        self.afs.push(Af::parse(&af)?);
        Ok(())
    }

    fn index(&self) -> Result<Option<usize>> {
        Ok(match self.kind {
            Kind::Bank(n) => Some(n),
            Kind::Ext(_) => None,
        })
    }

    fn definition(&self) -> Result<String> {
        Ok(match self.kind {
            Kind::Bank(n) if self.afs.is_empty() => {
                format!("PIN({n}, GPIO{n}, 0, 0, NULL)")
            }
            Kind::Bank(n) => format!(
                "PIN({n}, GPIO{n}, 0, {}, pin_GPIO{n}_af)",
                self.afs.len()
            ),
            Kind::Ext(n) => format!("PIN({n}, EXT_GPIO{n}, 1, 0, NULL)"),
        })
    }

    fn is_const(&self) -> bool {
        matches!(self.kind, Kind::Bank(_))
    }

    fn enable_macro(&self) -> Option<String> {
        match self.kind {
            Kind::Bank(_) => None,
            Kind::Ext(n) => Some(format!("(MICROPY_HW_PIN_EXT_COUNT > {n})")),
        }
    }

    fn print_source(&self, out: &mut dyn Write) -> Result<()> {
        // Empty initializers aren't valid C; such pins point at NULL.
        let Kind::Bank(n) = self.kind else {
            return Ok(());
        };
        if self.afs.is_empty() {
            return Ok(());
        }
        writeln!(out, "const machine_pin_af_obj_t pin_GPIO{n}_af[] = {{")?;
        for af in &self.afs {
            writeln!(
                out,
                "    AF({}, {}, {}), // {}",
                af.select,
                af.function,
                af.unit.unwrap_or(0),
                af.value
            )?;
        }
        writeln!(out, "}};")?;
        writeln!(out)?;
        Ok(())
    }
}

pub struct GpioPort {
    gen: PinGenerator<GpioPin>,
    af_defs: Option<PathBuf>,
}

impl Default for GpioPort {
    fn default() -> Self {
        Self {
            gen: PinGenerator::new(true),
            af_defs: None,
        }
    }
}

impl GpioPort {
    /// Every distinct AF function, in a stable order.
    fn functions(&self) -> BTreeSet<&str> {
        self.gen
            .pins()
            .flat_map(|pin| pin.port().afs.iter())
            .map(|af| af.function.as_str())
            .collect()
    }

    fn write_af_defs(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "// This file was automatically generated by make-pins")?;
        writeln!(out)?;
        for (i, function) in self.functions().into_iter().enumerate() {
            writeln!(out, "#define MICROPY_HW_AF_FN_{function} ({i})")?;
        }
        Ok(())
    }
}

impl Port for GpioPort {
    type Pin = GpioPin;

    fn generator(&self) -> &PinGenerator<GpioPin> {
        &self.gen
    }

    fn generator_mut(&mut self) -> &mut PinGenerator<GpioPin> {
        &mut self.gen
    }

    fn extra_args(&self, cmd: Command) -> Command {
        cmd.arg(
            Arg::new("num-gpios")
                .long("num-gpios")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .default_value("30")
                .help("Number of GPIOn pins on the MCU"),
        )
        .arg(
            Arg::new("num-ext-gpios")
                .long("num-ext-gpios")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .default_value("0")
                .help("Number of EXT_GPIOn pins on the expander"),
        )
        .arg(
            Arg::new("af-defs")
                .long("af-defs")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help("Header of alternate function identifiers to generate"),
        )
    }

    fn configure(&mut self, matches: &ArgMatches) -> Result<()> {
        let num_gpios = matches.get_one::<usize>("num-gpios").copied();
        let num_ext = matches.get_one::<usize>("num-ext-gpios").copied();
        self.af_defs = matches.get_one::<PathBuf>("af-defs").cloned();

        // Known up front so the table follows GPIO order, but only the pins
        // in pins.csv are made available.
        for i in 0..num_gpios.unwrap_or(0) {
            self.gen.add_cpu_pin(&format!("GPIO{i}"), false)?;
        }
        for i in 0..num_ext.unwrap_or(0) {
            self.gen.add_cpu_pin(&format!("EXT_GPIO{i}"), true)?;
        }
        Ok(())
    }

    fn cpu_pin_pointer(&self, pin: &Pin<GpioPin>) -> Result<String> {
        numeric::cpu_pin_pointer(pin)
    }

    fn print_source(&self, out: &mut dyn Write) -> Result<()> {
        numeric::print_source(self, out)?;
        self.gen.print_cpu_locals_dict(out)
    }

    fn generate_extra_files(&self) -> Result<()> {
        let Some(path) = &self.af_defs else {
            return Ok(());
        };
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut out = BufWriter::new(file);
        self.write_af_defs(&mut out)?;
        out.flush()?;
        log::info!("wrote {}", path.display());
        Ok(())
    }
}

impl NumericPort for GpioPort {
    fn cpu_table_size(&self) -> Result<String> {
        Ok("NUM_BANK0_GPIOS".to_string())
    }
}
