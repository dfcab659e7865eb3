// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::Result;
use build_boardgen::{driver, Port};
use clap::{ArgMatches, Command};
use std::process::ExitCode;

mod gpio;
mod zephyr;

fn generate<T: Port>(mut port: T, matches: &ArgMatches) -> Result<u8> {
    let args = driver::configure(&mut port, matches)?;
    driver::exit_status(driver::run(&mut port, &args))
}

fn main() -> Result<ExitCode> {
    env_logger::init();

    let zephyr = zephyr::ZephyrPort::default();
    let gpio = gpio::GpioPort::default();

    let matches = Command::new("make-pins")
        .about("Generate board specific pin files")
        .max_term_width(80)
        .subcommand_required(true)
        .subcommand(
            driver::command(&zephyr, "zephyr")
                .about("Zephyr devicetree GPIO controllers"),
        )
        .subcommand(
            driver::command(&gpio, "gpio")
                .about("Numbered GPIOs with alternate functions"),
        )
        .get_matches();

    let status = match matches.subcommand() {
        Some(("zephyr", m)) => generate(zephyr, m)?,
        Some(("gpio", m)) => generate(gpio, m)?,
        _ => unreachable!("subcommand is required"),
    };
    Ok(ExitCode::from(status))
}
