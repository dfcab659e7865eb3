// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Generation of pin definitions from a board's `pins.csv` (and, for ports
//! that want it, an MCU `af.csv`).
//!
//! A port provides two things: a [`PortPin`] type that knows how a single pin
//! is named, validated and spelled in C, and a [`Port`] that owns the
//! [`PinGenerator`] and decides the layout of the generated source. Ports
//! that address pins by number additionally implement [`NumericPort`] and use
//! the helpers in [`numeric`]. [`driver::run`] then does the rest:
//!
//! - the generated source starts with a banner, the load-time comments and
//!   the `--prefix` file, followed by each pin's own source and the port's
//!   tables;
//! - the generated header holds `#define pin_CPUNAME (...)` for every
//!   available pin and `#define pin_BOARDNAME (pin_CPUNAME)` for every alias.

mod csv_input;
pub mod driver;
mod emit;
mod error;
mod generator;
pub mod numeric;
mod pin;
mod port;

pub use csv_input::AfLayout;
pub use driver::GeneratorArgs;
pub use emit::named_pin_pointer;
pub use error::PinGeneratorError;
pub use generator::PinGenerator;
pub use numeric::NumericPort;
pub use pin::{AlternateFunction, Pin, PinState, PortPin};
pub use port::Port;
