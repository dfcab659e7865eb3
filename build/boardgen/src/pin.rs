// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::Result;
use indexmap::IndexMap;
use std::borrow::Cow;
use std::io::Write;

use crate::PinGeneratorError;

/// An alternate function read from one cell of the AF CSV.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlternateFunction {
    /// Column offset relative to the first AF column.
    pub index: usize,
    /// Heading of that column, or empty if the header row was short.
    pub label: String,
    /// Trimmed cell contents, e.g. `UART0_TX`.
    pub value: String,
}

/// Where a pin stands with respect to the inputs.
///
/// A pin that has never been mentioned has no entry in the registry at all.
/// The AF CSV may mention pins before (or without) the board CSV doing so;
/// those pins are `Referenced` and take no part in the output. Only a board
/// CSV row (or an explicit registration) makes a pin `Declared`. There is no
/// way back from `Declared`, so the order in which the inputs are read does
/// not matter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum PinState {
    Referenced,
    Declared,
}

/// The per-pin half of a port.
///
/// A port supplies a type implementing this trait; it is stored as the
/// extension data of each [`Pin`] and is asked to validate names, absorb
/// alternate functions and describe how the pin is spelled in C.
pub trait PortPin: Sized {
    fn new(cpu_pin_name: &str) -> Result<Self>;

    /// The name to use in `MP_QSTR_{}` and `pin_{}`. Defaults to the cpu name.
    fn name<'a>(&'a self, cpu_pin_name: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(cpu_pin_name)
    }

    /// Override to check that names follow the MCU convention (`GPIOn`,
    /// `PXn`, ...).
    fn validate_cpu_pin_name(cpu_pin_name: &str) -> Result<()> {
        if cpu_pin_name.trim().is_empty() {
            crate::pin_bail!("Missing cpu pin name");
        }
        Ok(())
    }

    fn validate_board_pin_name(_board_pin_name: &str) -> Result<()> {
        Ok(())
    }

    fn add_af(&mut self, _af: AlternateFunction) -> Result<()> {
        Err(PinGeneratorError::unimplemented("add_af").into())
    }

    /// Position in the indexed table, or `None` to leave the pin out of it.
    /// Only needed by numeric ports.
    fn index(&self) -> Result<Option<usize>> {
        Err(PinGeneratorError::unimplemented("index").into())
    }

    /// C expression for the index, e.g. `GPIO_NUM_7`. Defaults to the index
    /// as a literal.
    fn index_name(&self) -> Result<Option<String>> {
        Ok(self.index()?.map(|i| i.to_string()))
    }

    /// C expression that defines the pin object, e.g. `PIN(gpio0, 10)`.
    fn definition(&self) -> Result<String> {
        Err(PinGeneratorError::unimplemented("definition").into())
    }

    fn is_const(&self) -> bool {
        true
    }

    /// Preprocessor expression guarding everything emitted for this pin.
    fn enable_macro(&self) -> Option<String> {
        None
    }

    /// Arbitrary per-pin content for the start of the source output.
    fn print_source(&self, _out: &mut dyn Write) -> Result<()> {
        Ok(())
    }
}

/// A single pin of the MCU as seen by the generator.
#[derive(Clone, Debug)]
pub struct Pin<P> {
    cpu_pin_name: String,
    // Board aliases mapped to their hidden flag. Hidden aliases are still
    // usable from C via `pin_NAME`, but are not in `Pin.board`.
    board_pin_names: IndexMap<String, bool>,
    state: PinState,
    hidden: bool,
    port: P,
}

impl<P: PortPin> Pin<P> {
    pub(crate) fn new(cpu_pin_name: &str, state: PinState) -> Result<Self> {
        Ok(Self {
            cpu_pin_name: cpu_pin_name.to_string(),
            board_pin_names: IndexMap::new(),
            state,
            hidden: false,
            port: P::new(cpu_pin_name)?,
        })
    }

    pub fn name(&self) -> Cow<'_, str> {
        self.port.name(&self.cpu_pin_name)
    }

    pub fn cpu_pin_name(&self) -> &str {
        &self.cpu_pin_name
    }

    /// Adds a board alias. Re-adding an alias replaces its hidden flag.
    pub fn add_board_pin_name(&mut self, board_pin_name: &str, hidden: bool) {
        self.board_pin_names.insert(board_pin_name.to_string(), hidden);
    }

    /// Board aliases as `(name, hidden)`, in the order they were added.
    pub fn board_pin_names(&self) -> impl Iterator<Item = (&str, bool)> + '_ {
        self.board_pin_names
            .iter()
            .map(|(name, hidden)| (name.as_str(), *hidden))
    }

    pub fn state(&self) -> PinState {
        self.state
    }

    pub fn is_available(&self) -> bool {
        self.state == PinState::Declared
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub(crate) fn declare(&mut self) {
        self.state = PinState::Declared;
    }

    pub(crate) fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }
}
