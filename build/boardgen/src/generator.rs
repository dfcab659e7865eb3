// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::Result;
use indexmap::IndexMap;

use crate::pin::{Pin, PinState, PortPin};

/// The pin registry for one generation run.
///
/// Pins are kept in registration order, keyed by cpu pin name, and are never
/// removed. Ports normally embed one of these and hand it out through
/// [`crate::Port::generator`].
#[derive(Debug)]
pub struct PinGenerator<P> {
    pins: IndexMap<String, Pin<P>>,
    enable_af: bool,
}

impl<P: PortPin> PinGenerator<P> {
    pub fn new(enable_af: bool) -> Self {
        Self {
            pins: IndexMap::new(),
            enable_af,
        }
    }

    /// Whether this generator accepts `--af-csv`.
    pub fn enable_af(&self) -> bool {
        self.enable_af
    }

    /// Registers a cpu pin without relying on it being in a CSV file.
    ///
    /// Registering an existing pin as available declares it; registering it
    /// as unavailable never demotes it.
    pub fn add_cpu_pin(
        &mut self,
        cpu_pin_name: &str,
        available: bool,
    ) -> Result<&mut Pin<P>> {
        let state = if available {
            PinState::Declared
        } else {
            PinState::Referenced
        };

        let pin = match self.pins.entry(cpu_pin_name.to_string()) {
            indexmap::map::Entry::Occupied(e) => e.into_mut(),
            indexmap::map::Entry::Vacant(e) => {
                log::debug!("registering cpu pin {cpu_pin_name} ({state:?})");
                e.insert(Pin::new(cpu_pin_name, state)?)
            }
        };
        if available {
            pin.declare();
        }
        Ok(pin)
    }

    /// Looks up a pin by its exact cpu name. Unknown pins are either created
    /// as `Referenced` or reported, depending on `create`.
    pub fn find_pin_by_cpu_pin_name(
        &mut self,
        cpu_pin_name: &str,
        create: bool,
    ) -> Result<&mut Pin<P>> {
        if self.pins.contains_key(cpu_pin_name) || create {
            self.add_cpu_pin(cpu_pin_name, false)
        } else {
            crate::pin_bail!("Unknown cpu pin {cpu_pin_name}")
        }
    }

    /// Immutable lookup, for ports and tests.
    pub fn pin(&self, cpu_pin_name: &str) -> Option<&Pin<P>> {
        self.pins.get(cpu_pin_name)
    }

    /// Every registered pin, available or not, in registration order.
    pub fn pins(&self) -> impl Iterator<Item = &Pin<P>> + '_ {
        self.pins.values()
    }

    /// The pins that made it into the board CSV (or were registered as
    /// available), in registration order.
    pub fn available_pins(
        &self,
        exclude_hidden: bool,
    ) -> impl Iterator<Item = &Pin<P>> + Clone + '_ {
        self.pins.values().filter(move |pin| {
            pin.is_available() && !(exclude_hidden && pin.is_hidden())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pin::tests::TestPin;
    use crate::PinGeneratorError;

    fn names<'a>(pins: impl Iterator<Item = &'a Pin<TestPin>>) -> Vec<String> {
        pins.map(|p| p.cpu_pin_name().to_string()).collect()
    }

    #[test]
    fn lookup_or_create() {
        let mut gen = PinGenerator::<TestPin>::new(false);
        gen.add_cpu_pin("GPIO0", true).unwrap();

        let pin = gen.find_pin_by_cpu_pin_name("GPIO1", true).unwrap();
        assert_eq!(pin.state(), PinState::Referenced);

        let e = gen.find_pin_by_cpu_pin_name("GPIO2", false).unwrap_err();
        assert_eq!(e.to_string(), "Unknown cpu pin GPIO2");
        assert!(e.downcast_ref::<PinGeneratorError>().is_some());

        // Finding an existing pin never changes its state.
        let pin = gen.find_pin_by_cpu_pin_name("GPIO0", false).unwrap();
        assert_eq!(pin.state(), PinState::Declared);
        assert_eq!(names(gen.pins()), ["GPIO0", "GPIO1"]);
    }

    #[test]
    fn declaration_only_goes_forwards() {
        let mut gen = PinGenerator::<TestPin>::new(false);
        gen.add_cpu_pin("GPIO0", false).unwrap();
        assert!(!gen.pin("GPIO0").unwrap().is_available());
        gen.add_cpu_pin("GPIO0", true).unwrap();
        assert!(gen.pin("GPIO0").unwrap().is_available());
        gen.add_cpu_pin("GPIO0", false).unwrap();
        assert!(gen.pin("GPIO0").unwrap().is_available());
        assert_eq!(gen.pins().count(), 1);
    }

    #[test]
    fn available_pins_filters_and_restarts() {
        let mut gen = PinGenerator::<TestPin>::new(false);
        gen.add_cpu_pin("GPIO0", true).unwrap();
        gen.add_cpu_pin("GPIO1", false).unwrap();
        gen.add_cpu_pin("GPIO2", true).unwrap().set_hidden(true);
        gen.add_cpu_pin("GPIO3", true).unwrap();

        let all = gen.available_pins(false);
        assert_eq!(names(all.clone()), ["GPIO0", "GPIO2", "GPIO3"]);
        assert_eq!(names(all), ["GPIO0", "GPIO2", "GPIO3"]);
        assert_eq!(names(gen.available_pins(true)), ["GPIO0", "GPIO3"]);
    }
}
