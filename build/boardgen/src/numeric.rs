// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Support for ports that address pins by number (GPIO n).
//!
//! Pins with an index live in a single `machine_pin_obj_table` array;
//! `pin_NAME` then points into that array. Pins without an index are emitted
//! as standalone objects the same way a named port would.

use anyhow::Result;
use std::io::Write;

use crate::emit::{guarded, named_pin_pointer};
use crate::pin::{Pin, PortPin};
use crate::{PinGeneratorError, Port};

pub trait NumericPort: Port {
    /// C expression for the number of slots in `machine_pin_obj_table`.
    fn cpu_table_size(&self) -> Result<String> {
        Err(PinGeneratorError::unimplemented("cpu_table_size").into())
    }
}

/// Prints `machine_pin_obj_table`, where each element is `[n] = {obj}`,
/// followed by the pins that have no index.
pub fn print_cpu_table<T: NumericPort + ?Sized>(
    port: &T,
    out: &mut dyn Write,
) -> Result<()> {
    let gen = port.generator();

    writeln!(out)?;
    writeln!(
        out,
        "const machine_pin_obj_t machine_pin_obj_table[{}] = {{",
        port.cpu_table_size()?
    )?;
    for pin in gen.available_pins(false) {
        let p = pin.port();
        let Some(index) = p.index_name()? else {
            continue;
        };
        let definition = p.definition()?;
        guarded(out, p.enable_macro().as_deref(), "    ", |out| {
            writeln!(out, "    [{index}] = {definition},")?;
            Ok(())
        })?;
    }
    writeln!(out, "}};")?;

    writeln!(out)?;
    gen.print_named_pins(out, |pin| Ok(pin.port().index_name()?.is_none()))
}

/// The usual `print_source` for a numeric port: the cpu table, then
/// `Pin.board`.
pub fn print_source<T: NumericPort + ?Sized>(
    port: &T,
    out: &mut dyn Write,
) -> Result<()> {
    print_cpu_table(port, out)?;
    port.generator().print_board_locals_dict(out)
}

/// Points `pin_CPUNAME` at the table slot when the pin has an index.
pub fn cpu_pin_pointer<P: PortPin>(pin: &Pin<P>) -> Result<String> {
    Ok(match pin.port().index_name()? {
        Some(index) => format!("&machine_pin_obj_table[{index}]"),
        None => named_pin_pointer(pin),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pin::tests::TestPin;
    use crate::PinGenerator;
    use indoc::indoc;

    struct TestPort {
        gen: PinGenerator<TestPin>,
        size: Option<&'static str>,
    }

    impl Port for TestPort {
        type Pin = TestPin;

        fn generator(&self) -> &PinGenerator<TestPin> {
            &self.gen
        }

        fn generator_mut(&mut self) -> &mut PinGenerator<TestPin> {
            &mut self.gen
        }

        fn cpu_pin_pointer(&self, pin: &Pin<TestPin>) -> Result<String> {
            cpu_pin_pointer(pin)
        }

        fn print_source(&self, out: &mut dyn Write) -> Result<()> {
            print_source(self, out)
        }
    }

    impl NumericPort for TestPort {
        fn cpu_table_size(&self) -> Result<String> {
            match self.size {
                Some(size) => Ok(size.to_string()),
                None => Err(PinGeneratorError::unimplemented("cpu_table_size").into()),
            }
        }
    }

    fn port(size: Option<&'static str>) -> TestPort {
        let mut gen = PinGenerator::<TestPin>::new(false);
        gen.add_cpu_pin("GPIO0", true)
            .unwrap()
            .add_board_pin_name("D0", false);
        gen.add_cpu_pin("GPIO1", false).unwrap();
        let pin = gen.add_cpu_pin("GPIO2", true).unwrap();
        pin.port_mut().guard = Some("MICROPY_HW_ENABLE_GPIO2".into());

        let pin = gen.add_cpu_pin("EXT_GPIO0", true).unwrap();
        pin.port_mut().mutable = true;
        pin.add_board_pin_name("LED", false);
        gen.add_cpu_pin("EXT_GPIO1", true).unwrap();
        TestPort { gen, size }
    }

    fn render(f: impl FnOnce(&mut dyn Write) -> Result<()>) -> Result<String> {
        let mut buf = Vec::new();
        f(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    #[test]
    fn source() {
        let port = port(Some("NUM_GPIOS"));
        assert_eq!(
            render(|out| port.print_source(out)).unwrap(),
            indoc! {"

                const machine_pin_obj_t machine_pin_obj_table[NUM_GPIOS] = {
                    [0] = PIN(0),
                    #if MICROPY_HW_ENABLE_GPIO2
                    [2] = PIN(2),
                    #endif
                };

                machine_pin_obj_t pin_EXT_GPIO0_obj = PIN(-1);
                const machine_pin_obj_t pin_EXT_GPIO1_obj = PIN(-1);

                STATIC const mp_rom_map_elem_t machine_pin_board_pins_locals_dict_table[] = {
                    { MP_ROM_QSTR(MP_QSTR_D0), MP_ROM_PTR(pin_GPIO0) },
                    { MP_ROM_QSTR(MP_QSTR_LED), MP_ROM_PTR(pin_EXT_GPIO0) },
                };
                MP_DEFINE_CONST_DICT(machine_pin_board_pins_locals_dict, machine_pin_board_pins_locals_dict_table);
            "}
        );
    }

    #[test]
    fn header_points_into_the_table() {
        let port = port(Some("NUM_GPIOS"));
        assert_eq!(
            render(|out| port.print_header(out)).unwrap(),
            indoc! {"

                #define pin_GPIO0 (&machine_pin_obj_table[0])
                #define pin_D0 (pin_GPIO0)

                #if MICROPY_HW_ENABLE_GPIO2
                #define pin_GPIO2 (&machine_pin_obj_table[2])
                #endif

                #define pin_EXT_GPIO0 (&pin_EXT_GPIO0_obj)
                #define pin_LED (pin_EXT_GPIO0)

                #define pin_EXT_GPIO1 (&pin_EXT_GPIO1_obj)
            "}
        );
    }

    #[test]
    fn table_size_is_required() {
        let port = port(None);
        let e = render(|out| port.print_source(out)).unwrap_err();
        assert_eq!(e.to_string(), "cpu_table_size is not implemented by this port");
    }
}
