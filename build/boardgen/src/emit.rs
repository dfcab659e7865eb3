// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::Result;
use std::io::Write;

use crate::pin::{Pin, PortPin};
use crate::PinGenerator;

/// `&pin_NAME_obj`, the address of a standalone pin object.
pub fn named_pin_pointer<P: PortPin>(pin: &Pin<P>) -> String {
    format!("&pin_{}_obj", pin.name())
}

/// Runs `body` inside `#if GUARD` / `#endif` when there is a guard.
pub(crate) fn guarded(
    out: &mut dyn Write,
    guard: Option<&str>,
    indent: &str,
    body: impl FnOnce(&mut dyn Write) -> Result<()>,
) -> Result<()> {
    if let Some(m) = guard {
        writeln!(out, "{indent}#if {m}")?;
    }
    body(&mut *out)?;
    if guard.is_some() {
        writeln!(out, "{indent}#endif")?;
    }
    Ok(())
}

impl<P: PortPin> PinGenerator<P> {
    /// Prints the locals dict for `Pin.board`.
    pub fn print_board_locals_dict(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out)?;
        writeln!(
            out,
            "STATIC const mp_rom_map_elem_t machine_pin_board_pins_locals_dict_table[] = {{"
        )?;
        for pin in self.available_pins(false) {
            // No enable guard here: a board pin should only be in pins.csv if
            // its cpu pin is actually there.
            for (board_pin_name, hidden) in pin.board_pin_names() {
                if hidden {
                    continue;
                }
                writeln!(
                    out,
                    "    {{ MP_ROM_QSTR(MP_QSTR_{board_pin_name}), MP_ROM_PTR(pin_{}) }},",
                    pin.name(),
                )?;
            }
        }
        writeln!(out, "}};")?;
        writeln!(
            out,
            "MP_DEFINE_CONST_DICT(machine_pin_board_pins_locals_dict, machine_pin_board_pins_locals_dict_table);"
        )?;
        Ok(())
    }

    /// Prints the locals dict for `Pin.cpu`.
    pub fn print_cpu_locals_dict(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out)?;
        writeln!(
            out,
            "STATIC const mp_rom_map_elem_t machine_pin_cpu_pins_locals_dict_table[] = {{"
        )?;
        for pin in self.available_pins(true) {
            let name = pin.name();
            guarded(out, pin.port().enable_macro().as_deref(), "    ", |out| {
                writeln!(
                    out,
                    "    {{ MP_ROM_QSTR(MP_QSTR_{name}), MP_ROM_PTR(pin_{name}) }},"
                )?;
                Ok(())
            })?;
        }
        writeln!(out, "}};")?;
        writeln!(
            out,
            "MP_DEFINE_CONST_DICT(machine_pin_cpu_pins_locals_dict, machine_pin_cpu_pins_locals_dict_table);"
        )?;
        Ok(())
    }

    /// Prints `#define pin_CPUNAME (...)` for every available pin, followed
    /// by `#define pin_BOARDNAME (pin_CPUNAME)` for each of its aliases.
    ///
    /// `pointer` produces the C expression the cpu macro expands to.
    pub fn print_defines(
        &self,
        out: &mut dyn Write,
        pointer: impl Fn(&Pin<P>) -> Result<String>,
    ) -> Result<()> {
        for pin in self.available_pins(false) {
            writeln!(out)?;
            let name = pin.name();
            let ptr = pointer(pin)?;
            guarded(out, pin.port().enable_macro().as_deref(), "", |out| {
                writeln!(out, "#define pin_{name} ({ptr})")?;
                // Hidden board pins are still available to C.
                for (board_pin_name, _hidden) in pin.board_pin_names() {
                    writeln!(out, "#define pin_{board_pin_name} (pin_{name})")?;
                }
                Ok(())
            })?;
        }
        Ok(())
    }

    /// Prints a standalone `machine_pin_obj_t pin_NAME_obj` definition for
    /// every available pin accepted by `filter`.
    pub fn print_named_pins(
        &self,
        out: &mut dyn Write,
        filter: impl Fn(&Pin<P>) -> Result<bool>,
    ) -> Result<()> {
        for pin in self.available_pins(false) {
            if !filter(pin)? {
                continue;
            }
            let port = pin.port();
            let definition = port.definition()?;
            guarded(out, port.enable_macro().as_deref(), "", |out| {
                writeln!(
                    out,
                    "{}machine_pin_obj_t pin_{}_obj = {definition};",
                    if port.is_const() { "const " } else { "" },
                    pin.name(),
                )?;
                Ok(())
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pin::tests::TestPin;
    use indoc::indoc;

    fn render(f: impl FnOnce(&mut dyn Write) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn generator() -> PinGenerator<TestPin> {
        let mut gen = PinGenerator::<TestPin>::new(false);
        let pin = gen.add_cpu_pin("GPIO0", true).unwrap();
        pin.add_board_pin_name("A0", false);
        pin.add_board_pin_name("LED", true);

        let pin = gen.add_cpu_pin("GPIO1", true).unwrap();
        pin.set_hidden(true);
        pin.add_board_pin_name("A1", false);

        let pin = gen.add_cpu_pin("EXT0", true).unwrap();
        pin.port_mut().guard = Some("MICROPY_HW_EXT".into());
        pin.port_mut().mutable = true;

        gen.add_cpu_pin("GPIO2", false)
            .unwrap()
            .add_board_pin_name("A2", false);
        gen
    }

    #[test]
    fn board_dict() {
        let gen = generator();
        assert_eq!(
            render(|out| gen.print_board_locals_dict(out)),
            indoc! {"

                STATIC const mp_rom_map_elem_t machine_pin_board_pins_locals_dict_table[] = {
                    { MP_ROM_QSTR(MP_QSTR_A0), MP_ROM_PTR(pin_GPIO0) },
                    { MP_ROM_QSTR(MP_QSTR_A1), MP_ROM_PTR(pin_GPIO1) },
                };
                MP_DEFINE_CONST_DICT(machine_pin_board_pins_locals_dict, machine_pin_board_pins_locals_dict_table);
            "}
        );
    }

    #[test]
    fn cpu_dict() {
        let gen = generator();
        assert_eq!(
            render(|out| gen.print_cpu_locals_dict(out)),
            indoc! {"

                STATIC const mp_rom_map_elem_t machine_pin_cpu_pins_locals_dict_table[] = {
                    { MP_ROM_QSTR(MP_QSTR_GPIO0), MP_ROM_PTR(pin_GPIO0) },
                    #if MICROPY_HW_EXT
                    { MP_ROM_QSTR(MP_QSTR_EXT0), MP_ROM_PTR(pin_EXT0) },
                    #endif
                };
                MP_DEFINE_CONST_DICT(machine_pin_cpu_pins_locals_dict, machine_pin_cpu_pins_locals_dict_table);
            "}
        );
    }

    #[test]
    fn defines() {
        let gen = generator();
        assert_eq!(
            render(|out| gen.print_defines(out, |pin| Ok(named_pin_pointer(pin)))),
            indoc! {"

                #define pin_GPIO0 (&pin_GPIO0_obj)
                #define pin_A0 (pin_GPIO0)
                #define pin_LED (pin_GPIO0)

                #define pin_GPIO1 (&pin_GPIO1_obj)
                #define pin_A1 (pin_GPIO1)

                #if MICROPY_HW_EXT
                #define pin_EXT0 (&pin_EXT0_obj)
                #endif
            "}
        );
    }

    #[test]
    fn named_pins() {
        let gen = generator();
        assert_eq!(
            render(|out| gen.print_named_pins(out, |_| Ok(true))),
            indoc! {"
                const machine_pin_obj_t pin_GPIO0_obj = PIN(0);
                const machine_pin_obj_t pin_GPIO1_obj = PIN(1);
                #if MICROPY_HW_EXT
                machine_pin_obj_t pin_EXT0_obj = PIN(-1);
                #endif
            "}
        );
    }
}
