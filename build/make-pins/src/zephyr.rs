// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Zephyr: pins are `<controller>_<pin>`, e.g. `gpio0_10`, where the
//! controller is a devicetree node label. Every pin is a standalone object.

use anyhow::Result;
use build_boardgen::{pin_bail, PinGenerator, Port, PortPin};
use std::io::Write;

#[derive(Debug)]
pub struct ZephyrPin {
    controller: String,
    pin: u32,
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn split_cpu_pin_name(cpu_pin_name: &str) -> Option<(&str, u32)> {
    let (controller, pin) = cpu_pin_name.rsplit_once('_')?;
    if !is_identifier(controller) || !pin.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((controller, pin.parse().ok()?))
}

impl PortPin for ZephyrPin {
    fn new(cpu_pin_name: &str) -> Result<Self> {
        Self::validate_cpu_pin_name(cpu_pin_name)?;
        let Some((controller, pin)) = split_cpu_pin_name(cpu_pin_name) else {
            pin_bail!("Invalid cpu pin name '{cpu_pin_name}'");
        };
        Ok(Self {
            controller: controller.to_string(),
            pin,
        })
    }

    fn validate_cpu_pin_name(cpu_pin_name: &str) -> Result<()> {
        if cpu_pin_name.trim().is_empty() {
            pin_bail!("Missing cpu pin name");
        }
        if split_cpu_pin_name(cpu_pin_name).is_none() {
            pin_bail!(
                "Invalid cpu pin name '{cpu_pin_name}', expected CONTROLLER_PIN"
            );
        }
        Ok(())
    }

    // Board names become both QSTRs and C macros.
    fn validate_board_pin_name(board_pin_name: &str) -> Result<()> {
        if !is_identifier(board_pin_name) {
            pin_bail!("Invalid board pin name '{board_pin_name}'");
        }
        Ok(())
    }

    fn definition(&self) -> Result<String> {
        Ok(format!(
            "{{ {{ &machine_pin_type }}, MP_QSTR_{}_{}, DEVICE_DT_GET(DT_NODELABEL({})), {} }}",
            self.controller, self.pin, self.controller, self.pin
        ))
    }

    // Controllers can be disabled in the board's devicetree.
    fn enable_macro(&self) -> Option<String> {
        Some(format!(
            "DT_NODE_HAS_STATUS(DT_NODELABEL({}), okay)",
            self.controller
        ))
    }
}

pub struct ZephyrPort {
    gen: PinGenerator<ZephyrPin>,
}

impl Default for ZephyrPort {
    fn default() -> Self {
        Self {
            gen: PinGenerator::new(false),
        }
    }
}

impl Port for ZephyrPort {
    type Pin = ZephyrPin;

    fn generator(&self) -> &PinGenerator<ZephyrPin> {
        &self.gen
    }

    fn generator_mut(&mut self) -> &mut PinGenerator<ZephyrPin> {
        &mut self.gen
    }

    fn print_source(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out)?;
        self.gen.print_named_pins(out, |_| Ok(true))?;
        self.gen.print_cpu_locals_dict(out)?;
        self.gen.print_board_locals_dict(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use std::path::Path;

    fn port(csv: &str) -> Result<ZephyrPort> {
        let mut port = ZephyrPort::default();
        port.generator_mut()
            .parse_board_csv_from(csv.as_bytes(), Path::new("pins.csv"))?;
        Ok(port)
    }

    #[test]
    fn names() {
        assert_eq!(split_cpu_pin_name("gpio0_10"), Some(("gpio0", 10)));
        assert_eq!(split_cpu_pin_name("gpio_port_a_3"), Some(("gpio_port_a", 3)));
        for bad in ["gpio0", "gpio0_", "_3", "0gpio_3", "gpio0_1a"] {
            assert_eq!(split_cpu_pin_name(bad), None, "{bad}");
        }

        let e = port("LED,gpio0\n").err().unwrap();
        assert_eq!(
            e.to_string(),
            "pins.csv:1: Invalid cpu pin name 'gpio0', expected CONTROLLER_PIN"
        );
        let e = port("LED-1,gpio0_1\n").err().unwrap();
        assert_eq!(e.to_string(), "pins.csv:1: Invalid board pin name 'LED-1'");
    }

    #[test]
    fn source_and_header() {
        let port = port(indoc! {"
            LED,gpio0_13
            -SW,gpio1_2
        "})
        .unwrap();

        let mut source = Vec::new();
        port.print_source(&mut source).unwrap();
        assert_eq!(
            String::from_utf8(source).unwrap(),
            indoc! {"

                #if DT_NODE_HAS_STATUS(DT_NODELABEL(gpio0), okay)
                const machine_pin_obj_t pin_gpio0_13_obj = { { &machine_pin_type }, MP_QSTR_gpio0_13, DEVICE_DT_GET(DT_NODELABEL(gpio0)), 13 };
                #endif
                #if DT_NODE_HAS_STATUS(DT_NODELABEL(gpio1), okay)
                const machine_pin_obj_t pin_gpio1_2_obj = { { &machine_pin_type }, MP_QSTR_gpio1_2, DEVICE_DT_GET(DT_NODELABEL(gpio1)), 2 };
                #endif

                STATIC const mp_rom_map_elem_t machine_pin_cpu_pins_locals_dict_table[] = {
                    #if DT_NODE_HAS_STATUS(DT_NODELABEL(gpio0), okay)
                    { MP_ROM_QSTR(MP_QSTR_gpio0_13), MP_ROM_PTR(pin_gpio0_13) },
                    #endif
                    #if DT_NODE_HAS_STATUS(DT_NODELABEL(gpio1), okay)
                    { MP_ROM_QSTR(MP_QSTR_gpio1_2), MP_ROM_PTR(pin_gpio1_2) },
                    #endif
                };
                MP_DEFINE_CONST_DICT(machine_pin_cpu_pins_locals_dict, machine_pin_cpu_pins_locals_dict_table);

                STATIC const mp_rom_map_elem_t machine_pin_board_pins_locals_dict_table[] = {
                    { MP_ROM_QSTR(MP_QSTR_LED), MP_ROM_PTR(pin_gpio0_13) },
                };
                MP_DEFINE_CONST_DICT(machine_pin_board_pins_locals_dict, machine_pin_board_pins_locals_dict_table);
            "}
        );

        let mut header = Vec::new();
        port.print_header(&mut header).unwrap();
        assert_eq!(
            String::from_utf8(header).unwrap(),
            indoc! {"

                #if DT_NODE_HAS_STATUS(DT_NODELABEL(gpio0), okay)
                #define pin_gpio0_13 (&pin_gpio0_13_obj)
                #define pin_LED (pin_gpio0_13)
                #endif

                #if DT_NODE_HAS_STATUS(DT_NODELABEL(gpio1), okay)
                #define pin_gpio1_2 (&pin_gpio1_2_obj)
                #define pin_SW (pin_gpio1_2)
                #endif
            "}
        );
    }
}
