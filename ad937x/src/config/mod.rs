use serde::{Deserialize, Serialize};
use std::{fs::read_to_string, path::Path, path::PathBuf};

use crate::{Error, Result};

pub mod gain_pins;

pub use gain_pins::{GainPinChannel, GainPins};

/// Bring-up configuration, usually read from a toml file:
///
/// ```toml
/// firmware = "/lib/firmware/Mykonos_M3.bin"
/// device_clock_hz = 122880000
///
/// [gain_pins]
/// rx1 = { inc = 0, dec = 1 }
/// rx2 = { inc = 3, dec = 4 }
/// tx1 = { inc = 6, dec = 7, inc_step = 2, dec_step = 2 }
/// tx2 = { inc = 8, dec = 9, enable = true }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// ARM firmware, defaults to firmware::ARM_BINARY_PATH
    pub firmware: Option<PathBuf>,
    /// Written to the device structure before initialization
    pub device_clock_hz: Option<f64>,
    pub gain_pins: GainPins,
}

impl Config {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_toml_str(&read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.gain_pins.tx_steps_match() {
            return Err(Error::InvalidConfig(
                "TX gain pins need equal increment and decrement steps",
            ));
        }
        if let Some(hz) = self.device_clock_hz {
            if !(hz.is_finite() && hz >= 1e3) {
                return Err(Error::InvalidConfig("device_clock_hz out of range"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::GpioPin;

    const EXAMPLE: &str = r#"
        firmware = "/tmp/Mykonos_M3.bin"
        device_clock_hz = 122880000

        [gain_pins]
        rx1 = { inc = 0, dec = 1 }
        rx2 = { inc = 3, dec = 4 }
        tx1 = { inc = 6, dec = 7, inc_step = 2, dec_step = 2 }
        tx2 = { inc = 8, dec = 9, enable = true }
    "#;

    #[test]
    fn parse() {
        let config = Config::from_toml_str(EXAMPLE).unwrap();
        assert_eq!(config.firmware, Some(PathBuf::from("/tmp/Mykonos_M3.bin")));
        assert_eq!(config.device_clock_hz, Some(122_880_000.0));
        assert_eq!(config.gain_pins.rx2.inc_pin, GpioPin(3));
        assert_eq!(config.gain_pins.rx2.inc_step, 1);
        assert_eq!(config.gain_pins.tx1.dec_step, 2);
        assert!(config.gain_pins.tx2.enable);
        assert!(!config.gain_pins.tx1.enable);
    }

    #[test]
    fn optional_fields() {
        let config = Config::from_toml_str(
            r#"
            [gain_pins]
            rx1 = { inc = 0, dec = 1 }
            rx2 = { inc = 3, dec = 4 }
            tx1 = { inc = 6, dec = 7 }
            tx2 = { inc = 8, dec = 9 }
            "#,
        )
        .unwrap();
        assert_eq!(config.firmware, None);
        assert_eq!(config.device_clock_hz, None);
    }

    #[test]
    fn reject_tx_step_mismatch() {
        let err = Config::from_toml_str(
            r#"
            [gain_pins]
            rx1 = { inc = 0, dec = 1 }
            rx2 = { inc = 3, dec = 4 }
            tx1 = { inc = 6, dec = 7, inc_step = 1, dec_step = 3 }
            tx2 = { inc = 8, dec = 9 }
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn reject_missing_pins() {
        let err = Config::from_toml_str("[gain_pins]\nrx1 = { inc = 0, dec = 1 }\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
