use serde::{Deserialize, Serialize};

use crate::api::GpioPin;
use crate::convert::{rx_step_to_code, tx_step_to_code};
use crate::{Chain, Direction};

fn default_step() -> u8 {
    1
}

/// Gain control pin setup for one chain. Steps are in hardware units:
/// RX_GAIN_STEP for RX, TX_GAIN_STEP of attenuation for TX.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GainPinChannel {
    #[serde(rename = "inc")]
    pub inc_pin: GpioPin,
    #[serde(rename = "dec")]
    pub dec_pin: GpioPin,
    #[serde(default = "default_step")]
    pub inc_step: u8,
    #[serde(default = "default_step")]
    pub dec_step: u8,
    #[serde(default)]
    pub enable: bool,
}

impl GainPinChannel {
    pub const fn new(inc_pin: GpioPin, dec_pin: GpioPin) -> Self {
        GainPinChannel {
            inc_pin,
            dec_pin,
            inc_step: 1,
            dec_step: 1,
            enable: false,
        }
    }
}

/// Local copy of the gain control pin configuration. The Mykonos API only
/// has setters for these, so this is the source of truth when reapplying.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GainPins {
    pub rx1: GainPinChannel,
    pub rx2: GainPinChannel,
    pub tx1: GainPinChannel,
    pub tx2: GainPinChannel,
}

impl GainPins {
    pub fn get(&self, direction: Direction, chain: Chain) -> &GainPinChannel {
        match (direction, chain) {
            (Direction::RX, Chain::One) => &self.rx1,
            (Direction::RX, Chain::Two) => &self.rx2,
            (Direction::TX, Chain::One) => &self.tx1,
            (Direction::TX, Chain::Two) => &self.tx2,
        }
    }

    fn get_mut(&mut self, direction: Direction, chain: Chain) -> &mut GainPinChannel {
        match (direction, chain) {
            (Direction::RX, Chain::One) => &mut self.rx1,
            (Direction::RX, Chain::Two) => &mut self.rx2,
            (Direction::TX, Chain::One) => &mut self.tx1,
            (Direction::TX, Chain::Two) => &mut self.tx2,
        }
    }

    /// Steps are given in dB of gain.
    pub fn set_step_sizes(&mut self, direction: Direction, chain: Chain, inc: f64, dec: f64) {
        let chan = self.get_mut(direction, chain);
        match direction {
            Direction::RX => {
                chan.inc_step = rx_step_to_code(inc);
                chan.dec_step = rx_step_to_code(dec);
            }
            Direction::TX => {
                // TX pins control attenuation, so gain increment is attenuation decrement
                chan.dec_step = tx_step_to_code(inc);
                chan.inc_step = tx_step_to_code(dec);
            }
        }
    }

    pub fn set_enabled(&mut self, direction: Direction, chain: Chain, enable: bool) {
        self.get_mut(direction, chain).enable = enable;
    }

    /// TX attenuation pins share a single step register.
    pub fn tx_steps_match(&self) -> bool {
        self.tx1.inc_step == self.tx1.dec_step && self.tx2.inc_step == self.tx2.dec_step
    }
}
