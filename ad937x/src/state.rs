// Several settings can only be changed while the radio is off (the READY
// state). Configuration functions move to that state first and put the radio
// back on afterwards if it was on. A failure part way through leaves the
// radio off.
use log::debug;

use crate::api::{Mykonos, RadioStatus};
use crate::{Ad937x, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RadioState {
    Off,
    On,
}

impl<M: Mykonos> Ad937x<M> {
    /// Turns the radio off if it is on. The returned state is meant for
    /// `restore_state`.
    pub fn enter_config_state(&mut self) -> Result<RadioState> {
        let status = self.call(M::get_radio_state)?;
        if status.contains(RadioStatus::RX_ON | RadioStatus::TX_ON) {
            debug!("Radio on, moving to config state");
            self.stop_radio()?;
            Ok(RadioState::On)
        } else {
            Ok(RadioState::Off)
        }
    }

    pub fn restore_state(&mut self, state: RadioState) -> Result<()> {
        match state {
            RadioState::On => {
                debug!("Restoring radio on");
                self.start_radio()
            }
            RadioState::Off => Ok(()),
        }
    }

    pub(crate) fn configure<T>(&mut self, func: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let state = self.enter_config_state()?;
        let value = func(self)?;
        self.restore_state(state)?;
        Ok(value)
    }
}
