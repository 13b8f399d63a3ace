use log::{debug, info, trace, warn};
use std::{
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

use crate::api::*;
use crate::config::{Config, GainPins};
use crate::convert::*;
use crate::firmware::{self, ARM_BINARY_PATH};
use crate::{Chain, Direction, Error, Result};

pub const AD9371_PRODUCT_ID: u8 = 0x3;
pub const PLL_LOCK_TIMEOUT: Duration = Duration::from_millis(200);
pub const INIT_CAL_TIMEOUT_MS: u32 = 10000;

const RX_DEFAULT_FREQ: f64 = 2.5e9;
const TX_DEFAULT_FREQ: f64 = 2.5e9;
const RX_DEFAULT_GAIN: f64 = 0.0;
const TX_DEFAULT_GAIN: f64 = 0.0;

// TODO: decide which cals we actually want, 0x4F is the required minimum
const INIT_CALS: InitCals = InitCals::TX_BB_FILTER
    .union(InitCals::ADC_TUNER)
    .union(InitCals::TIA_3DB_CORNER)
    .union(InitCals::DC_OFFSET)
    .union(InitCals::FLASH_CAL);

const TRACKING_CALS: TrackingCals = TrackingCals::empty();

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MultichipSync {
    Partial,
    Full,
}

impl MultichipSync {
    /// All bits of the mask are expected to be set
    pub fn expected(self) -> u8 {
        match self {
            MultichipSync::Partial => 0x0A,
            MultichipSync::Full => 0x0B,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgcMode {
    Manual,
    Automatic,
    Hybrid,
}

impl From<AgcMode> for GainMode {
    fn from(v: AgcMode) -> GainMode {
        match v {
            AgcMode::Manual => GainMode::MGC,
            AgcMode::Automatic => GainMode::AGC,
            AgcMode::Hybrid => GainMode::HYBRID,
        }
    }
}

// Per chain dispatch into the Mykonos API, which has separate functions for
// each chain rather than a chain parameter.
type RxGainSetter<M> = fn(&mut M, &mut Device, u8) -> ApiResult<()>;
type RxGainGetter<M> = fn(&mut M, &mut Device) -> ApiResult<u8>;
type TxAttenSetter<M> = fn(&mut M, &mut Device, u16) -> ApiResult<()>;
type TxAttenGetter<M> = fn(&mut M, &mut Device) -> ApiResult<u16>;
type RxPinSetter<M> = fn(&mut M, &mut Device, u8, u8, GpioPin, GpioPin, bool) -> GpioResult<()>;
type TxPinSetter<M> = fn(&mut M, &mut Device, u8, GpioPin, GpioPin, bool) -> GpioResult<()>;

fn rx_gain_setter<M: Mykonos>(chain: Chain) -> RxGainSetter<M> {
    match chain {
        Chain::One => M::set_rx1_manual_gain,
        Chain::Two => M::set_rx2_manual_gain,
    }
}

fn rx_gain_getter<M: Mykonos>(chain: Chain) -> RxGainGetter<M> {
    match chain {
        Chain::One => M::get_rx1_gain,
        Chain::Two => M::get_rx2_gain,
    }
}

fn tx_atten_setter<M: Mykonos>(chain: Chain) -> TxAttenSetter<M> {
    match chain {
        Chain::One => M::set_tx1_attenuation,
        Chain::Two => M::set_tx2_attenuation,
    }
}

fn tx_atten_getter<M: Mykonos>(chain: Chain) -> TxAttenGetter<M> {
    match chain {
        Chain::One => M::get_tx1_attenuation,
        Chain::Two => M::get_tx2_attenuation,
    }
}

fn rx_pin_setter<M: Mykonos>(chain: Chain) -> RxPinSetter<M> {
    match chain {
        Chain::One => M::set_rx1_gain_ctrl_pin,
        Chain::Two => M::set_rx2_gain_ctrl_pin,
    }
}

fn tx_pin_setter<M: Mykonos>(chain: Chain) -> TxPinSetter<M> {
    match chain {
        // useTx1ForTx2 is not supported
        Chain::One => |api: &mut M, device: &mut Device, step, inc_pin, dec_pin, enable| {
            api.set_tx1_atten_ctrl_pin(device, step, inc_pin, dec_pin, enable, false)
        },
        Chain::Two => M::set_tx2_atten_ctrl_pin,
    }
}

fn rf_pll(direction: Direction) -> (RfPll, PllSynth) {
    match direction {
        Direction::RX => (RfPll::Rx, PllSynth::RX_SYNTH),
        Direction::TX => (RfPll::Tx, PllSynth::TX_SYNTH),
    }
}

/// An AD937x and the state the Mykonos API does not keep for us.
///
/// Bring-up is `begin_initialization`, then (after the multichip sync pulses
/// have been sent) `finish_initialization`, then `start_jesd_rx`/`start_jesd_tx`
/// and `start_radio`. Call order is not checked.
pub struct Ad937x<M: Mykonos> {
    api: M,
    device: Device,
    gain_pins: GainPins,
    firmware: PathBuf,
}

impl<M: Mykonos> Ad937x<M> {
    pub fn new(api: M, gain_pins: GainPins) -> Self {
        Ad937x {
            api,
            device: Device::default(),
            gain_pins,
            firmware: PathBuf::from(ARM_BINARY_PATH),
        }
    }

    pub fn from_config(api: M, config: &Config) -> Result<Self> {
        config.validate()?;
        let mut ad = Self::new(api, config.gain_pins);
        if let Some(path) = &config.firmware {
            ad.firmware = path.clone();
        }
        if let Some(hz) = config.device_clock_hz {
            ad.device.clocks.device_clock_khz = clock_rate_to_khz(hz);
        }
        Ok(ad)
    }

    pub fn with_firmware<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.firmware = path.as_ref().to_path_buf();
        self
    }

    pub fn api(&self) -> &M {
        &self.api
    }

    pub fn api_mut(&mut self) -> &mut M {
        &mut self.api
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn gain_pins(&self) -> &GainPins {
        &self.gain_pins
    }

    pub fn firmware(&self) -> &Path {
        &self.firmware
    }

    pub(crate) fn call<T>(
        &mut self,
        func: impl FnOnce(&mut M, &mut Device) -> ApiResult<T>,
    ) -> Result<T> {
        func(&mut self.api, &mut self.device).map_err(|status| {
            trace!("Mykonos API returned {:?}", status);
            Error::Chip {
                code: status.0,
                message: self.api.error_message(status),
            }
        })
    }

    pub(crate) fn call_gpio<T>(
        &mut self,
        func: impl FnOnce(&mut M, &mut Device) -> GpioResult<T>,
    ) -> Result<T> {
        func(&mut self.api, &mut self.device).map_err(|status| {
            trace!("Mykonos GPIO API returned {:?}", status);
            Error::Gpio {
                code: status.0,
                message: self.api.gpio_error_message(status),
            }
        })
    }

    /* Initialization */

    pub fn begin_initialization(&mut self) -> Result<()> {
        info!("Beginning AD937x initialization");
        self.call(M::initialize)?;
        self.verify_product_id()?;

        if !self.get_pll_lock_status(PllSynth::CLK_SYNTH, false)? {
            return Err(Error::PllLock(PllSynth::CLK_SYNTH));
        }

        self.call(|api, device| api.enable_multichip_sync(device, true))?;
        Ok(())
    }

    pub fn finish_initialization(&mut self) -> Result<()> {
        self.verify_multichip_sync(MultichipSync::Partial)?;

        self.call(M::init_arm)?;
        let binary = firmware::load_arm_binary(&self.firmware)?;
        self.call(|api, device| api.load_arm_from_binary(device, &binary))?;
        info!("Loaded ARM binary {}", self.firmware.display());

        self.initialize_rf()
    }

    fn initialize_rf(&mut self) -> Result<()> {
        self.tune(Direction::RX, RX_DEFAULT_FREQ, false)?;
        self.tune(Direction::TX, TX_DEFAULT_FREQ, false)?;

        let plls = PllSynth::CLK_SYNTH | PllSynth::RX_SYNTH | PllSynth::TX_SYNTH | PllSynth::SNIFF_SYNTH;
        if !self.get_pll_lock_status(plls, true)? {
            return Err(Error::PllLock(plls));
        }

        for direction in [Direction::RX, Direction::TX] {
            for chain in [Chain::One, Chain::Two] {
                self.apply_gain_pins(direction, chain)?;
            }
        }
        self.call_gpio(M::setup_gpio)?;

        self.set_gain(Direction::RX, Chain::One, RX_DEFAULT_GAIN)?;
        self.set_gain(Direction::RX, Chain::Two, RX_DEFAULT_GAIN)?;
        self.set_gain(Direction::TX, Chain::One, TX_DEFAULT_GAIN)?;
        self.set_gain(Direction::TX, Chain::Two, TX_DEFAULT_GAIN)?;

        self.call(|api, device| api.run_init_cals(device, INIT_CALS))?;
        let cal = self.call(|api, device| api.wait_init_cals(device, INIT_CAL_TIMEOUT_MS))?;
        if cal.flag != 0 || cal.code != 0 {
            return Err(Error::Calibration {
                flag: cal.flag,
                code: cal.code,
            });
        }
        info!("Init cals {:?} complete", INIT_CALS);

        self.call(|api, device| api.enable_tracking_cals(device, TRACKING_CALS))?;
        // ready for radio on
        Ok(())
    }

    pub fn verify_product_id(&mut self) -> Result<()> {
        let read = self.get_product_id()?;
        if read != AD9371_PRODUCT_ID {
            return Err(Error::ProductMismatch {
                read,
                expected: AD9371_PRODUCT_ID,
            });
        }
        Ok(())
    }

    pub fn verify_multichip_sync(&mut self, mcs: MultichipSync) -> Result<()> {
        let expected = mcs.expected();
        let read = self.get_multichip_sync_status()?;
        if read & expected != expected {
            return Err(Error::SyncMismatch { read, expected });
        }
        Ok(())
    }

    pub fn start_jesd_tx(&mut self) -> Result<()> {
        self.call(|api, device| api.enable_sysref_to_rx_framer(device, true))
    }

    pub fn start_jesd_rx(&mut self) -> Result<()> {
        self.call(|api, device| api.enable_sysref_to_deframer(device, false))?;
        self.call(M::reset_deframer)?;
        self.call(|api, device| api.enable_sysref_to_deframer(device, true))
    }

    pub fn start_radio(&mut self) -> Result<()> {
        self.call(M::radio_on)
    }

    pub fn stop_radio(&mut self) -> Result<()> {
        self.call(M::radio_off)
    }

    /* Status */

    /// MYKONOS_enableMultichipSync with enable cleared only reads the status
    pub fn get_multichip_sync_status(&mut self) -> Result<u8> {
        self.call(|api, device| api.enable_multichip_sync(device, false))
    }

    pub fn get_framer_status(&mut self) -> Result<u8> {
        self.call(M::read_rx_framer_status)
    }

    pub fn get_deframer_status(&mut self) -> Result<u8> {
        self.call(M::read_deframer_status)
    }

    pub fn get_ilas_config_match(&mut self) -> Result<u16> {
        self.call(M::jesd204b_ilas_check)
    }

    pub fn get_product_id(&mut self) -> Result<u8> {
        self.call(M::get_product_id)
    }

    pub fn get_device_rev(&mut self) -> Result<u8> {
        self.call(M::get_device_rev)
    }

    pub fn get_api_version(&mut self) -> Result<ApiVersion> {
        self.call(M::get_api_version)
    }

    pub fn get_arm_version(&mut self) -> Result<ArmVersion> {
        self.call(M::get_arm_version)
    }

    /// Raw temperature sensor code
    pub fn get_temperature(&mut self) -> Result<i16> {
        let status = self.call_gpio(M::read_temp_sensor)?;
        if !status.temp_valid {
            warn!("AD937x temperature reading not valid: {:?}", status);
        }
        Ok(status.temp_code)
    }

    /* Configuration */

    pub fn enable_jesd_loopback(&mut self, enable: bool) -> Result<()> {
        let source = if enable {
            FramerDataSource::LOOPBACK
        } else {
            FramerDataSource::ADC
        };
        self.configure(|ad| ad.call(|api, device| api.set_rx_framer_data_source(device, source)))
    }

    /// Returns the rate actually applied, truncated to kHz.
    pub fn set_clock_rate(&mut self, rate: f64) -> Result<f64> {
        let khz = clock_rate_to_khz(rate);
        debug!("Setting device clock to {} kHz", khz);
        self.configure(|ad| {
            ad.device.clocks.device_clock_khz = khz;
            ad.call(M::init_digital_clocks)
        })?;
        Ok(f64::from(khz) * 1e3)
    }

    /// Returns the LO frequency read back from the PLL.
    pub fn tune(&mut self, direction: Direction, value: f64, wait_for_lock: bool) -> Result<f64> {
        let (pll, synth) = rf_pll(direction);
        let hz = value as u64;
        debug!("Tuning {:?} to {} Hz", direction, hz);

        self.configure(|ad| {
            // The PLL frequency lives in the device structure as well as the call
            ad.device.path_mut(direction).pll_lo_frequency_hz = hz;
            ad.call(|api, device| api.set_rf_pll_frequency(device, pll, hz))?;

            if wait_for_lock && !ad.get_pll_lock_status(synth, true)? {
                return Err(Error::PllLock(synth));
            }
            Ok(())
        })?;

        self.get_freq(direction)
    }

    /// Returns the gain the written code decodes to, not a read back.
    pub fn set_gain(&mut self, direction: Direction, chain: Chain, value: f64) -> Result<f64> {
        debug!("Setting {:?} {:?} gain to {} dB", direction, chain, value);
        self.configure(|ad| match direction {
            Direction::RX => {
                let index = rx_gain_to_code(value);
                let set = rx_gain_setter::<M>(chain);
                ad.call(|api, device| set(api, device, index))?;
                Ok(rx_code_to_gain(index))
            }
            Direction::TX => {
                let atten = tx_gain_to_atten_code(value);
                let set = tx_atten_setter::<M>(chain);
                ad.call(|api, device| set(api, device, atten))?;
                Ok(tx_atten_code_to_gain(atten))
            }
        })
    }

    pub fn get_gain(&mut self, direction: Direction, chain: Chain) -> Result<f64> {
        match direction {
            Direction::RX => {
                let get = rx_gain_getter::<M>(chain);
                Ok(rx_code_to_gain(self.call(get)?))
            }
            Direction::TX => {
                let get = tx_atten_getter::<M>(chain);
                Ok(tx_atten_code_to_gain(self.call(get)?))
            }
        }
    }

    /// Panics on TX, which has no gain control modes.
    pub fn set_agc_mode(&mut self, direction: Direction, mode: AgcMode) -> Result<()> {
        assert_eq!(direction, Direction::RX, "AGC mode can only be set on RX");
        let mode = GainMode::from(mode);
        self.configure(|ad| ad.call(|api, device| api.set_rx_gain_control_mode(device, mode)))
    }

    pub fn get_freq(&mut self, direction: Direction) -> Result<f64> {
        let (pll, _) = rf_pll(direction);
        // The API only reports whole Hz
        let hz = self.call(|api, device| api.get_rf_pll_frequency(device, pll))?;
        Ok(hz as f64)
    }

    fn check_pll_lock(&mut self, plls: PllSynth) -> Result<bool> {
        let status = self.call(M::check_plls_lock_status)?;
        Ok(status.contains(plls))
    }

    /// True if every PLL in `plls` is locked. With `wait_for_lock`, keeps
    /// checking for up to PLL_LOCK_TIMEOUT, then makes one last check.
    pub fn get_pll_lock_status(&mut self, plls: PllSynth, wait_for_lock: bool) -> Result<bool> {
        if !wait_for_lock {
            return self.check_pll_lock(plls);
        }

        let deadline = Instant::now() + PLL_LOCK_TIMEOUT;
        let mut locked = false;
        while !locked && Instant::now() < deadline {
            locked = self.check_pll_lock(plls)?;
            if !locked {
                thread::yield_now();
            }
        }

        if !locked {
            // last chance
            locked = self.check_pll_lock(plls)?;
            if !locked {
                warn!("PLLs {:?} did not lock within {:?}", plls, PLL_LOCK_TIMEOUT);
            }
        }
        Ok(locked)
    }

    /// FIR taps are shared by both chains of a direction. They are only
    /// stored, the device picks them up the next time it is initialized.
    pub fn set_fir(&mut self, direction: Direction, _chain: Chain, gain: i8, coefficients: Vec<i16>) {
        let fir = &mut self.device.path_mut(direction).fir;
        fir.gain = gain;
        fir.coefficients = coefficients;
    }

    pub fn get_fir(&self, direction: Direction, _chain: Chain) -> &Fir {
        &self.device.path(direction).fir
    }

    /* Gain control pins */

    fn apply_gain_pins(&mut self, direction: Direction, chain: Chain) -> Result<()> {
        let chan = *self.gain_pins.get(direction, chain);

        if direction == Direction::TX {
            assert_eq!(
                chan.inc_step, chan.dec_step,
                "TX gain pins do not support different increment and decrement steps"
            );
        }

        self.configure(|ad| match direction {
            Direction::RX => {
                let set = rx_pin_setter::<M>(chain);
                ad.call_gpio(|api, device| {
                    set(api, device, chan.inc_step, chan.dec_step, chan.inc_pin, chan.dec_pin, chan.enable)
                })
            }
            Direction::TX => {
                let set = tx_pin_setter::<M>(chain);
                ad.call_gpio(|api, device| {
                    set(api, device, chan.inc_step, chan.inc_pin, chan.dec_pin, chan.enable)
                })
            }
        })
    }

    /// Steps are in dB of gain, for TX they must be equal.
    pub fn set_gain_pin_step_sizes(
        &mut self,
        direction: Direction,
        chain: Chain,
        inc_step: f64,
        dec_step: f64,
    ) -> Result<()> {
        self.gain_pins.set_step_sizes(direction, chain, inc_step, dec_step);
        self.apply_gain_pins(direction, chain)
    }

    pub fn set_enable_gain_pins(&mut self, direction: Direction, chain: Chain, enable: bool) -> Result<()> {
        self.gain_pins.set_enabled(direction, chain, enable);
        self.apply_gain_pins(direction, chain)
    }
}
