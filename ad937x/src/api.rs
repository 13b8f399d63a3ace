/* Vendor API boundary
 *
 * Everything the Mykonos API exposes that this crate needs. Implementations
 * wrap the vendor C library (or simulate it, see `sim`). Every call returns
 * either the requested value or the non-OK status code the vendor reported;
 * translating those into `crate::Error` is the caller's job.
 * */
use bitflags::bitflags;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Direction;

/// mykonosErr_t
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ApiStatus(pub u32);

/// mykonosGpioErr_t
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GpioStatus(pub u32);

pub type ApiResult<T> = std::result::Result<T, ApiStatus>;
pub type GpioResult<T> = std::result::Result<T, GpioStatus>;

impl ApiStatus {
    pub const OK: ApiStatus = ApiStatus(0);

    pub fn check(self) -> ApiResult<()> {
        if self == Self::OK {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl GpioStatus {
    pub const OK: GpioStatus = GpioStatus(0);

    pub fn check(self) -> GpioResult<()> {
        if self == Self::OK {
            Ok(())
        } else {
            Err(self)
        }
    }
}

bitflags! {
    /// PLL lock status bits, also used as a mask of PLLs to check.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PllSynth: u8 {
        const CLK_SYNTH   = 0x01;
        const RX_SYNTH    = 0x02;
        const TX_SYNTH    = 0x04;
        const SNIFF_SYNTH = 0x08;
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct RadioStatus: u32 {
        const RX_ON = 0x01;
        const TX_ON = 0x02;
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct InitCals: u32 {
        const TX_BB_FILTER            = 0x0000_0001;
        const ADC_TUNER               = 0x0000_0002;
        const TIA_3DB_CORNER          = 0x0000_0004;
        const DC_OFFSET               = 0x0000_0008;
        const TX_ATTENUATION_DELAY    = 0x0000_0010;
        const RX_GAIN_DELAY           = 0x0000_0020;
        const FLASH_CAL               = 0x0000_0040;
        const PATH_DELAY              = 0x0000_0080;
        const TX_LO_LEAKAGE_INTERNAL  = 0x0000_0100;
        const TX_LO_LEAKAGE_EXTERNAL  = 0x0000_0200;
        const TX_QEC_INIT             = 0x0000_0400;
        const LOOPBACK_RX_LO_DELAY    = 0x0000_0800;
        const LOOPBACK_RX_RX_QEC_INIT = 0x0000_1000;
        const RX_LO_DELAY             = 0x0000_2000;
        const RX_QEC_INIT             = 0x0000_4000;
        const DPD_INIT                = 0x0000_8000;
        const CLGC_INIT               = 0x0001_0000;
        const VSWR_INIT               = 0x0002_0000;
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct TrackingCals: u32 {
        const TRACK_RX1_QEC      = 0x0000_0001;
        const TRACK_RX2_QEC      = 0x0000_0002;
        const TRACK_ORX1_QEC     = 0x0000_0004;
        const TRACK_ORX2_QEC     = 0x0000_0008;
        const TRACK_TX1_LOL      = 0x0000_0010;
        const TRACK_TX2_LOL      = 0x0000_0020;
        const TRACK_TX1_QEC      = 0x0000_0040;
        const TRACK_TX2_QEC      = 0x0000_0080;
        const TRACK_TX1_DPD      = 0x0000_0100;
        const TRACK_TX2_DPD      = 0x0000_0200;
        const TRACK_TX1_CLGC     = 0x0000_0400;
        const TRACK_TX2_CLGC     = 0x0000_0800;
        const TRACK_TX1_VSWR     = 0x0000_1000;
        const TRACK_TX2_VSWR     = 0x0000_2000;
        const TRACK_ORX1_QEC_SNLO = 0x0001_0000;
        const TRACK_ORX2_QEC_SNLO = 0x0002_0000;
        const TRACK_SRX_QEC      = 0x0004_0000;
    }
}

/// mykonosRfPllName_t
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
#[rustfmt::skip]
pub enum RfPll {
    Clk     = 0,
    Rx      = 1,
    Tx      = 2,
    Sniffer = 3,
}

/// mykonosGainMode_t
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
#[rustfmt::skip]
pub enum GainMode {
    MGC    = 0,
    AGC    = 2,
    HYBRID = 3,
}

/// Source of the data sent out over the RX framer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
#[rustfmt::skip]
pub enum FramerDataSource {
    ADC      = 0,
    LOOPBACK = 1,
}

/// mykonosGpioSelect_t, by GPIO number
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GpioPin(pub u8);

impl fmt::Display for GpioPin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApiVersion {
    pub silicon: u32,
    pub major: u32,
    pub minor: u32,
    pub build: u32,
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.silicon, self.major, self.minor, self.build)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArmVersion {
    pub major: u8,
    pub minor: u8,
    pub rc: u8,
}

impl fmt::Display for ArmVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.rc)
    }
}

/// mykonosTempSensorStatus_t
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TempSensorStatus {
    pub temp_code: i16,
    pub avg_mask: u8,
    pub code_valid: bool,
    pub temp_valid: bool,
}

/// Error flag and code reported by MYKONOS_waitInitCals
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CalStatus {
    pub flag: u8,
    pub code: u8,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fir {
    pub gain: i8,
    pub coefficients: Vec<i16>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clocks {
    pub device_clock_khz: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignalPath {
    pub pll_lo_frequency_hz: u64,
    pub fir: Fir,
}

/// The vendor device structure. Some API calls (MYKONOS_initDigitalClocks,
/// MYKONOS_initialize) read their settings from here rather than taking
/// parameters, so fields must be written before the call that consumes them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Device {
    pub clocks: Clocks,
    pub rx: SignalPath,
    pub tx: SignalPath,
}

impl Default for Device {
    fn default() -> Self {
        Device {
            clocks: Clocks {
                device_clock_khz: 125_000,
            },
            rx: SignalPath {
                pll_lo_frequency_hz: 2_500_000_000,
                fir: Fir::default(),
            },
            tx: SignalPath {
                pll_lo_frequency_hz: 2_500_000_000,
                fir: Fir::default(),
            },
        }
    }
}

impl Device {
    pub fn path(&self, direction: Direction) -> &SignalPath {
        match direction {
            Direction::RX => &self.rx,
            Direction::TX => &self.tx,
        }
    }

    pub fn path_mut(&mut self, direction: Direction) -> &mut SignalPath {
        match direction {
            Direction::RX => &mut self.rx,
            Direction::TX => &mut self.tx,
        }
    }
}

/// The Mykonos API, one method per vendor function used.
///
/// Methods take the device structure by exclusive reference: the vendor API
/// is not reentrant and all register traffic shares one SPI bus.
pub trait Mykonos {
    fn error_message(&self, status: ApiStatus) -> String;
    fn gpio_error_message(&self, status: GpioStatus) -> String;

    /* Initialization */
    fn initialize(&mut self, device: &mut Device) -> ApiResult<()>;
    fn init_arm(&mut self, device: &mut Device) -> ApiResult<()>;
    fn load_arm_from_binary(&mut self, device: &mut Device, binary: &[u8]) -> ApiResult<()>;
    /// `enable == false` only reads back the status.
    fn enable_multichip_sync(&mut self, device: &mut Device, enable: bool) -> ApiResult<u8>;
    fn init_digital_clocks(&mut self, device: &mut Device) -> ApiResult<()>;

    /* Identification */
    fn get_product_id(&mut self, device: &mut Device) -> ApiResult<u8>;
    fn get_device_rev(&mut self, device: &mut Device) -> ApiResult<u8>;
    fn get_api_version(&mut self, device: &mut Device) -> ApiResult<ApiVersion>;
    fn get_arm_version(&mut self, device: &mut Device) -> ApiResult<ArmVersion>;

    /* Radio state */
    fn get_radio_state(&mut self, device: &mut Device) -> ApiResult<RadioStatus>;
    fn radio_on(&mut self, device: &mut Device) -> ApiResult<()>;
    fn radio_off(&mut self, device: &mut Device) -> ApiResult<()>;

    /* PLLs */
    fn set_rf_pll_frequency(&mut self, device: &mut Device, pll: RfPll, hz: u64) -> ApiResult<()>;
    fn get_rf_pll_frequency(&mut self, device: &mut Device, pll: RfPll) -> ApiResult<u64>;
    fn check_plls_lock_status(&mut self, device: &mut Device) -> ApiResult<PllSynth>;

    /* Gain */
    fn set_rx1_manual_gain(&mut self, device: &mut Device, index: u8) -> ApiResult<()>;
    fn set_rx2_manual_gain(&mut self, device: &mut Device, index: u8) -> ApiResult<()>;
    fn get_rx1_gain(&mut self, device: &mut Device) -> ApiResult<u8>;
    fn get_rx2_gain(&mut self, device: &mut Device) -> ApiResult<u8>;
    fn set_tx1_attenuation(&mut self, device: &mut Device, mdb: u16) -> ApiResult<()>;
    fn set_tx2_attenuation(&mut self, device: &mut Device, mdb: u16) -> ApiResult<()>;
    fn get_tx1_attenuation(&mut self, device: &mut Device) -> ApiResult<u16>;
    fn get_tx2_attenuation(&mut self, device: &mut Device) -> ApiResult<u16>;
    fn set_rx_gain_control_mode(&mut self, device: &mut Device, mode: GainMode) -> ApiResult<()>;

    /* Calibration */
    fn run_init_cals(&mut self, device: &mut Device, cals: InitCals) -> ApiResult<()>;
    fn wait_init_cals(&mut self, device: &mut Device, timeout_ms: u32) -> ApiResult<CalStatus>;
    fn enable_tracking_cals(&mut self, device: &mut Device, cals: TrackingCals) -> ApiResult<()>;

    /* JESD204B */
    fn enable_sysref_to_rx_framer(&mut self, device: &mut Device, enable: bool) -> ApiResult<()>;
    fn enable_sysref_to_deframer(&mut self, device: &mut Device, enable: bool) -> ApiResult<()>;
    fn reset_deframer(&mut self, device: &mut Device) -> ApiResult<()>;
    fn read_rx_framer_status(&mut self, device: &mut Device) -> ApiResult<u8>;
    fn read_deframer_status(&mut self, device: &mut Device) -> ApiResult<u8>;
    fn jesd204b_ilas_check(&mut self, device: &mut Device) -> ApiResult<u16>;
    fn set_rx_framer_data_source(
        &mut self,
        device: &mut Device,
        source: FramerDataSource,
    ) -> ApiResult<()>;

    /* GPIO */
    fn setup_gpio(&mut self, device: &mut Device) -> GpioResult<()>;
    fn set_rx1_gain_ctrl_pin(
        &mut self,
        device: &mut Device,
        inc_step: u8,
        dec_step: u8,
        inc_pin: GpioPin,
        dec_pin: GpioPin,
        enable: bool,
    ) -> GpioResult<()>;
    fn set_rx2_gain_ctrl_pin(
        &mut self,
        device: &mut Device,
        inc_step: u8,
        dec_step: u8,
        inc_pin: GpioPin,
        dec_pin: GpioPin,
        enable: bool,
    ) -> GpioResult<()>;
    fn set_tx1_atten_ctrl_pin(
        &mut self,
        device: &mut Device,
        step: u8,
        inc_pin: GpioPin,
        dec_pin: GpioPin,
        enable: bool,
        use_tx1_for_tx2: bool,
    ) -> GpioResult<()>;
    fn set_tx2_atten_ctrl_pin(
        &mut self,
        device: &mut Device,
        step: u8,
        inc_pin: GpioPin,
        dec_pin: GpioPin,
        enable: bool,
    ) -> GpioResult<()>;
    fn read_temp_sensor(&mut self, device: &mut Device) -> GpioResult<TempSensorStatus>;
}
