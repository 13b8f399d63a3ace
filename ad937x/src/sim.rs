//! A simulated AD937x behind the Mykonos API.
//!
//! Records every call made through it and answers from plain fields that can
//! be set up before (or between) calls. Any vendor function can be made to
//! fail with `fail`.
use crate::api::*;
use crate::Chain;

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Initialize,
    InitArm,
    LoadArmFromBinary(usize),
    EnableMultichipSync(bool),
    /// Carries the device clock the device structure held at the call
    InitDigitalClocks(u32),
    GetProductId,
    GetDeviceRev,
    GetApiVersion,
    GetArmVersion,
    GetRadioState,
    RadioOn,
    RadioOff,
    SetRfPllFrequency(RfPll, u64),
    GetRfPllFrequency(RfPll),
    CheckPllsLockStatus,
    SetRxManualGain(Chain, u8),
    GetRxGain(Chain),
    SetTxAttenuation(Chain, u16),
    GetTxAttenuation(Chain),
    SetRxGainControlMode(GainMode),
    RunInitCals(InitCals),
    WaitInitCals(u32),
    EnableTrackingCals(TrackingCals),
    EnableSysrefToRxFramer(bool),
    EnableSysrefToDeframer(bool),
    ResetDeframer,
    ReadRxFramerStatus,
    ReadDeframerStatus,
    Jesd204bIlasCheck,
    SetRxFramerDataSource(FramerDataSource),
    SetupGpio,
    SetRxGainCtrlPin {
        chain: Chain,
        inc_step: u8,
        dec_step: u8,
        inc_pin: GpioPin,
        dec_pin: GpioPin,
        enable: bool,
    },
    SetTxAttenCtrlPin {
        chain: Chain,
        step: u8,
        inc_pin: GpioPin,
        dec_pin: GpioPin,
        enable: bool,
    },
    ReadTempSensor,
}

impl Call {
    /// Name of the vendor function
    #[rustfmt::skip]
    pub fn name(&self) -> &'static str {
        match self {
            Call::Initialize                 => "MYKONOS_initialize",
            Call::InitArm                    => "MYKONOS_initArm",
            Call::LoadArmFromBinary(_)       => "MYKONOS_loadArmFromBinary",
            Call::EnableMultichipSync(_)     => "MYKONOS_enableMultichipSync",
            Call::InitDigitalClocks(_)       => "MYKONOS_initDigitalClocks",
            Call::GetProductId               => "MYKONOS_getProductId",
            Call::GetDeviceRev               => "MYKONOS_getDeviceRev",
            Call::GetApiVersion              => "MYKONOS_getApiVersion",
            Call::GetArmVersion              => "MYKONOS_getArmVersion",
            Call::GetRadioState              => "MYKONOS_getRadioState",
            Call::RadioOn                    => "MYKONOS_radioOn",
            Call::RadioOff                   => "MYKONOS_radioOff",
            Call::SetRfPllFrequency(..)      => "MYKONOS_setRfPllFrequency",
            Call::GetRfPllFrequency(_)       => "MYKONOS_getRfPllFrequency",
            Call::CheckPllsLockStatus        => "MYKONOS_checkPllsLockStatus",
            Call::SetRxManualGain(Chain::One, _) => "MYKONOS_setRx1ManualGain",
            Call::SetRxManualGain(Chain::Two, _) => "MYKONOS_setRx2ManualGain",
            Call::GetRxGain(Chain::One)      => "MYKONOS_getRx1Gain",
            Call::GetRxGain(Chain::Two)      => "MYKONOS_getRx2Gain",
            Call::SetTxAttenuation(Chain::One, _) => "MYKONOS_setTx1Attenuation",
            Call::SetTxAttenuation(Chain::Two, _) => "MYKONOS_setTx2Attenuation",
            Call::GetTxAttenuation(Chain::One) => "MYKONOS_getTx1Attenuation",
            Call::GetTxAttenuation(Chain::Two) => "MYKONOS_getTx2Attenuation",
            Call::SetRxGainControlMode(_)    => "MYKONOS_setRxGainControlMode",
            Call::RunInitCals(_)             => "MYKONOS_runInitCals",
            Call::WaitInitCals(_)            => "MYKONOS_waitInitCals",
            Call::EnableTrackingCals(_)      => "MYKONOS_enableTrackingCals",
            Call::EnableSysrefToRxFramer(_)  => "MYKONOS_enableSysrefToRxFramer",
            Call::EnableSysrefToDeframer(_)  => "MYKONOS_enableSysrefToDeframer",
            Call::ResetDeframer              => "MYKONOS_resetDeframer",
            Call::ReadRxFramerStatus         => "MYKONOS_readRxFramerStatus",
            Call::ReadDeframerStatus         => "MYKONOS_readDeframerStatus",
            Call::Jesd204bIlasCheck          => "MYKONOS_jesd204bIlasCheck",
            Call::SetRxFramerDataSource(_)   => "MYKONOS_setRxFramerDataSource",
            Call::SetupGpio                  => "MYKONOS_setupGpio",
            Call::SetRxGainCtrlPin { chain: Chain::One, .. } => "MYKONOS_setRx1GainCtrlPin",
            Call::SetRxGainCtrlPin { chain: Chain::Two, .. } => "MYKONOS_setRx2GainCtrlPin",
            Call::SetTxAttenCtrlPin { chain: Chain::One, .. } => "MYKONOS_setTx1AttenCtrlPin",
            Call::SetTxAttenCtrlPin { chain: Chain::Two, .. } => "MYKONOS_setTx2AttenCtrlPin",
            Call::ReadTempSensor             => "MYKONOS_readTempSensor",
        }
    }
}

fn chain_index(chain: Chain) -> usize {
    match chain {
        Chain::One => 0,
        Chain::Two => 1,
    }
}

pub struct SimChip {
    pub calls: Vec<Call>,

    pub product_id: u8,
    pub device_rev: u8,
    pub api_version: ApiVersion,
    pub arm_version: ArmVersion,
    pub mcs_status: u8,
    /// Reported by MYKONOS_checkPllsLockStatus
    pub locked: PllSynth,
    pub radio_on: bool,
    /// Overrides the status derived from `radio_on`
    pub radio_status: Option<RadioStatus>,
    pub cal_status: CalStatus,
    pub framer_status: u8,
    pub deframer_status: u8,
    pub ilas_match: u16,
    pub temperature: TempSensorStatus,

    pub rf_pll_hz: [u64; 4],
    pub rx_gain: [u8; 2],
    pub tx_atten: [u16; 2],

    failures: Vec<(&'static str, u32)>,
}

impl Default for SimChip {
    fn default() -> Self {
        Self::new()
    }
}

impl SimChip {
    pub fn new() -> Self {
        SimChip {
            calls: Vec::new(),
            product_id: 0x3,
            device_rev: 0x2,
            api_version: ApiVersion {
                silicon: 5,
                major: 1,
                minor: 3,
                build: 3546,
            },
            arm_version: ArmVersion {
                major: 5,
                minor: 2,
                rc: 0,
            },
            mcs_status: 0x0A,
            locked: PllSynth::all(),
            radio_on: false,
            radio_status: None,
            cal_status: CalStatus::default(),
            framer_status: 0x3E,
            deframer_status: 0x28,
            ilas_match: 0xFFFF,
            temperature: TempSensorStatus {
                temp_code: 35,
                avg_mask: 0,
                code_valid: true,
                temp_valid: true,
            },
            rf_pll_hz: [0; 4],
            rx_gain: [195; 2],
            tx_atten: [0; 2],
            failures: Vec::new(),
        }
    }

    /// Makes every later call to the named vendor function fail with `code`.
    pub fn fail(&mut self, name: &'static str, code: u32) -> &mut Self {
        self.failures.push((name, code));
        self
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls.iter().filter(|c| c.name() == name).count()
    }

    fn record(&mut self, call: Call) -> std::result::Result<(), u32> {
        let name = call.name();
        self.calls.push(call);
        match self.failures.iter().find(|(n, _)| *n == name) {
            Some(&(_, code)) => Err(code),
            None => Ok(()),
        }
    }

    fn api(&mut self, call: Call) -> ApiResult<()> {
        self.record(call).map_err(ApiStatus)
    }

    fn gpio(&mut self, call: Call) -> GpioResult<()> {
        self.record(call).map_err(GpioStatus)
    }
}

impl Mykonos for SimChip {
    fn error_message(&self, status: ApiStatus) -> String {
        format!("simulated Mykonos error {}", status.0)
    }

    fn gpio_error_message(&self, status: GpioStatus) -> String {
        format!("simulated Mykonos GPIO error {}", status.0)
    }

    fn initialize(&mut self, _device: &mut Device) -> ApiResult<()> {
        self.api(Call::Initialize)
    }

    fn init_arm(&mut self, _device: &mut Device) -> ApiResult<()> {
        self.api(Call::InitArm)
    }

    fn load_arm_from_binary(&mut self, _device: &mut Device, binary: &[u8]) -> ApiResult<()> {
        self.api(Call::LoadArmFromBinary(binary.len()))
    }

    fn enable_multichip_sync(&mut self, _device: &mut Device, enable: bool) -> ApiResult<u8> {
        self.api(Call::EnableMultichipSync(enable))?;
        Ok(self.mcs_status)
    }

    fn init_digital_clocks(&mut self, device: &mut Device) -> ApiResult<()> {
        self.api(Call::InitDigitalClocks(device.clocks.device_clock_khz))
    }

    fn get_product_id(&mut self, _device: &mut Device) -> ApiResult<u8> {
        self.api(Call::GetProductId)?;
        Ok(self.product_id)
    }

    fn get_device_rev(&mut self, _device: &mut Device) -> ApiResult<u8> {
        self.api(Call::GetDeviceRev)?;
        Ok(self.device_rev)
    }

    fn get_api_version(&mut self, _device: &mut Device) -> ApiResult<ApiVersion> {
        self.api(Call::GetApiVersion)?;
        Ok(self.api_version)
    }

    fn get_arm_version(&mut self, _device: &mut Device) -> ApiResult<ArmVersion> {
        self.api(Call::GetArmVersion)?;
        Ok(self.arm_version)
    }

    fn get_radio_state(&mut self, _device: &mut Device) -> ApiResult<RadioStatus> {
        self.api(Call::GetRadioState)?;
        Ok(match (self.radio_status, self.radio_on) {
            (Some(status), _) => status,
            (None, true) => RadioStatus::RX_ON | RadioStatus::TX_ON,
            (None, false) => RadioStatus::empty(),
        })
    }

    fn radio_on(&mut self, _device: &mut Device) -> ApiResult<()> {
        self.api(Call::RadioOn)?;
        self.radio_on = true;
        Ok(())
    }

    fn radio_off(&mut self, _device: &mut Device) -> ApiResult<()> {
        self.api(Call::RadioOff)?;
        self.radio_on = false;
        Ok(())
    }

    fn set_rf_pll_frequency(&mut self, _device: &mut Device, pll: RfPll, hz: u64) -> ApiResult<()> {
        self.api(Call::SetRfPllFrequency(pll, hz))?;
        self.rf_pll_hz[usize::from(u8::from(pll))] = hz;
        Ok(())
    }

    fn get_rf_pll_frequency(&mut self, _device: &mut Device, pll: RfPll) -> ApiResult<u64> {
        self.api(Call::GetRfPllFrequency(pll))?;
        Ok(self.rf_pll_hz[usize::from(u8::from(pll))])
    }

    fn check_plls_lock_status(&mut self, _device: &mut Device) -> ApiResult<PllSynth> {
        self.api(Call::CheckPllsLockStatus)?;
        Ok(self.locked)
    }

    fn set_rx1_manual_gain(&mut self, _device: &mut Device, index: u8) -> ApiResult<()> {
        self.api(Call::SetRxManualGain(Chain::One, index))?;
        self.rx_gain[chain_index(Chain::One)] = index;
        Ok(())
    }

    fn set_rx2_manual_gain(&mut self, _device: &mut Device, index: u8) -> ApiResult<()> {
        self.api(Call::SetRxManualGain(Chain::Two, index))?;
        self.rx_gain[chain_index(Chain::Two)] = index;
        Ok(())
    }

    fn get_rx1_gain(&mut self, _device: &mut Device) -> ApiResult<u8> {
        self.api(Call::GetRxGain(Chain::One))?;
        Ok(self.rx_gain[chain_index(Chain::One)])
    }

    fn get_rx2_gain(&mut self, _device: &mut Device) -> ApiResult<u8> {
        self.api(Call::GetRxGain(Chain::Two))?;
        Ok(self.rx_gain[chain_index(Chain::Two)])
    }

    fn set_tx1_attenuation(&mut self, _device: &mut Device, mdb: u16) -> ApiResult<()> {
        self.api(Call::SetTxAttenuation(Chain::One, mdb))?;
        self.tx_atten[chain_index(Chain::One)] = mdb;
        Ok(())
    }

    fn set_tx2_attenuation(&mut self, _device: &mut Device, mdb: u16) -> ApiResult<()> {
        self.api(Call::SetTxAttenuation(Chain::Two, mdb))?;
        self.tx_atten[chain_index(Chain::Two)] = mdb;
        Ok(())
    }

    fn get_tx1_attenuation(&mut self, _device: &mut Device) -> ApiResult<u16> {
        self.api(Call::GetTxAttenuation(Chain::One))?;
        Ok(self.tx_atten[chain_index(Chain::One)])
    }

    fn get_tx2_attenuation(&mut self, _device: &mut Device) -> ApiResult<u16> {
        self.api(Call::GetTxAttenuation(Chain::Two))?;
        Ok(self.tx_atten[chain_index(Chain::Two)])
    }

    fn set_rx_gain_control_mode(&mut self, _device: &mut Device, mode: GainMode) -> ApiResult<()> {
        self.api(Call::SetRxGainControlMode(mode))
    }

    fn run_init_cals(&mut self, _device: &mut Device, cals: InitCals) -> ApiResult<()> {
        self.api(Call::RunInitCals(cals))
    }

    fn wait_init_cals(&mut self, _device: &mut Device, timeout_ms: u32) -> ApiResult<CalStatus> {
        self.api(Call::WaitInitCals(timeout_ms))?;
        Ok(self.cal_status)
    }

    fn enable_tracking_cals(&mut self, _device: &mut Device, cals: TrackingCals) -> ApiResult<()> {
        self.api(Call::EnableTrackingCals(cals))
    }

    fn enable_sysref_to_rx_framer(&mut self, _device: &mut Device, enable: bool) -> ApiResult<()> {
        self.api(Call::EnableSysrefToRxFramer(enable))
    }

    fn enable_sysref_to_deframer(&mut self, _device: &mut Device, enable: bool) -> ApiResult<()> {
        self.api(Call::EnableSysrefToDeframer(enable))
    }

    fn reset_deframer(&mut self, _device: &mut Device) -> ApiResult<()> {
        self.api(Call::ResetDeframer)
    }

    fn read_rx_framer_status(&mut self, _device: &mut Device) -> ApiResult<u8> {
        self.api(Call::ReadRxFramerStatus)?;
        Ok(self.framer_status)
    }

    fn read_deframer_status(&mut self, _device: &mut Device) -> ApiResult<u8> {
        self.api(Call::ReadDeframerStatus)?;
        Ok(self.deframer_status)
    }

    fn jesd204b_ilas_check(&mut self, _device: &mut Device) -> ApiResult<u16> {
        self.api(Call::Jesd204bIlasCheck)?;
        Ok(self.ilas_match)
    }

    fn set_rx_framer_data_source(
        &mut self,
        _device: &mut Device,
        source: FramerDataSource,
    ) -> ApiResult<()> {
        self.api(Call::SetRxFramerDataSource(source))
    }

    fn setup_gpio(&mut self, _device: &mut Device) -> GpioResult<()> {
        self.gpio(Call::SetupGpio)
    }

    fn set_rx1_gain_ctrl_pin(
        &mut self,
        _device: &mut Device,
        inc_step: u8,
        dec_step: u8,
        inc_pin: GpioPin,
        dec_pin: GpioPin,
        enable: bool,
    ) -> GpioResult<()> {
        self.gpio(Call::SetRxGainCtrlPin {
            chain: Chain::One,
            inc_step,
            dec_step,
            inc_pin,
            dec_pin,
            enable,
        })
    }

    fn set_rx2_gain_ctrl_pin(
        &mut self,
        _device: &mut Device,
        inc_step: u8,
        dec_step: u8,
        inc_pin: GpioPin,
        dec_pin: GpioPin,
        enable: bool,
    ) -> GpioResult<()> {
        self.gpio(Call::SetRxGainCtrlPin {
            chain: Chain::Two,
            inc_step,
            dec_step,
            inc_pin,
            dec_pin,
            enable,
        })
    }

    fn set_tx1_atten_ctrl_pin(
        &mut self,
        _device: &mut Device,
        step: u8,
        inc_pin: GpioPin,
        dec_pin: GpioPin,
        enable: bool,
        _use_tx1_for_tx2: bool,
    ) -> GpioResult<()> {
        self.gpio(Call::SetTxAttenCtrlPin {
            chain: Chain::One,
            step,
            inc_pin,
            dec_pin,
            enable,
        })
    }

    fn set_tx2_atten_ctrl_pin(
        &mut self,
        _device: &mut Device,
        step: u8,
        inc_pin: GpioPin,
        dec_pin: GpioPin,
        enable: bool,
    ) -> GpioResult<()> {
        self.gpio(Call::SetTxAttenCtrlPin {
            chain: Chain::Two,
            step,
            inc_pin,
            dec_pin,
            enable,
        })
    }

    fn read_temp_sensor(&mut self, _device: &mut Device) -> GpioResult<TempSensorStatus> {
        self.gpio(Call::ReadTempSensor)?;
        Ok(self.temperature)
    }
}
