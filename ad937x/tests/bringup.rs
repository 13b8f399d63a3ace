use ad937x::api::{GpioPin, InitCals, PllSynth, RfPll, TrackingCals};
use ad937x::config::{GainPinChannel, GainPins};
use ad937x::device::{INIT_CAL_TIMEOUT_MS, PLL_LOCK_TIMEOUT};
use ad937x::firmware::ARM_BINARY_SIZE;
use ad937x::sim::{Call, SimChip};
use ad937x::{Ad937x, Chain, Direction, Error};
use itertools::iproduct;
use std::{
    env, fs,
    panic::{catch_unwind, AssertUnwindSafe},
    path::{Path, PathBuf},
    process,
    time::Instant,
};

const PINS: GainPins = GainPins {
    rx1: GainPinChannel::new(GpioPin(0), GpioPin(1)),
    rx2: GainPinChannel::new(GpioPin(3), GpioPin(4)),
    tx1: GainPinChannel::new(GpioPin(6), GpioPin(7)),
    tx2: GainPinChannel::new(GpioPin(8), GpioPin(9)),
};

fn firmware(name: &str, len: usize) -> PathBuf {
    let path = env::temp_dir().join(format!("ad937x-{}-{}.bin", name, process::id()));
    fs::write(&path, vec![0x5A; len]).unwrap();
    path
}

fn radio(firmware: &Path) -> Ad937x<SimChip> {
    Ad937x::new(SimChip::new(), PINS).with_firmware(firmware)
}

#[test]
fn full_bringup() {
    let path = firmware("full", ARM_BINARY_SIZE);
    let mut ad = radio(&path);

    ad.begin_initialization().unwrap();
    ad.finish_initialization().unwrap();

    let sim = ad.api();
    assert!(sim.calls.contains(&Call::LoadArmFromBinary(ARM_BINARY_SIZE)));
    assert!(sim.calls.contains(&Call::SetRfPllFrequency(RfPll::Rx, 2_500_000_000)));
    assert!(sim.calls.contains(&Call::SetRfPllFrequency(RfPll::Tx, 2_500_000_000)));
    assert_eq!(sim.count("MYKONOS_setRx1GainCtrlPin"), 1);
    assert_eq!(sim.count("MYKONOS_setRx2GainCtrlPin"), 1);
    assert_eq!(sim.count("MYKONOS_setTx1AttenCtrlPin"), 1);
    assert_eq!(sim.count("MYKONOS_setTx2AttenCtrlPin"), 1);
    assert_eq!(sim.count("MYKONOS_setupGpio"), 1);

    // calibrations are the last thing to happen
    let n = sim.calls.len();
    assert_eq!(
        sim.calls[n - 3..],
        [
            Call::RunInitCals(InitCals::from_bits_truncate(0x4F)),
            Call::WaitInitCals(INIT_CAL_TIMEOUT_MS),
            Call::EnableTrackingCals(TrackingCals::empty()),
        ]
    );
    assert!(!sim.radio_on);

    assert_eq!(ad.get_freq(Direction::RX).unwrap(), 2.5e9);
    assert_eq!(ad.get_freq(Direction::TX).unwrap(), 2.5e9);
    assert_eq!(ad.device().rx.pll_lo_frequency_hz, 2_500_000_000);
    assert_eq!(ad.device().tx.pll_lo_frequency_hz, 2_500_000_000);
    for (direction, chain) in iproduct!([Direction::RX, Direction::TX], [Chain::One, Chain::Two]) {
        assert_eq!(ad.get_gain(direction, chain).unwrap(), 0.0, "{:?} {:?}", direction, chain);
    }

    ad.start_jesd_rx().unwrap();
    ad.start_jesd_tx().unwrap();
    ad.start_radio().unwrap();
    assert!(ad.api().radio_on);

    fs::remove_file(path).unwrap();
}

#[test]
fn mcs_checked_before_firmware() {
    let path = firmware("mcs", ARM_BINARY_SIZE);
    let mut ad = radio(&path);
    ad.begin_initialization().unwrap();
    ad.api_mut().mcs_status = 0x02;

    match ad.finish_initialization() {
        Err(Error::SyncMismatch { read: 0x02, expected: 0x0A }) => {}
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(ad.api().count("MYKONOS_initArm"), 0);
    fs::remove_file(path).unwrap();
}

#[test]
fn short_firmware() {
    let path = firmware("short", ARM_BINARY_SIZE / 2);
    let mut ad = radio(&path);
    ad.begin_initialization().unwrap();

    match ad.finish_initialization() {
        Err(Error::Firmware { path: p, .. }) => assert_eq!(p, path),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(ad.api().count("MYKONOS_loadArmFromBinary"), 0);
    assert_eq!(ad.api().count("MYKONOS_setRfPllFrequency"), 0);
    fs::remove_file(path).unwrap();
}

#[test]
fn missing_firmware() {
    let mut ad = radio(&env::temp_dir().join("ad937x-missing-firmware.bin"));
    ad.begin_initialization().unwrap();
    assert!(matches!(ad.finish_initialization(), Err(Error::Firmware { .. })));
}

#[test]
fn init_cal_failure() {
    let path = firmware("cal", ARM_BINARY_SIZE);
    let mut ad = radio(&path);
    ad.api_mut().cal_status.flag = 1;
    ad.api_mut().cal_status.code = 0x12;
    ad.begin_initialization().unwrap();

    match ad.finish_initialization() {
        Err(Error::Calibration { flag: 1, code: 0x12 }) => {}
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(ad.api().count("MYKONOS_enableTrackingCals"), 0);
    fs::remove_file(path).unwrap();
}

#[test]
fn plls_unlocked_after_tuning() {
    let path = firmware("unlocked", ARM_BINARY_SIZE);
    let mut ad = radio(&path);
    ad.begin_initialization().unwrap();
    ad.api_mut().locked = PllSynth::CLK_SYNTH | PllSynth::RX_SYNTH | PllSynth::TX_SYNTH;

    match ad.finish_initialization() {
        Err(Error::PllLock(plls)) => assert_eq!(plls, PllSynth::all()),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(ad.api().count("MYKONOS_setupGpio"), 0);
    fs::remove_file(path).unwrap();
}

#[test]
fn lock_wait_times_out() {
    let mut ad = Ad937x::new(SimChip::new(), PINS);
    ad.api_mut().locked = PllSynth::CLK_SYNTH;

    let start = Instant::now();
    let locked = ad.get_pll_lock_status(PllSynth::RX_SYNTH, true).unwrap();
    assert!(!locked);
    assert!(start.elapsed() >= PLL_LOCK_TIMEOUT);
    // at least one check in the loop and the final one
    assert!(ad.api().count("MYKONOS_checkPllsLockStatus") >= 2);
}

#[test]
fn lock_mask_requires_all() {
    let mut ad = Ad937x::new(SimChip::new(), PINS);
    ad.api_mut().locked = PllSynth::CLK_SYNTH | PllSynth::TX_SYNTH;
    assert!(ad.get_pll_lock_status(PllSynth::CLK_SYNTH, false).unwrap());
    assert!(ad.get_pll_lock_status(PllSynth::CLK_SYNTH | PllSynth::TX_SYNTH, false).unwrap());
    assert!(!ad.get_pll_lock_status(PllSynth::CLK_SYNTH | PllSynth::RX_SYNTH, false).unwrap());
    assert_eq!(ad.api().count("MYKONOS_checkPllsLockStatus"), 3);
}

#[test]
fn lock_wait_returns_once_locked() {
    let mut ad = Ad937x::new(SimChip::new(), PINS);
    let start = Instant::now();
    assert!(ad.get_pll_lock_status(PllSynth::all(), true).unwrap());
    assert!(start.elapsed() < PLL_LOCK_TIMEOUT);
    assert_eq!(ad.api().count("MYKONOS_checkPllsLockStatus"), 1);
}

#[test]
fn tx_step_mismatch_is_fatal() {
    let mut ad = Ad937x::new(SimChip::new(), PINS);
    let result = catch_unwind(AssertUnwindSafe(|| {
        ad.set_gain_pin_step_sizes(Direction::TX, Chain::One, 0.1, 0.5)
    }));
    assert!(result.is_err());
    assert!(ad.api().calls.is_empty());
}

#[test]
fn gain_pins_reapplied() {
    let mut ad = Ad937x::new(SimChip::new(), PINS);
    ad.api_mut().radio_on = true;

    ad.set_gain_pin_step_sizes(Direction::TX, Chain::Two, 0.25, 0.25).unwrap();
    ad.set_enable_gain_pins(Direction::TX, Chain::Two, true).unwrap();
    ad.set_gain_pin_step_sizes(Direction::RX, Chain::One, 1.0, 2.0).unwrap();

    let calls = &ad.api().calls;
    assert!(calls.contains(&Call::SetTxAttenCtrlPin {
        chain: Chain::Two,
        step: 5,
        inc_pin: GpioPin(8),
        dec_pin: GpioPin(9),
        enable: true,
    }));
    assert_eq!(
        calls.last(),
        Some(&Call::RadioOn),
        "radio restored after applying pins"
    );
    assert!(calls.contains(&Call::SetRxGainCtrlPin {
        chain: Chain::One,
        inc_step: 2,
        dec_step: 4,
        inc_pin: GpioPin(0),
        dec_pin: GpioPin(1),
        enable: false,
    }));
    assert_eq!(ad.api().count("MYKONOS_radioOff"), 3);
    assert_eq!(ad.api().count("MYKONOS_radioOn"), 3);
    assert_eq!(ad.gain_pins().tx2.inc_step, 5);
}

#[test]
fn jesd_rx_sequence() {
    let mut ad = Ad937x::new(SimChip::new(), PINS);
    ad.start_jesd_rx().unwrap();
    ad.start_jesd_tx().unwrap();
    assert_eq!(
        ad.api().calls,
        vec![
            Call::EnableSysrefToDeframer(false),
            Call::ResetDeframer,
            Call::EnableSysrefToDeframer(true),
            Call::EnableSysrefToRxFramer(true),
        ]
    );
}

#[test]
fn vendor_errors_translated() {
    let mut ad = Ad937x::new(SimChip::new(), PINS);
    ad.api_mut()
        .fail("MYKONOS_resetDeframer", 7)
        .fail("MYKONOS_readTempSensor", 3);

    match ad.start_jesd_rx() {
        Err(Error::Chip { code: 7, message }) => {
            assert_eq!(message, "simulated Mykonos error 7")
        }
        other => panic!("unexpected {:?}", other),
    }
    // no retry, nothing after the failure
    assert_eq!(ad.api().calls.last(), Some(&Call::ResetDeframer));

    match ad.get_temperature() {
        Err(Error::Gpio { code: 3, message }) => {
            assert_eq!(message, "simulated Mykonos GPIO error 3")
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn status_getters() {
    let mut ad = Ad937x::new(SimChip::new(), PINS);
    ad.api_mut().mcs_status = 0x0B;
    assert_eq!(ad.get_multichip_sync_status().unwrap(), 0x0B);
    assert_eq!(ad.get_framer_status().unwrap(), ad.api().framer_status);
    assert_eq!(ad.get_deframer_status().unwrap(), ad.api().deframer_status);
    assert_eq!(ad.get_ilas_config_match().unwrap(), 0xFFFF);
    assert_eq!(ad.get_product_id().unwrap(), 0x3);
    assert_eq!(ad.get_temperature().unwrap(), 35);
    // status reads never touch the radio state
    assert_eq!(ad.api().count("MYKONOS_getRadioState"), 0);
}

#[test]
fn from_config() {
    let config = ad937x::Config::from_toml_str(
        r#"
        firmware = "/tmp/mykonos.bin"
        device_clock_hz = 153600000.9

        [gain_pins]
        rx1 = { inc = 0, dec = 1, inc_step = 2 }
        rx2 = { inc = 3, dec = 4 }
        tx1 = { inc = 6, dec = 7 }
        tx2 = { inc = 8, dec = 9, inc_step = 4, dec_step = 4, enable = true }
        "#,
    )
    .unwrap();

    let mut ad = Ad937x::from_config(SimChip::new(), &config).unwrap();
    assert_eq!(ad.firmware(), Path::new("/tmp/mykonos.bin"));
    assert_eq!(ad.device().clocks.device_clock_khz, 153_600);
    assert_eq!(ad.gain_pins().rx1.inc_step, 2);
    assert!(ad.gain_pins().tx2.enable);

    ad.set_enable_gain_pins(Direction::TX, Chain::Two, false).unwrap();
    assert_eq!(
        ad.api().calls.last(),
        Some(&Call::SetTxAttenCtrlPin {
            chain: Chain::Two,
            step: 4,
            inc_pin: GpioPin(8),
            dec_pin: GpioPin(9),
            enable: false,
        })
    );
}

#[test]
fn from_config_rejects_tx_mismatch() {
    let mut pins = PINS;
    pins.tx1.inc_step = 3;
    let config = ad937x::Config {
        firmware: None,
        device_clock_hz: None,
        gain_pins: pins,
    };
    assert!(matches!(
        Ad937x::from_config(SimChip::new(), &config),
        Err(Error::InvalidConfig(_))
    ));
}
