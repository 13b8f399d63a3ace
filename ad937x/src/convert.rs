// Conversions between physical units and Mykonos register codes.
use crate::{MAX_TX_GAIN, RX_GAIN_STEP, TX_GAIN_STEP};
#[cfg(test)] use proptest::prelude::*;

// RX gain codes are indices into the gain table programmed at initialization.
// The top 61 entries (195..=255) cover 0..=30 dB in 0.5 dB steps.
// TODO: derive the offset from the loaded gain table
const RX_GAIN_INDEX_OFFSET: f64 = 195.0;

/// Out of range gains saturate to the nearest code; callers are expected to
/// stay within MIN_RX_GAIN..=MAX_RX_GAIN.
pub fn rx_gain_to_code(gain: f64) -> u8 {
    ((gain * 2.0).round() + RX_GAIN_INDEX_OFFSET) as u8
}

pub fn rx_code_to_gain(code: u8) -> f64 {
    (f64::from(code) - RX_GAIN_INDEX_OFFSET) / 2.0
}

/// TX is set as attenuation in mdB, 0..=41950, inverted relative to gain.
pub fn tx_gain_to_atten_code(gain: f64) -> u16 {
    ((MAX_TX_GAIN - gain) * 1e3).round() as u16
}

pub fn tx_atten_code_to_gain(code: u16) -> f64 {
    MAX_TX_GAIN - f64::from(code) / 1e3
}

pub fn clock_rate_to_khz(hz: f64) -> u32 {
    (hz / 1e3) as u32
}

/// Gain pin step in dB to a count of RX_GAIN_STEP
pub fn rx_step_to_code(step: f64) -> u8 {
    (step / RX_GAIN_STEP).round() as u8
}

/// Gain pin step in dB to a count of TX_GAIN_STEP
pub fn tx_step_to_code(step: f64) -> u8 {
    (step / TX_GAIN_STEP).round() as u8
}

#[test]
fn rx_gain_limits() {
    assert_eq!(rx_gain_to_code(0.0), 195);
    assert_eq!(rx_gain_to_code(30.0), 255);
    assert_eq!(rx_code_to_gain(195), 0.0);
    assert_eq!(rx_code_to_gain(255), 30.0);
}

#[test]
fn tx_gain_limits() {
    assert_eq!(tx_gain_to_atten_code(0.0), 41950);
    assert_eq!(tx_gain_to_atten_code(41.95), 0);
    assert_eq!(tx_atten_code_to_gain(41950), 0.0);
}

#[test]
fn rx_gain_saturates() {
    assert_eq!(rx_gain_to_code(40.0), 255);
    assert_eq!(rx_gain_to_code(-200.0), 0);
}

#[test]
fn clock_rate_truncates() {
    assert_eq!(clock_rate_to_khz(122_880_000.0), 122_880);
    assert_eq!(clock_rate_to_khz(122_880_999.9), 122_880);
    assert_eq!(clock_rate_to_khz(999.0), 0);
}

#[test]
fn step_codes() {
    assert_eq!(rx_step_to_code(0.5), 1);
    assert_eq!(rx_step_to_code(3.0), 6);
    // 0.15 / 0.05 is 2.9999999999999996 in floating point
    assert_eq!(tx_step_to_code(0.15), 3);
    assert_eq!(tx_step_to_code(1.0), 20);
}

#[cfg(test)]
proptest! {
    #[test]
    fn rx_gain_exact(steps in 0u8..=60) {
        let gain = f64::from(steps) * RX_GAIN_STEP;
        prop_assert_eq!(rx_code_to_gain(rx_gain_to_code(gain)), gain);
    }

    #[test]
    fn tx_gain_mdb(steps in 0u16..=839) {
        let gain = f64::from(steps) * TX_GAIN_STEP;
        let decoded = tx_atten_code_to_gain(tx_gain_to_atten_code(gain));
        prop_assert!((decoded - gain).abs() < 1e-9, "{} != {}", decoded, gain);
    }

    #[test]
    fn tx_code_is_inverted(a in 0.0f64..41.95, b in 0.0f64..41.95) {
        prop_assume!(a < b);
        prop_assert!(tx_gain_to_atten_code(a) >= tx_gain_to_atten_code(b));
    }

    #[test]
    fn rx_code_monotonic(code in 195u8..255) {
        prop_assert!(rx_code_to_gain(code) < rx_code_to_gain(code + 1));
    }
}
