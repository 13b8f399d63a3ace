//! Bring-up and control of the AD9371 family ("Mykonos") RF transceivers.
//!
//! The chip itself is driven through the vendor Mykonos API, which this crate
//! sees only through the [`api::Mykonos`] trait. On top of that it sequences
//! the initialization choreography, keeps the state the vendor API does not
//! track (gain control pins, FIR taps) and converts between physical units and
//! register codes.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(test)] use proptest_derive::Arbitrary;

pub mod api;
pub mod config;
pub mod convert;
pub mod device;
pub mod firmware;
pub mod sim;
mod state;

pub use api::{Mykonos, PllSynth};
pub use config::Config;
pub use device::Ad937x;
pub use state::RadioState;

pub const MIN_FREQ: f64 = 300e6;
pub const MAX_FREQ: f64 = 6e9;
pub const MIN_RX_GAIN: f64 = 0.0;
pub const MAX_RX_GAIN: f64 = 30.0;
pub const RX_GAIN_STEP: f64 = 0.5;
pub const MIN_TX_GAIN: f64 = 0.0;
pub const MAX_TX_GAIN: f64 = 41.95;
pub const TX_GAIN_STEP: f64 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(test, derive(Arbitrary))]
pub enum Direction {
    RX,
    TX,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(test, derive(Arbitrary))]
pub enum Chain {
    One,
    Two,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Mykonos API call failed ({code}): {message}")]
    Chip { code: u32, message: String },
    #[error("Mykonos GPIO API call failed ({code}): {message}")]
    Gpio { code: u32, message: String },
    #[error("AD9371 product ID does not match expected ID! Read: {read:X} Expected: {expected:X}")]
    ProductMismatch { read: u8, expected: u8 },
    #[error("Multichip sync failed! Read: {read:X} Expected: {expected:X}")]
    SyncMismatch { read: u8, expected: u8 },
    #[error("PLLs did not lock: {0:?}")]
    PllLock(PllSynth),
    #[error("Init cals failed! flag: {flag:#x} code: {code:#x}")]
    Calibration { flag: u8, code: u8 },
    #[error("Could not load ARM binary at {}", .path.display())]
    Firmware {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not read config")]
    Io(#[from] std::io::Error),
    #[error("Invalid config")]
    Config(#[from] toml::de::Error),
    #[error("Invalid config setting: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
