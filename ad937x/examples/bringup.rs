use ad937x::{
    device::MultichipSync, firmware::ARM_BINARY_SIZE, sim::SimChip, Ad937x, Chain, Config, Direction,
};
use anyhow::{Context, Result};
use clap::Parser;
use std::{env, fs, path::PathBuf};

/// Runs the full bring-up sequence against the simulated chip and prints
/// what it ends up with.
#[derive(Parser, Debug)]
struct Args {
    #[arg(short, long, default_value = "bringup.toml")]
    config: PathBuf,
    /// ARM image, overrides the config. A blank image is used if neither has one.
    #[arg(short, long)]
    firmware: Option<PathBuf>,
    #[arg(long, default_value_t = 915e6)]
    rx_freq: f64,
    #[arg(long, default_value_t = 915e6)]
    tx_freq: f64,
    #[arg(long, default_value_t = 20.0)]
    rx_gain: f64,
    #[arg(long, default_value_t = 10.0)]
    tx_gain: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(&args.config)
        .with_context(|| format!("reading {}", args.config.display()))?;

    let firmware = match args.firmware.or(config.firmware.clone()) {
        Some(path) => path,
        None => {
            let path = env::temp_dir().join("ad937x-blank.bin");
            fs::write(&path, vec![0; ARM_BINARY_SIZE])?;
            path
        }
    };

    let mut radio = Ad937x::from_config(SimChip::new(), &config)?.with_firmware(&firmware);

    radio.begin_initialization()?;
    // The sync pulses would be sent here
    radio.verify_multichip_sync(MultichipSync::Partial)?;
    radio.finish_initialization()?;
    radio.start_jesd_rx()?;
    radio.start_jesd_tx()?;
    radio.start_radio()?;

    println!("API version: {}", radio.get_api_version()?);
    println!("ARM version: {}", radio.get_arm_version()?);
    println!("Device rev:  {}", radio.get_device_rev()?);

    println!("RX LO: {} Hz", radio.tune(Direction::RX, args.rx_freq, true)?);
    println!("TX LO: {} Hz", radio.tune(Direction::TX, args.tx_freq, true)?);
    for chain in [Chain::One, Chain::Two] {
        let rx = radio.set_gain(Direction::RX, chain, args.rx_gain)?;
        let tx = radio.set_gain(Direction::TX, chain, args.tx_gain)?;
        println!("{:?}: RX gain {} dB, TX gain {} dB", chain, rx, tx);
    }

    println!("Framer:   {:#04x}", radio.get_framer_status()?);
    println!("Deframer: {:#04x}", radio.get_deframer_status()?);
    println!("ILAS:     {:#06x}", radio.get_ilas_config_match()?);
    println!("Temp:     {}", radio.get_temperature()?);

    radio.stop_radio()?;
    println!("{} vendor calls", radio.api().calls.len());
    Ok(())
}
