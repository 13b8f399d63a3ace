use ad937x::Config;
use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
///Validates a toml bring-up config
struct Args {
    file: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(&args.file)?;

    println!("{:#?}", config);
    Ok(())
}
