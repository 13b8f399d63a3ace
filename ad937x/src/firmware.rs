use std::{
    fs::File,
    io::{self, Read},
    path::Path,
};

use crate::{Error, Result};

pub const ARM_BINARY_PATH: &str = "/lib/firmware/Mykonos_M3.bin";
pub const ARM_BINARY_SIZE: usize = 98304;

fn read_exact_binary(path: &Path) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut binary = vec![0; ARM_BINARY_SIZE];
    file.read_exact(&mut binary)?;

    // Anything past the expected size means this is not the image we expect
    let mut extra = [0; 1];
    if file.read(&mut extra)? != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("ARM binary is larger than {} bytes", ARM_BINARY_SIZE),
        ));
    }
    Ok(binary)
}

/// Reads the ARM firmware image, which must be exactly ARM_BINARY_SIZE bytes.
pub fn load_arm_binary<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    read_exact_binary(path).map_err(|source| Error::Firmware {
        path: path.to_path_buf(),
        source,
    })
}
