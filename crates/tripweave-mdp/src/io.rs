use std::{fs, path::Path};

use serde::{Serialize, de::DeserializeOwned};

use crate::MdpError;

/// Load any YAML document from disk.
pub fn load_yaml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, MdpError> {
    let yaml = fs::read_to_string(path)?;
    let value: T = serde_yaml::from_str(&yaml)?;
    Ok(value)
}

/// Serialize a value and write it as YAML.
pub fn save_yaml<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), MdpError> {
    let yaml = serde_yaml::to_string(value)?;
    fs::write(path, yaml)?;
    Ok(())
}
