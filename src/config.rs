use std::{fs, io};
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::BoxedErrorTrait;

/// Read from the working directory when no other file is named
pub const CONFIG_FILE_PATH: &'static str = "prover.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Names bound as `any` values before the first declaration
    pub constants: Vec<String>,
    /// Print the kernel proposition of every link under it
    pub echo_obligations: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            constants: vec!["0".to_string(), "1".to_string()],
            echo_obligations: false,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, BoxedErrorTrait> {
        let mut file = fs::File::open(path)?;
        let mut buf = String::new();
        file.read_to_string(&mut buf)?;
        let config = toml::from_str(buf.as_str())?;
        Ok(config)
    }
    /// The file named on the command line, else `prover.toml` if present, else the defaults
    pub fn discover(path: Option<&Path>) -> Result<Config, BoxedErrorTrait> {
        match path {
            Some(path) => Config::load(path),
            None => match Config::load(CONFIG_FILE_PATH) {
                Ok(config) => Ok(config),
                Err(why) => {
                    let missing = why.downcast_ref::<io::Error>()
                        .map_or(false, |err| err.kind() == io::ErrorKind::NotFound);
                    if missing {
                        debug!("no {}, using the default configuration", CONFIG_FILE_PATH);
                        Ok(Config::default())
                    } else {
                        Err(why)
                    }
                }
            },
        }
    }
    pub fn constants(&self) -> impl Iterator<Item=&str> {
        self.constants.iter().map(|c| c.as_str())
    }
}
