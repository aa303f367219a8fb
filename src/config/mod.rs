use lazy_static::lazy_static;
use log::info;
use serde::{Deserialize, Serialize};
use serde_yml;
use std::fs;
use std::path::Path;
use std::sync::RwLock;
use thiserror::Error;

fn mqtt_client_name_default() -> String { return "power2mqtt".to_string() }
fn mqtt_base_topic_default() -> String { return "power2mqtt".to_string() }

#[derive(Deserialize, Serialize, Clone)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    #[serde(default="mqtt_client_name_default")]
    pub client_name: String,
    #[serde(default="mqtt_base_topic_default")]
    pub base_topic: String,
}

fn sml_input_topic_default() -> String { return "frames".to_string() }
fn sml_default() -> SmlConfig { return SmlConfig { input_topic: sml_input_topic_default() } }

#[derive(Deserialize, Serialize, Clone)]
pub struct SmlConfig {
    #[serde(default="sml_input_topic_default")]
    pub input_topic: String,
}

#[derive(Deserialize, Serialize, Clone)]
pub struct Config {
    pub mqtt: MqttConfig,
    #[serde(default="sml_default")]
    pub sml: SmlConfig,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unable to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to parse config file: {0}")]
    Parse(#[from] serde_yml::Error),
}

pub struct ConfigHolder {
    pub config: Config,
}

impl ConfigHolder {
    /// Load the configuration from one of the two known locations. Runs
    /// once through the CONFIG static; without a readable config the
    /// process cannot do anything useful, so this panics.
    pub fn load() -> Self {
        Self::load_path(Path::new("config/p2m.yaml"))
            .or_else(|_| Self::load_path(Path::new("p2m.yaml")))
            .expect("Unable to read the config on config/p2m.yaml or p2m.yaml")
    }

    pub fn load_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yml::from_str(&contents)?;
        info!("Configuration loaded from {}", path.display());
        Ok(ConfigHolder { config })
    }
}

lazy_static! {
    pub static ref CONFIG: RwLock<ConfigHolder> = RwLock::new(ConfigHolder::load());
}
